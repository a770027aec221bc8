//! The pipeline owner: one object holding the configuration, the
//! extracted game data, the current derived save view and the change
//! listeners. A save update swaps the stored view whole and fires the
//! listeners; it is never patched in place.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{self, Config};
use crate::gamedata::{self, GameData};
use crate::notifier::{ChangeNotifier, Subscription};
use crate::save::{self, SaveData};
use crate::{BuddyError, Result};

/// Outcome of one save pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveUpdate {
    /// A new view was derived and published; listeners were notified.
    Updated,
    /// The save file was empty or unreadable mid-write; the previous view
    /// stands and nobody was notified.
    SkippedEmpty,
}

pub struct Context {
    config: Config,
    save_file: PathBuf,
    data_file: PathBuf,
    game_data: GameData,
    save_data: Option<SaveData>,
    notifier: ChangeNotifier,
}

impl Context {
    /// Requires both file paths to be configured; does no I/O yet.
    pub fn new(config: Config) -> Result<Self> {
        let save_file = config
            .save
            .clone()
            .ok_or_else(|| BuddyError::Config("no save file configured".to_string()))?;
        let data_file = config
            .data
            .clone()
            .ok_or_else(|| BuddyError::Config("no data file configured".to_string()))?;

        Ok(Self {
            config,
            save_file,
            data_file,
            game_data: GameData::default(),
            save_data: None,
            notifier: ChangeNotifier::new(),
        })
    }

    /// Read the data file, extract the roster and letter list, then run
    /// the first save cycle. An unreadable data file is fatal; an empty
    /// save file just leaves `save_data` unset.
    pub fn init(&mut self) -> Result<()> {
        let bytes = fs::read(&self.data_file)?;
        self.game_data = gamedata::extract(&bytes);
        if self.game_data.character_order.is_empty() {
            log::warn!(
                "no character markers found in {}",
                self.data_file.display()
            );
        }
        if self.game_data.all_letters.is_empty() {
            log::warn!("fan letter markers missing; letter tracking disabled");
        }
        self.process_save()?;
        Ok(())
    }

    /// One read-decode-derive-notify cycle. Empty content (the game holds
    /// the file open around writes) and read failures skip the update
    /// quietly; decode failures are hard errors but leave the published
    /// view untouched.
    pub fn process_save(&mut self) -> Result<SaveUpdate> {
        let contents = match fs::read(&self.save_file) {
            Ok(contents) => contents,
            Err(err) => {
                log::warn!("save file read failed, keeping previous state: {err}");
                return Ok(SaveUpdate::SkippedEmpty);
            }
        };
        if contents.iter().all(|b| b.is_ascii_whitespace()) {
            log::debug!("save file is empty, keeping previous state");
            return Ok(SaveUpdate::SkippedEmpty);
        }

        let raw = save::decode(&contents)?;
        self.save_data = Some(save::derive(&raw, &self.game_data));
        self.notifier.notify();
        Ok(SaveUpdate::Updated)
    }

    /// Register a callback for successful save updates.
    pub fn on_save_changed(&self, callback: impl Fn() + 'static) -> Subscription {
        self.notifier.subscribe(callback)
    }

    pub fn game_data(&self) -> &GameData {
        &self.game_data
    }

    pub fn save_data(&self) -> Option<&SaveData> {
        self.save_data.as_ref()
    }

    pub fn save_file(&self) -> &Path {
        &self.save_file
    }

    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Replace the style portion of the config. The two paths stay
    /// pinned to what this context was constructed with.
    pub fn set_style(&mut self, mut style: Config) {
        style.save = self.config.save.clone();
        style.data = self.config.data.clone();
        self.config = style;
    }

    /// Persist the config document: current style values plus the two
    /// paths this context actually runs with.
    pub fn write_style_config(&self, path: &Path) -> Result<()> {
        let mut document = self.config.clone();
        document.save = Some(self.save_file.clone());
        document.data = Some(self.data_file.clone());
        config::save_to(&document, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use std::cell::Cell;
    use std::rc::Rc;

    const DATA_BLOB: &[u8] =
        b"\x00ameGachikoi\x00guraGachikoi\x00Shrimp\x00Bloom\x00allFanLetters\x00";

    fn save_blob(json: &str) -> String {
        STANDARD.encode(json)
    }

    fn write_fixture(name: &str, save_contents: &str) -> (PathBuf, PathBuf) {
        let dir = std::env::temp_dir().join("buddy-core-context-tests");
        fs::create_dir_all(&dir).unwrap();
        let data_file = dir.join(format!("{name}.win"));
        let save_file = dir.join(format!("{name}.dat"));
        fs::write(&data_file, DATA_BLOB).unwrap();
        fs::write(&save_file, save_contents).unwrap();
        (save_file, data_file)
    }

    fn context_for(name: &str, save_contents: &str) -> Context {
        let (save_file, data_file) = write_fixture(name, save_contents);
        Context::new(Config {
            save: Some(save_file),
            data: Some(data_file),
            ..Config::default()
        })
        .unwrap()
    }

    #[test]
    fn new_requires_both_paths() {
        assert!(Context::new(Config::default()).is_err());
        assert!(Context::new(Config {
            save: Some(PathBuf::from("/tmp/save_n.dat")),
            ..Config::default()
        })
        .is_err());
    }

    #[test]
    fn init_builds_game_data_and_first_view() {
        let blob = save_blob(r#"{"completedStages":[["STAGE 1",["ame"]]],"fanletters":["Shrimp"],"fandomEXP":[["ame",150]],"characters":[["ame",1]]}"#);
        let mut ctx = context_for("init", &blob);
        ctx.init().unwrap();

        assert_eq!(ctx.game_data().character_order, vec!["ame", "gura"]);
        assert_eq!(ctx.game_data().all_letters, vec!["Shrimp", "Bloom"]);

        let save_data = ctx.save_data().unwrap();
        assert_eq!(save_data.stages, vec!["STAGE 1"]);
        assert!(save_data.gachikoi.contains("ame"));
    }

    #[test]
    fn missing_data_file_is_fatal() {
        let mut ctx = Context::new(Config {
            save: Some(PathBuf::from("/nonexistent/save_n.dat")),
            data: Some(PathBuf::from("/nonexistent/data.win")),
            ..Config::default()
        })
        .unwrap();
        assert!(ctx.init().is_err());
    }

    #[test]
    fn empty_save_skips_without_notifying() {
        let blob = save_blob(r#"{"completedStages":[["STAGE 1",["ame"]]]}"#);
        let mut ctx = context_for("empty-skip", &blob);
        ctx.init().unwrap();

        let notified = Rc::new(Cell::new(0u32));
        let _subscription = ctx.on_save_changed({
            let notified = Rc::clone(&notified);
            move || notified.set(notified.get() + 1)
        });

        fs::write(ctx.save_file(), "").unwrap();
        let before = ctx.save_data().cloned();
        assert_eq!(ctx.process_save().unwrap(), SaveUpdate::SkippedEmpty);
        assert_eq!(ctx.save_data().cloned(), before);
        assert_eq!(notified.get(), 0);
    }

    #[test]
    fn decode_failure_is_an_error_but_keeps_state() {
        let blob = save_blob(r#"{"fanletters":["Shrimp"]}"#);
        let mut ctx = context_for("decode-error", &blob);
        ctx.init().unwrap();

        let before = ctx.save_data().cloned();
        assert!(before.is_some());

        fs::write(ctx.save_file(), "?? definitely not base64 ??").unwrap();
        assert!(ctx.process_save().is_err());
        assert_eq!(ctx.save_data().cloned(), before);
    }

    #[test]
    fn style_config_round_trips_with_pinned_paths() {
        let blob = save_blob(r#"{"completedStages":[]}"#);
        let mut ctx = context_for("style-config", &blob);

        ctx.set_style(Config {
            font: "monospace".to_string(),
            text_color: "#FFFFFF".to_string(),
            // Attempts to smuggle different paths in are ignored.
            save: Some(PathBuf::from("/elsewhere/save_n.dat")),
            ..Config::default()
        });
        assert_eq!(ctx.config().font, "monospace");
        assert_eq!(ctx.config().save.as_deref(), Some(ctx.save_file()));

        let out = std::env::temp_dir().join("buddy-core-context-tests/style-config.json");
        ctx.write_style_config(&out).unwrap();

        let written = crate::config::load(&out).unwrap();
        assert_eq!(written.font, "monospace");
        assert_eq!(written.text_color, "#FFFFFF");
        assert_eq!(written.save.as_deref(), Some(ctx.save_file()));
        assert_eq!(written.data.as_deref(), Some(ctx.data_file()));
    }

    #[test]
    fn updates_notify_subscribers() {
        let blob = save_blob(r#"{"completedStages":[]}"#);
        let mut ctx = context_for("notify", &blob);
        ctx.init().unwrap();

        let notified = Rc::new(Cell::new(0u32));
        let _subscription = ctx.on_save_changed({
            let notified = Rc::clone(&notified);
            move || notified.set(notified.get() + 1)
        });

        let next = save_blob(r#"{"completedStages":[["STAGE 1",["gura"]]]}"#);
        fs::write(ctx.save_file(), next).unwrap();
        assert_eq!(ctx.process_save().unwrap(), SaveUpdate::Updated);
        assert_eq!(notified.get(), 1);
        assert_eq!(ctx.save_data().unwrap().clears["gura"], vec!["STAGE 1"]);
    }
}
