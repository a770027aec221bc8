//! Best-effort discovery of the game's save and data files through the
//! local Steam install. Every probe is existence-checked; anything that
//! cannot be found is simply left unset.

use std::fs;
use std::path::PathBuf;

use crate::config::Config;

/// HoloCure's Steam app id, as it appears in the `apps` blocks of
/// `libraryfolders.vdf`.
pub const STEAM_APP_ID: &str = "2420510";

const SAVE_FILE_NAME: &str = "save_n.dat";
const DATA_FILE_NAME: &str = "data.win";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocatedFiles {
    pub save: Option<PathBuf>,
    pub data: Option<PathBuf>,
}

/// Probe the default install locations for both files.
pub fn locate_game_files() -> LocatedFiles {
    let steamapps = find_steamapps_with_game();

    let save = if cfg!(windows) {
        // The Windows build writes straight to the user's local app data.
        dirs::data_local_dir().map(|dir| dir.join("HoloCure").join(SAVE_FILE_NAME))
    } else {
        // Everywhere else the game runs under Proton, so the save lives
        // inside the compatibility prefix of the owning library.
        steamapps.as_ref().map(|steamapps| {
            steamapps
                .join("compatdata")
                .join(STEAM_APP_ID)
                .join("pfx/drive_c/users/steamuser/AppData/Local/HoloCure")
                .join(SAVE_FILE_NAME)
        })
    };

    let data = steamapps
        .as_ref()
        .map(|steamapps| steamapps.join("common/HoloCure").join(DATA_FILE_NAME));

    LocatedFiles {
        save: save.filter(|path| path.exists()),
        data: data.filter(|path| path.exists()),
    }
}

/// Style defaults plus whatever paths could be discovered.
pub fn default_config() -> Config {
    let located = locate_game_files();
    Config {
        save: located.save,
        data: located.data,
        ..Config::default()
    }
}

fn steam_root_candidates() -> Vec<PathBuf> {
    if cfg!(windows) {
        [
            r"C:\Program Files (x86)\Steam",
            r"C:\Program Files\Steam",
            r"C:\Games\Steam",
        ]
        .iter()
        .map(PathBuf::from)
        .collect()
    } else {
        let mut candidates = Vec::new();
        if let Some(home) = dirs::home_dir() {
            candidates.push(home.join(".local/share/Steam"));
            candidates.push(home.join(".steam/steam"));
        }
        candidates
    }
}

/// The `steamapps` directory of the library that owns the game.
fn find_steamapps_with_game() -> Option<PathBuf> {
    for root in steam_root_candidates() {
        let manifest = root.join("steamapps").join("libraryfolders.vdf");
        let Ok(text) = fs::read_to_string(&manifest) else {
            continue;
        };
        if let Some(library) = library_with_app(&parse_library_folders(&text), STEAM_APP_ID) {
            return Some(library.join("steamapps"));
        }
    }
    None
}

/// One numbered block of `libraryfolders.vdf`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct LibraryFolder {
    pub path: PathBuf,
    pub apps: Vec<String>,
}

pub(crate) fn library_with_app(folders: &[LibraryFolder], app_id: &str) -> Option<PathBuf> {
    folders
        .iter()
        .find(|folder| folder.apps.iter().any(|app| app == app_id))
        .map(|folder| folder.path.clone())
}

/// Minimal scan of the VDF document: quoted strings and braces, nothing
/// more. Good enough for the `path` values and `apps` keys we need.
pub(crate) fn parse_library_folders(text: &str) -> Vec<LibraryFolder> {
    let tokens = tokenize(text);

    // Expected shape:
    //   "libraryfolders" { "0" { "path" "..." "apps" { "<id>" "<bytes>" } } ... }
    let (root, _) = parse_block(&tokens, 0);
    let Some(VdfValue::Block(entries)) = lookup(&root, "libraryfolders") else {
        return Vec::new();
    };

    let mut folders = Vec::new();
    for (_, entry) in entries {
        let VdfValue::Block(fields) = entry else {
            continue;
        };
        let mut folder = LibraryFolder::default();
        if let Some(VdfValue::Str(path)) = lookup(fields, "path") {
            folder.path = PathBuf::from(path);
        }
        if let Some(VdfValue::Block(apps)) = lookup(fields, "apps") {
            folder.apps = apps.iter().map(|(app, _)| app.clone()).collect();
        }
        if folder.path.as_os_str().is_empty() {
            continue;
        }
        folders.push(folder);
    }
    folders
}

enum Token {
    Str(String),
    Open,
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum VdfValue {
    Str(String),
    Block(Vec<(String, VdfValue)>),
}

fn lookup<'a>(fields: &'a [(String, VdfValue)], key: &str) -> Option<&'a VdfValue> {
    fields
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v)
}

fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                let mut value = String::new();
                while let Some(c) = chars.next() {
                    match c {
                        '"' => break,
                        '\\' => {
                            // VDF only escapes quotes and backslashes;
                            // keep the escaped character as-is.
                            if let Some(escaped) = chars.next() {
                                value.push(escaped);
                            }
                        }
                        other => value.push(other),
                    }
                }
                tokens.push(Token::Str(value));
            }
            '{' => tokens.push(Token::Open),
            '}' => tokens.push(Token::Close),
            '/' => {
                if chars.peek() == Some(&'/') {
                    while let Some(&c) = chars.peek() {
                        if c == '\n' {
                            break;
                        }
                        chars.next();
                    }
                }
            }
            _ => {}
        }
    }

    tokens
}

/// Parse key/value pairs until a closing brace or the end of input.
/// Returns the pairs and the index just past the block.
fn parse_block(tokens: &[Token], mut i: usize) -> (Vec<(String, VdfValue)>, usize) {
    let mut fields = Vec::new();

    while i < tokens.len() {
        match &tokens[i] {
            Token::Close => return (fields, i + 1),
            Token::Str(key) => {
                i += 1;
                match tokens.get(i) {
                    Some(Token::Str(value)) => {
                        fields.push((key.clone(), VdfValue::Str(value.clone())));
                        i += 1;
                    }
                    Some(Token::Open) => {
                        let (inner, next) = parse_block(tokens, i + 1);
                        fields.push((key.clone(), VdfValue::Block(inner)));
                        i = next;
                    }
                    _ => return (fields, i),
                }
            }
            // Stray brace; skip it.
            Token::Open => i += 1,
        }
    }

    (fields, i)
}
