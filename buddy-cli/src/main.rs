use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

use clap::{Parser, Subcommand, ValueEnum};

use buddy_core::watch::SaveWatcher;
use buddy_core::{config, locate, roll, BuddyError, Context, RollKind, Roller, SaveUpdate};

mod render;

#[derive(Debug, Parser)]
#[command(
    name = "holocure-buddy",
    version,
    about = "HoloCure completion tracker and character roll picker"
)]
struct Args {
    /// Config file location; defaults to the per-user data directory.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the save file path from the config.
    #[arg(long)]
    save: Option<PathBuf>,

    /// Override the game data file path from the config.
    #[arg(long)]
    data: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the completion grid and fan letter checklist once.
    Status,
    /// Roll a character from the eligible pool.
    Roll {
        #[arg(long, value_enum, default_value = "any")]
        kind: RollArg,
    },
    /// Watch the save file and report progress as it happens.
    Watch {
        /// Roll again automatically whenever a new clear comes in.
        #[arg(long, default_value_t = false)]
        auto_roll: bool,

        #[arg(long, value_enum, default_value = "any")]
        kind: RollArg,
    },
    /// Print the discovered default save/data locations.
    Locate,
    /// Update style values in the config document.
    Config {
        #[arg(long)]
        text_color: Option<String>,
        #[arg(long)]
        background_color: Option<String>,
        #[arg(long)]
        border_color: Option<String>,
        #[arg(long)]
        cleared_color: Option<String>,
        #[arg(long)]
        selected_color: Option<String>,
        #[arg(long)]
        font: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RollArg {
    Gachikoi,
    Stage,
    Any,
}

impl From<RollArg> for RollKind {
    fn from(kind: RollArg) -> Self {
        match kind {
            RollArg::Gachikoi => RollKind::Gachikoi,
            RollArg::Stage => RollKind::Stage,
            RollArg::Any => RollKind::Any,
        }
    }
}

fn main() {
    let args = Args::parse();

    if let Err(err) = setup_logging(args.verbose) {
        eprintln!("Failed to set up logging: {err}");
    }

    if let Err(err) = run(args) {
        log::error!("{err}");
        std::process::exit(1);
    }
}

fn setup_logging(verbose: bool) -> Result<(), fern::InitError> {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}] [{}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stdout())
        .apply()?;
    Ok(())
}

fn run(args: Args) -> buddy_core::Result<()> {
    if let Command::Locate = args.command {
        let files = locate::locate_game_files();
        match &files.save {
            Some(path) => println!("save: {}", path.display()),
            None => println!("save: not found"),
        }
        match &files.data {
            Some(path) => println!("data: {}", path.display()),
            None => println!("data: not found"),
        }
        return Ok(());
    }

    let config_path = match args.config {
        Some(path) => path,
        None => config::default_path().ok_or_else(|| {
            BuddyError::Config("could not determine a config directory".to_string())
        })?,
    };
    let mut cfg = config::load_or_create(&config_path)?;
    if let Some(save) = args.save {
        cfg.save = Some(save);
    }
    if let Some(data) = args.data {
        cfg.data = Some(data);
    }
    if cfg.save.is_none() || cfg.data.is_none() {
        return Err(BuddyError::Config(format!(
            "no save/data file configured; run `holocure-buddy locate` or edit {}",
            config_path.display()
        )));
    }

    let mut ctx = Context::new(cfg)?;
    ctx.init()?;
    if ctx.save_data().is_none() {
        return Err(BuddyError::Config(
            "save data did not initialize correctly (save file empty or unreadable)".to_string(),
        ));
    }

    match args.command {
        Command::Status => render::print_status(&ctx),
        Command::Roll { kind } => roll_once(&ctx, kind.into()),
        Command::Watch { auto_roll, kind } => watch_loop(ctx, auto_roll, kind.into())?,
        Command::Config {
            text_color,
            background_color,
            border_color,
            cleared_color,
            selected_color,
            font,
        } => {
            let mut style = ctx.config().clone();
            apply(&mut style.text_color, text_color);
            apply(&mut style.background_color, background_color);
            apply(&mut style.border_color, border_color);
            apply(&mut style.cleared_color, cleared_color);
            apply(&mut style.selected_color, selected_color);
            apply(&mut style.font, font);
            ctx.set_style(style);
            ctx.write_style_config(&config_path)?;
            log::info!("wrote {}", config_path.display());
        }
        Command::Locate => unreachable!("handled above"),
    }

    Ok(())
}

fn apply(slot: &mut String, value: Option<String>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn roll_once(ctx: &Context, kind: RollKind) {
    // run() already made sure a view exists.
    let Some(save) = ctx.save_data() else { return };

    if !roll::can_roll(ctx.game_data(), save, kind) {
        log::info!("every character is already done for that roll type");
        return;
    }

    let mut roller = Roller::new();
    let mut rng = rand::thread_rng();
    match roller.roll(ctx.game_data(), save, kind, &mut rng) {
        Some(result) => println!("{}", render::format_roll(&result)),
        None => log::info!("no eligible characters to roll"),
    }
}

fn watch_loop(mut ctx: Context, auto_roll: bool, kind: RollKind) -> buddy_core::Result<()> {
    let changed = Rc::new(Cell::new(false));
    let _subscription = ctx.on_save_changed({
        let changed = Rc::clone(&changed);
        move || changed.set(true)
    });

    let watcher = SaveWatcher::new(ctx.save_file())?;
    let mut roller = Roller::new();
    let mut rng = rand::thread_rng();
    let mut previous = ctx.save_data().cloned();

    render::print_status(&ctx);
    log::info!("watching {}", ctx.save_file().display());

    loop {
        watcher.wait_for_change()?;

        match ctx.process_save() {
            Ok(SaveUpdate::Updated) => {}
            Ok(SaveUpdate::SkippedEmpty) => continue,
            Err(err) => {
                // One bad write must not kill the loop; the next change
                // event gets a fresh chance.
                log::error!("failed to read save update: {err}");
                continue;
            }
        }
        if !changed.replace(false) {
            continue;
        }

        roller.reset();
        let Some(next) = ctx.save_data().cloned() else {
            continue;
        };

        let mut saw_new_clear = false;
        if let Some(previous) = previous.as_ref() {
            saw_new_clear = render::log_new_progress(ctx.game_data(), previous, &next);
        }

        if auto_roll && saw_new_clear {
            if let Some(result) = roller.roll(ctx.game_data(), &next, kind, &mut rng) {
                log::info!("rolled {}", render::format_roll(&result));
            }
        }

        render::print_status(&ctx);
        previous = Some(next);
    }
}
