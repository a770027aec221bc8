use thiserror::Error;

pub mod config;
pub mod context;
pub mod gamedata;
pub mod locate;
pub mod notifier;
pub mod roll;
pub mod save;
pub mod watch;

pub use config::Config;
pub use context::{Context, SaveUpdate};
pub use gamedata::GameData;
pub use notifier::{ChangeNotifier, Subscription};
pub use roll::{RollKind, RollResult, Roller};
pub use save::{RawSave, SaveData};

#[derive(Debug, Error)]
pub enum BuddyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("file watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, BuddyError>;
