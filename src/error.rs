use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScanError>;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Failed to open zip file {path}: {message}")]
    ArchiveOpen { path: String, message: String },

    #[error("Cannot open folder {path}: {message}")]
    DirectoryOpen { path: String, message: String },

    #[error("ZIP files are under {required} ({found} found)")]
    InsufficientPool { found: usize, required: usize },

    #[error("Cannot read entry {entry}: {message}")]
    EntryRead { entry: String, message: String },

    #[error("Usage: {0}")]
    Usage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Catalogue error: {0}")]
    Catalogue(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ScanError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) => 1,
            _ => 2,
        }
    }
}
