use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlashFsError {
    #[error("File system is not mounted: no valid image was located")]
    NotMounted,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Too many open files (capacity {capacity})")]
    TooManyOpenFiles { capacity: usize },

    #[error("Too many open directories (capacity {capacity})")]
    TooManyOpenDirs { capacity: usize },

    #[error("Bad file handle: slot {0} is not open")]
    BadFileHandle(usize),

    #[error("Bad directory handle: slot {0} is not open")]
    BadDirHandle(usize),

    #[error("File system is read-only")]
    ReadOnly,

    #[error("Unsupported seek origin: {0}")]
    UnsupportedSeekOrigin(i32),

    #[error("Seek to offset {offset} falls outside the file")]
    InvalidSeek { offset: i64 },

    #[error("Directory position does not belong to this directory handle")]
    InvalidDirPosition,

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Corrupt image: {0}")]
    CorruptImage(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, FlashFsError>;
