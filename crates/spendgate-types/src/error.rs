use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Host config not found at: {0}")]
    HostConfigNotFound(PathBuf),

    #[error("Host config has unexpected shape: {0}")]
    HostConfigShape(String),

    #[error("Session log is malformed: {0}")]
    MalformedSessionLog(String),
}

pub type Result<T> = std::result::Result<T, Error>;
