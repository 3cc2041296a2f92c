use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed tree: {0}")]
    MalformedTree(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
