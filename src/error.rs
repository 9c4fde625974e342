use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no steps to draw")]
    EmptyInput,
    #[error("rasterization failed: {0}")]
    Rasterization(String),
    #[error("text measurement failed: no usable face for font family {font_family:?}")]
    Measurement { font_family: String },
    #[error("invalid file name: {0:?}")]
    InvalidFileName(String),
    #[error("file {0} not found")]
    NotFound(String),
    #[error("could not read algorithm response: {0}")]
    Response(String),
    #[error("config: {0}")]
    Config(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
