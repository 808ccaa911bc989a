use thiserror::Error;

/// errors from the outer surfaces (image io, settings, output canvas).
/// the search core itself is infallible.
#[derive(Debug, Error)]
pub enum Error {
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid settings: {0}")]
    Settings(#[from] serde_json::Error),

    #[error("target image is empty ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("cannot allocate a {width}x{height} output canvas")]
    Canvas { width: u32, height: u32 },
}

pub type Result<T> = std::result::Result<T, Error>;
