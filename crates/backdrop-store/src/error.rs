use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("expected a .zip upload, got '{filename}'")]
    InvalidContainerType { filename: String },

    #[error("archive contained no images")]
    EmptyContainer,

    #[error("archive contained {count} images, the maximum is {max}")]
    TooManyImages { count: usize, max: usize },

    #[error("address '{address}' escapes the storage root")]
    PathTraversal { address: String },

    #[error("no image at '{address}'")]
    NotFound { address: String },

    #[error("failed to read image at '{address}': {source}")]
    ServeFailed {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("ingestion failed: {source}")]
    IngestionFailed {
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Archive(#[from] backdrop_archive::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
