use thiserror::Error;

pub type UnwrapResult<T> = Result<T, UnwrapError>;

#[derive(Debug, Error)]
pub enum UnwrapError {
    #[error("cannot resolve object '{name}': {reason}")]
    Resolution { name: String, reason: String },

    #[error("catalog read failed: {0}")]
    CatalogRead(String),

    #[error("decrypted bytes are not valid UTF-16 ({0}); the derived key is most likely wrong")]
    Decode(#[from] DecodeFailure),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl UnwrapError {
    /// Short stable label for logs and machine-readable output.
    pub fn kind(&self) -> &'static str {
        match self {
            UnwrapError::Resolution { .. } => "resolution",
            UnwrapError::CatalogRead(_) => "catalog_read",
            UnwrapError::Decode(_) => "decode",
            UnwrapError::Config(_) => "config",
            UnwrapError::Io(_) => "io",
            UnwrapError::Other(_) => "other",
        }
    }
}

/// Why a decrypted buffer could not be read as UTF-16.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeFailure {
    #[error("odd byte length {0}")]
    OddLength(usize),

    #[error("unpaired surrogate at byte offset {offset}")]
    UnpairedSurrogate { offset: usize },
}
