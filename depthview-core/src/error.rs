//! Error types for depthview

use thiserror::Error;

/// Main error type for depthview operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("GPU error: {0}")]
    Gpu(String),

    #[error("Surface error: {0}")]
    Surface(String),

    #[error("Window error: {0}")]
    Window(String),

    #[error("Event loop error: {0}")]
    EventLoop(String),

    #[error("Viewer already started")]
    AlreadyStarted,
}

impl Error {
    /// Process-style status code for a failed viewer run.
    ///
    /// A successful run maps to 0; every error maps to a distinct non-zero code.
    pub fn status_code(&self) -> i32 {
        match self {
            Error::Io(_) => 1,
            Error::InvalidData(_) => 2,
            Error::Gpu(_) => 3,
            Error::Surface(_) => 4,
            Error::Window(_) => 5,
            Error::EventLoop(_) => 6,
            Error::AlreadyStarted => 7,
        }
    }
}

/// Result type alias for depthview operations
pub type Result<T> = std::result::Result<T, Error>;
