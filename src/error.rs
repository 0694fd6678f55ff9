use thiserror::Error;

#[derive(Error, Debug)]
pub enum CanvasError {
    #[error("Coordinate out of bounds: ({x}, {y})")]
    OutOfBounds { x: i64, y: i64 },

    #[error("Only the host may do this")]
    HostRequired,

    #[error("Session already has a host")]
    HostDenied,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
