// src/error.rs

use plotters::drawing::DrawingAreaErrorKind;
use thiserror::Error;

/// Crate result type.
pub type Result<T> = std::result::Result<T, AnimError>;

/// Errors raised by the animator and its renderer.
#[derive(Debug, Error)]
pub enum AnimError {
    /// Field data is not a rank-3 (nt, ny, nx) array.
    #[error("field must be a three-dimensional array with shape (nt, ny, nx): {0}")]
    FieldShape(String),

    /// An output operation was requested before its inputs were supplied.
    #[error("not ready: {0}")]
    NotReady(&'static str),

    #[error("p must be greater than or equal to 1 (got {0})")]
    InvalidDegree(u32),

    #[error("invalid coordinate input: {0}")]
    InvalidCoordinate(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unsupported animation format '{0}' (expected gif or mp4)")]
    UnsupportedFormat(String),

    #[error("rendering failed: {0}")]
    Render(String),

    #[error("encoder failed: {0}")]
    Encoder(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for AnimError {
    fn from(e: DrawingAreaErrorKind<E>) -> Self {
        AnimError::Render(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failure() {
        let e = AnimError::FieldShape("got rank 2".into());
        assert!(e.to_string().contains("(nt, ny, nx)"));
        assert!(e.to_string().contains("rank 2"));

        let e = AnimError::NotReady("no phase field data to display");
        assert_eq!(e.to_string(), "not ready: no phase field data to display");
    }

    #[test]
    fn io_errors_convert() {
        fn open() -> Result<()> {
            std::fs::File::open("/definitely/not/here.json")?;
            Ok(())
        }
        assert!(matches!(open(), Err(AnimError::Io(_))));
    }
}
