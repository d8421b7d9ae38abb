use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by the conversion pipeline itself.
///
/// Decode and encode failures from the `image` crate travel as `anyhow`
/// errors with context attached; these variants cover the steps whose
/// underlying error type is not a proper `std::error::Error`.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("input file '{}' not found", .0.display())]
    InputNotFound(PathBuf),

    /// vtracer reports failures as plain strings.
    #[error("failed to trace image to SVG: {0}")]
    Trace(String),

    #[error("conversion panicked: {0}")]
    Panicked(String),

    #[error("failed to remove temporary file '{}'", .path.display())]
    TempCleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
