//! Raster to SVG conversion.
//!
//! Two pipelines share this crate: tracing through `vtracer` at one of four
//! quality profiles, or embedding the raster as a base64 PNG inside a fixed
//! SVG wrapper ("hybrid" mode).

pub mod error;
pub mod hybrid;
pub mod pipeline;
pub mod preprocess;
pub mod profile;

pub use error::ConvertError;
pub use hybrid::{render_hybrid_svg, write_hybrid_svg};
pub use pipeline::{catch_panic, convert, decode_image, derive_output_path, ConvertOptions, TEMP_PREFIX};
pub use preprocess::preprocess;
pub use profile::{CurveMode, QualityMode, QualityProfile};
