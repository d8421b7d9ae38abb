use anyhow::{Context, Result};
use image::{DynamicImage, ImageFormat};
use std::io::{BufWriter, Write};
use std::panic::{self, UnwindSafe};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::ConvertError;
use crate::hybrid::write_hybrid_svg;
use crate::preprocess::preprocess;
use crate::profile::QualityMode;

/// Prefix of the preprocessed raster handed to the tracer.
pub const TEMP_PREFIX: &str = "temp_";

/// One conversion request.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub input: PathBuf,
    /// Defaults to the input path with an `.svg` extension
    pub output: Option<PathBuf>,
    /// Quality mode name; unknown names trace at `maximum`
    pub mode: String,
    /// Embed the raster instead of tracing it
    pub hybrid: bool,
    /// Where the temporary raster is written; the system temp dir if unset
    pub temp_dir: Option<PathBuf>,
}

impl ConvertOptions {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: None,
            mode: "maximum".to_string(),
            hybrid: false,
            temp_dir: None,
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| derive_output_path(&self.input))
    }
}

/// `photo.png` -> `photo.svg`
pub fn derive_output_path(input: &Path) -> PathBuf {
    input.with_extension("svg")
}

/// Run one conversion and return the path of the written SVG.
pub fn convert(options: &ConvertOptions) -> Result<PathBuf> {
    if !options.input.exists() {
        return Err(ConvertError::InputNotFound(options.input.clone()).into());
    }
    let output = options.output_path();

    let img = decode_image(&options.input)?;
    debug!(
        "Decoded {} ({}x{}, {:?})",
        options.input.display(),
        img.width(),
        img.height(),
        img.color()
    );

    if options.hybrid {
        write_hybrid_svg(&img, &output)?;
        return Ok(output);
    }

    let img = preprocess(img, true);
    let temp = write_temp_raster(&img, &options.input, options.temp_dir.as_deref())?;
    drop(img);

    let mode = QualityMode::from_name(&options.mode);
    let profile = mode.profile();
    info!("Tracing {} with {} profile", options.input.display(), mode);

    let traced = vtracer::convert_image_to_svg(temp.path(), &output, profile.to_tracer_config())
        .map_err(ConvertError::Trace);

    // Remove the temp raster before reporting the tracer's outcome.
    let temp_path = temp.path().to_path_buf();
    let cleanup = temp.close();
    finish_trace(traced, cleanup, temp_path)?;

    info!("Wrote {}", output.display());
    Ok(output)
}

/// Decode by sniffing the file contents, so a wrong or missing extension
/// does not matter.
pub fn decode_image(path: &Path) -> Result<DynamicImage> {
    let decode = || -> Result<DynamicImage> {
        let img = image::ImageReader::open(path)?
            .with_guessed_format()?
            .decode()?;
        Ok(img)
    };
    decode().with_context(|| format!("Failed to decode image {}", path.display()))
}

/// A tracer failure wins over a cleanup failure; the latter is only logged.
fn finish_trace(
    traced: Result<(), ConvertError>,
    cleanup: std::io::Result<()>,
    temp_path: PathBuf,
) -> Result<(), ConvertError> {
    match (traced, cleanup) {
        (Err(e), Err(cleanup_err)) => {
            warn!(
                "Failed to remove temporary file {}: {}",
                temp_path.display(),
                cleanup_err
            );
            Err(e)
        }
        (Err(e), Ok(())) => Err(e),
        (Ok(()), Err(source)) => Err(ConvertError::TempCleanup {
            path: temp_path,
            source,
        }),
        (Ok(()), Ok(())) => Ok(()),
    }
}

/// Run `f`, turning a panic inside the decoder or tracer into an ordinary
/// error. Temp guards still drop during the unwind.
pub fn catch_panic<T>(f: impl FnOnce() -> Result<T> + UnwindSafe) -> Result<T> {
    panic::catch_unwind(f).unwrap_or_else(|payload| {
        let msg = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Err(ConvertError::Panicked(msg).into())
    })
}

/// Write the preprocessed raster as a lossless PNG into a uniquely named
/// temp file. The file is removed when the returned guard drops.
fn write_temp_raster(img: &DynamicImage, input: &Path, dir: Option<&Path>) -> Result<NamedTempFile> {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let prefix = format!("{TEMP_PREFIX}{stem}_");

    let mut builder = tempfile::Builder::new();
    builder.prefix(&prefix).suffix(".png");
    let mut temp = match dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }
    .context("Failed to create temporary file")?;

    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        img.write_to(&mut writer, ImageFormat::Png)
            .context("Failed to save temporary image")?;
        writer.flush().context("Failed to save temporary image")?;
    }

    debug!("Wrote preprocessed raster to {}", temp.path().display());
    Ok(temp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_derive_output_path() {
        assert_eq!(derive_output_path(Path::new("photo.png")), PathBuf::from("photo.svg"));
        assert_eq!(
            derive_output_path(Path::new("/tmp/scans/page.1.jpeg")),
            PathBuf::from("/tmp/scans/page.1.svg")
        );
        assert_eq!(derive_output_path(Path::new("noext")), PathBuf::from("noext.svg"));
    }

    #[test]
    fn test_explicit_output_wins() {
        let mut options = ConvertOptions::new("photo.png");
        assert_eq!(options.output_path(), PathBuf::from("photo.svg"));

        options.output = Some(PathBuf::from("out/vector.svg"));
        assert_eq!(options.output_path(), PathBuf::from("out/vector.svg"));
    }

    #[test]
    fn test_default_options() {
        let options = ConvertOptions::new("a.png");
        assert_eq!(options.mode, "maximum");
        assert!(!options.hybrid);
        assert!(options.temp_dir.is_none());
    }

    fn io_error() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::PermissionDenied, "locked")
    }

    #[test]
    fn test_trace_error_survives_cleanup_failure() {
        let result = finish_trace(
            Err(ConvertError::Trace("Cannot create output file.".to_string())),
            Err(io_error()),
            PathBuf::from("/tmp/temp_photo_x.png"),
        );
        match result {
            Err(ConvertError::Trace(msg)) => assert_eq!(msg, "Cannot create output file."),
            other => panic!("expected trace error, got {other:?}"),
        }
    }

    #[test]
    fn test_cleanup_failure_reported_after_successful_trace() {
        let result = finish_trace(Ok(()), Err(io_error()), PathBuf::from("/tmp/temp_a.png"));
        assert!(matches!(result, Err(ConvertError::TempCleanup { .. })));
        assert!(finish_trace(Ok(()), Ok(()), PathBuf::from("/tmp/temp_a.png")).is_ok());
    }

    #[test]
    fn test_catch_panic_maps_to_error() {
        let err = catch_panic::<()>(|| panic!("tracer blew up")).unwrap_err();
        match err.downcast_ref::<ConvertError>() {
            Some(ConvertError::Panicked(msg)) => assert_eq!(msg, "tracer blew up"),
            other => panic!("expected panic error, got {other:?}"),
        }

        let err = catch_panic::<()>(|| panic!("{} rows", 3)).unwrap_err();
        assert!(err.to_string().contains("3 rows"));

        assert_eq!(catch_panic(|| Ok(7)).unwrap(), 7);
    }

    #[test]
    fn test_decode_ignores_extension() {
        let dir = tempfile::tempdir().unwrap();
        let img = RgbImage::from_pixel(10, 10, Rgb([9, 8, 7]));
        for name in ["scan", "photo.jpg", "photo.dat"] {
            let path = dir.path().join(name);
            img.save_with_format(&path, ImageFormat::Png).unwrap();
            let decoded = decode_image(&path).unwrap();
            assert_eq!(decoded.to_rgb8(), img, "{name}");
        }
    }

    #[test]
    fn test_temp_raster_named_and_removed() {
        let dir = tempfile::tempdir().unwrap();
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([1, 2, 3])));

        let temp = write_temp_raster(&img, Path::new("/somewhere/photo.jpg"), Some(dir.path())).unwrap();
        let name = temp.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("temp_photo_"), "{name}");
        assert!(name.ends_with(".png"), "{name}");

        let reloaded = image::open(temp.path()).unwrap();
        assert_eq!(reloaded.to_rgb8(), img.to_rgb8());

        let path = temp.path().to_path_buf();
        drop(temp);
        assert!(!path.exists());
    }
}
