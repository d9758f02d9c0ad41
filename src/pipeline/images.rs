//! Images

use crate::error::{TaskError, TaskResult};
use crate::pipeline::process_set;
use crate::runner::Context;
use std::path::Path;

/// Shrink an image, keeping the original when the result is not smaller
///
/// PNGs are optimized losslessly. With the `jpeg` feature, JPEGs are
/// re-encoded at quality 90 (lossy). Other formats pass through unchanged.
pub fn optimize(path: &Path, bytes: Vec<u8>) -> TaskResult<Vec<u8>> {
    let optimized = match extension(path).as_deref() {
        Some("png") => optimize_png(&bytes),
        #[cfg(feature = "jpeg")]
        Some("jpg" | "jpeg") => optimize_jpeg(&bytes),
        _ => return Ok(bytes),
    }
    .map_err(|message| TaskError::Image {
        path: path.to_path_buf(),
        message,
    })?;

    if optimized.len() < bytes.len() {
        tracing::debug!(
            path = %path.display(),
            before = bytes.len(),
            after = optimized.len(),
            "optimized image"
        );
        Ok(optimized)
    } else {
        Ok(bytes)
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

fn optimize_png(bytes: &[u8]) -> Result<Vec<u8>, String> {
    oxipng::optimize_from_memory(bytes, &oxipng::Options::from_preset(2)).map_err(|e| e.to_string())
}

/// Decode to RGB and re-encode progressively with optimized Huffman tables
#[cfg(feature = "jpeg")]
fn optimize_jpeg(bytes: &[u8]) -> Result<Vec<u8>, String> {
    use mozjpeg::{ColorSpace, Compress, Decompress};
    use std::panic::{self, AssertUnwindSafe};

    // libjpeg reports fatal errors by unwinding
    let encoded = panic::catch_unwind(AssertUnwindSafe(|| -> std::io::Result<Vec<u8>> {
        let mut image = Decompress::new_mem(bytes)?.rgb()?;
        let (width, height) = (image.width(), image.height());
        let pixels = image.read_scanlines::<[u8; 3]>()?;
        image.finish()?;

        let mut compress = Compress::new(ColorSpace::JCS_RGB);
        compress.set_size(width, height);
        compress.set_quality(90.0);
        compress.set_progressive_mode();
        compress.set_optimize_coding(true);

        let mut started = compress.start_compress(Vec::new())?;
        started.write_scanlines(&pixels.concat())?;
        started.finish()
    }));

    match encoded {
        Ok(result) => result.map_err(|e| e.to_string()),
        Err(_) => Err("not a readable JPEG".to_string()),
    }
}

pub fn run(ctx: &Context) -> TaskResult<()> {
    let production = ctx.is_production();
    let count = process_set(ctx, &ctx.config.paths.images, |path, bytes| {
        if production {
            optimize(path, bytes)
        } else {
            Ok(bytes)
        }
    })?;
    ctx.reporter.debug(&format!("Wrote {} image(s)", count));
    Ok(())
}
