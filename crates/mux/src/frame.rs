//! RGBA frame conversion for raw tracks.

use g2v_common::PixelFormat;

use crate::error::{MuxError, MuxResult};

/// Convert packed RGBA8 pixels into the raw sample layout.
///
/// `Rgb24` drops the alpha channel; `Rgba32` copies the pixels as they are.
/// Trailing bytes that do not form a whole pixel are ignored.
pub fn convert_rgba(rgba: &[u8], format: PixelFormat) -> MuxResult<Vec<u8>> {
    let pixels = rgba.len() / 4;
    let size = pixels * format.bytes_per_pixel() as usize;

    let mut out = Vec::new();
    out.try_reserve_exact(size)
        .map_err(|_| MuxError::AllocationFailure { requested: size })?;

    if format.has_alpha() {
        out.extend_from_slice(&rgba[..pixels * 4]);
    } else {
        for px in rgba.chunks_exact(4) {
            out.extend_from_slice(&px[..3]);
        }
    }
    Ok(out)
}
