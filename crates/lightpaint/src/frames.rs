use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use lightbrush::Viewport;

/// One decoded frame as tightly packed RGBA8 rows.
pub struct RgbaFrame {
    pub viewport: Viewport,
    pub bytes: Vec<u8>,
}

/// PNG files directly inside `dir`, sorted by file name.
pub fn list_frames(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to list input frames in {}", dir.display()))?;

    let mut frames = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to read entry in {}", dir.display()))?
            .path();
        let is_png = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
        if path.is_file() && is_png {
            frames.push(path);
        }
    }
    frames.sort();

    if frames.is_empty() {
        bail!("no PNG frames found in {}", dir.display());
    }
    Ok(frames)
}

pub fn load_frame(path: &Path) -> Result<RgbaFrame> {
    let image = image::open(path)
        .with_context(|| format!("failed to decode frame {}", path.display()))?
        .to_rgba8();
    let (width, height) = image.dimensions();
    Ok(RgbaFrame {
        viewport: Viewport::new(width, height),
        bytes: image.into_raw(),
    })
}

pub fn save_frame(path: &Path, frame: RgbaFrame) -> Result<()> {
    let RgbaFrame { viewport, bytes } = frame;
    let image = image::RgbaImage::from_raw(viewport.width, viewport.height, bytes)
        .ok_or_else(|| anyhow!("frame buffer does not match {viewport}"))?;
    image
        .save(path)
        .with_context(|| format!("failed to write frame {}", path.display()))
}
