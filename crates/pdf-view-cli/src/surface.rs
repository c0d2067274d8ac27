use image::RgbaImage;
use pdf_view::{RenderedFrame, Result, Surface, ViewError};
use std::path::{Path, PathBuf};

enum Target {
    File(PathBuf),
    Sequence { dir: PathBuf, next: usize },
}

/// Surface that writes every presented frame to a PNG file
pub struct PngSurface {
    target: Target,
    last_left: f64,
}

impl PngSurface {
    /// Overwrite `path` on every present
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::with_target(Target::File(path.into()))
    }

    /// Write `frame-001.png`, `frame-002.png`, ... into `dir`
    pub fn sequence(dir: impl Into<PathBuf>) -> Self {
        Self::with_target(Target::Sequence {
            dir: dir.into(),
            next: 1,
        })
    }

    fn with_target(target: Target) -> Self {
        Self {
            target,
            last_left: 0.0,
        }
    }

    /// Left offset of the most recent frame inside the container
    pub fn last_left(&self) -> f64 {
        self.last_left
    }

    fn next_path(&mut self) -> PathBuf {
        match &mut self.target {
            Target::File(path) => path.clone(),
            Target::Sequence { dir, next } => {
                let path = dir.join(format!("frame-{:03}.png", next));
                *next += 1;
                path
            }
        }
    }
}

fn save_png(frame: &RenderedFrame, path: &Path) -> Result<()> {
    let image = RgbaImage::from_raw(frame.width, frame.height, frame.rgba_data.clone())
        .ok_or_else(|| {
            ViewError::InvalidDimensions(format!(
                "frame of {}x{} has {} bytes",
                frame.width,
                frame.height,
                frame.rgba_data.len()
            ))
        })?;
    image
        .save(path)
        .map_err(|e| ViewError::Io(std::io::Error::other(e)))
}

impl Surface for PngSurface {
    fn present(&mut self, frame: &RenderedFrame, left: f64) -> Result<()> {
        let path = self.next_path();
        save_png(frame, &path)?;
        log::info!(
            "Wrote {}x{} frame to {} (left offset {:.1})",
            frame.width,
            frame.height,
            path.display(),
            left
        );
        self.last_left = left;
        Ok(())
    }
}
