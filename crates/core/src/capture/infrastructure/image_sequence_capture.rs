use std::fs;
use std::path::{Path, PathBuf};

use crate::capture::domain::capture_source::CaptureSource;
use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::error::BoxError;
use crate::shared::frame::Frame;

/// Plays back a directory of still images as if they came from a camera.
///
/// Files are taken in file-name order, so zero-padded names
/// (`frame_0001.png`, ...) replay in capture order. Decoding uses the
/// `image` crate and always yields 3-channel RGB.
pub struct ImageSequenceCapture {
    dir: PathBuf,
    mirror: bool,
    paths: Option<Vec<PathBuf>>,
}

impl ImageSequenceCapture {
    pub fn new(dir: impl Into<PathBuf>, mirror: bool) -> Self {
        Self {
            dir: dir.into(),
            mirror,
            paths: None,
        }
    }

    pub fn frame_count(&self) -> Option<usize> {
        self.paths.as_ref().map(Vec::len)
    }
}

pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn load_frame(path: &Path, index: usize, mirror: bool) -> Result<Frame, BoxError> {
    let img = image::open(path)
        .map_err(|e| format!("failed to decode {}: {e}", path.display()))?
        .to_rgb8();
    let (width, height) = img.dimensions();
    let mut frame = Frame::new(img.into_raw(), width, height, 3, index);
    if mirror {
        frame.flip_horizontal();
    }
    Ok(frame)
}

impl CaptureSource for ImageSequenceCapture {
    fn open(&mut self) -> Result<(), BoxError> {
        let entries = fs::read_dir(&self.dir)
            .map_err(|e| format!("cannot open capture directory {}: {e}", self.dir.display()))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && is_image(&path) {
                paths.push(path);
            }
        }
        if paths.is_empty() {
            return Err(format!("no image frames found in {}", self.dir.display()).into());
        }
        paths.sort();

        log::info!(
            "Opened capture: {} frames from {}",
            paths.len(),
            self.dir.display()
        );
        self.paths = Some(paths);
        Ok(())
    }

    fn frames(&mut self) -> Box<dyn Iterator<Item = Result<Frame, BoxError>> + '_> {
        let mirror = self.mirror;
        match &self.paths {
            None => Box::new(std::iter::once(Err(
                "ImageSequenceCapture: not opened".into()
            ))),
            Some(paths) => Box::new(
                paths
                    .iter()
                    .enumerate()
                    .map(move |(index, path)| load_frame(path, index, mirror)),
            ),
        }
    }

    fn release(&mut self) {
        if self.paths.take().is_some() {
            log::debug!("Released capture {}", self.dir.display());
        }
    }
}
