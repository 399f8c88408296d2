use std::fs;
use std::path::{Path, PathBuf};

use crate::rendering::domain::frame_sink::FrameSink;
use crate::shared::error::BoxError;
use crate::shared::frame::Frame;

/// Writes each annotated frame as `frame_NNNNNN.png` into a directory,
/// numbered by the frame's capture index.
pub struct ImageSequenceWriter {
    dir: PathBuf,
    written: usize,
}

impl ImageSequenceWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: 0,
        }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn path_for(&self, index: usize) -> PathBuf {
        frame_path(&self.dir, index)
    }
}

fn frame_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("frame_{index:06}.png"))
}

impl FrameSink for ImageSequenceWriter {
    fn write(&mut self, frame: &Frame) -> Result<(), BoxError> {
        if frame.channels() != 3 {
            return Err(format!(
                "ImageSequenceWriter expects RGB frames, got {} channels",
                frame.channels()
            )
            .into());
        }
        fs::create_dir_all(&self.dir)?;

        let img = image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
            .ok_or("Failed to create image from frame data")?;
        img.save(self.path_for(frame.index()))?;

        self.written += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), BoxError> {
        log::info!(
            "Wrote {} annotated frames to {}",
            self.written,
            self.dir.display()
        );
        Ok(())
    }
}
