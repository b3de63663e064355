//! `image` crate conversions and directory-backed frame I/O.

use std::fs;
use std::path::{Path, PathBuf};

use image::ImageReader;
use lane_finder_core::{RgbImage, RgbImageView};

use crate::{FrameSink, FrameSource};

#[derive(thiserror::Error, Debug)]
pub enum ImageIoError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("invalid frame buffer (width={width}, height={height}, len={len})")]
    Buffer { width: usize, height: usize, len: usize },
}

const FRAME_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "tif"];

/// Borrow an `image::RgbImage` as the core view type.
pub fn rgb_view(img: &image::RgbImage) -> RgbImageView<'_> {
    RgbImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

pub fn from_image(img: image::RgbImage) -> RgbImage {
    let (width, height) = (img.width() as usize, img.height() as usize);
    RgbImage {
        width,
        height,
        data: img.into_raw(),
    }
}

pub fn to_image(img: &RgbImage) -> Result<image::RgbImage, ImageIoError> {
    let bad = || ImageIoError::Buffer {
        width: img.width,
        height: img.height,
        len: img.data.len(),
    };
    let w = u32::try_from(img.width).map_err(|_| bad())?;
    let h = u32::try_from(img.height).map_err(|_| bad())?;
    image::RgbImage::from_raw(w, h, img.data.clone()).ok_or_else(bad)
}

pub fn load_rgb(path: impl AsRef<Path>) -> Result<RgbImage, ImageIoError> {
    let path = path.as_ref();
    let img = ImageReader::open(path)
        .map_err(|source| ImageIoError::Io {
            path: path.to_path_buf(),
            source,
        })?
        .decode()
        .map_err(|source| ImageIoError::Image {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(from_image(img.to_rgb8()))
}

pub fn save_rgb(img: &RgbImage, path: impl AsRef<Path>) -> Result<(), ImageIoError> {
    let path = path.as_ref();
    to_image(img)?
        .save(path)
        .map_err(|source| ImageIoError::Image {
            path: path.to_path_buf(),
            source,
        })
}

/// Frames read in file-name order from a directory of still images.
#[derive(Clone, Debug)]
pub struct ImageDirSource {
    paths: Vec<PathBuf>,
    next: usize,
}

impl ImageDirSource {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, ImageIoError> {
        let dir = dir.as_ref();
        let io_err = |source| ImageIoError::Io {
            path: dir.to_path_buf(),
            source,
        };
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            let is_frame = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| FRAME_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if is_frame && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();
        log::info!("{} frames in {}", paths.len(), dir.display());
        Ok(Self { paths, next: 0 })
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl FrameSource for ImageDirSource {
    type Error = ImageIoError;

    fn next_frame(&mut self) -> Result<Option<RgbImage>, ImageIoError> {
        let Some(path) = self.paths.get(self.next) else {
            return Ok(None);
        };
        self.next += 1;
        load_rgb(path).map(Some)
    }
}

/// Writes annotated frames as `frame_00000.png`, `frame_00001.png`, ...
#[derive(Clone, Debug)]
pub struct ImageDirSink {
    dir: PathBuf,
}

impl ImageDirSink {
    /// Create `dir` (and parents) if missing.
    pub fn create(dir: impl AsRef<Path>) -> Result<Self, ImageIoError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| ImageIoError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("frame_{index:05}.png"))
    }
}

impl FrameSink for ImageDirSink {
    type Error = ImageIoError;

    fn write_frame(&mut self, index: usize, frame: &RgbImage) -> Result<(), ImageIoError> {
        save_rgb(frame, self.frame_path(index))
    }
}
