//! Test utilities for SIL
//!
//! Temporary files and sample images shared by unit tests.

use image::{DynamicImage, Rgb, RgbImage};
use std::path::PathBuf;
use tempfile::TempDir;

/// Create a temporary directory for testing
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Encode a solid-color PNG of the given size
pub fn sample_png(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([210, 170, 150])));
    let mut bytes = std::io::Cursor::new(Vec::new());
    img.write_to(&mut bytes, image::ImageFormat::Png)
        .expect("Failed to encode PNG");
    bytes.into_inner()
}

/// Write `content` to `name` inside `dir`
pub fn create_test_file(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::ImageFile;

    #[test]
    fn test_image_file_from_path_detects_mime() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "face.png", &sample_png(8, 8));
        let file = tokio_test::block_on(ImageFile::from_path(&path)).unwrap();
        assert_eq!(file.name, "face.png");
        assert_eq!(file.mime, "image/png");

        let path = create_test_file(&dir, "notes.txt", b"hello");
        let file = tokio_test::block_on(ImageFile::from_path(&path)).unwrap();
        assert_eq!(file.mime, "application/octet-stream");
    }
}
