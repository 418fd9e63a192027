use crate::utils::error::TarotError;
use crate::Result;
use image::{DynamicImage, ImageFormat};

pub struct ImageLoader;

impl ImageLoader {
    /// 从字节流加载图像
    pub fn from_bytes(bytes: &[u8], max_size: usize) -> Result<DynamicImage> {
        if bytes.len() > max_size {
            return Err(TarotError::FileTooLarge(bytes.len(), max_size));
        }

        match Self::detect_format(bytes) {
            Some(format) if !Self::is_supported_format(format) => {
                tracing::debug!("Uncommon upload format: {:?}", format);
            }
            Some(format) => tracing::debug!("Upload format: {:?}", format),
            None => tracing::debug!("Upload format not recognized"),
        }

        let image = image::load_from_memory(bytes)?;

        Ok(image)
    }

    /// 检测图像格式
    pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
        image::guess_format(bytes).ok()
    }

    /// 常见的上传格式
    pub fn is_supported_format(format: ImageFormat) -> bool {
        matches!(
            format,
            ImageFormat::Png
                | ImageFormat::Jpeg
                | ImageFormat::Bmp
                | ImageFormat::Gif
                | ImageFormat::Tiff
                | ImageFormat::WebP
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = RgbImage::from_pixel(width, height, Rgb([200, 10, 10]));
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn decodes_png_upload() {
        let image = ImageLoader::from_bytes(&png_bytes(12, 7), 1024 * 1024).unwrap();
        assert_eq!((image.width(), image.height()), (12, 7));
    }

    #[test]
    fn detects_png_format() {
        assert_eq!(ImageLoader::detect_format(&png_bytes(2, 2)), Some(ImageFormat::Png));
        assert_eq!(ImageLoader::detect_format(b"garbage"), None);
    }

    #[test]
    fn rejects_corrupt_bytes() {
        let err = ImageLoader::from_bytes(b"definitely not an image", 1024).unwrap_err();
        assert!(matches!(err, TarotError::ImageDecode(_)));
    }

    #[test]
    fn rejects_oversized_upload() {
        let bytes = png_bytes(4, 4);
        let err = ImageLoader::from_bytes(&bytes, 8).unwrap_err();
        assert!(matches!(err, TarotError::FileTooLarge(_, 8)));
    }
}
