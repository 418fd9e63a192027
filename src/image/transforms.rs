use crate::utils::error::TarotError;
use crate::Result;
use image::{imageops::FilterType, DynamicImage, ImageFormat};
use ndarray::{Array3, Array4, Axis};
use std::io::Cursor;

/// 图像变换工具集
pub struct ImageTransforms;

impl ImageTransforms {
    /// 缩放到固定尺寸（不保持宽高比）
    pub fn resize_exact(image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        image.resize_exact(width, height, FilterType::Triangle)
    }

    /// 重新编码为JPEG缓冲区
    pub fn encode_jpeg(image: &DynamicImage) -> Result<Vec<u8>> {
        // JPEG不支持alpha通道
        let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
        let mut buffer = Cursor::new(Vec::new());
        rgb.write_to(&mut buffer, ImageFormat::Jpeg)
            .map_err(|e| TarotError::BufferEncode(e.to_string()))?;

        Ok(buffer.into_inner())
    }

    /// 解码缓冲区并转换为归一化的 [1, H, W, 3] 张量
    pub fn to_tensor(buffer: &[u8]) -> Result<Array4<f32>> {
        let image = image::load_from_memory(buffer)?;
        let hwc = Self::to_array3(&image).mapv(|v| v / 255.0);

        // 添加batch维度
        Ok(hwc.insert_axis(Axis(0)))
    }

    /// 转换为 HWC 格式的 f32 数组，取值 0-255
    pub fn to_array3(image: &DynamicImage) -> Array3<f32> {
        let rgb_image = image.to_rgb8();
        let (width, height) = rgb_image.dimensions();
        let raw_data = rgb_image.into_raw();

        Array3::from_shape_fn((height as usize, width as usize, 3), |(h, w, c)| {
            raw_data[(h * width as usize + w) * 3 + c] as f32
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    #[test]
    fn resizes_to_exact_dimensions() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(640, 300));
        let resized = ImageTransforms::resize_exact(&image, 224, 224);
        assert_eq!((resized.width(), resized.height()), (224, 224));
    }

    #[test]
    fn black_image_becomes_zero_tensor() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(224, 224));
        let buffer = ImageTransforms::encode_jpeg(&image).unwrap();
        let tensor = ImageTransforms::to_tensor(&buffer).unwrap();

        assert_eq!(tensor.shape(), &[1, 224, 224, 3]);
        assert!(tensor.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn tensor_values_are_normalized() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(32, 32, Rgb([255, 255, 255])));
        let buffer = ImageTransforms::encode_jpeg(&image).unwrap();
        let tensor = ImageTransforms::to_tensor(&buffer).unwrap();

        assert!(tensor.iter().all(|v| (0.0..=1.0).contains(v)));
        assert!(tensor.iter().all(|v| *v > 0.95));
    }

    #[test]
    fn encodes_images_with_alpha() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 0])));
        let buffer = ImageTransforms::encode_jpeg(&image).unwrap();
        assert_eq!(image::guess_format(&buffer).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn array_layout_is_height_width_channel() {
        let mut image = RgbImage::new(3, 2);
        image.put_pixel(2, 1, Rgb([1, 2, 3]));
        let array = ImageTransforms::to_array3(&DynamicImage::ImageRgb8(image));

        assert_eq!(array.dim(), (2, 3, 3));
        assert_eq!(array[[1, 2, 0]], 1.0);
        assert_eq!(array[[1, 2, 2]], 3.0);
    }
}
