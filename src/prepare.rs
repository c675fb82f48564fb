use async_trait::async_trait;
use bytes::Bytes;
use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use crate::queue::errors::Result;
use crate::queue::types::{FileData, FileSource};

/// 缩略图最长边
pub const THUMBNAIL_BOUND: u32 = 256;

/// 缩略图编码质量
pub const THUMBNAIL_QUALITY: u8 = 80;

/// 图片任务传输前的预处理能力
///
/// 在队列任务上同步执行：任务 N 的预处理严格先于它的传输开始。
#[async_trait]
pub trait FilePreparer: Send + Sync {
    /// 将整个源读入内存
    async fn read_all(&self, source: &FileSource) -> Result<Bytes>;

    /// 从字节解码图片
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage>;

    /// 生成缩略图
    fn thumbnail(&self, image: &DynamicImage) -> DynamicImage;

    /// 等比缩小到给定边界内，不放大
    fn resize_to_fit(&self, image: DynamicImage, width: u32, height: u32) -> DynamicImage;

    /// 以给定质量重新编码为 JPEG
    fn compress(&self, image: &DynamicImage, quality: u8) -> Result<Bytes>;
}

/// 基于 `image` crate 的默认实现
#[derive(Debug, Default, Clone)]
pub struct ImagePreparer;

#[async_trait]
impl FilePreparer for ImagePreparer {
    async fn read_all(&self, source: &FileSource) -> Result<Bytes> {
        match &source.data {
            FileData::Path(path) => Ok(Bytes::from(tokio::fs::read(path).await?)),
            FileData::Bytes(bytes) => Ok(bytes.clone()),
        }
    }

    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage> {
        Ok(image::load_from_memory(bytes)?)
    }

    fn thumbnail(&self, image: &DynamicImage) -> DynamicImage {
        image.thumbnail(THUMBNAIL_BOUND, THUMBNAIL_BOUND)
    }

    fn resize_to_fit(&self, image: DynamicImage, width: u32, height: u32) -> DynamicImage {
        if image.width() <= width && image.height() <= height {
            return image;
        }
        image.resize(width, height, FilterType::Lanczos3)
    }

    fn compress(&self, image: &DynamicImage, quality: u8) -> Result<Bytes> {
        // JPEG 不支持透明通道
        let rgb = image.to_rgb8();
        let mut buffer = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
        encoder.encode(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )?;
        Ok(Bytes::from(buffer))
    }
}
