use crate::{
    classify::{LabelVocabulary, PredictionList},
    image::{ImageLoader, ImageTransforms},
    models::{ModelHolder, ModelStats},
    Config, Result,
};
use serde::Serialize;
use std::time::Instant;

/// 图像分类流水线：解码 -> 缩放 -> 编码 -> 张量 -> 推理 -> 排序
#[derive(Clone)]
pub struct InferencePipeline {
    model: ModelHolder,
    labels: LabelVocabulary,
    input_size: u32,
    max_upload_size: usize,
}

impl InferencePipeline {
    pub fn new(config: &Config, model: ModelHolder, labels: LabelVocabulary) -> Self {
        Self {
            model,
            labels,
            input_size: config.input_size,
            max_upload_size: config.server_config.max_request_size,
        }
    }

    /// 按配置加载标签与模型，模型加载失败不会中断启动
    pub fn from_config(config: &Config) -> Result<Self> {
        let labels = match &config.labels_path {
            Some(path) => LabelVocabulary::from_file(path)?,
            None => LabelVocabulary::default(),
        };
        tracing::info!("Label vocabulary: {} cards", labels.len());

        let model = ModelHolder::load(config, labels.len());

        Ok(Self::new(config, model, labels))
    }

    pub fn labels(&self) -> &LabelVocabulary {
        &self.labels
    }

    pub fn model(&self) -> &ModelHolder {
        &self.model
    }

    /// 对上传的原始图像字节进行分类
    pub fn classify_bytes(&self, bytes: &[u8]) -> Result<PredictionList> {
        let start_time = Instant::now();

        let image = ImageLoader::from_bytes(bytes, self.max_upload_size)?;
        let resized = ImageTransforms::resize_exact(&image, self.input_size, self.input_size);
        drop(image);
        let decode_time = start_time.elapsed();

        let buffer = ImageTransforms::encode_jpeg(&resized)?;
        drop(resized);
        let tensor = ImageTransforms::to_tensor(&buffer)?;
        let preprocess_time = start_time.elapsed();

        let inference_start = Instant::now();
        let scores = self.model.predict(tensor)?;
        let inference_time = inference_start.elapsed();

        let predictions = PredictionList::rank(&scores, &self.labels)?;

        tracing::debug!(
            "Pipeline timings: decode={:.3}s, preprocess={:.3}s, inference={:.3}s",
            decode_time.as_secs_f32(),
            preprocess_time.as_secs_f32(),
            inference_time.as_secs_f32()
        );

        if let Some(top) = predictions.top() {
            tracing::info!(
                "Classification completed: top='{}' ({:.4}), total_time={:.3}s",
                top.label,
                top.confidence,
                start_time.elapsed().as_secs_f32()
            );
        }

        Ok(predictions)
    }

    /// 服务信息
    pub fn info(&self) -> PipelineInfo {
        PipelineInfo {
            model: self.model.stats(),
            labels: self.labels.clone(),
            label_count: self.labels.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineInfo {
    pub model: ModelStats,
    pub labels: LabelVocabulary,
    pub label_count: usize,
}
