use crate::models::CardClassifier;
use crate::utils::error::TarotError;
use crate::{Config, Result};
use ndarray::Array4;
use std::path::PathBuf;
use std::sync::Arc;

/// 推理后端接口：输入 [1, H, W, 3] 张量，返回原始分数
pub trait Predictor: Send + Sync {
    fn predict(&self, input: Array4<f32>) -> Result<Vec<f32>>;
}

/// 模型持有者
///
/// 启动时构造一次，通过状态注入到请求处理器中。加载失败时只记录日志，
/// 服务以无模型的降级状态继续运行，预测请求返回 `ModelUnavailable`。
#[derive(Clone)]
pub struct ModelHolder {
    predictor: Option<Arc<dyn Predictor>>,
    model_path: PathBuf,
    input_size: u32,
    intra_threads: usize,
    optimization_level: i32,
}

impl ModelHolder {
    /// 从配置加载模型，并用全零输入做一次预热检查
    pub fn load(config: &Config, label_count: usize) -> Self {
        tracing::info!("Initializing model holder...");

        let predictor = match CardClassifier::new(config) {
            Ok(classifier) => {
                let classifier: Arc<dyn Predictor> = Arc::new(classifier);
                match Self::warm_up(classifier.as_ref(), config.input_size, label_count) {
                    Ok(()) => {
                        tracing::info!("Success: Model loaded successfully");
                        Some(classifier)
                    }
                    Err(e) => {
                        tracing::error!("Error: Model warm-up failed: {}", e);
                        None
                    }
                }
            }
            Err(e) => {
                tracing::error!("Error: Failed to load model: {}", e);
                None
            }
        };

        if predictor.is_none() {
            tracing::warn!("Serving without a model, prediction requests will fail");
        }

        Self {
            predictor,
            ..Self::unloaded(config)
        }
    }

    /// 使用给定的推理后端
    pub fn with_predictor(config: &Config, predictor: Arc<dyn Predictor>) -> Self {
        Self {
            predictor: Some(predictor),
            ..Self::unloaded(config)
        }
    }

    /// 无模型的降级状态
    pub fn unloaded(config: &Config) -> Self {
        Self {
            predictor: None,
            model_path: config.model_path.clone(),
            input_size: config.input_size,
            intra_threads: config.onnx_config.intra_threads,
            optimization_level: config.onnx_config.optimization_level,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.predictor.is_some()
    }

    pub fn predict(&self, input: Array4<f32>) -> Result<Vec<f32>> {
        match &self.predictor {
            Some(predictor) => predictor.predict(input),
            None => Err(TarotError::ModelUnavailable),
        }
    }

    /// 获取模型统计信息
    pub fn stats(&self) -> ModelStats {
        ModelStats {
            model_path: self.model_path.display().to_string(),
            loaded: self.is_loaded(),
            input_size: self.input_size,
            intra_threads: self.intra_threads,
            optimization_level: self.optimization_level,
        }
    }

    fn warm_up(predictor: &dyn Predictor, input_size: u32, label_count: usize) -> Result<()> {
        let side = input_size as usize;
        let scores = predictor.predict(Array4::zeros((1, side, side, 3)))?;

        if scores.len() != label_count {
            tracing::warn!(
                "Model produces {} scores but the label vocabulary has {} entries",
                scores.len(),
                label_count
            );
        }

        Ok(())
    }
}

/// 模型统计信息
#[derive(Debug, Clone, serde::Serialize)]
pub struct ModelStats {
    pub model_path: String,
    pub loaded: bool,
    pub input_size: u32,
    pub intra_threads: usize,
    pub optimization_level: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingPredictor {
        calls: AtomicUsize,
    }

    impl Predictor for CountingPredictor {
        fn predict(&self, input: Array4<f32>) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![input.sum(); 5])
        }
    }

    #[test]
    fn missing_artifact_leaves_holder_unloaded() {
        let config = Config {
            model_path: "missing/model.onnx".into(),
            ..Config::default()
        };
        let holder = ModelHolder::load(&config, 5);

        assert!(!holder.is_loaded());
        assert!(!holder.stats().loaded);
        assert_eq!(holder.stats().model_path, "missing/model.onnx");
    }

    #[test]
    fn unloaded_holder_refuses_to_predict() {
        let holder = ModelHolder::unloaded(&Config::default());
        let err = holder.predict(Array4::zeros((1, 224, 224, 3))).unwrap_err();
        assert!(matches!(err, TarotError::ModelUnavailable));
    }

    #[test]
    fn delegates_to_injected_predictor() {
        let predictor = Arc::new(CountingPredictor {
            calls: AtomicUsize::new(0),
        });
        let holder = ModelHolder::with_predictor(&Config::default(), predictor.clone());

        let scores = holder.predict(Array4::from_elem((1, 2, 2, 3), 0.5)).unwrap();
        assert_eq!(scores, vec![6.0; 5]);
        assert_eq!(predictor.calls.load(Ordering::SeqCst), 1);
        assert!(holder.stats().loaded);
    }

    #[test]
    fn warm_up_tolerates_label_mismatch() {
        let predictor = CountingPredictor {
            calls: AtomicUsize::new(0),
        };
        assert!(ModelHolder::warm_up(&predictor, 8, 3).is_ok());
        assert_eq!(predictor.calls.load(Ordering::SeqCst), 1);
    }
}
