use crate::models::Predictor;
use crate::utils::error::TarotError;
use crate::{Config, Result};
use ndarray::{Array4, ArrayViewD};
use ort::{
    inputs,
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
};
use parking_lot::Mutex;

/// 基于ONNX Runtime的塔罗牌分类模型
pub struct CardClassifier {
    session: Mutex<Session>,
    input_name: String,  // 动态发现的输入名称
    output_name: String, // 动态发现的输出名称
    input_size: usize,
}

impl CardClassifier {
    pub fn new(config: &Config) -> Result<Self> {
        let model_path = &config.model_path;

        if !model_path.exists() {
            return Err(TarotError::ModelLoad(format!(
                "Classification model not found: {}",
                model_path.display()
            )));
        }

        tracing::info!("Loading classification model from: {}", model_path.display());

        let session = Session::builder()?
            .with_optimization_level(optimization_level(config.onnx_config.optimization_level))?
            .with_intra_threads(config.onnx_config.intra_threads)?
            .commit_from_file(model_path)?;

        let input_name = match session.inputs.first() {
            Some(input) => input.name.clone(),
            None => {
                return Err(TarotError::ModelLoad(
                    "Classification model has no inputs".to_string(),
                ))
            }
        };

        let output_name = match session.outputs.first() {
            Some(output) => output.name.clone(),
            None => {
                return Err(TarotError::ModelLoad(
                    "Classification model has no outputs".to_string(),
                ))
            }
        };

        tracing::info!(
            "Classification model io: input='{}', output='{}'",
            input_name,
            output_name
        );
        for (i, output) in session.outputs.iter().enumerate() {
            tracing::debug!("Classification output[{}]: '{}'", i, output.name);
        }

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
            input_size: config.input_size as usize,
        })
    }
}

impl Predictor for CardClassifier {
    fn predict(&self, input: Array4<f32>) -> Result<Vec<f32>> {
        let expected = [1, self.input_size, self.input_size, 3];
        if input.shape() != expected {
            return Err(TarotError::Inference(format!(
                "Expected input shape {:?}, got {:?}",
                expected,
                input.shape()
            )));
        }

        // 输入张量与会话输出都限定在此作用域内，离开时释放底层缓冲区
        let scores = {
            let input_tensor = Tensor::from_array(input)?;
            let mut session = self.session.lock();
            let outputs = session.run(inputs![self.input_name.as_str() => input_tensor])?;

            match outputs.get(self.output_name.as_str()) {
                Some(output) => output.try_extract_array::<f32>()?.into_owned(),
                None => {
                    let available_outputs: Vec<String> =
                        outputs.keys().map(|s| s.to_string()).collect();
                    return Err(TarotError::Inference(format!(
                        "Classification output '{}' not found. Available outputs: {:?}",
                        self.output_name, available_outputs
                    )));
                }
            }
        };

        flatten_scores(scores.view())
    }
}

/// 将 [1, N] 或 [N] 形状的输出展平为分数向量
pub(crate) fn flatten_scores(scores: ArrayViewD<f32>) -> Result<Vec<f32>> {
    match scores.shape() {
        [1, _] | [_] => Ok(scores.iter().copied().collect()),
        [batch, _] => Err(TarotError::Inference(format!(
            "Expected batch size 1 for classification, got {}",
            batch
        ))),
        shape => Err(TarotError::Inference(format!(
            "Expected 2D classification tensor, got shape {:?}",
            shape
        ))),
    }
}

fn optimization_level(level: i32) -> GraphOptimizationLevel {
    match level {
        i32::MIN..=0 => GraphOptimizationLevel::Disable,
        1 => GraphOptimizationLevel::Level1,
        2 => GraphOptimizationLevel::Level2,
        _ => GraphOptimizationLevel::Level3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2, Array3};

    #[test]
    fn flattens_single_batch_output() {
        let scores = arr2(&[[0.1f32, 0.7, 0.2]]).into_dyn();
        assert_eq!(flatten_scores(scores.view()).unwrap(), vec![0.1, 0.7, 0.2]);
    }

    #[test]
    fn accepts_rank_one_output() {
        let scores = arr1(&[0.5f32, 0.5]).into_dyn();
        assert_eq!(flatten_scores(scores.view()).unwrap().len(), 2);
    }

    #[test]
    fn rejects_multi_batch_output() {
        let scores = arr2(&[[0.1f32, 0.9], [0.3, 0.7]]).into_dyn();
        let err = flatten_scores(scores.view()).unwrap_err();
        assert!(matches!(err, TarotError::Inference(_)));
    }

    #[test]
    fn rejects_higher_rank_output() {
        let scores = Array3::<f32>::zeros((1, 2, 2)).into_dyn();
        assert!(flatten_scores(scores.view()).is_err());
    }

    #[test]
    fn missing_artifact_is_a_load_error() {
        let config = Config {
            model_path: "does/not/exist.onnx".into(),
            ..Config::default()
        };
        let err = CardClassifier::new(&config).err().unwrap();
        assert!(matches!(err, TarotError::ModelLoad(_)));
    }
}
