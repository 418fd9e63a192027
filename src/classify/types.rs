use crate::classify::LabelVocabulary;
use crate::utils::error::TarotError;
use crate::Result;
use serde::Serialize;

/// 单个标签的预测结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionEntry {
    pub label: String,
    /// 模型原始输出分数，未做softmax
    pub confidence: f32,
}

/// 按置信度降序排列的预测列表
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct PredictionList(Vec<PredictionEntry>);

impl PredictionList {
    /// 按下标将分数与标签配对，再按置信度降序稳定排序
    pub fn rank(scores: &[f32], labels: &LabelVocabulary) -> Result<Self> {
        if scores.len() != labels.len() {
            return Err(TarotError::Inference(format!(
                "Model produced {} scores for {} labels",
                scores.len(),
                labels.len()
            )));
        }

        // NaN 在降序排序中会排到最前，直接拒绝
        if let Some(index) = scores.iter().position(|score| !score.is_finite()) {
            return Err(TarotError::Inference(format!(
                "Model produced non-finite score {} at index {}",
                scores[index], index
            )));
        }

        let mut entries: Vec<PredictionEntry> = labels
            .iter()
            .zip(scores)
            .map(|(label, &confidence)| PredictionEntry {
                label: label.to_string(),
                confidence,
            })
            .collect();

        // sort_by 是稳定排序，分数相同时保持原始下标顺序
        entries.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        Ok(Self(entries))
    }

    pub fn entries(&self) -> &[PredictionEntry] {
        &self.0
    }

    pub fn top(&self) -> Option<&PredictionEntry> {
        self.0.first()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
