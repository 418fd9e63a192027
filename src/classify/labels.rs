use crate::utils::error::TarotError;
use crate::Result;
use serde::Serialize;
use std::path::Path;

/// 内置的塔罗牌标签，顺序与模型输出下标一一对应
pub const DEFAULT_LABELS: [&str; 5] = [
    "The Fool",
    "The Magician",
    "The Chariot",
    "Temperence",
    "The Hierophant",
];

/// 模型输出下标到牌名的有序映射，启动后只读
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LabelVocabulary {
    labels: Vec<String>,
}

impl LabelVocabulary {
    pub fn new(labels: Vec<String>) -> Result<Self> {
        if labels.is_empty() {
            return Err(TarotError::Config("Label vocabulary is empty".to_string()));
        }

        Ok(Self { labels })
    }

    /// 从文本加载，每行一个标签，忽略空行与 `#` 注释
    pub fn parse(text: &str) -> Result<Self> {
        let labels = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect();

        Self::new(labels)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        tracing::info!("Loading label vocabulary from: {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

impl Default for LabelVocabulary {
    fn default() -> Self {
        Self {
            labels: DEFAULT_LABELS.iter().map(|s| s.to_string()).collect(),
        }
    }
}
