pub mod labels;
pub mod pipeline;
pub mod types;

pub use labels::LabelVocabulary;
pub use pipeline::InferencePipeline;
pub use types::{PredictionEntry, PredictionList};
