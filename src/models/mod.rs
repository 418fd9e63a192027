pub mod classifier;
pub mod manager;

pub use classifier::CardClassifier;
pub use manager::{ModelHolder, ModelStats, Predictor};
