pub mod classify;
pub mod fetch;
pub mod prediction;

pub use self::classify::{Classifier, LogisticClassifier};
pub use self::fetch::{CaptureClient, FetchController};
pub use self::prediction::PredictionResult;
