use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::error::Error;
use crate::frame::FRAME_LEN;

/// Maps a normalized 0-1 image array to the probability of the healthy
/// class. The model-training service produces the artifact; this trait is
/// the seam it is consumed through.
pub trait Classifier: Send + Sync {
    fn predict(&self, input: &[f32]) -> Result<f32, Error>;
}

#[derive(Deserialize)]
struct Artifact {
    weights: Vec<f32>,
    bias: f32,
}

/// File-backed logistic model: one weight per input intensity plus a bias.
///
/// Loaded once at monitor startup; any load failure is `ModelUnavailable`
/// and fatal to the classifying process.
pub struct LogisticClassifier {
    weights: Vec<f32>,
    bias: f32,
}

impl LogisticClassifier {
    pub fn load(path: &Path) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path).map_err(|err| {
            Error::ModelUnavailable(format!("cannot read '{}': {err}", path.display()))
        })?;
        let artifact: Artifact = serde_json::from_str(&contents).map_err(|err| {
            Error::ModelUnavailable(format!("cannot parse '{}': {err}", path.display()))
        })?;
        if artifact.weights.len() != FRAME_LEN {
            return Err(Error::ModelUnavailable(format!(
                "expected {FRAME_LEN} weights, got {}",
                artifact.weights.len()
            )));
        }
        log::info!("classifier loaded from {}", path.display());
        Ok(Self {
            weights: artifact.weights,
            bias: artifact.bias,
        })
    }
}

impl Classifier for LogisticClassifier {
    fn predict(&self, input: &[f32]) -> Result<f32, Error> {
        if input.len() != self.weights.len() {
            return Err(Error::ModelUnavailable(format!(
                "input length {} does not match model ({})",
                input.len(),
                self.weights.len()
            )));
        }
        let z: f32 = self
            .weights
            .iter()
            .zip(input)
            .map(|(w, x)| w * x)
            .sum::<f32>()
            + self.bias;
        Ok(1.0 / (1.0 + (-z).exp()))
    }
}

impl fmt::Debug for LogisticClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogisticClassifier")
            .field("weights", &self.weights.len())
            .field("bias", &self.bias)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_artifact(name: &str, weights: usize, bias: f32) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        let artifact = serde_json::json!({
            "weights": vec![0.0f32; weights],
            "bias": bias,
        });
        std::fs::write(&path, artifact.to_string()).unwrap();
        path
    }

    #[test]
    fn load_missing_file_is_model_unavailable() {
        let path = std::env::temp_dir().join("sporewatch_no_such_model.json");
        assert!(matches!(
            LogisticClassifier::load(&path),
            Err(Error::ModelUnavailable(_))
        ));
    }

    #[test]
    fn load_rejects_wrong_weight_count() {
        let path = write_artifact("sporewatch_short_model.json", 16, 0.0);
        assert!(matches!(
            LogisticClassifier::load(&path),
            Err(Error::ModelUnavailable(_))
        ));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn zero_model_predicts_from_bias() {
        let path = write_artifact("sporewatch_bias_model.json", FRAME_LEN, 0.0);
        let model = LogisticClassifier::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        // sigmoid(0) = 0.5 regardless of input.
        let p = model.predict(&vec![1.0; FRAME_LEN]).unwrap();
        assert!((p - 0.5).abs() < 1e-6);
    }

    #[test]
    fn predict_rejects_mismatched_input() {
        let path = write_artifact("sporewatch_shape_model.json", FRAME_LEN, 0.0);
        let model = LogisticClassifier::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(matches!(
            model.predict(&[0.5; 3]),
            Err(Error::ModelUnavailable(_))
        ));
    }

    #[test]
    fn probability_stays_in_unit_interval() {
        let path = write_artifact("sporewatch_extreme_model.json", FRAME_LEN, 50.0);
        let model = LogisticClassifier::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let p = model.predict(&vec![0.0; FRAME_LEN]).unwrap();
        assert!((0.0..=1.0).contains(&p));
        assert!(p > 0.99);
    }
}
