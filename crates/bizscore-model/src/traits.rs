use bizscore_core::FeatureVector;

use crate::error::ModelError;

/// A loaded, read-only regressor. Implementations are shared across request
/// threads and must not rely on interior mutability.
pub trait RegressionModel: Send + Sync {
    fn name(&self) -> &'static str;

    fn n_features(&self) -> usize;

    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError>;
}
