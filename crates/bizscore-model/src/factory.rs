use std::path::Path;
use std::sync::Arc;

use crate::artifact::{ModelArtifact, ModelSpec};
use crate::backends::{LinearModel, TreeEnsembleModel};
use crate::error::ModelError;
use crate::traits::RegressionModel;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    pub name: String,
    pub kind: &'static str,
    pub n_features: usize,
}

#[derive(Clone)]
pub struct LoadedModel {
    pub info: ModelInfo,
    pub model: Arc<dyn RegressionModel>,
}

pub fn build_model(artifact: &ModelArtifact) -> Result<Arc<dyn RegressionModel>, ModelError> {
    artifact.validate()?;
    match &artifact.model {
        ModelSpec::Linear(spec) => Ok(Arc::new(LinearModel::new(spec, artifact.n_features_in)?)),
        ModelSpec::TreeEnsemble(spec) => Ok(Arc::new(TreeEnsembleModel::new(
            spec,
            artifact.n_features_in,
        )?)),
    }
}

pub fn load_model(path: impl AsRef<Path>) -> Result<LoadedModel, ModelError> {
    let artifact = ModelArtifact::from_path(path)?;
    let model = build_model(&artifact)?;
    Ok(LoadedModel {
        info: ModelInfo {
            name: artifact.display_name().to_string(),
            kind: artifact.model.kind(),
            n_features: model.n_features(),
        },
        model,
    })
}
