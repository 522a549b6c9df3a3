use bizscore_core::FeatureVector;

use crate::artifact::LinearSpec;
use crate::error::ModelError;
use crate::traits::RegressionModel;

#[derive(Debug, Clone)]
pub struct LinearModel {
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LinearModel {
    pub fn new(spec: &LinearSpec, n_features: usize) -> Result<Self, ModelError> {
        if spec.coefficients.len() != n_features {
            return Err(ModelError::WidthMismatch {
                expected: n_features,
                found: spec.coefficients.len(),
            });
        }
        if !spec.intercept.is_finite() || spec.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ModelError::InvalidArtifact(
                "linear model has non-finite parameters".to_string(),
            ));
        }
        Ok(Self {
            coefficients: spec.coefficients.clone(),
            intercept: spec.intercept,
        })
    }
}

impl RegressionModel for LinearModel {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let x = features.as_slice();
        if x.len() != self.coefficients.len() {
            return Err(ModelError::WidthMismatch {
                expected: x.len(),
                found: self.coefficients.len(),
            });
        }
        Ok(self
            .coefficients
            .iter()
            .zip(x)
            .fold(self.intercept, |acc, (c, v)| c.mul_add(*v, acc)))
    }
}

#[cfg(test)]
mod tests {
    use bizscore_core::{ScoreRequest, FEATURE_WIDTH};

    use super::*;

    fn spec() -> LinearSpec {
        let mut coefficients = vec![0.0; FEATURE_WIDTH];
        coefficients[0] = 0.5;
        coefficients[1] = 0.25;
        coefficients[2] = 0.125;
        coefficients[5] = 1.0;
        LinearSpec {
            coefficients,
            intercept: 0.5,
        }
    }

    #[test]
    fn predicts_dot_product_plus_intercept() {
        let model = LinearModel::new(&spec(), FEATURE_WIDTH).expect("model");
        let v = FeatureVector::from_request(&ScoreRequest::new(4.0, 4.0, 8.0, "SaaS"));
        // 0.5 + 2.0 + 1.0 + 1.0 + 1.0
        assert_eq!(model.predict(&v).expect("predict"), 5.5);

        let v = FeatureVector::from_request(&ScoreRequest::new(4.0, 4.0, 8.0, "Finance"));
        assert_eq!(model.predict(&v).expect("predict"), 4.5);
    }

    #[test]
    fn coefficient_count_must_match_width() {
        let mut short = spec();
        short.coefficients.pop();
        assert!(matches!(
            LinearModel::new(&short, FEATURE_WIDTH),
            Err(ModelError::WidthMismatch { .. })
        ));
    }

    #[test]
    fn non_finite_parameters_are_rejected() {
        let mut bad = spec();
        bad.intercept = f64::NAN;
        assert!(matches!(
            LinearModel::new(&bad, FEATURE_WIDTH),
            Err(ModelError::InvalidArtifact(_))
        ));
    }
}
