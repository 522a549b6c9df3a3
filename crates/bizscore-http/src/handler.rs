use std::path::Path;
use std::sync::Arc;

use bizscore_core::{round_score, FeatureVector, ScoreRequest, DEFAULT_INDUSTRY};
use bizscore_model::{load_model, LoadedModel, ModelError, ModelInfo, RegressionModel};
use serde_json::{Map, Value};

use crate::error::ScoreError;
use crate::protocol::ScoreResponse;

pub const SCORE_METHOD: &str = "POST";

pub struct ScoringService {
    model: Arc<dyn RegressionModel>,
    info: ModelInfo,
}

impl ScoringService {
    pub fn new(loaded: LoadedModel) -> Self {
        Self {
            model: loaded.model,
            info: loaded.info,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        load_model(path).map(Self::new)
    }

    pub const fn info(&self) -> &ModelInfo {
        &self.info
    }

    pub fn handle(&self, method: &str, body: &[u8]) -> Result<ScoreResponse, ScoreError> {
        if method != SCORE_METHOD {
            return Err(ScoreError::MethodNotAllowed);
        }
        let request = parse_score_request(body)?;
        self.score(&request)
    }

    pub fn score(&self, request: &ScoreRequest) -> Result<ScoreResponse, ScoreError> {
        let features = FeatureVector::from_request(request);
        let raw = self
            .model
            .predict(&features)
            .map_err(|err| ScoreError::internal(err.to_string()))?;
        if !raw.is_finite() {
            return Err(ScoreError::internal(format!(
                "model {} produced a non-finite prediction",
                self.info.name
            )));
        }
        Ok(ScoreResponse {
            predicted_score: round_score(raw),
        })
    }
}

pub fn parse_score_request(body: &[u8]) -> Result<ScoreRequest, ScoreError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|err| ScoreError::invalid(format!("invalid JSON body: {err}")))?;
    let Value::Object(object) = value else {
        return Err(ScoreError::invalid("request body must be a JSON object"));
    };

    Ok(ScoreRequest {
        strategy_score: coerce_score(&object, "strategy_score")?,
        process_score: coerce_score(&object, "process_score")?,
        technology_score: coerce_score(&object, "technology_score")?,
        industry: industry_label(&object),
    })
}

fn coerce_score(object: &Map<String, Value>, field: &str) -> Result<f64, ScoreError> {
    let value = match object.get(field) {
        None => return Ok(0.0),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| ScoreError::invalid(format!("{field}: number is out of range")))?,
        Some(Value::String(s)) => s.trim().parse::<f64>().map_err(|_| {
            ScoreError::invalid(format!("{field}: could not convert string to float: '{s}'"))
        })?,
        Some(Value::Bool(b)) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Some(Value::Null) => {
            return Err(ScoreError::invalid(format!(
                "{field}: must be a number, not null"
            )));
        }
        Some(_) => {
            return Err(ScoreError::invalid(format!("{field}: must be a number")));
        }
    };
    if !value.is_finite() {
        return Err(ScoreError::invalid(format!("{field}: must be a finite number")));
    }
    Ok(value)
}

// Non-string values are kept in their JSON form, which no label can equal.
fn industry_label(object: &Map<String, Value>) -> String {
    match object.get("industry") {
        None => DEFAULT_INDUSTRY.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use bizscore_core::{FEATURE_WIDTH, NUMERIC_COUNT};

    use super::*;

    // Returns sum(x_i * (i + 1)) and counts calls.
    struct ProbeModel {
        calls: AtomicUsize,
        last: parking_lot::Mutex<Option<FeatureVector>>,
    }

    impl ProbeModel {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                last: parking_lot::Mutex::new(None),
            }
        }
    }

    impl RegressionModel for ProbeModel {
        fn name(&self) -> &'static str {
            "probe"
        }

        fn n_features(&self) -> usize {
            FEATURE_WIDTH
        }

        fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last.lock() = Some(*features);
            Ok(features
                .as_slice()
                .iter()
                .zip(1_u32..)
                .map(|(x, w)| x * f64::from(w))
                .sum::<f64>()
                / 3.0)
        }
    }

    struct FailingModel;

    impl RegressionModel for FailingModel {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn n_features(&self) -> usize {
            FEATURE_WIDTH
        }

        fn predict(&self, _features: &FeatureVector) -> Result<f64, ModelError> {
            Err(ModelError::Inference("backend exploded".to_string()))
        }
    }

    fn service(model: Arc<dyn RegressionModel>) -> ScoringService {
        ScoringService::new(LoadedModel {
            info: ModelInfo {
                name: "test".to_string(),
                kind: model.name(),
                n_features: FEATURE_WIDTH,
            },
            model,
        })
    }

    #[test]
    fn saas_body_builds_expected_vector() {
        let probe = Arc::new(ProbeModel::new());
        let svc = service(probe.clone());
        let body = br#"{"strategy_score": 4, "process_score": 3, "technology_score": 5, "industry": "SaaS"}"#;

        let out = svc.handle("POST", body).expect("score");

        let seen = { *probe.last.lock() }.expect("vector recorded");
        assert_eq!(seen.numeric(), &[4.0, 3.0, 5.0]);
        let mut expected = [0.0; 21];
        expected[2] = 1.0;
        assert_eq!(seen.indicators(), &expected);
        // (4*1 + 3*2 + 5*3 + 1*6) / 3 = 31 / 3
        assert_eq!(out.predicted_score, 10.33);
    }

    #[test]
    fn non_post_methods_never_reach_the_model() {
        let probe = Arc::new(ProbeModel::new());
        let svc = service(probe.clone());
        for method in ["GET", "PUT", "DELETE", "PATCH", "OPTIONS", "post"] {
            assert_eq!(
                svc.handle(method, b"{}"),
                Err(ScoreError::MethodNotAllowed),
                "method {method}"
            );
        }
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let request = parse_score_request(b"{}").expect("parse");
        assert_eq!(request, ScoreRequest::default());
        let v = FeatureVector::from_request(&request);
        assert_eq!(v.numeric(), &[0.0; NUMERIC_COUNT]);
        assert_eq!(v.hot_index(), Some(20));
    }

    #[test]
    fn unknown_or_non_string_industry_encodes_empty_block() {
        for body in [
            br#"{"industry": "Aerospace"}"#.as_slice(),
            br#"{"industry": "saas"}"#.as_slice(),
            br#"{"industry": null}"#.as_slice(),
            br#"{"industry": 7}"#.as_slice(),
        ] {
            let request = parse_score_request(body).expect("parse");
            let v = FeatureVector::from_request(&request);
            assert_eq!(v.hot_index(), None, "body {}", String::from_utf8_lossy(body));
        }
    }

    #[test]
    fn numeric_strings_and_booleans_are_coerced() {
        let request = parse_score_request(
            br#"{"strategy_score": " 4.5 ", "process_score": true, "technology_score": "-2"}"#,
        )
        .expect("parse");
        assert_eq!(request.scores(), [4.5, 1.0, -2.0]);
    }

    #[test]
    fn uncoercible_fields_are_client_errors() {
        let cases: [(&[u8], &str); 6] = [
            (br#"{"strategy_score": "abc"}"#, "could not convert string to float: 'abc'"),
            (br#"{"process_score": null}"#, "process_score"),
            (br#"{"technology_score": [1]}"#, "technology_score"),
            (br#"{"strategy_score": "nan"}"#, "finite"),
            (br#"{"strategy_score": "inf"}"#, "finite"),
            (br#"{"strategy_score": {"v": 1}}"#, "strategy_score"),
        ];
        for (body, needle) in cases {
            let err = parse_score_request(body).expect_err("should fail");
            assert_eq!(err.status(), 400);
            assert!(err.to_string().contains(needle), "{err} lacks {needle}");
        }
    }

    #[test]
    fn malformed_bodies_are_client_errors() {
        for body in [b"".as_slice(), b"{not json".as_slice(), b"[1, 2]".as_slice(), b"42".as_slice()] {
            let err = parse_score_request(body).expect_err("should fail");
            assert!(matches!(err, ScoreError::InvalidInput(_)));
        }
    }

    #[test]
    fn model_failures_are_internal_errors() {
        let svc = service(Arc::new(FailingModel));
        let err = svc.handle("POST", b"{}").expect_err("should fail");
        assert_eq!(err.status(), 500);
        assert!(err.to_string().contains("backend exploded"));
    }
}
