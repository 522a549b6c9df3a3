use crate::request::ScoreRequest;
use crate::vocabulary::{Vocabulary, INDUSTRY_COUNT, INDUSTRY_VOCABULARY};

pub const NUMERIC_FEATURES: [&str; 3] = ["strategy_score", "process_score", "technology_score"];
pub const NUMERIC_COUNT: usize = NUMERIC_FEATURES.len();
pub const FEATURE_WIDTH: usize = NUMERIC_COUNT + INDUSTRY_COUNT;
pub const INDUSTRY_FEATURE_PREFIX: &str = "industry_";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    values: [f64; FEATURE_WIDTH],
}

impl FeatureVector {
    pub fn from_request(request: &ScoreRequest) -> Self {
        Self::assemble(&INDUSTRY_VOCABULARY, request)
    }

    pub fn assemble(vocabulary: &Vocabulary, request: &ScoreRequest) -> Self {
        let mut values = [0.0; FEATURE_WIDTH];
        let (numeric, indicators) = values.split_at_mut(NUMERIC_COUNT);
        numeric.copy_from_slice(&request.scores());
        indicators.copy_from_slice(&encode_industry(vocabulary, &request.industry));
        Self { values }
    }

    pub const fn from_values(values: [f64; FEATURE_WIDTH]) -> Self {
        Self { values }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn numeric(&self) -> &[f64] {
        self.values.split_at(NUMERIC_COUNT).0
    }

    pub fn indicators(&self) -> &[f64] {
        self.values.split_at(NUMERIC_COUNT).1
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    pub fn hot_index(&self) -> Option<usize> {
        self.indicators().iter().position(|v| *v == 1.0)
    }

    pub const fn len(&self) -> usize {
        FEATURE_WIDTH
    }

    pub const fn is_empty(&self) -> bool {
        false
    }
}

pub fn encode_industry(vocabulary: &Vocabulary, industry: &str) -> [f64; INDUSTRY_COUNT] {
    let mut block = [0.0; INDUSTRY_COUNT];
    if let Some(slot) = vocabulary
        .index_of(industry)
        .and_then(|idx| block.get_mut(idx))
    {
        *slot = 1.0;
    }
    block
}

pub fn feature_names() -> Vec<String> {
    NUMERIC_FEATURES
        .iter()
        .map(|name| (*name).to_string())
        .chain(
            INDUSTRY_VOCABULARY
                .labels
                .iter()
                .map(|label| format!("{INDUSTRY_FEATURE_PREFIX}{label}")),
        )
        .collect()
}

/// Rounds to two decimal places using the exact binary value, so `2.675`
/// (stored just below the midpoint) becomes `2.67`.
pub fn round_score(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{value:.2}").parse().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hot_count(v: &FeatureVector) -> usize {
        v.indicators().iter().filter(|x| **x == 1.0).count()
    }

    #[test]
    fn saas_request_sets_third_indicator() {
        let request = ScoreRequest::new(4.0, 3.0, 5.0, "SaaS");
        let v = FeatureVector::from_request(&request);

        assert_eq!(v.len(), 24);
        assert_eq!(v.numeric(), &[4.0, 3.0, 5.0]);
        assert_eq!(v.hot_index(), Some(2));
        assert_eq!(hot_count(&v), 1);
        assert_eq!(v.get(5), Some(1.0));
        assert_eq!(v.get(3), Some(0.0));
    }

    #[test]
    fn every_label_maps_to_its_own_column() {
        for (idx, label) in INDUSTRY_VOCABULARY.labels.iter().enumerate() {
            let v = FeatureVector::from_request(&ScoreRequest::new(1.0, 2.0, 3.0, *label));
            assert_eq!(v.hot_index(), Some(idx), "label {label}");
            assert_eq!(hot_count(&v), 1);
        }
    }

    #[test]
    fn unknown_industry_leaves_block_empty() {
        let v = FeatureVector::from_request(&ScoreRequest::new(1.0, 1.0, 1.0, "Aerospace"));
        assert_eq!(v.hot_index(), None);
        assert!(v.indicators().iter().all(|x| *x == 0.0));
        assert_eq!(v.indicators().len(), 21);
    }

    #[test]
    fn default_request_is_zero_scores_and_other() {
        let v = FeatureVector::from_request(&ScoreRequest::default());
        assert_eq!(v.numeric(), &[0.0, 0.0, 0.0]);
        assert_eq!(v.hot_index(), Some(20));
    }

    #[test]
    fn feature_names_follow_vector_layout() {
        let names = feature_names();
        assert_eq!(names.len(), FEATURE_WIDTH);
        assert_eq!(names.first().map(String::as_str), Some("strategy_score"));
        assert_eq!(names.get(2).map(String::as_str), Some("technology_score"));
        assert_eq!(names.get(5).map(String::as_str), Some("industry_SaaS"));
        assert_eq!(names.last().map(String::as_str), Some("industry_Other"));
    }

    #[test]
    fn rounding_keeps_two_decimals() {
        assert_eq!(round_score(3.14159), 3.14);
        assert_eq!(round_score(-1.236), -1.24);
        assert_eq!(round_score(2.675), 2.67);
        assert_eq!(round_score(1.005), 1.0);
        assert_eq!(round_score(12.349), 12.35);
        assert_eq!(round_score(7.0), 7.0);
        assert!(round_score(f64::NAN).is_nan());
    }
}
