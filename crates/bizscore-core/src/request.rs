use crate::vocabulary::DEFAULT_INDUSTRY;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRequest {
    pub strategy_score: f64,
    pub process_score: f64,
    pub technology_score: f64,
    pub industry: String,
}

impl ScoreRequest {
    pub fn new(
        strategy_score: f64,
        process_score: f64,
        technology_score: f64,
        industry: impl Into<String>,
    ) -> Self {
        Self {
            strategy_score,
            process_score,
            technology_score,
            industry: industry.into(),
        }
    }

    pub const fn scores(&self) -> [f64; 3] {
        [self.strategy_score, self.process_score, self.technology_score]
    }
}

impl Default for ScoreRequest {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, DEFAULT_INDUSTRY)
    }
}
