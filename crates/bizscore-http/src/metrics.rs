use std::collections::BTreeMap;

#[derive(Debug, Default, Clone)]
pub struct MetricsRegistry {
    responses: BTreeMap<u16, u64>,
    predictions: u64,
    latency_ms_sum: f64,
    latency_ms_max: f64,
}

impl MetricsRegistry {
    pub fn record_response(&mut self, status: u16, latency_ms: f64) {
        *self.responses.entry(status).or_insert(0) += 1;
        self.latency_ms_sum += latency_ms;
        if latency_ms > self.latency_ms_max {
            self.latency_ms_max = latency_ms;
        }
    }

    pub fn record_prediction(&mut self) {
        self.predictions += 1;
    }

    pub fn requests_total(&self) -> u64 {
        self.responses.values().sum()
    }

    pub const fn predictions_total(&self) -> u64 {
        self.predictions
    }

    pub fn render_text(&self) -> String {
        let mut lines = vec![
            "# TYPE bizscore_http_responses_total counter".to_string(),
            "# TYPE bizscore_predictions_total counter".to_string(),
            "# TYPE bizscore_http_latency_ms_sum counter".to_string(),
            "# TYPE bizscore_http_latency_ms_count counter".to_string(),
            "# TYPE bizscore_http_latency_ms_max gauge".to_string(),
        ];
        for (status, count) in &self.responses {
            lines.push(format!(
                "bizscore_http_responses_total{{status=\"{status}\"}} {count}"
            ));
        }
        lines.push(format!("bizscore_predictions_total {}", self.predictions));
        lines.push(format!(
            "bizscore_http_latency_ms_sum {:.3}",
            self.latency_ms_sum
        ));
        lines.push(format!(
            "bizscore_http_latency_ms_count {}",
            self.requests_total()
        ));
        lines.push(format!(
            "bizscore_http_latency_ms_max {:.3}",
            self.latency_ms_max
        ));
        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_responses_by_status() {
        let mut m = MetricsRegistry::default();
        m.record_response(200, 1.5);
        m.record_response(200, 2.5);
        m.record_response(405, 0.5);
        m.record_prediction();
        m.record_prediction();

        assert_eq!(m.requests_total(), 3);
        assert_eq!(m.predictions_total(), 2);

        let text = m.render_text();
        assert!(text.contains("bizscore_http_responses_total{status=\"200\"} 2"));
        assert!(text.contains("bizscore_http_responses_total{status=\"405\"} 1"));
        assert!(text.contains("bizscore_predictions_total 2"));
        assert!(text.contains("bizscore_http_latency_ms_sum 4.500"));
        assert!(text.contains("bizscore_http_latency_ms_max 2.500"));
    }
}
