use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Lifecycle state of a research run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResearchStatus {
    Running,
    Completed,
}

impl std::fmt::Display for ResearchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResearchStatus::Running => write!(f, "RUNNING"),
            ResearchStatus::Completed => write!(f, "COMPLETED"),
        }
    }
}

/// Token counts reported by the agent.
///
/// Both counts are absent until the run completes, serializing as `{}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<u64>,
}

impl TokenUsage {
    pub fn new(input: u64, output: u64) -> Self {
        Self {
            input: Some(input),
            output: Some(output),
        }
    }

    /// Input tokens, 0 when unreported.
    pub fn input_or_zero(&self) -> u64 {
        self.input.unwrap_or(0)
    }

    /// Output tokens, 0 when unreported.
    pub fn output_or_zero(&self) -> u64 {
        self.output.unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_none() && self.output.is_none()
    }
}

/// The stored result of one research run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchRecord {
    pub id: String,
    pub query: String,
    /// Record this run continues from. Not checked for existence.
    pub parent_id: Option<String>,
    pub status: ResearchStatus,
    pub report: Option<String>,
    /// First 800 characters of `report`.
    pub summary: Option<String>,
    pub reasoning: Option<String>,
    pub sources: Vec<String>,
    pub tokens: TokenUsage,
    pub cost: Decimal,
    pub trace_id: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl ResearchRecord {
    /// A fresh RUNNING record with every result field empty.
    pub fn running(id: String, query: String, parent_id: Option<String>) -> Self {
        Self {
            id,
            query,
            parent_id,
            status: ResearchStatus::Running,
            report: None,
            summary: None,
            reasoning: None,
            sources: Vec::new(),
            tokens: TokenUsage::default(),
            cost: Decimal::ZERO,
            trace_id: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == ResearchStatus::Completed
    }
}

/// A set of field changes merged into an existing record by `update`.
///
/// Unset fields leave the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResearchUpdate {
    pub status: Option<ResearchStatus>,
    pub report: Option<String>,
    pub summary: Option<String>,
    pub reasoning: Option<String>,
    pub sources: Option<Vec<String>>,
    pub tokens: Option<TokenUsage>,
    pub cost: Option<Decimal>,
    pub trace_id: Option<String>,
}

impl ResearchUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: ResearchStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn report(mut self, report: impl Into<String>) -> Self {
        self.report = Some(report.into());
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }

    pub fn sources(mut self, sources: Vec<String>) -> Self {
        self.sources = Some(sources);
        self
    }

    pub fn tokens(mut self, tokens: TokenUsage) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn cost(mut self, cost: Decimal) -> Self {
        self.cost = Some(cost);
        self
    }

    pub fn trace_id(mut self, trace_id: Option<String>) -> Self {
        self.trace_id = trace_id;
        self
    }

    /// Merge every set field into `record`.
    pub fn apply_to(self, record: &mut ResearchRecord) {
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(report) = self.report {
            record.report = Some(report);
        }
        if let Some(summary) = self.summary {
            record.summary = Some(summary);
        }
        if let Some(reasoning) = self.reasoning {
            record.reasoning = Some(reasoning);
        }
        if let Some(sources) = self.sources {
            record.sources = sources;
        }
        if let Some(tokens) = self.tokens {
            record.tokens = tokens;
        }
        if let Some(cost) = self.cost {
            record.cost = cost;
        }
        if let Some(trace_id) = self.trace_id {
            record.trace_id = Some(trace_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_record_has_empty_results() {
        let record = ResearchRecord::running("id-1".into(), "q".into(), None);
        assert_eq!(record.status, ResearchStatus::Running);
        assert!(record.report.is_none());
        assert!(record.summary.is_none());
        assert!(record.reasoning.is_none());
        assert!(record.sources.is_empty());
        assert!(record.tokens.is_empty());
        assert_eq!(record.cost, Decimal::ZERO);
        assert!(record.trace_id.is_none());
    }

    #[test]
    fn wire_shape() {
        let record = ResearchRecord::running("id-1".into(), "q".into(), Some("p".into()));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["status"], "RUNNING");
        assert_eq!(json["tokens"], serde_json::json!({}));
        assert_eq!(json["cost"], "0");
        assert_eq!(json["parent_id"], "p");
        assert!(json["created_at"].as_str().unwrap().contains('T'));

        let back: ResearchRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn completed_tokens_serialize_both_counts() {
        let json = serde_json::to_value(TokenUsage::new(1200, 1800)).unwrap();
        assert_eq!(json, serde_json::json!({"input": 1200, "output": 1800}));
    }

    #[test]
    fn update_merges_only_set_fields() {
        let mut record = ResearchRecord::running("id-1".into(), "q".into(), None);
        ResearchUpdate::new()
            .report("full report")
            .sources(vec!["WHO".into()])
            .apply_to(&mut record);

        assert_eq!(record.report.as_deref(), Some("full report"));
        assert_eq!(record.sources, vec!["WHO".to_string()]);
        assert_eq!(record.status, ResearchStatus::Running);
        assert!(record.summary.is_none());
        assert_eq!(record.query, "q");
    }

    #[test]
    fn status_displays_uppercase() {
        assert_eq!(ResearchStatus::Completed.to_string(), "COMPLETED");
    }
}
