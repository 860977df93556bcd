//! Token usage tracking for model calls.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;
use uuid::Uuid;

/// A record of token usage for a single model call.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UsageRecord {
    pub usage_id: Uuid,
    pub student_id: Uuid,
    /// Set for tutor chat turns.
    pub session_id: Option<Uuid>,
    /// Which agent made the call (tutor, lesson, assignment, quiz, feedback).
    pub agent: String,
    pub model: String,
    pub input_tokens: i32,
    pub output_tokens: i32,
    pub created_utc: DateTime<Utc>,
}

impl UsageRecord {
    pub fn new(
        student_id: Uuid,
        session_id: Option<Uuid>,
        agent: &str,
        model: &str,
        input_tokens: i32,
        output_tokens: i32,
    ) -> Self {
        Self {
            usage_id: Uuid::new_v4(),
            student_id,
            session_id,
            agent: agent.to_string(),
            model: model.to_string(),
            input_tokens,
            output_tokens,
            created_utc: Utc::now(),
        }
    }

    pub fn total_tokens(&self) -> i64 {
        self.input_tokens as i64 + self.output_tokens as i64
    }
}

/// Aggregated usage statistics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UsageStats {
    pub total_input_tokens: i64,
    pub total_output_tokens: i64,
    pub total_tokens: i64,
    pub total_requests: i64,
    pub by_model: BTreeMap<String, UsageBucket>,
    pub by_agent: BTreeMap<String, UsageBucket>,
}

/// Usage for a single model or agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UsageBucket {
    pub tokens: i64,
    pub requests: i64,
}

impl UsageStats {
    /// Aggregate usage records into statistics.
    pub fn from_records(records: &[UsageRecord]) -> Self {
        let mut stats = UsageStats::default();

        for record in records {
            let tokens = record.total_tokens();
            stats.total_input_tokens += record.input_tokens as i64;
            stats.total_output_tokens += record.output_tokens as i64;
            stats.total_tokens += tokens;
            stats.total_requests += 1;

            let model = stats.by_model.entry(record.model.clone()).or_default();
            model.tokens += tokens;
            model.requests += 1;

            let agent = stats.by_agent.entry(record.agent.clone()).or_default();
            agent.tokens += tokens;
            agent.requests += 1;
        }

        stats
    }
}
