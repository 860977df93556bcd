//! Prometheus metrics for tutor-service.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, HistogramVec, TextEncoder,
};

/// Model calls by agent and outcome (success or error).
pub static LLM_CALLS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tutor_llm_calls_total",
        "Total number of model calls",
        &["agent", "outcome"]
    )
    .expect("Failed to register llm_calls_total")
});

pub static LLM_LATENCY: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "tutor_llm_latency_seconds",
        "Model call latency in seconds, retries included",
        &["agent"],
        vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 40.0, 60.0]
    )
    .expect("Failed to register llm_latency")
});

/// Tokens by agent and direction (input, output).
pub static LLM_TOKENS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tutor_llm_tokens_total",
        "Total model tokens",
        &["agent", "direction"]
    )
    .expect("Failed to register llm_tokens_total")
});

/// Responses that could not be parsed and were replaced with static content.
pub static PARSE_FALLBACKS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tutor_parse_fallbacks_total",
        "Total number of agent responses replaced by fallback content",
        &["agent"]
    )
    .expect("Failed to register parse_fallbacks_total")
});

pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "tutor_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

pub static SUBMISSIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tutor_submissions_total",
        "Total number of graded submissions by assignment kind",
        &["kind"]
    )
    .expect("Failed to register submissions_total")
});

pub static SCORES: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "tutor_submission_score",
        "Distribution of submission scores (0-100)",
        &["kind"],
        vec![10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0]
    )
    .expect("Failed to register submission_score")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&LLM_CALLS_TOTAL);
    Lazy::force(&LLM_LATENCY);
    Lazy::force(&LLM_TOKENS_TOTAL);
    Lazy::force(&PARSE_FALLBACKS_TOTAL);
    Lazy::force(&DB_QUERY_DURATION);
    Lazy::force(&SUBMISSIONS_TOTAL);
    Lazy::force(&SCORES);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gathered_output_contains_tutor_metrics() {
        init_metrics();
        PARSE_FALLBACKS_TOTAL.with_label_values(&["lesson"]).inc();

        let output = get_metrics();
        assert!(output.contains("tutor_parse_fallbacks_total"));
    }
}
