use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge, Encoder, HistogramVec,
    IntCounterVec, IntGauge, TextEncoder,
};

lazy_static! {
    // Generation Metrics
    pub static ref QUIZZES_GENERATED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "quizzes_generated_total",
        "Total number of quizzes generated",
        &["kind"]
    )
    .unwrap();

    pub static ref QUIZ_GENERATION_FAILURES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "quiz_generation_failures_total",
        "Total number of failed quiz generations",
        &["kind"]
    )
    .unwrap();

    // Session Metrics
    pub static ref SESSIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "sessions_total",
        "Total number of quiz sessions",
        &["status"]
    )
    .unwrap();

    pub static ref SESSIONS_ACTIVE: IntGauge = register_int_gauge!(
        "sessions_active",
        "Number of currently active quiz sessions"
    )
    .unwrap();

    pub static ref ANSWERS_SUBMITTED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "answers_submitted_total",
        "Total number of answers submitted",
        &["correct"]
    )
    .unwrap();

    // Achievement Metrics
    pub static ref ACHIEVEMENTS_AWARDED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "achievements_awarded_total",
        "Total number of achievements awarded",
        &["family"]
    )
    .unwrap();

    // Persistence Metrics
    pub static ref PERSISTENCE_OPERATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "persistence_operations_total",
        "Total number of history store operations",
        &["operation", "status"]
    )
    .unwrap();

    pub static ref PERSISTENCE_OPERATION_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "persistence_operation_duration_seconds",
        "History store operation duration in seconds",
        &["operation"],
        vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.5]
    )
    .unwrap();

    // Daily reset Metrics
    pub static ref DAILY_RESET_TICKS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "daily_reset_ticks_total",
        "Total number of daily reset checks",
        &["status"]
    )
    .unwrap();
}

/// Renders all metrics in Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| prometheus::Error::Msg(format!("Failed to convert metrics to UTF-8: {}", e)))
}

/// Helper: track history store operation with metrics
pub async fn track_persistence<F, T, E>(operation: &str, future: F) -> Result<T, E>
where
    F: std::future::Future<Output = Result<T, E>>,
{
    let start = std::time::Instant::now();
    let result = future.await;
    let duration = start.elapsed().as_secs_f64();

    let status = if result.is_ok() { "success" } else { "error" };

    PERSISTENCE_OPERATIONS_TOTAL
        .with_label_values(&[operation, status])
        .inc();

    PERSISTENCE_OPERATION_DURATION_SECONDS
        .with_label_values(&[operation])
        .observe(duration);

    result
}
