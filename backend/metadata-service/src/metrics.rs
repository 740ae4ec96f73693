use prometheus::{Encoder, HistogramVec, IntCounterVec, TextEncoder};

lazy_static::lazy_static! {
    pub static ref HANDLER_OPERATIONS_TOTAL: IntCounterVec = prometheus::register_int_counter_vec!(
        "metadata_handler_operations_total",
        "Handler operations by outcome",
        &["handler", "operation", "outcome"]
    ).expect("handler operation counter registers once");

    pub static ref HANDLER_OPERATION_DURATION_SECONDS: HistogramVec = prometheus::register_histogram_vec!(
        "metadata_handler_operation_duration_seconds",
        "Handler operation latency",
        &["handler", "operation"],
        vec![0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
    ).expect("handler operation histogram registers once");
}

/// Record one handler call; `outcome` is `success` or the error code
pub fn record_operation(handler: &str, operation: &str, outcome: &str, elapsed_seconds: f64) {
    HANDLER_OPERATIONS_TOTAL
        .with_label_values(&[handler, operation, outcome])
        .inc();
    HANDLER_OPERATION_DURATION_SECONDS
        .with_label_values(&[handler, operation])
        .observe(elapsed_seconds);
}

/// Render the default registry in the Prometheus text format
pub fn render() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
