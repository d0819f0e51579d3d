use once_cell::sync::Lazy;
use prometheus::{register_int_counter, Encoder, IntCounter, TextEncoder};

// Prometheus metrics (default registry)
pub static INCREMENTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "clicks_increments_total",
        "Total successful counter increments"
    )
    .expect("register increments_total")
});

pub static COUNTER_RESETS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "clicks_counter_resets_total",
        "Total resets caused by a corrupt counter file"
    )
    .expect("register counter_resets_total")
});

pub static SAVE_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "clicks_save_failures_total",
        "Total failed writes of the counter file"
    )
    .expect("register save_failures_total")
});

/// Render every registered metric in the Prometheus text format.
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    // Touch the counters so they appear even before the first event.
    Lazy::force(&INCREMENTS_TOTAL);
    Lazy::force(&COUNTER_RESETS_TOTAL);
    Lazy::force(&SAVE_FAILURES_TOTAL);

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_registered_counters() {
        let text = encode_metrics().unwrap();
        assert!(text.contains("clicks_increments_total"));
        assert!(text.contains("clicks_counter_resets_total"));
        assert!(text.contains("clicks_save_failures_total"));
    }
}
