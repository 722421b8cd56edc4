use opentelemetry::{KeyValue, metrics::UpDownCounter};
use std::sync::LazyLock;

static STATDS: LazyLock<UpDownCounter<i64>> = LazyLock::new(|| {
    logfire::i64_up_down_counter("wa_echo_relay_statds")
        .with_description("WhatsApp webhook statistics")
        .with_unit("event")
        .build()
});

fn incr_statds(metric: String, value: String) {
    STATDS.add(1, &[KeyValue::new(metric, value)]);
}

/// Counts how each webhook request ended: handshake, acknowledged, echo_sent,
/// echo_failed or rejected.
pub fn incr_webhook_event_statds(event: &str) {
    incr_statds("webhook_event".to_string(), event.into())
}
