//! Prometheus metrics for the messaging core
//!
//! Tracks send throughput, send failures by stage, attachment uploads, and
//! live subscription counts.

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram, register_int_counter_vec, register_int_gauge, Histogram, IntCounterVec,
    IntGauge,
};
use std::time::Duration;

/// Messages committed to the log, labeled by content kind
static MESSAGES_SENT_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "chat_messages_sent_total",
        "Messages committed to the message log",
        &["kind"]
    )
    .expect("failed to register chat_messages_sent_total")
});

/// Send attempts aborted mid-sequence, labeled by the stage that failed
static SEND_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "chat_send_failures_total",
        "Send attempts aborted before completion",
        &["stage"]
    )
    .expect("failed to register chat_send_failures_total")
});

/// Duration of attachment blob uploads
static ATTACHMENT_UPLOAD_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "chat_attachment_upload_seconds",
        "Duration of attachment blob uploads",
        vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 15.0, 60.0]
    )
    .expect("failed to register chat_attachment_upload_seconds")
});

/// Currently open live message subscriptions
static LIVE_SUBSCRIPTIONS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "chat_live_subscriptions",
        "Currently open live message subscriptions"
    )
    .expect("failed to register chat_live_subscriptions")
});

pub fn record_message_sent(kind: &str) {
    MESSAGES_SENT_TOTAL.with_label_values(&[kind]).inc();
}

pub fn record_send_failure(stage: &str) {
    SEND_FAILURES_TOTAL.with_label_values(&[stage]).inc();
}

pub fn record_attachment_upload_duration(duration: Duration) {
    ATTACHMENT_UPLOAD_SECONDS.observe(duration.as_secs_f64());
}

pub fn subscription_opened() {
    LIVE_SUBSCRIPTIONS.inc();
}

pub fn subscription_closed() {
    LIVE_SUBSCRIPTIONS.dec();
}
