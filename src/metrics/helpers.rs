//! Metrics helper structs for convenient metric recording

use prometheus::{Encoder, TextEncoder};

use super::{
    BUNDLES_RENDERED_TOTAL, BUNDLE_FALLBACKS_TOTAL, DISPLAY_BROADCASTS_TOTAL,
    PUBLISH_OUTCOMES_TOTAL, RENDER_FAILURES_TOTAL, SIGNING_FAILURES_TOTAL,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording render metrics
pub struct RenderMetrics;

impl RenderMetrics {
    /// Record a bundle built for the given event type
    pub fn record_bundle(event_type: &str) {
        BUNDLES_RENDERED_TOTAL.with_label_values(&[event_type]).inc();
    }

    /// Record a bundle that fell back to a JSON payload
    pub fn record_fallback() {
        BUNDLE_FALLBACKS_TOTAL.inc();
    }

    /// Record a template rendered raw after a placeholder error
    pub fn record_render_failure() {
        RENDER_FAILURES_TOTAL.inc();
    }
}

/// Helper struct for recording publish metrics
pub struct PublishMetrics;

impl PublishMetrics {
    pub fn record_published() {
        PUBLISH_OUTCOMES_TOTAL.with_label_values(&["published"]).inc();
    }

    /// Publishing switched off by the settings row
    pub fn record_disabled() {
        PUBLISH_OUTCOMES_TOTAL.with_label_values(&["disabled"]).inc();
    }

    /// No usable signing path
    pub fn record_skipped() {
        PUBLISH_OUTCOMES_TOTAL.with_label_values(&["skipped"]).inc();
    }

    pub fn record_failed() {
        PUBLISH_OUTCOMES_TOTAL.with_label_values(&["failed"]).inc();
    }

    /// Record a signing failure by cause
    pub fn record_signing_failure(cause: &str) {
        SIGNING_FAILURES_TOTAL.with_label_values(&[cause]).inc();
    }
}

/// Helper struct for recording display feed metrics
pub struct DisplayMetrics;

impl DisplayMetrics {
    pub fn record_sent() {
        DISPLAY_BROADCASTS_TOTAL.with_label_values(&["sent"]).inc();
    }

    pub fn record_failed() {
        DISPLAY_BROADCASTS_TOTAL.with_label_values(&["failed"]).inc();
    }
}
