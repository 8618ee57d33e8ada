//! Prometheus metrics for the messaging engine.
//!
//! - Render metrics (bundles built per event type, fallbacks, placeholder failures)
//! - Publish metrics (dispatch outcomes, signing failures by cause)
//! - Display metrics (local broadcast outcomes)

mod helpers;

pub use helpers::{encode_metrics, DisplayMetrics, PublishMetrics, RenderMetrics};

use lazy_static::lazy_static;
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "cyberherd";

lazy_static! {
    // ============================================================================
    // Render Metrics
    // ============================================================================

    /// Message bundles built, by event type
    pub static ref BUNDLES_RENDERED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_bundles_rendered_total", METRIC_PREFIX),
        "Total message bundles built",
        &["event_type"]
    ).unwrap();

    /// Bundles built for unknown event types (JSON fallback)
    pub static ref BUNDLE_FALLBACKS_TOTAL: IntCounter = register_int_counter!(
        format!("{}_bundle_fallbacks_total", METRIC_PREFIX),
        "Total bundles that fell back to a JSON payload"
    ).unwrap();

    /// Templates whose placeholders could not be rendered
    pub static ref RENDER_FAILURES_TOTAL: IntCounter = register_int_counter!(
        format!("{}_render_failures_total", METRIC_PREFIX),
        "Total templates rendered as raw text after a placeholder error"
    ).unwrap();

    // ============================================================================
    // Publish Metrics
    // ============================================================================

    /// Publish attempts by outcome
    pub static ref PUBLISH_OUTCOMES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_publish_outcomes_total", METRIC_PREFIX),
        "Publish attempts by outcome",
        &["outcome"]
    ).unwrap();

    /// Signing failures by cause
    pub static ref SIGNING_FAILURES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_signing_failures_total", METRIC_PREFIX),
        "Signing failures by cause",
        &["cause"]
    ).unwrap();

    // ============================================================================
    // Display Metrics
    // ============================================================================

    /// Display feed broadcasts by outcome
    pub static ref DISPLAY_BROADCASTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_display_broadcasts_total", METRIC_PREFIX),
        "Display feed broadcasts by outcome",
        &["outcome"]
    ).unwrap();
}
