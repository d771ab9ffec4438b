//! Observability for the validators
//!
//! - Structured JSON log lines
//! - Typed validation events
//! - Atomic counters
//!
//! Observability never changes a validation outcome: logging failures are
//! swallowed and counters are write-only from the validators' side.

mod events;
mod logger;
mod metrics;

pub use events::ValidationEvent;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsSnapshot, ValidationMetrics};

/// Log a validation event at the severity its kind implies
pub fn log_event(event: ValidationEvent, fields: &[(&str, &str)]) {
    let severity = if event.is_fault() {
        Severity::Error
    } else if event == ValidationEvent::ValidationRejected {
        Severity::Info
    } else {
        Severity::Trace
    };
    Logger::log(severity, event.as_str(), fields);
}
