//! Observable validation events

use std::fmt;

/// Events emitted by the validators and the mapping loader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationEvent {
    /// A validation call found nothing to report
    ValidationPassed,
    /// A validation call returned violations
    ValidationRejected,
    /// Existence check skipped because a key field is auto-generated
    ExistenceCheckSkipped,
    /// Existence check aborted by a query or binding fault
    ExistenceCheckFailed,
    /// A field accessor failed outside of default substitution
    AccessorFault,
    /// Closing a query handle failed
    CleanupFault,
    /// An entity mapping was loaded or registered
    MappingLoaded,
}

impl ValidationEvent {
    /// Returns the event name as written to the log
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationEvent::ValidationPassed => "VALIDATION_PASSED",
            ValidationEvent::ValidationRejected => "VALIDATION_REJECTED",
            ValidationEvent::ExistenceCheckSkipped => "EXISTENCE_CHECK_SKIPPED",
            ValidationEvent::ExistenceCheckFailed => "EXISTENCE_CHECK_FAILED",
            ValidationEvent::AccessorFault => "ACCESSOR_FAULT",
            ValidationEvent::CleanupFault => "CLEANUP_FAULT",
            ValidationEvent::MappingLoaded => "MAPPING_LOADED",
        }
    }

    /// Faults are logged at ERROR, everything else lower
    pub fn is_fault(&self) -> bool {
        matches!(
            self,
            ValidationEvent::ExistenceCheckFailed
                | ValidationEvent::AccessorFault
                | ValidationEvent::CleanupFault
        )
    }
}

impl fmt::Display for ValidationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(ValidationEvent::ValidationPassed.as_str(), "VALIDATION_PASSED");
        assert_eq!(ValidationEvent::CleanupFault.to_string(), "CLEANUP_FAULT");
    }

    #[test]
    fn test_fault_events() {
        assert!(ValidationEvent::CleanupFault.is_fault());
        assert!(ValidationEvent::AccessorFault.is_fault());
        assert!(!ValidationEvent::ValidationRejected.is_fault());
        assert!(!ValidationEvent::ExistenceCheckSkipped.is_fault());
    }
}
