//! Query execution capability
//!
//! The validators never talk to a database directly. The host supplies a
//! `QueryExecutor` that prepares a statement, accepts positional parameters
//! and returns a cursor. Every handle obtained from it is held in a
//! `Scoped` guard and closed on all exit paths.

use std::error::Error;
use std::fmt;

use crate::observability::{log_event, ValidationEvent, ValidationMetrics};

use super::binder::ParameterSink;

/// The single failure kind surfaced by a query executor.
#[derive(Debug)]
pub struct QueryFailure {
    message: String,
    source: Option<Box<dyn Error + Send + Sync>>,
}

impl QueryFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create with the underlying driver error
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn Error + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for QueryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref source) = self.source {
            write!(f, " (caused by: {})", source)?;
        }
        Ok(())
    }
}

impl Error for QueryFailure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn Error + 'static))
    }
}

/// A handle that must be closed after use.
pub trait QueryResource {
    fn close(&mut self) -> Result<(), QueryFailure>;
}

/// Result handle of an executed query.
pub trait RowCursor: QueryResource {
    /// Advances to the next row, returning whether one was available.
    fn has_next(&mut self) -> Result<bool, QueryFailure>;
}

/// Statement handle with positional placeholders.
pub trait PreparedQuery: ParameterSink + QueryResource {
    type Cursor: RowCursor;

    fn execute(&mut self) -> Result<Self::Cursor, QueryFailure>;
}

/// Host-supplied capability to run parameterized queries.
///
/// Calls may block on I/O. Timeouts and cancellation belong to the
/// implementation; the validators only propagate its failures.
pub trait QueryExecutor {
    type Query: PreparedQuery;

    fn prepare(&mut self, query_text: &str) -> Result<Self::Query, QueryFailure>;
}

/// Owns a query handle for the duration of one validation call.
///
/// The handle is closed when the guard drops. A close failure is logged and
/// counted; it never replaces the outcome already computed by the caller.
pub(crate) struct Scoped<'m, T: QueryResource> {
    resource: T,
    kind: &'static str,
    metrics: &'m ValidationMetrics,
}

impl<'m, T: QueryResource> Scoped<'m, T> {
    pub(crate) fn new(resource: T, kind: &'static str, metrics: &'m ValidationMetrics) -> Self {
        Self {
            resource,
            kind,
            metrics,
        }
    }

    pub(crate) fn get_mut(&mut self) -> &mut T {
        &mut self.resource
    }
}

impl<T: QueryResource> Drop for Scoped<'_, T> {
    fn drop(&mut self) {
        if let Err(e) = self.resource.close() {
            self.metrics.increment_cleanup_faults();
            log_event(
                ValidationEvent::CleanupFault,
                &[("resource", self.kind), ("reason", &e.to_string())],
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Handle {
        closed: Rc<Cell<bool>>,
        fail_close: bool,
    }

    impl QueryResource for Handle {
        fn close(&mut self) -> Result<(), QueryFailure> {
            self.closed.set(true);
            if self.fail_close {
                Err(QueryFailure::new("close failed"))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_scoped_closes_on_drop() {
        let metrics = ValidationMetrics::new();
        let closed = Rc::new(Cell::new(false));
        {
            let _guard = Scoped::new(
                Handle {
                    closed: Rc::clone(&closed),
                    fail_close: false,
                },
                "cursor",
                &metrics,
            );
        }
        assert!(closed.get());
        assert_eq!(metrics.cleanup_faults(), 0);
    }

    #[test]
    fn test_close_failure_is_counted_not_raised() {
        let metrics = ValidationMetrics::new();
        let closed = Rc::new(Cell::new(false));

        let outcome: Result<u32, QueryFailure> = (|| {
            let _guard = Scoped::new(
                Handle {
                    closed: Rc::clone(&closed),
                    fail_close: true,
                },
                "statement",
                &metrics,
            );
            Ok(7)
        })();

        assert_eq!(outcome.unwrap(), 7);
        assert!(closed.get());
        assert_eq!(metrics.cleanup_faults(), 1);
    }

    #[test]
    fn test_failure_display_includes_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "broken pipe");
        let failure = QueryFailure::with_source("execute failed", io);
        let display = failure.to_string();
        assert!(display.contains("execute failed"));
        assert!(display.contains("broken pipe"));
        assert!(failure.source().is_some());
    }
}
