//! Positional parameter binding
//!
//! Placeholders are numbered from 1 in the order fields were declared.

use super::accessor::FieldAccessor;
use super::errors::FrameworkFault;
use super::query::QueryFailure;
use super::value::Value;

/// Receives positional query parameters.
pub trait ParameterSink {
    /// Binds `value` to the 1-based placeholder `position`.
    fn bind(&mut self, position: usize, value: &Value) -> Result<(), QueryFailure>;
}

/// Binds an ordered list of values into a sink, one placeholder each.
pub struct ParameterBinder;

impl ParameterBinder {
    /// Reads every field from `record` and binds it in declaration order.
    ///
    /// Returns the number of parameters bound.
    pub fn bind_fields<R, S>(
        fields: &[FieldAccessor<R>],
        record: &R,
        sink: &mut S,
    ) -> Result<usize, FrameworkFault>
    where
        S: ParameterSink + ?Sized,
    {
        for (i, field) in fields.iter().enumerate() {
            let value = field.read(record).map_err(|source| FrameworkFault::Accessor {
                column: field.column().to_string(),
                source,
            })?;
            Self::bind_one(sink, i + 1, &value)?;
        }
        Ok(fields.len())
    }

    /// Binds explicit values in the order given.
    pub fn bind_values<S>(values: &[Value], sink: &mut S) -> Result<usize, FrameworkFault>
    where
        S: ParameterSink + ?Sized,
    {
        for (i, value) in values.iter().enumerate() {
            Self::bind_one(sink, i + 1, value)?;
        }
        Ok(values.len())
    }

    fn bind_one<S>(sink: &mut S, position: usize, value: &Value) -> Result<(), FrameworkFault>
    where
        S: ParameterSink + ?Sized,
    {
        sink.bind(position, value)
            .map_err(|source| FrameworkFault::Binding { position, source })
    }
}
