//! Observability utilities.

mod logging;
mod spans;

pub use logging::init_logging;
pub use spans::{ResolveSpanAttributes, SpanTimer};
