//! Core value types shared by the rest of the crate.
//!
//! This module contains:
//! - Parameter values, bindings and declarations
//! - Task execution status as reported by a scheduler
//! - Go-style duration strings used for task timeouts

pub mod duration;
mod param;
mod status;

pub use duration::{format_duration, parse_duration, DurationParseError};
pub use param::{Param, ParamSpec, ParamType, ParamValue};
pub use status::TaskStatus;
