//! Embedded reference expressions.
//!
//! Values in a pipeline document may embed `$(...)` expressions. This module
//! finds them and decomposes the two grammars resolution cares about:
//! - `tasks.<task>.results.<result>` with an optional `[N]`/`[*]` selector
//! - `params.<name>` and `params.<name>[*]`
//!
//! Expressions matching neither grammar are ignored rather than rejected.

mod expressions;
mod param_ref;
mod result_ref;

pub use expressions::{contains_expression, scan, scan_all};
pub use param_ref::{param_refs_in, param_refs_in_param, param_template, ParamRef};
pub use result_ref::{
    result_refs, result_refs_in_condition, result_refs_in_param, result_refs_in_when, ResultRef,
    ResultSelector,
};
