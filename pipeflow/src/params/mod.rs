//! Parameter scopes and their propagation into nested specifications.
//!
//! A [`ParamScope`] is threaded explicitly through every nesting level.
//! Each level derives its own scope from its parent's and never writes back.

mod context;
mod implicit;

pub use context::ParamScope;
pub use implicit::propagate_implicit_params;
