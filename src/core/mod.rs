//! Core evaluation algorithms.
//!
//! Everything here is a stateless pure function over explicit parameters:
//! context, policy list, descriptor. No I/O, no locks, no shared mutable
//! state; the collaborator boundary lives in [`crate::store`].

pub mod expr;
pub mod matcher;
pub mod path;
pub mod template;

pub use expr::{Expr, NONE_SENTINEL};
pub use matcher::{run, select_distilled_prompts};
pub use path::resolve;
pub use template::render;
