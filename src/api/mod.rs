//! Public evaluation API.
//!
//! The [`Gatekeeper`] engine, the [`EvaluationContext`] it evaluates
//! against, and the [`EvaluationOutcome`] it returns.

mod context;
mod engine;
mod outcome;

pub use context::{EvaluationContext, EvaluationContextBuilder};
pub use engine::{Gatekeeper, GatekeeperBuilder};
pub use outcome::{Decision, EvaluationOutcome, TraceEntry};
