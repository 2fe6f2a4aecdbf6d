//! Dynamic instrumentation registry
//!
//! - [`pattern`]: symbol-matching rules (exact/regex over display or
//!   mangled names, plus file:line locations)
//! - [`session`]: per-target breakpoint installation and lifecycle

pub mod pattern;
pub mod session;

pub use pattern::SymbolPattern;
pub use session::{BreakpointManager, InstallOutcome, PatternRegistry};
