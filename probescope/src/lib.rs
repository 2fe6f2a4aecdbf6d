//! # Probescope - Debugger-Hosted Tracing Profiler
//!
//! Probescope instruments a running native process under debugger
//! control: it installs auto-continuing breakpoints on allocation, lock
//! and clone entry points, captures a stack trace on every hit, and
//! aggregates the events into a deduplicated call-tree profile written
//! in a pprof-style binary format.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Subject Process                            │
//! │                 (under debugger control)                        │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ breakpoint hits (auto-continue)
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  Host Debugger (trait boundary)                 │
//! │     DebugTarget: symbols, breakpoints    DebugFrame: args,     │
//! │     and identity                         lines, memory, parents │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ synchronous handler invocation
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   Probescope (This Crate)                       │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐       │
//! │  │  Instrument  │──▶│   Tracing    │──▶│   Profile    │       │
//! │  │  (patterns,  │   │  (modules,   │   │ (call tree,  │       │
//! │  │ breakpoints) │   │  event logs) │   │ wire format) │       │
//! │  └──────────────┘   └──────────────┘   └──────────────┘       │
//! │         ▲                   ▲                                   │
//! │  ┌──────┴───────┐   ┌───────┴──────┐                           │
//! │  │     CLI      │──▶│   Commands   │                           │
//! │  │   (clap)     │   │  (dispatch)  │                           │
//! │  └──────────────┘   └──────────────┘                           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`instrument`]: symbol patterns and per-target breakpoint
//!   lifecycle (install / uninstall / reconcile)
//! - [`tracing`]: the toggleable modules (`memory`, `memtrace`,
//!   `clone`, `mutex`), their event logs and reporters
//! - [`profile`]: interning tables, call-tree construction and the
//!   wire-format serialization
//! - [`stacktrace`]: leaf-first stack capture and demangling
//! - [`debugger`]: the host boundary traits plus the scripted
//!   in-memory host
//! - [`cli`] / [`commands`]: the operator surface
//! - [`domain`]: identifier newtypes and structured errors
//!
//! ## Execution Model
//!
//! Everything runs on the host's one execution-control thread. A
//! handler executes synchronously while the subject is stopped at its
//! breakpoint and the subject resumes when it returns, so event logs
//! and interning tables need no locking. Disabling a module deletes its
//! breakpoints; sequential execution guarantees no handler is in flight
//! while that happens.
//!
//! ## Typical Embedding
//!
//! ```no_run
//! use probescope::cli::Args;
//! use probescope::commands::dispatch;
//! use probescope::debugger::DebugTarget;
//! use probescope::tracing::ModuleRegistry;
//! use clap::Parser;
//!
//! # fn host_target() -> probescope::debugger::scripted::ScriptedTarget {
//! #     probescope::debugger::scripted::ScriptedTarget::new(probescope::domain::TargetId(1))
//! # }
//! let mut registry = ModuleRegistry::with_builtin_modules();
//! let mut target = host_target();
//! let live = [target.id()];
//! let args = Args::try_parse_from(["probescope", "enable", "-m", "memory"]).unwrap();
//! dispatch(&mut registry, Some(&mut target), &live, &args).unwrap();
//! ```

pub mod cli;
pub mod commands;
pub mod debugger;
pub mod domain;
pub mod instrument;
pub mod profile;
pub mod stacktrace;
pub mod tracing;

pub use debugger::{DebugFrame, DebugTarget, Symbol};
pub use domain::{BreakpointId, CommandError, TargetId, ThreadId};
pub use instrument::{InstallOutcome, SymbolPattern};
pub use profile::{MetricDesc, MetricValue, ProfileBuilder};
pub use stacktrace::{StackFrame, StackTrace};
pub use tracing::{ModuleRegistry, ReportOptions, TracingEvent, TracingModule};
