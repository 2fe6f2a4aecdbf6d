//! # Host Debugger Boundary
//!
//! The engine never talks to a concrete debugger directly. Everything it
//! needs from the host is expressed by two object-safe traits:
//!
//! - [`DebugTarget`] — one subject process/binary: symbol enumeration,
//!   breakpoint creation/deletion, stable identity.
//! - [`DebugFrame`] — the stopped frame at a breakpoint hit: thread id,
//!   call arguments, source line info, parent-frame walking and raw
//!   memory reads.
//!
//! A production host wraps its debugger API (e.g. the LLDB SB objects) in
//! these traits; [`scripted`] provides the in-memory host used by the
//! test suites and the examples.
//!
//! Breakpoints installed through this boundary always auto-continue: the
//! handler runs synchronously on the host's one execution-control thread
//! and the subject resumes as soon as it returns. Handlers therefore get
//! plain `&dyn DebugFrame` access and no locking.

pub mod scripted;

use std::rc::Rc;

use crate::domain::{BreakpointId, FrameAccessError, TargetId, ThreadId};

/// A named code location in one of the target's loaded modules.
///
/// Either name may be absent; pattern matching falls back from the
/// mangled name to the display name when the former is missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Symbol {
    /// Human-readable name, if the host resolved one.
    pub display_name: Option<String>,
    /// Linker-level (mangled) name.
    pub system_name: Option<String>,
}

impl Symbol {
    /// Symbol with identical display and system name, common for
    /// `extern "C"` functions.
    pub fn plain(name: &str) -> Self {
        Symbol { display_name: Some(name.to_string()), system_name: Some(name.to_string()) }
    }

    /// Symbol with distinct mangled and display names.
    pub fn mangled(system_name: &str, display_name: &str) -> Self {
        Symbol {
            display_name: Some(display_name.to_string()),
            system_name: Some(system_name.to_string()),
        }
    }
}

/// Source line information of a frame, as the host reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineEntry {
    pub directory: String,
    pub file: String,
    pub line: u32,
}

/// Callback invoked synchronously by the host when a breakpoint hits.
///
/// Stored as a first-class value in the pattern registration and handed
/// to the host at install time. Single-threaded by contract, hence `Rc`.
pub type HitHandler = Rc<dyn Fn(&dyn DebugFrame) -> Result<(), FrameAccessError>>;

/// What to configure on a newly created breakpoint.
pub struct BreakpointSpec {
    /// Resume the subject automatically after the handler returns.
    pub auto_continue: bool,
    /// Handler the host must invoke on each hit.
    pub handler: HitHandler,
}

impl BreakpointSpec {
    /// The configuration this engine always uses: auto-continue plus the
    /// given handler.
    pub fn auto_continue(handler: HitHandler) -> Self {
        BreakpointSpec { auto_continue: true, handler }
    }
}

/// Result of creating one breakpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakpointPlacement {
    pub id: BreakpointId,
    /// Number of code locations the breakpoint resolved to. Zero means
    /// the breakpoint exists but is unresolved (degraded install).
    pub locations: u32,
}

/// One subject process/binary under debugger control.
pub trait DebugTarget {
    /// Stable identity, never reused by the host.
    fn id(&self) -> TargetId;

    /// Every symbol of every loaded module, in module order.
    fn symbols(&self) -> Vec<Symbol>;

    /// Create a breakpoint at the given symbol.
    fn breakpoint_at_symbol(&mut self, symbol: &Symbol, spec: BreakpointSpec)
        -> BreakpointPlacement;

    /// Create a breakpoint at a file:line source location.
    fn breakpoint_at_location(
        &mut self,
        file: &str,
        line: u32,
        spec: BreakpointSpec,
    ) -> BreakpointPlacement;

    /// Delete a breakpoint by handle; returns whether it existed.
    fn delete_breakpoint(&mut self, id: BreakpointId) -> bool;
}

/// The stopped call frame a handler runs against.
///
/// Implementations expose the leaf frame; `parent()` walks outward until
/// the entry frame, which returns `None`.
pub trait DebugFrame {
    /// Id of the subject thread that hit the breakpoint.
    fn thread_id(&self) -> ThreadId;

    /// Linker-level name of the frame's function, when known.
    fn system_name(&self) -> Option<String>;

    /// Source line information, when debug info is available.
    fn line_entry(&self) -> Option<LineEntry>;

    /// Read the zero-based n-th integer call argument as unsigned.
    fn arg_unsigned(&self, index: u32) -> Result<u64, FrameAccessError>;

    /// Read the zero-based n-th integer call argument as signed.
    fn arg_signed(&self, index: u32) -> Result<i64, FrameAccessError>;

    /// Read `len` raw bytes of subject memory at `addr`.
    fn read_memory(&self, addr: u64, len: usize) -> Result<Vec<u8>, FrameAccessError>;

    /// Calling frame, or `None` at the entry frame.
    fn parent(&self) -> Option<Box<dyn DebugFrame + '_>>;
}
