//! Tracing modules: the unit an operator toggles.
//!
//! Each module pairs a pattern registry with an accumulating event log
//! and a reporter. Enabling a module resolves its patterns against one
//! target and installs auto-continuing breakpoints; every hit appends a
//! typed [`TracingEvent`]; reporting feeds the log into a fresh
//! [`ProfileBuilder`] and writes the serialized profile.
//!
//! Built-in modules:
//! - [`memory`]: `__rust_alloc` family, sizes and alignments
//! - [`memtrace`]: the allocator-shim hook, exact alloc/dealloc pairing
//! - [`clone`]: `Clone::clone` instantiations
//! - [`mutex`]: MutexGuard construction/drop by source location

pub mod clone;
pub mod memory;
pub mod memtrace;
pub mod mutex;

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use log::{info, warn};

use crate::debugger::{DebugTarget, HitHandler};
use crate::domain::{CommandError, ReportError, TargetId};
use crate::instrument::{BreakpointManager, InstallOutcome, SymbolPattern};
use crate::profile::ProfileBuilder;
use crate::stacktrace::StackTrace;

/// One captured event. Closed sum type so reporters can match
/// exhaustively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TracingEvent {
    Allocation { trace: StackTrace, size: u64, align: u64 },
    Reallocation { trace: StackTrace, old_addr: u64, old_size: u64, align: u64, new_size: u64 },
    Deallocation { trace: StackTrace, addr: u64, size: u64, align: u64 },
    Clone { trace: StackTrace },
    LockAcquire { trace: StackTrace, mutex_addr: u64 },
    LockRelease { trace: StackTrace, mutex_addr: u64 },
}

impl TracingEvent {
    pub fn stacktrace(&self) -> &StackTrace {
        match self {
            TracingEvent::Allocation { trace, .. }
            | TracingEvent::Reallocation { trace, .. }
            | TracingEvent::Deallocation { trace, .. }
            | TracingEvent::Clone { trace }
            | TracingEvent::LockAcquire { trace, .. }
            | TracingEvent::LockRelease { trace, .. } => trace,
        }
    }
}

/// Append-only event log, shared between a module and its installed
/// handlers. Single-threaded by the host contract, hence `Rc<RefCell>`.
pub type EventLog = Rc<RefCell<Vec<TracingEvent>>>;

/// Converts a module's accumulated events into a profile.
pub type Reporter = fn(&[TracingEvent], &ReportOptions) -> ProfileBuilder;

/// Output selection for one report run.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Prepended to the output file name: `<prefix>.<module>.prof`.
    pub output_prefix: Option<String>,
    /// Module prefix for the stack frame filter (the subject program's
    /// crate name, typically).
    pub frame_filter: Option<String>,
    /// Directory the profile files land in.
    pub output_dir: PathBuf,
}

impl Default for ReportOptions {
    fn default() -> Self {
        ReportOptions { output_prefix: None, frame_filter: None, output_dir: PathBuf::from(".") }
    }
}

impl ReportOptions {
    fn output_path(&self, module: &str) -> PathBuf {
        let file = match &self.output_prefix {
            Some(prefix) => format!("{prefix}.{module}.prof"),
            None => format!("{module}.prof"),
        };
        self.output_dir.join(file)
    }
}

/// Resolve and trim one event's trace for reporting: demangle display
/// names, then apply the module prefix filter when one was given.
pub(crate) fn prepared_trace(trace: &StackTrace, options: &ReportOptions) -> StackTrace {
    let mut trace = trace.clone();
    trace.resolve();
    if let Some(prefix) = &options.frame_filter {
        trace.filter_module(prefix);
    }
    trace
}

/// One toggleable tracing module.
pub struct TracingModule {
    name: &'static str,
    breakpoints: BreakpointManager,
    events: EventLog,
    reporter: Reporter,
}

impl std::fmt::Debug for TracingModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TracingModule").field("name", &self.name).finish()
    }
}

impl TracingModule {
    pub fn new(name: &'static str, reporter: Reporter) -> Self {
        TracingModule {
            name,
            breakpoints: BreakpointManager::new(),
            events: Rc::new(RefCell::new(Vec::new())),
            reporter,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Shared handle to the event log, for handler closures.
    pub fn sink(&self) -> EventLog {
        Rc::clone(&self.events)
    }

    /// Register a pattern with its handler. Construction-time only.
    pub fn hook(&mut self, pattern: SymbolPattern, handler: HitHandler) {
        self.breakpoints.registry_mut().register(pattern, handler);
    }

    /// Install this module's breakpoints on `target`, surfacing the
    /// tri-state outcome as operator diagnostics.
    pub fn enable(&mut self, target: &mut dyn DebugTarget) -> InstallOutcome {
        let outcome = self.breakpoints.install(target);
        match outcome {
            InstallOutcome::AlreadyInstalled => {
                warn!("tracing module '{}' is already enabled", self.name);
            }
            InstallOutcome::InstalledWithUnresolved => {
                warn!("tracing module '{}' enabled with unresolved patterns", self.name);
            }
            InstallOutcome::InstalledClean => {
                info!("tracing module '{}' is enabled", self.name);
            }
        }
        outcome
    }

    /// Tear down this module's breakpoints on `target`. Returns whether
    /// anything was installed.
    pub fn disable(&mut self, target: &mut dyn DebugTarget) -> bool {
        if self.breakpoints.uninstall(target) {
            info!("tracing module '{}' is disabled", self.name);
            true
        } else {
            warn!("tracing module '{}' is not enabled", self.name);
            false
        }
    }

    pub fn is_enabled(&self, target: TargetId) -> bool {
        self.breakpoints.is_installed(target)
    }

    /// Prune installation records for targets the host destroyed.
    pub fn reconcile(&mut self, live_targets: &[TargetId]) {
        self.breakpoints.reconcile(live_targets);
    }

    /// Empty the event log. Installation state is untouched.
    pub fn clear(&mut self) {
        self.events.borrow_mut().clear();
    }

    pub fn event_count(&self) -> usize {
        self.events.borrow().len()
    }

    /// Snapshot of the accumulated events.
    pub fn events(&self) -> Vec<TracingEvent> {
        self.events.borrow().clone()
    }

    /// Run this module's reporter over the accumulated events and write
    /// the profile under a module-derived file name. A silent no-op
    /// unless the module is enabled on `target`, matching `list`
    /// semantics.
    pub fn report(
        &self,
        target: TargetId,
        options: &ReportOptions,
    ) -> Result<Option<PathBuf>, ReportError> {
        if !self.is_enabled(target) {
            return Ok(None);
        }
        let events = self.events.borrow();
        let builder = (self.reporter)(&events, options);
        let path = options.output_path(self.name);
        builder.write_file(&path)?;
        info!(
            "module '{}' reported {} samples to {}",
            self.name,
            builder.sample_count(),
            path.display()
        );
        Ok(Some(path))
    }

    /// Breakpoint handles currently installed on `target`, for tests and
    /// diagnostics.
    pub fn installed_breakpoints(&self, target: TargetId) -> Option<Vec<crate::domain::BreakpointId>> {
        self.breakpoints.installed_breakpoints(target).map(<[_]>::to_vec)
    }
}

/// Explicit registry of tracing modules, owned by the embedding session.
/// Module names are unique; operator commands resolve against this.
#[derive(Default)]
pub struct ModuleRegistry {
    modules: Vec<TracingModule>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        ModuleRegistry { modules: Vec::new() }
    }

    /// Registry preloaded with the built-in modules.
    pub fn with_builtin_modules() -> Self {
        let mut registry = ModuleRegistry::new();
        registry.register(memory::module());
        registry.register(memtrace::module());
        registry.register(clone::module());
        registry.register(mutex::module());
        registry
    }

    pub fn register(&mut self, module: TracingModule) {
        self.modules.push(module);
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.modules.iter().map(TracingModule::name).collect()
    }

    pub fn get(&self, name: &str) -> Option<&TracingModule> {
        self.modules.iter().find(|m| m.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut TracingModule> {
        self.modules.iter_mut().find(|m| m.name() == name)
    }

    /// Select modules by name, defaulting to all when `names` is empty.
    /// An unknown name fails the whole selection before any module is
    /// touched.
    pub fn select_mut(
        &mut self,
        names: &[String],
    ) -> Result<Vec<&mut TracingModule>, CommandError> {
        for name in names {
            if !self.modules.iter().any(|m| m.name() == name) {
                return Err(CommandError::UnknownModule(name.clone()));
            }
        }
        if names.is_empty() {
            return Ok(self.modules.iter_mut().collect());
        }
        Ok(self
            .modules
            .iter_mut()
            .filter(|m| names.iter().any(|n| n == m.name()))
            .collect())
    }

    /// Prune every module's records for targets the host destroyed.
    pub fn reconcile(&mut self, live_targets: &[TargetId]) {
        for module in &mut self.modules {
            module.reconcile(live_targets);
        }
    }
}
