//! Per-target breakpoint installation and lifecycle.
//!
//! A [`PatternRegistry`] is target-independent: it only pairs patterns
//! with handler values. The [`BreakpointManager`] resolves the registry
//! against one target's symbol table at a time and keeps one
//! [`InstallationRecord`] per enabled target, so the same module can be
//! attached to several running processes (relaunches included) and each
//! disable stays precise.

use log::{info, warn};

use crate::debugger::{BreakpointSpec, DebugTarget, HitHandler};
use crate::domain::{BreakpointId, TargetId};
use crate::instrument::pattern::SymbolPattern;

/// (pattern, handler) pair. The handler is resolved once, at
/// registration time.
pub struct Registration {
    pub pattern: SymbolPattern,
    pub handler: HitHandler,
}

/// Append-only set of symbol-matching rules with their handlers.
///
/// Duplicate patterns are legal and both install. Construction-time
/// only; no runtime errors.
#[derive(Default)]
pub struct PatternRegistry {
    registrations: Vec<Registration>,
}

impl PatternRegistry {
    pub fn new() -> Self {
        PatternRegistry { registrations: Vec::new() }
    }

    pub fn register(&mut self, pattern: SymbolPattern, handler: HitHandler) {
        self.registrations.push(Registration { pattern, handler });
    }

    pub fn registrations(&self) -> &[Registration] {
        &self.registrations
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

/// Result of one `install` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// A live record already exists for this target; no side effects.
    AlreadyInstalled,
    /// Installed, but at least one pattern resolved to zero locations.
    InstalledWithUnresolved,
    /// Every pattern resolved to at least one location.
    InstalledClean,
}

/// Breakpoint handles installed on one target.
struct InstallationRecord {
    target: TargetId,
    breakpoints: Vec<BreakpointId>,
}

/// Resolves a [`PatternRegistry`] against targets and owns the installed
/// breakpoint sets.
#[derive(Default)]
pub struct BreakpointManager {
    registry: PatternRegistry,
    records: Vec<InstallationRecord>,
}

impl BreakpointManager {
    pub fn new() -> Self {
        BreakpointManager { registry: PatternRegistry::new(), records: Vec::new() }
    }

    pub fn registry_mut(&mut self) -> &mut PatternRegistry {
        &mut self.registry
    }

    /// Resolve every registered pattern against `target` and install
    /// auto-continuing breakpoints for each match.
    ///
    /// Idempotent per target: a second call without an intervening
    /// `uninstall` returns [`InstallOutcome::AlreadyInstalled`] and
    /// changes nothing. A pattern resolving to zero locations is logged
    /// and degrades the outcome but never aborts the remaining
    /// installations.
    pub fn install(&mut self, target: &mut dyn DebugTarget) -> InstallOutcome {
        let target_id = target.id();
        if self.is_installed(target_id) {
            return InstallOutcome::AlreadyInstalled;
        }

        let mut handles = Vec::new();
        let mut unresolved = 0usize;

        // Source-location patterns resolve directly against file:line,
        // independent of symbol enumeration.
        for reg in self.registry.registrations() {
            if let SymbolPattern::SourceLocation { file, line } = &reg.pattern {
                let placement = target.breakpoint_at_location(
                    file,
                    *line,
                    BreakpointSpec::auto_continue(reg.handler.clone()),
                );
                if placement.locations == 0 {
                    warn!("breakpoint {} resolved to 0 locations", reg.pattern);
                    unresolved += 1;
                }
                handles.push(placement.id);
            }
        }

        // Name and regex patterns are tested against every symbol of
        // every loaded module.
        let mut matched = vec![0usize; self.registry.len()];
        for symbol in target.symbols() {
            for (index, reg) in self.registry.registrations().iter().enumerate() {
                if reg.pattern.is_symbolic() && reg.pattern.matches(&symbol) {
                    let placement = target.breakpoint_at_symbol(
                        &symbol,
                        BreakpointSpec::auto_continue(reg.handler.clone()),
                    );
                    if placement.locations == 0 {
                        warn!("breakpoint {} resolved to 0 locations", reg.pattern);
                        unresolved += 1;
                    }
                    matched[index] += 1;
                    handles.push(placement.id);
                }
            }
        }

        // A symbolic pattern that matched nothing installs nothing; that
        // is still an unresolved pattern, not an abort.
        for (index, reg) in self.registry.registrations().iter().enumerate() {
            if reg.pattern.is_symbolic() && matched[index] == 0 {
                warn!("pattern {} matched no symbol in {target_id}", reg.pattern);
                unresolved += 1;
            }
        }

        info!("installed {} breakpoints on {target_id}", handles.len());
        self.records.push(InstallationRecord { target: target_id, breakpoints: handles });

        if unresolved > 0 {
            InstallOutcome::InstalledWithUnresolved
        } else {
            InstallOutcome::InstalledClean
        }
    }

    /// Remove and delete every breakpoint installed on `target`.
    /// Returns whether a record existed.
    pub fn uninstall(&mut self, target: &mut dyn DebugTarget) -> bool {
        let target_id = target.id();
        let Some(position) = self.records.iter().position(|r| r.target == target_id) else {
            return false;
        };
        let record = self.records.remove(position);
        for id in record.breakpoints {
            target.delete_breakpoint(id);
        }
        true
    }

    /// Prune records whose target the host has destroyed out-of-band.
    /// Must run before trusting the record set's completeness.
    pub fn reconcile(&mut self, live_targets: &[TargetId]) {
        self.records.retain(|record| live_targets.contains(&record.target));
    }

    pub fn is_installed(&self, target: TargetId) -> bool {
        self.records.iter().any(|record| record.target == target)
    }

    /// Breakpoint handles currently recorded for `target`.
    pub fn installed_breakpoints(&self, target: TargetId) -> Option<&[BreakpointId]> {
        self.records
            .iter()
            .find(|record| record.target == target)
            .map(|record| record.breakpoints.as_slice())
    }
}
