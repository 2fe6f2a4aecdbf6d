//! Operator command dispatch.
//!
//! Maps a parsed [`Args`] onto the module registry and the host's
//! selected target. Fatal conditions (no target, unknown module name)
//! abort before any side effect: nothing gets installed, nothing gets
//! written.

use std::path::PathBuf;

use log::info;

use crate::cli::{Action, Args};
use crate::debugger::DebugTarget;
use crate::domain::{CommandError, TargetId};
use crate::tracing::{ModuleRegistry, ReportOptions};

/// Run one operator command against the registry.
///
/// `target` is the host's currently selected target, if any;
/// `live_targets` is the host's live-target id set, used to reconcile
/// stale installation records before anything trusts them.
pub fn dispatch(
    registry: &mut ModuleRegistry,
    target: Option<&mut dyn DebugTarget>,
    live_targets: &[TargetId],
    args: &Args,
) -> Result<(), CommandError> {
    let Some(target) = target else {
        return Err(CommandError::NoTarget);
    };

    // The host may have destroyed targets out-of-band since the last
    // command; drop their records before acting on the selection.
    registry.reconcile(live_targets);

    let modules = registry.select_mut(&args.module)?;

    match args.action {
        Action::Enable => {
            for module in modules {
                module.enable(target);
            }
        }
        Action::Disable => {
            for module in modules {
                module.disable(target);
            }
        }
        Action::Report => {
            let options = ReportOptions {
                output_prefix: args.output.clone(),
                frame_filter: args.program.clone(),
                output_dir: PathBuf::from("."),
            };
            let target_id = target.id();
            for module in modules {
                module.report(target_id, &options)?;
            }
        }
        Action::List => {
            let target_id = target.id();
            info!("enabled modules:");
            for module in modules {
                if module.is_enabled(target_id) {
                    info!("  {}", module.name());
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debugger::scripted::ScriptedTarget;
    use crate::debugger::Symbol;
    use clap::Parser;

    fn args(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("probescope").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn missing_target_aborts_without_side_effects() {
        let mut registry = ModuleRegistry::with_builtin_modules();
        let err = dispatch(&mut registry, None, &[], &args(&["enable"])).unwrap_err();
        assert!(matches!(err, CommandError::NoTarget));
    }

    #[test]
    fn unknown_module_aborts_before_installing_anything() {
        let mut registry = ModuleRegistry::with_builtin_modules();
        let mut target = ScriptedTarget::new(TargetId(1));
        target.add_symbol(Symbol::plain("__rust_alloc"));

        let err = dispatch(
            &mut registry,
            Some(&mut target),
            &[TargetId(1)],
            &args(&["enable", "-m", "memory,bogus"]),
        )
        .unwrap_err();

        assert!(matches!(err, CommandError::UnknownModule(ref name) if name == "bogus"));
        assert_eq!(target.breakpoint_count(), 0);
    }

    #[test]
    fn enable_then_disable_round_trips() {
        let mut registry = ModuleRegistry::with_builtin_modules();
        let mut target = ScriptedTarget::new(TargetId(1));
        target.add_symbol(Symbol::plain("__rust_alloc"));
        let live = [TargetId(1)];

        dispatch(&mut registry, Some(&mut target), &live, &args(&["enable", "-m", "memory"]))
            .unwrap();
        assert!(registry.get("memory").unwrap().is_enabled(TargetId(1)));
        assert!(target.breakpoint_count() > 0);

        dispatch(&mut registry, Some(&mut target), &live, &args(&["disable", "-m", "memory"]))
            .unwrap();
        assert!(!registry.get("memory").unwrap().is_enabled(TargetId(1)));
        assert_eq!(target.breakpoint_count(), 0);
    }

    #[test]
    fn reconcile_runs_before_the_action() {
        let mut registry = ModuleRegistry::with_builtin_modules();
        let mut target = ScriptedTarget::new(TargetId(1));
        target.add_symbol(Symbol::plain("__rust_alloc"));

        dispatch(&mut registry, Some(&mut target), &[TargetId(1)], &args(&["enable", "-m", "memory"]))
            .unwrap();
        assert!(registry.get("memory").unwrap().is_enabled(TargetId(1)));

        // host destroyed the target out-of-band: the stale record is
        // pruned, so a fresh enable installs again instead of reporting
        // a duplicate
        let mut relaunched = ScriptedTarget::new(TargetId(2));
        relaunched.add_symbol(Symbol::plain("__rust_alloc"));
        dispatch(
            &mut registry,
            Some(&mut relaunched),
            &[TargetId(2)],
            &args(&["enable", "-m", "memory"]),
        )
        .unwrap();

        let memory = registry.get("memory").unwrap();
        assert!(!memory.is_enabled(TargetId(1)));
        assert!(memory.is_enabled(TargetId(2)));
    }
}
