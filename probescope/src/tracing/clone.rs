//! Clone-call tracing.
//!
//! `Clone::clone` instantiations keep a `5clone17h` fragment in their
//! legacy-mangled names (`5clone` is the length-prefixed path segment,
//! `17h` opens the instantiation hash), so one regex over the system
//! names of the target covers every monomorphization.

use std::rc::Rc;

use crate::debugger::HitHandler;
use crate::instrument::SymbolPattern;
use crate::profile::{MetricDesc, MetricValue, ProfileBuilder};
use crate::stacktrace::StackTrace;
use crate::tracing::{prepared_trace, EventLog, ReportOptions, TracingEvent, TracingModule};

pub const MODULE_NAME: &str = "clone";

const CLONE_SYMBOL_FRAGMENT: &str = "5clone17h";

pub fn module() -> TracingModule {
    let mut module = TracingModule::new(MODULE_NAME, report);
    let log = module.sink();
    let pattern =
        SymbolPattern::system_regex(CLONE_SYMBOL_FRAGMENT).expect("literal fragment compiles");
    module.hook(pattern, clone_handler(log));
    module
}

fn clone_handler(log: EventLog) -> HitHandler {
    Rc::new(move |frame| {
        let trace = StackTrace::capture(frame);
        log.borrow_mut().push(TracingEvent::Clone { trace });
        Ok(())
    })
}

fn report(events: &[TracingEvent], options: &ReportOptions) -> ProfileBuilder {
    let mut builder = ProfileBuilder::new(vec![MetricDesc::unsigned("count", "clone calls")]);
    for event in events {
        if let TracingEvent::Clone { trace } = event {
            builder.add_event(&prepared_trace(trace, options), &[MetricValue::Uint(1)]);
        }
    }
    builder
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debugger::scripted::{ScriptedFrame, ScriptedTarget};
    use crate::debugger::Symbol;
    use crate::domain::TargetId;
    use crate::instrument::InstallOutcome;

    const CLONE_SYM: &str = "_ZN60_$LT$alloc..string..String$u20$as$u20$core..clone..Clone$GT$5clone17h1111111111111111E";

    #[test]
    fn pattern_catches_every_clone_instantiation() {
        let mut target = ScriptedTarget::new(TargetId(2));
        target
            .add_symbol(Symbol::mangled(CLONE_SYM, "<String as Clone>::clone"))
            .add_symbol(Symbol::mangled("_ZN5myapp4main17h2222222222222222E", "myapp::main"));
        let mut module = module();

        assert_eq!(module.enable(&mut target), InstallOutcome::InstalledClean);
        assert_eq!(target.breakpoint_count(), 1);
    }

    #[test]
    fn clone_hits_count_once_each() {
        let mut target = ScriptedTarget::new(TargetId(2));
        target.add_symbol(Symbol::mangled(CLONE_SYM, "<String as Clone>::clone"));
        let mut module = module();
        module.enable(&mut target);

        let frame = ScriptedFrame::new(5)
            .push_frame(CLONE_SYM, "/alloc", "string.rs", 2000)
            .push_frame("_ZN5myapp4main17h2222222222222222E", "/myapp", "main.rs", 8);
        target.fire_symbol(CLONE_SYM, &frame).unwrap();
        target.fire_symbol(CLONE_SYM, &frame).unwrap();

        let builder = report(&module.events(), &ReportOptions::default());
        let profile = builder.build();
        assert_eq!(profile.sample.len(), 2);
        assert_eq!(profile.sample[0].metric[0].uint_value, 1);
        // same call site, one shared context chain
        assert_eq!(profile.sample[0].context_id, profile.sample[1].context_id);
    }
}
