//! Exact heap tracing through the allocator shim.
//!
//! Subjects that link `probescope-stub` route every heap operation
//! through one hook function carrying (event kind, size, align, addr);
//! breakpointing that single symbol gives alloc/dealloc pairing the
//! plain `__rust_alloc` hooks cannot.

use std::rc::Rc;

use log::warn;
use probescope_stub::{MEMTRACE_EVENT_ALLOC, MEMTRACE_HOOK_SYMBOL};

use crate::debugger::HitHandler;
use crate::instrument::SymbolPattern;
use crate::profile::{MetricDesc, MetricValue, ProfileBuilder};
use crate::stacktrace::StackTrace;
use crate::tracing::{prepared_trace, EventLog, ReportOptions, TracingEvent, TracingModule};

pub const MODULE_NAME: &str = "memtrace";

pub fn module() -> TracingModule {
    let mut module = TracingModule::new(MODULE_NAME, report);
    let log = module.sink();
    module.hook(SymbolPattern::system_name(MEMTRACE_HOOK_SYMBOL), event_handler(log));
    module
}

/// `__probescope_memtrace_event(event, size, align, ptr)`
fn event_handler(log: EventLog) -> HitHandler {
    Rc::new(move |frame| {
        let trace = StackTrace::capture(frame);
        let kind = frame.arg_unsigned(0)?;
        let size = frame.arg_unsigned(1)?;
        let align = frame.arg_unsigned(2)?;
        let addr = frame.arg_unsigned(3)?;

        let event = if kind == MEMTRACE_EVENT_ALLOC {
            TracingEvent::Allocation { trace, size, align }
        } else {
            TracingEvent::Deallocation { trace, addr, size, align }
        };
        log.borrow_mut().push(event);
        Ok(())
    })
}

#[allow(clippy::cast_possible_wrap)]
fn report(events: &[TracingEvent], options: &ReportOptions) -> ProfileBuilder {
    let mut builder =
        ProfileBuilder::new(vec![MetricDesc::int("bytes", "heap delta")]);
    for event in events {
        let delta = match event {
            TracingEvent::Allocation { size, .. } => *size as i64,
            TracingEvent::Deallocation { size, .. } => -(*size as i64),
            other => {
                warn!("memtrace reporter skipping foreign event {other:?}");
                continue;
            }
        };
        builder.add_event(&prepared_trace(event.stacktrace(), options), &[MetricValue::Int(delta)]);
    }
    builder
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debugger::scripted::{ScriptedFrame, ScriptedTarget};
    use crate::debugger::Symbol;
    use crate::domain::TargetId;

    #[test]
    fn hook_splits_alloc_and_dealloc_by_kind() {
        let mut target = ScriptedTarget::new(TargetId(4));
        target.add_symbol(Symbol::plain(MEMTRACE_HOOK_SYMBOL));
        let mut module = module();
        module.enable(&mut target);

        let alloc = ScriptedFrame::new(2)
            .push_frame(MEMTRACE_HOOK_SYMBOL, "/stub", "lib.rs", 40)
            .with_args(&[0, 64, 8, 0x5000]);
        let dealloc = ScriptedFrame::new(2)
            .push_frame(MEMTRACE_HOOK_SYMBOL, "/stub", "lib.rs", 40)
            .with_args(&[1, 64, 8, 0x5000]);
        target.fire_symbol(MEMTRACE_HOOK_SYMBOL, &alloc).unwrap();
        target.fire_symbol(MEMTRACE_HOOK_SYMBOL, &dealloc).unwrap();

        let events = module.events();
        assert!(matches!(events[0], TracingEvent::Allocation { size: 64, .. }));
        assert!(matches!(events[1], TracingEvent::Deallocation { addr: 0x5000, size: 64, .. }));
    }

    #[test]
    fn reporter_emits_signed_heap_deltas() {
        let mut target = ScriptedTarget::new(TargetId(4));
        target.add_symbol(Symbol::plain(MEMTRACE_HOOK_SYMBOL));
        let mut module = module();
        module.enable(&mut target);

        let alloc = ScriptedFrame::new(2)
            .push_frame(MEMTRACE_HOOK_SYMBOL, "/stub", "lib.rs", 40)
            .with_args(&[0, 128, 8, 0x6000]);
        let dealloc = ScriptedFrame::new(2)
            .push_frame(MEMTRACE_HOOK_SYMBOL, "/stub", "lib.rs", 40)
            .with_args(&[1, 128, 8, 0x6000]);
        target.fire_symbol(MEMTRACE_HOOK_SYMBOL, &alloc).unwrap();
        target.fire_symbol(MEMTRACE_HOOK_SYMBOL, &dealloc).unwrap();

        let builder = report(&module.events(), &ReportOptions::default());
        let profile = builder.build();
        assert_eq!(profile.sample.len(), 2);
        assert_eq!(profile.sample[0].metric[0].int_value, 128);
        assert_eq!(profile.sample[1].metric[0].int_value, -128);
    }
}
