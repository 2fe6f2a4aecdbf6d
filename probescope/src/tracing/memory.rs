//! Allocation tracing via the `__rust_alloc` family.
//!
//! Hooks the allocator entry points every Rust binary exports, so it
//! works on unmodified subjects. Deallocations are not hooked here: the
//! return value of `__rust_alloc` is out of reach at function entry, so
//! alloc/dealloc pairing is impossible — that is what [`super::memtrace`]
//! and the allocator shim are for.

use std::rc::Rc;

use crate::debugger::HitHandler;
use crate::instrument::SymbolPattern;
use crate::profile::{MetricDesc, MetricValue, ProfileBuilder};
use crate::stacktrace::StackTrace;
use crate::tracing::{prepared_trace, EventLog, ReportOptions, TracingEvent, TracingModule};

pub const MODULE_NAME: &str = "memory";

pub fn module() -> TracingModule {
    let mut module = TracingModule::new(MODULE_NAME, report);
    let log = module.sink();
    module.hook(SymbolPattern::system_name("__rust_alloc"), alloc_handler(Rc::clone(&log)));
    module.hook(SymbolPattern::system_name("__rust_alloc_zeroed"), alloc_handler(Rc::clone(&log)));
    module.hook(SymbolPattern::system_name("__rust_realloc"), realloc_handler(log));
    module
}

/// `__rust_alloc(size, align)` / `__rust_alloc_zeroed(size, align)`
fn alloc_handler(log: EventLog) -> HitHandler {
    Rc::new(move |frame| {
        let trace = StackTrace::capture(frame);
        let size = frame.arg_unsigned(0)?;
        let align = frame.arg_unsigned(1)?;
        log.borrow_mut().push(TracingEvent::Allocation { trace, size, align });
        Ok(())
    })
}

/// `__rust_realloc(old_addr, old_size, align, new_size)`
fn realloc_handler(log: EventLog) -> HitHandler {
    Rc::new(move |frame| {
        let trace = StackTrace::capture(frame);
        let old_addr = frame.arg_unsigned(0)?;
        let old_size = frame.arg_unsigned(1)?;
        let align = frame.arg_unsigned(2)?;
        let new_size = frame.arg_unsigned(3)?;
        log.borrow_mut().push(TracingEvent::Reallocation {
            trace,
            old_addr,
            old_size,
            align,
            new_size,
        });
        Ok(())
    })
}

fn report(events: &[TracingEvent], options: &ReportOptions) -> ProfileBuilder {
    let mut builder = ProfileBuilder::new(vec![
        MetricDesc::unsigned("bytes", "allocation size"),
        MetricDesc::unsigned("bytes", "allocation alignment"),
    ]);
    for event in events {
        let values = match event {
            TracingEvent::Allocation { size, align, .. } => {
                [MetricValue::Uint(*size), MetricValue::Uint(*align)]
            }
            TracingEvent::Reallocation { new_size, align, .. } => {
                [MetricValue::Uint(*new_size), MetricValue::Uint(*align)]
            }
            _ => continue,
        };
        builder.add_event(&prepared_trace(event.stacktrace(), options), &values);
    }
    builder
}
