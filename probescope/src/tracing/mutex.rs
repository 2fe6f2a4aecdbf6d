//! Lock tracing via standard-library source locations.
//!
//! `MutexGuard` construction and drop have no stable exported symbols,
//! so this module breakpoints the two `sync/mutex.rs` lines where guards
//! are born and die. On acquire the mutex address is the first call
//! argument; on release only the guard address is, and the mutex address
//! is recovered by reading the guard's first pointer-sized field out of
//! subject memory.

use std::rc::Rc;

use crate::debugger::HitHandler;
use crate::domain::FrameAccessError;
use crate::instrument::SymbolPattern;
use crate::profile::{MetricDesc, MetricValue, ProfileBuilder};
use crate::stacktrace::StackTrace;
use crate::tracing::{prepared_trace, EventLog, ReportOptions, TracingEvent, TracingModule};

pub const MODULE_NAME: &str = "mutex";

/// Standard-library source locations of guard construction and drop.
pub const GUARD_NEW_LOCATION: (&str, u32) = ("sync/mutex.rs", 501);
pub const GUARD_DROP_LOCATION: (&str, u32) = ("sync/mutex.rs", 525);

const POINTER_SIZE: usize = std::mem::size_of::<u64>();

pub fn module() -> TracingModule {
    let mut module = TracingModule::new(MODULE_NAME, report);
    let log = module.sink();
    module.hook(
        SymbolPattern::source_location(GUARD_NEW_LOCATION.0, GUARD_NEW_LOCATION.1),
        acquire_handler(Rc::clone(&log)),
    );
    module.hook(
        SymbolPattern::source_location(GUARD_DROP_LOCATION.0, GUARD_DROP_LOCATION.1),
        release_handler(log),
    );
    module
}

fn acquire_handler(log: EventLog) -> HitHandler {
    Rc::new(move |frame| {
        let trace = StackTrace::capture(frame);
        let mutex_addr = frame.arg_unsigned(0)?;
        log.borrow_mut().push(TracingEvent::LockAcquire { trace, mutex_addr });
        Ok(())
    })
}

fn release_handler(log: EventLog) -> HitHandler {
    Rc::new(move |frame| {
        let trace = StackTrace::capture(frame);
        let guard_addr = frame.arg_unsigned(0)?;
        let bytes = frame.read_memory(guard_addr, POINTER_SIZE)?;
        let raw: [u8; POINTER_SIZE] =
            bytes.as_slice().try_into().map_err(|_| FrameAccessError::ShortRead {
                addr: guard_addr,
                expected: POINTER_SIZE,
                actual: bytes.len(),
            })?;
        let mutex_addr = u64::from_le_bytes(raw);
        log.borrow_mut().push(TracingEvent::LockRelease { trace, mutex_addr });
        Ok(())
    })
}

fn report(events: &[TracingEvent], options: &ReportOptions) -> ProfileBuilder {
    let mut builder = ProfileBuilder::new(vec![MetricDesc::unsigned("count", "lock acquisitions")]);
    for event in events {
        if let TracingEvent::LockAcquire { trace, .. } = event {
            builder.add_event(&prepared_trace(trace, options), &[MetricValue::Uint(1)]);
        }
    }
    builder
}
