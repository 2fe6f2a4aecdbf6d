//! Stack capture and resolution.
//!
//! [`StackTrace::capture`] converts a stopped frame into an immutable
//! leaf-first frame sequence by walking parent frames outward until the
//! entry frame. Display names are resolved lazily through the demangler;
//! resolution is idempotent and never fails a capture — on demangle
//! failure the raw system name stands in.

use rustc_demangle::try_demangle;

use crate::debugger::DebugFrame;
use crate::domain::ThreadId;

/// One captured frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    /// Linker-level name as the host reported it.
    pub system_name: String,
    /// Demangled name, filled by [`StackFrame::resolve`].
    display_name: Option<String>,
    pub directory: String,
    pub file: String,
    pub line: u32,
}

impl StackFrame {
    /// Frame assembled from raw capture data, display name unresolved.
    pub fn new(system_name: &str, directory: &str, file: &str, line: u32) -> Self {
        StackFrame {
            system_name: system_name.to_string(),
            display_name: None,
            directory: directory.to_string(),
            file: file.to_string(),
            line,
        }
    }

    fn from_debug_frame(frame: &dyn DebugFrame) -> Self {
        let entry = frame.line_entry().unwrap_or_default();
        StackFrame {
            system_name: frame.system_name().unwrap_or_default(),
            display_name: None,
            directory: entry.directory,
            file: entry.file,
            line: entry.line,
        }
    }

    /// Demangle the system name. Idempotent; a name the demangler
    /// rejects resolves to itself.
    pub fn resolve(&mut self) {
        if self.display_name.is_none() {
            let resolved = match try_demangle(&self.system_name) {
                Ok(demangled) => format!("{demangled:#}"),
                Err(_) => self.system_name.clone(),
            };
            self.display_name = Some(resolved);
        }
    }

    /// Resolved display name, falling back to the raw system name when
    /// unresolved.
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.system_name)
    }
}

/// Immutable ordered frame sequence for one thread, leaf first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackTrace {
    pub thread_id: ThreadId,
    frames: Vec<StackFrame>,
}

impl StackTrace {
    /// Capture the current thread's stack from the stopped frame,
    /// walking outward to the entry frame.
    pub fn capture(frame: &dyn DebugFrame) -> Self {
        let mut frames = Vec::new();
        collect_frames(frame, &mut frames);
        StackTrace { thread_id: frame.thread_id(), frames }
    }

    /// Assemble a trace from already-captured frames, leaf first. Hosts
    /// with their own capture mechanism feed the aggregator through
    /// this.
    pub fn from_frames(thread_id: ThreadId, frames: Vec<StackFrame>) -> Self {
        StackTrace { thread_id, frames }
    }

    /// Resolve display names for every frame.
    pub fn resolve(&mut self) {
        for frame in &mut self.frames {
            frame.resolve();
        }
    }

    /// Retain only frames whose resolved name starts with the module
    /// prefix. Trims library-internal frames before reporting;
    /// idempotent.
    pub fn filter_module(&mut self, module_prefix: &str) {
        self.frames.retain(|frame| frame.display_name().starts_with(module_prefix));
    }

    pub fn frames(&self) -> &[StackFrame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

// The parent() borrow chains outward, so the walk recurses instead of
// looping; subject stacks are bounded by the host's frame limit.
fn collect_frames(frame: &dyn DebugFrame, frames: &mut Vec<StackFrame>) {
    frames.push(StackFrame::from_debug_frame(frame));
    if let Some(parent) = frame.parent() {
        collect_frames(parent.as_ref(), frames);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debugger::scripted::ScriptedFrame;

    fn raw_frame(system_name: &str) -> StackFrame {
        StackFrame::new(system_name, "", "", 0)
    }

    #[test]
    fn capture_is_leaf_first() {
        let scripted = ScriptedFrame::new(9)
            .push_frame("__rust_alloc", "/alloc", "alloc.rs", 98)
            .push_frame("_ZN5myapp4main17h0000000000000000E", "/myapp", "main.rs", 12);

        let trace = StackTrace::capture(&scripted.leaf());
        assert_eq!(trace.thread_id, ThreadId(9));
        assert_eq!(trace.len(), 2);
        assert_eq!(trace.frames()[0].system_name, "__rust_alloc");
        assert_eq!(trace.frames()[1].file, "main.rs");
    }

    #[test]
    fn resolve_demangles_and_falls_back() {
        let mut mangled = raw_frame("_ZN5myapp4main17h0123456789abcdefE");
        mangled.resolve();
        assert_eq!(mangled.display_name(), "myapp::main");

        let mut plain = raw_frame("__rust_alloc");
        plain.resolve();
        assert_eq!(plain.display_name(), "__rust_alloc");
    }

    #[test]
    fn resolve_is_idempotent() {
        let mut frame = raw_frame("_ZN5myapp4main17h0123456789abcdefE");
        frame.resolve();
        let first = frame.display_name().to_string();
        frame.resolve();
        assert_eq!(frame.display_name(), first);
    }

    #[test]
    fn filter_module_is_idempotent() {
        let mut trace = StackTrace::from_frames(
            ThreadId(1),
            vec![
                raw_frame("_ZN5alloc7raw_vec11finish_grow17h0E"),
                raw_frame("_ZN5myapp4main17h0123456789abcdefE"),
                raw_frame("_ZN5myapp3run17h0123456789abcdefE"),
            ],
        );
        trace.resolve();
        trace.filter_module("myapp");
        let once = trace.clone();
        trace.filter_module("myapp");

        assert_eq!(trace, once);
        assert_eq!(trace.len(), 2);
        assert!(trace.frames().iter().all(|f| f.display_name().starts_with("myapp")));
    }
}
