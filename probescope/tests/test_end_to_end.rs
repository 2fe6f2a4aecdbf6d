//! Full pipeline against the scripted host: enable, hit, report,
//! decode the written artifact.

use prost::Message;
use probescope::debugger::scripted::{ScriptedFrame, ScriptedTarget};
use probescope::debugger::Symbol;
use probescope::domain::TargetId;
use probescope::profile::wire;
use probescope::tracing::{memory, ReportOptions};

const MAIN_SYM: &str = "_ZN5myapp4main17h0123456789abcdefE";

fn allocation_frame(size: u64) -> ScriptedFrame {
    ScriptedFrame::new(11)
        .push_frame("__rust_alloc", "/rustc/lib", "alloc.rs", 98)
        .push_frame(MAIN_SYM, "/home/dev/myapp", "main.rs", 14)
        .with_args(&[size, 8])
}

#[test]
fn two_allocations_from_one_call_site_share_their_chain() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let mut target = ScriptedTarget::new(TargetId(1));
    target
        .add_symbol(Symbol::plain("__rust_alloc"))
        .add_symbol(Symbol::mangled(MAIN_SYM, "myapp::main"));

    let mut module = memory::module();
    module.enable(&mut target);

    target.fire_symbol("__rust_alloc", &allocation_frame(16)).unwrap();
    target.fire_symbol("__rust_alloc", &allocation_frame(32)).unwrap();

    let options = ReportOptions {
        output_prefix: Some("run1".to_string()),
        frame_filter: None,
        output_dir: tmp.path().to_path_buf(),
    };
    let path = module.report(TargetId(1), &options).expect("report succeeds").expect("written");
    assert_eq!(path, tmp.path().join("run1.memory.prof"));

    let bytes = std::fs::read(&path).expect("profile file exists");
    let profile = wire::Profile::decode(bytes.as_slice()).expect("profile decodes");

    // two samples, one shared two-frame chain
    assert_eq!(profile.sample.len(), 2);
    assert_eq!(profile.context.len(), 2);
    assert_eq!(profile.location.len(), 2);
    assert_eq!(profile.function.len(), 2);
    assert_eq!(profile.sample[0].context_id, profile.sample[1].context_id);

    // metric values [16, 8] and [32, 8]
    assert_eq!(profile.sample[0].metric[0].uint_value, 16);
    assert_eq!(profile.sample[1].metric[0].uint_value, 32);
    assert_eq!(profile.sample[0].metric[1].uint_value, 8);
    assert_eq!(profile.sample[1].metric[1].uint_value, 8);

    // the leaf context chains up to the demangled main frame
    let leaf = &profile.context[profile.sample[0].context_id as usize - 1];
    let root = &profile.context[leaf.parent_id as usize - 1];
    assert_eq!(root.parent_id, 0);
    let root_location = &profile.location[root.location_id as usize - 1];
    let root_function = &profile.function[root_location.line[0].function_id as usize - 1];
    let name = &profile.string_table[usize::try_from(root_function.name).unwrap()];
    assert_eq!(name, "myapp::main");
}

#[test]
fn frame_filter_trims_library_internals_from_the_report() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let mut target = ScriptedTarget::new(TargetId(1));
    target
        .add_symbol(Symbol::plain("__rust_alloc"))
        .add_symbol(Symbol::mangled(MAIN_SYM, "myapp::main"));

    let mut module = memory::module();
    module.enable(&mut target);
    target.fire_symbol("__rust_alloc", &allocation_frame(64)).unwrap();

    let options = ReportOptions {
        output_prefix: None,
        frame_filter: Some("myapp".to_string()),
        output_dir: tmp.path().to_path_buf(),
    };
    let path = module.report(TargetId(1), &options).unwrap().unwrap();
    assert_eq!(path, tmp.path().join("memory.prof"));

    let bytes = std::fs::read(&path).unwrap();
    let profile = wire::Profile::decode(bytes.as_slice()).unwrap();

    // the __rust_alloc leaf frame is filtered out, only myapp::main
    // remains
    assert_eq!(profile.sample.len(), 1);
    assert_eq!(profile.context.len(), 1);
    assert_eq!(profile.function.len(), 1);
}

#[test]
fn report_on_a_disabled_module_is_a_silent_no_op() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let module = memory::module();

    let options = ReportOptions {
        output_prefix: None,
        frame_filter: None,
        output_dir: tmp.path().to_path_buf(),
    };
    let written = module.report(TargetId(1), &options).expect("no error");
    assert!(written.is_none());
    assert!(!tmp.path().join("memory.prof").exists());
}
