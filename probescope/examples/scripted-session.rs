//! Drive the whole engine against the scripted in-memory host:
//! enable the memory module, replay a few allocation hits, write the
//! profile, and print a short summary of the decoded artifact.
//!
//! ```bash
//! cargo run --example scripted-session
//! ```

use anyhow::{Context as _, Result};
use clap::Parser;
use prost::Message;
use probescope::cli::Args;
use probescope::commands::dispatch;
use probescope::debugger::scripted::{ScriptedFrame, ScriptedTarget};
use probescope::debugger::{DebugTarget, Symbol};
use probescope::domain::TargetId;
use probescope::profile::wire;
use probescope::tracing::ModuleRegistry;

const MAIN_SYM: &str = "_ZN4demo4main17h0123456789abcdefE";
const BUILD_SYM: &str = "_ZN4demo5build17hfedcba9876543210E";

fn main() -> Result<()> {
    env_logger::init();

    let mut registry = ModuleRegistry::with_builtin_modules();
    let mut target = ScriptedTarget::new(TargetId(1));
    target
        .add_symbol(Symbol::plain("__rust_alloc"))
        .add_symbol(Symbol::mangled(MAIN_SYM, "demo::main"))
        .add_symbol(Symbol::mangled(BUILD_SYM, "demo::build"));
    let live = [target.id()];

    let enable = Args::try_parse_from(["probescope", "enable", "-m", "memory"])?;
    dispatch(&mut registry, Some(&mut target), &live, &enable)?;

    // two distinct call sites, one of them hit twice
    for (size, line) in [(16u64, 10u32), (32, 10), (128, 22)] {
        let frame = ScriptedFrame::new(1)
            .push_frame("__rust_alloc", "/rustc/lib", "alloc.rs", 98)
            .push_frame(BUILD_SYM, "/home/dev/demo", "build.rs", line)
            .push_frame(MAIN_SYM, "/home/dev/demo", "main.rs", 3)
            .with_args(&[size, 8]);
        target
            .fire_symbol("__rust_alloc", &frame)
            .context("replaying allocation hit")?;
    }

    let report = Args::try_parse_from(["probescope", "report", "-m", "memory", "-o", "demo"])?;
    dispatch(&mut registry, Some(&mut target), &live, &report)?;

    let bytes = std::fs::read("demo.memory.prof").context("reading written profile")?;
    let profile = wire::Profile::decode(bytes.as_slice()).context("decoding profile")?;
    println!(
        "demo.memory.prof: {} samples, {} contexts, {} functions, {} strings",
        profile.sample.len(),
        profile.context.len(),
        profile.function.len(),
        profile.string_table.len()
    );

    Ok(())
}
