// Shared helpers for integration tests

use inkwell::context::Context;
use kaleido::driver::Driver;

pub fn init_env_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Run a whole session and return everything it printed, with trailing
/// whitespace stripped from each line.
pub fn run_session(source: &str) -> String {
    let context = Context::create();
    let mut out = Vec::new();
    Driver::new(&context, source.chars())
        .run(&mut out)
        .expect("writing to a Vec cannot fail");

    let text = String::from_utf8(out).expect("driver output is UTF-8");
    let mut normalized: String = text
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");
    normalized.push('\n');
    normalized
}
