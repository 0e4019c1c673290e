//! Daemon entrypoint; delegates to [`ncmd::run`].

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stderr = io::stderr().lock();
    ncmd::run(std::env::args_os(), &mut stderr)
}
