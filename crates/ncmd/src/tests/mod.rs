//! Test suites for the daemon bootstrap and replay loop.

mod support;
