//! CLI integration tests, driving the binary against stand-in tools.

#![cfg(unix)]

mod common;

mod build_tests;
mod stage_tests;
