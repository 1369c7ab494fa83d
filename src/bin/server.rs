//! Super AI chat HTTP server.
//! Run with: cargo run --bin superai-server

use std::process::ExitCode;

use superai_chat::start_superai;

fn main() -> ExitCode {
    start_superai::run()
}
