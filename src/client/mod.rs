pub mod client;
pub mod exec;

pub use client::{RunArgs, SendArgs, ServerArgs, run_send, run_wrapped};
pub use exec::{CommandOutcome, run_command};
