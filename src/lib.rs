// Error types
pub mod error;

// Wire packets and responses
pub mod protocol;

// Framing and the TCP sender
pub mod transport;

// CLI commands
pub mod client;

// Utilities
pub mod util;

pub use error::{Phase, Result, TrapperError};
pub use protocol::{Response, TrapperData};
pub use transport::Sender;
