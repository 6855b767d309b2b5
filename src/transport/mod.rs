pub mod framing;
pub mod tcp;

pub use framing::{FrameCodec, FrameHeader};
pub use tcp::{Sender, add_default_port, connect_within, deadline_after, round_trip, write_packet};
