pub mod request;
pub mod response;

pub use request::{TrapperData, build_request_packet};
pub use response::{InfoCounters, Response, parse_info, parse_response};
