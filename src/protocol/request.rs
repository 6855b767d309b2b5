use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TrapperError};
use crate::transport::framing::{self, FrameHeader, HEADER_LEN};

/// Request discriminator for pushed samples.
pub const REQUEST_TYPE: &str = "sender data";

/// One sample pushed to a trapper item
///
/// `clock` and `ns` are left out of the JSON when zero, in which case the
/// server stamps the value with its own receipt time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrapperData {
    pub host: String,
    pub key: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub clock: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub ns: i64,
}

fn is_zero(n: &i64) -> bool {
    *n == 0
}

impl TrapperData {
    pub fn new(host: impl Into<String>, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            key: key.into(),
            value: value.into(),
            clock: 0,
            ns: 0,
        }
    }

    /// Sets the collection time as epoch seconds plus nanoseconds of that second.
    pub fn with_timestamp(mut self, clock: i64, ns: i64) -> Self {
        self.clock = clock;
        self.ns = ns;
        self
    }

    pub fn at(self, time: DateTime<Utc>) -> Self {
        let clock = time.timestamp();
        let ns = i64::from(time.timestamp_subsec_nanos());
        self.with_timestamp(clock, ns)
    }
}

/// Outbound envelope; `request` must serialize before `data`.
#[derive(Debug, Serialize)]
struct Request<'a> {
    request: &'static str,
    data: &'a [TrapperData],
}

/// Builds the complete wire packet for a batch of samples
///
/// The JSON body is written straight after a placeholder header, then the
/// length field is patched once the body size is known. The size ceiling is
/// checked on the assembled packet.
pub fn build_request_packet(data: &[TrapperData]) -> Result<Vec<u8>> {
    let mut packet = Vec::with_capacity(HEADER_LEN + 128 * data.len().max(1));
    packet.extend_from_slice(&FrameHeader::new(0).encode());

    let req = Request {
        request: REQUEST_TYPE,
        data,
    };
    serde_json::to_writer(&mut packet, &req).map_err(TrapperError::Encode)?;
    packet.push(b'\n');

    framing::check_packet_size(packet.len())?;
    framing::patch_data_len(&mut packet);

    debug!(samples = data.len(), bytes = packet.len(), "built request packet");
    Ok(packet)
}
