use tokio::io::{AsyncReadExt, AsyncWriteExt};
use crate::error::{Result, TrapperError};

/// Protocol magic at the start of every packet.
pub const MAGIC: [u8; 4] = *b"ZBXD";

/// Flag byte for standard (non-compressed, non-large) communications.
pub const FLAG_ZABBIX_COMMUNICATIONS: u8 = 0x01;

pub const DATA_LEN_OFFSET: usize = MAGIC.len() + 1;
const DATA_LEN_LEN: usize = 4;
const RESERVED_LEN: usize = 4;

/// Header size in bytes, exactly 13.
pub const HEADER_LEN: usize = DATA_LEN_OFFSET + DATA_LEN_LEN + RESERVED_LEN;

/// Largest packet (header included) that fits without the large packet extension.
pub const NON_LARGE_PACKET_SIZE_LIMIT: usize = 1024 * 1024 * 1024;

/// Fixed-size packet header
///
/// Layout: ["ZBXD"][flag][data length, u32 LE][reserved, u32 LE]
/// The data length counts payload bytes only, never the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub flag: u8,
    pub data_len: u32,
    pub reserved: u32,
}

impl FrameHeader {
    pub fn new(data_len: u32) -> Self {
        Self {
            flag: FLAG_ZABBIX_COMMUNICATIONS,
            data_len,
            reserved: 0,
        }
    }

    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[..MAGIC.len()].copy_from_slice(&MAGIC);
        buf[MAGIC.len()] = self.flag;
        buf[DATA_LEN_OFFSET..DATA_LEN_OFFSET + DATA_LEN_LEN]
            .copy_from_slice(&self.data_len.to_le_bytes());
        buf[DATA_LEN_OFFSET + DATA_LEN_LEN..].copy_from_slice(&self.reserved.to_le_bytes());
        buf
    }

    /// Decodes and validates a header: magic first, then the flag byte.
    pub fn decode(buf: &[u8; HEADER_LEN]) -> Result<Self> {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&buf[..MAGIC.len()]);
        if magic != MAGIC {
            return Err(TrapperError::UnexpectedProtocol { magic });
        }

        let flag = buf[MAGIC.len()];
        if flag != FLAG_ZABBIX_COMMUNICATIONS {
            return Err(TrapperError::UnsupportedFlag { flag });
        }

        let mut len_bytes = [0u8; DATA_LEN_LEN];
        len_bytes.copy_from_slice(&buf[DATA_LEN_OFFSET..DATA_LEN_OFFSET + DATA_LEN_LEN]);
        let mut reserved_bytes = [0u8; RESERVED_LEN];
        reserved_bytes.copy_from_slice(&buf[DATA_LEN_OFFSET + DATA_LEN_LEN..]);

        Ok(Self {
            flag,
            data_len: u32::from_le_bytes(len_bytes),
            reserved: u32::from_le_bytes(reserved_bytes),
        })
    }
}

/// Overwrites the data length field of an assembled packet with the real payload size.
pub fn patch_data_len(packet: &mut [u8]) {
    let data_len = (packet.len() - HEADER_LEN) as u32;
    packet[DATA_LEN_OFFSET..DATA_LEN_OFFSET + DATA_LEN_LEN].copy_from_slice(&data_len.to_le_bytes());
}

/// Fails when a packet of `size` bytes would need the large packet extension.
pub fn check_packet_size(size: usize) -> Result<()> {
    if size > NON_LARGE_PACKET_SIZE_LIMIT {
        return Err(TrapperError::PacketSizeLimitExceeded {
            size,
            limit: NON_LARGE_PACKET_SIZE_LIMIT,
        });
    }
    Ok(())
}

/// Reads and writes ZBXD frames over any async byte stream
pub struct FrameCodec;

impl FrameCodec {
    /// Writes one framed payload to the writer
    ///
    /// Format: [13-byte header][payload]
    /// This is the answering side's writer, used by peers and fake servers;
    /// requests are assembled in one buffer by `build_request_packet`.
    pub async fn write_frame<W>(writer: &mut W, data: &[u8]) -> Result<()>
    where
        W: AsyncWriteExt + Unpin,
    {
        check_packet_size(HEADER_LEN + data.len())?;

        let header = FrameHeader::new(data.len() as u32);
        writer.write_all(&header.encode()).await.map_err(TrapperError::Write)?;
        writer.write_all(data).await.map_err(TrapperError::Write)?;
        writer.flush().await.map_err(TrapperError::Write)?;

        Ok(())
    }

    /// Reads one frame and returns its payload bytes
    ///
    /// A bad magic or flag is rejected before anything past the header is read.
    pub async fn read_frame<R>(reader: &mut R) -> Result<Vec<u8>>
    where
        R: AsyncReadExt + Unpin,
    {
        let mut header_buf = [0u8; HEADER_LEN];
        reader
            .read_exact(&mut header_buf)
            .await
            .map_err(TrapperError::ReadHeader)?;

        let header = FrameHeader::decode(&header_buf)?;

        // The length is peer-controlled; refuse it before allocating
        let len = header.data_len as usize;
        if len > NON_LARGE_PACKET_SIZE_LIMIT - HEADER_LEN {
            return Err(TrapperError::ResponseTooLarge {
                len: header.data_len,
                limit: NON_LARGE_PACKET_SIZE_LIMIT - HEADER_LEN,
            });
        }

        let mut payload = vec![0u8; len];
        reader
            .read_exact(&mut payload)
            .await
            .map_err(TrapperError::ReadPayload)?;

        Ok(payload)
    }
}
