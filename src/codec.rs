use std::io;

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::lifecycle::TaskState;

const LEN_BYTES: usize = 4;
const CRC_BYTES: usize = 4;

/// Largest body a default codec accepts.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 1024 * 1024;

/// Frames [`TaskState`] records for a byte stream.
///
/// Format per frame: `[u32: len][bincode: TaskState][u32: crc32]`
/// - `len` is the byte length of the bincode body (not including the CRC).
/// - A partial frame stays buffered until the rest arrives.
/// - A bad CRC, undecodable body or body over the length limit is `InvalidData`.
#[derive(Debug, Clone, Copy)]
pub struct TaskStateCodec {
    max_frame_bytes: usize,
}

impl TaskStateCodec {
    pub fn new() -> Self {
        Self::new_with_max_length(DEFAULT_MAX_FRAME_BYTES)
    }

    /// Codec that refuses bodies longer than `max_frame_bytes`, checked
    /// against the length prefix before anything is buffered.
    pub fn new_with_max_length(max_frame_bytes: usize) -> Self {
        Self { max_frame_bytes }
    }

    pub fn max_frame_bytes(&self) -> usize {
        self.max_frame_bytes
    }

    fn check_len(&self, len: usize) -> io::Result<()> {
        if len > self.max_frame_bytes {
            return Err(invalid(format!(
                "frame body of {len} bytes exceeds limit of {}",
                self.max_frame_bytes
            )));
        }
        Ok(())
    }
}

impl Default for TaskStateCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn invalid(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

impl Encoder<&TaskState> for TaskStateCodec {
    type Error = io::Error;

    fn encode(&mut self, item: &TaskState, dst: &mut BytesMut) -> io::Result<()> {
        let body = bincode::serialize(item).map_err(|e| invalid(e.to_string()))?;
        self.check_len(body.len())?;
        let len = u32::try_from(body.len()).map_err(|_| invalid("frame too large"))?;
        dst.reserve(LEN_BYTES + body.len() + CRC_BYTES);
        dst.put_u32_le(len);
        dst.put_slice(&body);
        dst.put_u32_le(crc32fast::hash(&body));
        Ok(())
    }
}

impl Encoder<TaskState> for TaskStateCodec {
    type Error = io::Error;

    fn encode(&mut self, item: TaskState, dst: &mut BytesMut) -> io::Result<()> {
        Encoder::<&TaskState>::encode(self, &item, dst)
    }
}

impl Decoder for TaskStateCodec {
    type Item = TaskState;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> io::Result<Option<TaskState>> {
        if src.len() < LEN_BYTES {
            return Ok(None);
        }
        let mut len_buf = [0u8; LEN_BYTES];
        len_buf.copy_from_slice(&src[..LEN_BYTES]);
        let len = u32::from_le_bytes(len_buf) as usize;
        self.check_len(len)?;

        let frame_len = LEN_BYTES + len + CRC_BYTES;
        if src.len() < frame_len {
            src.reserve(frame_len - src.len());
            return Ok(None);
        }

        src.advance(LEN_BYTES);
        let body = src.split_to(len);
        let stored_crc = src.get_u32_le();
        let computed_crc = crc32fast::hash(&body);
        if stored_crc != computed_crc {
            return Err(invalid(format!(
                "crc mismatch: stored {stored_crc:#010x}, computed {computed_crc:#010x}"
            )));
        }

        bincode::deserialize(&body)
            .map(Some)
            .map_err(|e| invalid(e.to_string()))
    }
}
