//! # RESP2 Bulk Reply Reader
//!
//! Reassemble a single bulk reply (`$<len>\r\n<payload>\r\n` or `$-1\r\n`)
//! from a TCP byte stream that arrives in arbitrary pieces.
//!
//! ## Design Principles
//!
//! 1. **State Machine Pattern**: The reader moves from `Header` to `Payload`
//!    once and never backtracks; the parsed header is cached.
//! 2. **Streaming Friendly**: Each call appends the newly arrived bytes and
//!    returns `Incomplete` when more data is needed.
//! 3. **Length Is Authoritative**: Payload bytes are counted, never scanned,
//!    so CRLF inside the payload is just data.
//! 4. **Fail Fast**: A wrong sigil or a malformed length is reported as soon
//!    as the header line is complete.

use bytes::{Bytes, BytesMut};

use hkv_common::{FramingError, BULK_PREFIX, CRLF, MAX_BULK_LEN};

/// Outcome of feeding bytes to a [`BulkReader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkReply {
    /// More bytes are required; keep the reader and feed it the next read.
    Incomplete,
    /// The server declared a negative length (no value).
    Nil,
    /// The full payload has arrived.
    Complete(Bytes),
}

impl BulkReply {
    /// Returns true for `Nil` and `Complete`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BulkReply::Incomplete)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadState {
    /// Looking for the CRLF that ends the header line.
    Header,
    /// Header parsed; waiting for `len` payload bytes plus the trailing CRLF.
    Payload { start: usize, len: usize },
    Nil,
}

/// Incremental reader for one bulk reply.
///
/// Owns an append-only buffer; one reader serves exactly one reply on one
/// connection.
#[derive(Debug)]
pub struct BulkReader {
    buf: BytesMut,
    state: ReadState,
    // Offset where the next CRLF scan resumes.
    scanned: usize,
}

impl BulkReader {
    /// Creates a reader with an empty buffer.
    pub fn new() -> Self {
        BulkReader::with_capacity(0)
    }

    /// Creates a reader whose buffer is pre-sized for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        BulkReader {
            buf: BytesMut::with_capacity(capacity),
            state: ReadState::Header,
            scanned: 0,
        }
    }

    /// Returns the number of bytes received so far.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Appends newly arrived bytes and advances the parse.
    ///
    /// Once a terminal outcome has been returned, later calls keep returning
    /// it; extra bytes are trailer and are never inspected.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<BulkReply, FramingError> {
        self.buf.extend_from_slice(chunk);
        self.advance()
    }

    fn advance(&mut self) -> Result<BulkReply, FramingError> {
        loop {
            match self.state {
                ReadState::Header => {
                    let line_end = match self.find_crlf() {
                        Some(idx) => idx,
                        None => return Ok(BulkReply::Incomplete),
                    };
                    if self.buf[0] != BULK_PREFIX {
                        return Err(FramingError::UnexpectedPrefix(self.buf[0]));
                    }
                    let declared = parse_i64(&self.buf[1..line_end])?;
                    if declared < 0 {
                        self.state = ReadState::Nil;
                        continue;
                    }
                    if declared > MAX_BULK_LEN as i64 {
                        return Err(FramingError::LengthOverflow);
                    }
                    let start = line_end + CRLF.len();
                    self.state = ReadState::Payload {
                        start,
                        len: declared as usize,
                    };
                }
                ReadState::Payload { start, len } => {
                    if self.buf.len() < start + len + CRLF.len() {
                        return Ok(BulkReply::Incomplete);
                    }
                    let payload = Bytes::copy_from_slice(&self.buf[start..start + len]);
                    return Ok(BulkReply::Complete(payload));
                }
                ReadState::Nil => return Ok(BulkReply::Nil),
            }
        }
    }

    /// Returns the offset of the first CRLF, resuming from the last scan.
    fn find_crlf(&mut self) -> Option<usize> {
        // A `\r` at the end of the previous scan may pair with a new `\n`.
        let mut idx = self.scanned.max(1);
        while idx < self.buf.len() {
            if self.buf[idx] == b'\n' && self.buf[idx - 1] == b'\r' {
                return Some(idx - 1);
            }
            idx += 1;
        }
        self.scanned = idx;
        None
    }
}

impl Default for BulkReader {
    fn default() -> Self {
        BulkReader::new()
    }
}

fn parse_i64(data: &[u8]) -> Result<i64, FramingError> {
    let (negative, digits) = match data.split_first() {
        Some((b'-', rest)) => (true, rest),
        _ => (false, data),
    };
    if digits.is_empty() {
        return Err(FramingError::InvalidLength);
    }
    let mut value: i64 = 0;
    for &b in digits {
        if !b.is_ascii_digit() {
            return Err(FramingError::InvalidLength);
        }
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add((b - b'0') as i64))
            .ok_or(FramingError::InvalidLength)?;
    }
    Ok(if negative { -value } else { value })
}
