//! # Request Frames
//!
//! Purpose: Encode client requests as RESP2 arrays of bulk strings.
//!
//! ## Design Principles
//!
//! 1. **Immutable Frames**: A frame is assembled once and only read afterwards.
//! 2. **Binary-Safe**: Arguments are raw bytes; lengths are byte counts.
//! 3. **Caller-Owned Buffers**: Encoding appends to a `BytesMut` so the caller
//!    decides allocation and reuse.
//!
//! ## Wire Layout Example
//!
//! ```text
//! *1\r\n          array header: argument count
//! $4\r\n          bulk header: byte length of the argument
//! INFO\r\n        argument bytes + CRLF
//! ```

use bytes::{BufMut, Bytes, BytesMut};

/// Sigil that opens an array frame.
pub const ARRAY_PREFIX: u8 = b'*';

/// Sigil that opens a bulk string frame.
pub const BULK_PREFIX: u8 = b'$';

/// Line terminator used by every RESP header.
pub const CRLF: &[u8; 2] = b"\r\n";

/// Largest bulk payload a reader accepts (512 MiB, the server-side default).
pub const MAX_BULK_LEN: usize = 512 * 1024 * 1024;

/// Command name of the built-in status query.
pub const STATUS_COMMAND: &str = "INFO";

/// A request encoded as an array of bulk strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFrame {
    args: Vec<Bytes>,
}

impl RequestFrame {
    /// Starts a frame with the command name as its first element.
    pub fn new(command: impl Into<Bytes>) -> Self {
        RequestFrame {
            args: vec![command.into()],
        }
    }

    /// Builds the status query (`INFO`, no arguments).
    pub fn info() -> Self {
        RequestFrame::new(STATUS_COMMAND)
    }

    /// Appends an argument, consuming and returning the frame.
    pub fn arg(mut self, arg: impl Into<Bytes>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Returns the command name and arguments in wire order.
    pub fn args(&self) -> &[Bytes] {
        &self.args
    }

    /// Returns the exact number of bytes `encode_into` will append.
    pub fn encoded_len(&self) -> usize {
        let header = 1 + decimal_len(self.args.len()) + CRLF.len();
        self.args.iter().fold(header, |acc, arg| {
            acc + 1 + decimal_len(arg.len()) + CRLF.len() + arg.len() + CRLF.len()
        })
    }

    /// Appends the wire encoding of the frame to `buf`.
    pub fn encode_into(&self, buf: &mut BytesMut) {
        buf.reserve(self.encoded_len());
        buf.put_u8(ARRAY_PREFIX);
        put_decimal(buf, self.args.len());
        buf.put_slice(CRLF);
        for arg in &self.args {
            buf.put_u8(BULK_PREFIX);
            put_decimal(buf, arg.len());
            buf.put_slice(CRLF);
            buf.put_slice(arg);
            buf.put_slice(CRLF);
        }
    }

    /// Encodes the frame into a fresh buffer.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode_into(&mut buf);
        buf.freeze()
    }
}

fn put_decimal(buf: &mut BytesMut, value: usize) {
    buf.put_slice(value.to_string().as_bytes());
}

fn decimal_len(mut value: usize) -> usize {
    let mut digits = 1;
    while value >= 10 {
        value /= 10;
        digits += 1;
    }
    digits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_info_request() {
        assert_eq!(&RequestFrame::info().to_bytes()[..], b"*1\r\n$4\r\nINFO\r\n");
    }

    #[test]
    fn encodes_arguments_by_byte_length() {
        let frame = RequestFrame::new("SET").arg("key").arg("h\u{e9}llo");
        assert_eq!(
            &frame.to_bytes()[..],
            "*3\r\n$3\r\nSET\r\n$3\r\nkey\r\n$6\r\nh\u{e9}llo\r\n".as_bytes()
        );
    }

    #[test]
    fn encoded_len_matches_output() {
        let payload = Bytes::from(vec![b'x'; 1234]);
        let frame = RequestFrame::new("ECHO").arg(payload);
        assert_eq!(frame.encoded_len(), frame.to_bytes().len());
        assert_eq!(RequestFrame::info().encoded_len(), 14);
    }

    #[test]
    fn appends_to_existing_buffer() {
        let mut buf = BytesMut::from(&b"prefix"[..]);
        RequestFrame::info().encode_into(&mut buf);
        assert_eq!(&buf[..], b"prefix*1\r\n$4\r\nINFO\r\n");
    }

    #[test]
    fn decimal_len_counts_digits() {
        assert_eq!(decimal_len(0), 1);
        assert_eq!(decimal_len(9), 1);
        assert_eq!(decimal_len(10), 2);
        assert_eq!(decimal_len(1234), 4);
    }
}
