// src/core/protocol/resp_frame.rs

//! RESP wire framing: the frame type plus its `tokio_util` codec.
//!
//! Every RESP2 frame opens with a one-byte type marker and a CRLF-terminated
//! header line; bulk strings and arrays carry further payload after the
//! header. Decoding is incremental: nothing is consumed from the receive
//! buffer until a whole frame is present, so pipelined frames and frames
//! split across reads both work.

use crate::core::CitrineError;
use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// Upper bound on a single bulk payload (512 MiB, the classic protocol limit).
const MAX_BULK_LEN: i64 = 512 * 1024 * 1024;
/// Upper bound on the element count of one array frame.
const MAX_ARRAY_ELEMENTS: i64 = 1024 * 1024;

/// One RESP2 frame, request or reply.
#[derive(Debug, Clone, PartialEq)]
pub enum RespFrame {
    SimpleString(String),
    Error(String),
    Integer(i64),
    BulkString(Bytes),
    Array(Vec<RespFrame>),
    /// The null bulk string, `$-1\r\n`.
    Null,
    /// The null array, `*-1\r\n`.
    NullArray,
}

impl RespFrame {
    /// Encodes the frame into a standalone byte vector.
    pub fn encode_to_vec(&self) -> Result<Vec<u8>, CitrineError> {
        let mut buf = BytesMut::new();
        RespFrameCodec.encode(self.clone(), &mut buf)?;
        Ok(buf.to_vec())
    }
}

/// The `Encoder`/`Decoder` pair plugged into `Framed`.
#[derive(Debug, Default)]
pub struct RespFrameCodec;

impl Encoder<RespFrame> for RespFrameCodec {
    type Error = CitrineError;

    fn encode(&mut self, frame: RespFrame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        write_frame(&frame, dst);
        Ok(())
    }
}

/// Serialises one frame, recursing through arrays.
fn write_frame(frame: &RespFrame, dst: &mut BytesMut) {
    match frame {
        RespFrame::SimpleString(text) => write_header(dst, b'+', text.as_bytes()),
        RespFrame::Error(message) => write_header(dst, b'-', message.as_bytes()),
        RespFrame::Integer(n) => write_header(dst, b':', n.to_string().as_bytes()),
        RespFrame::BulkString(payload) => {
            write_header(dst, b'$', payload.len().to_string().as_bytes());
            dst.extend_from_slice(payload);
            dst.extend_from_slice(b"\r\n");
        }
        RespFrame::Array(items) => {
            write_header(dst, b'*', items.len().to_string().as_bytes());
            for item in items {
                write_frame(item, dst);
            }
        }
        RespFrame::Null => dst.extend_from_slice(b"$-1\r\n"),
        RespFrame::NullArray => dst.extend_from_slice(b"*-1\r\n"),
    }
}

/// Writes a header line: `<marker><payload>\r\n`.
fn write_header(dst: &mut BytesMut, marker: u8, payload: &[u8]) {
    dst.reserve(payload.len() + 3);
    dst.extend_from_slice(&[marker]);
    dst.extend_from_slice(payload);
    dst.extend_from_slice(b"\r\n");
}

impl Decoder for RespFrameCodec {
    type Item = RespFrame;
    type Error = CitrineError;

    /// Returns `Ok(None)` while the buffer holds only part of a frame, so
    /// the `Framed` stream waits for more input. The buffer is advanced only
    /// after a complete frame has been parsed.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }
        let (result, consumed) = {
            let mut scanner = Scanner::new(&src[..]);
            let result = scanner.scan_frame();
            (result, scanner.consumed)
        };
        match result {
            Ok(frame) => {
                src.advance(consumed);
                Ok(Some(frame))
            }
            Err(CitrineError::IncompleteData) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// A non-consuming reader over the receive buffer. `consumed` tracks how far
/// parsing got; the caller commits it to the buffer only on success.
struct Scanner<'a> {
    buf: &'a [u8],
    consumed: usize,
}

impl<'a> Scanner<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, consumed: 0 }
    }

    /// Reads one frame, dispatching on the type marker that leads its
    /// header line.
    fn scan_frame(&mut self) -> Result<RespFrame, CitrineError> {
        let header = self.take_line()?;
        let (&marker, body) = header.split_first().ok_or(CitrineError::SyntaxError)?;
        match marker {
            b'+' => Ok(RespFrame::SimpleString(lossy(body))),
            b'-' => Ok(RespFrame::Error(lossy(body))),
            b':' => Ok(RespFrame::Integer(parse_number(body)?)),
            b'$' => self.scan_bulk(body),
            b'*' => self.scan_array(body),
            _ => Err(CitrineError::SyntaxError),
        }
    }

    /// Bulk payloads are length-prefixed and binary-safe: the bytes may
    /// themselves contain CRLF, so only the declared length counts.
    fn scan_bulk(&mut self, len_digits: &[u8]) -> Result<RespFrame, CitrineError> {
        match parse_number(len_digits)? {
            -1 => Ok(RespFrame::Null),
            len if len < 0 || len > MAX_BULK_LEN => Err(CitrineError::SyntaxError),
            len => {
                let payload = Bytes::copy_from_slice(self.take_exact(len as usize)?);
                self.expect_crlf()?;
                Ok(RespFrame::BulkString(payload))
            }
        }
    }

    fn scan_array(&mut self, len_digits: &[u8]) -> Result<RespFrame, CitrineError> {
        match parse_number(len_digits)? {
            -1 => Ok(RespFrame::NullArray),
            len if len < 0 || len > MAX_ARRAY_ELEMENTS => Err(CitrineError::SyntaxError),
            len => {
                let mut items = Vec::with_capacity(len as usize);
                for _ in 0..len {
                    items.push(self.scan_frame()?);
                }
                Ok(RespFrame::Array(items))
            }
        }
    }

    /// The not-yet-scanned portion of the buffer.
    fn remaining(&self) -> &'a [u8] {
        let buf: &'a [u8] = self.buf;
        &buf[self.consumed..]
    }

    /// Everything up to (excluding) the next CRLF, which is also consumed.
    fn take_line(&mut self) -> Result<&'a [u8], CitrineError> {
        let rest = self.remaining();
        let end = rest
            .windows(2)
            .position(|window| window == b"\r\n")
            .ok_or(CitrineError::IncompleteData)?;
        self.consumed += end + 2;
        Ok(&rest[..end])
    }

    fn take_exact(&mut self, n: usize) -> Result<&'a [u8], CitrineError> {
        let rest = self.remaining();
        if rest.len() < n {
            return Err(CitrineError::IncompleteData);
        }
        self.consumed += n;
        Ok(&rest[..n])
    }

    fn expect_crlf(&mut self) -> Result<(), CitrineError> {
        match self.take_exact(2)? {
            b"\r\n" => Ok(()),
            _ => Err(CitrineError::SyntaxError),
        }
    }
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Parses the decimal body of a header line (a length or an integer).
fn parse_number(digits: &[u8]) -> Result<i64, CitrineError> {
    std::str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(CitrineError::SyntaxError)
}
