//! NETCONF message framing (RFC 6242)
//!
//! Sessions start with end-of-message framing and switch to chunked framing
//! once both peers have advertised `base:1.1` in their hello.

use thiserror::Error;

/// End-of-message delimiter used by base:1.0 framing
pub const EOM_DELIMITER: &[u8] = b"]]>]]>";

const END_OF_CHUNKS: &[u8] = b"\n##\n";
// upper bound on a chunk-size field: 4294967295
const MAX_CHUNK_DIGITS: usize = 10;
const MAX_CHUNK_SIZE: u64 = 4_294_967_295;

/// Message framing in effect on a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// base:1.0 `]]>]]>` delimited messages
    EndOfMessage,
    /// base:1.1 chunked messages
    Chunked,
}

/// Framing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FramingError {
    #[error("invalid chunk header")]
    InvalidChunkHeader,

    #[error("invalid chunk size: {0}")]
    InvalidChunkSize(String),

    #[error("message is not valid UTF-8")]
    InvalidUtf8,
}

/// Encode one message for the wire
#[must_use]
pub fn encode(message: &str, framing: Framing) -> Vec<u8> {
    match framing {
        Framing::EndOfMessage => {
            let mut out = Vec::with_capacity(message.len() + EOM_DELIMITER.len());
            out.extend_from_slice(message.as_bytes());
            out.extend_from_slice(EOM_DELIMITER);
            out
        }
        Framing::Chunked => {
            let header = format!("\n#{}\n", message.len());
            let mut out = Vec::with_capacity(header.len() + message.len() + END_OF_CHUNKS.len());
            out.extend_from_slice(header.as_bytes());
            out.extend_from_slice(message.as_bytes());
            out.extend_from_slice(END_OF_CHUNKS);
            out
        }
    }
}

/// Incremental decoder for inbound channel data
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
}

impl FrameDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw bytes read from the transport
    pub fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Bytes received but not yet consumed as a message
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Pop the next complete message, if one is buffered
    ///
    /// # Errors
    /// Returns `FramingError` if the buffered data violates the framing.
    pub fn next_message(&mut self, framing: Framing) -> Result<Option<String>, FramingError> {
        match framing {
            Framing::EndOfMessage => self.next_eom(),
            Framing::Chunked => self.next_chunked(),
        }
    }

    fn next_eom(&mut self) -> Result<Option<String>, FramingError> {
        let Some(end) = find(&self.buf, EOM_DELIMITER) else {
            return Ok(None);
        };

        let message: Vec<u8> = self.buf.drain(..end + EOM_DELIMITER.len()).take(end).collect();
        String::from_utf8(message)
            .map(Some)
            .map_err(|_| FramingError::InvalidUtf8)
    }

    fn next_chunked(&mut self) -> Result<Option<String>, FramingError> {
        let mut pos = 0;
        let mut body = Vec::new();

        loop {
            let rest = &self.buf[pos..];
            if rest.len() < 4 {
                return Ok(None);
            }
            if rest[0] != b'\n' || rest[1] != b'#' {
                return Err(FramingError::InvalidChunkHeader);
            }

            if rest[2] == b'#' {
                if rest[3] != b'\n' {
                    return Err(FramingError::InvalidChunkHeader);
                }
                self.buf.drain(..pos + END_OF_CHUNKS.len());
                return String::from_utf8(body)
                    .map(Some)
                    .map_err(|_| FramingError::InvalidUtf8);
            }

            let Some(newline) = rest[2..].iter().position(|b| *b == b'\n') else {
                if rest.len() - 2 > MAX_CHUNK_DIGITS {
                    return Err(FramingError::InvalidChunkHeader);
                }
                return Ok(None);
            };

            let size = parse_chunk_size(&rest[2..2 + newline])?;
            let start = 2 + newline + 1;
            if rest.len() < start + size {
                return Ok(None);
            }

            body.extend_from_slice(&rest[start..start + size]);
            pos += start + size;
        }
    }
}

fn parse_chunk_size(digits: &[u8]) -> Result<usize, FramingError> {
    let text = String::from_utf8_lossy(digits).into_owned();

    if digits.is_empty()
        || digits.len() > MAX_CHUNK_DIGITS
        || digits[0] == b'0'
        || !digits.iter().all(u8::is_ascii_digit)
    {
        return Err(FramingError::InvalidChunkSize(text));
    }

    let size: u64 = text
        .parse()
        .map_err(|_| FramingError::InvalidChunkSize(text.clone()))?;
    if size > MAX_CHUNK_SIZE {
        return Err(FramingError::InvalidChunkSize(text));
    }

    usize::try_from(size).map_err(|_| FramingError::InvalidChunkSize(text))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
