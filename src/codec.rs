//! Line codec
//!
//! Frames a byte stream into newline-terminated text lines. Lines longer
//! than the configured maximum are truncated rather than rejected: the
//! first `max_length` bytes are kept and the rest is discarded up to the
//! next `\n`.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// Default maximum line length for the server side
pub const DEFAULT_MAX_LINE_LENGTH: usize = 4096;

/// A tokio codec that frames text lines on `\n` boundaries.
#[derive(Debug)]
pub struct LineCodec {
    max_length: usize,
    /// Bytes already scanned for a newline
    next_index: usize,
    /// Head of an over-long line, kept while the tail is discarded
    truncated: Option<BytesMut>,
}

impl LineCodec {
    /// Create a codec truncating lines at `max_length` bytes
    pub fn new(max_length: usize) -> Self {
        Self {
            max_length,
            next_index: 0,
            truncated: None,
        }
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE_LENGTH)
    }
}

fn to_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = std::io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let newline = src[self.next_index..]
            .iter()
            .position(|b| *b == b'\n')
            .map(|offset| offset + self.next_index);

        match (self.truncated.take(), newline) {
            (None, Some(pos)) => {
                let line = src.split_to(pos + 1);
                self.next_index = 0;
                let end = pos.min(self.max_length);
                Ok(Some(to_line(&line[..end])))
            }
            (None, None) => {
                if src.len() > self.max_length {
                    self.truncated = Some(src.split_to(self.max_length));
                    src.clear();
                    self.next_index = 0;
                } else {
                    self.next_index = src.len();
                }
                Ok(None)
            }
            (Some(head), Some(pos)) => {
                src.advance(pos + 1);
                self.next_index = 0;
                Ok(Some(to_line(&head)))
            }
            (Some(head), None) => {
                src.clear();
                self.next_index = 0;
                self.truncated = Some(head);
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }

        self.next_index = 0;
        if let Some(head) = self.truncated.take() {
            src.clear();
            return Ok(Some(to_line(&head)));
        }
        if src.is_empty() {
            return Ok(None);
        }

        // Unterminated final line
        let rest = src.split_to(src.len());
        let end = rest.len().min(self.max_length);
        Ok(Some(to_line(&rest[..end])))
    }
}

impl Encoder<String> for LineCodec {
    type Error = std::io::Error;

    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(item.len() + 1);
        dst.put_slice(item.as_bytes());
        dst.put_u8(b'\n');
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_complete_line() {
        let mut codec = LineCodec::default();
        let mut buf = BytesMut::from("NAME alice\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("NAME alice".to_string()));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_strips_carriage_return() {
        let mut codec = LineCodec::default();
        let mut buf = BytesMut::from("MSG hi\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("MSG hi".to_string()));
    }

    #[test]
    fn test_decode_partial_then_rest() {
        let mut codec = LineCodec::default();
        let mut buf = BytesMut::from("MSG hel");
        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        buf.extend_from_slice(b"lo\nMSG again\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("MSG hello".to_string()));
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("MSG again".to_string()));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn test_decode_truncates_long_line_in_one_read() {
        let mut codec = LineCodec::new(5);
        let mut buf = BytesMut::from("abcdefghij\nnext\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("abcde".to_string()));
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("next".to_string()));
    }

    #[test]
    fn test_decode_truncates_long_line_across_reads() {
        let mut codec = LineCodec::new(4);
        let mut buf = BytesMut::from("abcdef");
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert!(buf.is_empty());

        buf.extend_from_slice(b"ghijkl");
        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        buf.extend_from_slice(b"mn\nok\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("abcd".to_string()));
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("ok".to_string()));
    }

    #[test]
    fn test_decode_eof_delivers_unterminated_line() {
        let mut codec = LineCodec::default();
        let mut buf = BytesMut::from("EXIT");
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert_eq!(codec.decode_eof(&mut buf).unwrap(), Some("EXIT".to_string()));
        assert_eq!(codec.decode_eof(&mut buf).unwrap(), None);
    }

    #[test]
    fn test_decode_invalid_utf8_is_lossy() {
        let mut codec = LineCodec::default();
        let mut buf = BytesMut::from(&b"MSG \xff\n"[..]);
        let line = codec.decode(&mut buf).unwrap().unwrap();
        assert!(line.starts_with("MSG "));
    }

    #[test]
    fn test_encode_appends_newline() {
        let mut codec = LineCodec::default();
        let mut buf = BytesMut::new();
        codec.encode("alice: hi".to_string(), &mut buf).unwrap();
        assert_eq!(&buf[..], b"alice: hi\n");
    }
}
