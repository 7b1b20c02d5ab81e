use bytes::{Buf, BytesMut};
use encoding_rs::Encoding;
use std::io;
use tokio_util::codec::Decoder;

/// Re-encodes a byte stream in `encoding` as UTF-8, chunk by chunk, so the
/// row tokenizer only ever sees UTF-8.
pub struct Utf8Transcoder {
    inner: encoding_rs::Decoder,
}

impl Utf8Transcoder {
    pub fn new(encoding: &'static Encoding) -> Self {
        Self {
            inner: encoding.new_decoder(),
        }
    }

    fn transcode(&mut self, src: &mut BytesMut, last: bool) -> Option<BytesMut> {
        let capacity = self
            .inner
            .max_utf8_buffer_length(src.len())
            .unwrap_or(src.len() * 3 + 16);
        let mut out = String::with_capacity(capacity);
        // Output is sized for the whole input, so everything is consumed.
        let (_result, read, _replaced) = self.inner.decode_to_string(src, &mut out, last);
        src.advance(read);
        if out.is_empty() {
            None
        } else {
            Some(BytesMut::from(out.as_bytes()))
        }
    }
}

impl Decoder for Utf8Transcoder {
    type Item = BytesMut;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }
        Ok(self.transcode(src, false))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let out = self.transcode(buf, true);
        buf.clear();
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin1_becomes_utf8() {
        let mut t = Utf8Transcoder::new(encoding_rs::WINDOWS_1252);
        let mut src = BytesMut::from(&b"caf\xe9"[..]);
        let out = t.decode_eof(&mut src).unwrap().unwrap();
        assert_eq!(&out[..], "café".as_bytes());
    }
}
