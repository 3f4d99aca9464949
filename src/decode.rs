use anyhow::{Result, bail};

/// Incremental UTF-8 decoder for streamed response bodies.
///
/// Network chunks can split a multi-byte character anywhere, so each chunk is
/// decoded up to the last complete character and the incomplete tail is held
/// back until the next chunk arrives.
#[derive(Debug, Default)]
pub struct Utf8StreamDecoder {
    pending: Vec<u8>,
}

impl Utf8StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk of bytes, returning all complete text it yields.
    pub fn decode(&mut self, chunk: &[u8]) -> Result<String> {
        self.pending.extend_from_slice(chunk);

        match std::str::from_utf8(&self.pending) {
            Ok(text) => {
                let text = text.to_string();
                self.pending.clear();
                Ok(text)
            }
            Err(err) => {
                let valid_up_to = err.valid_up_to();
                match err.error_len() {
                    // A truncated sequence at the end of the buffer: decode
                    // the valid prefix and keep the tail for the next chunk.
                    None => {
                        let text =
                            String::from_utf8_lossy(&self.pending[..valid_up_to]).into_owned();
                        self.pending.drain(..valid_up_to);
                        Ok(text)
                    }
                    Some(_) => bail!("invalid UTF-8 in response stream at byte {}", valid_up_to),
                }
            }
        }
    }

    /// Call once the stream is exhausted. A leftover partial sequence means
    /// the body was cut off mid-character.
    pub fn finish(&mut self) -> Result<()> {
        if !self.pending.is_empty() {
            bail!(
                "response stream ended with {} bytes of an incomplete UTF-8 sequence",
                self.pending.len()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_plain_ascii() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"Hi there").unwrap(), "Hi there");
        assert!(decoder.finish().is_ok());
    }

    #[test]
    fn carries_split_multibyte_across_chunks() {
        // "héllo" with the two-byte é split between chunks
        let bytes = "héllo".as_bytes();
        let mut decoder = Utf8StreamDecoder::new();
        let first = decoder.decode(&bytes[..2]).unwrap();
        let second = decoder.decode(&bytes[2..]).unwrap();
        assert_eq!(first, "h");
        assert_eq!(format!("{first}{second}"), "héllo");
        assert!(decoder.finish().is_ok());
    }

    #[test]
    fn byte_at_a_time_emoji() {
        let bytes = "🌦 rain".as_bytes();
        let mut decoder = Utf8StreamDecoder::new();
        let mut out = String::new();
        for b in bytes {
            out.push_str(&decoder.decode(&[*b]).unwrap());
        }
        assert_eq!(out, "🌦 rain");
        assert!(decoder.finish().is_ok());
    }

    #[test]
    fn result_is_independent_of_chunk_boundaries() {
        let text = "Sunny ☀️ with 10°C, wind 3 m/s";
        let bytes = text.as_bytes();
        for split in 0..bytes.len() {
            let mut decoder = Utf8StreamDecoder::new();
            let mut out = String::new();
            out.push_str(&decoder.decode(&bytes[..split]).unwrap());
            out.push_str(&decoder.decode(&bytes[split..]).unwrap());
            decoder.finish().unwrap();
            assert_eq!(out, text, "split at byte {split}");
        }
    }

    #[test]
    fn rejects_invalid_sequence() {
        let mut decoder = Utf8StreamDecoder::new();
        assert!(decoder.decode(&[0xff, 0xfe]).is_err());
    }

    #[test]
    fn truncated_tail_fails_on_finish() {
        let mut decoder = Utf8StreamDecoder::new();
        // First byte of a 4-byte sequence, then the stream ends.
        decoder.decode(&[0xf0]).unwrap();
        assert!(decoder.finish().is_err());
    }
}
