//! Byte-level tokenizer.

use crate::api::error::{NlpError, NlpResult};
use crate::api::traits::Tokenizer;

const BYTE_VOCAB: usize = 256;

/// Maps each UTF-8 byte to its value as a token ID.
///
/// The model vocabulary must cover all 256 byte values. IDs in
/// `256..vocab_size` are valid but decode to nothing.
#[derive(Debug, Clone, Copy)]
pub struct ByteTokenizer {
    vocab_size: usize,
}

impl ByteTokenizer {
    pub fn new(vocab_size: usize) -> NlpResult<Self> {
        if vocab_size < BYTE_VOCAB {
            return Err(NlpError::TokenizerError(format!(
                "byte tokenizer needs a vocabulary of at least {} tokens, model has {}",
                BYTE_VOCAB, vocab_size
            )));
        }
        Ok(Self { vocab_size })
    }

    /// Incremental decoder for printing tokens one at a time.
    pub fn stream_decoder(&self) -> ByteStreamDecoder {
        ByteStreamDecoder {
            tokenizer: *self,
            pending: Vec::new(),
        }
    }
}

/// Decodes byte tokens as they arrive, holding back an incomplete UTF-8
/// sequence until its remaining bytes show up.
///
/// Concatenating every `push` result and the final `finish` gives the same
/// text as [`Tokenizer::decode`] over all the tokens at once.
#[derive(Debug, Clone)]
pub struct ByteStreamDecoder {
    tokenizer: ByteTokenizer,
    pending: Vec<u8>,
}

impl ByteStreamDecoder {
    /// Feed one token and return whatever text is now complete.
    pub fn push(&mut self, token: u32) -> NlpResult<String> {
        if token as usize >= self.tokenizer.vocab_size {
            return Err(NlpError::TokenizerError(format!(
                "token {} out of range for vocabulary of {}",
                token, self.tokenizer.vocab_size
            )));
        }
        if (token as usize) < BYTE_VOCAB {
            self.pending.push(token as u8);
        }

        let mut out = String::new();
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    return Ok(out);
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match e.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + bad);
                        }
                        None => {
                            self.pending.drain(..valid);
                            return Ok(out);
                        }
                    }
                }
            }
        }
    }

    /// Flush held-back bytes; an unfinished sequence becomes U+FFFD.
    pub fn finish(&mut self) -> String {
        let text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        text
    }
}

impl Tokenizer for ByteTokenizer {
    fn encode(&self, text: &str) -> NlpResult<Vec<u32>> {
        Ok(text.bytes().map(|b| b as u32).collect())
    }

    fn decode(&self, tokens: &[u32]) -> NlpResult<String> {
        let mut bytes = Vec::with_capacity(tokens.len());
        for &t in tokens {
            if t as usize >= self.vocab_size {
                return Err(NlpError::TokenizerError(format!(
                    "token {} out of range for vocabulary of {}",
                    t, self.vocab_size
                )));
            }
            if (t as usize) < BYTE_VOCAB {
                bytes.push(t as u8);
            }
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn vocab_size(&self) -> usize {
        self.vocab_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daiso_core::ErrorKind;

    #[test]
    fn test_encode_decode() {
        let tok = ByteTokenizer::new(260).unwrap();
        let ids = tok.encode("héllo").unwrap();
        assert_eq!(ids.len(), 6);
        assert_eq!(ids[0], b'h' as u32);
        assert_eq!(tok.decode(&ids).unwrap(), "héllo");
    }

    #[test]
    fn test_non_byte_ids_decode_to_nothing() {
        let tok = ByteTokenizer::new(300).unwrap();
        assert_eq!(tok.decode(&[b'a' as u32, 257, b'b' as u32]).unwrap(), "ab");
    }

    #[test]
    fn test_out_of_vocab_id() {
        let tok = ByteTokenizer::new(256).unwrap();
        let err = tok.decode(&[256]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Range);
    }

    #[test]
    fn test_stream_decoder_holds_split_characters() {
        let tok = ByteTokenizer::new(256).unwrap();
        let ids = tok.encode("aé€!").unwrap();
        let mut dec = tok.stream_decoder();
        let pieces: Vec<String> = ids.iter().map(|&t| dec.push(t).unwrap()).collect();
        assert_eq!(pieces, vec!["a", "", "é", "", "", "€", "!"]);
        assert_eq!(dec.finish(), "");
    }

    #[test]
    fn test_stream_decoder_matches_decode_on_invalid_bytes() {
        let tok = ByteTokenizer::new(300).unwrap();
        let ids = [0xC3, b'x' as u32, 0xFF, 270, 0xE2, 0x82];
        let mut dec = tok.stream_decoder();
        let mut text = String::new();
        for &t in &ids {
            text.push_str(&dec.push(t).unwrap());
        }
        text.push_str(&dec.finish());
        assert_eq!(text, tok.decode(&ids).unwrap());
        assert_eq!(text, "\u{FFFD}x\u{FFFD}\u{FFFD}");

        assert_eq!(dec.push(300).unwrap_err().kind(), ErrorKind::Range);
    }

    #[test]
    fn test_small_vocab_rejected() {
        assert!(ByteTokenizer::new(10).is_err());
    }
}
