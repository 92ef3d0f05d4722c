//! PPTX document codec.
//!
//! Slide decks are opaque containers: bytes in, bytes out. There is no
//! render path, so any other payload shape is rejected.

use super::DocumentCodec;
use crate::document::Document;
use crate::{Result, StoreError};

#[derive(Debug)]
pub struct PptxCodec;

impl DocumentCodec for PptxCodec {
    fn encode(&self, document: &Document) -> Result<Vec<u8>> {
        match document {
            Document::Bytes(bytes) => Ok(bytes.clone()),
            _ => Err(StoreError::invalid_payload(
                "pptx content must be raw bytes",
            )),
        }
    }

    fn decode(&self, bytes: &[u8]) -> Result<Document> {
        Ok(Document::Bytes(bytes.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_roundtrip() {
        let codec = PptxCodec;
        let payload = vec![0x50, 0x4b, 0x03, 0x04, 0x01, 0x02];
        let encoded = codec.encode(&Document::Bytes(payload.clone())).unwrap();
        assert_eq!(codec.decode(&encoded).unwrap(), Document::Bytes(payload));
    }

    #[test]
    fn text_payload_rejected() {
        let err = PptxCodec.encode(&Document::text("slides")).unwrap_err();
        assert!(matches!(err, StoreError::InvalidPayload(_)));
    }
}
