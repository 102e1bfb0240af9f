//! Document and pointer encoding.
//!
//! Documents are stored as JSON objects. Every encode works on a copy of
//! the document carrying a fresh `put_at` stamp; the caller's document is
//! never modified. Pointer entries hold the current revision as a decimal
//! string.

use revdoc_types::{now_utc_string, Document};

use crate::error::{StoreError, StoreResult};

/// Serialize `doc` for storage, stamping `put_at` with the current time
/// and, if given, overriding `_rev`.
pub fn encode(doc: &Document, rev: Option<u64>) -> StoreResult<Vec<u8>> {
    let mut stamped = doc.clone();
    if rev.is_some() {
        stamped.rev = rev;
    }
    stamped.put_at = Some(now_utc_string());
    serde_json::to_vec(&stamped).map_err(|e| StoreError::Codec(e.to_string()))
}

/// Deserialize a stored document.
pub fn decode(bytes: &[u8]) -> Result<Document, serde_json::Error> {
    serde_json::from_slice(bytes)
}

/// Encode a pointer value.
pub fn encode_rev(rev: u64) -> Vec<u8> {
    rev.to_string().into_bytes()
}

/// Decode a pointer value.
pub fn decode_rev(key: &str, bytes: &[u8]) -> StoreResult<u64> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| {
            StoreError::Codec(format!(
                "pointer {key} holds {:?}, expected a revision number",
                String::from_utf8_lossy(bytes)
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use revdoc_types::{parse_utc, DocBody, Fields};
    use serde_json::json;

    fn workitem() -> Document {
        let mut fields = Fields::new();
        fields.insert("participant".into(), json!("alice"));
        fields.insert("fields".into(), json!({"amount": 12.5, "tags": ["a", "b"], "ok": null}));
        Document::state("workitems", "wi0", fields)
    }

    #[test]
    fn encode_stamps_put_at_on_a_copy() {
        let doc = workitem();
        let bytes = encode(&doc, None).unwrap();
        assert!(doc.put_at.is_none());

        let stored = decode(&bytes).unwrap();
        let put_at = stored.put_at.clone().unwrap();
        assert!(parse_utc(&put_at).is_ok());
        assert_eq!(stored.body, doc.body);
    }

    #[test]
    fn encode_overrides_rev() {
        let doc = workitem().with_rev(3);
        let stored = decode(&encode(&doc, Some(4)).unwrap()).unwrap();
        assert_eq!(stored.rev, Some(4));

        let kept = decode(&encode(&doc, None).unwrap()).unwrap();
        assert_eq!(kept.rev, Some(3));
    }

    #[test]
    fn json_values_survive_storage() {
        let doc = workitem();
        let stored = decode(&encode(&doc, Some(1)).unwrap()).unwrap();
        let DocBody::State(body) = stored.body else {
            panic!("expected state body");
        };
        assert_eq!(
            body.get("fields"),
            Some(&json!({"amount": 12.5, "tags": ["a", "b"], "ok": null}))
        );
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode(b"{not json").is_err());
        assert!(decode(b"[1, 2]").is_err());
    }

    #[test]
    fn pointer_values() {
        assert_eq!(encode_rev(17), b"17".to_vec());
        assert_eq!(decode_rev("t/i", b"17").unwrap(), 17);
        assert!(matches!(
            decode_rev("t/i", b"seventeen"),
            Err(StoreError::Codec(_))
        ));
        assert!(decode_rev("t/i", b"-1").is_err());
    }
}
