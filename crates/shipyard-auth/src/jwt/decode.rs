//! Structural JWT decoding
//!
//! Splits a compact-serialized token into its three segments and decodes
//! them. Nothing here establishes trust: a [`DecodedToken`] is just parsed
//! bytes until [`verify`](super::verify) and
//! [`ClaimsValidator::validate`](super::ClaimsValidator::validate)
//! have run.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use serde_json::{Map, Value};

use crate::error::{AuthError, AuthResult};

/// A JSON object (header or payload)
pub type JsonObject = Map<String, Value>;

/// A parsed but untrusted token
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedToken {
    /// Decoded JOSE header
    pub header: JsonObject,
    /// Decoded claims set
    pub payload: JsonObject,
    /// Raw signature bytes
    pub signature: Vec<u8>,
    header_segment: String,
    payload_segment: String,
}

impl DecodedToken {
    /// The exact bytes the signature covers: `"<header>.<payload>"` as received
    pub fn signing_input(&self) -> String {
        format!("{}.{}", self.header_segment, self.payload_segment)
    }

    /// `kid` from the header, if it is a string
    pub fn kid(&self) -> Option<&str> {
        self.header.get("kid").and_then(Value::as_str)
    }

    /// `alg` from the header, if it is a string
    pub fn alg(&self) -> Option<&str> {
        self.header.get("alg").and_then(Value::as_str)
    }
}

/// Decode a compact JWT into header, payload and signature
///
/// # Errors
///
/// Returns [`AuthError::MalformedToken`] unless the token has exactly three
/// non-empty segments, each valid base64url, with JSON objects for header
/// and payload.
pub fn decode(token: &str) -> AuthResult<DecodedToken> {
    let segments: Vec<&str> = token.split('.').collect();
    let [header_segment, payload_segment, signature_segment] = segments.as_slice() else {
        return Err(AuthError::malformed(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    };

    if header_segment.is_empty() || payload_segment.is_empty() || signature_segment.is_empty() {
        return Err(AuthError::malformed("empty segment"));
    }

    let header = decode_object(header_segment, "header")?;
    let payload = decode_object(payload_segment, "payload")?;
    let signature = base64url_decode(signature_segment)
        .map_err(|e| AuthError::malformed(format!("signature: {e}")))?;

    Ok(DecodedToken {
        header,
        payload,
        signature,
        header_segment: (*header_segment).to_string(),
        payload_segment: (*payload_segment).to_string(),
    })
}

/// Decode base64url, tolerating missing `=` padding
///
/// The input is padded to the next multiple of four before decoding with the
/// URL-safe alphabet. Already-padded input is accepted as is.
///
/// # Errors
///
/// Returns the underlying decode error for characters outside the URL-safe
/// alphabet or for an impossible length (remainder of 1).
pub fn base64url_decode(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let mut padded = String::with_capacity(input.len() + 3);
    padded.push_str(input);
    match input.len() % 4 {
        2 => padded.push_str("=="),
        3 => padded.push('='),
        _ => {}
    }
    URL_SAFE.decode(padded)
}

fn decode_object(segment: &str, part: &str) -> AuthResult<JsonObject> {
    let bytes =
        base64url_decode(segment).map_err(|e| AuthError::malformed(format!("{part}: {e}")))?;

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AuthError::malformed(format!("{part} is not a JSON object"))),
        Err(e) => Err(AuthError::malformed(format!("{part}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use proptest::prelude::*;
    use serde_json::json;

    fn segment(value: &Value) -> String {
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(value).unwrap())
    }

    fn token(header: &Value, payload: &Value, signature: &[u8]) -> String {
        format!(
            "{}.{}.{}",
            segment(header),
            segment(payload),
            URL_SAFE_NO_PAD.encode(signature)
        )
    }

    #[test]
    fn test_decode_valid_token() {
        let raw = token(
            &json!({"alg": "RS256", "kid": "key-1", "typ": "JWT"}),
            &json!({"sub": "alice", "exp": 1_700_000_000}),
            b"\x01\x02\x03",
        );

        let decoded = decode(&raw).unwrap();
        assert_eq!(decoded.alg(), Some("RS256"));
        assert_eq!(decoded.kid(), Some("key-1"));
        assert_eq!(decoded.payload["sub"], "alice");
        assert_eq!(decoded.signature, vec![1, 2, 3]);

        let (signed, _) = raw.rsplit_once('.').unwrap();
        assert_eq!(decoded.signing_input(), signed);
    }

    #[test]
    fn test_wrong_segment_count() {
        for raw in ["", "a", "a.b", "a.b.c.d", "a.b.c.d.e"] {
            assert!(
                matches!(decode(raw), Err(AuthError::MalformedToken(_))),
                "accepted {raw:?}"
            );
        }
    }

    #[test]
    fn test_empty_segment_rejected() {
        let header = segment(&json!({"alg": "RS256"}));
        let payload = segment(&json!({"sub": "x"}));

        assert!(decode(&format!("{header}.{payload}.")).is_err());
        assert!(decode(&format!(".{payload}.AQID")).is_err());
        assert!(decode(&format!("{header}..AQID")).is_err());
    }

    #[test]
    fn test_non_object_header_rejected() {
        let raw = token(&json!(["RS256"]), &json!({"sub": "x"}), b"sig");
        assert!(matches!(decode(&raw), Err(AuthError::MalformedToken(_))));

        let raw = token(&json!({"alg": "RS256"}), &json!("just a string"), b"sig");
        assert!(matches!(decode(&raw), Err(AuthError::MalformedToken(_))));
    }

    #[test]
    fn test_invalid_base64_rejected() {
        let payload = segment(&json!({"sub": "x"}));
        assert!(decode(&format!("not*base64.{payload}.AQID")).is_err());
        // Remainder of one can never be valid base64
        assert!(decode(&format!("eyJhbGciOiJSUzI1NiJ9A.{payload}.AQID")).is_err());
    }

    #[test]
    fn test_invalid_json_rejected() {
        let header = URL_SAFE_NO_PAD.encode(b"{not json");
        let payload = segment(&json!({"sub": "x"}));
        assert!(decode(&format!("{header}.{payload}.AQID")).is_err());
    }

    #[test]
    fn test_base64url_padding() {
        assert_eq!(base64url_decode("YQ").unwrap(), b"a");
        assert_eq!(base64url_decode("YWI").unwrap(), b"ab");
        assert_eq!(base64url_decode("YWJj").unwrap(), b"abc");
        assert_eq!(base64url_decode("YQ==").unwrap(), b"a");
        assert!(base64url_decode("YWJjZ").is_err());
        // URL-safe alphabet, not the standard one
        assert_eq!(base64url_decode("-_8").unwrap(), vec![0xfb, 0xff]);
        assert!(base64url_decode("+/8").is_err());
    }

    proptest! {
        #[test]
        fn prop_base64url_accepts_unpadded_encoding(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            let encoded = URL_SAFE_NO_PAD.encode(&bytes);
            prop_assert_eq!(base64url_decode(&encoded).unwrap(), bytes);
        }

        #[test]
        fn prop_decode_never_panics(input in "\\PC{0,200}") {
            let _ = decode(&input);
        }

        #[test]
        fn prop_dot_count_other_than_two_is_malformed(parts in proptest::collection::vec("[A-Za-z0-9_-]{1,8}", 1..7)) {
            prop_assume!(parts.len() != 3);
            let raw = parts.join(".");
            prop_assert!(matches!(decode(&raw), Err(AuthError::MalformedToken(_))));
        }
    }
}
