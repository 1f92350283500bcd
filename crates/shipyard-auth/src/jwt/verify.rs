//! RSA PKCS#1 v1.5 signature verification
//!
//! The public key is rebuilt from the JWK's `n`/`e` on every call and dropped
//! afterwards; only the JWKS document itself is cached.

use std::fmt;
use std::str::FromStr;

use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::signature::Verifier;
use rsa::{BigUint, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Sha256, Sha384, Sha512};
use tracing::debug;

use super::decode::{DecodedToken, base64url_decode};
use super::jwks::{Jwk, JwksDocument};
use crate::error::{AuthError, AuthResult};

/// Supported RSA PKCS#1 v1.5 signature schemes
///
/// Exactly one is configured per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureAlgorithm {
    /// RSASSA-PKCS1-v1_5 with SHA-256
    #[serde(rename = "RS256")]
    Rs256,
    /// RSASSA-PKCS1-v1_5 with SHA-384
    #[serde(rename = "RS384")]
    Rs384,
    /// RSASSA-PKCS1-v1_5 with SHA-512
    #[serde(rename = "RS512")]
    Rs512,
}

impl SignatureAlgorithm {
    /// JOSE `alg` name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rs256 => "RS256",
            Self::Rs384 => "RS384",
            Self::Rs512 => "RS512",
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RS256" => Ok(Self::Rs256),
            "RS384" => Ok(Self::Rs384),
            "RS512" => Ok(Self::Rs512),
            other => Err(format!(
                "unsupported algorithm '{other}' (expected RS256, RS384 or RS512)"
            )),
        }
    }
}

/// Find the signing key for a token: first entry whose `kid` matches and
/// whose `kty` is `RSA`
///
/// # Errors
///
/// Returns [`AuthError::KeyNotFound`] if the token carries no `kid` or no
/// RSA key with that `kid` is published.
pub fn find_key<'a>(jwks: &'a JwksDocument, kid: Option<&str>) -> AuthResult<&'a Jwk> {
    let Some(kid) = kid else {
        return Err(AuthError::KeyNotFound { kid: String::new() });
    };

    jwks.keys
        .iter()
        .find(|key| key.kid.as_deref() == Some(kid) && key.kty == "RSA")
        .ok_or_else(|| AuthError::KeyNotFound {
            kid: kid.to_string(),
        })
}

/// Verify a token's signature against the published keys
///
/// Returns `Ok(true)` only when the signature over the signing input checks
/// out with the selected key. Unusable key material or a bad signature yield
/// `Ok(false)`.
///
/// # Errors
///
/// Returns [`AuthError::KeyNotFound`] when no matching RSA key exists.
pub fn verify(
    token: &DecodedToken,
    jwks: &JwksDocument,
    algorithm: SignatureAlgorithm,
) -> AuthResult<bool> {
    let key = find_key(jwks, token.kid())?;

    let Some(public_key) = rsa_public_key(key) else {
        debug!(kid = ?key.kid, "Unusable RSA key material");
        return Ok(false);
    };

    Ok(verify_pkcs1v15(
        public_key,
        algorithm,
        token.signing_input().as_bytes(),
        &token.signature,
    ))
}

fn rsa_public_key(key: &Jwk) -> Option<RsaPublicKey> {
    let n = base64url_decode(key.n.as_deref()?).ok()?;
    let e = base64url_decode(key.e.as_deref()?).ok()?;

    RsaPublicKey::new(BigUint::from_bytes_be(&n), BigUint::from_bytes_be(&e)).ok()
}

fn verify_pkcs1v15(
    key: RsaPublicKey,
    algorithm: SignatureAlgorithm,
    message: &[u8],
    signature: &[u8],
) -> bool {
    let Ok(signature) = Signature::try_from(signature) else {
        return false;
    };

    let result = match algorithm {
        SignatureAlgorithm::Rs256 => VerifyingKey::<Sha256>::new(key).verify(message, &signature),
        SignatureAlgorithm::Rs384 => VerifyingKey::<Sha384>::new(key).verify(message, &signature),
        SignatureAlgorithm::Rs512 => VerifyingKey::<Sha512>::new(key).verify(message, &signature),
    };

    result.is_ok()
}
