//! Common test utilities for integration tests
//!
//! A wiremock identity provider that serves OIDC discovery and a JWKS, plus
//! helpers to mint RS256 tokens with a process-wide test key.

#![allow(dead_code)]

use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rsa::RsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::signature::{SignatureEncoding, Signer};
use rsa::traits::PublicKeyParts;
use serde_json::{Value, json};
use sha2::Sha256;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

pub const KID: &str = "test-key-1";
pub const AUDIENCE: &str = "https://api.shipyard.test";

/// Process-wide RSA key; generation is slow
pub fn signing_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| RsaPrivateKey::new(&mut rand::thread_rng(), 2048).expect("RSA keygen"))
}

/// A second key the identity provider does not publish
pub fn rogue_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| RsaPrivateKey::new(&mut rand::thread_rng(), 2048).expect("RSA keygen"))
}

/// Public JWK for `key`
pub fn rsa_jwk(kid: &str, key: &RsaPrivateKey) -> Value {
    let public = key.to_public_key();
    json!({
        "kty": "RSA",
        "kid": kid,
        "use": "sig",
        "alg": "RS256",
        "n": URL_SAFE_NO_PAD.encode(public.n().to_bytes_be()),
        "e": URL_SAFE_NO_PAD.encode(public.e().to_bytes_be()),
    })
}

pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_secs()
}

/// Mock identity provider
pub struct MockIdentityProvider {
    pub server: MockServer,
}

impl MockIdentityProvider {
    /// Start a server and mount discovery pointing at `/jwks`
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let idp = Self { server };

        Mock::given(method("GET"))
            .and(path("/.well-known/openid-configuration"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "issuer": idp.issuer(),
                "jwks_uri": idp.jwks_uri(),
            })))
            .mount(&idp.server)
            .await;

        idp
    }

    /// Issuer URL, which is also the discovery base
    pub fn issuer(&self) -> String {
        self.server.uri()
    }

    pub fn jwks_uri(&self) -> String {
        format!("{}/jwks", self.server.uri())
    }

    /// Publish the standard test key
    pub async fn mock_jwks(&self) {
        self.mock_jwks_keys(vec![rsa_jwk(KID, signing_key())]).await;
    }

    /// Publish the standard test key, asserting the endpoint is hit exactly
    /// `times` times over the life of the server
    pub async fn mock_jwks_expect(&self, times: u64) {
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "keys": [rsa_jwk(KID, signing_key())] })),
            )
            .expect(times)
            .mount(&self.server)
            .await;
    }

    pub async fn mock_jwks_keys(&self, keys: Vec<Value>) {
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "keys": keys })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_jwks_status(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Claims that pass validation against this provider
    pub fn valid_claims(&self) -> Value {
        let now = unix_now();
        json!({
            "iss": self.issuer(),
            "aud": AUDIENCE,
            "sub": "auth0|captain",
            "iat": now,
            "nbf": now - 5,
            "exp": now + 300,
        })
    }
}

/// Sign `header`/`claims` with RS256 using `key`
///
/// Written by hand so tests can produce tokens whose header lies about the
/// algorithm while still carrying a genuine RSA signature.
pub fn sign_token(header: &Value, claims: &Value, key: &RsaPrivateKey) -> String {
    let input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(header).expect("header json")),
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).expect("claims json"))
    );
    let signature = SigningKey::<Sha256>::new(key.clone()).sign(input.as_bytes());
    format!("{input}.{}", URL_SAFE_NO_PAD.encode(signature.to_vec()))
}

/// A well-formed RS256 token signed with the published key
pub fn mint(claims: &Value) -> String {
    sign_token(
        &json!({"alg": "RS256", "typ": "JWT", "kid": KID}),
        claims,
        signing_key(),
    )
}

/// The same token minted by `jsonwebtoken`, as a real provider would
pub fn mint_with_jsonwebtoken(claims: &Value) -> String {
    use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};

    let pem = signing_key()
        .to_pkcs8_pem(LineEnding::LF)
        .expect("PKCS#8 encoding");
    let key = EncodingKey::from_rsa_pem(pem.as_bytes()).expect("Invalid RSA key");

    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(KID.to_string());

    encode(&header, claims, &key).expect("Failed to encode test JWT")
}
