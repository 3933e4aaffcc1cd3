//! Verification of signed callback tokens.
//!
//! The remote conferencing server signs its callback payloads as JWTs using
//! the shared secret both sides were configured with. Verification here is a
//! pure function: a token either decodes into the caller's claims type or
//! fails with a `Verification` error kind that the web layer reports as a
//! bad request.

use crate::error::Error;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::de::DeserializeOwned;

/// Signature algorithms the remote server uses: HS256 for recording-ready
/// tokens, HS512 for meeting-events bearer tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    HS256,
    HS512,
}

impl From<SignatureAlgorithm> for Algorithm {
    fn from(algorithm: SignatureAlgorithm) -> Self {
        match algorithm {
            SignatureAlgorithm::HS256 => Algorithm::HS256,
            SignatureAlgorithm::HS512 => Algorithm::HS512,
        }
    }
}

/// Verifies a signed token against the shared secret and decodes its claims.
///
/// The remote server's tokens carry no registered claims, so no `exp` is
/// required or validated; the signature and algorithm are the whole contract.
pub fn verify<C: DeserializeOwned>(
    token: &str,
    secret: &str,
    algorithm: SignatureAlgorithm,
) -> Result<C, Error> {
    let mut validation = Validation::new(algorithm.into());
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    let data = decode::<C>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;

    Ok(data.claims)
}
