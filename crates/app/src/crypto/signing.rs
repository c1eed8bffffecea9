//! Detached signatures over canonical JSON.
//!
//! Signatures live under `signatures.<server_name>.<key_id>`. The digest
//! covers the object with its `signatures` and `unsigned` members removed, so
//! adding a signature never invalidates the ones already present.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::crypto::{
    canonical_json::{CanonicalJsonError, encode_canonical_json},
    decode_base64, encode_base64,
};

const SIGNATURES: &str = "signatures";
const UNSIGNED: &str = "unsigned";

#[derive(Debug, Error)]
pub enum SigningError {
    #[error("only JSON objects can be signed")]
    NotAnObject,

    #[error("signatures member is malformed")]
    MalformedSignatures,

    #[error("no signature from {server_name} with key {key_id}")]
    MissingSignature { server_name: String, key_id: String },

    #[error("signature is not valid base64")]
    Base64(#[from] base64::DecodeError),

    #[error("signature has the wrong length")]
    SignatureLength(#[source] ed25519_dalek::SignatureError),

    #[error("object cannot be canonicalized")]
    Canonical(#[from] CanonicalJsonError),
}

/// Add a signature from `server_name`/`key_id` to `value`.
///
/// Existing signatures, including one from the same server under a different
/// key id, are kept. Fields other than `signatures` are left untouched.
///
/// # Errors
///
/// Returns an error when `value` is not an object, its `signatures` member is
/// not an object of objects, or it cannot be canonicalized.
pub fn sign_json(
    value: &mut Value,
    server_name: &str,
    key_id: &str,
    key: &SigningKey,
) -> Result<(), SigningError> {
    let signature = {
        let message = signable_bytes(value)?;

        encode_base64(key.sign(&message).to_bytes())
    };

    let object = value.as_object_mut().ok_or(SigningError::NotAnObject)?;

    let signatures = object
        .entry(SIGNATURES)
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or(SigningError::MalformedSignatures)?;

    let by_server = signatures
        .entry(server_name)
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or(SigningError::MalformedSignatures)?;

    by_server.insert(key_id.to_string(), Value::String(signature));

    Ok(())
}

/// Check the signature `server_name`/`key_id` on `value` against `key`.
///
/// Returns `Ok(false)` when the signature is well formed but does not match.
///
/// # Errors
///
/// Returns an error when the signature is missing or malformed, or the object
/// cannot be canonicalized.
pub fn verify_json(
    value: &Value,
    server_name: &str,
    key_id: &str,
    key: &VerifyingKey,
) -> Result<bool, SigningError> {
    let encoded = signature_of(value, server_name, key_id)?.ok_or_else(|| {
        SigningError::MissingSignature {
            server_name: server_name.to_string(),
            key_id: key_id.to_string(),
        }
    })?;

    let bytes = decode_base64(encoded)?;
    let signature = Signature::from_slice(&bytes).map_err(SigningError::SignatureLength)?;
    let message = signable_bytes(value)?;

    Ok(key.verify(&message, &signature).is_ok())
}

/// Whether `value` already carries a signature from `server_name`/`key_id`.
///
/// # Errors
///
/// Returns an error when `value` is not an object or its signatures are
/// malformed.
pub fn has_signature(value: &Value, server_name: &str, key_id: &str) -> Result<bool, SigningError> {
    Ok(signature_of(value, server_name, key_id)?.is_some())
}

fn signature_of<'a>(
    value: &'a Value,
    server_name: &str,
    key_id: &str,
) -> Result<Option<&'a str>, SigningError> {
    let object = value.as_object().ok_or(SigningError::NotAnObject)?;

    let Some(signatures) = object.get(SIGNATURES) else {
        return Ok(None);
    };

    let signatures = signatures
        .as_object()
        .ok_or(SigningError::MalformedSignatures)?;

    let Some(by_server) = signatures.get(server_name) else {
        return Ok(None);
    };

    let by_server = by_server
        .as_object()
        .ok_or(SigningError::MalformedSignatures)?;

    match by_server.get(key_id) {
        None => Ok(None),
        Some(Value::String(signature)) => Ok(Some(signature)),
        Some(_) => Err(SigningError::MalformedSignatures),
    }
}

fn signable_bytes(value: &Value) -> Result<Vec<u8>, SigningError> {
    let object = value.as_object().ok_or(SigningError::NotAnObject)?;

    let mut stripped = object.clone();

    stripped.remove(SIGNATURES);
    stripped.remove(UNSIGNED);

    Ok(encode_canonical_json(&Value::Object(stripped))?)
}
