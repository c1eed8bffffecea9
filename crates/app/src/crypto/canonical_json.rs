//! Canonical JSON encoding.
//!
//! Object keys are sorted by code point, no insignificant whitespace is
//! emitted, strings are written as UTF-8, and only integers in the
//! interoperable range `[-(2^53)+1, 2^53-1]` are accepted.

use serde_json::{Number, Value};
use thiserror::Error;

/// Largest integer every JSON implementation represents exactly.
pub const MAX_SAFE_INTEGER: i64 = (1 << 53) - 1;

/// Smallest integer every JSON implementation represents exactly.
pub const MIN_SAFE_INTEGER: i64 = -MAX_SAFE_INTEGER;

#[derive(Debug, Error)]
pub enum CanonicalJsonError {
    #[error("floating point numbers are not allowed in canonical JSON: {0}")]
    FloatNotAllowed(Number),

    #[error("integer {0} is outside the canonical JSON range")]
    IntegerOutOfRange(Number),

    #[error("failed to encode string")]
    Encode(#[source] serde_json::Error),
}

/// Encode `value` as canonical JSON bytes.
///
/// # Errors
///
/// Returns an error when `value` holds a float or an out-of-range integer.
pub fn encode_canonical_json(value: &Value) -> Result<Vec<u8>, CanonicalJsonError> {
    let mut out = Vec::with_capacity(128);

    write_value(&mut out, value)?;

    Ok(out)
}

fn write_value(out: &mut Vec<u8>, value: &Value) -> Result<(), CanonicalJsonError> {
    match value {
        Value::Null => out.extend_from_slice(b"null"),
        Value::Bool(true) => out.extend_from_slice(b"true"),
        Value::Bool(false) => out.extend_from_slice(b"false"),
        Value::Number(number) => write_number(out, number)?,
        Value::String(string) => write_string(out, string)?,
        Value::Array(items) => {
            out.push(b'[');

            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push(b',');
                }

                write_value(out, item)?;
            }

            out.push(b']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();

            entries.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));

            out.push(b'{');

            for (index, (key, item)) in entries.into_iter().enumerate() {
                if index > 0 {
                    out.push(b',');
                }

                write_string(out, key)?;
                out.push(b':');
                write_value(out, item)?;
            }

            out.push(b'}');
        }
    }

    Ok(())
}

fn write_number(out: &mut Vec<u8>, number: &Number) -> Result<(), CanonicalJsonError> {
    let Some(integer) = number.as_i64() else {
        if number.is_u64() {
            return Err(CanonicalJsonError::IntegerOutOfRange(number.clone()));
        }

        return Err(CanonicalJsonError::FloatNotAllowed(number.clone()));
    };

    if !(MIN_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(&integer) {
        return Err(CanonicalJsonError::IntegerOutOfRange(number.clone()));
    }

    out.extend_from_slice(integer.to_string().as_bytes());

    Ok(())
}

fn write_string(out: &mut Vec<u8>, string: &str) -> Result<(), CanonicalJsonError> {
    serde_json::to_writer(&mut *out, string).map_err(CanonicalJsonError::Encode)
}
