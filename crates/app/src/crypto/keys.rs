//! The server's long-term signing key.
//!
//! Keys are stored on disk in the one-line format `ed25519 <version> <seed>`
//! where `seed` is the unpadded base64 encoding of the 32-byte secret seed.

use std::{fmt, fs, io, path::Path};

use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use serde_json::Value;
use thiserror::Error;
use tracing::info;
use zeroize::Zeroizing;

use crate::crypto::{
    decode_base64, encode_base64,
    signing::{self, SigningError},
};

const ALGORITHM: &str = "ed25519";

/// Version used for freshly generated keys.
pub const DEFAULT_KEY_VERSION: &str = "0";

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("failed to read signing key file")]
    Read(#[source] io::Error),

    #[error("failed to write signing key file")]
    Write(#[source] io::Error),

    #[error("signing key file must contain `ed25519 <version> <seed>`")]
    Format,

    #[error("unsupported signing key algorithm {0}")]
    Algorithm(String),

    #[error("signing key version may only contain [a-zA-Z0-9_]")]
    Version,

    #[error("signing key seed is not valid base64")]
    Base64(#[from] base64::DecodeError),

    #[error("signing key seed must be 32 bytes, got {0}")]
    SeedLength(usize),
}

/// The server's identity: its name and signing key.
#[derive(Clone)]
pub struct Keyring {
    server_name: String,
    key_id: String,
    signing_key: SigningKey,
}

impl fmt::Debug for Keyring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keyring")
            .field("server_name", &self.server_name)
            .field("key_id", &self.key_id)
            .field("public_key", &self.public_key_base64())
            .finish_non_exhaustive()
    }
}

impl Keyring {
    /// Build a keyring for `server_name` signing as `ed25519:<version>`.
    #[must_use]
    pub fn new(server_name: impl Into<String>, version: &str, signing_key: SigningKey) -> Self {
        Self {
            server_name: server_name.into(),
            key_id: format!("{ALGORITHM}:{version}"),
            signing_key,
        }
    }

    /// Load the key at `path`, generating and persisting one if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or written, or does not
    /// hold a valid key.
    pub fn load_or_generate(
        server_name: impl Into<String>,
        path: &Path,
    ) -> Result<Self, KeyError> {
        let server_name = server_name.into();

        match fs::read_to_string(path) {
            Ok(contents) => {
                let contents = Zeroizing::new(contents);
                let (version, signing_key) = parse_key_file(&contents)?;

                info!(key_path = %path.display(), version = %version, "loaded signing key");

                Ok(Self::new(server_name, &version, signing_key))
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                let signing_key = SigningKey::generate(&mut OsRng);

                write_key_file(path, DEFAULT_KEY_VERSION, &signing_key)?;

                info!(key_path = %path.display(), "generated new signing key");

                Ok(Self::new(server_name, DEFAULT_KEY_VERSION, signing_key))
            }
            Err(error) => Err(KeyError::Read(error)),
        }
    }

    /// Name this server signs as.
    #[must_use]
    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    /// Key id in `algorithm:version` form.
    #[must_use]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    #[must_use]
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Public key as unpadded base64.
    #[must_use]
    pub fn public_key_base64(&self) -> String {
        encode_base64(self.verifying_key().as_bytes())
    }

    /// Whether `public_key` (base64, padded or not) is this server's key.
    #[must_use]
    pub fn is_own_public_key(&self, public_key: &str) -> bool {
        decode_base64(public_key)
            .is_ok_and(|bytes| bytes.as_slice() == self.verifying_key().as_bytes())
    }

    /// Sign `value` as this server.
    ///
    /// # Errors
    ///
    /// See [`signing::sign_json`].
    pub fn sign_json(&self, value: &mut Value) -> Result<(), SigningError> {
        signing::sign_json(value, &self.server_name, &self.key_id, &self.signing_key)
    }

    /// Whether `value` carries this server's signature.
    ///
    /// # Errors
    ///
    /// See [`signing::has_signature`].
    pub fn has_signed(&self, value: &Value) -> Result<bool, SigningError> {
        signing::has_signature(value, &self.server_name, &self.key_id)
    }

    /// Verify this server's signature on `value`.
    ///
    /// # Errors
    ///
    /// See [`signing::verify_json`].
    pub fn verify_json(&self, value: &Value) -> Result<bool, SigningError> {
        signing::verify_json(
            value,
            &self.server_name,
            &self.key_id,
            &self.verifying_key(),
        )
    }

    /// Key file contents for this keyring.
    #[must_use]
    pub fn to_key_file(&self) -> Zeroizing<String> {
        let version = self
            .key_id
            .split_once(':')
            .map_or(DEFAULT_KEY_VERSION, |(_, version)| version);

        key_file_contents(version, &self.signing_key)
    }
}

fn parse_key_file(contents: &str) -> Result<(String, SigningKey), KeyError> {
    let mut parts = contents.split_whitespace();

    let (Some(algorithm), Some(version), Some(seed), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(KeyError::Format);
    };

    if algorithm != ALGORITHM {
        return Err(KeyError::Algorithm(algorithm.to_string()));
    }

    if version.is_empty()
        || !version
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(KeyError::Version);
    }

    let bytes = Zeroizing::new(decode_base64(seed)?);

    let seed: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .map_err(|_error: std::array::TryFromSliceError| KeyError::SeedLength(bytes.len()))?;

    Ok((version.to_string(), SigningKey::from_bytes(&seed)))
}

fn key_file_contents(version: &str, signing_key: &SigningKey) -> Zeroizing<String> {
    let seed = Zeroizing::new(encode_base64(signing_key.to_bytes()));

    Zeroizing::new(format!("{ALGORITHM} {version} {}\n", seed.as_str()))
}

fn write_key_file(path: &Path, version: &str, signing_key: &SigningKey) -> Result<(), KeyError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(KeyError::Write)?;
    }

    fs::write(path, key_file_contents(version, signing_key).as_bytes()).map_err(KeyError::Write)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(KeyError::Write)?;
    }

    Ok(())
}
