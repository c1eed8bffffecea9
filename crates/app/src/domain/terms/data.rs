//! Published terms documents.
//!
//! Loaded from YAML of the form:
//!
//! ```yaml
//! master_version: "1.0"
//! docs:
//!   privacy_policy:
//!     version: "1.0"
//!     langs:
//!       en:
//!         name: Privacy Policy
//!         url: https://example.org/privacy-1.0-en.html
//! ```

use std::{collections::BTreeMap, fs, path::Path};

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::domain::terms::errors::TermsFileError;

/// Terms that accounts must agree to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Terms {
    #[serde(default)]
    master_version: Option<String>,

    #[serde(default)]
    docs: BTreeMap<String, TermsDocument>,
}

/// One terms document, available in one or more languages.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TermsDocument {
    pub version: String,

    #[serde(default)]
    pub langs: BTreeMap<String, LocalisedDocument>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LocalisedDocument {
    pub name: String,
    pub url: String,
}

impl Terms {
    /// Parse terms from YAML.
    ///
    /// # Errors
    ///
    /// Returns an error when the YAML is malformed or documents are published
    /// without a master version.
    pub fn from_yaml(yaml: &str) -> Result<Self, TermsFileError> {
        let terms: Self = serde_norway::from_str(yaml)?;

        if terms.master_version.is_none() && !terms.docs.is_empty() {
            return Err(TermsFileError::MissingMasterVersion);
        }

        Ok(terms)
    }

    /// Read and parse the terms file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, TermsFileError> {
        let yaml = fs::read_to_string(path).map_err(TermsFileError::Read)?;

        Self::from_yaml(&yaml)
    }

    /// Version an account must have consented to, if any terms are published.
    #[must_use]
    pub fn master_version(&self) -> Option<&str> {
        self.master_version.as_deref()
    }

    /// Every URL a user may agree to.
    #[must_use]
    pub fn url_set(&self) -> FxHashSet<&str> {
        self.docs
            .values()
            .flat_map(|doc| doc.langs.values())
            .map(|lang| lang.url.as_str())
            .collect()
    }

    /// Whether `agreed` covers every document in at least one language.
    #[must_use]
    pub fn is_sufficient<S: AsRef<str>>(&self, agreed: &[S]) -> bool {
        let agreed: FxHashSet<&str> = agreed.iter().map(AsRef::as_ref).collect();

        self.docs.values().all(|doc| {
            doc.langs
                .values()
                .any(|lang| agreed.contains(lang.url.as_str()))
        })
    }

    /// Render the published documents for clients.
    #[must_use]
    pub fn for_client(&self) -> Value {
        let policies: Map<String, Value> = self
            .docs
            .iter()
            .map(|(name, doc)| {
                let mut policy = Map::new();

                policy.insert("version".to_string(), json!(doc.version));

                for (lang, localised) in &doc.langs {
                    policy.insert(lang.clone(), json!(localised));
                }

                (name.clone(), Value::Object(policy))
            })
            .collect();

        json!({ "policies": policies })
    }
}
