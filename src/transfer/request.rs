//! Transfer request and parameter bundle parsing.
//!
//! The pipeline harness hands the transfer a loosely-typed bundle:
//!
//! ```json
//! { "parameters": { "files": ["a/b.txt"], "destination": "out",
//!                   "exclude": { "name": ["b.txt"], "path": ["a/c.txt"] } } }
//! ```
//!
//! [`TransferRequest::from_bundle`] turns it into a typed request once, at the
//! boundary. Required fields are checked by [`TransferRequest::validate`].

use std::collections::BTreeSet;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::TransferError;

/// Basename and full-path exclusion sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionRules {
    /// Basenames (final path segment) to skip.
    pub names: BTreeSet<String>,
    /// Full remote identifiers to skip.
    pub paths: BTreeSet<String>,
}

impl ExclusionRules {
    /// Returns true if neither set has entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.paths.is_empty()
    }
}

/// The input of one transfer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferRequest {
    /// Remote identifiers in the order they should be copied.
    pub files: Vec<String>,
    /// Local directory the files are copied into.
    pub destination: String,
    /// Files to leave out.
    pub exclude: ExclusionRules,
}

impl TransferRequest {
    /// Creates a request with no exclusions.
    pub fn new<I, S>(files: I, destination: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            files: files.into_iter().map(Into::into).collect(),
            destination: destination.into(),
            exclude: ExclusionRules::default(),
        }
    }

    /// Adds basenames to exclude.
    #[must_use]
    pub fn exclude_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Adds full identifiers to exclude.
    #[must_use]
    pub fn exclude_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.paths.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Parses the harness bundle `{ "parameters": { ... } }`.
    ///
    /// Absent, `null` or empty-array `parameters` and `exclude` sections, and
    /// absent `name` and `path` keys, are treated as empty. `files`,
    /// `exclude.name` and `exclude.path` accept a single string as well as an
    /// array of strings.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::InvalidParameters`] if a present value has the
    /// wrong type. Missing `files`/`destination` are not reported here; see
    /// [`TransferRequest::validate`].
    pub fn from_bundle(bundle: &Value) -> Result<Self, TransferError> {
        let raw = RawBundle::deserialize(bundle)
            .map_err(|source| TransferError::InvalidParameters { source })?;
        let parameters = raw.parameters.unwrap_or_default();
        let exclude = parameters.exclude.unwrap_or_default();

        Ok(Self {
            files: parameters.files.map(OneOrMany::into_vec).unwrap_or_default(),
            destination: parameters.destination.unwrap_or_default(),
            exclude: ExclusionRules {
                names: exclude
                    .name
                    .map(OneOrMany::into_vec)
                    .unwrap_or_default()
                    .into_iter()
                    .collect(),
                paths: exclude
                    .path
                    .map(OneOrMany::into_vec)
                    .unwrap_or_default()
                    .into_iter()
                    .collect(),
            },
        })
    }

    /// Checks the required fields.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::MissingParameter`] naming `files` when no file
    /// is requested, or `destination` when the destination is empty.
    pub fn validate(&self) -> Result<(), TransferError> {
        if self.files.is_empty() {
            return Err(TransferError::missing_parameter("files"));
        }
        if self.destination.is_empty() {
            return Err(TransferError::missing_parameter("destination"));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawBundle {
    #[serde(default, deserialize_with = "lenient_section")]
    parameters: Option<RawParameters>,
}

#[derive(Debug, Default, Deserialize)]
struct RawParameters {
    #[serde(default)]
    files: Option<OneOrMany>,
    #[serde(default)]
    destination: Option<String>,
    #[serde(default, deserialize_with = "lenient_section")]
    exclude: Option<RawExclude>,
}

#[derive(Debug, Default, Deserialize)]
struct RawExclude {
    #[serde(default)]
    name: Option<OneOrMany>,
    #[serde(default)]
    path: Option<OneOrMany>,
}

/// Reads an optional object section, treating `null` and `[]` as absent.
///
/// Bundles produced by loosely-typed harnesses encode an empty map as `[]`.
fn lenient_section<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) if items.is_empty() => Ok(None),
        Some(value) => T::deserialize(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }
}
