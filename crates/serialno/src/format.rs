use crate::{Error, Result};
use core::fmt;
use serde::{Deserialize, Serialize};

/// Longest accepted business key.
pub const MAX_KEY_LEN: usize = 64;

/// Opaque identifier of a stored [`SerialFormat`], assigned by the store at
/// creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormatId(u64);

impl FormatId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named template plus the counter it draws numbers from.
///
/// `key` is the lookup and lock key and never changes after creation.
/// `current_number` is the next number the generator will consider; it only
/// moves forward during generation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerialFormat {
    pub id: FormatId,
    pub name: String,
    pub key: String,
    pub pattern: String,
    pub current_number: u64,
    pub is_active: bool,
    #[serde(default)]
    pub note: Option<String>,
}

impl SerialFormat {
    /// Applies a full-field replace. The id and key are kept.
    pub fn apply(&mut self, update: FormatUpdate) {
        self.name = update.name.trim().to_owned();
        self.pattern = update.pattern;
        self.current_number = update.current_number;
        self.is_active = update.is_active;
        self.note = update.note;
    }
}

/// Fields accepted when creating a format.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFormat {
    pub name: String,
    pub key: String,
    pub pattern: String,
    #[serde(default)]
    pub current_number: u64,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
    #[serde(default)]
    pub note: Option<String>,
}

const fn active_by_default() -> bool {
    true
}

impl NewFormat {
    /// An active format starting at zero.
    pub fn new(key: impl Into<String>, name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            pattern: pattern.into(),
            current_number: 0,
            is_active: true,
            note: None,
        }
    }

    pub const fn starting_at(mut self, current_number: u64) -> Self {
        self.current_number = current_number;
        self
    }

    pub const fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let key = self.key.trim();
        if key.is_empty() {
            return Err(invalid("key must not be blank"));
        }
        if key.chars().count() > MAX_KEY_LEN {
            return Err(invalid(format!("key exceeds {MAX_KEY_LEN} characters")));
        }
        validate_common(&self.name, &self.pattern)
    }

    /// Builds the stored record. Surrounding whitespace is stripped from the
    /// key and name.
    pub fn into_format(self, id: FormatId) -> SerialFormat {
        SerialFormat {
            id,
            name: self.name.trim().to_owned(),
            key: self.key.trim().to_owned(),
            pattern: self.pattern,
            current_number: self.current_number,
            is_active: self.is_active,
            note: self.note,
        }
    }
}

/// Full-field replacement of a format's mutable fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatUpdate {
    pub name: String,
    pub pattern: String,
    pub current_number: u64,
    pub is_active: bool,
    #[serde(default)]
    pub note: Option<String>,
}

impl FormatUpdate {
    pub fn validate(&self) -> Result<()> {
        validate_common(&self.name, &self.pattern)
    }
}

impl From<&SerialFormat> for FormatUpdate {
    fn from(format: &SerialFormat) -> Self {
        Self {
            name: format.name.clone(),
            pattern: format.pattern.clone(),
            current_number: format.current_number,
            is_active: format.is_active,
            note: format.note.clone(),
        }
    }
}

fn validate_common(name: &str, pattern: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(invalid("name must not be blank"));
    }
    if pattern.trim().is_empty() {
        return Err(invalid("pattern must not be blank"));
    }
    Ok(())
}

fn invalid(reason: impl Into<String>) -> Error {
    Error::InvalidFormat {
        reason: reason.into(),
    }
}
