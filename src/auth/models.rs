use serde::{Deserialize, Serialize};
use std::fmt;

/// Permission a principal holds on a shared document.
///
/// The order of variants matters: `View` is the least privileged, `Edit` the
/// most. Serialized as lowercase strings (`"view"`, `"edit"`), which is also
/// the format stored in the `sharedWith` map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    /// Read-only access.
    View = 0,
    /// May change title and content and manage sharing.
    Edit = 1,
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PermissionLevel {
    /// Parse a permission level from a string (case-insensitive).
    pub fn from_str_ci(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "view" => Some(PermissionLevel::View),
            "edit" => Some(PermissionLevel::Edit),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionLevel::View => "view",
            PermissionLevel::Edit => "edit",
        }
    }

    /// Returns `true` if `self` has at least the required permission.
    pub fn has_access(&self, required: PermissionLevel) -> bool {
        *self >= required
    }
}

/// The signed-in identity, as produced by the external sign-in flow.
///
/// `uid` is the canonical key used in a document's `sharedWith` map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Unique user identifier from the identity provider.
    pub uid: String,
    /// User email address.
    pub email: String,
    /// Display name, when the provider supplies one.
    #[serde(default)]
    pub display_name: Option<String>,
}

impl Principal {
    pub fn new(uid: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}
