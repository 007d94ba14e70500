//! Chart-of-accounts node.

use serde::{Deserialize, Serialize};

/// Deepest level of the chart of accounts.
pub const MAX_LEVEL: u8 = 4;

/// A single account in the chart of accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique account code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Depth in the tree (1 = root).
    pub level: u8,
    /// Parent account code, `None` only for level-1 accounts.
    #[serde(default)]
    pub parent_code: Option<String>,
    /// `/`-separated ancestor path. Filled in by the hierarchy when empty.
    #[serde(default)]
    pub full_path: String,
}

impl Account {
    /// Creates a root (level-1) account.
    #[must_use]
    pub fn root(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            level: 1,
            parent_code: None,
            full_path: String::new(),
        }
    }

    /// Creates a child account one level below `parent`.
    #[must_use]
    pub fn child(
        code: impl Into<String>,
        name: impl Into<String>,
        level: u8,
        parent: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            level,
            parent_code: Some(parent.into()),
            full_path: String::new(),
        }
    }

    /// Returns true for level-1 accounts.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.level == 1
    }
}
