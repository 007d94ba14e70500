//! Chart-of-accounts tree.
//!
//! The hierarchy is loaded once per run and is immutable afterwards. The
//! rule validator, rule applicator and aggregator borrow it for lookups:
//! - by code, then by name (`resolve`)
//! - children of an account
//! - accounts at a given level
//! - ancestor chain for roll-ups

pub mod account;
pub mod error;

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

pub use account::{Account, MAX_LEVEL};
pub use error::HierarchyError;

/// Validated chart of accounts.
///
/// Invariants enforced at construction:
/// - account codes are unique and non-empty
/// - levels are between 1 and 4
/// - every non-root account's parent exists and sits exactly one level above
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Account>", into = "Vec<Account>")]
pub struct AccountHierarchy {
    accounts: BTreeMap<String, Account>,
    names: HashMap<String, String>,
    children: HashMap<String, Vec<String>>,
}

impl AccountHierarchy {
    /// Builds and validates a hierarchy from a flat account list.
    ///
    /// Accounts with an empty `full_path` get one materialized from their
    /// ancestors' names.
    pub fn new(accounts: Vec<Account>) -> Result<Self, HierarchyError> {
        let mut by_code: BTreeMap<String, Account> = BTreeMap::new();
        let mut names = HashMap::new();

        for account in accounts {
            if account.code.trim().is_empty() {
                return Err(HierarchyError::EmptyCode);
            }
            if !(1..=MAX_LEVEL).contains(&account.level) {
                return Err(HierarchyError::InvalidLevel {
                    code: account.code,
                    level: account.level,
                });
            }
            if by_code.contains_key(&account.code) {
                return Err(HierarchyError::DuplicateCode(account.code));
            }
            if !account.name.is_empty() {
                // First account with a given name wins name lookups.
                names
                    .entry(account.name.clone())
                    .or_insert_with(|| account.code.clone());
            }
            by_code.insert(account.code.clone(), account);
        }

        let mut children: HashMap<String, Vec<String>> = HashMap::new();
        for account in by_code.values() {
            match (&account.parent_code, account.level) {
                (None, 1) => {}
                (Some(parent), 1) => {
                    return Err(HierarchyError::RootWithParent {
                        code: account.code.clone(),
                        parent: parent.clone(),
                    });
                }
                (None, level) => {
                    return Err(HierarchyError::MissingParent {
                        code: account.code.clone(),
                        level,
                    });
                }
                (Some(parent_code), level) => {
                    let parent =
                        by_code
                            .get(parent_code)
                            .ok_or_else(|| HierarchyError::ParentNotFound {
                                code: account.code.clone(),
                                parent: parent_code.clone(),
                            })?;
                    if parent.level + 1 != level {
                        return Err(HierarchyError::LevelMismatch {
                            code: account.code.clone(),
                            level,
                            parent: parent_code.clone(),
                            parent_level: parent.level,
                        });
                    }
                    children
                        .entry(parent_code.clone())
                        .or_default()
                        .push(account.code.clone());
                }
            }
        }

        let mut hierarchy = Self {
            accounts: by_code,
            names,
            children,
        };
        hierarchy.materialize_paths();

        tracing::debug!(accounts = hierarchy.len(), "Account hierarchy built");
        Ok(hierarchy)
    }

    /// Fills empty `full_path` values top-down.
    fn materialize_paths(&mut self) {
        for level in 1..=MAX_LEVEL {
            let pending: Vec<String> = self
                .accounts
                .values()
                .filter(|a| a.level == level && a.full_path.is_empty())
                .map(|a| a.code.clone())
                .collect();

            for code in pending {
                let Some(account) = self.accounts.get(&code) else {
                    continue;
                };
                let path = match account
                    .parent_code
                    .as_ref()
                    .and_then(|p| self.accounts.get(p))
                {
                    Some(parent) => format!("{}/{}", parent.full_path, account.name),
                    None => account.name.clone(),
                };
                if let Some(account) = self.accounts.get_mut(&code) {
                    account.full_path = path;
                }
            }
        }
    }

    /// Looks up an account by exact code.
    #[must_use]
    pub fn get_account(&self, code: &str) -> Option<&Account> {
        self.accounts.get(code)
    }

    /// Looks up an account by exact name.
    #[must_use]
    pub fn get_account_by_name(&self, name: &str) -> Option<&Account> {
        self.names.get(name).and_then(|code| self.accounts.get(code))
    }

    /// Resolves a code or name: exact code first, then exact name.
    #[must_use]
    pub fn resolve(&self, code_or_name: &str) -> Option<&Account> {
        self.get_account(code_or_name)
            .or_else(|| self.get_account_by_name(code_or_name))
    }

    /// Direct children of an account, ordered by code.
    #[must_use]
    pub fn children(&self, code: &str) -> Vec<&Account> {
        self.children
            .get(code)
            .map(|codes| codes.iter().filter_map(|c| self.accounts.get(c)).collect())
            .unwrap_or_default()
    }

    /// Returns true if the account has at least one child.
    #[must_use]
    pub fn has_children(&self, code: &str) -> bool {
        self.children.get(code).is_some_and(|c| !c.is_empty())
    }

    /// Parent of an account, if any.
    #[must_use]
    pub fn parent(&self, code: &str) -> Option<&Account> {
        self.accounts
            .get(code)
            .and_then(|a| a.parent_code.as_deref())
            .and_then(|p| self.accounts.get(p))
    }

    /// Ancestors of an account, nearest first.
    #[must_use]
    pub fn ancestors(&self, code: &str) -> Vec<&Account> {
        let mut chain = Vec::new();
        let mut current = self.parent(code);
        while let Some(account) = current {
            chain.push(account);
            current = self.parent(&account.code);
        }
        chain
    }

    /// Accounts at the given level, ordered by code.
    #[must_use]
    pub fn accounts_at_level(&self, level: u8) -> Vec<&Account> {
        self.accounts.values().filter(|a| a.level == level).collect()
    }

    /// Iterates over all accounts ordered by code.
    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    /// Number of accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Returns true if the hierarchy has no accounts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl TryFrom<Vec<Account>> for AccountHierarchy {
    type Error = HierarchyError;

    fn try_from(accounts: Vec<Account>) -> Result<Self, Self::Error> {
        Self::new(accounts)
    }
}

impl From<AccountHierarchy> for Vec<Account> {
    fn from(hierarchy: AccountHierarchy) -> Self {
        hierarchy.accounts.into_values().collect()
    }
}
