//! Permissions an application requests over a merchant account.
//!
//! The provider accepts a fixed set of permission codes in an authorization
//! request. [`Permission`] covers exactly that set, so an out-of-catalog
//! code cannot reach serialization; strings coming from a host application
//! pass through [`Permission::from_str`] and fail there instead.
//!
//! [`Permission::from_str`]: std::str::FromStr

use std::fmt;
use std::str::FromStr;

/// One permission an application can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    /// Create checkout sessions on the merchant's behalf.
    CreateCheckouts,
    /// Receive the merchant's transaction notifications.
    ReceiveTransactionNotifications,
    /// Search the merchant's transactions.
    SearchTransactions,
    /// Manage the merchant's payment pre-approvals.
    ManagePaymentPreApprovals,
}

impl Permission {
    /// Every permission the provider accepts.
    pub const ALL: [Self; 4] = [
        Self::CreateCheckouts,
        Self::ReceiveTransactionNotifications,
        Self::SearchTransactions,
        Self::ManagePaymentPreApprovals,
    ];

    /// The provider's code for this permission.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CreateCheckouts => "CREATE_CHECKOUTS",
            Self::ReceiveTransactionNotifications => "RECEIVE_TRANSACTION_NOTIFICATIONS",
            Self::SearchTransactions => "SEARCH_TRANSACTIONS",
            Self::ManagePaymentPreApprovals => "MANAGE_PAYMENT_PRE_APPROVALS",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a [`Permission`] from a string fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown permission code: {0}")]
pub struct PermissionFormatError(String);

impl FromStr for Permission {
    type Err = PermissionFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|permission| permission.as_str() == s)
            .ok_or_else(|| PermissionFormatError(s.to_string()))
    }
}

/// Insertion-ordered permission set without duplicates.
///
/// The request document serializes permissions in the order they were
/// added, so adding the same permission twice keeps its first position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet {
    entries: Vec<Permission>,
}

impl PermissionSet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Number of permissions in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when the set contains this permission.
    #[must_use]
    pub fn contains(&self, permission: Permission) -> bool {
        self.entries.contains(&permission)
    }

    /// Adds a permission. Returns false when it was already present.
    pub fn insert(&mut self, permission: Permission) -> bool {
        if self.contains(permission) {
            return false;
        }
        self.entries.push(permission);
        true
    }

    /// Removes a permission. Returns false when it was not present.
    pub fn remove(&mut self, permission: Permission) -> bool {
        let Some(position) = self.entries.iter().position(|entry| *entry == permission) else {
            return false;
        };
        self.entries.remove(position);
        true
    }

    /// Iterates permissions in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        self.entries.iter().copied()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        let mut set = Self::new();
        for permission in iter {
            set.insert(permission);
        }
        set
    }
}
