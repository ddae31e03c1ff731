use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Identity of one local notification.
///
/// The same integer keys both the display surface (renderer slot) and the
/// persistent store entry. Keeping the two namespaces on one type means a
/// record can never be shown under one id and stored under another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(pub i32);

impl NotificationId {
    pub fn new(id: i32) -> Self {
        Self(id)
    }

    pub fn get(self) -> i32 {
        self.0
    }

    /// Key under which the record lives in the persistent store.
    pub fn store_key(self) -> String {
        self.0.to_string()
    }

    /// Parse a store key back into an id.
    pub fn from_store_key(key: &str) -> Result<Self, CoreError> {
        key.parse()
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NotificationId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i32>()
            .map(Self)
            .map_err(|_| CoreError::InvalidId(s.to_string()))
    }
}

impl From<i32> for NotificationId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}
