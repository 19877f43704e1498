use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a monitored interface. Allocated by the store, never by this crate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InterfaceId(pub u64);

impl InterfaceId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for InterfaceId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

impl fmt::Display for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
