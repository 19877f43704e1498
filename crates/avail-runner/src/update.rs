use std::path::Path;

use anyhow::{Context, Result};
use avail_core::{Available, InterfaceAvailability};
use serde::{Deserialize, Serialize};

/// Partial availability change as written by hand or by another tool.
/// Only the keys that are present end up dirty.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AvailabilityUpdate {
    pub interfaceid: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<Available>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors_from: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_until: Option<i32>,
}

impl AvailabilityUpdate {
    pub fn into_record(self) -> InterfaceAvailability {
        let mut ia = InterfaceAvailability::new(self.interfaceid);
        if let Some(available) = self.available {
            ia.set_available(available);
        }
        if let Some(error) = self.error {
            ia.set_error(error);
        }
        if let Some(errors_from) = self.errors_from {
            ia.set_errors_from(errors_from);
        }
        if let Some(disable_until) = self.disable_until {
            ia.set_disable_until(disable_until);
        }
        ia
    }
}

/// Read a JSON array of updates, keeping file order.
pub fn load_updates(path: &Path) -> Result<Vec<InterfaceAvailability>> {
    let s = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let updates: Vec<AvailabilityUpdate> =
        serde_json::from_str(&s).with_context(|| format!("parse updates {}", path.display()))?;
    Ok(updates.into_iter().map(AvailabilityUpdate::into_record).collect())
}
