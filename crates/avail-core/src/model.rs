use crate::{ids::*, types::*};

/// Observed availability of one channel plus the set of fields that were actually observed.
///
/// Only fields present in `dirty` are synchronized; the others keep whatever value the
/// receiver or the store already has.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AvailabilityStatus {
    pub available: Available,
    pub error: String,
    /// Start of the current error streak, epoch seconds. 0 when unset.
    pub errors_from: i32,
    /// Checks are suppressed until this time, epoch seconds. 0 when unset.
    pub disable_until: i32,
    pub dirty: StatusFields,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InterfaceAvailability {
    pub interface_id: InterfaceId,
    pub status: AvailabilityStatus,
}

impl InterfaceAvailability {
    /// Fresh record bound to `interface_id` with nothing marked dirty.
    pub fn new(interface_id: u64) -> Self {
        Self {
            interface_id: InterfaceId(interface_id),
            status: AvailabilityStatus::default(),
        }
    }

    /// Authoritative update: assigns every field and marks all of them dirty.
    pub fn set_status(&mut self, available: Available, error: impl Into<String>, errors_from: i32, disable_until: i32) {
        self.status = AvailabilityStatus {
            available,
            error: error.into(),
            errors_from,
            disable_until,
            dirty: StatusFields::all(),
        };
    }

    pub fn set_available(&mut self, available: Available) {
        self.status.available = available;
        self.status.dirty.insert(StatusField::Available);
    }

    pub fn set_error(&mut self, error: impl Into<String>) {
        self.status.error = error.into();
        self.status.dirty.insert(StatusField::Error);
    }

    pub fn set_errors_from(&mut self, errors_from: i32) {
        self.status.errors_from = errors_from;
        self.status.dirty.insert(StatusField::ErrorsFrom);
    }

    pub fn set_disable_until(&mut self, disable_until: i32) {
        self.status.disable_until = disable_until;
        self.status.dirty.insert(StatusField::DisableUntil);
    }

    pub fn is_dirty(&self) -> bool {
        !self.status.dirty.is_empty()
    }

    pub fn dirty(&self) -> StatusFields {
        self.status.dirty
    }

    /// Releases the diagnostic text. Dropping the record does the same; this exists for
    /// owners that recycle a record in place between cycles.
    pub fn clean(&mut self) {
        self.status.error = String::new();
    }
}
