use serde::{Deserialize, Serialize};

/// Availability of a monitored channel as stored in the `interface.available` column.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Available {
    #[default]
    Unknown,
    Available,
    Unavailable,
}

impl Available {
    pub fn as_u8(self) -> u8 {
        match self {
            Available::Unavailable => 0,
            Available::Available => 1,
            Available::Unknown => 2,
        }
    }

    pub fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Available::Unavailable),
            1 => Some(Available::Available),
            2 => Some(Available::Unknown),
            _ => None,
        }
    }
}

/// One field of an [`AvailabilityStatus`](crate::AvailabilityStatus) that can be marked dirty.
///
/// Variants are listed in wire/column order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatusField {
    Available,
    Error,
    ErrorsFrom,
    DisableUntil,
}

impl StatusField {
    pub const ALL: [StatusField; 4] = [
        StatusField::Available,
        StatusField::Error,
        StatusField::ErrorsFrom,
        StatusField::DisableUntil,
    ];

    /// Bit position on the wire. Must not change: the aggregator decodes by it.
    pub const fn bit(self) -> u8 {
        match self {
            StatusField::Available => 1 << 0,
            StatusField::Error => 1 << 1,
            StatusField::ErrorsFrom => 1 << 2,
            StatusField::DisableUntil => 1 << 3,
        }
    }
}

/// Set of changed fields. Empty means the record carries no update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct StatusFields(u8);

impl StatusFields {
    const VALID: u8 = 0b1111;

    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn all() -> Self {
        Self(Self::VALID)
    }

    /// Rebuild a set from its wire byte. Returns `None` when unknown bits are set.
    pub fn from_bits(bits: u8) -> Option<Self> {
        if bits & !Self::VALID != 0 {
            return None;
        }
        Some(Self(bits))
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn insert(&mut self, field: StatusField) {
        self.0 |= field.bit();
    }

    pub fn contains(self, field: StatusField) -> bool {
        self.0 & field.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Fields present in the set, in wire/column order.
    pub fn iter(self) -> impl Iterator<Item = StatusField> {
        StatusField::ALL.into_iter().filter(move |f| self.contains(*f))
    }
}

impl FromIterator<StatusField> for StatusFields {
    fn from_iter<I: IntoIterator<Item = StatusField>>(iter: I) -> Self {
        let mut set = StatusFields::empty();
        for field in iter {
            set.insert(field);
        }
        set
    }
}
