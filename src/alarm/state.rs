//! Arming state and the zone exclusion set.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Maximum length of a zone identifier (`"zone-" + suffix`).
pub const ZONE_ID_LEN: usize = 16;

/// Maximum number of distinct exclusions held at once.
pub const MAX_EXCLUSIONS: usize = 16;

/// Identifier of a zone as it appears in the exclusion set.
pub type ZoneId = heapless::String<ZONE_ID_LEN>;

/// Prefix shared by every exclusion identifier.
pub const ZONE_ID_PREFIX: &str = "zone-";

/// Protected state of the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ArmState {
    #[default]
    Disarmed,
    Armed,
}

impl ArmState {
    pub fn is_armed(self) -> bool {
        matches!(self, Self::Armed)
    }
}

impl fmt::Display for ArmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disarmed => write!(f, "disarmed"),
            Self::Armed => write!(f, "armed"),
        }
    }
}

/// Build the exclusion identifier for an operator-supplied zone digit.
pub fn zone_id_for(digit: char) -> ZoneId {
    let mut id = ZoneId::new();
    // Prefix (5) + one char (≤ 4 bytes) always fits in ZONE_ID_LEN.
    let _ = id.push_str(ZONE_ID_PREFIX);
    let _ = id.push(digit);
    id
}

/// Returned when an insert would exceed [`MAX_EXCLUSIONS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExclusionSetFull;

/// Zones permitted to be open while armed.
///
/// Unique members, insertion order kept only for stable reporting. Decoding
/// goes through [`insert`](Self::insert), so a stored record with repeats
/// still loads as a set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredExclusions")]
pub struct ExclusionSet {
    ids: heapless::Vec<ZoneId, MAX_EXCLUSIONS>,
}

/// Decoded form of [`ExclusionSet`] before repeats are dropped.
#[derive(Deserialize)]
struct StoredExclusions {
    ids: heapless::Vec<ZoneId, MAX_EXCLUSIONS>,
}

impl From<StoredExclusions> for ExclusionSet {
    fn from(stored: StoredExclusions) -> Self {
        let mut set = Self::new();
        for id in stored.ids {
            // No more ids than capacity, so insert cannot fail.
            let _ = set.insert(id);
        }
        set
    }
}

impl ExclusionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `id`. Returns `Ok(false)` if it was already present.
    pub fn insert(&mut self, id: ZoneId) -> Result<bool, ExclusionSetFull> {
        if self.contains(&id) {
            return Ok(false);
        }
        self.ids.push(id).map_err(|_| ExclusionSetFull)?;
        Ok(true)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|x| x.as_str() == id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(heapless::String::as_str)
    }
}

impl fmt::Display for ExclusionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, id) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{id}")?;
        }
        write!(f, "]")
    }
}
