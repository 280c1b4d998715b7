//! Crash-recoverable persistence for the arming state.
//!
//! Two records in the `"alarm"` namespace, each a `postcard` blob that is
//! rewritten whole on every mutation:
//!
//! | Key        | Value            |
//! |------------|------------------|
//! | `armed`    | [`ArmState`]     |
//! | `excludes` | [`ExclusionSet`] |
//!
//! The store mirrors the last intended value of both records. A write that
//! fails marks its record dirty; the next mutation of either record retries
//! it. There is no background retry.

use log::{info, warn};

use crate::alarm::state::{ArmState, ExclusionSet, ExclusionSetFull, ZoneId};
use crate::app::ports::{StorageError, StoragePort};

const STATE_NAMESPACE: &str = "alarm";
const ARM_KEY: &str = "armed";
const EXCLUDES_KEY: &str = "excludes";

/// Large enough for a full exclusion set: 16 × (1 length byte + 16 bytes) + 1.
const MAX_RECORD_SIZE: usize = 320;

pub struct PersistentStateStore<S: StoragePort> {
    storage: S,
    arm: ArmState,
    excludes: ExclusionSet,
    arm_dirty: bool,
    excludes_dirty: bool,
}

impl<S: StoragePort> PersistentStateStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            arm: ArmState::Disarmed,
            excludes: ExclusionSet::new(),
            arm_dirty: false,
            excludes_dirty: false,
        }
    }

    /// Read both records without side effects.
    ///
    /// A missing arm record means a fresh medium and is reported as
    /// [`StorageError::NotFound`]. A missing exclusion record next to a
    /// present arm record is an empty set.
    pub fn try_load(&self) -> Result<(ArmState, ExclusionSet), StorageError> {
        let mut buf = [0u8; MAX_RECORD_SIZE];

        let len = self.storage.read(STATE_NAMESPACE, ARM_KEY, &mut buf)?;
        let arm: ArmState = postcard::from_bytes(&buf[..len]).map_err(|_| StorageError::Corrupted)?;

        let excludes = match self.storage.read(STATE_NAMESPACE, EXCLUDES_KEY, &mut buf) {
            Ok(len) => postcard::from_bytes(&buf[..len]).map_err(|_| StorageError::Corrupted)?,
            Err(StorageError::NotFound) => ExclusionSet::new(),
            Err(e) => return Err(e),
        };

        Ok((arm, excludes))
    }

    /// Boot-time load. Never fails.
    ///
    /// Any read or decode failure yields `(Disarmed, ∅)` and an attempt to
    /// rewrite the medium with that default.
    pub fn load(&mut self) -> (ArmState, ExclusionSet) {
        match self.try_load() {
            Ok((arm, excludes)) => {
                info!("Store: restored {} with exclusions {}", arm, excludes);
                self.arm = arm;
                self.excludes = excludes;
                self.arm_dirty = false;
                self.excludes_dirty = false;
            }
            Err(e) => {
                warn!("Store: load failed ({}), initialising defaults", e);
                self.arm = ArmState::Disarmed;
                self.excludes = ExclusionSet::new();
                self.arm_dirty = true;
                self.excludes_dirty = true;
                if let Err(e) = self.flush() {
                    warn!("Store: could not initialise medium ({})", e);
                }
            }
        }
        (self.arm, self.excludes.clone())
    }

    pub fn save_arm_state(&mut self, state: ArmState) -> Result<(), StorageError> {
        self.arm = state;
        self.arm_dirty = true;
        self.flush()
    }

    /// Add one exclusion and rewrite the exclusion record.
    ///
    /// A full set is reported as [`StorageError::Full`] and the exclusion
    /// record keeps its contents. Pending records are still retried.
    pub fn append_exclusion(&mut self, id: ZoneId) -> Result<(), StorageError> {
        let inserted = self.excludes.insert(id);
        if let Ok(true) = inserted {
            self.excludes_dirty = true;
        }
        let flushed = self.flush();
        match inserted {
            Err(ExclusionSetFull) => Err(StorageError::Full),
            Ok(_) => flushed,
        }
    }

    pub fn clear_exclusions(&mut self) -> Result<(), StorageError> {
        self.excludes.clear();
        self.excludes_dirty = true;
        self.flush()
    }

    /// Whether a record is waiting for a successful write.
    pub fn has_pending_writes(&self) -> bool {
        self.arm_dirty || self.excludes_dirty
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    // ── Internal ──────────────────────────────────────────────

    /// Write every dirty record. Returns the first error; later records are
    /// still attempted.
    fn flush(&mut self) -> Result<(), StorageError> {
        let mut result = Ok(());

        if self.arm_dirty {
            match write_record(&mut self.storage, ARM_KEY, &self.arm) {
                Ok(()) => self.arm_dirty = false,
                Err(e) => result = Err(e),
            }
        }

        if self.excludes_dirty {
            match write_record(&mut self.storage, EXCLUDES_KEY, &self.excludes) {
                Ok(()) => self.excludes_dirty = false,
                Err(e) => result = result.and(Err(e)),
            }
        }

        result
    }
}

fn write_record<S: StoragePort, T: serde::Serialize>(
    storage: &mut S,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let mut buf = [0u8; MAX_RECORD_SIZE];
    let bytes = postcard::to_slice(value, &mut buf).map_err(|_| StorageError::Full)?;
    storage.write(STATE_NAMESPACE, key, bytes)
}
