//! Persistent key-value binding.
//!
//! One named slot per collection, each holding a JSON document.
//!
//! - `SlotStore`: trait for slot backends
//! - `FileSlotStore`: one `<slot>.json` file per slot, fsynced on write
//! - `MemorySlotStore`: in-memory map, for tests and ephemeral sessions

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::{debug, info};

use bridge_core::domain::Collection;

use crate::error::PersistError;

/// Slot name under which a collection is stored.
pub fn slot_name(collection: Collection) -> &'static str {
    match collection {
        Collection::Inventory => "blood-inventory",
        Collection::Requests => "urgent-requests",
        Collection::Camps => "donation-camps",
        Collection::Donors => "donors",
        Collection::Hospitals => "hospitals",
        Collection::Registrants => "camp-registrants",
        Collection::Vehicles => "delivery-vehicles",
        Collection::LogisticsEvents => "logistics-events",
    }
}

/// Backend for named slots.
pub trait SlotStore: Send + Sync {
    /// `Ok(None)` when the slot has never been written.
    fn read(&self, slot: &str) -> Result<Option<String>, PersistError>;

    fn write(&self, slot: &str, contents: &str) -> Result<(), PersistError>;

    fn remove(&self, slot: &str) -> Result<(), PersistError>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Memory
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemorySlotStore {
    slots: RwLock<HashMap<String, String>>,
}

impl MemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of slots currently held.
    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }
}

impl SlotStore for MemorySlotStore {
    fn read(&self, slot: &str) -> Result<Option<String>, PersistError> {
        Ok(self.slots.read().get(slot).cloned())
    }

    fn write(&self, slot: &str, contents: &str) -> Result<(), PersistError> {
        self.slots
            .write()
            .insert(slot.to_string(), contents.to_string());
        Ok(())
    }

    fn remove(&self, slot: &str) -> Result<(), PersistError> {
        self.slots.write().remove(slot);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

// ---------------------------------------------------------------------------
// File
// ---------------------------------------------------------------------------

/// Directory of slot files.
///
/// Writes go to a temporary sibling, are fsynced, then renamed over the slot
/// file so a crash never leaves a half-written slot behind.
#[derive(Debug)]
pub struct FileSlotStore {
    dir: PathBuf,
}

impl FileSlotStore {
    /// Open or create the slot directory.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, PersistError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| PersistError::io(dir.display().to_string(), e))?;
        info!(dir = %dir.display(), "slot store opened");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, slot: &str) -> PathBuf {
        self.dir.join(format!("{}.json", slot))
    }
}

impl SlotStore for FileSlotStore {
    fn read(&self, slot: &str) -> Result<Option<String>, PersistError> {
        match fs::read_to_string(self.slot_path(slot)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PersistError::io(slot, e)),
        }
    }

    fn write(&self, slot: &str, contents: &str) -> Result<(), PersistError> {
        let path = self.slot_path(slot);
        let tmp = self.dir.join(format!(".{}.json.tmp", slot));

        let write_tmp = || -> io::Result<()> {
            let mut file: File = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp)?;
            file.write_all(contents.as_bytes())?;
            file.sync_all()?;
            Ok(())
        };
        write_tmp().map_err(|e| PersistError::io(slot, e))?;
        fs::rename(&tmp, &path).map_err(|e| PersistError::io(slot, e))?;

        debug!(slot, bytes = contents.len(), "slot written");
        Ok(())
    }

    fn remove(&self, slot: &str) -> Result<(), PersistError> {
        match fs::remove_file(self.slot_path(slot)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PersistError::io(slot, e)),
        }
    }

    fn name(&self) -> &str {
        "file"
    }
}
