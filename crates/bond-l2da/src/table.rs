//! Destination-address steering table.
//!
//! Maps a destination MAC to the member link that should carry it. Entries
//! hold a [`LinkId`] handle, never the link itself; the aggregate owns links
//! and purges their entries before a link goes away.
//!
//! Buckets are chosen by [`MacAddress::steering_hash`] fed through `FxHasher`,
//! so lookups cost one cheap hash plus a short equality scan. Addresses that
//! share the hash byte share a bucket; equality is still over the full
//! address.
//!
//! The table has no lock of its own. It lives inside the context's
//! [`SteeringLock`](crate::lock::SteeringLock): `&self` methods need the read
//! side, `&mut self` methods the write side.

use std::hash::{Hash, Hasher};
use std::ops::ControlFlow;

use l2da_types::MacAddress;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::aggregate::LinkId;
use crate::error::{L2daError, Result};

/// One destination-address mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SteeringEntry {
    pub da: MacAddress,
    pub link: LinkId,
}

/// Table key: hashes only the steering byte, compares the whole address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DaKey(MacAddress);

impl Hash for DaKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u8(self.0.steering_hash());
    }
}

/// At most one entry per destination address.
#[derive(Debug, Default)]
pub struct SteeringTable {
    entries: FxHashMap<DaKey, LinkId>,
}

impl SteeringTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, da: MacAddress) -> Option<LinkId> {
        self.entries.get(&DaKey(da)).copied()
    }

    /// Maps `da` to `link`, returning the link it was mapped to before.
    ///
    /// Updating an existing entry never allocates. A new entry that cannot be
    /// allocated fails with [`L2daError::OutOfMemory`] and leaves the table
    /// unchanged.
    pub fn upsert(&mut self, da: MacAddress, link: LinkId) -> Result<Option<LinkId>> {
        if let Some(slot) = self.entries.get_mut(&DaKey(da)) {
            return Ok(Some(std::mem::replace(slot, link)));
        }

        self.entries
            .try_reserve(1)
            .map_err(|_| L2daError::OutOfMemory(da))?;
        self.entries.insert(DaKey(da), link);
        Ok(None)
    }

    /// Removes the entry for `da`, returning the link it pointed at.
    pub fn remove(&mut self, da: MacAddress) -> Result<LinkId> {
        self.entries
            .remove(&DaKey(da))
            .ok_or(L2daError::NotFound(da))
    }

    /// Removes every entry owned by `link`, or every entry when `link` is
    /// `None`. `on_removed` sees each address before its entry is dropped.
    /// Returns the number of entries removed.
    pub fn remove_all<F>(&mut self, link: Option<LinkId>, mut on_removed: F) -> usize
    where
        F: FnMut(MacAddress),
    {
        let mut removed = 0;
        self.entries.retain(|key, owner| {
            let purge = link.map_or(true, |l| *owner == l);
            if purge {
                on_removed(key.0);
                removed += 1;
            }
            !purge
        });
        removed
    }

    /// Visits entries in bucket order until `visit` breaks.
    pub fn for_each<F>(&self, mut visit: F) -> ControlFlow<()>
    where
        F: FnMut(&SteeringEntry) -> ControlFlow<()>,
    {
        for (key, &link) in &self.entries {
            visit(&SteeringEntry { da: key.0, link })?;
        }
        ControlFlow::Continue(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
