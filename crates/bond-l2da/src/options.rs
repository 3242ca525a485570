//! L2DA option flags and their lock-free registry.
//!
//! The options word is read with one atomic load on every TX/RX decision and
//! replaced with one atomic swap from the control plane. Nothing orders an
//! option change against a table mutation: each decision uses whatever value
//! it loaded.

use std::fmt;
use std::ops::BitOr;
use std::sync::atomic::{AtomicU32, Ordering};

use log::info;
use serde::{Deserialize, Serialize};

/// Bitmask of independent L2DA feature flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct L2daOptions(u32);

impl L2daOptions {
    /// Re-transmit received frames onto other member links (bridging).
    pub const FORWARD_RX: L2daOptions = L2daOptions(1 << 0);
    /// Accept a source address only on its mapped (or default) link.
    pub const DEDUP_RX: L2daOptions = L2daOptions(1 << 1);
    /// Send multicast destinations on every member link.
    pub const DUP_MC_TX: L2daOptions = L2daOptions(1 << 2);

    /// No flags set.
    pub const fn empty() -> Self {
        L2daOptions(0)
    }

    /// Wraps a raw mask. Unknown bits are kept so they round-trip to the caller.
    pub const fn from_bits(bits: u32) -> Self {
        L2daOptions(bits)
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub const fn contains(&self, other: L2daOptions) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns a copy with `flag` set or cleared.
    pub const fn with(self, flag: L2daOptions, enabled: bool) -> Self {
        if enabled {
            L2daOptions(self.0 | flag.0)
        } else {
            L2daOptions(self.0 & !flag.0)
        }
    }

    pub const fn forward_rx(&self) -> bool {
        self.contains(Self::FORWARD_RX)
    }

    pub const fn dedup_rx(&self) -> bool {
        self.contains(Self::DEDUP_RX)
    }

    pub const fn dup_mc_tx(&self) -> bool {
        self.contains(Self::DUP_MC_TX)
    }
}

impl BitOr for L2daOptions {
    type Output = L2daOptions;

    fn bitor(self, rhs: L2daOptions) -> L2daOptions {
        L2daOptions(self.0 | rhs.0)
    }
}

impl fmt::Display for L2daOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

/// Named-flag form of [`L2daOptions`] used in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptionFlags {
    pub forward_rx: bool,
    pub dedup_rx: bool,
    pub dup_mc_tx: bool,
}

impl From<OptionFlags> for L2daOptions {
    fn from(flags: OptionFlags) -> Self {
        L2daOptions::empty()
            .with(L2daOptions::FORWARD_RX, flags.forward_rx)
            .with(L2daOptions::DEDUP_RX, flags.dedup_rx)
            .with(L2daOptions::DUP_MC_TX, flags.dup_mc_tx)
    }
}

impl From<L2daOptions> for OptionFlags {
    fn from(opts: L2daOptions) -> Self {
        OptionFlags {
            forward_rx: opts.forward_rx(),
            dedup_rx: opts.dedup_rx(),
            dup_mc_tx: opts.dup_mc_tx(),
        }
    }
}

/// Atomic holder for the options word of one aggregate.
#[derive(Debug, Default)]
pub struct OptionsRegistry {
    bits: AtomicU32,
}

impl OptionsRegistry {
    pub fn new(initial: L2daOptions) -> Self {
        Self {
            bits: AtomicU32::new(initial.bits()),
        }
    }

    /// Single atomic load.
    pub fn load(&self) -> L2daOptions {
        L2daOptions(self.bits.load(Ordering::Relaxed))
    }

    /// Single atomic exchange. Returns the previous value.
    pub fn store(&self, opts: L2daOptions) -> L2daOptions {
        let old = L2daOptions(self.bits.swap(opts.bits(), Ordering::Relaxed));
        if old != opts {
            info!("bond_l2da: opts changed {} => {}", old, opts);
        }
        old
    }
}
