//! Shared types for L2DA (per-destination-address) bonding.
//!
//! This crate provides the small value types used by the steering core and
//! its front ends:
//!
//! - [`MacAddress`]: 48-bit Ethernet hardware address, the steering key
//! - [`AdminState`], [`OperState`], [`LinkState`]: member link state and the
//!   derived transmit-capable predicate
//! - [`IFNAMSIZ`]: maximum interface name length, including the terminator

mod link;
mod mac;

pub use link::{AdminState, LinkState, OperState};
pub use mac::{MacAddress, ETH_ALEN};

/// Maximum length of an interface name buffer, terminator included.
pub const IFNAMSIZ: usize = 16;

/// Common error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid MAC address format: {0}")]
    InvalidMacAddress(String),

    #[error("invalid admin state: {0}")]
    InvalidAdminState(String),

    #[error("invalid oper state: {0}")]
    InvalidOperState(String),
}
