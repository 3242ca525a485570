//! Collaborator interfaces owned by the surrounding bonding framework.
//!
//! The steering core never owns links. It refers to them by [`LinkId`]
//! handles and asks the [`Aggregate`] about membership and state at decision
//! time. Frames leave through a [`Transmitter`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque handle of a member link, issued by the aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkId(u32);

impl LinkId {
    pub const fn new(raw: u32) -> Self {
        LinkId(raw)
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "link#{}", self.0)
    }
}

/// Read-only view of the aggregate's member links.
pub trait Aggregate {
    /// Bound members in canonical order.
    fn members(&self) -> &[LinkId];

    /// Administratively up AND link-state up AND an active member.
    ///
    /// Must return false for handles that are not members.
    fn can_transmit(&self, link: LinkId) -> bool;

    /// Interface name, for diagnostics and name queries.
    fn link_name(&self, link: LinkId) -> Option<&str>;

    /// Resolves an interface name to a member handle.
    fn link_by_name(&self, name: &str) -> Option<LinkId>;

    /// Name for log lines; "null" when the handle is unknown.
    fn display_name(&self, link: Option<LinkId>) -> &str {
        link.and_then(|l| self.link_name(l)).unwrap_or("null")
    }
}

/// Frame transmit primitive.
pub trait Transmitter<F> {
    /// Queues `frame` on exactly one member link.
    fn queue_xmit(&self, link: LinkId, frame: F);

    /// Sends a copy of `frame` on every member link.
    fn xmit_all(&self, frame: F);
}
