//! In-memory member link registry.
//!
//! A plain implementation of [`Aggregate`] for front ends and tests that do
//! not sit inside a real bonding driver. Links keep the order they were added
//! in; that order is the canonical member order used by default selection.
//!
//! Removing a link must be preceded by [`L2daContext::unbind_link`] so that
//! its mappings are purged before the handle disappears.
//!
//! [`L2daContext::unbind_link`]: crate::L2daContext::unbind_link

use l2da_types::{LinkState, IFNAMSIZ};
use rustc_hash::FxHashMap;

use crate::aggregate::{Aggregate, LinkId};
use crate::error::{L2daError, Result};

/// A member link known to the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub id: LinkId,
    pub name: String,
    pub state: LinkState,
}

/// Member links of one aggregate.
#[derive(Debug, Default)]
pub struct LinkRegistry {
    links: FxHashMap<LinkId, Link>,
    by_name: FxHashMap<String, LinkId>,
    order: Vec<LinkId>,
    next_id: u32,
}

impl LinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a member at the end of the canonical order.
    pub fn add_link(&mut self, name: &str, state: LinkState) -> Result<LinkId> {
        if name.is_empty() || name.len() >= IFNAMSIZ {
            return Err(L2daError::InvalidArgument(format!(
                "link name '{}' must be 1..{} bytes",
                name,
                IFNAMSIZ - 1
            )));
        }
        if self.by_name.contains_key(name) {
            return Err(L2daError::InvalidArgument(format!(
                "link '{}' already exists",
                name
            )));
        }

        let id = LinkId::new(self.next_id);
        self.next_id += 1;

        self.links.insert(
            id,
            Link {
                id,
                name: name.to_string(),
                state,
            },
        );
        self.by_name.insert(name.to_string(), id);
        self.order.push(id);
        Ok(id)
    }

    /// Removes a member. Its handle is never reissued.
    pub fn remove_link(&mut self, id: LinkId) -> Result<Link> {
        let link = self
            .links
            .remove(&id)
            .ok_or_else(|| L2daError::LinkNotFound(id.to_string()))?;
        self.by_name.remove(&link.name);
        self.order.retain(|&l| l != id);
        Ok(link)
    }

    /// Replaces a member's state and returns the previous one.
    pub fn set_state(&mut self, id: LinkId, state: LinkState) -> Result<LinkState> {
        let link = self
            .links
            .get_mut(&id)
            .ok_or_else(|| L2daError::LinkNotFound(id.to_string()))?;
        Ok(std::mem::replace(&mut link.state, state))
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(&id)
    }

    /// Members in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = &Link> {
        self.order.iter().filter_map(|id| self.links.get(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl Aggregate for LinkRegistry {
    fn members(&self) -> &[LinkId] {
        &self.order
    }

    fn can_transmit(&self, link: LinkId) -> bool {
        self.links
            .get(&link)
            .is_some_and(|l| l.state.can_transmit())
    }

    fn link_name(&self, link: LinkId) -> Option<&str> {
        self.links.get(&link).map(|l| l.name.as_str())
    }

    fn link_by_name(&self, name: &str) -> Option<LinkId> {
        self.by_name.get(name).copied()
    }
}
