//! Per-aggregate L2DA context: lifecycle and configuration operations.
//!
//! The context owns the steering table, the default link and the set of
//! links it has bound behind one [`SteeringLock`], plus the lock-free options
//! word. Links stay owned by the aggregate; every operation that needs link
//! names, canonical order or link state takes the aggregate view as an
//! argument. Only bound links may carry mappings or become the default.
//!
//! TX resolution lives in [`crate::tx`], RX admission and forwarding in
//! [`crate::rx`].

use std::num::NonZeroU32;
use std::ops::ControlFlow;
use std::sync::Arc;

use l2da_types::{MacAddress, IFNAMSIZ};
use log::{debug, error, info, warn};
use rustc_hash::FxHashSet;

use crate::aggregate::{Aggregate, LinkId};
use crate::error::{L2daError, Result};
use crate::lock::SteeringLock;
use crate::notify::{L2daNotifier, NoopNotifier};
use crate::options::{L2daOptions, OptionsRegistry};
use crate::selector::select_default_link;
use crate::stats::{L2daStats, L2daStatsSnapshot, LogLimiter};
use crate::table::{SteeringEntry, SteeringTable};

/// Clone-failure messages allowed per second on the RX path.
const CLONE_FAIL_LOGS_PER_SEC: NonZeroU32 = match NonZeroU32::new(10) {
    Some(n) => n,
    None => panic!("log rate must be non-zero"),
};

/// State guarded by the steering lock.
#[derive(Debug, Default)]
pub(crate) struct SteeringState {
    pub(crate) table: SteeringTable,
    pub(crate) default_link: Option<LinkId>,
    /// Links between `bind_link` and `unbind_link`.
    pub(crate) bound: FxHashSet<LinkId>,
}

impl SteeringState {
    fn require_bound<A>(&self, aggregate: &A, link: LinkId) -> Result<()>
    where
        A: Aggregate + ?Sized,
    {
        if self.bound.contains(&link) {
            Ok(())
        } else {
            Err(L2daError::LinkNotFound(
                aggregate
                    .link_name(link)
                    .map_or_else(|| link.to_string(), str::to_string),
            ))
        }
    }
}

/// L2DA steering context of one bonding device.
pub struct L2daContext {
    /// Bond device name, used in log lines.
    name: String,
    pub(crate) opts: OptionsRegistry,
    pub(crate) state: SteeringLock<SteeringState>,
    notifier: Arc<dyn L2daNotifier>,
    pub(crate) stats: L2daStats,
    pub(crate) clone_fail_log: LogLimiter,
}

impl std::fmt::Debug for L2daContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("L2daContext");
        s.field("name", &self.name).field("opts", &self.opts.load());
        if let Some(state) = self.state.try_read() {
            s.field("default_link", &state.default_link)
                .field("mappings", &state.table.len());
        }
        s.finish_non_exhaustive()
    }
}

impl L2daContext {
    /// Initializes an empty context: no mappings, no default link, all
    /// options cleared.
    pub fn new(name: impl Into<String>, notifier: Arc<dyn L2daNotifier>) -> Self {
        let ctx = Self {
            name: name.into(),
            opts: OptionsRegistry::new(L2daOptions::empty()),
            state: SteeringLock::new(SteeringState::default()),
            notifier,
            stats: L2daStats::default(),
            clone_fail_log: LogLimiter::per_second(CLONE_FAIL_LOGS_PER_SEC),
        };
        info!("{}: bond_l2da initialized", ctx.name);
        ctx
    }

    /// Context without change notifications.
    pub fn without_notifier(name: impl Into<String>) -> Self {
        Self::new(name, Arc::new(NoopNotifier))
    }

    /// Tears the context down after purging every mapping.
    ///
    /// # Panics
    ///
    /// Panics if an entry survives the purge. That can only follow a broken
    /// invariant elsewhere and is not recoverable.
    pub fn deinitialize(self) {
        self.purge();
        let state = self.state.into_inner();
        assert!(
            state.table.is_empty(),
            "{}: bond_l2da table not empty after purge ({} entries)",
            self.name,
            state.table.len()
        );
        info!("{}: bond_l2da de-initialized", self.name);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // ============ Member links ============

    /// Binds a new member. The first member bound becomes the default, then
    /// the selector confirms or replaces it.
    pub fn bind_link<A>(&self, aggregate: &A, link: LinkId)
    where
        A: Aggregate + ?Sized,
    {
        let mut state = self.state.write();
        state.bound.insert(link);
        if state.default_link.is_none() {
            state.default_link = Some(link);
            info!(
                "{}: bond_l2da default link initially set to {}",
                self.name,
                aggregate.display_name(Some(link))
            );
        }
        self.reselect_default(&mut state, aggregate, None);
    }

    /// Unbinds a member: purges its mappings and moves the default away from
    /// it. Must complete before the aggregate forgets the link.
    pub fn unbind_link<A>(&self, aggregate: &A, link: LinkId)
    where
        A: Aggregate + ?Sized,
    {
        let mut state = self.state.write();
        state.bound.remove(&link);
        if state.default_link == Some(link) {
            state.default_link = aggregate
                .members()
                .iter()
                .copied()
                .find(|l| state.bound.contains(l));
            info!(
                "{}: bond_l2da default link set to {}",
                self.name,
                aggregate.display_name(state.default_link)
            );
        }

        let notifier = &self.notifier;
        let purged = state
            .table
            .remove_all(Some(link), |da| notifier.mapping_removed(da));
        if purged > 0 {
            info!(
                "{}: bond_l2da purged {} pair(s) of {}",
                self.name,
                purged,
                aggregate.display_name(Some(link))
            );
        }

        self.reselect_default(&mut state, aggregate, Some(link));
    }

    /// Reacts to a member's admin/carrier/active change.
    ///
    /// Reselects the default link and, if it moved, tells the notifier which
    /// link it moved away from.
    pub fn handle_link_change<A>(&self, aggregate: &A, link: LinkId)
    where
        A: Aggregate + ?Sized,
    {
        let mut state = self.state.write();
        let previous = state.default_link;
        self.reselect_default(&mut state, aggregate, None);

        debug!(
            "{}: bond_l2da link change on {}",
            self.name,
            aggregate.display_name(Some(link))
        );

        if let Some(prev) = previous {
            if state.default_link != Some(prev) {
                self.notifier.default_link_departed(prev);
            }
        }
    }

    /// Runs the default selector and logs a change. Write lock held.
    fn reselect_default<A>(&self, state: &mut SteeringState, aggregate: &A, departing: Option<LinkId>)
    where
        A: Aggregate + ?Sized,
    {
        let selected = select_default_link(aggregate, &state.bound, state.default_link, departing);
        if selected == state.default_link {
            return;
        }

        match selected {
            Some(link) => info!(
                "{}: bond_l2da default link set to {}",
                self.name,
                aggregate.display_name(Some(link))
            ),
            None => warn!(
                "{}: bond_l2da no transmit-capable link, default link cleared",
                self.name
            ),
        }
        state.default_link = selected;
    }

    // ============ Default link ============

    /// Makes `link` the default.
    ///
    /// A link that is not bound fails with [`L2daError::LinkNotFound`]. A
    /// bound link that cannot transmit is refused with
    /// [`L2daError::InvalidArgument`]; the selector runs instead so the
    /// default is still valid afterwards.
    pub fn set_default_link<A>(&self, aggregate: &A, link: LinkId) -> Result<()>
    where
        A: Aggregate + ?Sized,
    {
        let mut state = self.state.write();
        state.require_bound(aggregate, link)?;
        if aggregate.can_transmit(link) {
            state.default_link = Some(link);
            info!(
                "{}: bond_l2da default link set to {}",
                self.name,
                aggregate.display_name(Some(link))
            );
            Ok(())
        } else {
            self.reselect_default(&mut state, aggregate, None);
            Err(L2daError::InvalidArgument(format!(
                "link {} cannot transmit",
                aggregate.display_name(Some(link))
            )))
        }
    }

    /// [`set_default_link`](Self::set_default_link) by interface name.
    pub fn set_default_link_by_name<A>(&self, aggregate: &A, name: &str) -> Result<()>
    where
        A: Aggregate + ?Sized,
    {
        let link = aggregate
            .link_by_name(name)
            .ok_or_else(|| L2daError::LinkNotFound(name.to_string()))?;
        self.set_default_link(aggregate, link)
    }

    pub fn is_bound(&self, link: LinkId) -> bool {
        self.state.read().bound.contains(&link)
    }

    pub fn default_link(&self) -> Option<LinkId> {
        self.state.read().default_link
    }

    pub fn default_link_name<A>(&self, aggregate: &A) -> Option<String>
    where
        A: Aggregate + ?Sized,
    {
        let state = self.state.read();
        state
            .default_link
            .and_then(|l| aggregate.link_name(l))
            .map(str::to_string)
    }

    /// Copies the default link's name into `buf` as a NUL-terminated string.
    ///
    /// `buf` must hold at least [`IFNAMSIZ`] bytes. Writes an empty string
    /// when no default is set. Returns the name length without terminator.
    pub fn copy_default_link_name<A>(&self, aggregate: &A, buf: &mut [u8]) -> Result<usize>
    where
        A: Aggregate + ?Sized,
    {
        if buf.len() < IFNAMSIZ {
            return Err(L2daError::InvalidArgument(format!(
                "name buffer of {} bytes, need {}",
                buf.len(),
                IFNAMSIZ
            )));
        }

        buf[0] = 0;
        let state = self.state.read();
        let Some(name) = state.default_link.and_then(|l| aggregate.link_name(l)) else {
            return Ok(0);
        };

        let len = name.len().min(IFNAMSIZ - 1);
        buf[..len].copy_from_slice(&name.as_bytes()[..len]);
        buf[len] = 0;
        Ok(len)
    }

    // ============ Mappings ============

    /// Maps `da` to `link`, returning the previous link if the entry existed.
    ///
    /// `link` must be bound; the check and the insert happen under one write
    /// lock so a concurrent unbind cannot leave a mapping behind.
    pub fn set_da_link<A>(&self, aggregate: &A, da: MacAddress, link: LinkId) -> Result<Option<LinkId>>
    where
        A: Aggregate + ?Sized,
    {
        let previous = {
            let mut state = self.state.write();
            state.require_bound(aggregate, link)?;
            state.table.upsert(da, link)
        }
        .inspect_err(|_| {
            error!(
                "{}: bond_l2da pair node cannot be allocated for [{}:{}]",
                self.name,
                da,
                aggregate.display_name(Some(link))
            )
        })?;

        info!(
            "{}: bond_l2da pair {} [{}:{}]",
            self.name,
            if previous.is_some() { "changed" } else { "added" },
            da,
            aggregate.display_name(Some(link))
        );
        Ok(previous)
    }

    /// Deletes the mapping for `da`.
    pub fn del_da(&self, da: MacAddress) -> Result<()> {
        let removed = {
            let mut state = self.state.write();
            let removed = state.table.remove(da);
            if removed.is_ok() {
                self.notifier.mapping_removed(da);
            }
            removed
        };

        match removed {
            Ok(link) => {
                info!("{}: bond_l2da pair deleted [{}:{}]", self.name, da, link);
                Ok(())
            }
            Err(e) => {
                error!("{}: bond_l2da pair node cannot be found for {}", self.name, da);
                Err(e)
            }
        }
    }

    /// Removes every mapping. Returns how many were removed.
    pub fn purge(&self) -> usize {
        let mut state = self.state.write();
        let notifier = &self.notifier;
        let purged = state.table.remove_all(None, |da| notifier.mapping_removed(da));
        if purged > 0 {
            info!("{}: bond_l2da purged {} pair(s)", self.name, purged);
        }
        purged
    }

    pub fn lookup(&self, da: MacAddress) -> Option<LinkId> {
        self.state.read().table.lookup(da)
    }

    /// Visits every mapping under the read lock until `visit` breaks.
    pub fn for_each_mapping<F>(&self, visit: F) -> ControlFlow<()>
    where
        F: FnMut(&SteeringEntry) -> ControlFlow<()>,
    {
        self.state.read().table.for_each(visit)
    }

    /// Copies all mappings out, in table order.
    pub fn mappings(&self) -> Vec<SteeringEntry> {
        let state = self.state.read();
        let mut out = Vec::with_capacity(state.table.len());
        let _ = state.table.for_each(|e| {
            out.push(*e);
            ControlFlow::Continue(())
        });
        out
    }

    pub fn mapping_count(&self) -> usize {
        self.state.read().table.len()
    }

    // ============ Options ============

    pub fn set_opts(&self, opts: L2daOptions) {
        self.opts.store(opts);
    }

    pub fn opts(&self) -> L2daOptions {
        self.opts.load()
    }

    pub fn stats(&self) -> L2daStatsSnapshot {
        self.stats.snapshot()
    }
}
