//! Transmit path: picks the member link for an outbound frame.

use l2da_types::MacAddress;
use log::debug;

use crate::aggregate::{Aggregate, LinkId, Transmitter};
use crate::context::L2daContext;
use crate::frame::Frame;
use crate::stats::L2daStats;

/// Outcome of transmit resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxTarget {
    /// The destination's mapped link.
    Mapped(LinkId),
    /// The default link, used when no usable mapping exists.
    Default(LinkId),
    /// Duplicate on every member (multicast with `DUP_MC_TX`).
    AllLinks,
    /// No capable link; the frame is discarded.
    Drop,
}

impl TxTarget {
    /// The single egress link, if there is one.
    pub fn link(&self) -> Option<LinkId> {
        match *self {
            TxTarget::Mapped(l) | TxTarget::Default(l) => Some(l),
            TxTarget::AllLinks | TxTarget::Drop => None,
        }
    }
}

impl L2daContext {
    /// Resolves where a frame for `da` goes.
    ///
    /// The decision is taken under the read lock and may be stale by the time
    /// the caller sends; it was valid when made.
    pub fn resolve_tx<A>(&self, aggregate: &A, da: MacAddress) -> TxTarget
    where
        A: Aggregate + ?Sized,
    {
        if self.opts().dup_mc_tx() && da.is_multicast() {
            return TxTarget::AllLinks;
        }

        let state = self.state.read();
        if let Some(link) = state.table.lookup(da) {
            if aggregate.can_transmit(link) {
                return TxTarget::Mapped(link);
            }
        }

        match state.default_link {
            Some(link) if aggregate.can_transmit(link) => TxTarget::Default(link),
            _ => TxTarget::Drop,
        }
    }

    /// Egress link for `da`; `None` when the frame would be duplicated on all
    /// members or dropped.
    pub fn tx_link_for<A>(&self, aggregate: &A, da: MacAddress) -> Option<LinkId>
    where
        A: Aggregate + ?Sized,
    {
        self.resolve_tx(aggregate, da).link()
    }

    /// Resolves and sends `frame`. Dropped frames are consumed.
    pub fn xmit<A, F, T>(&self, aggregate: &A, tx: &T, frame: F) -> TxTarget
    where
        A: Aggregate + ?Sized,
        F: Frame,
        T: Transmitter<F> + ?Sized,
    {
        let da = frame.destination();
        let target = self.resolve_tx(aggregate, da);

        match target {
            TxTarget::Mapped(link) => {
                L2daStats::bump(&self.stats.tx_mapped);
                tx.queue_xmit(link, frame);
            }
            TxTarget::Default(link) => {
                L2daStats::bump(&self.stats.tx_default);
                tx.queue_xmit(link, frame);
            }
            TxTarget::AllLinks => {
                L2daStats::bump(&self.stats.tx_all);
                tx.xmit_all(frame);
            }
            TxTarget::Drop => {
                L2daStats::bump(&self.stats.tx_dropped);
                debug!("{}: bond_l2da no link for {}, frame dropped", self.name(), da);
            }
        }
        target
    }
}
