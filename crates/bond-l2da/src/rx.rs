//! Receive path: admission (dedup) and cross-link forwarding.
//!
//! Admission decides whether the local stack may see a frame. Forwarding runs
//! only for admitted frames and re-sends clones on other members; a rejected
//! frame is dropped no matter what the forwarding option says.

use log::{debug, error};

use crate::aggregate::{Aggregate, LinkId, Transmitter};
use crate::context::L2daContext;
use crate::frame::Frame;
use crate::options::L2daOptions;
use crate::stats::L2daStats;

/// What the caller does with a received frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxVerdict {
    /// Hand the frame to the local stack. `forwarded` clones went out on
    /// other members.
    Deliver { forwarded: usize },
    /// The frame was forwarded to its mapped link and must not be delivered
    /// locally.
    Consumed(LinkId),
    /// Refused by dedup.
    Reject,
}

impl RxVerdict {
    pub fn deliver_locally(&self) -> bool {
        matches!(self, RxVerdict::Deliver { .. })
    }
}

impl L2daContext {
    /// Dedup admission of a frame received on `ingress`.
    ///
    /// The source mapping takes precedence over the default link; with
    /// neither present everything is admitted.
    pub fn admit_rx<F>(&self, ingress: LinkId, frame: &F) -> bool
    where
        F: Frame,
    {
        self.admit_with(self.opts(), ingress, frame)
    }

    fn admit_with<F>(&self, opts: L2daOptions, ingress: LinkId, frame: &F) -> bool
    where
        F: Frame,
    {
        if !opts.dedup_rx() || frame.is_control_protocol() {
            return true;
        }

        let state = self.state.read();
        match state.table.lookup(frame.source()) {
            Some(mapped) => mapped == ingress,
            None => state.default_link.map_or(true, |default| default == ingress),
        }
    }

    /// Runs admission then forwarding for a frame received on `ingress`.
    ///
    /// Multicast frames are flooded to every other capable member and still
    /// delivered locally. A unicast frame mapped to another capable member
    /// is forwarded there only. Loopback frames are never forwarded.
    pub fn handle_rx_frame<A, F, T>(&self, aggregate: &A, tx: &T, ingress: LinkId, frame: &F) -> RxVerdict
    where
        A: Aggregate + ?Sized,
        F: Frame,
        T: Transmitter<F> + ?Sized,
    {
        let opts = self.opts();
        if !self.admit_with(opts, ingress, frame) {
            L2daStats::bump(&self.stats.rx_rejected);
            return RxVerdict::Reject;
        }

        if !opts.forward_rx() || frame.is_loopback() {
            return RxVerdict::Deliver { forwarded: 0 };
        }

        let da = frame.destination();
        if da.is_multicast() {
            let forwarded = aggregate
                .members()
                .iter()
                .copied()
                .filter(|&link| link != ingress && aggregate.can_transmit(link))
                .filter(|&link| self.clone_and_xmit(aggregate, tx, link, frame))
                .count();
            return RxVerdict::Deliver { forwarded };
        }

        let target = self
            .state
            .read()
            .table
            .lookup(da)
            .filter(|&link| link != ingress && aggregate.can_transmit(link));

        match target {
            Some(link) if self.clone_and_xmit(aggregate, tx, link, frame) => {
                L2daStats::bump(&self.stats.rx_consumed);
                RxVerdict::Consumed(link)
            }
            _ => RxVerdict::Deliver { forwarded: 0 },
        }
    }

    /// Queues a clone of `frame` on `link`. A failed clone is logged at a
    /// limited rate and reported as `false`.
    fn clone_and_xmit<A, F, T>(&self, aggregate: &A, tx: &T, link: LinkId, frame: &F) -> bool
    where
        A: Aggregate + ?Sized,
        F: Frame,
        T: Transmitter<F> + ?Sized,
    {
        let Some(mut copy) = frame.try_clone() else {
            L2daStats::bump(&self.stats.clone_failures);
            if let Some(suppressed) = self.clone_fail_log.check() {
                error!(
                    "{}: bond_l2da failed to clone frame for {} ({} similar messages suppressed)",
                    self.name(),
                    aggregate.display_name(Some(link)),
                    suppressed
                );
            }
            return false;
        };

        copy.prepare_forward();
        debug!(
            "{}: bond_l2da forwarding {} -> {} on {}",
            self.name(),
            frame.source(),
            frame.destination(),
            aggregate.display_name(Some(link))
        );
        tx.queue_xmit(link, copy);
        L2daStats::bump(&self.stats.rx_forwarded);
        true
    }
}
