//! Change notifications towards external caches (flow offload, FDB mirrors).

use l2da_types::MacAddress;

use crate::aggregate::LinkId;

/// Observer of steering changes, injected at context construction.
///
/// Called with the steering write lock held. Implementations may take their
/// own locks but must not call back into the notifying context.
pub trait L2daNotifier: Send + Sync {
    /// A mapping for `da` was destroyed.
    fn mapping_removed(&self, da: MacAddress);

    /// The default link moved away from `previous` after a link event.
    fn default_link_departed(&self, previous: LinkId);
}

/// Notifier that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl L2daNotifier for NoopNotifier {
    fn mapping_removed(&self, _da: MacAddress) {}

    fn default_link_departed(&self, _previous: LinkId) {}
}
