//! Default link selection.
//!
//! Pure over the aggregate view and the set of links the context has bound,
//! so that it can be exercised without a context; the caller applies the
//! result under the steering write lock.

use rustc_hash::FxHashSet;

use crate::aggregate::{Aggregate, LinkId};

/// Picks the default link among the `bound` links.
///
/// Keeps `current` while it is bound and can transmit. Otherwise returns the
/// first bound member in the aggregate's canonical order that can transmit
/// and is neither `current` nor `departing`, or `None` when no member
/// qualifies.
///
/// `departing` covers a link that is being unbound but may still be listed
/// by the aggregate.
pub fn select_default_link<A>(
    aggregate: &A,
    bound: &FxHashSet<LinkId>,
    current: Option<LinkId>,
    departing: Option<LinkId>,
) -> Option<LinkId>
where
    A: Aggregate + ?Sized,
{
    let eligible = |l: LinkId| Some(l) != departing && bound.contains(&l);

    if let Some(link) = current {
        if eligible(link) && aggregate.can_transmit(link) {
            return Some(link);
        }
    }

    aggregate
        .members()
        .iter()
        .copied()
        .filter(|&l| Some(l) != current && eligible(l))
        .find(|&l| aggregate.can_transmit(l))
}
