//! New-post detection against the last-seen marker.
//!
//! Everything here is pure: the caller loads the record, fetches posts, and
//! decides what to do with the outcome.

use std::collections::BTreeMap;

use crate::state::StateRecord;
use crate::twitter::{Post, PostId};

/// Result of comparing a fetched batch with the stored record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffOutcome {
    /// Posts to notify about, oldest first.
    pub deliver: Vec<Post>,
    /// Record to persist once every delivery succeeded.
    pub next: StateRecord,
}

impl DiffOutcome {
    /// Whether persisting `next` would change the stored marker.
    #[must_use]
    pub fn advances(&self, previous: &StateRecord) -> bool {
        self.next.last_seen_id != previous.last_seen_id
    }
}

/// Compute which fetched posts are new.
///
/// Only original posts take part. With no marker yet, nothing is delivered and
/// the marker is set to the newest original post ("quiet initialization").
/// With a marker, originals with a strictly greater id are delivered in id
/// order. The next marker is the greater of the old marker and the newest
/// original seen, so it never moves backwards.
#[must_use]
pub fn diff(state: &StateRecord, posts: &[Post]) -> DiffOutcome {
    // Keyed by id: sorts oldest to newest and drops duplicates.
    let originals: BTreeMap<PostId, &Post> = posts
        .iter()
        .filter(|p| p.is_original())
        .map(|p| (p.id, p))
        .collect();

    let newest = originals.keys().next_back().copied();
    let next_marker = match (state.last_seen_id, newest) {
        (Some(old), Some(new)) => Some(old.max(new)),
        (old, new) => old.or(new),
    };

    let deliver = match state.last_seen_id {
        None => Vec::new(),
        Some(marker) => originals
            .range((std::ops::Bound::Excluded(marker), std::ops::Bound::Unbounded))
            .map(|(_, p)| (*p).clone())
            .collect(),
    };

    DiffOutcome {
        deliver,
        next: StateRecord {
            last_seen_id: next_marker,
            updated_at: state.updated_at,
        },
    }
}
