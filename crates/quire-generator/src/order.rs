//! Deterministic processing order.
//!
//! Filesystems return directory entries in no particular order. Items are
//! sorted before rendering so build logs, and anything else observed per
//! item, come out the same on every run. Output bytes never depend on order.

use std::cmp::Ordering;

use quire_core::{ContentItem, OrderPolicy};

/// Compare two items under `policy`.
///
/// Every policy falls back to the normalized path, which is unique per item,
/// so the result is a strict total order.
#[must_use]
pub fn compare(policy: OrderPolicy, a: &ContentItem, b: &ContentItem) -> Ordering {
    let primary = match policy {
        OrderPolicy::DepthThenPath => a.depth().cmp(&b.depth()),
        OrderPolicy::Path => Ordering::Equal,
        OrderPolicy::DepthThenName => a
            .depth()
            .cmp(&b.depth())
            .then_with(|| a.base_name().cmp(b.base_name())),
    };
    primary.then_with(|| a.normalized_path().cmp(&b.normalized_path()))
}

/// Sort items in place under `policy`.
pub fn sort_items(items: &mut [ContentItem], policy: OrderPolicy) {
    items.sort_by(|a, b| compare(policy, a, b));
}
