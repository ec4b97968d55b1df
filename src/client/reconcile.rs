use std::collections::HashSet;

use crate::models::Idea;

/// Combine the server's list with locally pending ideas.
///
/// Pending ideas come first in their own order, followed by the confirmed
/// list in server order. Each id appears once; when an id is in both lists
/// the confirmed copy is kept.
pub fn merge(confirmed: &[Idea], pending: &[Idea]) -> Vec<Idea> {
    let confirmed_ids: HashSet<&str> = confirmed.iter().map(|i| i.id.as_str()).collect();
    let mut seen: HashSet<&str> = HashSet::with_capacity(confirmed.len() + pending.len());
    let mut merged = Vec::with_capacity(confirmed.len() + pending.len());

    for idea in pending {
        if !confirmed_ids.contains(idea.id.as_str()) && seen.insert(idea.id.as_str()) {
            merged.push(idea.clone());
        }
    }

    for idea in confirmed {
        if seen.insert(idea.id.as_str()) {
            merged.push(idea.clone());
        }
    }

    merged
}
