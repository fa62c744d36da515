//! Collapse overlapping operational events into combined blocks.
//!
//! Operational events whose intervals intersect (touching is fine) become a
//! single event starting at the earliest start and lasting the longer of the
//! merge floor and the longest constituent. Merging repeats until stable, so
//! chains merge transitively. Anchors are never merged or moved, and a merged
//! block may run into one: keeping blocks off anchors is the resolver's job.

use chrono::Duration;
use tracing::debug;

use crate::event::{sort_chronologically, Category, Event, MergedPart};

const TITLE_SEPARATOR: &str = " & ";

/// Merge overlapping operational events. The result is sorted
/// chronologically; running it again on its own output changes nothing.
pub fn merge_overlapping(events: &[Event], floor_minutes: i64) -> Vec<Event> {
    let mut ops: Vec<Event> = Vec::new();
    let mut rest: Vec<Event> = Vec::new();
    for e in events {
        if e.is_operational() {
            ops.push(e.clone());
        } else {
            rest.push(e.clone());
        }
    }

    loop {
        sort_chronologically(&mut ops);
        let clusters = cluster(&ops);
        if clusters.iter().all(|c| c.len() < 2) {
            break;
        }
        let mut next = Vec::with_capacity(ops.len());
        for group in clusters {
            if group.len() == 1 {
                next.push(ops[group[0]].clone());
            } else {
                let members: Vec<&Event> = group.iter().map(|&i| &ops[i]).collect();
                next.push(combine(&members, floor_minutes));
            }
        }
        ops = next;
    }

    rest.extend(ops);
    sort_chronologically(&mut rest);
    rest
}

/// Indices of transitively overlapping runs in a start-sorted slice.
fn cluster(ops: &[Event]) -> Vec<Vec<usize>> {
    let mut clusters: Vec<Vec<usize>> = Vec::new();
    let mut cluster_end = None;
    for (i, op) in ops.iter().enumerate() {
        let extends = matches!(cluster_end, Some(end) if op.start < end);
        if let (true, Some(current)) = (extends, clusters.last_mut()) {
            current.push(i);
            cluster_end = cluster_end.map(|end| end.max(op.end));
        } else {
            clusters.push(vec![i]);
            cluster_end = Some(op.end);
        }
    }
    clusters
}

fn combine(members: &[&Event], floor_minutes: i64) -> Event {
    let start = members.iter().map(|e| e.start).min().unwrap_or(members[0].start);
    let longest = members
        .iter()
        .map(|e| e.duration_minutes())
        .max()
        .unwrap_or(0);
    let end = start + Duration::minutes(floor_minutes.max(longest));

    let mut parts: Vec<MergedPart> = Vec::new();
    for m in members {
        if m.merged_from.is_empty() {
            parts.push(MergedPart {
                title: m.title.clone(),
                category: m.category.clone(),
                parent_title: m.parent_title.clone(),
                is_floor_transition: m.is_floor_transition,
            });
        } else {
            parts.extend(m.merged_from.iter().cloned());
        }
    }
    parts.sort_by(|a, b| part_rank(a).cmp(&part_rank(b)).then_with(|| a.title.cmp(&b.title)));
    parts.dedup();

    let mut titles: Vec<&str> = Vec::new();
    for part in &parts {
        if !titles.contains(&part.title.as_str()) {
            titles.push(&part.title);
        }
    }
    let title = titles.join(TITLE_SEPARATOR);
    let category = parts
        .first()
        .map(|p| p.category.clone())
        .unwrap_or(Category::Setup);
    let last = members[members.len() - 1];

    debug!(
        count = members.len(),
        title = %title,
        start = %start,
        end = %end,
        "merged operational events"
    );

    Event {
        title,
        start,
        end,
        category,
        venue: members[0].venue.clone(),
        is_derived: true,
        parent_title: last.parent_title.clone(),
        merged_from: parts,
        is_cross_venue: false,
        is_floor_transition: members.iter().all(|e| e.is_floor_transition),
    }
}

/// Semantic order of constituents: strikes, resets, resource transitions,
/// set-ups, presets, then anything else.
fn part_rank(part: &MergedPart) -> u8 {
    if part.is_floor_transition {
        return 2;
    }
    match part.category {
        Category::Strike => 0,
        Category::Reset => 1,
        Category::Transition => 2,
        Category::Setup => 3,
        Category::Preset => 4,
        _ => 5,
    }
}
