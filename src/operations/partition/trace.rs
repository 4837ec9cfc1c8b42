use std::collections::BTreeMap;

use crate::math::{cross, Point2};

/// Chains directed outline edges into closed loops.
///
/// Every edge must keep the region on its left, so outer outlines come out
/// counter-clockwise and holes clockwise. Where the region touches itself at
/// a vertex the trace takes the sharpest right turn, so each loop follows a
/// single exterior component and stays simple.
pub(super) fn trace_loops<K: Ord + Copy>(edges: &[(K, K)], point: impl Fn(K) -> Point2) -> Vec<Vec<K>> {
    let mut outgoing: BTreeMap<K, Vec<K>> = BTreeMap::new();
    for &(from, to) in edges {
        outgoing.entry(from).or_default().push(to);
    }

    let mut loops = Vec::new();
    loop {
        let Some((start, first)) = outgoing
            .iter()
            .find_map(|(&from, targets)| targets.first().map(|&to| (from, to)))
        else {
            break;
        };
        take(&mut outgoing, start, first);

        let mut ring = vec![start];
        let (mut prev, mut cur) = (start, first);
        loop {
            let mut candidates = outgoing.get(&cur).cloned().unwrap_or_default();
            if cur == start {
                candidates.push(first);
            }
            let (p, c) = (point(prev), point(cur));
            let Some(next) = candidates
                .into_iter()
                .min_by(|&a, &b| turn(&p, &c, &point(a)).total_cmp(&turn(&p, &c, &point(b))))
            else {
                break;
            };
            if cur == start && next == first {
                break;
            }
            take(&mut outgoing, cur, next);
            ring.push(cur);
            (prev, cur) = (cur, next);
        }
        loops.push(ring);
    }
    loops
}

fn take<K: Ord>(outgoing: &mut BTreeMap<K, Vec<K>>, from: K, to: K) {
    if let Some(targets) = outgoing.get_mut(&from) {
        if let Some(pos) = targets.iter().position(|t| *t == to) {
            targets.remove(pos);
        }
    }
}

/// Signed turning angle at `cur`; negative turns right.
fn turn(prev: &Point2, cur: &Point2, next: &Point2) -> f64 {
    let (d_in, d_out) = (cur - prev, next - cur);
    cross(&d_in, &d_out).atan2(d_in.dot(&d_out))
}
