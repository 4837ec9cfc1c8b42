use std::cmp::Ordering;

use crate::math::Point2;
use crate::operations::matching::AlignedRoom;

/// Wall line dividing the overlap of two boxes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum SplitLine {
    Vertical(f64),
    Horizontal(f64),
}

/// The wall through the middle of the overlap of `a` and `b`, perpendicular
/// to the axis along which their centres are further apart.
///
/// `None` when the boxes do not overlap, one is nested in the other, or the
/// centres coincide.
pub(super) fn split_line(a: &AlignedRoom<'_>, b: &AlignedRoom<'_>, eps: f64) -> Option<SplitLine> {
    let (min, max) = a.room.overlap(b.room)?;
    if a.room.contains_box(b.room, eps) || b.room.contains_box(a.room, eps) {
        return None;
    }
    let sep = b.room.center() - a.room.center();
    if sep.x.abs() >= sep.y.abs() && sep.x.abs() > eps {
        Some(SplitLine::Vertical(0.5 * (min.x + max.x)))
    } else if sep.y.abs() > eps {
        Some(SplitLine::Horizontal(0.5 * (min.y + max.y)))
    } else {
        None
    }
}

/// Whether `a` beats `b` at point `at` inside their common overlap.
fn wins(a: &AlignedRoom<'_>, b: &AlignedRoom<'_>, at: &Point2, eps: f64) -> bool {
    let a_in_b = b.room.contains_box(a.room, eps);
    let b_in_a = a.room.contains_box(b.room, eps);
    if a_in_b != b_in_a {
        return a_in_b;
    }
    let (ca, cb) = (a.room.center(), b.room.center());
    match split_line(a, b, eps) {
        Some(SplitLine::Vertical(x)) => (at.x < x) == (ca.x < cb.x),
        Some(SplitLine::Horizontal(y)) => (at.y < y) == (ca.y < cb.y),
        None => match a.room.area().total_cmp(&b.room.area()) {
            Ordering::Less => true,
            Ordering::Greater => false,
            Ordering::Equal => a.node < b.node,
        },
    }
}

/// The claimant that owns a cell covered by all of `candidates`.
///
/// Every pair plays one contest at the cell centre; most wins takes the cell
/// and ties go to the lower node. `candidates` indexes `rooms`, which is in
/// ascending node order.
pub(super) fn owner(
    rooms: &[AlignedRoom<'_>],
    candidates: &[usize],
    at: &Point2,
    eps: f64,
) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for &a in candidates {
        let score = candidates
            .iter()
            .filter(|&&b| b != a && wins(&rooms[a], &rooms[b], at, eps))
            .count();
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((a, score));
        }
    }
    best.map(|(a, _)| a)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::{RoomBox, RoomType};

    fn claim(node: usize, room: &RoomBox) -> AlignedRoom<'_> {
        AlignedRoom {
            node,
            detected: node,
            room,
        }
    }

    fn room(x0: f64, y0: f64, x1: f64, y1: f64) -> RoomBox {
        RoomBox::new(x0, y0, x1, y1, RoomType::SecondRoom).unwrap()
    }

    #[test]
    fn side_by_side_overlap_splits_vertically() {
        let (a, b) = (room(0.0, 0.0, 6.0, 5.0), room(4.0, 0.0, 10.0, 5.0));
        let rooms = [claim(0, &a), claim(1, &b)];
        assert_eq!(
            split_line(&rooms[0], &rooms[1], 1e-9),
            Some(SplitLine::Vertical(5.0))
        );
        assert_eq!(owner(&rooms, &[0, 1], &Point2::new(4.5, 2.0), 1e-9), Some(0));
        assert_eq!(owner(&rooms, &[0, 1], &Point2::new(5.5, 2.0), 1e-9), Some(1));
    }

    #[test]
    fn nested_box_wins_regardless_of_order() {
        let (outer, inner) = (room(0.0, 0.0, 10.0, 10.0), room(2.0, 2.0, 4.0, 4.0));
        let at = Point2::new(3.0, 3.0);
        let rooms = [claim(0, &outer), claim(1, &inner)];
        assert_eq!(owner(&rooms, &[0, 1], &at, 1e-9), Some(1));
        let rooms = [claim(0, &inner), claim(1, &outer)];
        assert_eq!(owner(&rooms, &[0, 1], &at, 1e-9), Some(0));
    }

    #[test]
    fn concentric_cross_prefers_smaller_area() {
        let (wide, tall) = (room(0.0, 4.0, 10.0, 6.0), room(4.0, 0.0, 6.0, 12.0));
        let rooms = [claim(0, &wide), claim(1, &tall)];
        assert_eq!(split_line(&rooms[0], &rooms[1], 1e-9), Some(SplitLine::Horizontal(5.0)));

        let (a, b) = (room(0.0, 4.0, 10.0, 6.0), room(4.0, 0.0, 6.0, 10.0));
        let rooms = [claim(0, &a), claim(1, &b)];
        assert_eq!(split_line(&rooms[0], &rooms[1], 1e-9), None);
        // Equal areas: lower node.
        assert_eq!(owner(&rooms, &[0, 1], &Point2::new(5.0, 5.0), 1e-9), Some(0));
    }

    #[test]
    fn three_way_overlap_goes_to_most_wins() {
        let a = room(0.0, 0.0, 6.0, 6.0);
        let b = room(4.0, 0.0, 10.0, 6.0);
        let c = room(4.5, 4.5, 5.5, 5.5);
        let rooms = [claim(0, &a), claim(1, &b), claim(2, &c)];
        assert_eq!(owner(&rooms, &[0, 1, 2], &Point2::new(5.0, 5.0), 1e-9), Some(2));
    }
}
