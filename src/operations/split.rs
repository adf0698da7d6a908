//! Splitting a path into the two half-planes of an arbitrary line.

use crate::geometry::Segment;
use crate::math::{rotate_point, Point2, SNAP_LEN};
use crate::topology::Path;

/// Splits `path` along the unbounded line through `cut`, returning the
/// two halves and the crossing points sorted along the cut.
///
/// The path is rotated so the cut lies horizontal, partitioned about
/// `y = 0` (segments crossing the line are divided at it), and both
/// halves rotated back. The first half holds everything on the left of
/// the cut direction, the second everything on the right.
#[must_use]
pub fn split_along_line(path: &Path, cut: &Segment) -> (Path, Path, Vec<Point2>) {
    let angle = cut.angle();
    let pivot = cut.start();

    let mut frame = path.clone();
    frame.rotate(&pivot, -angle);
    frame.translate(0.0, -pivot.y);

    let mut left = Path::new();
    let mut right = Path::new();
    let mut crossings: Vec<Point2> = Vec::new();

    for (_, seg) in frame.iter() {
        let s0_left = seg.start().y >= 0.0;
        let s1_left = seg.end().y >= 0.0;

        if s0_left && s1_left {
            left.push(*seg);
        } else if !s0_left && !s1_left {
            right.push(*seg);
        } else {
            // The segment crosses the line; divide it at the crossing.
            let t = seg.t_for_y(0.0);
            let pt = seg.point_at(t);
            crossings.push(pt);
            if s0_left {
                left.push_points(seg.start(), pt);
                right.push_points(pt, seg.end());
            } else {
                right.push_points(seg.start(), pt);
                left.push_points(pt, seg.end());
            }
        }
    }

    // Undo the rotation for both halves and the crossing points.
    left.translate(0.0, pivot.y);
    right.translate(0.0, pivot.y);
    left.rotate(&pivot, angle);
    right.rotate(&pivot, angle);

    crossings.sort_by(|a, b| a.x.total_cmp(&b.x));
    let crossings = crossings
        .into_iter()
        .map(|pt| rotate_point(&Point2::new(pt.x, pt.y + pivot.y), &pivot, angle))
        .collect();

    (left, right, crossings)
}

/// As [`split_along_line`], but bridges the split ends pairwise (first
/// crossing to second, third to fourth, and so on) and re-stitches both
/// halves into closed paths.
#[must_use]
pub fn split_along_line_rejoin(path: &Path, cut: &Segment) -> (Path, Path) {
    let (mut left, mut right, crossings) = split_along_line(path, cut);

    let mut k = 1;
    while k < crossings.len() {
        left.push_points(crossings[k - 1], crossings[k]);
        right.push_points(crossings[k - 1], crossings[k]);
        k += 2;
    }

    left.make_path_with(SNAP_LEN, false);
    right.make_path_with(SNAP_LEN, false);
    (left, right)
}
