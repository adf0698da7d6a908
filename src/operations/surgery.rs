//! Path surgery: opening gaps between boundary points and cutting
//! slots into a closed outline.

use crate::error::{OperationError, Result};
use crate::geometry::Segment;
use crate::math::{Direction, Point2, Vector2};
use crate::operations::intersect::dir_intersect;
use crate::topology::{Path, SegmentId};

/// Wall style of a cut slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotStyle {
    /// Slot walls are vertical; the bottom is horizontal.
    Vertical,
    /// Slot follows the local surface gradient; the bottom stays
    /// parallel to the intersected segment.
    Graded,
}

/// Opens a gap in `path` between point `p0` on segment `l0` and point
/// `p1` on segment `l1`.
///
/// Whole segments strictly between `l0` and `l1` (following the path
/// circularly) are deleted; `l0` is truncated to end at `p0` and `l1`
/// to start at `p1`. When the gap lies inside a single segment
/// (`l0 == l1`), either a new trailing segment from `p1` to the original
/// far endpoint is appended, or, in `no_new_lines` mode, the following
/// segment is re-based to start at `p1` directly (for callers that will
/// immediately fill the gap with other geometry).
///
/// # Errors
///
/// Returns a stale-handle error if `l0` or `l1` no longer refer to live
/// segments.
pub fn make_gap(
    path: &mut Path,
    l0: SegmentId,
    p0: Point2,
    l1: SegmentId,
    p1: Point2,
    no_new_lines: bool,
) -> Result<()> {
    // Delete any whole segments bridging the gap.
    if l0 != l1 {
        let mut ln = path.next_circular(l0)?;
        while ln != l1 {
            let next = path.next_circular(ln)?;
            path.remove(ln)?;
            ln = next;
        }
    }

    if l0 == l1 {
        // The gap lies inside one segment.
        let far = path.get(l0)?.end();
        let near = path.get(l0)?.start();
        path.get_mut(l0)?.set_points(near, p0);

        if no_new_lines {
            let follower = path.next_circular(l0)?;
            let end = path.get(follower)?.end();
            path.get_mut(follower)?.set_points(p1, end);
        } else {
            path.push(Segment::new(p1, far));
        }
    } else {
        // Truncate both boundary segments to their respective points.
        let near = path.get(l0)?.start();
        path.get_mut(l0)?.set_points(near, p0);
        let far = path.get(l1)?.end();
        path.get_mut(l1)?.set_points(p1, far);
    }

    Ok(())
}

/// Cuts a slot of the given `width` and `depth` into the top (`Up`) or
/// bottom (`Down`) of a closed path at horizontal position `xpos`,
/// returning the two outline corner points of the opening.
///
/// # Errors
///
/// Returns [`OperationError::IntersectionNotFound`] without mutating the
/// outline geometry if any of the slot's edge intersections cannot be
/// located.
pub fn cut_slot(
    path: &mut Path,
    dir: Direction,
    xpos: f64,
    width: f64,
    depth: f64,
    style: SlotStyle,
) -> Result<(Point2, Point2)> {
    path.regularise_keep_open();

    // Reference centre point and centre segment.
    let centre = dir_intersect(path, dir, xpos).ok_or_else(|| {
        OperationError::IntersectionNotFound(format!("no {dir:?} silhouette at x={xpos}"))
    })?;
    let centre_seg = *path.get(centre.seg)?;

    // A width-long reference segment along the slot bottom, centred on
    // the centre point.
    let mut slot_ref = Segment::from_vector(centre.point, centre_seg.vector());
    if style == SlotStyle::Vertical {
        slot_ref = Segment::from_vector(
            slot_ref.start(),
            Vector2::new(slot_ref.vector().x, 0.0),
        );
    }
    slot_ref.set_length(width / 2.0);
    slot_ref.set_points(slot_ref.point_at(-1.0), slot_ref.point_at(1.0));

    // Corner intersects; both must exist before anything is cut.
    let hit0 = dir_intersect(path, dir, slot_ref.start().x).ok_or_else(|| {
        OperationError::IntersectionNotFound("slot edge misses the outline".to_owned())
    })?;
    let hit1 = dir_intersect(path, dir, slot_ref.end().x).ok_or_else(|| {
        OperationError::IntersectionNotFound("slot edge misses the outline".to_owned())
    })?;

    make_gap(path, hit0.seg, hit0.point, hit1.seg, hit1.point, false)?;

    // Three sides of the slot: two walls and the bottom.
    let mut bottom = slot_ref;
    bottom.offset_sideways(-depth);
    path.push_points(hit0.point, bottom.start());
    path.push_points(bottom.end(), hit1.point);
    path.push(bottom);
    path.regularise_keep_open();

    Ok((hit0.point, hit1.point))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::math::dist;

    fn square(side: f64) -> Path {
        let mut p = Path::new();
        p.push_points(Point2::new(0.0, 0.0), Point2::new(0.0, side));
        p.push_points(Point2::new(0.0, side), Point2::new(side, side));
        p.push_points(Point2::new(side, side), Point2::new(side, 0.0));
        p.push_points(Point2::new(side, 0.0), Point2::new(0.0, 0.0));
        p
    }

    #[test]
    fn gap_across_two_segments_deletes_between() {
        let mut p = square(10.0);
        let ids: Vec<SegmentId> = p.ids().collect();
        // Gap from the top edge to the bottom edge, deleting the right
        // edge between them.
        make_gap(
            &mut p,
            ids[1],
            Point2::new(6.0, 10.0),
            ids[3],
            Point2::new(4.0, 0.0),
            false,
        )
        .unwrap();

        assert_eq!(p.len(), 3);
        assert!(p.get(ids[2]).is_err(), "bridged segment must be deleted");
        assert_eq!(p.get(ids[1]).unwrap().end(), Point2::new(6.0, 10.0));
        assert_eq!(p.get(ids[3]).unwrap().start(), Point2::new(4.0, 0.0));
    }

    #[test]
    fn gap_within_one_segment_inserts_tail() {
        let mut p = square(10.0);
        let ids: Vec<SegmentId> = p.ids().collect();
        // Top edge runs (0,10) -> (10,10).
        make_gap(
            &mut p,
            ids[1],
            Point2::new(3.0, 10.0),
            ids[1],
            Point2::new(7.0, 10.0),
            false,
        )
        .unwrap();

        assert_eq!(p.len(), 5);
        assert_eq!(p.get(ids[1]).unwrap().end(), Point2::new(3.0, 10.0));
        let tail = p.last_id().unwrap();
        assert_eq!(p.get(tail).unwrap().start(), Point2::new(7.0, 10.0));
        assert_eq!(p.get(tail).unwrap().end(), Point2::new(10.0, 10.0));
    }

    #[test]
    fn gap_within_one_segment_no_new_lines_rebases_follower() {
        let mut p = square(10.0);
        let ids: Vec<SegmentId> = p.ids().collect();
        make_gap(
            &mut p,
            ids[1],
            Point2::new(3.0, 10.0),
            ids[1],
            Point2::new(7.0, 10.0),
            true,
        )
        .unwrap();

        assert_eq!(p.len(), 4, "no segment may be created");
        assert_eq!(p.get(ids[1]).unwrap().end(), Point2::new(3.0, 10.0));
        assert_eq!(p.get(ids[2]).unwrap().start(), Point2::new(7.0, 10.0));
    }

    #[test]
    fn stale_handle_reports_error() {
        let mut p = square(10.0);
        let ids: Vec<SegmentId> = p.ids().collect();
        p.remove(ids[1]).unwrap();
        let r = make_gap(
            &mut p,
            ids[1],
            Point2::new(3.0, 10.0),
            ids[1],
            Point2::new(7.0, 10.0),
            false,
        );
        assert!(r.is_err());
    }

    #[test]
    fn vertical_slot_in_square_top() {
        let mut p = square(10.0);
        let (pt0, pt1) = cut_slot(
            &mut p,
            Direction::Up,
            5.0,
            2.0,
            3.0,
            SlotStyle::Vertical,
        )
        .unwrap();

        // Corners on the original outline.
        assert!((pt0.y - 10.0).abs() < 1e-9);
        assert!((pt1.y - 10.0).abs() < 1e-9);
        assert!((dist(&pt0, &pt1) - 2.0).abs() < 1e-9);

        // The slot bottom is horizontal at depth 3.
        let bottom = p
            .iter()
            .find(|(_, s)| s.is_horizontal() && (s.start().y - 7.0).abs() < 1e-9)
            .map(|(_, s)| *s)
            .expect("slot bottom present");
        assert!((bottom.len() - 2.0).abs() < 1e-9);
        assert!(p.is_closed());
    }

    #[test]
    fn graded_slot_bottom_follows_surface() {
        // Trapezoid with a slanted top edge, clockwise.
        let mut p = Path::new();
        p.push_points(Point2::new(0.0, 0.0), Point2::new(0.0, 5.0));
        p.push_points(Point2::new(0.0, 5.0), Point2::new(10.0, 7.0));
        p.push_points(Point2::new(10.0, 7.0), Point2::new(10.0, 0.0));
        p.push_points(Point2::new(10.0, 0.0), Point2::new(0.0, 0.0));

        let surface_angle = Segment::new(Point2::new(0.0, 5.0), Point2::new(10.0, 7.0)).angle();
        let (pt0, pt1) =
            cut_slot(&mut p, Direction::Up, 5.0, 2.0, 1.0, SlotStyle::Graded).unwrap();

        // Corners on the slanted surface: y = 5 + 0.2 x.
        assert!((pt0.y - (5.0 + 0.2 * pt0.x)).abs() < 1e-9);
        assert!((pt1.y - (5.0 + 0.2 * pt1.x)).abs() < 1e-9);

        // Bottom parallel to the surface.
        let bottom = p
            .iter()
            .map(|(_, s)| *s)
            .find(|s| {
                (s.len() - 2.0).abs() < 1e-6
                    && (s.angle() - surface_angle).abs() < 1e-6
                    && s.start().y < 6.0
            })
            .expect("graded slot bottom present");
        assert!((bottom.angle() - surface_angle).abs() < 1e-9);
    }

    #[test]
    fn slot_outside_outline_fails_cleanly() {
        let mut p = square(10.0);
        let before = p.total_len();
        let r = cut_slot(
            &mut p,
            Direction::Up,
            50.0,
            2.0,
            3.0,
            SlotStyle::Vertical,
        );
        assert!(r.is_err());
        assert!((p.total_len() - before).abs() < 1e-9, "no mutation on failure");
    }
}
