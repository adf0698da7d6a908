use super::{dist, perp, same_point, Point2, Vector2, SMALL_NUM, SNAP_LEN};

/// Segment-segment intersection in 2D.
///
/// Segments are given parametrically as `s + t * v`, `t` in `[0, 1]`.
/// With `extrapolate` set, both lines are treated as unbounded.
///
/// Handles the full case split: skew segments, parallel non-collinear
/// (no result), collinear overlap (reduced to a 1D interval), and
/// degenerate zero-length "point" segments.
#[must_use]
pub fn segment_segment_intersect(
    s1: &Point2,
    v1: &Vector2,
    s2: &Point2,
    v2: &Vector2,
    extrapolate: bool,
) -> Option<Point2> {
    let w = s1 - s2;
    let perp12 = perp(v1, v2);

    if perp12.abs() < SMALL_NUM {
        // Parallel. Collinear only if both perp products with w vanish.
        let perp1w = perp(v1, &w);
        let perp2w = perp(v2, &w);
        if perp1w.abs() > f64::EPSILON || perp2w.abs() > f64::EPSILON {
            return None;
        }

        // Collinear; unbounded lines are the same line.
        if extrapolate {
            let e1 = s1 + v1;
            let e2 = s2 + v2;
            return Some(Point2::new(
                (s1.x + s2.x + e1.x + e2.x) / 4.0,
                (s1.y + s2.y + e1.y + e2.y) / 4.0,
            ));
        }

        let dot1 = v1.norm_squared();
        let dot2 = v2.norm_squared();

        if dot1 == 0.0 && dot2 == 0.0 {
            // Both segments are points.
            if same_point(s1, s2) {
                return Some(*s1);
            }
            return None;
        }

        if dot1 == 0.0 {
            // First segment is a single point.
            if !in_collinear_span(s2, v2, s1) {
                return None;
            }
            return Some(*s1);
        }

        if dot2 == 0.0 {
            // Second segment is a single point.
            if !in_collinear_span(s1, v1, s2) {
                return None;
            }
            return Some(*s2);
        }

        // Collinear segments: reduce to a 1D overlap along the second.
        let w2 = (s1 + v1) - s2;
        let (mut t1, mut t2) = if v2.x != 0.0 {
            (w.x / v2.x, w2.x / v2.x)
        } else {
            (w.y / v2.y, w2.y / v2.y)
        };
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
        }
        if t1 > 1.0 || t2 < 0.0 {
            return None;
        }
        let t1 = t1.max(0.0);
        return Some(s2 + v2 * t1);
    }

    // Skew: the lines meet in a single point.
    let t1 = perp(v2, &w) / perp12;
    let t2 = perp(v1, &w) / perp12;
    if !extrapolate && !(0.0..=1.0).contains(&t1) {
        return None;
    }
    if !extrapolate && !(0.0..=1.0).contains(&t2) {
        return None;
    }
    Some(s1 + v1 * t1)
}

/// Tests whether `pt`, assumed collinear with the segment, lies within its
/// axis-projected span.
fn in_collinear_span(s0: &Point2, v: &Vector2, pt: &Point2) -> bool {
    let (p0, p1, p) = if v.x.abs() >= SNAP_LEN {
        (s0.x, s0.x + v.x, pt.x)
    } else {
        (s0.y, s0.y + v.y, pt.y)
    };
    let lo = p0.min(p1);
    let hi = p0.max(p1);
    p >= lo && p <= hi
}

/// Checks that a claimed intersection point actually lies near both
/// segments; used by tests and debug assertions.
#[must_use]
pub fn point_near_segment(pt: &Point2, s0: &Point2, v: &Vector2, margin: f64) -> bool {
    let end = s0 + v;
    super::distance_2d::point_to_segment_dist(pt, s0, &end) <= margin
        || dist(pt, s0) <= margin
}
