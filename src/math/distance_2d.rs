use super::Point2;

/// Returns the minimum distance from `pt` to the segment from `a` to `b`.
///
/// The point is projected onto the infinite line through the segment and
/// the parameter clamped to `[0, 1]` before measuring, so endpoints bound
/// the result.
#[must_use]
pub fn point_to_segment_dist(pt: &Point2, a: &Point2, b: &Point2) -> f64 {
    let d = b - a;
    let len_sq = d.norm_squared();

    if len_sq < 1e-20 {
        // Degenerate segment (zero length).
        return (pt - a).norm();
    }

    let t = ((pt - a).dot(&d) / len_sq).clamp(0.0, 1.0);
    let closest = a + d * t;
    (pt - closest).norm()
}
