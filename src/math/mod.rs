pub mod distance_2d;
pub mod intersect_2d;

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// Maximum endpoint separation treated as "the same point" when stitching.
pub const SNAP_LEN: f64 = 1e-4;

/// Numerical noise floor, well below any physically meaningful length.
pub const SMALL_NUM: f64 = SNAP_LEN * 1e-3;

/// Compass direction, used for silhouette queries and extremity selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

/// Checks whether two values agree within `+/-margin`.
#[must_use]
pub fn is_equal_within(a: f64, b: f64, margin: f64) -> bool {
    b <= a + margin && b >= a - margin
}

/// Checks whether `b` lies within `percentage`% of `a`.
#[must_use]
pub fn is_equal_within_percentage(a: f64, b: f64, percentage: f64) -> bool {
    is_equal_within(a, b, a * (percentage / 100.0))
}

/// Distance between two points.
#[must_use]
pub fn dist(a: &Point2, b: &Point2) -> f64 {
    (b - a).norm()
}

/// True when two points coincide within the snap tolerance.
#[must_use]
pub fn same_point(a: &Point2, b: &Point2) -> bool {
    dist(a, b) <= SNAP_LEN
}

/// Midpoint of two points.
#[must_use]
pub fn midpoint(a: &Point2, b: &Point2) -> Point2 {
    Point2::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

/// 2D perpendicular (cross) product of two vectors.
#[must_use]
pub fn perp(a: &Vector2, b: &Vector2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Rotates `pt` about `pivot` by `rads` (counter-clockwise positive).
#[must_use]
pub fn rotate_point(pt: &Point2, pivot: &Point2, rads: f64) -> Point2 {
    let (s, c) = rads.sin_cos();
    let v = pt - pivot;
    Point2::new(
        pivot.x + v.x * c - v.y * s,
        pivot.y + v.x * s + v.y * c,
    )
}

/// Signed angle from `a` to `b` in `(-PI, PI]`.
///
/// Returns `0.0` if either vector is zero-length.
#[must_use]
pub fn angle_between(a: &Vector2, b: &Vector2) -> f64 {
    if a.norm() > 0.0 && b.norm() > 0.0 {
        perp(a, b).atan2(a.dot(b))
    } else {
        0.0
    }
}
