//! Path-level intersection queries: segment sweeps, ray-like
//! extrapolation and vertical silhouette lookups.

use crate::error::{OperationError, Result};
use crate::geometry::Segment;
use crate::math::{Direction, Point2, Vector2};
use crate::topology::{Path, SegmentId};

/// One intersection between a query segment and a path.
#[derive(Debug, Clone, Copy)]
pub struct PathHit {
    /// Parameter along the (possibly grown) query segment; used for
    /// ordering.
    pub t: f64,
    /// Handle of the intersected path segment.
    pub seg: SegmentId,
    /// The intersection point.
    pub point: Point2,
}

/// Collects every intersection between `query` and the segments of
/// `path`, sorted by parameter along the query ascending.
///
/// With `extrapolate` set, the query segment is first grown end-over-end
/// until both endpoints lie outside the path's bounding box,
/// approximating an unbounded ray without symbolic infinities. The path
/// segments themselves always stay bounded.
#[must_use]
pub fn path_intersections(path: &Path, query: &Segment, extrapolate: bool) -> Vec<PathHit> {
    let mut query = *query;

    if extrapolate {
        if let Some(bb) = path.aabb() {
            loop {
                let s0 = query.point_at(-1.0);
                let s1 = query.point_at(2.0);
                query.set_points(s0, s1);
                let x_clear = (s0.x < bb.min.x && s1.x > bb.max.x)
                    || (s1.x < bb.min.x && s0.x > bb.max.x);
                let y_clear = (s0.y < bb.min.y && s1.y > bb.max.y)
                    || (s1.y < bb.min.y && s0.y > bb.max.y);
                if x_clear || y_clear {
                    break;
                }
            }
        }
    }

    let mut hits: Vec<PathHit> = path
        .iter()
        .filter_map(|(id, seg)| {
            seg.intersect(&query, false).map(|pt| PathHit {
                t: query.t_for_point(&pt),
                seg: id,
                point: pt,
            })
        })
        .collect();

    hits.sort_by(|a, b| a.t.total_cmp(&b.t));
    hits
}

/// True when any segment of `a` intersects any segment of `b`.
#[must_use]
pub fn paths_intersect(a: &Path, b: &Path) -> bool {
    b.iter()
        .any(|(_, seg)| a.iter().any(|(_, other)| other.intersect(seg, false).is_some()))
}

/// Finds the lowest and highest intersections of `path` with the
/// vertical line at `x`. A pure read; returns `None` when the line
/// misses the path entirely.
#[must_use]
pub fn top_bot_intersect(path: &Path, x: f64) -> Option<(PathHit, PathHit)> {
    let probe = Segment::new(Point2::new(x, 0.0), Point2::new(x, 1.0));
    let hits = path_intersections(path, &probe, true);
    let lower = *hits.first()?;
    let upper = *hits.last()?;
    Some((lower, upper))
}

/// The `Up` or `Down` silhouette intersection of the vertical line at
/// `x`. Horizontal directions have no silhouette meaning and return
/// `None`.
#[must_use]
pub fn dir_intersect(path: &Path, dir: Direction, x: f64) -> Option<PathHit> {
    let (lower, upper) = top_bot_intersect(path, x)?;
    match dir {
        Direction::Up => Some(upper),
        Direction::Down => Some(lower),
        Direction::Left | Direction::Right => None,
    }
}

/// Shuffles a closed path's element order so the path starts exactly at
/// the requested compass point of its silhouette (the intersection of
/// the path with a horizontal or vertical line through the bounding-box
/// centre).
///
/// # Errors
///
/// Returns [`OperationError::IntersectionNotFound`] if the centre line
/// fails to intersect the path.
pub fn start_at_direction(path: &mut Path, dir: Direction) -> Result<()> {
    path.make_path();

    let bb = path
        .aabb()
        .ok_or_else(|| OperationError::IntersectionNotFound("empty path".to_owned()))?;
    let h_pos = (bb.min.y + bb.max.y) / 2.0;
    let v_pos = (bb.min.x + bb.max.x) / 2.0;

    let h_line = Segment::from_vector(Point2::new(0.0, h_pos), Vector2::new(1.0, 0.0));
    let v_line = Segment::from_vector(Point2::new(v_pos, 0.0), Vector2::new(0.0, 1.0));

    let pick = |hits: Vec<PathHit>, last: bool| -> Result<PathHit> {
        let hit = if last { hits.last() } else { hits.first() };
        hit.copied().ok_or_else(|| {
            OperationError::IntersectionNotFound("no centre-line intersection".to_owned()).into()
        })
    };

    let hit = match dir {
        Direction::Left => pick(path_intersections(path, &h_line, true), false)?,
        Direction::Right => pick(path_intersections(path, &h_line, true), true)?,
        Direction::Up => pick(path_intersections(path, &v_line, true), true)?,
        Direction::Down => pick(path_intersections(path, &v_line, true), false)?,
    };

    // Rebuild, starting and finishing at the intersection point.
    let pos = path.position(hit.seg)?;
    let n = path.len();
    let mut rebuilt = Path::new();
    rebuilt.push_points(hit.point, path.get(hit.seg)?.end());
    for k in 1..n {
        let seg = path.seg_at((pos + k) % n);
        rebuilt.push_points(seg.start(), seg.end());
    }
    rebuilt.push_points(path.get(hit.seg)?.start(), hit.point);

    *path = rebuilt;
    Ok(())
}
