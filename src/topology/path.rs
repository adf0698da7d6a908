use slotmap::SlotMap;

use crate::error::TopologyError;
use crate::geometry::Segment;
use crate::math::{same_point, Point2, SMALL_NUM};

slotmap::new_key_type! {
    /// Generation-checked handle to a segment within a [`Path`].
    ///
    /// A handle stays valid across unrelated insertions and deletions in
    /// the same path; dereferencing a handle whose segment was deleted is
    /// a detectable error, never undefined behaviour.
    pub struct SegmentId;
}

/// Axis-aligned bounding box of a path.
#[derive(Debug, Clone, Copy)]
pub struct Aabb {
    pub min: Point2,
    pub max: Point2,
}

/// An ordered, mutable collection of segments forming open or closed
/// polyline paths.
///
/// Segments live in a generational arena and are addressed by
/// [`SegmentId`]; traversal order is kept separately, so handles held by
/// long-lived records (notches, anchors, braces) survive unrelated
/// mutation of the same path. A path is *closed* when its last endpoint
/// coincides with its first start point within snap tolerance.
#[derive(Debug, Clone, Default)]
pub struct Path {
    segments: SlotMap<SegmentId, Segment>,
    order: Vec<SegmentId>,
}

impl Path {
    /// Creates a new, empty path.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a path holding a single segment.
    #[must_use]
    pub fn from_segment(seg: Segment) -> Self {
        let mut path = Self::new();
        path.push(seg);
        path
    }

    // --- Adding segments ---

    /// Appends a segment, returning its handle.
    pub fn push(&mut self, seg: Segment) -> SegmentId {
        let id = self.segments.insert(seg);
        self.order.push(id);
        id
    }

    /// Appends a segment between two points.
    pub fn push_points(&mut self, s0: Point2, s1: Point2) -> SegmentId {
        self.push(Segment::new(s0, s1))
    }

    /// Extends the path to `pt`: from the current endpoint if the path has
    /// segments, otherwise as a zero-length seed segment at `pt`.
    pub fn add_point(&mut self, pt: Point2) -> SegmentId {
        match self.end_point() {
            Some(ep) => self.push_points(ep, pt),
            None => self.push_points(pt, pt),
        }
    }

    /// Renders `seg` as a dotted segment run with the given mark/space
    /// lengths.
    pub fn add_dotted(&mut self, seg: &Segment, mark_len: f64, space_len: f64) {
        if seg.is_empty() {
            return;
        }
        let mark_t = mark_len / seg.len();
        let space_t = space_len / seg.len();
        let mut t = 0.0;
        while t <= 1.0 - mark_t {
            self.push_points(seg.point_at(t), seg.point_at(t + mark_t));
            t += mark_t + space_t;
        }
    }

    /// Inserts a segment directly after the referenced one, returning
    /// the new segment's handle.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::StaleSegment`] if the handle no longer
    /// refers to a live segment.
    pub fn insert_after(
        &mut self,
        id: SegmentId,
        seg: Segment,
    ) -> Result<SegmentId, TopologyError> {
        let pos = self.position(id)?;
        let new_id = self.segments.insert(seg);
        self.order.insert(pos + 1, new_id);
        Ok(new_id)
    }

    /// Moves the contiguous run of segments `from..=to` (in traversal
    /// order) out of `other` onto the end of this path. The moved
    /// segments get fresh handles in this path.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::StaleSegment`] if either handle is not
    /// live in `other`, or if `to` precedes `from`.
    pub fn splice(
        &mut self,
        other: &mut Path,
        from: SegmentId,
        to: SegmentId,
    ) -> Result<(), TopologyError> {
        let start = other.position(from)?;
        let end = other.position(to)?;
        if end < start {
            return Err(TopologyError::StaleSegment);
        }
        for _ in start..=end {
            let id = other.order.remove(start);
            if let Some(seg) = other.segments.remove(id) {
                self.push(seg);
            }
        }
        Ok(())
    }

    /// Moves all segments of `other` onto the end of this path.
    pub fn append(&mut self, mut other: Path) {
        for id in std::mem::take(&mut other.order) {
            if let Some(seg) = other.segments.remove(id) {
                self.push(seg);
            }
        }
    }

    /// Copies all segments of `other` onto the end of this path.
    pub fn extend_from(&mut self, other: &Path) {
        for (_, seg) in other.iter() {
            self.push(*seg);
        }
    }

    // --- Removing segments ---

    /// Removes the referenced segment.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::StaleSegment`] if the handle no longer
    /// refers to a live segment.
    pub fn remove(&mut self, id: SegmentId) -> Result<Segment, TopologyError> {
        let seg = self
            .segments
            .remove(id)
            .ok_or(TopologyError::StaleSegment)?;
        self.order.retain(|&o| o != id);
        Ok(seg)
    }

    /// Removes every segment.
    pub fn clear(&mut self) {
        self.segments.clear();
        self.order.clear();
    }

    /// Removes all but the first of identically represented segments,
    /// returning the number removed.
    pub fn remove_duplicates(&mut self) -> usize {
        let mut removed = 0;
        let mut pos = 0;
        while pos < self.order.len() {
            let keep = self.segments[self.order[pos]];
            let mut cmp = pos + 1;
            while cmp < self.order.len() {
                if keep.same_geometry(&self.segments[self.order[cmp]]) {
                    let id = self.order.remove(cmp);
                    self.segments.remove(id);
                    removed += 1;
                } else {
                    cmp += 1;
                }
            }
            pos += 1;
        }
        removed
    }

    /// Removes segments of (numerically) zero length, returning the
    /// number removed.
    pub fn remove_zero_len(&mut self) -> usize {
        let mut removed = 0;
        let mut pos = 0;
        while pos < self.order.len() {
            if self.segments[self.order[pos]].len() < SMALL_NUM {
                let id = self.order.remove(pos);
                self.segments.remove(id);
                removed += 1;
            } else {
                pos += 1;
            }
        }
        removed
    }

    // --- Access ---

    /// Returns the referenced segment.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::StaleSegment`] if the handle no longer
    /// refers to a live segment.
    pub fn get(&self, id: SegmentId) -> Result<&Segment, TopologyError> {
        self.segments.get(id).ok_or(TopologyError::StaleSegment)
    }

    /// Returns the referenced segment mutably.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::StaleSegment`] if the handle no longer
    /// refers to a live segment.
    pub fn get_mut(&mut self, id: SegmentId) -> Result<&mut Segment, TopologyError> {
        self.segments.get_mut(id).ok_or(TopologyError::StaleSegment)
    }

    /// Ordered traversal of `(handle, segment)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (SegmentId, &Segment)> {
        self.order.iter().map(move |&id| (id, &self.segments[id]))
    }

    /// Ordered segment handles.
    pub fn ids(&self) -> impl Iterator<Item = SegmentId> + '_ {
        self.order.iter().copied()
    }

    /// Number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True when the path holds no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Handle of the first segment in traversal order.
    #[must_use]
    pub fn first_id(&self) -> Option<SegmentId> {
        self.order.first().copied()
    }

    /// Handle of the last segment in traversal order.
    #[must_use]
    pub fn last_id(&self) -> Option<SegmentId> {
        self.order.last().copied()
    }

    /// Traversal position of the referenced segment.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::StaleSegment`] if the handle no longer
    /// refers to a live segment.
    pub fn position(&self, id: SegmentId) -> Result<usize, TopologyError> {
        self.order
            .iter()
            .position(|&o| o == id)
            .ok_or(TopologyError::StaleSegment)
    }

    /// Successor in traversal order, wrapping across the seam.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::StaleSegment`] if the handle no longer
    /// refers to a live segment.
    pub fn next_circular(&self, id: SegmentId) -> Result<SegmentId, TopologyError> {
        let pos = self.position(id)?;
        Ok(self.order[(pos + 1) % self.order.len()])
    }

    /// Predecessor in traversal order, wrapping across the seam.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::StaleSegment`] if the handle no longer
    /// refers to a live segment.
    pub fn prev_circular(&self, id: SegmentId) -> Result<SegmentId, TopologyError> {
        let pos = self.position(id)?;
        Ok(self.order[(pos + self.order.len() - 1) % self.order.len()])
    }

    // --- Interrogation ---

    /// Sum of all segment lengths.
    #[must_use]
    pub fn total_len(&self) -> f64 {
        self.iter().map(|(_, seg)| seg.len()).sum()
    }

    /// Start point of the first segment.
    #[must_use]
    pub fn start_point(&self) -> Option<Point2> {
        self.first_id().map(|id| self.segments[id].start())
    }

    /// End point of the last segment.
    #[must_use]
    pub fn end_point(&self) -> Option<Point2> {
        self.last_id().map(|id| self.segments[id].end())
    }

    /// True when the last endpoint coincides with the first start point
    /// within snap tolerance.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        match (self.start_point(), self.end_point()) {
            (Some(sp), Some(ep)) => same_point(&sp, &ep),
            _ => false,
        }
    }

    /// Point reached by walking `dist` along the path from its start.
    ///
    /// The walk wraps modulo the total length, so distances beyond one
    /// perimeter continue around a closed path. Returns the point, the
    /// segment reached and the parameter within it.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::EmptyPath`] for an empty path.
    pub fn point_at_distance(
        &self,
        dist: f64,
    ) -> Result<(Point2, SegmentId, f64), TopologyError> {
        let first = self.first_id().ok_or(TopologyError::EmptyPath)?;

        if dist <= 0.0 {
            return Ok((self.segments[first].start(), first, 0.0));
        }

        let dist = dist % self.total_len();
        let mut walked = 0.0;
        for (id, seg) in self.iter() {
            let seg_len = seg.len();
            let t = (dist - walked) / seg_len;
            if t <= 1.0 {
                return Ok((seg.point_at(t), id, t));
            }
            walked += seg_len;
        }

        // Rounding at the seam can overrun the walk; land on the final
        // endpoint.
        let last = self.order[self.order.len() - 1];
        Ok((self.segments[last].end(), last, 1.0))
    }

    /// Axis-aligned bounding box over all segment endpoints, or `None`
    /// for an empty path.
    #[must_use]
    pub fn aabb(&self) -> Option<Aabb> {
        let mut bounds: Option<Aabb> = None;
        for (_, seg) in self.iter() {
            for pt in [seg.start(), seg.end()] {
                bounds = Some(match bounds {
                    None => Aabb { min: pt, max: pt },
                    Some(b) => Aabb {
                        min: Point2::new(b.min.x.min(pt.x), b.min.y.min(pt.y)),
                        max: Point2::new(b.max.x.max(pt.x), b.max.y.max(pt.y)),
                    },
                });
            }
        }
        bounds
    }

    // --- Whole-path transforms ---

    /// Moves every segment by `(dx, dy)`.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        for seg in self.segments.values_mut() {
            seg.translate(dx, dy);
        }
    }

    /// Rotates every segment about `pivot` by `rads`.
    pub fn rotate(&mut self, pivot: &Point2, rads: f64) {
        for seg in self.segments.values_mut() {
            seg.rotate(pivot, rads);
        }
    }

    /// Mirrors every segment about the vertical line `x = 0`.
    pub fn mirror_x(&mut self) {
        for seg in self.segments.values_mut() {
            seg.mirror_x();
        }
    }

    /// Mirrors every segment about the horizontal line `y = 0`.
    pub fn mirror_y(&mut self) {
        for seg in self.segments.values_mut() {
            seg.mirror_y();
        }
    }

    /// Scales every endpoint about the origin.
    pub fn scale(&mut self, factor: f64) {
        for seg in self.segments.values_mut() {
            let s0 = seg.start();
            let s1 = seg.end();
            seg.set_points(
                Point2::new(s0.x * factor, s0.y * factor),
                Point2::new(s1.x * factor, s1.y * factor),
            );
        }
    }

    // --- Simplification ---

    /// Merges runs of contiguous segments that a single segment can
    /// replace with at most [`Self::SIMPLIFY_ERR`] deviation. Returns the
    /// number of segments removed.
    pub fn simplify(&mut self) -> usize {
        self.simplify_with(Self::SIMPLIFY_ERR)
    }

    /// Allowable deviation when simplifying, in mm.
    pub const SIMPLIFY_ERR: f64 = 0.01;

    /// Merges runs of contiguous segments whose every endpoint stays
    /// within `error` of the replacing segment. On a closed path the run
    /// crossing the start/end seam is merged as well.
    pub fn simplify_with(&mut self, error: f64) -> usize {
        let start_count = self.len();

        let mut st = 0;
        while st < self.len() {
            let mut en = st;
            loop {
                let ca = en + 1;
                if ca >= self.len() {
                    break;
                }
                if crate::math::dist(&self.seg_at(en).end(), &self.seg_at(ca).start())
                    > crate::math::SNAP_LEN
                {
                    break;
                }
                let merged = Segment::new(self.seg_at(st).start(), self.seg_at(ca).end());
                if self.max_line_distance(st, ca, &merged) >= error {
                    break;
                }
                en = ca;
            }

            let s0 = self.seg_at(st).start();
            let s1 = self.seg_at(en).end();
            self.seg_at_mut(en).set_points(s0, s1);
            for _ in st..en {
                self.drop_segment_at(st);
            }
            st += 1;
        }

        // Merge across the seam of a closed path.
        while self.len() >= 2 && self.is_closed() {
            let last = self.len() - 1;
            let merged = Segment::new(self.seg_at(last).start(), self.seg_at(0).end());
            if self.max_line_distance(last, last, &merged) >= error
                || self.max_line_distance(0, 0, &merged) >= error
            {
                break;
            }
            self.seg_at_mut(0).set_points(merged.start(), merged.end());
            self.drop_segment_at(last);
        }

        start_count - self.len()
    }

    /// Largest distance from any endpoint of the segments at positions
    /// `st..=en` to `ln`.
    fn max_line_distance(&self, st: usize, en: usize, ln: &Segment) -> f64 {
        let mut err = 0.0_f64;
        for pos in st..=en {
            let seg = self.seg_at(pos);
            err = err.max(ln.distance_to_point(&seg.start()));
            err = err.max(ln.distance_to_point(&seg.end()));
        }
        err
    }

    // --- Internal helpers for the stitching engine ---

    pub(crate) fn order_slice(&self) -> &[SegmentId] {
        &self.order
    }

    pub(crate) fn order_remove(&mut self, pos: usize) -> SegmentId {
        self.order.remove(pos)
    }

    pub(crate) fn order_insert(&mut self, pos: usize, id: SegmentId) {
        self.order.insert(pos, id);
    }

    pub(crate) fn seg_at(&self, pos: usize) -> &Segment {
        &self.segments[self.order[pos]]
    }

    pub(crate) fn seg_at_mut(&mut self, pos: usize) -> &mut Segment {
        &mut self.segments[self.order[pos]]
    }

    pub(crate) fn drop_segment_at(&mut self, pos: usize) {
        let id = self.order.remove(pos);
        self.segments.remove(id);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn seg(x0: f64, y0: f64, x1: f64, y1: f64) -> Segment {
        Segment::new(Point2::new(x0, y0), Point2::new(x1, y1))
    }

    fn unit_square() -> Path {
        let mut p = Path::new();
        p.push(seg(0.0, 0.0, 0.0, 1.0));
        p.push(seg(0.0, 1.0, 1.0, 1.0));
        p.push(seg(1.0, 1.0, 1.0, 0.0));
        p.push(seg(1.0, 0.0, 0.0, 0.0));
        p
    }

    #[test]
    fn push_and_iterate_in_order() {
        let p = unit_square();
        assert_eq!(p.len(), 4);
        let starts: Vec<f64> = p.iter().map(|(_, s)| s.start().x).collect();
        assert_eq!(starts, vec![0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn stale_handle_is_detected() {
        let mut p = unit_square();
        let id = p.first_id().unwrap();
        p.remove(id).unwrap();
        assert!(matches!(p.get(id), Err(TopologyError::StaleSegment)));
        assert!(matches!(p.remove(id), Err(TopologyError::StaleSegment)));
    }

    #[test]
    fn handle_survives_unrelated_mutation() {
        let mut p = unit_square();
        let ids: Vec<SegmentId> = p.ids().collect();
        p.remove(ids[1]).unwrap();
        p.push(seg(5.0, 5.0, 6.0, 5.0));
        assert!(p.get(ids[3]).is_ok());
        assert_eq!(p.position(ids[3]).unwrap(), 2);
    }

    #[test]
    fn circular_navigation_wraps() {
        let p = unit_square();
        let ids: Vec<SegmentId> = p.ids().collect();
        assert_eq!(p.next_circular(ids[3]).unwrap(), ids[0]);
        assert_eq!(p.prev_circular(ids[0]).unwrap(), ids[3]);
    }

    #[test]
    fn add_point_extends_from_endpoint() {
        let mut p = Path::new();
        p.add_point(Point2::new(1.0, 1.0));
        assert_eq!(p.len(), 1);
        assert!(p.seg_at(0).is_empty());
        p.add_point(Point2::new(2.0, 1.0));
        assert_eq!(p.len(), 2);
        assert_eq!(p.end_point().unwrap(), Point2::new(2.0, 1.0));
    }

    #[test]
    fn closed_query() {
        assert!(unit_square().is_closed());
        let mut open = unit_square();
        let last = open.last_id().unwrap();
        open.remove(last).unwrap();
        assert!(!open.is_closed());
    }

    #[test]
    fn total_len_sums_segments() {
        assert!((unit_square().total_len() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn point_at_distance_walks_and_wraps() {
        let p = unit_square();
        let (pt, _, t) = p.point_at_distance(0.5).unwrap();
        assert!((pt.x).abs() < 1e-12);
        assert!((pt.y - 0.5).abs() < 1e-12);
        assert!((t - 0.5).abs() < 1e-12);

        // Wraps modulo the perimeter.
        let (pt, _, _) = p.point_at_distance(4.5).unwrap();
        assert!((pt.x).abs() < 1e-12);
        assert!((pt.y - 0.5).abs() < 1e-12);
    }

    #[test]
    fn point_at_distance_empty_path() {
        let p = Path::new();
        assert!(matches!(
            p.point_at_distance(1.0),
            Err(TopologyError::EmptyPath)
        ));
    }

    #[test]
    fn aabb_covers_endpoints() {
        let b = unit_square().aabb().unwrap();
        assert!((b.min.x).abs() < 1e-12);
        assert!((b.max.x - 1.0).abs() < 1e-12);
        assert!((b.max.y - 1.0).abs() < 1e-12);
        assert!(Path::new().aabb().is_none());
    }

    #[test]
    fn duplicates_and_zero_lens_removed() {
        let mut p = Path::new();
        p.push(seg(0.0, 0.0, 1.0, 0.0));
        p.push(seg(0.0, 0.0, 1.0, 0.0));
        p.push(seg(2.0, 2.0, 2.0, 2.0));
        assert_eq!(p.remove_duplicates(), 1);
        assert_eq!(p.remove_zero_len(), 1);
        assert_eq!(p.len(), 1);
    }

    #[test]
    fn insert_after_places_mid_path() {
        let mut p = unit_square();
        let ids: Vec<SegmentId> = p.ids().collect();
        let new_id = p
            .insert_after(ids[1], seg(0.5, 0.5, 0.6, 0.5))
            .unwrap();
        assert_eq!(p.position(new_id).unwrap(), 2);
        assert_eq!(p.position(ids[2]).unwrap(), 3);
    }

    #[test]
    fn splice_moves_a_range() {
        let mut src = unit_square();
        let ids: Vec<SegmentId> = src.ids().collect();
        let mut dst = Path::new();
        dst.push(seg(9.0, 9.0, 9.5, 9.0));

        dst.splice(&mut src, ids[1], ids[2]).unwrap();
        assert_eq!(dst.len(), 3);
        assert_eq!(src.len(), 2);
        assert!(src.get(ids[1]).is_err());
        assert!(src.get(ids[0]).is_ok());
    }

    #[test]
    fn append_moves_and_extend_copies() {
        let mut a = Path::new();
        a.push(seg(0.0, 0.0, 1.0, 0.0));
        let mut b = Path::new();
        b.push(seg(1.0, 0.0, 2.0, 0.0));

        a.extend_from(&b);
        assert_eq!(a.len(), 2);
        assert_eq!(b.len(), 1);

        a.append(b);
        assert_eq!(a.len(), 3);
    }

    #[test]
    fn simplify_merges_collinear_runs() {
        let mut p = Path::new();
        p.push(seg(0.0, 0.0, 1.0, 0.0));
        p.push(seg(1.0, 0.0, 2.0, 0.0));
        p.push(seg(2.0, 0.0, 3.0, 0.0));
        p.push(seg(3.0, 0.0, 3.0, 1.0));
        let removed = p.simplify();
        assert_eq!(removed, 2);
        assert_eq!(p.len(), 2);
        assert_eq!(p.end_point().unwrap(), Point2::new(3.0, 1.0));
    }

    #[test]
    fn simplify_merges_across_closed_seam() {
        // Unit square with each side split in two; the seam splits the
        // first side.
        let mut p = Path::new();
        p.push(seg(0.0, 0.5, 0.0, 1.0));
        p.push(seg(0.0, 1.0, 1.0, 1.0));
        p.push(seg(1.0, 1.0, 1.0, 0.0));
        p.push(seg(1.0, 0.0, 0.0, 0.0));
        p.push(seg(0.0, 0.0, 0.0, 0.5));
        p.simplify();
        assert_eq!(p.len(), 4);
        assert!(p.is_closed());
    }

    #[test]
    fn transforms_move_all_segments() {
        let mut p = unit_square();
        p.translate(2.0, 3.0);
        let b = p.aabb().unwrap();
        assert!((b.min.x - 2.0).abs() < 1e-12);
        assert!((b.min.y - 3.0).abs() < 1e-12);

        let mut q = unit_square();
        q.scale(2.0);
        assert!((q.total_len() - 8.0).abs() < 1e-12);

        let mut r = unit_square();
        r.mirror_x();
        let rb = r.aabb().unwrap();
        assert!((rb.min.x + 1.0).abs() < 1e-12);
        assert!((rb.max.x).abs() < 1e-12);
    }
}
