//! Anchor placement and girder brace generation/validation.
//!
//! Anchors sit on the reference rim; from each, two braces radiate
//! toward bisector points on the lightening hole. Each brace carries two
//! physical strut edges bounded by the inner and outer rims. Braces that
//! end up too narrow or crossing another strut are invalidated.

use std::f64::consts::FRAC_PI_2;

use crate::geometry::Segment;
use crate::math::{dist, midpoint, Point2, SNAP_LEN};
use crate::operations::path_intersections;
use crate::topology::SegmentId;

use super::LiteEngine;

/// Bisector rotation search gives up beyond this angle, in degrees.
const MAX_REF_ROTATION_DEGS: i32 = 60;

/// How far brace edges are pulled in from their endpoints before the
/// crossing test, as a parameter fraction.
const CROSSING_END_SHRINK: f64 = 0.001;

/// One physical strut edge of a brace.
#[derive(Debug, Clone, Copy)]
pub struct BraceEdge {
    /// The edge itself, running from the outer rim to the inner rim.
    pub seg: Segment,
    /// Outer-rim segment the edge lands on.
    pub outer_seg: SegmentId,
    pub outer_pt: Point2,
    /// Inner-rim segment the edge lands on.
    pub inner_seg: SegmentId,
    pub inner_pt: Point2,
}

/// One brace of an anchor: a reference bisector plus two strut edges.
#[derive(Debug, Clone)]
pub struct Brace {
    pub ref_seg: Segment,
    pub edges: [Option<BraceEdge>; 2],
    pub valid: bool,
}

/// An anchor point on the reference rim with its two braces.
#[derive(Debug, Clone)]
pub struct Anchor {
    pub rim_pt: Point2,
    pub rim_seg: SegmentId,
    pub braces: [Brace; 2],
}

impl Anchor {
    /// Creates an anchor with its two reference rays at plus/minus
    /// `brace_angle` off the inward rim normal.
    pub(crate) fn new(
        rim_pt: Point2,
        rim_seg: SegmentId,
        rim_angle: f64,
        brace_angle: f64,
    ) -> Self {
        let ray = |sign: f64| Brace {
            ref_seg: Segment::from_polar(
                rim_pt,
                1.0,
                rim_angle - FRAC_PI_2 + sign * brace_angle,
            ),
            edges: [None, None],
            valid: true,
        };
        Self {
            rim_pt,
            rim_seg,
            braces: [ray(-1.0), ray(1.0)],
        }
    }
}

impl LiteEngine {
    /// Places the anchors and derives one bisector per anchor gap,
    /// intersected against the lightening hole. Returns `false` when any
    /// bisector exhausts its rotation retries; the run continues with
    /// the remaining anchors.
    pub(crate) fn generate_anchor_points(&mut self, anchor_at_notches: bool) -> bool {
        let mut ok = true;
        let brace_angle = self.cfg.anchor_span.atan2(2.0 * self.cfg.rim_spacing);

        if !self.place_anchors(anchor_at_notches, brace_angle) {
            return false;
        }

        // For each pair of adjacent anchors, average their facing rays
        // into one bisector, aim it at the lightening hole and redraw
        // both rays to the intersection.
        let count = self.anchors.len();
        for k in 0..count {
            let k1 = (k + 1) % count;

            // A collinear ray pair averages to a zero-length bisector;
            // nudge one ray until the average is usable.
            let mut bisector_base;
            loop {
                let near = self.anchors[k].braces[1].ref_seg;
                let far = self.anchors[k1].braces[0].ref_seg;
                bisector_base = Segment::new(
                    midpoint(&near.start(), &far.start()),
                    midpoint(&near.end(), &far.end()),
                );
                if bisector_base.len() >= SNAP_LEN {
                    break;
                }
                let pivot = self.anchors[k].braces[1].ref_seg.start();
                self.anchors[k].braces[1]
                    .ref_seg
                    .rotate(&pivot, 1.0_f64.to_radians());
            }

            // Aim at the hole, rotating the bisector in widening
            // alternating steps until it intersects twice.
            let mut swing = 0i32;
            let (bisector, hits) = loop {
                let mut candidate = bisector_base;
                let degs = if swing % 2 == 1 { swing } else { -swing };
                let pivot = candidate.start();
                candidate.rotate(&pivot, f64::from(degs).to_radians());
                let found = path_intersections(&self.inner_rim_outer, &candidate, true);
                if found.len() >= 2 {
                    break (candidate, found);
                }
                if swing >= MAX_REF_ROTATION_DEGS {
                    log::warn!(
                        "anchor {k}: fewer than two bisector intersections with the inner rim"
                    );
                    ok = false;
                    break (bisector_base, found);
                }
                swing += 1;
            };

            let mut construction_ref = bisector;
            construction_ref.extend_end(self.cfg.rim_spacing);
            self.construction.add_dotted(&construction_ref, 0.2, 1.2);

            if hits.len() >= 2 {
                // Some shapes reverse the reference; take the nearer
                // intersection.
                let front = hits[0];
                let back = hits[hits.len() - 1];
                let rim_pt = self.anchors[k].rim_pt;
                let target = if dist(&rim_pt, &front.point) <= dist(&rim_pt, &back.point) {
                    front.point
                } else {
                    back.point
                };

                self.anchors[k].braces[1].ref_seg = Segment::new(rim_pt, target);
                let rim_pt1 = self.anchors[k1].rim_pt;
                self.anchors[k1].braces[0].ref_seg = Segment::new(rim_pt1, target);

                let near = self.anchors[k].braces[1].ref_seg;
                let far = self.anchors[k1].braces[0].ref_seg;
                self.construction.add_dotted(&near, 0.2, 1.2);
                self.construction.add_dotted(&far, 0.2, 1.2);
            }
        }

        ok
    }

    /// Lays the anchor points out along the rim: evenly around the whole
    /// perimeter, or between successive notch pairs when requested (with
    /// a fallback to even spacing if no notches exist).
    fn place_anchors(&mut self, anchor_at_notches: bool, brace_angle: f64) -> bool {
        self.anchors.clear();

        let mut at_notches = anchor_at_notches;
        if at_notches && self.notches.is_empty() {
            log::warn!("no notches to anchor at, defaulting to even placement");
            at_notches = false;
        }

        if at_notches {
            let count = self.notches.len();
            let perimeter = self.denotched.total_len();
            for k in 0..count {
                let here = self.notches[k].distance;
                let next = self.notches[(k + 1) % count].distance;
                let mut between = if count == 1 { perimeter } else { next - here };
                if between < 0.0 {
                    between += perimeter;
                }
                #[allow(clippy::cast_possible_truncation)]
                let n_between = ((between / self.cfg.anchor_span).round() as i64).max(1);
                #[allow(clippy::cast_precision_loss)]
                let spacing = between / n_between as f64;

                for a in 0..n_between {
                    #[allow(clippy::cast_precision_loss)]
                    let d = here + a as f64 * spacing;
                    let Ok((pt, seg, _)) = self.denotched.point_at_distance(d) else {
                        log::warn!("anchor placement failed: empty de-notched path");
                        return false;
                    };
                    let angle = self.denotched.get(seg).map_or(0.0, Segment::angle);
                    self.anchors
                        .push(Anchor::new(pt, seg, angle, brace_angle));
                }
            }
        } else {
            #[allow(clippy::cast_possible_truncation)]
            let count = ((self.ref_outer.total_len() / self.cfg.anchor_span).round() as i64)
                .max(1);
            #[allow(clippy::cast_precision_loss)]
            let spacing = self.ref_inner.total_len() / count as f64;

            for k in 0..count {
                #[allow(clippy::cast_precision_loss)]
                let d = k as f64 * spacing;
                let Ok((pt, seg, _)) = self.ref_inner.point_at_distance(d) else {
                    log::warn!("anchor placement failed: empty reference rim");
                    return false;
                };
                let angle = self.ref_inner.get(seg).map_or(0.0, Segment::angle);
                self.anchors.push(Anchor::new(pt, seg, angle, brace_angle));
            }
        }

        true
    }

    /// Generates the two physical strut edges of every brace by rotating
    /// its bisector by `atan2(girder_width, length)` and bounding the
    /// result forward against the inner rim and backward against the
    /// outer rim. An edge failing either intersection invalidates its
    /// brace.
    pub(crate) fn generate_braces(&mut self) {
        for k in 0..self.anchors.len() {
            for b in 0..2 {
                let direction = if b == 0 { 1.0 } else { -1.0 };

                for l in 0..2 {
                    let mut edge = self.anchors[k].braces[b].ref_seg;
                    let pivot = if l == 0 { edge.start() } else { edge.end() };
                    edge.rotate(&pivot, direction * self.cfg.girder_width.atan2(edge.len()));

                    // Bound forward against the lightening hole.
                    let inner_hits = path_intersections(&self.inner_rim_outer, &edge, true);
                    let Some(inner) = inner_hits.first().copied() else {
                        self.anchors[k].braces[b].valid = false;
                        break;
                    };
                    edge.set_points(edge.start(), inner.point);

                    // Bound backward against the outer rim.
                    edge.reverse();
                    edge.extend_end(1e4);
                    let outer_hits = path_intersections(&self.outer_rim_inner, &edge, false);
                    let Some(outer) = outer_hits.first().copied() else {
                        self.anchors[k].braces[b].valid = false;
                        break;
                    };
                    edge.set_points(edge.start(), outer.point);
                    edge.reverse();

                    self.anchors[k].braces[b].edges[l] = Some(BraceEdge {
                        seg: edge,
                        outer_seg: outer.seg,
                        outer_pt: outer.point,
                        inner_seg: inner.seg,
                        inner_pt: inner.point,
                    });
                }
            }
        }
    }

    /// Where both braces of an anchor are valid but their bisectors
    /// subtend less than the configured minimum angle, invalidates the
    /// longer of the two. Never both, never neither.
    pub(crate) fn invalidate_narrow_brace_pairs(&mut self) {
        let min_angle = self.cfg.min_brace_angle;
        for anchor in &mut self.anchors {
            if !(anchor.braces[0].valid && anchor.braces[1].valid) {
                continue;
            }
            let first = anchor.braces[0].ref_seg;
            let second = anchor.braces[1].ref_seg;
            if first.len() > 0.0 && second.len() > 0.0 {
                let angle = first.angle_to(&second);
                if angle.abs() < min_angle {
                    let longer = usize::from(first.len() <= second.len());
                    anchor.braces[longer].valid = false;
                }
            }
        }
    }

    /// Exhaustive pairwise crossing check over all brace edges,
    /// self-comparisons excluded. On a crossing the brace owning the
    /// longer edge is invalidated. Resolution follows enumeration order;
    /// deterministic but not globally optimal.
    pub(crate) fn invalidate_crossing_braces(&mut self) {
        let count = self.anchors.len();
        for ko in 0..count {
            for bo in 0..2 {
                for lo in 0..2 {
                    for ki in 0..count {
                        for bi in 0..2 {
                            for li in 0..2 {
                                if ko == ki && bo == bi && lo == li {
                                    continue;
                                }
                                if !(self.anchors[ko].braces[bo].valid
                                    && self.anchors[ki].braces[bi].valid)
                                {
                                    continue;
                                }
                                let (Some(outer_edge), Some(inner_edge)) = (
                                    self.anchors[ko].braces[bo].edges[lo],
                                    self.anchors[ki].braces[bi].edges[li],
                                ) else {
                                    continue;
                                };

                                // Pull the ends in so struts that merely
                                // share an endpoint do not count as
                                // crossing.
                                let mut a = outer_edge.seg;
                                a.set_points(
                                    a.point_at(CROSSING_END_SHRINK),
                                    a.point_at(1.0 - CROSSING_END_SHRINK),
                                );
                                let mut b = inner_edge.seg;
                                b.set_points(
                                    b.point_at(CROSSING_END_SHRINK),
                                    b.point_at(1.0 - CROSSING_END_SHRINK),
                                );

                                if a.intersect(&b, false).is_some() {
                                    if a.len() > b.len() {
                                        self.anchors[ko].braces[bo].valid = false;
                                    } else {
                                        self.anchors[ki].braces[bi].valid = false;
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    /// Emits every edge of every still-valid brace.
    pub(crate) fn draw_valid_braces(&mut self) {
        let mut drawn = Vec::new();
        for anchor in &self.anchors {
            for brace in &anchor.braces {
                if brace.valid {
                    for edge in brace.edges.iter().flatten() {
                        drawn.push(edge.seg);
                    }
                }
            }
        }
        for seg in drawn {
            self.brace_lines.push(seg);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::engine::{LiteConfig, LiteEngine};
    use crate::math::Direction;

    fn engine() -> LiteEngine {
        LiteEngine::new(LiteConfig {
            rim_spacing: 6.0,
            outer_width: 2.0,
            inner_width: 2.0,
            girder_width: 2.0,
            anchor_span: 20.0,
            min_brace_angle: 15.0_f64.to_radians(),
            h_split_y: 0.0,
            start_dir: Direction::Left,
        })
    }

    fn anchor_with_brace_angles(long_angle: f64, short_angle: f64) -> Anchor {
        let origin = Point2::new(0.0, 0.0);
        let mut anchor = Anchor::new(origin, SegmentId::default(), 0.0, 0.5);
        anchor.braces[0].ref_seg = Segment::from_polar(origin, 10.0, long_angle);
        anchor.braces[1].ref_seg = Segment::from_polar(origin, 6.0, short_angle);
        anchor
    }

    #[test]
    fn narrow_pair_invalidates_exactly_the_longer() {
        let mut eng = engine();
        // Included angle ~5 degrees, below the 15 degree minimum; brace
        // 0 is the longer.
        eng.anchors
            .push(anchor_with_brace_angles(-1.0, -1.0 + 5.0_f64.to_radians()));

        eng.invalidate_narrow_brace_pairs();
        let anchor = &eng.anchors[0];
        assert!(!anchor.braces[0].valid, "longer brace must be invalidated");
        assert!(anchor.braces[1].valid, "shorter brace must survive");
    }

    #[test]
    fn wide_pair_is_left_alone() {
        let mut eng = engine();
        eng.anchors
            .push(anchor_with_brace_angles(-1.0, -1.0 + 1.0));

        eng.invalidate_narrow_brace_pairs();
        let anchor = &eng.anchors[0];
        assert!(anchor.braces[0].valid);
        assert!(anchor.braces[1].valid);
    }

    #[test]
    fn already_invalid_pairs_are_skipped() {
        let mut eng = engine();
        let mut anchor = anchor_with_brace_angles(-1.0, -1.0 + 5.0_f64.to_radians());
        anchor.braces[1].valid = false;
        eng.anchors.push(anchor);

        eng.invalidate_narrow_brace_pairs();
        assert!(
            eng.anchors[0].braces[0].valid,
            "a lone valid brace is never narrow"
        );
    }

    #[test]
    fn crossing_braces_lose_the_longer() {
        let mut eng = engine();

        let edge = |s0: Point2, s1: Point2| {
            Some(BraceEdge {
                seg: Segment::new(s0, s1),
                outer_seg: SegmentId::default(),
                outer_pt: s0,
                inner_seg: SegmentId::default(),
                inner_pt: s1,
            })
        };

        // Two anchors whose first edges cross mid-air; the first
        // anchor's edge is longer.
        let mut a0 = Anchor::new(Point2::new(0.0, 0.0), SegmentId::default(), 0.0, 0.5);
        a0.braces[0].edges[0] = edge(Point2::new(0.0, 0.0), Point2::new(10.0, 10.0));
        a0.braces[1].valid = false;
        let mut a1 = Anchor::new(Point2::new(0.0, 10.0), SegmentId::default(), 0.0, 0.5);
        a1.braces[0].edges[0] = edge(Point2::new(0.0, 10.0), Point2::new(6.0, 4.0));
        a1.braces[1].valid = false;

        eng.anchors.push(a0);
        eng.anchors.push(a1);
        eng.invalidate_crossing_braces();

        assert!(!eng.anchors[0].braces[0].valid, "longer edge loses");
        assert!(eng.anchors[1].braces[0].valid, "shorter edge survives");
    }

    #[test]
    fn touching_endpoints_do_not_count_as_crossing() {
        let mut eng = engine();

        let edge = |s0: Point2, s1: Point2| {
            Some(BraceEdge {
                seg: Segment::new(s0, s1),
                outer_seg: SegmentId::default(),
                outer_pt: s0,
                inner_seg: SegmentId::default(),
                inner_pt: s1,
            })
        };

        // Two struts meeting at a shared endpoint, as adjacent braces
        // do at their bisector point.
        let mut a0 = Anchor::new(Point2::new(0.0, 0.0), SegmentId::default(), 0.0, 0.5);
        a0.braces[0].edges[0] = edge(Point2::new(0.0, 0.0), Point2::new(5.0, 5.0));
        a0.braces[1].valid = false;
        let mut a1 = Anchor::new(Point2::new(10.0, 0.0), SegmentId::default(), 0.0, 0.5);
        a1.braces[0].edges[0] = edge(Point2::new(10.0, 0.0), Point2::new(5.0, 5.0));
        a1.braces[1].valid = false;

        eng.anchors.push(a0);
        eng.anchors.push(a1);
        eng.invalidate_crossing_braces();

        assert!(eng.anchors[0].braces[0].valid);
        assert!(eng.anchors[1].braces[0].valid);
    }
}
