//! Signed offset contour tracing (polygon erosion/dilation).
//!
//! Produces a new closed path at a perpendicular distance from an
//! existing one: positive distances trace outside the shape, negative
//! distances inside. The result is best-effort for extreme distances;
//! callers re-regularise downstream.

use std::f64::consts::{FRAC_PI_2, TAU};

use crate::geometry::Segment;
use crate::math::{same_point, Vector2, SNAP_LEN};
use crate::topology::Path;

/// Maximum length of one trace step along a segment, in mm.
const TRACE_STEP_MM: f64 = 0.5;

/// Minimum number of trace steps per segment.
const MIN_TRACE_STEPS: usize = 4;

/// Angular increment of the corner fans, 3 degrees.
const FAN_STEP: f64 = 3.0 * std::f64::consts::PI / 180.0;

/// An offsetting line produced while tracing: runs from a point on the
/// source path to its offset image. Consumed entirely within one trace.
#[derive(Debug, Clone, Copy)]
struct OffsetCandidate {
    seg: Segment,
    valid: bool,
    radial: bool,
    src: usize,
}

/// Traces `path` at the signed `offset`: every point of the path moves
/// `|offset|` perpendicular to the local tangent, outward for positive
/// offsets, inward for negative ones. The input is canonicalized
/// (regularised, clockwise) before tracing; the result is a new,
/// regularised path.
///
/// The offset can pinch a narrow inlet closed, in which case the
/// affected region simply vanishes from the result.
#[must_use]
pub fn trace_at_offset(path: &Path, offset: f64) -> Path {
    let mut canon = path.clone();
    canon.regularise();

    let segs: Vec<Segment> = canon.iter().map(|(_, s)| *s).collect();
    let mut candidates = build_candidates(&segs, offset);

    invalidate_by_proximity(&mut candidates, &segs, offset);
    invalidate_crossings(&mut candidates);
    collapse_redundant_runs(&mut candidates);

    // Join the surviving offset points in traversal order.
    let mut traced = Path::new();
    for cand in candidates.iter().filter(|c| c.valid) {
        traced.add_point(cand.seg.end());
    }
    if traced.is_empty() {
        return traced;
    }

    // Close the ring.
    if let (Some(sp), Some(ep)) = (traced.start_point(), traced.end_point()) {
        if !same_point(&sp, &ep) {
            traced.push_points(ep, sp);
        }
    }
    traced.regularise();
    traced
}

/// Builds the linear per-segment candidates and the convex-corner fans.
fn build_candidates(segs: &[Segment], offset: f64) -> Vec<OffsetCandidate> {
    let mut candidates = Vec::new();
    let n = segs.len();

    for (pos, seg) in segs.iter().enumerate() {
        if seg.len() < SNAP_LEN {
            continue;
        }

        // Linear offsetting lines, sampled at sub-segment steps.
        let mut shifted = *seg;
        shifted.offset_sideways(offset);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let steps = ((seg.len() / TRACE_STEP_MM).ceil() as usize).max(MIN_TRACE_STEPS);
        for step in 0..=steps {
            #[allow(clippy::cast_precision_loss)]
            let mut t = step as f64 / steps as f64;
            if step == 0 {
                t = 1e-6;
            } else if step == steps {
                t = 0.999_999;
            }
            candidates.push(OffsetCandidate {
                seg: Segment::new(seg.point_at(t), shifted.point_at(t)),
                valid: true,
                radial: false,
                src: pos,
            });
        }

        // Corner fan at the joint with the next segment, for convex
        // corners only: a run of short radial lines swept between the
        // two adjacent directions approximates the round corner a true
        // offset has. Concave corners need no extra points.
        let next = &segs[(pos + 1) % n];
        if next.len() == 0.0 {
            continue;
        }
        let mut a0 = seg.angle();
        let mut a1 = next.angle();
        let turn = seg.angle_to(next);

        #[allow(clippy::cast_possible_truncation)]
        let fan_steps = (turn.abs() / FAN_STEP).floor() as i64;
        let signed_step;
        if turn > 0.0 && offset < 0.0 {
            a0 -= FRAC_PI_2;
            a1 -= FRAC_PI_2;
            while a0 < 0.0 {
                a0 += TAU;
            }
            while a1 < a0 {
                a1 += TAU;
            }
            signed_step = FAN_STEP;
        } else if turn < 0.0 && offset > 0.0 {
            a0 += FRAC_PI_2;
            a1 += FRAC_PI_2;
            while a0 > 0.0 {
                a0 -= TAU;
            }
            while a1 > a0 {
                a1 -= TAU;
            }
            signed_step = -FAN_STEP;
        } else {
            continue;
        }

        for k in 1..fan_steps {
            let mut radial =
                Segment::from_vector(seg.end(), Vector2::new(offset.abs(), 0.0));
            #[allow(clippy::cast_precision_loss)]
            radial.rotate(&radial.start(), a0 + k as f64 * signed_step);
            // Shorten at the origin end so the fan lines do not cross
            // each other at the shared corner point.
            radial.set_points(radial.point_at(0.001), radial.end());
            candidates.push(OffsetCandidate {
                seg: radial,
                valid: true,
                radial: true,
                src: pos,
            });
        }
    }

    candidates
}

/// Invalidates candidates whose offset point has re-entered forbidden
/// space: closer than `|offset|` to any source segment other than its
/// own.
fn invalidate_by_proximity(candidates: &mut [OffsetCandidate], segs: &[Segment], offset: f64) {
    let limit = offset.abs();
    for cand in candidates.iter_mut() {
        let tip = cand.seg.end();
        for (pos, seg) in segs.iter().enumerate() {
            if pos != cand.src && seg.distance_to_point(&tip) < limit {
                cand.valid = false;
                break;
            }
        }
    }
}

/// Invalidates candidates crossed by another still-valid candidate.
/// Pairs are tested in traversal order and the first-found candidate of
/// a crossing pair loses; deterministic, not globally optimal.
fn invalidate_crossings(candidates: &mut [OffsetCandidate]) {
    for i in 0..candidates.len() {
        for j in i + 1..candidates.len() {
            if candidates[i].valid
                && candidates[j].valid
                && candidates[i]
                    .seg
                    .intersect(&candidates[j].seg, false)
                    .is_some()
            {
                candidates[i].valid = false;
                break;
            }
        }
    }
}

/// Collapses every run of 3 or more consecutive valid, non-radial
/// candidates sharing one source segment down to its two endpoints.
fn collapse_redundant_runs(candidates: &mut [OffsetCandidate]) {
    let n = candidates.len();
    let mut run_start = 0;
    while run_start < n {
        let c = &candidates[run_start];
        if !c.valid || c.radial {
            run_start += 1;
            continue;
        }
        let src = c.src;
        let mut run_end = run_start + 1;
        while run_end < n {
            let c = &candidates[run_end];
            if !c.valid || c.radial || c.src != src {
                break;
            }
            run_end += 1;
        }
        for mid in run_start + 1..run_end.saturating_sub(1) {
            candidates[mid].valid = false;
        }
        run_start = run_end;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point2;

    /// Clockwise square with power-of-two coordinates so the expected
    /// offset arithmetic is exact.
    fn square(side: f64) -> Path {
        let mut p = Path::new();
        p.push_points(Point2::new(0.0, 0.0), Point2::new(0.0, side));
        p.push_points(Point2::new(0.0, side), Point2::new(side, side));
        p.push_points(Point2::new(side, side), Point2::new(side, 0.0));
        p.push_points(Point2::new(side, 0.0), Point2::new(0.0, 0.0));
        p
    }

    fn regular_polygon(sides: usize, radius: f64) -> Path {
        let mut p = Path::new();
        #[allow(clippy::cast_precision_loss)]
        let pts: Vec<Point2> = (0..sides)
            .map(|k| {
                let phi = TAU * k as f64 / sides as f64;
                Point2::new(radius * phi.cos(), radius * phi.sin())
            })
            .collect();
        for k in 0..sides {
            p.push_points(pts[k], pts[(k + 1) % sides]);
        }
        p
    }

    fn min_distance_to_path(path: &Path, pt: &Point2) -> f64 {
        path.iter()
            .map(|(_, s)| s.distance_to_point(pt))
            .fold(f64::INFINITY, f64::min)
    }

    #[test]
    fn square_inward_offset_is_exact() {
        let traced = trace_at_offset(&square(16.0), -4.0);
        assert!(traced.is_closed());

        let bb = traced.aabb().unwrap();
        assert_eq!(bb.min.x.to_bits(), 4.0_f64.to_bits());
        assert_eq!(bb.min.y.to_bits(), 4.0_f64.to_bits());
        assert_eq!(bb.max.x.to_bits(), 12.0_f64.to_bits());
        assert_eq!(bb.max.y.to_bits(), 12.0_f64.to_bits());

        // Collinear vertices collapse to exactly the four sides.
        let mut simplified = traced;
        simplified.simplify();
        assert_eq!(simplified.len(), 4);
        assert!((simplified.total_len() - 32.0).abs() < 1e-9);
        for (_, seg) in simplified.iter() {
            for pt in [seg.start(), seg.end()] {
                assert!(
                    ((pt.x - 4.0).abs() < 1e-9 || (pt.x - 12.0).abs() < 1e-9)
                        && ((pt.y - 4.0).abs() < 1e-9 || (pt.y - 12.0).abs() < 1e-9),
                    "vertex {pt:?} is not a corner of the shrunk square"
                );
            }
        }
    }

    #[test]
    fn square_outward_offset_grows() {
        let traced = trace_at_offset(&square(16.0), 2.0);
        assert!(traced.is_closed());
        let bb = traced.aabb().unwrap();
        assert!((bb.min.x + 2.0).abs() < 0.1);
        assert!((bb.max.x - 18.0).abs() < 0.1);
        // Outward corners are rounded by the fans, so the perimeter is
        // strictly between the square's and its Minkowski sum's.
        let len = traced.total_len();
        assert!(len > 64.0 && len < 64.0 + TAU * 2.0 + 0.5, "len={len}");
    }

    #[test]
    fn offset_round_trip_recovers_silhouette() {
        for sides in [3_usize, 4, 6] {
            let original = regular_polygon(sides, 10.0);
            let eroded = trace_at_offset(&original, -1.0);
            assert!(eroded.is_closed(), "{sides}-gon erosion must stay closed");
            let recovered = trace_at_offset(&eroded, 1.0);
            assert!(recovered.is_closed());

            // Every recovered point lies on the original silhouette up
            // to the corner-rounding the fan approximation introduces
            // (worst at the triangle's 60 degree corners).
            for (_, seg) in recovered.iter() {
                let d = min_distance_to_path(&original, &seg.start());
                assert!(
                    d < 0.6,
                    "{sides}-gon round-trip point strays {d} from the outline"
                );
            }
            let perimeter_ratio = recovered.total_len() / original.total_len();
            assert!(
                (perimeter_ratio - 1.0).abs() < 0.05,
                "{sides}-gon round-trip perimeter off by {perimeter_ratio}"
            );
        }
    }

    #[test]
    fn degenerate_segments_are_skipped() {
        let mut p = square(16.0);
        p.push_points(Point2::new(5.0, 5.0), Point2::new(5.0, 5.0));
        let traced = trace_at_offset(&p, -4.0);
        assert!(traced.is_closed());
        let bb = traced.aabb().unwrap();
        assert!((bb.min.x - 4.0).abs() < 1e-9);
    }

    #[test]
    fn collapse_on_empty_result() {
        // Inward offset bigger than the half-width erases the shape.
        let traced = trace_at_offset(&square(4.0), -8.0);
        assert!(traced.is_empty());
    }
}
