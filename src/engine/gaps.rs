//! Opening the rim gaps where bracing struts pass through.

use crate::error::Result;
use crate::math::Point2;
use crate::operations::make_gap;
use crate::topology::SegmentId;

use super::LiteEngine;

/// One gap interval on a rim, bounded by two strut-edge crossings.
#[derive(Debug, Clone, Copy)]
struct GapSpan {
    l0: SegmentId,
    p0: Point2,
    l1: SegmentId,
    p1: Point2,
}

impl LiteEngine {
    /// Derives the ordered gap intervals one rim owes to the valid
    /// braces, merges adjacent and overlapping intervals (including
    /// across the path's start/end seam), and applies them.
    ///
    /// `inner_not_outer` selects the lightening-hole boundary instead of
    /// the outer rim's inner boundary.
    ///
    /// # Errors
    ///
    /// Returns a stale-handle error if a recorded crossing no longer
    /// refers to a live rim segment.
    pub(crate) fn open_brace_gaps(&mut self, inner_not_outer: bool) -> Result<()> {
        let mut gaps: Vec<GapSpan> = Vec::new();

        for anchor in &self.anchors {
            for (b, brace) in anchor.braces.iter().enumerate() {
                if !brace.valid {
                    continue;
                }
                let (Some(leading), Some(trailing)) =
                    (brace.edges[(b + 1) % 2], brace.edges[b])
                else {
                    continue;
                };
                gaps.push(if inner_not_outer {
                    GapSpan {
                        l0: leading.inner_seg,
                        p0: leading.inner_pt,
                        l1: trailing.inner_seg,
                        p1: trailing.inner_pt,
                    }
                } else {
                    GapSpan {
                        l0: leading.outer_seg,
                        p0: leading.outer_pt,
                        l1: trailing.outer_seg,
                        p1: trailing.outer_pt,
                    }
                });
            }
        }

        let rim = if inner_not_outer {
            &mut self.inner_rim_outer
        } else {
            &mut self.outer_rim_inner
        };

        // Coalesce overlapping adjacent intervals; overlaps would make
        // the gap surgery delete material it should keep.
        loop {
            let mut removed = 0;
            let mut g = 0;
            while gaps.len() >= 2 && g < gaps.len() {
                let next = (g + 1) % gaps.len();
                let next_start = rim.position(gaps[next].l0)?;
                let this_end = rim.position(gaps[g].l1)?;
                let half = rim.len() / 2;

                if this_end > half && next_start < half {
                    // The pair straddles the seam; not an overlap.
                    g += 1;
                    continue;
                }
                if next_start > this_end {
                    g += 1;
                    continue;
                }
                if next_start == this_end {
                    let t_end = rim.get(gaps[g].l1)?.t_for_point(&gaps[g].p1);
                    let t_start = rim.get(gaps[next].l0)?.t_for_point(&gaps[next].p0);
                    if t_end < t_start {
                        g += 1;
                        continue;
                    }
                }

                gaps[g].l1 = gaps[next].l1;
                gaps[g].p1 = gaps[next].p1;
                gaps.remove(next);
                if next < g {
                    g -= 1;
                }
                removed += 1;
            }
            if removed == 0 {
                break;
            }
        }

        for gap in &gaps {
            make_gap(rim, gap.l0, gap.p0, gap.l1, gap.p1, true)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::engine::anchor::{Anchor, BraceEdge};
    use crate::engine::{LiteConfig, LiteEngine};
    use crate::geometry::Segment;
    use crate::math::Direction;
    use crate::topology::Path;

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

    /// A long horizontal rim strip split into 1mm segments.
    fn strip(len: usize) -> Path {
        let mut p = Path::new();
        #[allow(clippy::cast_precision_loss)]
        for k in 0..len {
            p.push_points(
                Point2::new(k as f64, 0.0),
                Point2::new(k as f64 + 1.0, 0.0),
            );
        }
        p
    }

    fn anchor_with_gap(
        rim: &Path,
        seg0: usize,
        x0: f64,
        seg1: usize,
        x1: f64,
    ) -> Anchor {
        let ids: Vec<SegmentId> = rim.ids().collect();
        let edge = |seg: SegmentId, x: f64| {
            Some(BraceEdge {
                seg: Segment::new(Point2::new(x, 10.0), Point2::new(x, 0.0)),
                outer_seg: seg,
                outer_pt: Point2::new(x, 0.0),
                inner_seg: seg,
                inner_pt: Point2::new(x, 0.0),
            })
        };
        // For brace 0 the leading edge is edges[(0 + 1) % 2] = edges[1],
        // so the earlier crossing goes there.
        let mut anchor = Anchor::new(Point2::new(x0, 10.0), SegmentId::default(), 0.0, 0.5);
        anchor.braces[0].edges[1] = edge(ids[seg0], x0);
        anchor.braces[0].edges[0] = edge(ids[seg1], x1);
        anchor.braces[1].valid = false;
        anchor
    }

    #[test]
    fn disjoint_gaps_open_independently() {
        let mut eng = engine();
        eng.outer_rim_inner = strip(20);
        let rim = eng.outer_rim_inner.clone();

        eng.anchors.push(anchor_with_gap(&rim, 2, 2.3, 5, 5.7));
        eng.anchors.push(anchor_with_gap(&rim, 8, 8.2, 11, 11.6));

        eng.open_brace_gaps(false).unwrap();

        // Segments strictly inside each gap are gone, boundary segments
        // are truncated.
        assert_eq!(eng.outer_rim_inner.len(), 20 - 4);
        let total = eng.outer_rim_inner.total_len();
        assert!((total - (20.0 - 2.0 * 3.4)).abs() < 1e-9, "got {total}");
    }

    #[test]
    fn overlapping_gaps_are_merged() {
        let mut eng = engine();
        eng.outer_rim_inner = strip(20);
        let rim = eng.outer_rim_inner.clone();

        // Two overlapping intervals: [4.5, 8.5] and [6.5, 11.5].
        eng.anchors.push(anchor_with_gap(&rim, 4, 4.5, 8, 8.5));
        eng.anchors.push(anchor_with_gap(&rim, 6, 6.5, 11, 11.5));

        eng.open_brace_gaps(false).unwrap();

        // Merged into one gap [4.5, 11.5]: segments 5..11 are deleted.
        assert_eq!(eng.outer_rim_inner.len(), 20 - 6);
    }

    #[test]
    fn stale_crossing_is_an_error() {
        let mut eng = engine();
        eng.outer_rim_inner = strip(10);
        let rim = eng.outer_rim_inner.clone();
        eng.anchors.push(anchor_with_gap(&rim, 2, 2.3, 3, 3.7));

        let ids: Vec<SegmentId> = eng.outer_rim_inner.ids().collect();
        eng.outer_rim_inner.remove(ids[2]).unwrap();

        assert!(eng.open_brace_gaps(false).is_err());
    }
}
