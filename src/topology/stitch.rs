//! Stitches unordered, arbitrarily oriented segments into contiguous
//! open/closed paths and canonicalizes winding.

use std::f64::consts::PI;

use super::path::Path;
use crate::math::{angle_between, dist, is_equal_within_percentage, SNAP_LEN};

/// A contiguous run of segments produced by [`Path::make_path`], given as
/// a half-open range of traversal positions.
#[derive(Debug, Clone, Copy)]
pub struct SubPath {
    pub start: usize,
    pub end: usize,
    pub closed: bool,
}

impl Path {
    /// Partitions the segment set into maximal contiguous sub-paths using
    /// the default snap length, forcing closed sub-paths clockwise.
    pub fn make_path(&mut self) -> Vec<SubPath> {
        self.make_path_with(SNAP_LEN, true)
    }

    /// Partitions the segment set into maximal contiguous sub-paths.
    ///
    /// Segments are reordered in place so each sub-path occupies a
    /// contiguous run of traversal positions. Closed sub-paths are forced
    /// to clockwise winding. With `keep_opens` unset, an open run is
    /// collapsed to its final segment (isolated single segments survive,
    /// longer dangling chains are discarded).
    ///
    /// # Panics
    ///
    /// Panics if a sub-path that closed before winding reversal cannot be
    /// re-closed afterwards; that is a kernel invariant violation, not a
    /// property of the input.
    pub fn make_path_with(&mut self, snap: f64, keep_opens: bool) -> Vec<SubPath> {
        let mut subs = Vec::new();
        let mut start = 0;

        while start < self.order_slice().len() {
            let (end, closed) = self.trace_a_path(snap, start);

            if closed {
                let end = if self.is_clockwise_range(start, end) {
                    end
                } else {
                    for pos in start..end {
                        self.seg_at_mut(pos).reverse();
                    }
                    let (end, reclosed) = self.trace_a_path(snap, start);
                    assert!(
                        reclosed,
                        "unable to re-close a path after reversing its segments"
                    );
                    end
                };
                subs.push(SubPath {
                    start,
                    end,
                    closed: true,
                });
                start = end;
            } else if keep_opens {
                subs.push(SubPath {
                    start,
                    end,
                    closed: false,
                });
                start = end;
            } else {
                // Collapse the open run to its final segment.
                for _ in start..end - 1 {
                    self.drop_segment_at(start);
                }
                start += 1;
            }
        }

        subs
    }

    /// Greedily grows a path from the segment at traversal position
    /// `start`, scanning the remaining unassigned segments for one whose
    /// either endpoint matches an open end of the growing path within
    /// `snap`. Reversed matches are flipped in place; matched endpoints
    /// are snapped exactly to kill floating drift. Returns the position
    /// one past the path's last segment, and whether the path closed back
    /// onto its own start point.
    fn trace_a_path(&mut self, snap: f64, start: usize) -> (usize, bool) {
        let mut end = start + 1;
        let mut scan = end;

        while scan < self.order_slice().len() {
            let path_end = self.seg_at(end - 1).end();
            let path_start = self.seg_at(start).start();

            // Connected to the path end, but reversed?
            if dist(&path_end, &self.seg_at(scan).end()) <= snap {
                self.seg_at_mut(scan).reverse();
            }

            // Correctly connected to the path end?
            if dist(&path_end, &self.seg_at(scan).start()) <= snap {
                let far = self.seg_at(scan).end();
                self.seg_at_mut(scan).set_points(path_end, far);

                let id = self.order_remove(scan);
                self.order_insert(end, id);
                end += 1;

                // Does it close the path?
                if dist(&path_start, &far) <= snap {
                    let near = self.seg_at(end - 1).start();
                    self.seg_at_mut(end - 1).set_points(near, path_start);
                    return (end, true);
                }

                scan = end;
                continue;
            }

            // Connected to the path start, but reversed?
            if dist(&path_start, &self.seg_at(scan).start()) <= snap {
                self.seg_at_mut(scan).reverse();
            }

            // Connected to the path start?
            if dist(&path_start, &self.seg_at(scan).end()) <= snap {
                let near = self.seg_at(scan).start();
                self.seg_at_mut(scan).set_points(near, path_start);

                let id = self.order_remove(scan);
                self.order_insert(start, id);
                end += 1;

                scan = end;
                continue;
            }

            scan += 1;
        }

        (end, false)
    }

    /// Tests whether the closed sub-path at traversal positions
    /// `[start, end)` winds clockwise.
    ///
    /// The signed turning angles around the loop are accumulated; when
    /// their magnitude lies within 5% of `2*PI` the sign decides. Outside
    /// that tolerance (a probable self-intersecting or multiply-wound
    /// shape) a positive/negative turn counter decides instead and a
    /// warning is logged; such shapes are unsupported input and the
    /// counter is an approximation, not a winding-number computation.
    pub(crate) fn is_clockwise_range(&self, start: usize, end: usize) -> bool {
        let mut acc = 0.0;
        let mut pos_neg = 0i64;
        let mut prev = end - 1;

        for pos in start..end {
            if self.seg_at(prev).len() > 0.0 && self.seg_at(pos).len() > 0.0 {
                let ang =
                    angle_between(&self.seg_at(prev).vector(), &self.seg_at(pos).vector());
                pos_neg += if ang >= 0.0 { 1 } else { -1 };
                acc += ang;
                prev = pos;
            }
        }

        if is_equal_within_percentage(2.0 * PI, acc.abs(), 5.0) {
            acc < 0.0
        } else {
            log::warn!(
                "turning-angle sum {acc:.2} is not a 2*PI multiple; \
                 falling back to the turn counter ({pos_neg})"
            );
            pos_neg < 0
        }
    }

    /// Restores the path invariants: stitches sub-paths, removes duplicate
    /// and zero-length segments, and repeats to a fixpoint since deletions
    /// can reopen tiny gaps. Dangling open chains are collapsed.
    pub fn regularise(&mut self) {
        loop {
            self.make_path_with(SNAP_LEN, false);
            if self.remove_duplicates() + self.remove_zero_len() == 0 {
                return;
            }
        }
    }

    /// As [`Path::regularise`] but deletes nothing: reorders and
    /// canonicalizes winding only.
    pub fn regularise_keep_open(&mut self) {
        self.make_path_with(SNAP_LEN, true);
    }
}
