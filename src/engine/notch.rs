//! Notch detection and removal.
//!
//! A notch is a small square or triangular indentation in the outline,
//! recognised by the signed turning angles of a short run of segments.
//! Detected notches are bridged with one straight segment before
//! offsetting, and their arc-length positions feed notch-aligned anchor
//! placement.

use crate::geometry::Segment;
use crate::math::Point2;
use crate::topology::{Path, SegmentId};

/// Turning angle above which two segments are said to form a corner.
const CORNER_ANGLE: f64 = 20.0 * std::f64::consts::PI / 180.0;

/// A detected notch.
#[derive(Debug, Clone)]
pub struct Notch {
    /// The consecutive segments forming the notch walls.
    pub segments: Vec<SegmentId>,
    /// The bridging segment that replaced the notch, once removed.
    pub replaced: Option<SegmentId>,
    /// Arc-length position of the bridge midpoint around the path.
    pub distance: f64,
    /// Outline point where the notch begins.
    pub begin: Point2,
    /// Outline point where the notch ends.
    pub end: Point2,
}

/// Scans the path for square and triangular notches.
///
/// A square notch is a five-segment signature whose turning angles read
/// `[in, out, out, in]`, a triangular notch `[in, out, in]`, with "in"
/// and "out" meaning turns sharper than the corner angle in either
/// direction.
#[must_use]
pub fn detect_notches(path: &Path) -> Vec<Notch> {
    let n = path.len();
    let mut notches = Vec::new();
    if n < 4 {
        return notches;
    }

    let ids: Vec<SegmentId> = path.ids().collect();
    let segs: Vec<Segment> = path.iter().map(|(_, s)| *s).collect();

    for pos in 0..n {
        let window: Vec<usize> = (0..5).map(|k| (pos + k) % n).collect();
        let mut angles = [0.0_f64; 4];
        for k in 0..4 {
            let a = &segs[window[k]];
            let b = &segs[window[k + 1]];
            angles[k] = if a.len() > 0.0 && b.len() > 0.0 {
                a.angle_to(b)
            } else {
                0.0
            };
        }

        if angles[0] < -CORNER_ANGLE
            && angles[1] > CORNER_ANGLE
            && angles[2] > CORNER_ANGLE
            && angles[3] < -CORNER_ANGLE
        {
            notches.push(Notch {
                segments: vec![ids[window[1]], ids[window[2]], ids[window[3]]],
                replaced: None,
                distance: 0.0,
                begin: segs[window[0]].end(),
                end: segs[window[4]].start(),
            });
        } else if angles[0] < -CORNER_ANGLE && angles[1] > CORNER_ANGLE && angles[2] < -CORNER_ANGLE
        {
            notches.push(Notch {
                segments: vec![ids[window[1]], ids[window[2]]],
                replaced: None,
                distance: 0.0,
                begin: segs[window[0]].end(),
                end: segs[window[3]].start(),
            });
        }
    }

    notches
}

/// Detects all notches and replaces each with a single straight bridging
/// segment, recording the bridge's mid-arc-length position for later
/// anchor placement.
pub fn remove_notches(path: &mut Path) -> Vec<Notch> {
    let mut notches = detect_notches(path);

    for notch in &mut notches {
        let mut first = true;
        for &id in &notch.segments {
            if first {
                if let Ok(seg) = path.get_mut(id) {
                    seg.set_points(notch.begin, notch.end);
                    notch.replaced = Some(id);
                }
                first = false;
            } else if path.remove(id).is_err() {
                log::debug!("notch wall already removed by an overlapping notch");
            }
        }
    }

    path.regularise();

    // The bridge positions are only meaningful after the path has been
    // re-stitched.
    for notch in &mut notches {
        let Some(bridge) = notch.replaced else {
            continue;
        };
        match path.position(bridge) {
            Ok(pos) => {
                let mut walked = 0.0;
                for p in 0..pos {
                    walked += path.seg_at(p).len();
                }
                walked += path.seg_at(pos).len() / 2.0;
                notch.distance = walked;
            }
            Err(_) => {
                log::warn!("notch bridge lost while regularising");
                notch.replaced = None;
            }
        }
    }

    notches
}
