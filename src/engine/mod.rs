//! The constructive lightening pipeline: turns a closed outline into an
//! outer material rim, an inner lightening hole and, optionally, a
//! validated lattice of diagonal bracing struts between them.

pub mod anchor;
pub mod gaps;
pub mod notch;

use std::f64::consts::FRAC_PI_2;

use crate::geometry::Segment;
use crate::math::{Direction, Point2, Vector2};
use crate::operations::intersect::start_at_direction;
use crate::operations::split::split_along_line_rejoin;
use crate::operations::{paths_intersect, trace_at_offset};
use crate::topology::Path;

pub use anchor::{Anchor, Brace, BraceEdge};
pub use notch::Notch;

/// Visual clearance inserted between split halves, in mm.
const SPLIT_CLEARANCE_MM: f64 = 5.0;

/// Number of progress steps reported per run.
pub const PROGRESS_STEPS: u32 = 8;

/// Receives one notification per completed macro-stage of a run, with a
/// monotonically increasing step counter (`1..=PROGRESS_STEPS`).
pub trait ProgressSink {
    fn step(&mut self, step: u32);
}

/// Geometry parameters of the lightening pipeline. All lengths in mm,
/// angles in radians.
#[derive(Debug, Clone)]
pub struct LiteConfig {
    /// Spacing between the outer rim and the lightening hole.
    pub rim_spacing: f64,
    /// Width of the outer material rim.
    pub outer_width: f64,
    /// Width of the inner material rim when girdering.
    pub inner_width: f64,
    /// Width of one girder bracing strut.
    pub girder_width: f64,
    /// Target arc-length spacing between anchors.
    pub anchor_span: f64,
    /// Minimum included angle between the two braces of an anchor.
    pub min_brace_angle: f64,
    /// Height of the horizontal split line.
    pub h_split_y: f64,
    /// Compass point at which the reference rim starts.
    pub start_dir: Direction,
}

/// Feature toggles of one run.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteFeatures {
    pub lighten: bool,
    pub notch_detect: bool,
    pub girder: bool,
    pub show_construction: bool,
    pub anchor_at_notches: bool,
    pub h_split: bool,
    pub v_split: bool,
}

/// Result of a run: the composite output path and whether every stage
/// completed cleanly. A degraded run (`ok == false`) still carries the
/// partial result.
#[derive(Debug)]
pub struct RunOutcome {
    pub path: Path,
    pub ok: bool,
}

/// The lightening engine. One instance runs one outline at a time; no
/// state persists between runs.
pub struct LiteEngine {
    pub(crate) cfg: LiteConfig,

    pub(crate) input: Path,
    pub(crate) denotched: Path,
    /// Outer rim, outer boundary (the outline itself).
    pub(crate) outer_rim_outer: Path,
    /// Outer rim, inner boundary.
    pub(crate) outer_rim_inner: Path,
    /// Reference outline, de-notched when notch detection is on.
    pub(crate) ref_outer: Path,
    /// Inner reference derived from the reference outline.
    pub(crate) ref_inner: Path,
    /// Inner rim, outer boundary; the lightening hole when girdering is
    /// off.
    pub(crate) inner_rim_outer: Path,
    /// Inner rim, inner boundary.
    pub(crate) inner_rim_inner: Path,
    /// Construction geometry, emitted when requested.
    pub(crate) construction: Path,
    /// The validated girder bracing struts.
    pub(crate) brace_lines: Path,

    pub(crate) notches: Vec<Notch>,
    pub(crate) anchors: Vec<Anchor>,
}

impl LiteEngine {
    /// Creates an engine with the given configuration.
    #[must_use]
    pub fn new(cfg: LiteConfig) -> Self {
        Self {
            cfg,
            input: Path::new(),
            denotched: Path::new(),
            outer_rim_outer: Path::new(),
            outer_rim_inner: Path::new(),
            ref_outer: Path::new(),
            ref_inner: Path::new(),
            inner_rim_outer: Path::new(),
            inner_rim_inner: Path::new(),
            construction: Path::new(),
            brace_lines: Path::new(),
            notches: Vec::new(),
            anchors: Vec::new(),
        }
    }

    /// The anchors of the most recent run.
    #[must_use]
    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    /// The notches detected by the most recent run.
    #[must_use]
    pub fn notches(&self) -> &[Notch] {
        &self.notches
    }

    /// Runs the pipeline on `input`.
    ///
    /// `clearance` optionally bounds the inner-rim spacing growth in
    /// addition to the pipeline's own reference rim. `sink`, when given,
    /// receives exactly [`PROGRESS_STEPS`] notifications.
    ///
    /// An unusable input (2 or fewer segments after regularisation)
    /// returns immediately with the unmodified input and `ok == false`.
    /// Any other stage failure degrades the affected feature and the run
    /// continues with a partial result.
    pub fn run(
        &mut self,
        input: &Path,
        features: LiteFeatures,
        clearance: Option<&Path>,
        mut sink: Option<&mut dyn ProgressSink>,
    ) -> RunOutcome {
        self.reset();
        let mut ok = true;
        let mut step = 0u32;

        self.input = input.clone();
        self.input.regularise();
        if self.input.len() <= 2 {
            log::warn!("input does not describe a usable shape");
            return RunOutcome {
                path: input.clone(),
                ok: false,
            };
        }

        self.build_outer_rim_outer(features.notch_detect);
        Self::progress(&mut sink, &mut step);

        if features.girder && !self.build_outer_rim_inner() {
            ok = false;
        }
        Self::progress(&mut sink, &mut step);

        if features.lighten {
            // The spacing growth must check against the rim the braces
            // will actually meet.
            let own = if features.girder {
                self.outer_rim_inner.clone()
            } else {
                self.outer_rim_outer.clone()
            };
            self.build_inner_rim_outer(&own, clearance);
        }
        Self::progress(&mut sink, &mut step);

        let separation = if features.girder {
            self.cfg.inner_width
        } else {
            0.0
        };
        self.build_inner_rim_inner(separation);
        Self::progress(&mut sink, &mut step);

        let mut anchors_ok = false;
        if features.girder {
            anchors_ok = self.generate_anchor_points(features.anchor_at_notches);
            if !anchors_ok {
                ok = false;
            }
        }
        Self::progress(&mut sink, &mut step);

        if features.girder && anchors_ok {
            self.generate_braces();
            self.invalidate_narrow_brace_pairs();
            self.invalidate_crossing_braces();
            self.draw_valid_braces();
            if let Err(e) = self.open_brace_gaps(false) {
                log::warn!("opening outer rim gaps failed: {e}");
                ok = false;
            }
            if let Err(e) = self.open_brace_gaps(true) {
                log::warn!("opening inner rim gaps failed: {e}");
                ok = false;
            }
        }
        Self::progress(&mut sink, &mut step);

        // Assemble the composite: outline boundaries plus the gapped
        // rims and struts.
        let mut outline = self.outer_rim_outer.clone();
        outline.extend_from(&self.inner_rim_inner);
        let mut inners = self.outer_rim_inner.clone();
        inners.extend_from(&self.inner_rim_outer);
        inners.extend_from(&self.brace_lines);
        Self::progress(&mut sink, &mut step);

        if features.girder {
            if features.h_split {
                Self::girder_hsplit(
                    &mut outline,
                    &mut inners,
                    self.cfg.h_split_y,
                    self.cfg.outer_width,
                );
            }
            if features.v_split {
                Self::girder_vsplit(&mut outline, &mut inners, self.cfg.outer_width);
            }
        } else {
            if features.h_split {
                self.simple_hsplit(&mut outline);
            }
            if features.v_split {
                Self::simple_vsplit(&mut outline);
            }
        }

        let mut out = outline;
        if features.girder {
            out.append(inners);
        }
        if features.show_construction {
            out.extend_from(&self.construction);
        }
        Self::progress(&mut sink, &mut step);

        RunOutcome { path: out, ok }
    }

    fn reset(&mut self) {
        self.input = Path::new();
        self.denotched = Path::new();
        self.outer_rim_outer = Path::new();
        self.outer_rim_inner = Path::new();
        self.ref_outer = Path::new();
        self.ref_inner = Path::new();
        self.inner_rim_outer = Path::new();
        self.inner_rim_inner = Path::new();
        self.construction = Path::new();
        self.brace_lines = Path::new();
        self.notches.clear();
        self.anchors.clear();
    }

    fn progress(sink: &mut Option<&mut dyn ProgressSink>, step: &mut u32) {
        *step += 1;
        if let Some(s) = sink.as_mut() {
            s.step(*step);
        }
    }

    // --- Rim construction stages ---

    fn build_outer_rim_outer(&mut self, notch_detect: bool) {
        self.outer_rim_outer = self.input.clone();
        self.denotched = self.input.clone();
        self.notches = notch::remove_notches(&mut self.denotched);

        if notch_detect {
            self.ref_outer = self.denotched.clone();
            self.construction.extend_from(&self.ref_outer);
        } else {
            self.ref_outer = self.input.clone();
        }
    }

    fn build_outer_rim_inner(&mut self) -> bool {
        self.outer_rim_inner = trace_at_offset(&self.input, -self.cfg.outer_width);

        self.ref_inner = trace_at_offset(&self.ref_outer, -self.cfg.outer_width);
        let mut ok = true;
        if let Err(e) = start_at_direction(&mut self.ref_inner, self.cfg.start_dir) {
            log::warn!("reference rim start direction: {e}");
            ok = false;
        }
        self.ref_inner.regularise();
        ok
    }

    /// Traces the lightening-hole boundary, growing the rim spacing in
    /// 1 mm increments until it clears both the pipeline's own rim and
    /// any caller-supplied clearance path.
    fn build_inner_rim_outer(&mut self, own: &Path, extra: Option<&Path>) {
        let mut additional = 0.0;
        loop {
            let spacing = -(self.cfg.rim_spacing + additional);
            self.inner_rim_outer = trace_at_offset(&self.ref_outer, spacing);
            let blocked = paths_intersect(&self.inner_rim_outer, own)
                || extra.is_some_and(|c| paths_intersect(&self.inner_rim_outer, c));
            if !blocked {
                break;
            }
            additional += 1.0;
        }
        if additional > 0.0 {
            log::debug!("rim spacing grown by {additional} mm to clear obstructions");
        }
    }

    fn build_inner_rim_inner(&mut self, separation: f64) {
        self.inner_rim_inner = trace_at_offset(&self.inner_rim_outer, -separation);
    }

    // --- Split orchestration ---

    fn simple_hsplit(&self, o: &mut Path) {
        let cut = Segment::from_vector(
            Point2::new(0.0, self.cfg.h_split_y),
            Vector2::new(1.0, 0.0),
        );
        let (mut top, bottom) = split_along_line_rejoin(o, &cut);
        top.translate(0.0, SPLIT_CLEARANCE_MM);
        let mut joined = top;
        joined.append(bottom);
        *o = joined;
    }

    fn simple_vsplit(o: &mut Path) {
        let Some(bb) = o.aabb() else {
            return;
        };
        let centre = (bb.min.x + bb.max.x) / 2.0;
        let cut = Segment::from_vector(Point2::new(centre, 0.0), Vector2::new(0.0, 1.0));
        let (left, mut right) = split_along_line_rejoin(o, &cut);
        right.translate(SPLIT_CLEARANCE_MM, 0.0);
        let mut joined = left;
        joined.append(right);
        *o = joined;
    }

    fn girder_hsplit(outline: &mut Path, inners: &mut Path, split_y: f64, outer_width: f64) {
        let hcut = |y: f64| {
            Segment::from_vector(Point2::new(0.0, y), Vector2::new(1.0, 0.0))
        };

        // Split and rejoin the outline at the split height; the inners
        // are split one rim width away on each side so the rejoined rim
        // material overlaps the outline seam.
        let (mut top_outline, bottom_outline) = split_along_line_rejoin(outline, &hcut(split_y));
        let (mut top_inners, _) = split_along_line_rejoin(inners, &hcut(split_y + outer_width));
        let (_, bottom_inners) = split_along_line_rejoin(inners, &hcut(split_y - outer_width));

        top_outline.translate(0.0, SPLIT_CLEARANCE_MM);
        top_inners.translate(0.0, SPLIT_CLEARANCE_MM);

        *outline = top_outline;
        outline.append(bottom_outline);
        *inners = top_inners;
        inners.append(bottom_inners);
    }

    fn girder_vsplit(outline: &mut Path, inners: &mut Path, outer_width: f64) {
        let origin = Point2::origin();
        outline.rotate(&origin, FRAC_PI_2);
        inners.rotate(&origin, FRAC_PI_2);

        if let Some(bb) = outline.aabb() {
            let mid = (bb.min.y + bb.max.y) / 2.0;
            Self::girder_hsplit(outline, inners, mid, outer_width);
        }

        outline.rotate(&origin, -FRAC_PI_2);
        inners.rotate(&origin, -FRAC_PI_2);
    }
}
