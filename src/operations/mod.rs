pub mod intersect;
pub mod offset;
pub mod split;
pub mod surgery;

pub use intersect::{path_intersections, paths_intersect, top_bot_intersect, PathHit};
pub use offset::trace_at_offset;
pub use split::{split_along_line, split_along_line_rejoin};
pub use surgery::{cut_slot, make_gap, SlotStyle};
