pub mod path;
pub mod stitch;

pub use path::{Aabb, Path, SegmentId};
pub use stitch::SubPath;
