//! Overlap module: sharing relationships with peer ranks and the rules for
//! fusing values exchanged across them.

pub mod delta;
pub mod overlap;

pub use delta::{AddDelta, CopyDelta, ValueDelta};
pub use overlap::{OvlId, Overlap, OverlapPair, Remote, SharedPoint};
