//! Section completion: make values at shared points agree across ranks.
//!
//! The protocol runs in two symmetric stages over the union of send and
//! receive peers: value counts first, then the values. See
//! [`complete_section`].

pub mod data_exchange;
pub mod neighbour_links;
pub mod section_completion;
pub mod size_exchange;

pub use section_completion::{DEFAULT_COMPLETION_TAG, complete_section, complete_section_with_tags};
