//! Distributed algorithms: communication backends, wire formats and completion.

pub mod communicator;
pub mod completion;
pub mod wire;

pub use communicator::{CommTag, Communicator, NoComm, SectionCommTags, ThreadComm, Wait};
#[cfg(feature = "mpi-support")]
pub use communicator::MpiComm;
pub use completion::{complete_section, complete_section_with_tags};
