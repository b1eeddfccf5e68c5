//! Data module: atlases, sections, registries and the objects laid over them.

pub mod atlas;
pub mod bc;
pub mod bundle;
pub mod discretization;
pub mod numbering;
pub mod registry;
pub mod section;

pub use atlas::{Atlas, FiberSpan};
pub use bc::{BOUNDARY_MARKER, BoundaryCondition, BoundaryFunction};
pub use bundle::Bundle;
pub use discretization::Discretization;
pub use numbering::{Numbering, NumberingFactory, PointSelector};
pub use registry::SectionRegistry;
pub use section::{PairValue, Section};
