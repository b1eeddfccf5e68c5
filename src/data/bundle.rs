//! Bundle: a topology plus named sections of three value kinds, bound to a communicator.
//!
//! A `Bundle` ties together:
//! 1. the patched [`Topology`] and its overlaps,
//! 2. three [`SectionRegistry`]s (`real`, `int`, `pair`),
//! 3. the [`Communicator`] used to complete sections across ranks.
//!
//! Sections are looked up by name and created on first use. Completion moves
//! values over the topology's overlaps with a chosen [`ValueDelta`].

use crate::algs::communicator::{Communicator, NoComm};
use crate::algs::completion::complete_section;
use crate::data::registry::SectionRegistry;
use crate::data::section::{PairValue, Section};
use crate::mesh_error::MeshError;
use crate::overlap::delta::ValueDelta;
use crate::topology::mesh_topology::Topology;
use crate::topology::point::PatchId;

/// Topology with typed, named sections over it.
#[derive(Debug)]
pub struct Bundle<C: Communicator = NoComm> {
    comm: C,
    debug: i32,
    distributed: bool,
    topology: Topology,
    real: SectionRegistry<f64>,
    int: SectionRegistry<i32>,
    pair: SectionRegistry<PairValue>,
}

macro_rules! registry_accessors {
    ($ty:ty, $field:ident, $has:ident, $get:ident, $lookup:ident, $set:ident, $names:ident, $complete:ident) => {
        pub fn $has(&self, name: &str) -> bool {
            self.$field.has(name)
        }

        /// The section called `name`, created empty if absent.
        pub fn $get(&mut self, name: &str) -> &mut Section<$ty> {
            self.$field.get_or_create(name, self.debug)
        }

        /// Read-only lookup; never creates.
        pub fn $lookup(&self, name: &str) -> Option<&Section<$ty>> {
            self.$field.get(name)
        }

        pub fn $set(&mut self, name: &str, section: Section<$ty>) {
            self.$field.set(name, section);
        }

        pub fn $names(&self) -> std::collections::BTreeSet<String> {
            self.$field.names()
        }

        /// Complete `patch` of section `name` over the topology's overlaps.
        ///
        /// # Errors
        /// [`MeshError::MissingSection`] if no such section is registered.
        pub fn $complete<D: ValueDelta<$ty>>(
            &mut self,
            name: &str,
            patch: PatchId,
        ) -> Result<(), MeshError> {
            let section = self
                .$field
                .get_mut(name)
                .ok_or_else(|| MeshError::MissingSection(name.to_string()))?;
            complete_section::<$ty, D, C>(section, patch, self.topology.overlaps(), &self.comm)
        }
    };
}

impl<C: Communicator> Bundle<C> {
    pub fn new(comm: C, debug: i32) -> Self {
        let distributed = comm.size() > 1;
        Self {
            comm,
            debug,
            distributed,
            topology: Topology::new(debug),
            real: SectionRegistry::new("real"),
            int: SectionRegistry::new("int"),
            pair: SectionRegistry::new("pair"),
        }
    }

    pub fn comm(&self) -> &C {
        &self.comm
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.comm.rank()
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.comm.size()
    }

    pub fn debug(&self) -> i32 {
        self.debug
    }

    /// Whether the topology is spread over more than one rank.
    pub fn distributed(&self) -> bool {
        self.distributed
    }

    pub fn set_distributed(&mut self, distributed: bool) {
        self.distributed = distributed;
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn topology_mut(&mut self) -> &mut Topology {
        &mut self.topology
    }

    /// Replace the topology; every registered section keeps its layout.
    pub fn set_topology(&mut self, topology: Topology) {
        self.topology = topology;
    }

    registry_accessors!(
        f64,
        real,
        has_real_section,
        get_real_section,
        real_section,
        set_real_section,
        real_section_names,
        complete_real_section
    );

    registry_accessors!(
        i32,
        int,
        has_int_section,
        get_int_section,
        int_section,
        set_int_section,
        int_section_names,
        complete_int_section
    );

    registry_accessors!(
        PairValue,
        pair,
        has_pair_section,
        get_pair_section,
        pair_section,
        set_pair_section,
        pair_section_names,
        complete_pair_section
    );

    pub fn real_sections(&self) -> &SectionRegistry<f64> {
        &self.real
    }

    pub(crate) fn real_sections_mut(&mut self) -> &mut SectionRegistry<f64> {
        &mut self.real
    }

    pub fn int_sections(&self) -> &SectionRegistry<i32> {
        &self.int
    }

    pub fn pair_sections(&self) -> &SectionRegistry<PairValue> {
        &self.pair
    }
}
