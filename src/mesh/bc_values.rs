//! Table of boundary-function values `(rho, u, v, p)` keyed by function id.
//!
//! Rank 0 is authoritative; [`Mesh::distribute_bc_values`] copies its table to
//! every other rank.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::algs::communicator::{CommTag, Communicator};
use crate::algs::wire::{WireBcEntry, WireCount, cast_slice, decode_records};
use crate::mesh::Mesh;
use crate::mesh_error::MeshError;

/// Base tag of the table distribution: count, then entries.
pub const BC_VALUES_TAG: CommTag = CommTag::new(0xBC00);

/// Primitive state imposed by one boundary function.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BcValue {
    pub rho: f64,
    pub u: f64,
    pub v: f64,
    pub p: f64,
}

impl BcValue {
    pub fn new(rho: f64, u: f64, v: f64, p: f64) -> Self {
        Self { rho, u, v, p }
    }

    pub fn to_array(self) -> [f64; 4] {
        [self.rho, self.u, self.v, self.p]
    }

    pub fn from_array([rho, u, v, p]: [f64; 4]) -> Self {
        Self { rho, u, v, p }
    }
}

impl<C: Communicator> Mesh<C> {
    /// Value of function `id`; all zeros if unset.
    pub fn get_bc_value(&self, id: i32) -> BcValue {
        self.bc_values.get(&id).copied().unwrap_or_default()
    }

    pub fn set_bc_value(&mut self, id: i32, value: BcValue) {
        self.bc_values.insert(id, value);
    }

    pub fn bc_values(&self) -> &BTreeMap<i32, BcValue> {
        &self.bc_values
    }

    pub fn bc_values_mut(&mut self) -> &mut BTreeMap<i32, BcValue> {
        &mut self.bc_values
    }

    /// Broadcast rank 0's table to every rank. Collective.
    ///
    /// Receivers insert (or overwrite) every entry they get; entries only they
    /// hold are kept.
    pub fn distribute_bc_values(&mut self) -> Result<(), MeshError> {
        let comm = self.comm();
        if comm.size() == 1 {
            return Ok(());
        }
        let root = 0;
        let entries: Vec<WireBcEntry> = self
            .bc_values
            .iter()
            .map(|(&id, v)| WireBcEntry::new(id, v.to_array()))
            .collect();

        let count = [WireCount::new(entries.len())?];
        let count = comm.broadcast(root, BC_VALUES_TAG, cast_slice(&count))?;
        let count = decode_records::<WireCount>(&count, root)?
            .first()
            .map_or(0, WireCount::get);

        // one broadcast per entry, in the root's iteration order
        let blank = WireBcEntry::new(0, [0.0; 4]);
        let mut received = Vec::with_capacity(count);
        for i in 0..count {
            let entry = entries.get(i).unwrap_or(&blank);
            let bytes =
                comm.broadcast(root, BC_VALUES_TAG.offset(1), cast_slice(std::slice::from_ref(entry)))?;
            let rec: Vec<WireBcEntry> = decode_records(&bytes, root)?;
            match rec.as_slice() {
                [e] => received.push(*e),
                _ => {
                    return Err(MeshError::CommError {
                        neighbor: root,
                        message: format!(
                            "boundary value {i} of {count} arrived as {} records",
                            rec.len()
                        ),
                    });
                }
            }
        }
        if comm.rank() == root {
            return Ok(());
        }
        if self.debug() > 0 {
            log::debug!("[{}] received {count} boundary values", self.rank());
        }
        for e in received {
            self.bc_values.insert(e.id(), BcValue::from_array(e.values()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::{NoComm, ThreadComm};
    use crate::data::numbering::NumberingFactory;
    use std::sync::Arc;

    #[test]
    fn unset_values_read_as_zero() {
        let mut m = Mesh::with_factory(NoComm, 2, 0, Arc::new(NumberingFactory::new(0)));
        assert_eq!(m.get_bc_value(7), BcValue::default());
        m.set_bc_value(7, BcValue::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(m.get_bc_value(7).to_array(), [1.0, 2.0, 3.0, 4.0]);
        m.distribute_bc_values().unwrap();
        assert_eq!(m.bc_values().len(), 1);
    }

    #[test]
    fn root_table_reaches_every_rank() {
        let comms = ThreadComm::world(3);
        let tables: Vec<BTreeMap<i32, BcValue>> = std::thread::scope(|s| {
            let hs: Vec<_> = comms
                .into_iter()
                .map(|c| {
                    s.spawn(move || {
                        let rank = c.rank();
                        let mut m =
                            Mesh::with_factory(c, 2, 0, Arc::new(NumberingFactory::new(0)));
                        if rank == 0 {
                            m.set_bc_value(-1, BcValue::new(1.4, 0.0, 0.0, 1.0));
                            m.set_bc_value(3, BcValue::new(1.0, 0.5, -0.5, 101325.0));
                        } else {
                            m.set_bc_value(3, BcValue::new(9.0, 9.0, 9.0, 9.0));
                        }
                        m.distribute_bc_values().unwrap();
                        m.bc_values().clone()
                    })
                })
                .collect();
            hs.into_iter().map(|h| h.join().unwrap()).collect()
        });
        for t in &tables {
            assert_eq!(t, &tables[0]);
        }
        assert_eq!(tables[2][&3].p, 101325.0);
    }
}
