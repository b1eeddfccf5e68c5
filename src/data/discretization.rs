//! Degrees-of-freedom layout keyed by topological dimension.
//!
//! A [`Discretization`] answers two questions for every dimension `d`: how many
//! values a point of dimension `d` carries, and which class those values belong
//! to. Field setup uses the first to size sections by depth stratum.

use std::collections::BTreeMap;

/// Per-dimension dof counts and dof classes. Unset dimensions report `0`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Discretization {
    dim_to_dof: BTreeMap<u32, i32>,
    dim_to_class: BTreeMap<u32, i32>,
}

impl Discretization {
    pub fn new() -> Self {
        Self::default()
    }

    /// Values carried by each point of dimension `dim`.
    pub fn num_dof(&self, dim: u32) -> i32 {
        self.dim_to_dof.get(&dim).copied().unwrap_or(0)
    }

    pub fn set_num_dof(&mut self, dim: u32, num_dof: i32) {
        self.dim_to_dof.insert(dim, num_dof);
    }

    /// Class of the dofs on points of dimension `dim`.
    pub fn dof_class(&self, dim: u32) -> i32 {
        self.dim_to_class.get(&dim).copied().unwrap_or(0)
    }

    pub fn set_dof_class(&mut self, dim: u32, dof_class: i32) {
        self.dim_to_class.insert(dim, dof_class);
    }

    /// `(dim, num_dof)` pairs that were set explicitly, ascending by dimension.
    pub fn dofs(&self) -> impl Iterator<Item = (u32, i32)> + '_ {
        self.dim_to_dof.iter().map(|(&d, &n)| (d, n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_dimensions_default_to_zero() {
        let mut disc = Discretization::new();
        disc.set_num_dof(0, 1);
        disc.set_dof_class(0, 3);
        assert_eq!(disc.num_dof(0), 1);
        assert_eq!(disc.num_dof(2), 0);
        assert_eq!(disc.dof_class(0), 3);
        assert_eq!(disc.dof_class(1), 0);
        assert_eq!(disc.dofs().collect::<Vec<_>>(), vec![(0, 1)]);
    }
}
