//! Fixed, little-endian wire types for completion and distribution paths.

use bytemuck::{Pod, Zeroable};

use crate::mesh_error::MeshError;

pub fn cast_slice<T: Pod>(v: &[T]) -> &[u8] {
    bytemuck::cast_slice(v)
}

/// Decode a received byte buffer into records, tolerating any alignment.
pub fn decode_records<T: Pod>(bytes: &[u8], neighbor: usize) -> Result<Vec<T>, MeshError> {
    let size = std::mem::size_of::<T>();
    if size == 0 {
        return Ok(Vec::new());
    }
    if bytes.len() % size != 0 {
        return Err(MeshError::CommError {
            neighbor,
            message: format!(
                "payload of {} bytes is not a whole number of {size}-byte records",
                bytes.len()
            ),
        });
    }
    Ok(bytes
        .chunks_exact(size)
        .map(bytemuck::pod_read_unaligned::<T>)
        .collect())
}

pub fn expect_exact_len(actual: usize, expected: usize) -> Result<(), String> {
    if actual == expected {
        Ok(())
    } else {
        Err(format!("expected {expected} bytes, got {actual}"))
    }
}

/// Item count carried ahead of a payload.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WireCount {
    pub n_le: u32,
}

impl WireCount {
    /// Fails with [`MeshError::CountOverflow`] when `n` exceeds `u32::MAX`.
    pub fn new(n: usize) -> Result<Self, MeshError> {
        let n = u32::try_from(n).map_err(|_| MeshError::CountOverflow(n))?;
        Ok(Self { n_le: n.to_le() })
    }
    pub fn get(&self) -> usize {
        u32::from_le(self.n_le) as usize
    }
}

/// A global number (i64) carried on the wire.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WireIndex {
    pub n_le: u64,
}

impl WireIndex {
    pub fn new(n: u64) -> Self {
        Self { n_le: n.to_le() }
    }
    pub fn get(&self) -> u64 {
        u64::from_le(self.n_le)
    }
}

/// One boundary-value table entry: function id and `(rho, u, v, p)`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WireBcEntry {
    pub id_le: i32,
    pub reserved_le: u32, // keep zero
    pub values_le: [u64; 4],
}

impl WireBcEntry {
    pub fn new(id: i32, values: [f64; 4]) -> Self {
        Self {
            id_le: id.to_le(),
            reserved_le: 0,
            values_le: values.map(|v| v.to_bits().to_le()),
        }
    }
    pub fn id(&self) -> i32 {
        i32::from_le(self.id_le)
    }
    pub fn values(&self) -> [f64; 4] {
        self.values_le.map(|v| f64::from_bits(u64::from_le(v)))
    }
}
