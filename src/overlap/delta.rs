//! Rules for fusing values that arrive over an overlap.
//!
//! Completion packs every outgoing value through [`ValueDelta::restrict`] and
//! merges every incoming one with [`ValueDelta::fuse`].

/// Restriction and fusion for a section value `V`.
pub trait ValueDelta<V>: Sized {
    /// What travels on the wire for one value.
    type Part: bytemuck::Pod + Send;

    /// Extract the part of `v` that travels on one link.
    fn restrict(v: &V) -> Self::Part;

    /// Merge an incoming fragment into the local value.
    fn fuse(local: &mut V, incoming: Self::Part);
}

/// Copy-overwrites-local: the last fused value wins.
#[derive(Copy, Clone, Debug, Default)]
pub struct CopyDelta;

impl<V: bytemuck::Pod + Send> ValueDelta<V> for CopyDelta {
    type Part = V;
    #[inline]
    fn restrict(v: &V) -> V {
        *v
    }
    #[inline]
    fn fuse(local: &mut V, incoming: V) {
        *local = incoming;
    }
}

/// Additive delta for assembled quantities.
#[derive(Copy, Clone, Debug, Default)]
pub struct AddDelta;

impl<V> ValueDelta<V> for AddDelta
where
    V: std::ops::AddAssign + bytemuck::Pod + Send,
{
    type Part = V;
    #[inline]
    fn restrict(v: &V) -> V {
        *v
    }
    #[inline]
    fn fuse(local: &mut V, incoming: V) {
        *local += incoming;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_overwrites() {
        let mut v = 1.5f64;
        let part = <CopyDelta as ValueDelta<f64>>::restrict(&4.0);
        <CopyDelta as ValueDelta<f64>>::fuse(&mut v, part);
        assert_eq!(v, 4.0);
    }

    #[test]
    fn add_accumulates() {
        let mut v = 2i32;
        <AddDelta as ValueDelta<i32>>::fuse(&mut v, 3);
        <AddDelta as ValueDelta<i32>>::fuse(&mut v, -1);
        assert_eq!(v, 4);
    }
}
