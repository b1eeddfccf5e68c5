//! Cache invalidation shared by structures that hold derived topology.

/// Anything that caches derived topology (strata, numberings, …) implements this.
pub trait InvalidateCache {
    /// Drop every derived cache so future queries either recompute or report staleness.
    fn invalidate_cache(&mut self);
}

impl<T: InvalidateCache + ?Sized> InvalidateCache for Box<T> {
    #[inline]
    fn invalidate_cache(&mut self) {
        (**self).invalidate_cache();
    }
}
