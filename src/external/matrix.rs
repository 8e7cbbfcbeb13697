//! The sparse-matrix collaborator contract (§6): `new`, `set_element`,
//! `extract`, `extract_tuples`, `nvals`, `resize`, `free`, plus a
//! `TupleIter` over non-zero cells that can resume from a given
//! `(row, col)` — required by the constraint enforcer's batch-and-release
//! loop (§4.9).
//!
//! This crate's graph store doesn't need a dependency-injected matrix
//! backend the way the original integrates a standalone linear-algebra
//! library: [`crate::graph::matrix::RoaringMatrix`] and [`crate::graph::
//! matrix::RelationMatrix`] already satisfy this shape directly against
//! `roaring`, so no adapter wrapping exists. This trait is kept as the
//! documented seam a host could slot an alternative backend behind.

/// One non-zero cell, as yielded by a [`TupleIter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tuple<V> {
    pub row: u64,
    pub col: u64,
    pub value: V,
}

/// A resumable iterator over a matrix's non-zero cells, in row-major
/// order. `resume_from` re-seeks without rescanning skipped rows —
/// [`crate::constraints::enforce`] calls it between lock-released batches.
pub trait TupleIter<V> {
    fn next(&mut self) -> Option<Tuple<V>>;
    fn resume_from(&mut self, row: u64, col: u64);
    fn reset(&mut self);
}

pub trait Matrix<V> {
    fn new(rows: u64, cols: u64) -> Self
    where
        Self: Sized;
    fn set_element(&mut self, row: u64, col: u64, value: V);
    fn extract(&self, row: u64, col: u64) -> Option<V>;
    fn nvals(&self) -> u64;
    fn resize(&mut self, rows: u64, cols: u64);
    fn extract_tuples(&self) -> Box<dyn TupleIter<V> + '_>;
}
