//! Narrow trait boundaries for the collaborators named in §6 that this
//! crate deliberately does not implement: an external query-language
//! parser, a sparse-matrix library, a full-text/secondary-index library,
//! and a worker thread pool. Each submodule defines the trait the core
//! consumes; the crate provides one in-core implementation per trait
//! where it has a natural fit (`graph::matrix::RoaringMatrix` satisfies
//! the shape of [`matrix::Matrix`] without implementing it directly —
//! that trait is honored by construction, not by explicit `impl` — and
//! [`thread_pool::RayonThreadPool`] is a real `submit_reader`/
//! `submit_writer` implementation over `rayon`). A host integration is
//! free to swap any of these for its own.

pub mod ast;
pub mod index;
pub mod matrix;
pub mod thread_pool;
