//! Final document assembly and persistence.

mod assembler;
mod store;

pub use assembler::{DocumentOrder, FinalDocument};
pub use store::DocumentStore;
