//! Catalog composition layer
//!
//! Builds accessory lookups out of the primitive catalog operations.

mod assembler;

pub use assembler::ProductAssembler;
