//! Context assembler — token-budgeted editing context over the graph (§4.5).

pub mod assembler;
pub mod budget;

pub use assembler::{ContextAssembler, ContextSnippet, EditingContext, TargetFile};
