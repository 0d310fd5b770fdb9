//! Declarative batch updates over element collections.
//!
//! `batch_update` holds the engine, `dom` an in-memory host for it.

pub use batch_update::*;
pub use dom;
