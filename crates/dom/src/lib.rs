//! In-memory element tree for driving `batch_update` without a UI toolkit.

mod document;
mod element;
pub mod names;

pub use document::{Document, LiveCollection};
pub use element::{ElementRef, Node, TreeError};
