//! Configuration and dependency wiring.

mod bindings;
mod dependencies;

pub use bindings::load_bindings;
pub use dependencies::Dependencies;
