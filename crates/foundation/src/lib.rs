pub mod bounds;
pub mod coords;
pub mod math;

// Foundation crate: small, well-tested primitives only.
pub use bounds::*;
pub use coords::*;
