pub mod batch;
pub mod config;
pub mod normalize;
pub mod pipeline;
pub mod scenarios;

pub use config::*;
pub use normalize::*;
pub use pipeline::*;
pub use scenarios::*;
