pub mod centroid;
pub mod datum;
pub mod ecef;
pub mod geodesy;
pub mod krovak;
pub mod projection;

pub use centroid::*;
pub use datum::*;
pub use ecef::*;
pub use geodesy::*;
pub use krovak::*;
pub use projection::*;
