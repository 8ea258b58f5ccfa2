pub mod assemble;
pub mod export;
pub mod icons;
pub mod markers;
pub mod symbology;

pub use assemble::*;
pub use icons::*;
pub use markers::*;
pub use symbology::*;
