pub mod error;
pub mod geojson;
pub mod record;
pub mod records;
pub mod source;
pub mod wkt;

pub use error::*;
pub use record::*;
pub use source::*;
pub use wkt::*;
