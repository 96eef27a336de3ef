pub mod api;
pub mod geojson;

pub use api::*;
pub use geojson::*;
