pub mod feature;
pub mod fetch;
pub mod format;
pub mod geojson;
pub mod loader;
pub mod request;
