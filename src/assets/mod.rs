pub mod color;
pub mod decode;
pub mod store;
pub mod svg_raster;
