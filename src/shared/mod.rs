pub mod geo;
pub mod projection;
pub mod text;

pub use geo::*;
pub use projection::*;
