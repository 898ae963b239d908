mod builder;
mod models;
mod summary;
mod warning;

pub use builder::*;
pub use models::*;
pub use summary::*;
pub use warning::*;
