//! Static map of Madrid's regulated parking (SER) zones.
//!
//! Reads the segments CSV and, optionally, the shapefile archive with their
//! geometry, then writes a single self-contained HTML page that draws every
//! segment coloured by zone type.

use thiserror::Error;

pub mod generator;
pub mod parking;
pub mod render;
pub mod ser;
pub mod shared;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Input(#[from] ser::InputError),
    #[error(transparent)]
    Output(#[from] render::OutputError),
}

pub mod prelude {
    pub use crate::Error;
    pub use crate::generator::{Generator, Settings};
    pub use crate::parking::{
        MapSummary, ParkingSegment, RecordWarning, UnmatchedPolicy, ZoneGroup, ZoneType,
        build_segments, group_by_zone,
    };
    pub use crate::render::{OutputError, RenderOptions, render, render_page};
    pub use crate::ser::{InputError, load_geometry, load_records, load_service_areas};
    pub use crate::shared::{Coordinate, Distance, Projection};
}
