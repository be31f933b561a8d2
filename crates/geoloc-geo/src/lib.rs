#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Angle conversions and 2D vector angles.
pub mod angles;

/// Geographic coordinate value type.
pub mod coords;

/// Great-circle and euclidean distances.
pub mod distance;

/// Meters-per-degree scaling of geographic coordinates.
pub mod scale;

/// Locating a point from two geo-referenced anchors.
pub mod triangulation;

pub use angles::{bearing_from_east, deg_to_rad, midpoint_2d, rad_to_deg, vector_angle_2d};
pub use coords::GeoCoordinate;
pub use distance::{euclidean_2d, euclidean_3d, haversine_distance, EARTH_RADIUS_M};
pub use scale::{
    longitude_adjust_factor, longitude_correction_factor, meters_per_latitude_degree,
    meters_per_longitude_degree, to_planar, METERS_PER_LATITUDE_DEGREE,
};
pub use triangulation::solve_geo_triangulation;

/// Error types for the geodesy helpers.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum GeoError {
    /// Points coincide or are collinear so a direction or scale cannot be derived.
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(&'static str),
}
