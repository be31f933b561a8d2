#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Compass bearing of the reference object.
pub mod bearing;

/// Error type of the locator.
pub mod error;

/// Camera pose and geographic position from one reference match.
pub mod locator;

/// Locator parameters.
pub mod params;

/// Projected 3D box around the reference object.
pub mod prism;

/// Geo-referenced reference images.
pub mod reference;

pub use bearing::{compute_flat_rotation, FlatRotation};
pub use error::LocatorError;
pub use locator::{calc_location, GeoLocator, Location};
pub use params::LocatorParams;
pub use prism::{project_prism, Prism, PRISM_EDGES};
pub use reference::ReferenceImage;
