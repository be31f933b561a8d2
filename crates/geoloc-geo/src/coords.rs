use serde::{Deserialize, Serialize};

/// A position in the geographic coordinate system, in degrees.
///
/// The longitude plays the role of `x` and the latitude the role of `y`. The two
/// axes are not isotropic: a degree of longitude shrinks with the cosine of the
/// latitude, so use [`crate::to_planar`] before treating coordinates as
/// cartesian points.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoCoordinate {
    /// Longitude in degrees, positive to the east.
    pub longitude: f64,
    /// Latitude in degrees, positive to the north.
    pub latitude: f64,
}

impl GeoCoordinate {
    /// Create a coordinate from longitude and latitude in degrees.
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Return the coordinate as `[longitude, latitude]`.
    pub fn to_array(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }

    /// Arithmetic midpoint of two nearby coordinates.
    pub fn midpoint(&self, other: &Self) -> Self {
        let [longitude, latitude] = crate::midpoint_2d(&self.to_array(), &other.to_array());
        Self {
            longitude,
            latitude,
        }
    }
}

impl From<[f64; 2]> for GeoCoordinate {
    fn from(value: [f64; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

impl std::fmt::Display for GeoCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(lon: {:.7}, lat: {:.7})", self.longitude, self.latitude)
    }
}
