use crate::{deg_to_rad, GeoCoordinate};

/// Length in meters of one degree of latitude.
///
/// This is the value at 45° of latitude and is used everywhere regardless of the
/// actual latitude. It is a small-area, mid-latitude approximation: the true value
/// varies between ~110.57 km at the equator and ~111.69 km at the poles.
pub const METERS_PER_LATITUDE_DEGREE: f64 = 111_141.548;

/// Equatorial circumference of the Earth in meters.
const EARTH_CIRCUMFERENCE_M: f64 = 40_075_017.0;

/// Length in meters of one degree of latitude at `latitude` (degrees).
///
/// NOTE: the latitude is ignored, see [`METERS_PER_LATITUDE_DEGREE`].
pub fn meters_per_latitude_degree(_latitude: f64) -> f64 {
    METERS_PER_LATITUDE_DEGREE
}

/// Length in meters of one degree of longitude at `latitude` (degrees).
pub fn meters_per_longitude_degree(latitude: f64) -> f64 {
    EARTH_CIRCUMFERENCE_M * deg_to_rad(latitude).cos() / 360.0
}

/// Ratio between the length of a latitude degree and a longitude degree at `latitude`.
///
/// A longitude difference of one degree covers `1 / factor` latitude degrees on the
/// ground, so the factor is greater than one away from the equator.
pub fn longitude_adjust_factor(latitude: f64) -> f64 {
    meters_per_latitude_degree(latitude) / meters_per_longitude_degree(latitude)
}

/// Reciprocal of [`longitude_adjust_factor`].
pub fn longitude_correction_factor(latitude: f64) -> f64 {
    1.0 / longitude_adjust_factor(latitude)
}

/// Express a coordinate as a locally isotropic planar point `[x, y]`.
///
/// Both components are in latitude-degree units: the longitude is rescaled with the
/// factor evaluated at `reference_latitude`, so equal planar lengths cover equal
/// ground distances in both directions around the reference.
pub fn to_planar(coord: &GeoCoordinate, reference_latitude: f64) -> [f64; 2] {
    [
        coord.longitude / longitude_adjust_factor(reference_latitude),
        coord.latitude,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::haversine_distance;
    use approx::assert_relative_eq;

    #[test]
    fn test_equator_longitude_degree() {
        assert_relative_eq!(meters_per_longitude_degree(0.0), 111_319.491_666, epsilon = 1e-3);
    }

    #[test]
    fn test_adjust_factor_at_60_degrees() {
        let expected = METERS_PER_LATITUDE_DEGREE / (EARTH_CIRCUMFERENCE_M * 0.5 / 360.0);
        assert_relative_eq!(longitude_adjust_factor(60.0), expected, epsilon = 1e-9);
        assert_relative_eq!(
            longitude_adjust_factor(60.0) * longitude_correction_factor(60.0),
            1.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_latitude_degree_is_constant() {
        assert_eq!(meters_per_latitude_degree(0.0), meters_per_latitude_degree(70.0));
    }

    #[test]
    fn test_to_planar_is_isotropic() {
        // 100 m to the east and 100 m to the north of the reference cover the same
        // planar length once the longitude is rescaled
        let lat = 49.2;
        let origin = GeoCoordinate::new(16.6, lat);
        let east = GeoCoordinate::new(16.6 + 100.0 / meters_per_longitude_degree(lat), lat);
        let north = GeoCoordinate::new(16.6, lat + 100.0 / meters_per_latitude_degree(lat));

        let o = to_planar(&origin, lat);
        let e = to_planar(&east, lat);
        let n = to_planar(&north, lat);
        assert_relative_eq!(e[0] - o[0], n[1] - o[1], max_relative = 1e-9);

        // haversine agrees with the flat approximation to within a few tenths of a percent
        let d_east = haversine_distance(&origin, &east);
        assert_relative_eq!(d_east, 100.0, max_relative = 5e-3);
    }
}
