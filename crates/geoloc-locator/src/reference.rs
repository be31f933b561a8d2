use geoloc_3d::{homography::project_corners, pose::ProjectionError};
use geoloc_geo::GeoCoordinate;
use serde::{Deserialize, Serialize};

/// A reference image of an object standing on the ground.
///
/// The bottom corners of the image are geo-referenced: `left_base` is the
/// left-bottom corner and `right_base` the right-bottom corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Geographic coordinate of the left-bottom corner.
    pub left_base: GeoCoordinate,
    /// Geographic coordinate of the right-bottom corner.
    pub right_base: GeoCoordinate,
}

impl ReferenceImage {
    /// Create a reference image description.
    pub fn new(width: u32, height: u32, left_base: GeoCoordinate, right_base: GeoCoordinate) -> Self {
        Self {
            width,
            height,
            left_base,
            right_base,
        }
    }

    /// Pixel corners: left-upper, right-upper, right-bottom, left-bottom.
    pub fn corners_2d(&self) -> [[f64; 2]; 4] {
        let (w, h) = (self.width as f64, self.height as f64);
        [[0.0, 0.0], [w, 0.0], [w, h], [0.0, h]]
    }

    /// Pixel corners lifted to unit depth, in the same order as [`Self::corners_2d`].
    pub fn corners_3d(&self) -> [[f64; 3]; 4] {
        self.corners_2d().map(|[x, y]| [x, y, 1.0])
    }

    /// Warp the reference corners into the scene with a reference to scene homography.
    pub fn scene_corners(
        &self,
        homography: &[[f64; 3]; 3],
    ) -> Result<[[f64; 2]; 4], ProjectionError> {
        project_corners(homography, &self.corners_2d())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corners() {
        let reference = ReferenceImage::new(
            640,
            480,
            GeoCoordinate::new(16.6, 49.2),
            GeoCoordinate::new(16.601, 49.2),
        );
        assert_eq!(
            reference.corners_2d(),
            [[0.0, 0.0], [640.0, 0.0], [640.0, 480.0], [0.0, 480.0]]
        );
        assert_eq!(reference.corners_3d()[2], [640.0, 480.0, 1.0]);
    }

    #[test]
    fn test_side_car_keys() -> Result<(), Box<dyn std::error::Error>> {
        let json = r#"{
            "width": 1024,
            "height": 768,
            "leftBase": {"longitude": 16.6068, "latitude": 49.1951},
            "rightBase": {"longitude": 16.6071, "latitude": 49.1952}
        }"#;
        let reference: ReferenceImage = serde_json::from_str(json)?;
        assert_eq!(reference.left_base, GeoCoordinate::new(16.6068, 49.1951));
        assert_eq!(reference.right_base, GeoCoordinate::new(16.6071, 49.1952));
        Ok(())
    }

    #[test]
    fn test_scene_corners_from_homography() -> Result<(), ProjectionError> {
        let reference = ReferenceImage::new(100, 50, GeoCoordinate::default(), GeoCoordinate::default());
        let shift = [[1.0, 0.0, 30.0], [0.0, 1.0, 40.0], [0.0, 0.0, 1.0]];
        let corners = reference.scene_corners(&shift)?;
        assert_eq!(corners, [[30.0, 40.0], [130.0, 40.0], [130.0, 90.0], [30.0, 90.0]]);
        Ok(())
    }
}
