use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pose::ProjectionError;

/// Error types for the camera module.
#[derive(Debug, Error, PartialEq)]
pub enum CameraError {
    /// A metadata field is zero, negative or not finite.
    #[error("Invalid camera metadata: {field} = {value}")]
    InvalidCameraMetadata {
        /// Name of the offending field.
        field: &'static str,
        /// Value that was rejected.
        value: f64,
    },
}

/// Image resolution and optics as found in the photo metadata.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraMetadata {
    /// Image width in pixels.
    pub image_width: u32,
    /// Image height in pixels.
    pub image_height: u32,
    /// Focal length of the lens in millimeters.
    pub focal_length_mm: f64,
    /// Sensor width in millimeters.
    pub sensor_width_mm: f64,
    /// Sensor height in millimeters.
    pub sensor_height_mm: f64,
}

impl CameraMetadata {
    /// Check that every field is strictly positive and finite.
    pub fn validate(&self) -> Result<(), CameraError> {
        let fields = [
            ("image_width", self.image_width as f64),
            ("image_height", self.image_height as f64),
            ("focal_length_mm", self.focal_length_mm),
            ("sensor_width_mm", self.sensor_width_mm),
            ("sensor_height_mm", self.sensor_height_mm),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(CameraError::InvalidCameraMetadata { field, value });
            }
        }
        Ok(())
    }
}

/// Intrinsic parameters of a pinhole camera without distortion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    /// Focal length along x in pixels.
    pub fx: f64,
    /// Focal length along y in pixels.
    pub fy: f64,
    /// Principal point x in pixels.
    pub cx: f64,
    /// Principal point y in pixels.
    pub cy: f64,
}

impl CameraIntrinsics {
    /// Create intrinsics from the focal lengths and the principal point.
    pub fn new(fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        Self { fx, fy, cx, cy }
    }

    /// Build the intrinsics from camera metadata, see [`build_intrinsics`].
    pub fn from_metadata(metadata: &CameraMetadata) -> Result<Self, CameraError> {
        build_intrinsics(
            metadata.image_width,
            metadata.image_height,
            metadata.focal_length_mm,
            metadata.sensor_width_mm,
            metadata.sensor_height_mm,
        )
    }

    /// Returns the camera matrix as a 3x3 array.
    pub fn matrix(&self) -> [[f64; 3]; 3] {
        [
            [self.fx, 0.0, self.cx],
            [0.0, self.fy, self.cy],
            [0.0, 0.0, 1.0],
        ]
    }

    /// Project a homogeneous camera-space point to pixel coordinates.
    ///
    /// The homogeneous component of `point` is ignored; the point is divided by its depth.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError::SingularProjection`] when the depth is zero or not finite.
    pub fn project_camera_space_to_image(
        &self,
        point: &[f64; 4],
    ) -> Result<[f64; 2], ProjectionError> {
        let z = point[2];
        if !z.is_finite() || z.abs() < f64::EPSILON {
            return Err(ProjectionError::SingularProjection);
        }
        Ok([
            self.fx * point[0] / z + self.cx,
            self.fy * point[1] / z + self.cy,
        ])
    }
}

/// Compute pinhole intrinsics from the image resolution and the sensor geometry.
///
/// The larger sensor dimension is matched to the larger image dimension, so the
/// result does not depend on how the sensor size was reported.
///
/// # Arguments
///
/// * `image_width` - Image width in pixels.
/// * `image_height` - Image height in pixels.
/// * `focal_length_mm` - Focal length in millimeters.
/// * `sensor_width_mm` - Sensor width in millimeters.
/// * `sensor_height_mm` - Sensor height in millimeters.
///
/// # Errors
///
/// Returns [`CameraError::InvalidCameraMetadata`] for zero, negative or non-finite inputs.
///
/// Example:
///
/// ```
/// use geoloc_3d::camera::build_intrinsics;
///
/// let k = build_intrinsics(4000, 3000, 4.0, 8.0, 6.0).unwrap();
/// assert_eq!((k.fx, k.fy, k.cx, k.cy), (2000.0, 2000.0, 2000.0, 1500.0));
/// ```
pub fn build_intrinsics(
    image_width: u32,
    image_height: u32,
    focal_length_mm: f64,
    sensor_width_mm: f64,
    sensor_height_mm: f64,
) -> Result<CameraIntrinsics, CameraError> {
    CameraMetadata {
        image_width,
        image_height,
        focal_length_mm,
        sensor_width_mm,
        sensor_height_mm,
    }
    .validate()?;

    let (sensor_min, sensor_max) = if sensor_width_mm < sensor_height_mm {
        (sensor_width_mm, sensor_height_mm)
    } else {
        (sensor_height_mm, sensor_width_mm)
    };

    let (sx, sy) = if image_width < image_height {
        (sensor_min, sensor_max)
    } else {
        (sensor_max, sensor_min)
    };

    let (w, h) = (image_width as f64, image_height as f64);
    let intrinsics = CameraIntrinsics {
        fx: w * focal_length_mm / sx,
        fy: h * focal_length_mm / sy,
        cx: w / 2.0,
        cy: h / 2.0,
    };

    log::debug!("camera intrinsics: {intrinsics:?}");

    Ok(intrinsics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_build_intrinsics_landscape() -> Result<(), Box<dyn std::error::Error>> {
        let k = build_intrinsics(4000, 3000, 4.25, 6.17, 4.55)?;
        assert_relative_eq!(k.fx, 4000.0 * 4.25 / 6.17);
        assert_relative_eq!(k.fy, 3000.0 * 4.25 / 4.55);
        assert_eq!(k.cx, 2000.0);
        assert_eq!(k.cy, 1500.0);
        assert!(k.fx > 0.0 && k.fy > 0.0);
        Ok(())
    }

    #[test]
    fn test_build_intrinsics_sensor_order_is_irrelevant() -> Result<(), Box<dyn std::error::Error>> {
        let a = build_intrinsics(4000, 3000, 4.25, 6.17, 4.55)?;
        let b = build_intrinsics(4000, 3000, 4.25, 4.55, 6.17)?;
        assert_eq!(a, b);
        Ok(())
    }

    #[test]
    fn test_build_intrinsics_portrait() -> Result<(), Box<dyn std::error::Error>> {
        let landscape = build_intrinsics(4000, 3000, 4.25, 6.17, 4.55)?;
        let portrait = build_intrinsics(3000, 4000, 4.25, 4.55, 6.17)?;
        assert_relative_eq!(portrait.fx, landscape.fy);
        assert_relative_eq!(portrait.fy, landscape.fx);
        assert_eq!(portrait.cx, 1500.0);
        assert_eq!(portrait.cy, 2000.0);
        Ok(())
    }

    #[test]
    fn test_build_intrinsics_invalid() {
        assert_eq!(
            build_intrinsics(0, 3000, 4.25, 6.17, 4.55),
            Err(CameraError::InvalidCameraMetadata {
                field: "image_width",
                value: 0.0
            })
        );
        assert!(build_intrinsics(4000, 3000, -1.0, 6.17, 4.55).is_err());
        assert!(build_intrinsics(4000, 3000, 4.25, 0.0, 4.55).is_err());
        assert!(build_intrinsics(4000, 3000, 4.25, 6.17, f64::NAN).is_err());
    }

    #[test]
    fn test_project_camera_space_to_image() -> Result<(), Box<dyn std::error::Error>> {
        let k = CameraIntrinsics::new(100.0, 100.0, 50.0, 50.0);
        let uv = k.project_camera_space_to_image(&[0.6, -0.6, 5.0, 1.0])?;
        assert_relative_eq!(uv[0], 62.0);
        assert_relative_eq!(uv[1], 38.0);
        assert_eq!(
            k.project_camera_space_to_image(&[1.0, 1.0, 0.0, 1.0]),
            Err(ProjectionError::SingularProjection)
        );
        Ok(())
    }

    #[test]
    fn test_metadata_serde() -> Result<(), Box<dyn std::error::Error>> {
        let json = r#"{"image_width":4000,"image_height":3000,"focal_length_mm":4.25,
            "sensor_width_mm":6.17,"sensor_height_mm":4.55}"#;
        let metadata: CameraMetadata = serde_json::from_str(json)?;
        let k = CameraIntrinsics::from_metadata(&metadata)?;
        assert_eq!(k, build_intrinsics(4000, 3000, 4.25, 6.17, 4.55)?);
        Ok(())
    }
}
