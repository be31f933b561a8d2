use geoloc_3d::{
    camera::CameraError, ground::GroundFrameError, pnp::PnPError, pose::ProjectionError,
};
use geoloc_geo::GeoError;
use thiserror::Error;

/// Error returned by the locator.
///
/// Every failure aborts the localization; no partial result is produced.
#[derive(Debug, Error, PartialEq)]
pub enum LocatorError {
    /// Camera metadata is invalid.
    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    /// Pose estimation failed.
    #[error("PnP error: {0}")]
    PnP(#[from] PnPError),

    /// A point could not be projected.
    #[error("Projection error: {0}")]
    Projection(#[from] ProjectionError),

    /// The ground frame could not be built.
    #[error("Ground frame error: {0}")]
    GroundFrame(#[from] GroundFrameError),

    /// Geographic computation failed.
    #[error("Geo error: {0}")]
    Geo(#[from] GeoError),
}

impl LocatorError {
    /// Whether the error comes from coincident or collinear points.
    pub fn is_degenerate_geometry(&self) -> bool {
        matches!(
            self,
            Self::Geo(GeoError::DegenerateGeometry(_))
                | Self::GroundFrame(GroundFrameError::DegenerateGeometry(_))
                | Self::GroundFrame(GroundFrameError::Geo(GeoError::DegenerateGeometry(_)))
        )
    }

    /// Whether the pose of the reference object could not be solved.
    pub fn is_pose_solve_failed(&self) -> bool {
        matches!(self, Self::PnP(PnPError::PoseSolveFailed(_)))
    }

    /// Whether a projection divided by zero.
    pub fn is_singular_projection(&self) -> bool {
        matches!(self, Self::Projection(ProjectionError::SingularProjection))
    }

    /// Whether the camera metadata was rejected.
    pub fn is_invalid_camera_metadata(&self) -> bool {
        matches!(self, Self::Camera(CameraError::InvalidCameraMetadata { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let err: LocatorError = GeoError::DegenerateGeometry("anchors").into();
        assert!(err.is_degenerate_geometry());
        assert!(!err.is_pose_solve_failed());

        let err: LocatorError =
            GroundFrameError::Geo(GeoError::DegenerateGeometry("anchors")).into();
        assert!(err.is_degenerate_geometry());

        let err: LocatorError = PnPError::PoseSolveFailed("diverged".to_string()).into();
        assert!(err.is_pose_solve_failed());
        assert_eq!(err.to_string(), "PnP error: Pose solve failed: diverged");

        let err: LocatorError = ProjectionError::SingularProjection.into();
        assert!(err.is_singular_projection());
    }
}
