use argh::FromArgs;
use serde::Deserialize;
use std::path::PathBuf;

use geoloc::k3d::camera::{CameraIntrinsics, CameraMetadata};
use geoloc::locator::{GeoLocator, LocatorParams, ReferenceImage};

#[derive(FromArgs)]
/// Locate the camera of a scene photo from a matched reference object
struct Args {
    /// path to the json job file
    #[argh(option, short = 'j')]
    job: PathBuf,
}

/// One localization: the scene camera, the reference and where it was found.
#[derive(Deserialize)]
struct Job {
    camera: CameraMetadata,
    reference: ReferenceImage,
    /// reference corners found in the scene, in pixels
    scene_corners: Option<[[f64; 2]; 4]>,
    /// reference to scene homography, used when no corners are given
    homography: Option<[[f64; 3]; 3]>,
    #[serde(default)]
    params: LocatorParams,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let job: Job = serde_json::from_str(&std::fs::read_to_string(&args.job)?)?;
    log::debug!("job {:?}: params {:?}", args.job, job.params);

    let locator = GeoLocator::new(job.params);

    let location = match (job.scene_corners, job.homography) {
        (Some(corners), _) => {
            let intrinsics = CameraIntrinsics::from_metadata(&job.camera)?;
            locator.locate(&job.reference, &corners, &intrinsics)?
        }
        (None, Some(homography)) => {
            locator.locate_with_homography(&job.reference, &homography, &job.camera)?
        }
        (None, None) => return Err("the job needs either scene_corners or homography".into()),
    };

    let pose = &location.pose;
    log::info!("rotation vector: {:?}", pose.rotation_vector);
    log::info!("translation: {:?}", pose.translation);
    log::info!(
        "reprojection rmse: {:.4} px, pnp iterations: {:?}",
        pose.reproj_rmse,
        pose.pnp_iterations
    );

    if let Some(prism) = &location.prism {
        for (a, b) in prism.segments() {
            log::debug!("prism edge {a:?} -> {b:?}");
        }
    }

    if let (Some(camera), Some(rotation)) = (location.camera, location.rotation) {
        log::info!("camera location: {camera}");
        log::info!(
            "object bearing: {:.2} deg, quaternion {:?}",
            rotation.bearing.to_degrees(),
            rotation.quaternion
        );
    }

    Ok(())
}
