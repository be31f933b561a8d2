#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Pinhole camera intrinsics built from sensor metadata.
pub mod camera;

/// Ground-aligned change of basis for the camera space.
pub mod ground;

/// Planar homography estimation and point warping.
pub mod homography;

/// Linear algebra utilities on fixed-size arrays.
pub mod linalg;

/// Perspective-n-Point (PnP) solver.
pub mod pnp;

/// Camera pose and projection matrices.
pub mod pose;

/// Rotation representations.
pub mod transforms;
