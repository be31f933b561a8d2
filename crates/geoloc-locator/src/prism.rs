use geoloc_3d::pose::{Pose, ProjectionError};

/// Pairs of [`Prism::points`] indices joined by an edge.
///
/// The first four points are the reference corners, the last four the same corners
/// pushed back along `+z`.
pub const PRISM_EDGES: [(usize, usize); 12] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 0),
    (4, 5),
    (5, 6),
    (6, 7),
    (7, 4),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

/// Image projection of a box extruded from the reference rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct Prism {
    /// Projected corners in pixels.
    pub points: [[f64; 2]; 8],
}

impl Prism {
    /// Projected segments, one per entry of [`PRISM_EDGES`].
    pub fn segments(&self) -> impl Iterator<Item = ([f64; 2], [f64; 2])> + '_ {
        PRISM_EDGES
            .iter()
            .map(|&(a, b)| (self.points[a], self.points[b]))
    }
}

/// Project the reference corners and their extrusion into the scene.
///
/// The extrusion depth is guessed as the length of the top edge, the distance
/// between corners 0 and 1.
pub fn project_prism(pose: &Pose, corners: &[[f64; 3]; 4]) -> Result<Prism, ProjectionError> {
    let depth = (corners[1][0] - corners[0][0]).hypot(corners[1][1] - corners[0][1]);

    let mut points = [[0.0; 2]; 8];
    for (i, c) in corners.iter().enumerate() {
        points[i] = pose.project_world_space_to_image(&[c[0], c[1], c[2], 1.0])?;
        points[i + 4] = pose.project_world_space_to_image(&[c[0], c[1], c[2] + depth, 1.0])?;
    }

    Ok(Prism { points })
}
