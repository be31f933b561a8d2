use geoloc_3d::{ground::HolderHeight, pnp::PnPParams};
use serde::{Deserialize, Serialize};

/// Parameters of a localization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorParams {
    /// Place the ground below the camera by the holder height instead of at the camera.
    pub consider_holder_height: bool,
    /// Project the 3D box of the reference object into the scene.
    pub calc_projection: bool,
    /// Compute the geographic position of the camera and the object bearing.
    pub calc_geo_location: bool,
    /// Body height model of the photographer.
    pub holder_height: HolderHeight,
    /// PnP solver parameters.
    pub pnp: PnPParams,
}

impl Default for LocatorParams {
    fn default() -> Self {
        Self {
            consider_holder_height: true,
            calc_projection: true,
            calc_geo_location: true,
            holder_height: HolderHeight::default(),
            pnp: PnPParams::default(),
        }
    }
}

impl LocatorParams {
    /// Create default locator parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether the holder height is considered.
    pub fn with_consider_holder_height(mut self, enabled: bool) -> Self {
        self.consider_holder_height = enabled;
        self
    }

    /// Set whether the prism projection is computed.
    pub fn with_calc_projection(mut self, enabled: bool) -> Self {
        self.calc_projection = enabled;
        self
    }

    /// Set whether the geographic location is computed.
    pub fn with_calc_geo_location(mut self, enabled: bool) -> Self {
        self.calc_geo_location = enabled;
        self
    }

    /// Set the holder height model.
    pub fn with_holder_height(mut self, holder_height: HolderHeight) -> Self {
        self.holder_height = holder_height;
        self
    }

    /// Set the PnP solver parameters.
    pub fn with_pnp(mut self, pnp: PnPParams) -> Self {
        self.pnp = pnp;
        self
    }
}
