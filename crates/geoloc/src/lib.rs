#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use geoloc_geo as geo;

#[doc(inline)]
pub use geoloc_3d as k3d;

#[doc(inline)]
pub use geoloc_locator as locator;
