// Copyright 2026 the Nappe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Engine-side camera state derived from the host map's viewport.
//!
//! [`ViewState`] is a *derived* value, never stored: it is recomputed from the
//! host's current center and zoom on every refresh. The derivation encodes two
//! fixed rules:
//!
//! - The engine zoom is the host zoom minus [`ZOOM_OFFSET`]. Slippy-map
//!   widgets treat zoom 0 as one 256-px world tile, while GPU overlay
//!   renderers treat zoom 0 as a 512-px world; the one-level offset reconciles
//!   the two conventions.
//! - Pitch and bearing are pinned to zero: a 2D slippy map has no tilt or
//!   rotation concept for the overlay to follow.

use crate::geo::LngLat;

/// Difference between the host map's zoom scale and the engine's.
pub const ZOOM_OFFSET: f64 = 1.0;

/// Camera parameters handed to the rendering engine.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct ViewState {
    /// Camera longitude in degrees.
    pub longitude: f64,
    /// Camera latitude in degrees.
    pub latitude: f64,
    /// Engine zoom level (host zoom − [`ZOOM_OFFSET`]).
    pub zoom: f64,
    /// Camera tilt. Always zero for a 2D host.
    pub pitch: f64,
    /// Camera rotation. Always zero for a 2D host.
    pub bearing: f64,
}

impl ViewState {
    /// Derives the engine camera from the host map's center and zoom.
    #[inline]
    #[must_use]
    pub fn from_host(center: LngLat, host_zoom: f64) -> Self {
        Self {
            longitude: center.lng,
            latitude: center.lat,
            zoom: host_zoom - ZOOM_OFFSET,
            pitch: 0.0,
            bearing: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_is_offset_by_one() {
        let view = ViewState::from_host(LngLat::new(10.0, 20.0), 5.0);
        assert_eq!(view.longitude, 10.0);
        assert_eq!(view.latitude, 20.0);
        assert_eq!(view.zoom, 4.0);
    }

    #[test]
    fn pitch_and_bearing_are_pinned() {
        for zoom in [0.0, 3.5, 18.0] {
            let view = ViewState::from_host(LngLat::new(-73.98, 40.75), zoom);
            assert_eq!(view.pitch, 0.0);
            assert_eq!(view.bearing, 0.0);
        }
    }

    #[test]
    fn fractional_zoom_preserved() {
        let view = ViewState::from_host(LngLat::default(), 7.25);
        assert_eq!(view.zoom, 6.25);
    }
}
