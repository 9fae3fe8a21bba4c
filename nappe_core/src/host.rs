// Copyright 2026 the Nappe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host-map contract for widget integrations.
//!
//! Nappe splits widget-specific work into *backend* crates. Each backend
//! provides two pieces:
//!
//! - **Map host** — Implements [`MapHost`] over the widget's viewport query
//!   API (center, zoom, pixel size, pane offset, projection, zoom-scale
//!   conversion) plus its capability flags (zoom animation, 3D transforms).
//!
//! - **Surface pane** — Implements [`SurfacePane`] over the widget's layer
//!   container mechanism (a DOM `<div>` in a map pane, or an equivalent
//!   native view). The surface is the rectangle the rendering engine draws
//!   into; the layer resizes, repositions, and transforms it to track the
//!   viewport.
//!
//! Event *delivery* is backend-specific and not abstracted by a trait: how
//! listener closures are registered and torn down differs fundamentally
//! between hosts, so backends translate native events into
//! [`MapEvent`](crate::events::MapEvent) values and feed them to
//! [`MapLayer::handle_event`](crate::layer::MapLayer::handle_event) directly.
//!
//! # Crate boundaries
//!
//! `nappe_core` owns the adapter and both contracts in this module. Backend
//! crates depend on `nappe_core` and provide widget glue. Application code
//! depends on both and registers the layer with the real widget.

use kurbo::{Point, Size, Vec2};

use crate::geo::LngLat;

/// Viewport queries and capabilities of the host map widget.
///
/// All methods are read-only snapshots of the widget's current state; the
/// layer calls them on every refresh rather than caching the results. Both
/// browser-widget hosts and scripted test hosts implement this trait,
/// enabling generic layers and test doubles.
pub trait MapHost {
    /// The surface type this host creates for attached layers.
    type Surface: SurfacePane;

    /// Current geographic center of the viewport.
    fn center(&self) -> LngLat;

    /// Current zoom level, in the host's own zoom convention.
    fn zoom(&self) -> f64;

    /// Pixel size of the viewport.
    fn size(&self) -> Size;

    /// The widget's internal pane translation, in pixels.
    ///
    /// Slippy-map widgets pan by translating an inner pane rather than
    /// re-rendering; the layer cancels this translation out so its surface
    /// stays pinned to the viewport.
    fn pane_offset(&self) -> Vec2;

    /// Projects a geographic point to world pixel coordinates at `zoom`.
    fn project(&self, point: LngLat, zoom: f64) -> Point;

    /// Scale factor between two zoom levels (`2^(to − from)` under the usual
    /// power-of-two pyramid, but the host's convention governs).
    fn zoom_scale(&self, to_zoom: f64, from_zoom: f64) -> f64;

    /// Whether this host animates zoom transitions smoothly.
    ///
    /// Static for the host's lifetime; it decides whether the layer
    /// subscribes to zoom-animation frames.
    fn zoom_animated(&self) -> bool;

    /// Whether a zoom animation is in progress right now.
    ///
    /// While true, full refreshes are suppressed so the layer does not fight
    /// the host's animated transform path.
    fn animating_zoom(&self) -> bool;

    /// Whether the environment supports hardware-accelerated 3D transforms.
    ///
    /// When false, continuous transform updates degrade to plain position
    /// updates.
    fn supports_3d_transforms(&self) -> bool;

    /// Creates a layer surface inside the host's rendering pane.
    ///
    /// The host inserts a non-interactive container (pointer events must pass
    /// through to the map's own gesture handling) into the pane named by
    /// `pane`, or its default overlay pane when `None`. When `zoom_animated`
    /// is true the container is tagged for the host's zoom-animation styling.
    fn create_surface(&self, pane: Option<&str>, zoom_animated: bool) -> Self::Surface;
}

/// A layer's drawing surface inside the host's pane.
///
/// Implementations map these operations onto the widget's container
/// mechanism; the web backend maps them onto CSS properties of a `<div>`.
/// All methods are infallible: a surface write that the environment rejects
/// is dropped, matching how DOM style writes behave.
pub trait SurfacePane {
    /// Resizes the surface to the given pixel size.
    fn set_size(&mut self, size: Size);

    /// Moves the surface to `position`, clearing any scale transform.
    fn set_position(&mut self, position: Point);

    /// Current top-left position previously set by [`set_position`] or
    /// [`set_transform`].
    ///
    /// [`set_position`]: Self::set_position
    /// [`set_transform`]: Self::set_transform
    fn position(&self) -> Point;

    /// Applies a combined translate-and-scale transform with origin at the
    /// surface's top-left corner.
    fn set_transform(&mut self, offset: Point, scale: f64);

    /// Detaches the surface from its parent pane.
    fn remove(&mut self);
}
