// Copyright 2026 the Nappe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rendering-engine contract and configuration.
//!
//! The layer never renders; it drives an engine behind the [`RenderEngine`]
//! trait. Both GPU-backed engines and recording test doubles implement it.
//!
//! Configuration follows a replace-wholesale discipline: [`EngineProps`] is
//! an immutable value, and [`EngineProps::apply`] produces a *new* value from
//! a [`PropsPatch`] instead of mutating shared state in place. The layer
//! forwards the same patch to the live engine, which keeps its own copy.

use alloc::string::String;

use kurbo::Point;

use crate::view::ViewState;

/// Engine configuration carried by the layer.
///
/// The layer itself consumes only `controller` (forced off at engine
/// creation) and `pane` (surface placement, fixed at attach time); the rest
/// is forwarded to the engine uninterpreted and unvalidated — engine-side
/// validation, if any, governs failure behavior.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineProps {
    /// Whether the engine runs its own continuous animation loop.
    pub animate: bool,
    /// Picking tolerance in pixels around the query point.
    pub pick_radius: f64,
    /// Whether the engine renders at native device resolution.
    pub use_device_pixels: bool,
    /// Whether the engine's own navigation controls are enabled.
    ///
    /// Always forced off when the layer creates the engine: the host map is
    /// the sole source of navigation input.
    pub controller: bool,
    /// Name of the host pane the surface is inserted into, or `None` for the
    /// host's default overlay pane. Read once at attach time.
    pub pane: Option<String>,
}

impl Default for EngineProps {
    fn default() -> Self {
        Self {
            animate: false,
            pick_radius: 0.0,
            use_device_pixels: true,
            controller: false,
            pane: None,
        }
    }
}

impl EngineProps {
    /// Returns a new configuration with `patch` merged over `self`.
    ///
    /// Fields absent from the patch are carried over unchanged. `pane` is not
    /// patchable: the surface is created once, at attach time.
    #[must_use]
    pub fn apply(&self, patch: &PropsPatch) -> Self {
        Self {
            animate: patch.animate.unwrap_or(self.animate),
            pick_radius: patch.pick_radius.unwrap_or(self.pick_radius),
            use_device_pixels: patch.use_device_pixels.unwrap_or(self.use_device_pixels),
            controller: patch.controller.unwrap_or(self.controller),
            pane: self.pane.clone(),
        }
    }
}

/// A partial configuration update.
///
/// `None` fields leave the current value untouched.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct PropsPatch {
    /// New animation-loop flag, if changing.
    pub animate: Option<bool>,
    /// New picking tolerance, if changing.
    pub pick_radius: Option<f64>,
    /// New device-pixel flag, if changing.
    pub use_device_pixels: Option<bool>,
    /// New controller flag, if changing.
    pub controller: Option<bool>,
}

impl PropsPatch {
    /// A patch that changes nothing.
    pub const EMPTY: Self = Self {
        animate: None,
        pick_radius: None,
        use_device_pixels: None,
        controller: None,
    };
}

/// A rendering engine driven by the layer.
///
/// The engine owns the GPU pipeline, the scene, and picking; the layer only
/// pushes camera state into it and issues pick queries. Engines are created
/// bound to a surface at attach time and torn down with an explicit
/// [`finalize`](Self::finalize) call at detach — dropping without finalizing
/// is an engine-implementation concern, not part of this contract.
pub trait RenderEngine: Sized {
    /// The surface type the engine draws into.
    type Surface: crate::host::SurfacePane;

    /// The scene object returned by a successful pick query.
    type Picked;

    /// Creates an engine drawing into `surface`.
    ///
    /// `props.controller` is always false here; the layer disables engine
    /// navigation so the host map remains the sole navigation input.
    fn create(surface: &Self::Surface, props: &EngineProps, view: ViewState) -> Self;

    /// Merges a configuration patch into the engine's own props copy.
    fn merge_props(&mut self, patch: &PropsPatch);

    /// Pushes new camera parameters into the engine.
    fn set_view_state(&mut self, view: ViewState);

    /// Redraws the scene. With `force`, change detection is bypassed.
    fn redraw(&mut self, force: bool);

    /// Picks the topmost scene object at a surface-relative pixel point.
    fn pick(&mut self, at: Point) -> Option<Self::Picked>;

    /// Current value of the engine's animation-loop flag.
    fn animate(&self) -> bool;

    /// Sets the engine's animation-loop flag.
    fn set_animate(&mut self, animate: bool);

    /// Releases all engine resources (GPU contexts, buffers, listeners).
    fn finalize(&mut self);
}
