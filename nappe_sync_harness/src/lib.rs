// Copyright 2026 the Nappe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reusable host and engine doubles for nappe tests and demo harnesses.
//!
//! [`ScriptedHost`] implements [`MapHost`] over plain settable fields with a
//! real spherical-mercator projection, so scenarios exercise the same pixel
//! math a browser host produces. [`RecordingEngine`] implements
//! [`RenderEngine`] by recording every camera push, redraw, prop merge, and
//! pick query into shared [`EngineState`]; pick results are scripted ahead of
//! time. The surfaces a `ScriptedHost` creates record into shared
//! [`PaneState`] the same way.
//!
//! Both states are handed out as `Rc<RefCell<..>>` so a test keeps a window
//! into resources the layer owns exclusively.

#![no_std]

extern crate alloc;

use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::RefCell;
use core::f64::consts::PI;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Point, Size, Vec2};

use nappe_core::engine::{EngineProps, PropsPatch, RenderEngine};
use nappe_core::events::MapEvent;
use nappe_core::geo::LngLat;
use nappe_core::host::{MapHost, SurfacePane};
use nappe_core::layer::ViewportSyncLayer;
use nappe_core::trace::{
    AttachEvent, PauseEvent, PickEvent, PickProbe, RefreshEvent, ResumeEvent, TraceSink,
    TransformEvent,
};
use nappe_core::view::ViewState;

/// Pixel size of one world tile at zoom 0.
const TILE_SIZE: f64 = 256.0;

/// Scene object returned by the recording engine's scripted picks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PickedObject {
    /// Arbitrary scripted identity.
    pub id: u32,
}

// ---------------------------------------------------------------------------
// Recording surface
// ---------------------------------------------------------------------------

/// Everything that happened to a [`RecordingPane`].
#[derive(Clone, Debug, Default)]
pub struct PaneState {
    /// Pane name passed at surface creation, if any.
    pub pane_name: Option<String>,
    /// Whether the surface was tagged for zoom-animation styling.
    pub zoom_animated_class: bool,
    /// Every size write, in order.
    pub sizes: Vec<Size>,
    /// Every position write, in order.
    pub positions: Vec<Point>,
    /// Every transform write `(offset, scale)`, in order.
    pub transforms: Vec<(Point, f64)>,
    /// Current top-left position.
    pub position: Point,
    /// Number of `remove` calls.
    pub removed: u32,
}

/// A [`SurfacePane`] that records every operation into shared [`PaneState`].
#[derive(Debug)]
pub struct RecordingPane {
    state: Rc<RefCell<PaneState>>,
    engine: Rc<RefCell<EngineState>>,
}

impl SurfacePane for RecordingPane {
    fn set_size(&mut self, size: Size) {
        self.state.borrow_mut().sizes.push(size);
    }

    fn set_position(&mut self, position: Point) {
        let mut state = self.state.borrow_mut();
        state.positions.push(position);
        state.position = position;
    }

    fn position(&self) -> Point {
        self.state.borrow().position
    }

    fn set_transform(&mut self, offset: Point, scale: f64) {
        let mut state = self.state.borrow_mut();
        state.transforms.push((offset, scale));
        state.position = offset;
    }

    fn remove(&mut self) {
        self.state.borrow_mut().removed += 1;
    }
}

// ---------------------------------------------------------------------------
// Recording engine
// ---------------------------------------------------------------------------

/// Everything that happened to a [`RecordingEngine`].
#[derive(Debug, Default)]
pub struct EngineState {
    /// `(props, view)` pairs from every `create` call.
    pub created: Vec<(EngineProps, ViewState)>,
    /// Every camera push, in order.
    pub views: Vec<ViewState>,
    /// The `force` flag of every redraw, in order.
    pub redraws: Vec<bool>,
    /// Every prop patch merged, in order.
    pub patches: Vec<PropsPatch>,
    /// Current animation-loop flag.
    pub animate: bool,
    /// Every write to the animation flag, in order.
    pub animate_writes: Vec<bool>,
    /// Query point of every pick, in order.
    pub picks: Vec<Point>,
    /// Scripted pick results, consumed front to back; exhausted means miss.
    pub pick_script: VecDeque<Option<PickedObject>>,
    /// Number of `finalize` calls.
    pub finalized: u32,
}

impl EngineState {
    /// Queues a scripted result for the next pick query.
    pub fn script_pick(&mut self, result: Option<PickedObject>) {
        self.pick_script.push_back(result);
    }
}

/// A [`RenderEngine`] that records every operation into shared
/// [`EngineState`].
///
/// `create` picks its state handle up from the [`RecordingPane`] it is bound
/// to, so a [`ScriptedHost`] test sees engine activity without ever holding
/// the engine itself.
#[derive(Debug)]
pub struct RecordingEngine {
    state: Rc<RefCell<EngineState>>,
}

impl RenderEngine for RecordingEngine {
    type Surface = RecordingPane;
    type Picked = PickedObject;

    fn create(surface: &RecordingPane, props: &EngineProps, view: ViewState) -> Self {
        let state = Rc::clone(&surface.engine);
        state.borrow_mut().created.push((props.clone(), view));
        Self { state }
    }

    fn merge_props(&mut self, patch: &PropsPatch) {
        self.state.borrow_mut().patches.push(*patch);
    }

    fn set_view_state(&mut self, view: ViewState) {
        self.state.borrow_mut().views.push(view);
    }

    fn redraw(&mut self, force: bool) {
        self.state.borrow_mut().redraws.push(force);
    }

    fn pick(&mut self, at: Point) -> Option<PickedObject> {
        let mut state = self.state.borrow_mut();
        state.picks.push(at);
        state.pick_script.pop_front().flatten()
    }

    fn animate(&self) -> bool {
        self.state.borrow().animate
    }

    fn set_animate(&mut self, animate: bool) {
        let mut state = self.state.borrow_mut();
        state.animate = animate;
        state.animate_writes.push(animate);
    }

    fn finalize(&mut self) {
        self.state.borrow_mut().finalized += 1;
    }
}

// ---------------------------------------------------------------------------
// Scripted host
// ---------------------------------------------------------------------------

/// A [`MapHost`] with settable viewport state and a real spherical-mercator
/// projection.
///
/// Mutate the public fields between events to script viewport changes, then
/// deliver the matching [`MapEvent`]s with [`drive`] or
/// [`ViewportSyncLayer::dispatch`].
#[derive(Debug)]
pub struct ScriptedHost {
    /// Current geographic center.
    pub center: LngLat,
    /// Current zoom level.
    pub zoom: f64,
    /// Viewport pixel size.
    pub size: Size,
    /// Internal pane translation.
    pub pane_offset: Vec2,
    /// Whether this host animates zoom smoothly.
    pub zoom_animated: bool,
    /// Whether a zoom animation is in progress.
    pub animating_zoom: bool,
    /// Whether the environment supports 3D transforms.
    pub any3d: bool,
    pane: Rc<RefCell<PaneState>>,
    engine: Rc<RefCell<EngineState>>,
}

impl Default for ScriptedHost {
    fn default() -> Self {
        Self::at(LngLat::new(0.0, 0.0), 10.0)
    }
}

impl ScriptedHost {
    /// Creates a host centered at `center` / `zoom` with an 1024×768
    /// viewport, smooth zoom, and 3D transforms.
    #[must_use]
    pub fn at(center: LngLat, zoom: f64) -> Self {
        Self {
            center,
            zoom,
            size: Size::new(1024.0, 768.0),
            pane_offset: Vec2::ZERO,
            zoom_animated: true,
            animating_zoom: false,
            any3d: true,
            pane: Rc::default(),
            engine: Rc::default(),
        }
    }

    /// Shared record of the surface this host created.
    #[must_use]
    pub fn pane_state(&self) -> Rc<RefCell<PaneState>> {
        Rc::clone(&self.pane)
    }

    /// Shared record of the engine bound to this host's surface.
    #[must_use]
    pub fn engine_state(&self) -> Rc<RefCell<EngineState>> {
        Rc::clone(&self.engine)
    }
}

impl MapHost for ScriptedHost {
    type Surface = RecordingPane;

    fn center(&self) -> LngLat {
        self.center
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn size(&self) -> Size {
        self.size
    }

    fn pane_offset(&self) -> Vec2 {
        self.pane_offset
    }

    fn project(&self, point: LngLat, zoom: f64) -> Point {
        // Standard spherical mercator over a 256-px zoom-0 world, the same
        // projection slippy-map widgets use.
        let world = TILE_SIZE * 2.0_f64.powf(zoom);
        let x = (point.lng / 360.0 + 0.5) * world;
        let siny = (point.lat * PI / 180.0).sin().clamp(-0.9999, 0.9999);
        let y = (0.5 - ((1.0 + siny) / (1.0 - siny)).ln() / (4.0 * PI)) * world;
        Point::new(x, y)
    }

    fn zoom_scale(&self, to_zoom: f64, from_zoom: f64) -> f64 {
        2.0_f64.powf(to_zoom - from_zoom)
    }

    fn zoom_animated(&self) -> bool {
        self.zoom_animated
    }

    fn animating_zoom(&self) -> bool {
        self.animating_zoom
    }

    fn supports_3d_transforms(&self) -> bool {
        self.any3d
    }

    fn create_surface(&self, pane: Option<&str>, zoom_animated: bool) -> RecordingPane {
        {
            let mut state = self.pane.borrow_mut();
            state.pane_name = pane.map(ToString::to_string);
            state.zoom_animated_class = zoom_animated;
        }
        RecordingPane {
            state: Rc::clone(&self.pane),
            engine: Rc::clone(&self.engine),
        }
    }
}

/// Delivers a sequence of events to `layer` against `host`.
pub fn drive<E>(layer: &mut ViewportSyncLayer<E>, host: &ScriptedHost, events: &[MapEvent])
where
    E: RenderEngine<Surface = RecordingPane>,
{
    for event in events {
        layer.dispatch(host, event);
    }
}

// ---------------------------------------------------------------------------
// Recording trace sink
// ---------------------------------------------------------------------------

/// One recorded trace event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TraceRecord {
    /// Layer attached with this initial camera.
    Attach(ViewState),
    /// Layer detached.
    Detach,
    /// Full refresh ran (`false`) or was suppressed (`true`).
    Refresh(bool),
    /// Continuous transform applied with this scale.
    Transform(f64),
    /// Gesture start; whether the animation flag was saved.
    Pause(bool),
    /// Gesture end; whether a saved flag was restored.
    Resume(bool),
    /// Pick query; which probe and whether it hit.
    Pick(PickProbe, bool),
}

/// A [`TraceSink`] that appends every event to a shared log.
///
/// Only receives events when `nappe_core`'s `trace` feature is enabled.
#[derive(Debug)]
pub struct RecordingSink {
    log: Rc<RefCell<Vec<TraceRecord>>>,
}

impl RecordingSink {
    /// Creates a sink appending to `log`.
    #[must_use]
    pub fn new(log: Rc<RefCell<Vec<TraceRecord>>>) -> Self {
        Self { log }
    }
}

impl TraceSink for RecordingSink {
    fn on_attach(&mut self, e: &AttachEvent) {
        self.log.borrow_mut().push(TraceRecord::Attach(e.view));
    }

    fn on_detach(&mut self) {
        self.log.borrow_mut().push(TraceRecord::Detach);
    }

    fn on_refresh(&mut self, e: &RefreshEvent) {
        self.log.borrow_mut().push(TraceRecord::Refresh(e.skipped));
    }

    fn on_transform(&mut self, e: &TransformEvent) {
        self.log.borrow_mut().push(TraceRecord::Transform(e.scale));
    }

    fn on_pause(&mut self, e: &PauseEvent) {
        self.log.borrow_mut().push(TraceRecord::Pause(e.saved));
    }

    fn on_resume(&mut self, e: &ResumeEvent) {
        self.log.borrow_mut().push(TraceRecord::Resume(e.restored));
    }

    fn on_pick(&mut self, e: &PickEvent) {
        self.log.borrow_mut().push(TraceRecord::Pick(e.probe, e.hit));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_puts_null_island_at_world_center() {
        let host = ScriptedHost::default();
        let p = host.project(LngLat::new(0.0, 0.0), 0.0);
        assert!((p.x - 128.0).abs() < 1e-9);
        assert!((p.y - 128.0).abs() < 1e-9);
    }

    #[test]
    fn projection_scales_with_zoom() {
        let host = ScriptedHost::default();
        let at_zero = host.project(LngLat::new(30.0, 0.0), 0.0);
        let at_three = host.project(LngLat::new(30.0, 0.0), 3.0);
        assert!((at_three.x - at_zero.x * 8.0).abs() < 1e-9);
    }

    #[test]
    fn zoom_scale_is_power_of_two() {
        let host = ScriptedHost::default();
        assert_eq!(host.zoom_scale(6.0, 5.0), 2.0);
        assert_eq!(host.zoom_scale(5.0, 6.0), 0.5);
        assert_eq!(host.zoom_scale(4.0, 4.0), 1.0);
    }

    #[test]
    fn pick_script_is_consumed_in_order() {
        let host = ScriptedHost::default();
        let surface = host.create_surface(None, true);
        let mut engine = RecordingEngine::create(
            &surface,
            &EngineProps::default(),
            ViewState::default(),
        );
        host.engine_state()
            .borrow_mut()
            .script_pick(Some(PickedObject { id: 1 }));
        host.engine_state().borrow_mut().script_pick(None);

        assert_eq!(engine.pick(Point::ZERO), Some(PickedObject { id: 1 }));
        assert_eq!(engine.pick(Point::ZERO), None);
        // Exhausted script keeps missing.
        assert_eq!(engine.pick(Point::ZERO), None);
        assert_eq!(host.engine_state().borrow().picks.len(), 3);
    }

    #[test]
    fn surface_creation_records_pane_and_class() {
        let host = ScriptedHost::default();
        let _surface = host.create_surface(Some("overlay"), true);
        let state = host.pane_state();
        assert_eq!(state.borrow().pane_name.as_deref(), Some("overlay"));
        assert!(state.borrow().zoom_animated_class);
    }
}
