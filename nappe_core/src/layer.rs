// Copyright 2026 the Nappe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The viewport-sync layer.
//!
//! [`ViewportSyncLayer`] owns, for its attached lifetime, exactly one
//! [`SurfacePane`] and one [`RenderEngine`] instance, and keeps the engine's
//! camera, the surface's pixel size, and the surface's screen position in
//! lockstep with the host map's viewport:
//!
//! - **Full refresh** ([`update`](ViewportSyncLayer::update)) — resize the
//!   surface, cancel the host's pane translation, recompute the camera from
//!   the host's center/zoom, push it into the engine, redraw. Suppressed
//!   while the host runs a zoom animation.
//! - **Continuous transform** — during smooth zoom interpolation the surface
//!   is repositioned and rescaled with pure pixel math, frame by frame,
//!   without touching the engine at all; the full refresh at gesture end
//!   settles the engine on the final camera.
//! - **Animation pause** — while the host interpolates the viewport, the
//!   engine's own animation loop is forced off so motion is not applied
//!   twice, and restored afterwards.
//! - **Pointer translation** — clicks and hovers become pick queries against
//!   the engine; results are delivered to the registered
//!   [`PointerHandlers`].
//!
//! The layer is purely reactive and single-threaded: every method is a
//! synchronous handler invoked by the host's own event dispatch. The
//! attached/detached lifecycle is explicit — handlers that arrive while
//! detached are silently dropped.

use alloc::boxed::Box;

use kurbo::Point;

use crate::engine::{EngineProps, PropsPatch, RenderEngine};
use crate::events::{BASE_EVENTS, EventKind, MapEvent, ZOOM_ANIMATED_EVENTS};
use crate::geo::LngLat;
use crate::host::{MapHost, SurfacePane};
use crate::trace::{
    AttachEvent, PauseEvent, PickEvent, PickProbe, RefreshEvent, ResumeEvent, TraceSink, Tracer,
    TransformEvent,
};
use crate::view::ViewState;

/// The layer capability interface a host map drives.
///
/// Hosts call [`on_add`](Self::on_add) / [`on_remove`](Self::on_remove) when
/// the layer is registered/unregistered, query [`events`](Self::events) once
/// to learn which streams to deliver, and feed those streams through
/// [`handle_event`](Self::handle_event). The adapter implements this trait by
/// composition over [`MapHost`] instead of subclassing a widget base class.
pub trait MapLayer<H: MapHost> {
    /// Attaches the layer to `host`.
    fn on_add(&mut self, host: &H);

    /// Detaches the layer from `host`, releasing owned resources.
    fn on_remove(&mut self, host: &H);

    /// The event streams this layer wants delivered. Static for the layer's
    /// lifetime.
    fn events(&self, host: &H) -> &'static [EventKind];

    /// Delivers one host event.
    fn handle_event(&mut self, host: &H, event: &MapEvent);
}

/// Named pointer-interaction handlers.
///
/// Absent handlers mean "feature disabled": the corresponding pick query is
/// skipped entirely, so registering no hover handler costs nothing per
/// pointer move.
pub struct PointerHandlers<P> {
    /// Invoked with the picked object when a click hits one.
    pub on_click: Option<Box<dyn FnMut(&P)>>,
    /// Invoked on every pointer move with the picked object (or `None` on a
    /// miss) and the pointer position; invoked with `(None, None)` when the
    /// pointer leaves the map.
    pub on_hover: Option<Box<dyn FnMut(Option<&P>, Option<Point>)>>,
}

impl<P> Default for PointerHandlers<P> {
    fn default() -> Self {
        Self {
            on_click: None,
            on_hover: None,
        }
    }
}

impl<P> core::fmt::Debug for PointerHandlers<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PointerHandlers")
            .field("on_click", &self.on_click.is_some())
            .field("on_hover", &self.on_hover.is_some())
            .finish()
    }
}

impl<P> PointerHandlers<P> {
    /// No handlers registered.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Registers a click handler.
    #[must_use]
    pub fn with_click(mut self, f: impl FnMut(&P) + 'static) -> Self {
        self.on_click = Some(Box::new(f));
        self
    }

    /// Registers a hover handler.
    #[must_use]
    pub fn with_hover(mut self, f: impl FnMut(Option<&P>, Option<Point>) + 'static) -> Self {
        self.on_hover = Some(Box::new(f));
        self
    }
}

/// Resources owned for one attached lifetime.
struct Active<E: RenderEngine> {
    surface: E::Surface,
    engine: E,
}

/// Keeps a rendering engine's camera, size, and screen position in lockstep
/// with a host map's viewport. See the [module docs](self) for the sync
/// model.
pub struct ViewportSyncLayer<E: RenderEngine> {
    props: EngineProps,
    handlers: PointerHandlers<E::Picked>,
    active: Option<Active<E>>,
    /// Saved engine animation flag while a gesture is in progress. Filled
    /// only when the flag was true at gesture start.
    saved_animate: Option<bool>,
    tracer: Tracer,
}

impl<E: RenderEngine> core::fmt::Debug for ViewportSyncLayer<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ViewportSyncLayer")
            .field("props", &self.props)
            .field("attached", &self.active.is_some())
            .field("saved_animate", &self.saved_animate)
            .finish_non_exhaustive()
    }
}

impl<E: RenderEngine> ViewportSyncLayer<E> {
    /// Creates a detached layer with the given engine configuration and
    /// pointer handlers.
    #[must_use]
    pub fn new(props: EngineProps, handlers: PointerHandlers<E::Picked>) -> Self {
        Self {
            props,
            handlers,
            active: None,
            saved_animate: None,
            tracer: Tracer::none(),
        }
    }

    /// Routes trace events to `sink`. Only effective with the `trace`
    /// feature enabled.
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) {
        self.tracer = Tracer::new(sink);
    }

    /// Current engine configuration.
    #[must_use]
    pub fn props(&self) -> &EngineProps {
        &self.props
    }

    /// Whether the layer currently owns a surface and an engine.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.active.is_some()
    }

    /// Merges a configuration patch, forwarding it to the engine when
    /// attached.
    ///
    /// The stored configuration is an immutable value: merging produces a new
    /// record rather than mutating the old one in place. No validation is
    /// performed; engine-side validation governs failures.
    pub fn set_props(&mut self, patch: &PropsPatch) {
        self.props = self.props.apply(patch);
        if let Some(active) = &mut self.active {
            active.engine.merge_props(patch);
        }
    }

    /// Replaces the pointer handlers.
    pub fn set_handlers(&mut self, handlers: PointerHandlers<E::Picked>) {
        self.handlers = handlers;
    }

    /// Attaches to `host`: creates the surface in the host's pane, creates
    /// the engine bound to it (navigation controls disabled), and performs a
    /// full refresh. A second attach while already attached is a no-op.
    ///
    /// Returns `&mut self` for fluent registration.
    pub fn attach<H>(&mut self, host: &H) -> &mut Self
    where
        H: MapHost<Surface = E::Surface>,
    {
        if self.active.is_some() {
            return self;
        }

        let surface = host.create_surface(self.props.pane.as_deref(), host.zoom_animated());
        let view = ViewState::from_host(host.center(), host.zoom());
        // The host map is the sole source of navigation input.
        let props = EngineProps {
            controller: false,
            ..self.props.clone()
        };
        let engine = E::create(&surface, &props, view);
        self.active = Some(Active { surface, engine });

        self.tracer.attach(&AttachEvent { view });
        self.update(host);
        self
    }

    /// Detaches: removes the surface from its pane and finalizes the engine
    /// exactly once. A second detach is a silent no-op, as is any event
    /// delivered after this point.
    pub fn detach(&mut self) {
        let Some(mut active) = self.active.take() else {
            return;
        };
        active.surface.remove();
        active.engine.finalize();
        self.saved_animate = None;
        self.tracer.detach();
    }

    /// The event streams to register with `host`. Includes the
    /// zoom-animation frame stream only for zoom-animated hosts.
    #[must_use]
    pub fn subscriptions<H: MapHost>(&self, host: &H) -> &'static [EventKind] {
        if host.zoom_animated() {
            ZOOM_ANIMATED_EVENTS
        } else {
            BASE_EVENTS
        }
    }

    /// Delivers one host event. Silently dropped while detached.
    pub fn dispatch<H>(&mut self, host: &H, event: &MapEvent)
    where
        H: MapHost<Surface = E::Surface>,
    {
        if self.active.is_none() {
            return;
        }
        match *event {
            MapEvent::ViewReset => {
                self.update_transform(host, host.center(), host.zoom());
                self.update(host);
            }
            MapEvent::MoveStart | MapEvent::ZoomStart => self.pause_animation(),
            MapEvent::MoveEnd => {
                // Settle the engine on the final camera before the engine's
                // own animation resumes.
                self.update(host);
                self.resume_animation();
            }
            MapEvent::ZoomEnd => self.resume_animation(),
            MapEvent::Zoom => self.update_transform(host, host.center(), host.zoom()),
            MapEvent::ZoomAnim { center, zoom } => self.update_transform(host, center, zoom),
            MapEvent::Click { point } => self.pointer_click(point),
            MapEvent::PointerMove { point } => self.pointer_move(point),
            MapEvent::PointerLeave => self.pointer_leave(),
        }
    }

    /// Full refresh: surface size, surface position, engine camera, redraw.
    ///
    /// A strict no-op while the host reports an in-progress zoom animation;
    /// the continuous transform path owns the surface during that window.
    pub fn update<H>(&mut self, host: &H)
    where
        H: MapHost<Surface = E::Surface>,
    {
        let Some(active) = &mut self.active else {
            return;
        };
        if host.animating_zoom() {
            self.tracer.refresh(&RefreshEvent {
                skipped: true,
                view: None,
            });
            return;
        }

        active.surface.set_size(host.size());
        // Cancel the pane translation so the surface stays pinned to the
        // viewport.
        active.surface.set_position((-host.pane_offset()).to_point());

        let view = ViewState::from_host(host.center(), host.zoom());
        active.engine.set_view_state(view);
        active.engine.redraw(false);

        self.tracer.refresh(&RefreshEvent {
            skipped: false,
            view: Some(view),
        });
    }

    /// Tracks one frame of the host's zoom interpolation with pure DOM
    /// transform math, leaving the engine untouched.
    ///
    /// Both centers are projected at the *target* zoom; the scale transform
    /// is anchored at the viewport center by composing half the viewport size
    /// on both sides of the scale.
    fn update_transform<H>(&mut self, host: &H, center: LngLat, zoom: f64)
    where
        H: MapHost<Surface = E::Surface>,
    {
        let Some(active) = &mut self.active else {
            return;
        };

        let scale = host.zoom_scale(zoom, host.zoom());
        let position = active.surface.position().to_vec2();
        let view_half = host.size().to_vec2() * 0.5;
        let current_center = host.project(host.center(), zoom);
        let dest_center = host.project(center, zoom);
        let center_offset = dest_center - current_center;
        let top_left = (view_half * -scale + position + view_half - center_offset).to_point();

        let degraded = !host.supports_3d_transforms();
        if degraded {
            active.surface.set_position(top_left);
        } else {
            active.surface.set_transform(top_left, scale);
        }

        self.tracer.transform(&TransformEvent {
            scale,
            offset: top_left,
            degraded,
        });
    }

    /// Suspends the engine's own animation loop for the duration of a host
    /// gesture, so camera motion is not applied twice.
    ///
    /// The flag is saved only when currently set; an already-off flag is
    /// never written.
    fn pause_animation(&mut self) {
        let Some(active) = &mut self.active else {
            return;
        };
        let saved = active.engine.animate();
        if saved {
            self.saved_animate = Some(saved);
            active.engine.set_animate(false);
        }
        self.tracer.pause(&PauseEvent { saved });
    }

    /// Restores the animation flag saved by
    /// [`pause_animation`](Self::pause_animation), if any, and clears the
    /// slot.
    fn resume_animation(&mut self) {
        let Some(active) = &mut self.active else {
            return;
        };
        let restored = self.saved_animate.take();
        if let Some(animate) = restored {
            active.engine.set_animate(animate);
        }
        self.tracer.resume(&ResumeEvent {
            restored: restored.is_some(),
        });
    }

    fn pointer_click(&mut self, point: Point) {
        let Some(active) = &mut self.active else {
            return;
        };
        let Some(on_click) = &mut self.handlers.on_click else {
            return;
        };
        let picked = active.engine.pick(point);
        self.tracer.pick(&PickEvent {
            probe: PickProbe::Click,
            at: point,
            hit: picked.is_some(),
        });
        if let Some(picked) = &picked {
            on_click(picked);
        }
    }

    fn pointer_move(&mut self, point: Point) {
        let Some(active) = &mut self.active else {
            return;
        };
        let Some(on_hover) = &mut self.handlers.on_hover else {
            return;
        };
        let picked = active.engine.pick(point);
        self.tracer.pick(&PickEvent {
            probe: PickProbe::Hover,
            at: point,
            hit: picked.is_some(),
        });
        on_hover(picked.as_ref(), Some(point));
    }

    fn pointer_leave(&mut self) {
        if self.active.is_none() {
            return;
        }
        let Some(on_hover) = &mut self.handlers.on_hover else {
            return;
        };
        on_hover(None, None);
    }
}

impl<H, E> MapLayer<H> for ViewportSyncLayer<E>
where
    H: MapHost,
    E: RenderEngine<Surface = H::Surface>,
{
    fn on_add(&mut self, host: &H) {
        let _ = self.attach(host);
    }

    fn on_remove(&mut self, _host: &H) {
        self.detach();
    }

    fn events(&self, host: &H) -> &'static [EventKind] {
        self.subscriptions(host)
    }

    fn handle_event(&mut self, host: &H, event: &MapEvent) {
        self.dispatch(host, event);
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use kurbo::{Size, Vec2};
    #[cfg(not(feature = "std"))]
    use kurbo::common::FloatFuncs as _;

    use super::*;

    // Shared recording state. The host hands clones of these handles to the
    // pane it creates, and the engine picks them up from the pane in
    // `create`, so tests keep a view into resources the layer owns.

    #[derive(Default)]
    struct PaneLog {
        sizes: Vec<Size>,
        positions: Vec<Point>,
        transforms: Vec<(Point, f64)>,
        position: Point,
        removed: u32,
    }

    #[derive(Default)]
    struct EngineLog {
        created: Vec<(EngineProps, ViewState)>,
        views: Vec<ViewState>,
        redraws: Vec<bool>,
        patches: Vec<PropsPatch>,
        animate_writes: Vec<bool>,
        animate: bool,
        picks: Vec<Point>,
        pick_result: Option<u32>,
        finalized: u32,
    }

    struct TestPane {
        pane: Rc<RefCell<PaneLog>>,
        engine: Rc<RefCell<EngineLog>>,
    }

    impl SurfacePane for TestPane {
        fn set_size(&mut self, size: Size) {
            self.pane.borrow_mut().sizes.push(size);
        }

        fn set_position(&mut self, position: Point) {
            let mut log = self.pane.borrow_mut();
            log.positions.push(position);
            log.position = position;
        }

        fn position(&self) -> Point {
            self.pane.borrow().position
        }

        fn set_transform(&mut self, offset: Point, scale: f64) {
            let mut log = self.pane.borrow_mut();
            log.transforms.push((offset, scale));
            log.position = offset;
        }

        fn remove(&mut self) {
            self.pane.borrow_mut().removed += 1;
        }
    }

    struct TestEngine {
        log: Rc<RefCell<EngineLog>>,
    }

    impl RenderEngine for TestEngine {
        type Surface = TestPane;
        type Picked = u32;

        fn create(surface: &TestPane, props: &EngineProps, view: ViewState) -> Self {
            let log = Rc::clone(&surface.engine);
            log.borrow_mut().created.push((props.clone(), view));
            Self { log }
        }

        fn merge_props(&mut self, patch: &PropsPatch) {
            self.log.borrow_mut().patches.push(*patch);
        }

        fn set_view_state(&mut self, view: ViewState) {
            self.log.borrow_mut().views.push(view);
        }

        fn redraw(&mut self, force: bool) {
            self.log.borrow_mut().redraws.push(force);
        }

        fn pick(&mut self, at: Point) -> Option<u32> {
            let mut log = self.log.borrow_mut();
            log.picks.push(at);
            log.pick_result
        }

        fn animate(&self) -> bool {
            self.log.borrow().animate
        }

        fn set_animate(&mut self, animate: bool) {
            let mut log = self.log.borrow_mut();
            log.animate = animate;
            log.animate_writes.push(animate);
        }

        fn finalize(&mut self) {
            self.log.borrow_mut().finalized += 1;
        }
    }

    struct TestHost {
        center: LngLat,
        zoom: f64,
        size: Size,
        pane_offset: Vec2,
        zoom_animated: bool,
        animating_zoom: bool,
        any3d: bool,
        pane: Rc<RefCell<PaneLog>>,
        engine: Rc<RefCell<EngineLog>>,
    }

    impl TestHost {
        fn new() -> Self {
            Self {
                center: LngLat::new(10.0, 20.0),
                zoom: 5.0,
                size: Size::new(800.0, 600.0),
                pane_offset: Vec2::ZERO,
                zoom_animated: true,
                animating_zoom: false,
                any3d: true,
                pane: Rc::default(),
                engine: Rc::default(),
            }
        }
    }

    impl MapHost for TestHost {
        type Surface = TestPane;

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
            // Linear stand-in for a web-mercator projection: good enough for
            // exercising the pixel math, easy to invert by hand.
            let world = 2.0_f64.powf(zoom);
            Point::new(point.lng * world, point.lat * world)
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

        fn create_surface(&self, _pane: Option<&str>, _zoom_animated: bool) -> TestPane {
            TestPane {
                pane: Rc::clone(&self.pane),
                engine: Rc::clone(&self.engine),
            }
        }
    }

    fn attached_layer(host: &TestHost) -> ViewportSyncLayer<TestEngine> {
        let mut layer = ViewportSyncLayer::new(EngineProps::default(), PointerHandlers::none());
        layer.on_add(host);
        layer
    }

    #[test]
    fn attach_pushes_offset_view_state() {
        let host = TestHost::new();
        let layer = attached_layer(&host);
        assert!(layer.is_attached());

        let engine = host.engine.borrow();
        // Engine created with the derived camera, then refreshed once.
        let (props, created_view) = &engine.created[0];
        assert!(!props.controller);
        assert_eq!(
            *created_view,
            ViewState {
                longitude: 10.0,
                latitude: 20.0,
                zoom: 4.0,
                pitch: 0.0,
                bearing: 0.0
            }
        );
        assert_eq!(engine.views.len(), 1);
        assert_eq!(engine.views[0], *created_view);
        assert_eq!(engine.redraws, vec![false]);
    }

    #[test]
    fn attach_twice_keeps_one_engine() {
        let host = TestHost::new();
        let mut layer = attached_layer(&host);
        layer.attach(&host);
        assert_eq!(host.engine.borrow().created.len(), 1);
    }

    #[test]
    fn controller_forced_off_even_when_requested() {
        let host = TestHost::new();
        let props = EngineProps {
            controller: true,
            ..EngineProps::default()
        };
        let mut layer: ViewportSyncLayer<TestEngine> =
            ViewportSyncLayer::new(props, PointerHandlers::none());
        layer.attach(&host);
        assert!(!host.engine.borrow().created[0].0.controller);
        // The layer's own record keeps what the caller asked for.
        assert!(layer.props().controller);
    }

    #[test]
    fn update_resizes_and_cancels_pane_offset() {
        let mut host = TestHost::new();
        host.pane_offset = Vec2::new(30.0, -12.0);
        let mut layer = attached_layer(&host);
        layer.update(&host);

        let pane = host.pane.borrow();
        assert_eq!(*pane.sizes.last().unwrap(), Size::new(800.0, 600.0));
        assert_eq!(*pane.positions.last().unwrap(), Point::new(-30.0, 12.0));
    }

    #[test]
    fn update_during_zoom_animation_is_a_strict_noop() {
        let mut host = TestHost::new();
        let mut layer = attached_layer(&host);
        let sizes_before = host.pane.borrow().sizes.len();
        let views_before = host.engine.borrow().views.len();
        let redraws_before = host.engine.borrow().redraws.len();

        host.animating_zoom = true;
        layer.update(&host);

        assert_eq!(host.pane.borrow().sizes.len(), sizes_before);
        assert_eq!(host.pane.borrow().positions.len(), 1);
        assert_eq!(host.engine.borrow().views.len(), views_before);
        assert_eq!(host.engine.borrow().redraws.len(), redraws_before);
    }

    #[test]
    fn pause_resume_round_trip() {
        let host = TestHost::new();
        let mut layer = attached_layer(&host);
        host.engine.borrow_mut().animate = true;

        layer.dispatch(&host, &MapEvent::MoveStart);
        assert_eq!(host.engine.borrow().animate_writes, vec![false]);
        assert!(!host.engine.borrow().animate);

        layer.dispatch(&host, &MapEvent::MoveEnd);
        assert_eq!(host.engine.borrow().animate_writes, vec![false, true]);
        assert!(host.engine.borrow().animate);
    }

    #[test]
    fn pause_resume_without_animation_writes_nothing() {
        let host = TestHost::new();
        let mut layer = attached_layer(&host);

        layer.dispatch(&host, &MapEvent::ZoomStart);
        layer.dispatch(&host, &MapEvent::ZoomEnd);
        assert!(host.engine.borrow().animate_writes.is_empty());
    }

    #[test]
    fn move_end_refreshes_before_resuming() {
        let host = TestHost::new();
        let mut layer = attached_layer(&host);
        host.engine.borrow_mut().animate = true;
        layer.dispatch(&host, &MapEvent::MoveStart);

        let views_before = host.engine.borrow().views.len();
        layer.dispatch(&host, &MapEvent::MoveEnd);

        let engine = host.engine.borrow();
        assert_eq!(engine.views.len(), views_before + 1);
        // The resume write lands after the refresh pushed the camera.
        assert_eq!(*engine.animate_writes.last().unwrap(), true);
    }

    #[test]
    fn zoom_anim_frame_transforms_without_engine_push() {
        let host = TestHost::new();
        let mut layer = attached_layer(&host);
        let views_before = host.engine.borrow().views.len();

        layer.dispatch(
            &host,
            &MapEvent::ZoomAnim {
                center: LngLat::new(11.0, 20.0),
                zoom: 6.0,
            },
        );

        assert_eq!(host.engine.borrow().views.len(), views_before);
        let pane = host.pane.borrow();
        let (offset, scale) = *pane.transforms.last().unwrap();
        assert_eq!(scale, 2.0);

        // view_half·(−scale) + position + view_half − center_offset, with
        // both centers projected at the target zoom (6): current (10,20) →
        // (640,1280), target (11,20) → (704,1280).
        let expected = Point::new(
            400.0 * -2.0 + 0.0 + 400.0 - 64.0,
            300.0 * -2.0 + 0.0 + 300.0 - 0.0,
        );
        assert_eq!(offset, expected);
    }

    #[test]
    fn discrete_zoom_uses_current_view_as_target() {
        let host = TestHost::new();
        let mut layer = attached_layer(&host);

        layer.dispatch(&host, &MapEvent::Zoom);

        let pane = host.pane.borrow();
        let (offset, scale) = *pane.transforms.last().unwrap();
        // Target equals current: identity transform at the current position.
        assert_eq!(scale, 1.0);
        assert_eq!(offset, Point::ZERO);
    }

    #[test]
    fn transform_degrades_to_position_without_3d() {
        let mut host = TestHost::new();
        host.any3d = false;
        let mut layer = attached_layer(&host);
        let positions_before = host.pane.borrow().positions.len();

        layer.dispatch(
            &host,
            &MapEvent::ZoomAnim {
                center: LngLat::new(11.0, 20.0),
                zoom: 6.0,
            },
        );

        let pane = host.pane.borrow();
        assert!(pane.transforms.is_empty());
        assert_eq!(pane.positions.len(), positions_before + 1);
    }

    #[test]
    fn view_reset_retransforms_then_refreshes() {
        let host = TestHost::new();
        let mut layer = attached_layer(&host);
        let views_before = host.engine.borrow().views.len();

        layer.dispatch(&host, &MapEvent::ViewReset);

        assert_eq!(host.pane.borrow().transforms.len(), 1);
        assert_eq!(host.engine.borrow().views.len(), views_before + 1);
    }

    #[test]
    fn click_without_handler_skips_the_pick() {
        let host = TestHost::new();
        let mut layer = attached_layer(&host);
        host.engine.borrow_mut().pick_result = Some(7);

        layer.dispatch(
            &host,
            &MapEvent::Click {
                point: Point::new(100.0, 50.0),
            },
        );
        assert!(host.engine.borrow().picks.is_empty());
    }

    #[test]
    fn click_hit_reaches_handler() {
        let host = TestHost::new();
        let clicked = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&clicked);
        let handlers = PointerHandlers::none().with_click(move |p: &u32| sink.borrow_mut().push(*p));
        let mut layer: ViewportSyncLayer<TestEngine> =
            ViewportSyncLayer::new(EngineProps::default(), handlers);
        layer.attach(&host);
        host.engine.borrow_mut().pick_result = Some(7);

        layer.dispatch(
            &host,
            &MapEvent::Click {
                point: Point::new(100.0, 50.0),
            },
        );
        assert_eq!(host.engine.borrow().picks, vec![Point::new(100.0, 50.0)]);
        assert_eq!(&*clicked.borrow(), &[7]);
    }

    #[test]
    fn click_miss_stays_silent() {
        let host = TestHost::new();
        let clicked = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&clicked);
        let handlers = PointerHandlers::none().with_click(move |p: &u32| sink.borrow_mut().push(*p));
        let mut layer: ViewportSyncLayer<TestEngine> =
            ViewportSyncLayer::new(EngineProps::default(), handlers);
        layer.attach(&host);

        layer.dispatch(&host, &MapEvent::Click { point: Point::ZERO });
        assert_eq!(host.engine.borrow().picks.len(), 1);
        assert!(clicked.borrow().is_empty());
    }

    #[test]
    fn hover_delivers_hit_miss_and_leave() {
        let host = TestHost::new();
        let seen: Rc<RefCell<Vec<(Option<u32>, Option<Point>)>>> = Rc::default();
        let sink = Rc::clone(&seen);
        let handlers = PointerHandlers::none()
            .with_hover(move |p: Option<&u32>, at| sink.borrow_mut().push((p.copied(), at)));
        let mut layer: ViewportSyncLayer<TestEngine> =
            ViewportSyncLayer::new(EngineProps::default(), handlers);
        layer.attach(&host);

        host.engine.borrow_mut().pick_result = Some(3);
        layer.dispatch(
            &host,
            &MapEvent::PointerMove {
                point: Point::new(5.0, 6.0),
            },
        );
        host.engine.borrow_mut().pick_result = None;
        layer.dispatch(
            &host,
            &MapEvent::PointerMove {
                point: Point::new(7.0, 8.0),
            },
        );
        layer.dispatch(&host, &MapEvent::PointerLeave);

        assert_eq!(
            &*seen.borrow(),
            &[
                (Some(3), Some(Point::new(5.0, 6.0))),
                (None, Some(Point::new(7.0, 8.0))),
                (None, None),
            ]
        );
        // Hover picks unconditionally on every move, never on leave.
        assert_eq!(host.engine.borrow().picks.len(), 2);
    }

    #[test]
    fn detach_is_idempotent_and_finalizes_once() {
        let host = TestHost::new();
        let mut layer = attached_layer(&host);

        layer.detach();
        layer.detach();

        assert_eq!(host.pane.borrow().removed, 1);
        assert_eq!(host.engine.borrow().finalized, 1);
        assert!(!layer.is_attached());
    }

    #[test]
    fn events_after_detach_are_dropped() {
        let host = TestHost::new();
        let mut layer = attached_layer(&host);
        layer.detach();

        let views_before = host.engine.borrow().views.len();
        layer.dispatch(&host, &MapEvent::MoveEnd);
        layer.dispatch(&host, &MapEvent::Zoom);
        layer.dispatch(&host, &MapEvent::Click { point: Point::ZERO });
        layer.update(&host);

        assert_eq!(host.engine.borrow().views.len(), views_before);
        assert_eq!(host.pane.borrow().removed, 1);
    }

    #[test]
    fn set_props_forwards_only_when_attached() {
        let host = TestHost::new();
        let mut layer: ViewportSyncLayer<TestEngine> =
            ViewportSyncLayer::new(EngineProps::default(), PointerHandlers::none());

        let patch = PropsPatch {
            pick_radius: Some(8.0),
            ..PropsPatch::EMPTY
        };
        layer.set_props(&patch);
        assert_eq!(layer.props().pick_radius, 8.0);

        layer.attach(&host);
        assert!(host.engine.borrow().patches.is_empty());

        layer.set_props(&patch);
        assert_eq!(host.engine.borrow().patches, vec![patch]);
    }

    #[test]
    fn event_subscriptions_follow_host_capability() {
        let mut host = TestHost::new();
        let layer = attached_layer(&host);
        assert!(layer.subscriptions(&host).contains(&EventKind::ZoomAnim));

        host.zoom_animated = false;
        assert!(!layer.subscriptions(&host).contains(&EventKind::ZoomAnim));
    }

    #[test]
    fn reattach_creates_a_fresh_engine() {
        let host = TestHost::new();
        let mut layer = attached_layer(&host);
        layer.detach();
        layer.attach(&host);

        assert_eq!(host.engine.borrow().created.len(), 2);
        assert_eq!(host.engine.borrow().finalized, 1);
        assert!(layer.is_attached());
    }
}
