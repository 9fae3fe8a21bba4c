// Copyright 2026 the Nappe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Leaflet host bindings.
//!
//! [`LeafletHost`] implements [`MapHost`] over a Leaflet `L.Map` instance via
//! direct `wasm_bindgen` imports of the handful of API members the adapter
//! consumes. [`LeafletBinding`] owns the JS listener closures: it registers
//! one per subscribed event kind with `map.on`, feeds translated
//! [`MapEvent`]s into the layer, and unregisters everything on
//! [`detach`](LeafletBinding::detach) or drop — the closure lifecycle pattern
//! browsers force on every retained callback.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use kurbo::{Point, Size, Vec2};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

use nappe_core::engine::RenderEngine;
use nappe_core::events::{EventKind, MapEvent};
use nappe_core::geo::LngLat;
use nappe_core::host::MapHost;
use nappe_core::layer::ViewportSyncLayer;

use crate::pane::DomPane;

// Direct imports of the Leaflet API surface the adapter consumes. Only the
// members actually called are declared; everything else on the map object is
// invisible to Rust.
#[wasm_bindgen]
extern "C" {
    /// A Leaflet `L.Map` instance.
    pub type LeafletMap;

    #[wasm_bindgen(method, js_name = getCenter)]
    fn get_center(this: &LeafletMap) -> LatLng;

    #[wasm_bindgen(method, js_name = getZoom)]
    fn get_zoom(this: &LeafletMap) -> f64;

    #[wasm_bindgen(method, js_name = getSize)]
    fn get_size(this: &LeafletMap) -> LeafletPoint;

    #[wasm_bindgen(method, js_name = getPane)]
    fn get_pane(this: &LeafletMap, name: &str) -> HtmlElement;

    #[wasm_bindgen(method, js_name = project)]
    fn project_at(this: &LeafletMap, point: &LatLng, zoom: f64) -> LeafletPoint;

    #[wasm_bindgen(method, js_name = getZoomScale)]
    fn get_zoom_scale(this: &LeafletMap, to_zoom: f64, from_zoom: f64) -> f64;

    #[wasm_bindgen(method, js_name = "_getMapPanePos")]
    fn map_pane_pos(this: &LeafletMap) -> LeafletPoint;

    #[wasm_bindgen(method, getter, js_name = "_zoomAnimated")]
    fn zoom_animated_flag(this: &LeafletMap) -> JsValue;

    #[wasm_bindgen(method, getter, js_name = "_animatingZoom")]
    fn animating_zoom_flag(this: &LeafletMap) -> JsValue;

    #[wasm_bindgen(method)]
    fn on(this: &LeafletMap, kind: &str, handler: &js_sys::Function);

    #[wasm_bindgen(method)]
    fn off(this: &LeafletMap, kind: &str, handler: &js_sys::Function);

    /// A Leaflet `L.LatLng`.
    #[wasm_bindgen(js_namespace = L)]
    type LatLng;

    #[wasm_bindgen(constructor, js_namespace = L)]
    fn new(lat: f64, lng: f64) -> LatLng;

    #[wasm_bindgen(method, getter)]
    fn lat(this: &LatLng) -> f64;

    #[wasm_bindgen(method, getter)]
    fn lng(this: &LatLng) -> f64;

    /// A Leaflet `L.Point` (pixel coordinates).
    type LeafletPoint;

    #[wasm_bindgen(method, getter)]
    fn x(this: &LeafletPoint) -> f64;

    #[wasm_bindgen(method, getter)]
    fn y(this: &LeafletPoint) -> f64;

    /// The event object of a `zoomanim` frame.
    type ZoomAnimEvent;

    #[wasm_bindgen(method, getter)]
    fn center(this: &ZoomAnimEvent) -> LatLng;

    #[wasm_bindgen(method, getter)]
    fn zoom(this: &ZoomAnimEvent) -> f64;

    /// The event object of a Leaflet mouse event.
    type LeafletMouseEvent;

    #[wasm_bindgen(method, getter, js_name = containerPoint)]
    fn container_point(this: &LeafletMouseEvent) -> LeafletPoint;
}

/// Pane used when the layer configuration names none.
const DEFAULT_PANE: &str = "overlayPane";

/// Reads `L.Browser.any3d` from the global scope, defaulting to `false`
/// when Leaflet is absent or predates the flag.
fn browser_any3d() -> bool {
    let global = js_sys::global();
    let l = js_sys::Reflect::get(&global, &JsValue::from_str("L")).unwrap_or(JsValue::UNDEFINED);
    let browser =
        js_sys::Reflect::get(&l, &JsValue::from_str("Browser")).unwrap_or(JsValue::UNDEFINED);
    js_sys::Reflect::get(&browser, &JsValue::from_str("any3d"))
        .map(|v| v.is_truthy())
        .unwrap_or(false)
}

/// A [`MapHost`] over a Leaflet map.
pub struct LeafletHost {
    map: LeafletMap,
    any3d: bool,
}

impl core::fmt::Debug for LeafletHost {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LeafletHost")
            .field("map", &"LeafletMap")
            .field("any3d", &self.any3d)
            .finish()
    }
}

impl LeafletHost {
    /// Wraps a Leaflet map, probing the environment's transform capability
    /// once.
    #[must_use]
    pub fn new(map: LeafletMap) -> Self {
        let any3d = browser_any3d();
        Self { map, any3d }
    }

    /// The wrapped map instance.
    #[must_use]
    pub fn map(&self) -> &LeafletMap {
        &self.map
    }
}

impl MapHost for LeafletHost {
    type Surface = DomPane;

    fn center(&self) -> LngLat {
        let center = self.map.get_center();
        LngLat::new(center.lng(), center.lat())
    }

    fn zoom(&self) -> f64 {
        self.map.get_zoom()
    }

    fn size(&self) -> Size {
        let size = self.map.get_size();
        Size::new(size.x(), size.y())
    }

    fn pane_offset(&self) -> Vec2 {
        let pos = self.map.map_pane_pos();
        Vec2::new(pos.x(), pos.y())
    }

    fn project(&self, point: LngLat, zoom: f64) -> Point {
        let projected = self.map.project_at(&LatLng::new(point.lat, point.lng), zoom);
        Point::new(projected.x(), projected.y())
    }

    fn zoom_scale(&self, to_zoom: f64, from_zoom: f64) -> f64 {
        self.map.get_zoom_scale(to_zoom, from_zoom)
    }

    fn zoom_animated(&self) -> bool {
        self.map.zoom_animated_flag().is_truthy()
    }

    fn animating_zoom(&self) -> bool {
        self.map.animating_zoom_flag().is_truthy()
    }

    fn supports_3d_transforms(&self) -> bool {
        self.any3d
    }

    fn create_surface(&self, pane: Option<&str>, zoom_animated: bool) -> DomPane {
        let parent = self.map.get_pane(pane.unwrap_or(DEFAULT_PANE));
        DomPane::create(&parent, zoom_animated, self.any3d)
    }
}

/// The Leaflet event name for each subscription kind.
const fn event_name(kind: EventKind) -> &'static str {
    match kind {
        EventKind::ViewReset => "viewreset",
        EventKind::MoveStart => "movestart",
        EventKind::MoveEnd => "moveend",
        EventKind::ZoomStart => "zoomstart",
        EventKind::Zoom => "zoom",
        EventKind::ZoomAnim => "zoomanim",
        EventKind::ZoomEnd => "zoomend",
        EventKind::Click => "click",
        EventKind::PointerMove => "mousemove",
        EventKind::PointerLeave => "mouseout",
    }
}

/// Translates a Leaflet event object into the layer's event type.
fn event_from_js(kind: EventKind, value: &JsValue) -> MapEvent {
    match kind {
        EventKind::ViewReset => MapEvent::ViewReset,
        EventKind::MoveStart => MapEvent::MoveStart,
        EventKind::MoveEnd => MapEvent::MoveEnd,
        EventKind::ZoomStart => MapEvent::ZoomStart,
        EventKind::Zoom => MapEvent::Zoom,
        EventKind::ZoomEnd => MapEvent::ZoomEnd,
        EventKind::ZoomAnim => {
            let event: &ZoomAnimEvent = value.unchecked_ref();
            let center = event.center();
            MapEvent::ZoomAnim {
                center: LngLat::new(center.lng(), center.lat()),
                zoom: event.zoom(),
            }
        }
        EventKind::Click => MapEvent::Click {
            point: mouse_point(value),
        },
        EventKind::PointerMove => MapEvent::PointerMove {
            point: mouse_point(value),
        },
        EventKind::PointerLeave => MapEvent::PointerLeave,
    }
}

fn mouse_point(value: &JsValue) -> Point {
    let event: &LeafletMouseEvent = value.unchecked_ref();
    let point = event.container_point();
    Point::new(point.x(), point.y())
}

type ListenerClosure = Closure<dyn FnMut(JsValue)>;

struct BindingInner<E: RenderEngine<Surface = DomPane> + 'static> {
    host: LeafletHost,
    layer: RefCell<ViewportSyncLayer<E>>,

    /// One registered closure per subscribed event kind. Cleared on
    /// teardown, which also breaks the `Rc` cycle the closures create by
    /// capturing this struct.
    listeners: RefCell<Vec<(&'static str, ListenerClosure)>>,

    attached: Cell<bool>,
}

/// Owns a layer's registration on a Leaflet map.
///
/// Created with [`attach`](Self::attach), which inserts the layer's surface,
/// creates the engine, and registers all event listeners. Dropping the
/// binding (or calling [`detach`](Self::detach)) unregisters the listeners
/// and detaches the layer.
pub struct LeafletBinding<E: RenderEngine<Surface = DomPane> + 'static> {
    inner: Rc<BindingInner<E>>,
}

impl<E: RenderEngine<Surface = DomPane> + 'static> core::fmt::Debug for LeafletBinding<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LeafletBinding")
            .field("attached", &self.inner.attached.get())
            .finish_non_exhaustive()
    }
}

impl<E: RenderEngine<Surface = DomPane> + 'static> LeafletBinding<E> {
    /// Attaches `layer` to `map` and registers its event subscriptions.
    #[must_use]
    pub fn attach(map: LeafletMap, mut layer: ViewportSyncLayer<E>) -> Self {
        let host = LeafletHost::new(map);
        layer.attach(&host);
        let kinds = layer.subscriptions(&host);

        let inner = Rc::new(BindingInner {
            host,
            layer: RefCell::new(layer),
            listeners: RefCell::new(Vec::with_capacity(kinds.len())),
            attached: Cell::new(true),
        });

        for &kind in kinds {
            let handler_inner = Rc::clone(&inner);
            let closure: ListenerClosure = Closure::wrap(Box::new(move |value: JsValue| {
                let event = event_from_js(kind, &value);
                // Host dispatch is serial; the borrow can never be contended.
                handler_inner
                    .layer
                    .borrow_mut()
                    .dispatch(&handler_inner.host, &event);
            }) as Box<dyn FnMut(JsValue)>);

            inner
                .host
                .map()
                .on(event_name(kind), closure.as_ref().unchecked_ref());
            inner.listeners.borrow_mut().push((event_name(kind), closure));
        }

        Self { inner }
    }

    /// Runs `f` against the bound layer, e.g. to forward new props or
    /// handlers.
    pub fn with_layer<R>(&self, f: impl FnOnce(&mut ViewportSyncLayer<E>) -> R) -> R {
        f(&mut self.inner.layer.borrow_mut())
    }

    /// Unregisters all listeners and detaches the layer. Safe to call twice.
    pub fn detach(&self) {
        if !self.inner.attached.replace(false) {
            return;
        }
        for (name, closure) in self.inner.listeners.borrow_mut().drain(..) {
            self.inner
                .host
                .map()
                .off(name, closure.as_ref().unchecked_ref());
        }
        self.inner.layer.borrow_mut().detach();
    }
}

impl<E: RenderEngine<Surface = DomPane> + 'static> Drop for LeafletBinding<E> {
    fn drop(&mut self) {
        self.detach();
    }
}
