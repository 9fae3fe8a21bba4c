// Copyright 2026 the Nappe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! DOM layer surface.
//!
//! [`DomPane`] maps the [`SurfacePane`] contract onto an absolutely
//! positioned `<div>` inside a host map pane. Pointer events are disabled on
//! the element so the map's own gesture handling underneath is never blocked,
//! and the transform origin is pinned to the top-left corner so the
//! continuous-zoom scale composes the way the layer's pixel math expects.

use alloc::format;

use kurbo::{Point, Size};
use nappe_core::host::SurfacePane;
use wasm_bindgen::JsCast as _;
use web_sys::HtmlElement;

/// CSS class carried by every layer surface, matching the host's layer
/// styling.
const LAYER_CLASS: &str = "leaflet-layer";

/// CSS class that opts the surface into the host's zoom-animation styling.
const ZOOM_ANIMATED_CLASS: &str = "leaflet-zoom-animated";

/// A [`SurfacePane`] over a `<div>` in a host map pane.
///
/// The current position is cached on the Rust side; reading it back never
/// touches the DOM. CSS writes the environment rejects are dropped, matching
/// how style assignment behaves in the browser.
pub struct DomPane {
    element: HtmlElement,
    position: Point,
    any3d: bool,
}

impl core::fmt::Debug for DomPane {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DomPane")
            .field("element", &"HtmlElement")
            .field("position", &self.position)
            .field("any3d", &self.any3d)
            .finish()
    }
}

impl DomPane {
    /// Creates a surface `<div>` appended to `parent`.
    ///
    /// With `zoom_animated`, the surface is tagged with the host's
    /// zoom-animation class. `any3d` selects between composited transforms
    /// and plain `left`/`top` positioning.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is not part of a document.
    #[must_use]
    pub fn create(parent: &HtmlElement, zoom_animated: bool, any3d: bool) -> Self {
        let doc = parent.owner_document().expect("no owner document");
        let element: HtmlElement = doc
            .create_element("div")
            .expect("create_element failed")
            .unchecked_into();

        element.set_class_name(LAYER_CLASS);
        if zoom_animated {
            let _ = element.class_list().add_1(ZOOM_ANIMATED_CLASS);
        }

        let s = element.style();
        let _ = s.set_property("position", "absolute");
        let _ = s.set_property("left", "0");
        let _ = s.set_property("top", "0");
        let _ = s.set_property("pointer-events", "none");
        let _ = s.set_property("transform-origin", "0 0");

        let _ = parent.append_child(&element);

        Self {
            element,
            position: Point::ZERO,
            any3d,
        }
    }

    /// The underlying element, e.g. for an engine to append a canvas into.
    #[must_use]
    pub fn element(&self) -> &HtmlElement {
        &self.element
    }
}

impl SurfacePane for DomPane {
    fn set_size(&mut self, size: Size) {
        let s = self.element.style();
        let _ = s.set_property("width", &format!("{}px", size.width));
        let _ = s.set_property("height", &format!("{}px", size.height));
    }

    fn set_position(&mut self, position: Point) {
        self.position = position;
        let s = self.element.style();
        if self.any3d {
            let _ = s.set_property(
                "transform",
                &format!("translate3d({}px, {}px, 0)", position.x, position.y),
            );
        } else {
            let _ = s.set_property("left", &format!("{}px", position.x));
            let _ = s.set_property("top", &format!("{}px", position.y));
        }
    }

    fn position(&self) -> Point {
        self.position
    }

    fn set_transform(&mut self, offset: Point, scale: f64) {
        self.position = offset;
        let _ = self.element.style().set_property(
            "transform",
            &format!("translate3d({}px, {}px, 0) scale({scale})", offset.x, offset.y),
        );
    }

    fn remove(&mut self) {
        self.element.remove();
    }
}
