// Copyright 2026 the Nappe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host map events the layer reacts to.
//!
//! The layer is entirely reactive: the host invokes it with [`MapEvent`]
//! values and never the other way around. [`EventKind`] names the
//! subscription set a backend must register listeners for; the set is static
//! for the layer's lifetime and differs only in whether the host supports
//! smooth zoom animation (see
//! [`MapLayer::events`](crate::layer::MapLayer::events)).

use kurbo::Point;

use crate::geo::LngLat;

/// Identifies one host event stream, without payload.
///
/// Backends map each kind onto the widget's native event name when
/// registering listeners.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The viewport was reset discontinuously (hard jump).
    ViewReset,
    /// A pan gesture or animation began.
    MoveStart,
    /// A pan gesture or animation ended.
    MoveEnd,
    /// A zoom transition began.
    ZoomStart,
    /// A discrete zoom step occurred.
    Zoom,
    /// One frame of a smooth zoom animation. Only delivered by
    /// zoom-animated hosts.
    ZoomAnim,
    /// A zoom transition ended.
    ZoomEnd,
    /// A pointer click on the map.
    Click,
    /// The pointer moved over the map.
    PointerMove,
    /// The pointer left the map.
    PointerLeave,
}

/// Events every host delivers.
pub const BASE_EVENTS: &[EventKind] = &[
    EventKind::ViewReset,
    EventKind::MoveStart,
    EventKind::MoveEnd,
    EventKind::ZoomStart,
    EventKind::Zoom,
    EventKind::ZoomEnd,
    EventKind::Click,
    EventKind::PointerMove,
    EventKind::PointerLeave,
];

/// [`BASE_EVENTS`] plus the zoom-animation frame stream, for hosts that
/// animate zoom smoothly.
pub const ZOOM_ANIMATED_EVENTS: &[EventKind] = &[
    EventKind::ViewReset,
    EventKind::MoveStart,
    EventKind::MoveEnd,
    EventKind::ZoomStart,
    EventKind::Zoom,
    EventKind::ZoomAnim,
    EventKind::ZoomEnd,
    EventKind::Click,
    EventKind::PointerMove,
    EventKind::PointerLeave,
];

/// A host event with its payload.
///
/// Pointer positions are surface-relative pixel coordinates (the same space
/// pick queries use).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MapEvent {
    /// The viewport was reset discontinuously.
    ViewReset,
    /// A pan gesture or animation began.
    MoveStart,
    /// A pan gesture or animation ended.
    MoveEnd,
    /// A zoom transition began.
    ZoomStart,
    /// A discrete zoom step occurred.
    Zoom,
    /// One frame of a smooth zoom animation, carrying the animation target.
    ZoomAnim {
        /// Geographic center the animation is heading toward.
        center: LngLat,
        /// Zoom level the animation is heading toward.
        zoom: f64,
    },
    /// A zoom transition ended.
    ZoomEnd,
    /// A pointer click at a surface-relative point.
    Click {
        /// Click position in surface pixels.
        point: Point,
    },
    /// A pointer move to a surface-relative point.
    PointerMove {
        /// Pointer position in surface pixels.
        point: Point,
    },
    /// The pointer left the map.
    PointerLeave,
}

impl MapEvent {
    /// The subscription kind this event belongs to.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::ViewReset => EventKind::ViewReset,
            Self::MoveStart => EventKind::MoveStart,
            Self::MoveEnd => EventKind::MoveEnd,
            Self::ZoomStart => EventKind::ZoomStart,
            Self::Zoom => EventKind::Zoom,
            Self::ZoomAnim { .. } => EventKind::ZoomAnim,
            Self::ZoomEnd => EventKind::ZoomEnd,
            Self::Click { .. } => EventKind::Click,
            Self::PointerMove { .. } => EventKind::PointerMove,
            Self::PointerLeave => EventKind::PointerLeave,
        }
    }
}
