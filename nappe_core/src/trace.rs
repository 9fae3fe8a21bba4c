// Copyright 2026 the Nappe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the sync loop.
//!
//! This module provides a [`TraceSink`] trait with per-event methods the
//! layer calls at each lifecycle and refresh step. All method bodies default
//! to no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional boxed sink. When the `trace` feature is
//! **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace` — enables the `Tracer` method bodies (one branch per call).

use alloc::boxed::Box;

use kurbo::Point;

use crate::view::ViewState;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when the layer attaches to a host and creates its engine.
#[derive(Clone, Copy, Debug)]
pub struct AttachEvent {
    /// The initial camera handed to the engine.
    pub view: ViewState,
}

/// Emitted by every full-refresh attempt.
#[derive(Clone, Copy, Debug)]
pub struct RefreshEvent {
    /// True when the refresh was suppressed by an in-progress host zoom
    /// animation.
    pub skipped: bool,
    /// The camera pushed to the engine; `None` when skipped.
    pub view: Option<ViewState>,
}

/// Emitted by every continuous transform update.
#[derive(Clone, Copy, Debug)]
pub struct TransformEvent {
    /// Scale factor between the animation target zoom and the current zoom.
    pub scale: f64,
    /// Composed top-left offset applied to the surface.
    pub offset: Point,
    /// True when the environment lacks 3D transforms and only the position
    /// was updated.
    pub degraded: bool,
}

/// Emitted at gesture start when the pause slot is evaluated.
#[derive(Clone, Copy, Debug)]
pub struct PauseEvent {
    /// True when the engine's animation flag was saved and forced off.
    pub saved: bool,
}

/// Emitted at gesture end when the pause slot is drained.
#[derive(Clone, Copy, Debug)]
pub struct ResumeEvent {
    /// True when a saved animation flag was written back.
    pub restored: bool,
}

/// Which pointer stream triggered a pick query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PickProbe {
    /// A click query.
    Click,
    /// A hover query.
    Hover,
}

/// Emitted after a pick query runs.
#[derive(Clone, Copy, Debug)]
pub struct PickEvent {
    /// Which pointer stream issued the query.
    pub probe: PickProbe,
    /// Surface-relative query point.
    pub at: Point,
    /// Whether a scene object was hit.
    pub hit: bool,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the layer.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when the layer attaches and creates its engine.
    fn on_attach(&mut self, e: &AttachEvent) {
        _ = e;
    }

    /// Called when the layer detaches and finalizes its engine.
    fn on_detach(&mut self) {}

    /// Called on every full-refresh attempt, including suppressed ones.
    fn on_refresh(&mut self, e: &RefreshEvent) {
        _ = e;
    }

    /// Called on every continuous transform update.
    fn on_transform(&mut self, e: &TransformEvent) {
        _ = e;
    }

    /// Called at gesture start.
    fn on_pause(&mut self, e: &PauseEvent) {
        _ = e;
    }

    /// Called at gesture end.
    fn on_resume(&mut self, e: &ResumeEvent) {
        _ = e;
    }

    /// Called after a pick query runs.
    fn on_pick(&mut self, e: &PickEvent) {
        _ = e;
    }
}

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional owned [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing.
/// When **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
#[derive(Default)]
pub struct Tracer {
    #[cfg(feature = "trace")]
    sink: Option<Box<dyn TraceSink>>,
}

impl core::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl Tracer {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: Box<dyn TraceSink>) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {}
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Emits an [`AttachEvent`].
    #[inline]
    pub fn attach(&mut self, e: &AttachEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_attach(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a detach event.
    #[inline]
    pub fn detach(&mut self) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_detach();
        }
    }

    /// Emits a [`RefreshEvent`].
    #[inline]
    pub fn refresh(&mut self, e: &RefreshEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_refresh(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`TransformEvent`].
    #[inline]
    pub fn transform(&mut self, e: &TransformEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_transform(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PauseEvent`].
    #[inline]
    pub fn pause(&mut self, e: &PauseEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_pause(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`ResumeEvent`].
    #[inline]
    pub fn resume(&mut self, e: &ResumeEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_resume(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PickEvent`].
    #[inline]
    pub fn pick(&mut self, e: &PickEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_pick(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}
