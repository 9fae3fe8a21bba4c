// Copyright 2026 the Nappe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core adapter for viewport-synchronized GPU map overlays.
//!
//! `nappe_core` keeps a rendering engine's camera, pixel size, and screen
//! position in lockstep with a slippy-map widget's viewport. It is `no_std`
//! compatible (with `alloc`) and owns no platform glue: the host widget and
//! the rendering engine sit behind traits, implemented by backend crates and
//! by applications.
//!
//! # Architecture
//!
//! Control flow is entirely reactive — the host drives the layer, never the
//! other way around:
//!
//! ```text
//!   Host widget (event dispatch)
//!       │
//!       ▼
//!   MapEvent ──► MapLayer::handle_event ──┬─► full refresh ──► RenderEngine
//!                                         ├─► continuous transform ──► SurfacePane
//!                                         └─► pick query ──► PointerHandlers
//! ```
//!
//! **[`layer`]** — [`ViewportSyncLayer`](layer::ViewportSyncLayer), the
//! adapter itself, and the [`MapLayer`](layer::MapLayer) capability trait the
//! host invokes (attach/detach, event subscriptions, dispatch).
//!
//! **[`host`]** — The [`MapHost`](host::MapHost) and
//! [`SurfacePane`](host::SurfacePane) contracts backend crates implement over
//! the real widget.
//!
//! **[`engine`]** — The [`RenderEngine`](engine::RenderEngine) contract plus
//! the [`EngineProps`](engine::EngineProps) configuration value and its
//! replace-wholesale patch type.
//!
//! **[`events`]** — Host event payloads and the static subscription tables.
//!
//! **[`view`]** — The derived camera state and the fixed zoom-offset rule.
//!
//! **[`geo`]** — Geographic coordinates.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) trait and event types for
//! sync-loop instrumentation, with zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one
//!   branch per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod engine;
pub mod events;
pub mod geo;
pub mod host;
pub mod layer;
pub mod trace;
pub mod view;
