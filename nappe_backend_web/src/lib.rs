// Copyright 2026 the Nappe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web backend for nappe.
//!
//! This crate provides integration with browser APIs:
//!
//! - [`DomPane`]: the layer surface as a `<div>` in a Leaflet map pane
//! - [`LeafletHost`]: [`MapHost`] over a Leaflet `L.Map`
//! - [`LeafletBinding`]: event-listener registration and teardown
//!
//! [`MapHost`]: nappe_core::host::MapHost

#![no_std]

extern crate alloc;

mod leaflet;
mod pane;

pub use leaflet::{LeafletBinding, LeafletHost, LeafletMap};
pub use pane::DomPane;
pub use nappe_core::host::SurfacePane;
