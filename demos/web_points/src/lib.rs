// Copyright 2026 the Nappe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web demo: a wgpu point overlay pinned to a Leaflet map.
//!
//! [`PointOverlay`] implements [`RenderEngine`] with a small instanced-quad
//! pipeline drawing one soft circle per city. The layer keeps the overlay's
//! camera in lockstep with the Leaflet viewport; clicking a city logs it to
//! the console. With `animate` on, a `requestAnimationFrame` loop pulses the
//! circle radii — pan or zoom the map to watch the layer pause and resume it.
//!
//! Build with: `wasm-pack build --target web demos/web_points`
//!
//! Then serve `demos/web_points/` and open `index.html` in a browser.

// This crate only runs in the browser; suppress dead-code warnings when
// cargo-checking on a native host target.
#![cfg_attr(
    not(target_arch = "wasm32"),
    allow(dead_code, reason = "this crate only runs in the browser")
)]

use std::cell::{Cell, RefCell};
use std::f64::consts::PI;
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;

use nappe_backend_web::{DomPane, LeafletBinding, LeafletMap};
use nappe_core::engine::{EngineProps, PropsPatch, RenderEngine};
use nappe_core::layer::{PointerHandlers, ViewportSyncLayer};
use nappe_core::view::ViewState;

/// Engine-convention world size at zoom 0, in pixels.
const WORLD_SIZE: f64 = 512.0;

/// Base circle radius in CSS pixels.
const BASE_RADIUS: f64 = 8.0;

/// A labeled point of the demo dataset.
#[derive(Clone, Copy, Debug)]
pub struct City {
    /// Display name.
    pub name: &'static str,
    /// Longitude in degrees.
    pub lng: f64,
    /// Latitude in degrees.
    pub lat: f64,
    /// Fill color, linear RGBA.
    pub color: [f32; 4],
}

const CITIES: &[City] = &[
    City { name: "Reykjavík", lng: -21.94, lat: 64.15, color: [0.95, 0.26, 0.21, 0.9] },
    City { name: "Lisbon", lng: -9.14, lat: 38.72, color: [0.30, 0.69, 0.31, 0.9] },
    City { name: "Zürich", lng: 8.54, lat: 47.37, color: [0.13, 0.59, 0.95, 0.9] },
    City { name: "Helsinki", lng: 24.94, lat: 60.17, color: [1.00, 0.76, 0.03, 0.9] },
    City { name: "Athens", lng: 23.73, lat: 37.98, color: [0.61, 0.15, 0.69, 0.9] },
    City { name: "Cairo", lng: 31.24, lat: 30.04, color: [0.00, 0.74, 0.83, 0.9] },
    City { name: "Nairobi", lng: 36.82, lat: -1.29, color: [1.00, 0.34, 0.13, 0.9] },
    City { name: "Singapore", lng: 103.82, lat: 1.35, color: [0.55, 0.76, 0.29, 0.9] },
    City { name: "Sydney", lng: 151.21, lat: -33.87, color: [0.91, 0.12, 0.39, 0.9] },
    City { name: "São Paulo", lng: -46.63, lat: -23.55, color: [0.25, 0.32, 0.71, 0.9] },
];

const POINT_SHADER: &str = r"
struct Globals {
    viewport: vec2<f32>,
    _pad: vec2<f32>,
}

@group(0) @binding(0) var<uniform> globals: Globals;

struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) color: vec4<f32>,
}

@vertex
fn vs_main(
    @location(0) corner: vec2<f32>,
    @location(1) center: vec2<f32>,
    @location(2) radius: f32,
    @location(3) color: vec4<f32>,
) -> VsOut {
    let px = center + corner * radius;
    let ndc = vec2(
        px.x / globals.viewport.x * 2.0 - 1.0,
        1.0 - px.y / globals.viewport.y * 2.0,
    );
    var out: VsOut;
    out.pos = vec4(ndc, 0.0, 1.0);
    out.uv = corner;
    out.color = color;
    return out;
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    let d = dot(in.uv, in.uv);
    if (d > 1.0) {
        discard;
    }
    // Soft edge over the outer 15% of the radius.
    let alpha = in.color.a * clamp((1.0 - sqrt(d)) / 0.15, 0.0, 1.0);
    return vec4(in.color.rgb * alpha, alpha);
}
";

/// Unit quad covering the circle's bounding box, two triangles.
const QUAD: [[f32; 2]; 6] = [
    [-1.0, -1.0],
    [1.0, -1.0],
    [1.0, 1.0],
    [-1.0, -1.0],
    [1.0, 1.0],
    [-1.0, 1.0],
];

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct PointInstance {
    center: [f32; 2],
    radius: f32,
    _pad: f32,
    color: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct Globals {
    viewport: [f32; 2],
    _pad: [f32; 2],
}

struct GpuState {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    globals_buffer: wgpu::Buffer,
    quad_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
}

struct OverlayInner {
    canvas: HtmlCanvasElement,
    props: RefCell<EngineProps>,
    view: Cell<ViewState>,
    animate: Cell<bool>,
    finalized: Cell<bool>,
    /// Populated by the async adapter/device negotiation; redraws before
    /// that are dropped.
    gpu: RefCell<Option<GpuState>>,
    /// The self-rescheduling pulse closure, kept alive while registered.
    raf: RefCell<Option<Closure<dyn FnMut(f64)>>>,
    raf_active: Cell<bool>,
    /// ID of the most recent `requestAnimationFrame`, for cancellation at
    /// teardown.
    raf_id: Cell<i32>,
}

/// A [`RenderEngine`] drawing pulsing city points with wgpu.
pub struct PointOverlay {
    inner: Rc<OverlayInner>,
}

impl std::fmt::Debug for PointOverlay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointOverlay")
            .field("animate", &self.inner.animate.get())
            .field("finalized", &self.inner.finalized.get())
            .finish_non_exhaustive()
    }
}

/// Projects a geographic point into engine world pixels at `zoom`
/// (512-px world at zoom 0, matching the camera the layer pushes).
fn project(lng: f64, lat: f64, zoom: f64) -> (f64, f64) {
    let world = WORLD_SIZE * zoom.exp2();
    let x = (lng / 360.0 + 0.5) * world;
    let siny = (lat * PI / 180.0).sin().clamp(-0.9999, 0.9999);
    let y = (0.5 - ((1.0 + siny) / (1.0 - siny)).ln() / (4.0 * PI)) * world;
    (x, y)
}

/// Pulse multiplier for one point at wall-clock `seconds`.
fn pulse(seconds: f64, index: usize) -> f64 {
    1.0 + 0.3 * (seconds * 2.0 + index as f64 * 0.7).sin()
}

impl OverlayInner {
    /// CSS pixel size of the canvas.
    fn viewport(&self) -> (f64, f64) {
        (
            f64::from(self.canvas.client_width()),
            f64::from(self.canvas.client_height()),
        )
    }

    /// Screen position of every city under the current camera, in CSS px.
    fn screen_positions(&self) -> Vec<(f64, f64)> {
        let view = self.view.get();
        let (w, h) = self.viewport();
        let (cx, cy) = project(view.longitude, view.latitude, view.zoom);
        CITIES
            .iter()
            .map(|city| {
                let (x, y) = project(city.lng, city.lat, view.zoom);
                (x - cx + w / 2.0, y - cy + h / 2.0)
            })
            .collect()
    }

    fn render(&self) {
        if self.finalized.get() {
            return;
        }
        let mut gpu = self.gpu.borrow_mut();
        let Some(gpu) = gpu.as_mut() else {
            return;
        };

        let (w, h) = self.viewport();
        if w <= 0.0 || h <= 0.0 {
            return;
        }

        let dpr = if self.props.borrow().use_device_pixels {
            web_sys::window().map_or(1.0, |win| win.device_pixel_ratio())
        } else {
            1.0
        };
        let buffer_w = (w * dpr) as u32;
        let buffer_h = (h * dpr) as u32;
        if gpu.config.width != buffer_w || gpu.config.height != buffer_h {
            self.canvas.set_width(buffer_w);
            self.canvas.set_height(buffer_h);
            gpu.config.width = buffer_w;
            gpu.config.height = buffer_h;
            gpu.surface.configure(&gpu.device, &gpu.config);
        }

        let seconds = js_sys::Date::now() / 1000.0;
        let animate = self.animate.get();
        let instances: Vec<PointInstance> = self
            .screen_positions()
            .into_iter()
            .enumerate()
            .map(|(i, (x, y))| {
                let scale = if animate { pulse(seconds, i) } else { 1.0 };
                PointInstance {
                    center: [(x * dpr) as f32, (y * dpr) as f32],
                    radius: (BASE_RADIUS * scale * dpr) as f32,
                    _pad: 0.0,
                    color: CITIES[i].color,
                }
            })
            .collect();

        gpu.queue.write_buffer(
            &gpu.globals_buffer,
            0,
            bytemuck::bytes_of(&Globals {
                viewport: [buffer_w as f32, buffer_h as f32],
                _pad: [0.0; 2],
            }),
        );
        gpu.queue
            .write_buffer(&gpu.instance_buffer, 0, bytemuck::cast_slice(&instances));

        let frame = match gpu.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(_) => return,
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("points encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("points pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&gpu.pipeline);
            pass.set_bind_group(0, &gpu.bind_group, &[]);
            pass.set_vertex_buffer(0, gpu.quad_buffer.slice(..));
            pass.set_vertex_buffer(1, gpu.instance_buffer.slice(..));
            pass.draw(0..6, 0..instances.len() as u32);
        }

        gpu.queue.submit(Some(encoder.finish()));
        frame.present();
    }
}

/// Starts the pulse loop if not already running. The closure re-registers
/// itself each frame while the animate flag stays set.
fn start_pulse(inner: &Rc<OverlayInner>) {
    if inner.raf_active.get() || inner.finalized.get() {
        return;
    }
    inner.raf_active.set(true);

    let tick_inner = Rc::clone(inner);
    let closure = Closure::wrap(Box::new(move |_timestamp_ms: f64| {
        if !tick_inner.animate.get() || tick_inner.finalized.get() {
            tick_inner.raf_active.set(false);
            return;
        }
        tick_inner.render();
        if let Some(closure) = &*tick_inner.raf.borrow() {
            tick_inner.raf_id.set(request_frame(closure));
        }
    }) as Box<dyn FnMut(f64)>);

    inner.raf_id.set(request_frame(&closure));
    *inner.raf.borrow_mut() = Some(closure);
}

fn request_frame(closure: &Closure<dyn FnMut(f64)>) -> i32 {
    web_sys::window()
        .and_then(|window| {
            window
                .request_animation_frame(closure.as_ref().unchecked_ref())
                .ok()
        })
        .unwrap_or(0)
}

impl RenderEngine for PointOverlay {
    type Surface = DomPane;
    type Picked = City;

    fn create(surface: &DomPane, props: &EngineProps, view: ViewState) -> Self {
        let doc = surface
            .element()
            .owner_document()
            .expect("surface not in a document");
        let canvas: HtmlCanvasElement = doc
            .create_element("canvas")
            .expect("create_element failed")
            .unchecked_into();
        let style = canvas.style();
        let _ = style.set_property("width", "100%");
        let _ = style.set_property("height", "100%");
        let _ = style.set_property("display", "block");
        let _ = surface.element().append_child(&canvas);

        let inner = Rc::new(OverlayInner {
            canvas: canvas.clone(),
            props: RefCell::new(props.clone()),
            view: Cell::new(view),
            animate: Cell::new(props.animate),
            finalized: Cell::new(false),
            gpu: RefCell::new(None),
            raf: RefCell::new(None),
            raf_active: Cell::new(false),
            raf_id: Cell::new(0),
        });

        init_gpu_async(Rc::clone(&inner), canvas);
        if props.animate {
            start_pulse(&inner);
        }

        Self { inner }
    }

    fn merge_props(&mut self, patch: &PropsPatch) {
        let mut props = self.inner.props.borrow_mut();
        let merged = props.apply(patch);
        *props = merged;
    }

    fn set_view_state(&mut self, view: ViewState) {
        self.inner.view.set(view);
    }

    fn redraw(&mut self, _force: bool) {
        self.inner.render();
    }

    fn pick(&mut self, at: kurbo::Point) -> Option<City> {
        let tolerance = self.inner.props.borrow().pick_radius;
        self.inner
            .screen_positions()
            .into_iter()
            .enumerate()
            .filter(|&(_, (x, y))| {
                let dx = x - at.x;
                let dy = y - at.y;
                (dx * dx + dy * dy).sqrt() <= BASE_RADIUS + tolerance
            })
            .min_by(|&(_, (ax, ay)), &(_, (bx, by))| {
                let da = (ax - at.x).hypot(ay - at.y);
                let db = (bx - at.x).hypot(by - at.y);
                da.total_cmp(&db)
            })
            .map(|(i, _)| CITIES[i])
    }

    fn animate(&self) -> bool {
        self.inner.animate.get()
    }

    fn set_animate(&mut self, animate: bool) {
        self.inner.animate.set(animate);
        if animate {
            start_pulse(&self.inner);
        }
    }

    fn finalize(&mut self) {
        self.inner.finalized.set(true);
        // Cancel any pending frame before the closure is dropped, or the
        // browser would invoke a dead closure.
        if self.inner.raf_active.replace(false)
            && let Some(window) = web_sys::window()
        {
            let _ = window.cancel_animation_frame(self.inner.raf_id.get());
        }
        self.inner.raf.borrow_mut().take();
        self.inner.gpu.borrow_mut().take();
        self.inner.canvas.remove();
    }
}

/// Spawns the asynchronous wgpu adapter/device negotiation.
///
/// On non-wasm targets this is a no-op since the demo only runs in a browser.
#[cfg(target_arch = "wasm32")]
fn init_gpu_async(inner: Rc<OverlayInner>, canvas: HtmlCanvasElement) {
    wasm_bindgen_futures::spawn_local(async move {
        let gpu = init_gpu(&canvas).await;
        if inner.finalized.get() {
            return;
        }
        *inner.gpu.borrow_mut() = Some(gpu);
        // First real frame now that the device exists.
        inner.render();
    });
}

#[cfg(not(target_arch = "wasm32"))]
fn init_gpu_async(_inner: Rc<OverlayInner>, _canvas: HtmlCanvasElement) {}

#[cfg(target_arch = "wasm32")]
async fn init_gpu(canvas: &HtmlCanvasElement) -> GpuState {
    let instance = wgpu::Instance::default();

    let surface = instance
        .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
        .expect("create wgpu surface");

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            compatible_surface: Some(&surface),
            ..Default::default()
        })
        .await
        .expect("no suitable GPU adapter");

    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("web-points"),
                ..Default::default()
            },
            None,
        )
        .await
        .expect("device creation failed");

    let width = canvas.width().max(1);
    let height = canvas.height().max(1);
    let mut config = surface
        .get_default_config(&adapter, width, height)
        .expect("surface not compatible with adapter");
    // Overlay canvas: composite over the map tiles underneath.
    config.alpha_mode = wgpu::CompositeAlphaMode::PreMultiplied;
    surface.configure(&device, &config);

    let globals_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("globals bgl"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    });

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("points"),
        source: wgpu::ShaderSource::Wgsl(POINT_SHADER.into()),
    });
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("points"),
        bind_group_layouts: &[&globals_bgl],
        push_constant_ranges: &[],
    });
    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("points"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[
                wgpu::VertexBufferLayout {
                    array_stride: size_of::<[f32; 2]>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x2,
                        offset: 0,
                        shader_location: 0,
                    }],
                },
                wgpu::VertexBufferLayout {
                    array_stride: size_of::<PointInstance>() as u64,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &[
                        wgpu::VertexAttribute {
                            format: wgpu::VertexFormat::Float32x2,
                            offset: 0,
                            shader_location: 1,
                        },
                        wgpu::VertexAttribute {
                            format: wgpu::VertexFormat::Float32,
                            offset: 8,
                            shader_location: 2,
                        },
                        wgpu::VertexAttribute {
                            format: wgpu::VertexFormat::Float32x4,
                            offset: 16,
                            shader_location: 3,
                        },
                    ],
                },
            ],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: config.format,
                blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    });

    let globals_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("globals"),
        size: size_of::<Globals>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let quad_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("quad"),
        size: size_of_val(&QUAD) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    queue.write_buffer(&quad_buffer, 0, bytemuck::cast_slice(&QUAD));
    let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("instances"),
        size: (CITIES.len() * size_of::<PointInstance>()) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("globals"),
        layout: &globals_bgl,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: globals_buffer.as_entire_binding(),
        }],
    });

    GpuState {
        device,
        queue,
        surface,
        config,
        pipeline,
        bind_group,
        globals_buffer,
        quad_buffer,
        instance_buffer,
    }
}

/// A detachable handle to the running overlay, exported to JS.
#[wasm_bindgen]
#[derive(Debug)]
pub struct OverlayHandle {
    binding: Option<LeafletBinding<PointOverlay>>,
}

#[wasm_bindgen]
impl OverlayHandle {
    /// Unregisters the listeners and tears the overlay down.
    pub fn detach(&mut self) {
        if let Some(binding) = self.binding.take() {
            binding.detach();
        }
    }
}

/// Attaches the point overlay to an existing Leaflet map.
#[wasm_bindgen(js_name = attachOverlay)]
#[must_use]
pub fn attach_overlay(map: LeafletMap) -> OverlayHandle {
    let props = EngineProps {
        animate: true,
        pick_radius: 4.0,
        ..EngineProps::default()
    };
    let handlers = PointerHandlers::none().with_click(|city: &City| {
        web_sys::console::log_1(&format!("picked {}", city.name).into());
    });
    let layer = ViewportSyncLayer::<PointOverlay>::new(props, handlers);
    OverlayHandle {
        binding: Some(LeafletBinding::attach(map, layer)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_matches_world_scale() {
        // Engine zoom 0 spans a 512-px world.
        let (x, y) = project(0.0, 0.0, 0.0);
        assert!((x - 256.0).abs() < 1e-9);
        assert!((y - 256.0).abs() < 1e-9);

        let (x, _) = project(180.0, 0.0, 0.0);
        assert!((x - 512.0).abs() < 1e-9);
    }

    #[test]
    fn pulse_stays_within_band() {
        for i in 0..CITIES.len() {
            for t in 0..100 {
                let m = pulse(f64::from(t) * 0.1, i);
                assert!((0.7..=1.3).contains(&m), "pulse out of band: {m}");
            }
        }
    }
}
