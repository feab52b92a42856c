//! Ripple View entry point
//!
//! The web build drives the view from pointer events and
//! requestAnimationFrame; the native build renders a headless timeline.

use image::{Rgba, RgbaImage};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Placeholder photo: soft diagonal gradient with concentric bands
fn demo_image(width: u32, height: u32) -> RgbaImage {
    let (w, h) = (width.max(1) as f32, height.max(1) as f32);
    RgbaImage::from_fn(width, height, |x, y| {
        let u = x as f32 / w;
        let v = y as f32 / h;
        let d = ((u - 0.5).powi(2) + (v - 0.5).powi(2)).sqrt();
        let band = if ((d * 24.0) as u32) % 2 == 0 { 1.0 } else { 0.85 };
        Rgba([
            ((40.0 + 180.0 * u) * band) as u8,
            ((90.0 + 120.0 * v) * band) as u8,
            ((200.0 - 80.0 * u) * band) as u8,
            255,
        ])
    })
}

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use image::RgbaImage;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, PageTransitionEvent, PointerEvent};

    use ripple_view::renderer::{RippleRenderState, compose_layer, layer_padding};
    use ripple_view::{PressEvent, RippleController, RippleSettings};

    /// App instance holding all state
    struct App {
        controller: RippleController,
        render_state: Option<RippleRenderState>,
        source: RgbaImage,
        canvas: HtmlCanvasElement,
        /// Device pixels per CSS pixel
        dpr: f64,
        /// A requestAnimationFrame callback is pending
        looping: bool,
    }

    impl App {
        /// Physical canvas size for the current CSS size
        fn physical_size(&self) -> (u32, u32) {
            let size = self.controller.size();
            (
                (size.x as f64 * self.dpr).round() as u32,
                (size.y as f64 * self.dpr).round() as u32,
            )
        }

        fn layer(&self) -> RgbaImage {
            let (width, height) = self.physical_size();
            let size = self.controller.size();
            let radius = self.controller.settings().effective_corner_radius(size.x, size.y);
            compose_layer(&self.source, width, height, radius * self.dpr as f32)
        }

        /// Texture border for the current params
        fn layer_padding(&self) -> u32 {
            layer_padding(&self.controller.params(), self.dpr as f32)
        }

        /// Pick up a changed canvas size
        fn resize(&mut self) {
            let css = Vec2::new(
                self.canvas.client_width() as f32,
                self.canvas.client_height() as f32,
            );
            if css == self.controller.size() || css.x <= 0.0 || css.y <= 0.0 {
                return;
            }
            self.controller.resize(css.x, css.y);
            let (width, height) = self.physical_size();
            self.canvas.set_width(width);
            self.canvas.set_height(height);
            let layer = self.layer();
            let pad = self.layer_padding();
            if let Some(ref mut render_state) = self.render_state {
                render_state.resize(width, height);
                render_state.set_layer(&layer, pad);
            }
            log::info!("Resized to {}x{} ({}x{} px)", css.x, css.y, width, height);
        }

        /// Render the current frame
        fn render(&mut self, now: f64) {
            let frame = self.controller.frame(now);
            let params = self.controller.params();
            let view_size = self.controller.size();
            if let Some(ref mut render_state) = self.render_state {
                match render_state.render(&frame, &params, view_size) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => render_state.reconfigure(),
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
        }
    }

    /// Host clock in seconds, same base as requestAnimationFrame
    fn now_secs() -> f64 {
        web_sys::window()
            .and_then(|w| w.performance())
            .map(|p| p.now() / 1000.0)
            .unwrap_or(0.0)
    }

    fn load_settings(canvas: &HtmlCanvasElement) -> RippleSettings {
        match canvas.get_attribute("data-ripple-settings") {
            Some(json) => RippleSettings::from_json(&json).unwrap_or_else(|e| {
                log::warn!("Bad data-ripple-settings, using defaults: {}", e);
                RippleSettings::default()
            }),
            None => RippleSettings::default(),
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Ripple View starting...");

        let Some(window) = web_sys::window() else {
            log::error!("no window");
            return;
        };
        let Some(document) = window.document() else {
            log::error!("no document");
            return;
        };
        let Some(canvas) = document
            .get_element_by_id("canvas")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        else {
            log::error!("no <canvas id=\"canvas\">");
            return;
        };

        let settings = load_settings(&canvas);
        let dpr = window.device_pixel_ratio();
        let css_w = canvas.client_width().max(1) as f32;
        let css_h = canvas.client_height().max(1) as f32;

        let mut app = App {
            controller: RippleController::new(css_w, css_h, settings),
            render_state: None,
            source: super::demo_image(1024, 768),
            canvas: canvas.clone(),
            dpr,
            looping: true,
        };
        let (width, height) = app.physical_size();
        canvas.set_width(width);
        canvas.set_height(height);

        // Initialize WebGPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = match instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone())) {
            Ok(surface) => surface,
            Err(e) => {
                log::error!("Failed to create surface: {}", e);
                return;
            }
        };

        let adapter = match instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
        {
            Ok(adapter) => adapter,
            Err(e) => {
                log::error!("Failed to get adapter: {}", e);
                return;
            }
        };

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let layer = app.layer();
        let pad = app.layer_padding();
        match RippleRenderState::new(surface, &adapter, width, height, &layer, pad).await {
            Ok(render_state) => app.render_state = Some(render_state),
            Err(e) => {
                log::error!("Failed to create device: {}", e);
                return;
            }
        }

        app.controller.mount(now_secs());
        let app = Rc::new(RefCell::new(app));

        setup_pointer_handlers(&canvas, app.clone());
        setup_lifecycle_handlers(app.clone());

        request_animation_frame(app);

        log::info!("Ripple View running!");
    }

    fn css_point(event: &PointerEvent) -> Vec2 {
        Vec2::new(event.offset_x() as f32, event.offset_y() as f32)
    }

    fn setup_pointer_handlers(canvas: &HtmlCanvasElement, app: Rc<RefCell<App>>) {
        // Press began
        {
            let app = app.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                event.prevent_default();
                let _ = canvas_clone.set_pointer_capture(event.pointer_id());
                app.borrow_mut()
                    .controller
                    .press(PressEvent::Began(css_point(&event)), now_secs());
            });
            let _ = canvas
                .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Drag
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let mut a = app.borrow_mut();
                if a.controller.is_pressing() {
                    a.controller
                        .press(PressEvent::Changed(css_point(&event)), now_secs());
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("pointermove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Released or taken away
        for (name, ended) in [
            ("pointerup", PressEvent::Ended),
            ("pointercancel", PressEvent::Cancelled),
        ] {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: PointerEvent| {
                app.borrow_mut().controller.press(ended, now_secs());
            });
            let _ = canvas.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_lifecycle_handlers(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        // Window resize
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                app.borrow_mut().resize();
            });
            let _ =
                window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Page going away: drop every timer
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                app.borrow_mut().controller.unmount();
            });
            let _ = window
                .add_event_listener_with_callback("pagehide", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Restored from the back/forward cache: mount again and restart the loop
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PageTransitionEvent| {
                if !event.persisted() {
                    return;
                }
                let restart = {
                    let mut a = app.borrow_mut();
                    a.controller.mount(now_secs());
                    // A frame queued before the page was hidden keeps the loop alive
                    !std::mem::replace(&mut a.looping, true)
                };
                log::info!("Ripple View restored");
                if restart {
                    request_animation_frame(app.clone());
                }
            });
            let _ = window
                .add_event_listener_with_callback("pageshow", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            frame_loop(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn frame_loop(app: Rc<RefCell<App>>, time: f64) {
        {
            let mut a = app.borrow_mut();
            if !a.controller.is_mounted() {
                a.looping = false;
                log::info!("Ripple View stopped");
                return;
            }
            // time is ms since page load, convert to seconds
            let now = time / 1000.0;
            a.controller.advance(now);
            a.render(now);
        }

        request_animation_frame(app);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_app::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Ripple View (native) starting...");
    log::info!("The interactive view needs a browser - run with `trunk serve` for the web version");

    run_headless();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Script a short session against the controller and filter each frame on
/// the CPU, logging how much of the image the ripple touched.
#[cfg(not(target_arch = "wasm32"))]
fn run_headless() {
    use glam::Vec2;
    use ripple_view::renderer::CpuRenderer;
    use ripple_view::{PressEvent, RippleController, RippleSettings, TuningPanel};

    const SIZE: u32 = 300;
    const FPS: f64 = 30.0;

    let settings = RippleSettings::default();
    let radius = settings.effective_corner_radius(SIZE as f32, SIZE as f32);
    let mut controller = RippleController::new(SIZE as f32, SIZE as f32, settings);
    let renderer = CpuRenderer::new(demo_image(640, 480), SIZE, SIZE, radius);

    // (time, event) pairs in seconds
    let script = [
        (2.5, PressEvent::Began(Vec2::new(80.0, 120.0))),
        (2.8, PressEvent::Changed(Vec2::new(90.0, 125.0))),
        (3.2, PressEvent::Ended),
    ];
    let mut pending = script.iter().peekable();

    controller.mount(0.0);
    let mut last_trigger = controller.trigger();

    for step in 0..=(7.0 * FPS) as u32 {
        let now = step as f64 / FPS;
        while let Some((_, event)) = pending.next_if(|(at, _)| *at <= now) {
            controller.press(*event, now);
        }
        controller.advance(now);

        let frame = controller.frame(now);
        if frame.trigger != last_trigger {
            last_trigger = frame.trigger;
            // Look a quarter second in, once the ring has spread
            let later = controller.frame(now + 0.25);
            let out = renderer.render(&later, &controller.params());
            let changed = changed_pixels(&out, renderer.layer());
            log::info!(
                "t={:.2}s ripple #{} from ({:.0}, {:.0}) [{:?}], {} px changed 0.25s in",
                now,
                frame.trigger.value(),
                frame.origin.x,
                frame.origin.y,
                controller.mode(),
                changed
            );
        }
    }

    controller.unmount();
    log::info!("Headless run done: {} ripples", last_trigger.value());

    // Debug view: slider defaults with the origin tapped at the centre
    let mut panel = TuningPanel::new();
    panel.tap(Vec2::splat(SIZE as f32 / 2.0));
    let tuned = renderer.render(&panel.frame(), &panel.params());
    log::info!(
        "Tuning preview at t={:.1}s: {} px changed",
        panel.frame().elapsed,
        changed_pixels(&tuned, renderer.layer())
    );
}

#[cfg(not(target_arch = "wasm32"))]
fn changed_pixels(a: &RgbaImage, b: &RgbaImage) -> usize {
    a.pixels().zip(b.pixels()).filter(|(p, q)| p != q).count()
}
