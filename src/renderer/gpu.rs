//! WebGPU ripple pipeline
//!
//! The composed layer lives in a texture; a fullscreen triangle samples it
//! through the WGSL port of the field function. The texture carries a
//! transparent border wide enough for the largest displacement, so samples
//! past the image edge fade out the way the CPU filter's do.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use image::RgbaImage;
use wgpu::util::DeviceExt;

use crate::consts::*;
use crate::ripple::{RippleFrame, RippleParams, max_sample_offset};

// ============================================================================
// GPU DATA STRUCTURES (must match shader)
// ============================================================================

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
struct Globals {
    resolution: [f32; 2],  // offset 0
    origin: [f32; 2],      // offset 8
    elapsed: f32,          // offset 16
    amplitude: f32,        // offset 20
    frequency: f32,        // offset 24
    decay: f32,            // offset 28
    speed: f32,            // offset 32
    edge_wavelengths: f32, // offset 36
    min_distance: f32,     // offset 40
    brightness_gain: f32,  // offset 44
    layer_pad: f32,        // offset 48, border texels around the layer
    _padding: [f32; 3],    // offset 52
}

impl Globals {
    fn new(view_size: Vec2, frame: &RippleFrame, params: &RippleParams, layer_pad: u32) -> Self {
        Self {
            resolution: view_size.to_array(),
            origin: frame.origin.to_array(),
            elapsed: frame.elapsed,
            amplitude: params.amplitude,
            frequency: params.frequency,
            decay: params.decay,
            speed: params.speed,
            edge_wavelengths: EDGE_WAVELENGTHS,
            min_distance: MIN_DISTANCE,
            brightness_gain: BRIGHTNESS_GAIN,
            layer_pad: layer_pad as f32,
            _padding: [0.0; 3],
        }
    }
}

/// Border in texels that covers every displaced sample
pub fn layer_padding(params: &RippleParams, texels_per_point: f32) -> u32 {
    let reach = max_sample_offset(params).max_element() * texels_per_point.max(0.0);
    if reach.is_finite() {
        reach.ceil() as u32 + 1
    } else {
        0
    }
}

/// Centre `layer` on a transparent canvas grown by `pad` on every side
pub fn pad_layer(layer: &RgbaImage, pad: u32) -> RgbaImage {
    let mut padded = RgbaImage::new(layer.width() + 2 * pad, layer.height() + 2 * pad);
    image::imageops::replace(&mut padded, layer, pad as i64, pad as i64);
    padded
}

// ============================================================================
// RIPPLE RENDER STATE
// ============================================================================

pub struct RippleRenderState {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub pipeline: wgpu::RenderPipeline,

    globals_buffer: wgpu::Buffer,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    bind_group: wgpu::BindGroup,
    layer_pad: u32,

    pub size: (u32, u32),
}

impl RippleRenderState {
    pub async fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        width: u32,
        height: u32,
        layer: &RgbaImage,
        layer_pad: u32,
    ) -> Result<Self, wgpu::RequestDeviceError> {
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("ripple-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(adapter);
        log::info!("Surface formats: {:?}", surface_caps.formats);
        log::info!("Surface alpha modes: {:?}", surface_caps.alpha_modes);

        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or(surface_caps.formats.first())
            .copied()
            .unwrap_or(wgpu::TextureFormat::Rgba8UnormSrgb);
        // Prefer a compositor mode that honours the clipped corners
        let alpha_mode = surface_caps
            .alpha_modes
            .iter()
            .find(|m| **m == wgpu::CompositeAlphaMode::PreMultiplied)
            .or(surface_caps.alpha_modes.first())
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        log::info!("Using surface format: {:?}", surface_format);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("ripple_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("ripple_shader.wgsl").into()),
        });

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globals"),
            contents: bytemuck::bytes_of(&Globals::new(
                Vec2::new(width as f32, height as f32),
                &RippleFrame::default(),
                &RippleParams::default(),
                layer_pad,
            )),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("ripple_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("layer_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let bind_group = create_layer_bind_group(
            &device,
            &queue,
            &bind_group_layout,
            &globals_buffer,
            &sampler,
            &pad_layer(layer, layer_pad),
        );

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("ripple_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("ripple_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[], // No vertex buffers - fullscreen triangle
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::info!("Ripple pipeline ready ({}x{})", width, height);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            globals_buffer,
            bind_group_layout,
            sampler,
            bind_group,
            layer_pad,
            size: (width, height),
        })
    }

    /// Upload a newly composed layer with a `layer_pad` texel border
    pub fn set_layer(&mut self, layer: &RgbaImage, layer_pad: u32) {
        self.layer_pad = layer_pad;
        self.bind_group = create_layer_bind_group(
            &self.device,
            &self.queue,
            &self.bind_group_layout,
            &self.globals_buffer,
            &self.sampler,
            &pad_layer(layer, layer_pad),
        );
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) {
        if new_width > 0 && new_height > 0 {
            self.size = (new_width, new_height);
            self.config.width = new_width;
            self.config.height = new_height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Reconfigure after the surface was lost
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// Draw one frame. `view_size` is the layout size in points, which may
    /// differ from the surface size in physical pixels.
    pub fn render(
        &mut self,
        frame: &RippleFrame,
        params: &RippleParams,
        view_size: Vec2,
    ) -> Result<(), wgpu::SurfaceError> {
        let globals = Globals::new(view_size, frame, params, self.layer_pad);
        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("ripple_encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("ripple_render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.bind_group, &[]);
            render_pass.draw(0..3, 0..1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn create_layer_bind_group(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    globals_buffer: &wgpu::Buffer,
    sampler: &wgpu::Sampler,
    layer: &RgbaImage,
) -> wgpu::BindGroup {
    let (width, height) = (layer.width().max(1), layer.height().max(1));
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("layer_texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    // An empty layer still needs one texel to bind
    let blank = [0u8; 4];
    let bytes: &[u8] = if layer.width() == 0 || layer.height() == 0 {
        &blank
    } else {
        layer.as_raw()
    };
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        bytes,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        size,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("ripple_bind_group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ripple::RippleTrigger;

    #[test]
    fn test_globals_layout() {
        // WGSL: two vec2<f32> then twelve f32, 16-byte multiple
        assert_eq!(std::mem::size_of::<Globals>(), 64);
        assert_eq!(std::mem::size_of::<Globals>() % 16, 0);
    }

    #[test]
    fn test_globals_from_frame() {
        let frame = RippleFrame {
            origin: Vec2::new(40.0, 80.0),
            elapsed: 0.5,
            trigger: RippleTrigger::default(),
        };
        let params = RippleParams::scaled_to(600.0, 300.0);
        let g = Globals::new(Vec2::new(600.0, 300.0), &frame, &params, 13);
        assert_eq!(g.resolution, [600.0, 300.0]);
        assert_eq!(g.origin, [40.0, 80.0]);
        assert_eq!(g.elapsed, 0.5);
        assert_eq!(g.amplitude, params.amplitude);
        assert_eq!(g.frequency, params.frequency);
        assert_eq!(g.edge_wavelengths, EDGE_WAVELENGTHS);
        assert_eq!(g.brightness_gain, BRIGHTNESS_GAIN);
        assert_eq!(g.layer_pad, 13.0);
    }

    #[test]
    fn test_layer_padding_covers_amplitude() {
        let params = RippleParams::default();
        assert_eq!(params.amplitude, BASE_AMPLITUDE);
        // 6 points at 2 texels per point, plus a texel for the bilinear tap
        assert_eq!(layer_padding(&params, 2.0), 13);
        assert_eq!(layer_padding(&params, 1.0), 7);

        let big = RippleParams::scaled_to(600.0, 600.0);
        assert!(layer_padding(&big, 1.0) as f32 >= big.amplitude + 1.0);

        let flat = RippleParams {
            amplitude: 0.0,
            ..params
        };
        assert_eq!(layer_padding(&flat, 2.0), 1);
    }

    #[test]
    fn test_pad_layer_places_image_in_centre() {
        let layer = RgbaImage::from_pixel(4, 3, image::Rgba([10, 20, 30, 255]));
        let padded = pad_layer(&layer, 2);
        assert_eq!(padded.dimensions(), (8, 7));
        assert_eq!(padded.get_pixel(0, 0).0, [0, 0, 0, 0]);
        assert_eq!(padded.get_pixel(1, 3).0, [0, 0, 0, 0]);
        assert_eq!(padded.get_pixel(2, 2).0, [10, 20, 30, 255]);
        assert_eq!(padded.get_pixel(5, 4).0, [10, 20, 30, 255]);
        assert_eq!(padded.get_pixel(6, 4).0, [0, 0, 0, 0]);
        assert_eq!(padded.get_pixel(5, 5).0, [0, 0, 0, 0]);

        assert_eq!(pad_layer(&layer, 0), layer);
    }
}
