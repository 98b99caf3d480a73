//! The wgpu scene renderer.
//!
//! Each frame runs up to three passes into one command buffer:
//!
//! 1. **Shadow**: shadow-casting meshes into the light's depth map.
//! 2. **Sky**: a fullscreen triangle that ray-casts the sky dome.
//! 3. **Lit**: every mesh, culled by material side, over the sky.
//!
//! Mesh transforms and materials live in one uniform buffer with a slot
//! per draw, bound with dynamic offsets.

use glam::Vec3;
use greeting_scene::{MeshInstance, SceneGraph};
use greeting_sky::hex_to_linear;

use crate::backend::{BackendError, RenderBackend};
use crate::camera::Camera;
use crate::depth::{DepthBuffer, ShadowMap};
use crate::gpu::RenderContext;
use crate::mesh_cache::MeshCache;
use crate::pipelines::{SceneLayouts, ScenePipelines};
use crate::tonemap::ToneMapping;
use crate::uniforms::{DrawUniform, FrameUniform, SkyPassUniform, align_to};

/// Linear distance fog.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FogSettings {
    /// Linear RGB.
    pub color: Vec3,
    pub near: f32,
    pub far: f32,
}

impl Default for FogSettings {
    fn default() -> Self {
        Self {
            color: hex_to_linear(0xffffff),
            near: 0.0,
            far: 1000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    pub tone_mapping: ToneMapping,
    pub exposure: f32,
    /// Render the directional light's shadow map.
    pub shadows: bool,
    pub fog: FogSettings,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            tone_mapping: ToneMapping::AcesFilmic,
            exposure: 0.5,
            shadows: true,
            fog: FogSettings::default(),
        }
    }
}

/// Growable uniform buffer with one aligned [`DrawUniform`] per draw.
struct DrawSlots {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    stride: u64,
    capacity: usize,
}

impl DrawSlots {
    const INITIAL_CAPACITY: usize = 64;

    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, capacity: usize) -> Self {
        let stride = align_to(
            std::mem::size_of::<DrawUniform>() as u64,
            device.limits().min_uniform_buffer_offset_alignment as u64,
        );
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("draw-uniforms"),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("draw-bind-group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<DrawUniform>() as u64),
                }),
            }],
        });
        Self {
            buffer,
            bind_group,
            stride,
            capacity,
        }
    }

    /// Write one slot per instance, growing the buffer if needed.
    fn write(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        instances: &[MeshInstance<'_>],
    ) {
        if instances.len() > self.capacity {
            let capacity = instances.len().next_power_of_two();
            log::debug!("Growing draw uniform slots to {capacity}");
            *self = Self::new(device, layout, capacity);
        }
        if instances.is_empty() {
            return;
        }
        let mut bytes = vec![0u8; self.stride as usize * instances.len()];
        for (i, instance) in instances.iter().enumerate() {
            let draw = DrawUniform::from_instance(instance);
            let start = i * self.stride as usize;
            bytes[start..start + std::mem::size_of::<DrawUniform>()]
                .copy_from_slice(bytemuck::bytes_of(&draw));
        }
        queue.write_buffer(&self.buffer, 0, &bytes);
    }

    fn offset(&self, index: usize) -> u32 {
        (index as u64 * self.stride) as u32
    }
}

/// Renders a [`SceneGraph`] to the window surface.
pub struct SceneRenderer {
    context: RenderContext,
    settings: RenderSettings,
    layouts: SceneLayouts,
    pipelines: ScenePipelines,
    depth: DepthBuffer,
    shadow_map: ShadowMap,
    shadow_bind_group: wgpu::BindGroup,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    sky_buffer: wgpu::Buffer,
    sky_bind_group: wgpu::BindGroup,
    draws: DrawSlots,
    meshes: MeshCache,
    frame_index: u64,
}

impl SceneRenderer {
    /// Default shadow map edge until the scene's light asks for another.
    const DEFAULT_SHADOW_MAP_SIZE: u32 = 4096;

    pub fn new(context: RenderContext, settings: RenderSettings) -> Self {
        let device = &context.device;
        let layouts = SceneLayouts::new(device);
        let pipelines = ScenePipelines::new(device, &layouts, context.surface_format);
        let (width, height) = context.size();
        let depth = DepthBuffer::new(device, width, height);
        let shadow_map = ShadowMap::new(device, Self::DEFAULT_SHADOW_MAP_SIZE);
        let shadow_bind_group = create_shadow_bind_group(device, &layouts, &shadow_map);

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame-uniforms"),
            size: std::mem::size_of::<FrameUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame-bind-group"),
            layout: &layouts.frame,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let sky_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sky-uniforms"),
            size: std::mem::size_of::<SkyPassUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let sky_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sky-bind-group"),
            layout: &layouts.sky,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: sky_buffer.as_entire_binding(),
            }],
        });

        let draws = DrawSlots::new(device, &layouts.draw, DrawSlots::INITIAL_CAPACITY);

        log::info!(
            "Scene renderer ready: {}x{}, {:?} exposure {}, shadows {}",
            width,
            height,
            settings.tone_mapping,
            settings.exposure,
            settings.shadows
        );

        Self {
            context,
            settings,
            layouts,
            pipelines,
            depth,
            shadow_map,
            shadow_bind_group,
            frame_buffer,
            frame_bind_group,
            sky_buffer,
            sky_bind_group,
            draws,
            meshes: MeshCache::new(),
            frame_index: 0,
        }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    /// Recreate the shadow map if the light wants a different resolution.
    fn ensure_shadow_map_size(&mut self, size: u32) {
        if self.shadow_map.requested_size() == size {
            return;
        }
        let device = &self.context.device;
        self.shadow_map = ShadowMap::new(device, size);
        self.shadow_bind_group = create_shadow_bind_group(device, &self.layouts, &self.shadow_map);
        log::debug!("Shadow map resized to {}", self.shadow_map.size());
    }

    fn shadow_pass(&self, encoder: &mut wgpu::CommandEncoder, instances: &[MeshInstance<'_>]) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("shadow-pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.shadow_map.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(ShadowMap::CLEAR_VALUE),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        pass.set_pipeline(&self.pipelines.shadow);
        pass.set_bind_group(0, &self.frame_bind_group, &[]);
        for (i, instance) in instances.iter().enumerate() {
            if !instance.cast_shadow {
                continue;
            }
            let Some(mesh) = self.meshes.get(&instance.mesh.data) else {
                continue;
            };
            pass.set_bind_group(1, &self.draws.bind_group, &[self.draws.offset(i)]);
            mesh.draw(&mut pass);
        }
    }

    fn main_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        instances: &[MeshInstance<'_>],
        draw_sky: bool,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("main-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(DepthBuffer::CLEAR_VALUE),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        pass.set_bind_group(0, &self.frame_bind_group, &[]);

        if draw_sky {
            pass.set_pipeline(&self.pipelines.sky);
            pass.set_bind_group(1, &self.sky_bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        pass.set_bind_group(2, &self.shadow_bind_group, &[]);
        for (i, instance) in instances.iter().enumerate() {
            let Some(mesh) = self.meshes.get(&instance.mesh.data) else {
                continue;
            };
            pass.set_pipeline(self.pipelines.lit(instance.mesh.material.side));
            pass.set_bind_group(1, &self.draws.bind_group, &[self.draws.offset(i)]);
            mesh.draw(&mut pass);
        }
    }
}

impl RenderBackend for SceneRenderer {
    fn render(&mut self, graph: &SceneGraph, camera: &Camera) -> Result<(), BackendError> {
        let output = self.context.get_current_texture()?;
        let target = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.frame_index += 1;

        let instances = graph.mesh_instances();
        for instance in &instances {
            self.meshes.prepare(
                &self.context.device,
                instance.name,
                &instance.mesh.data,
                self.frame_index,
            );
        }
        let evicted = self.meshes.evict_unused(self.frame_index);
        if evicted > 0 {
            log::debug!("Released {evicted} unused meshes");
        }

        let directional = graph.directional_light();
        if let Some(shadow) = directional.and_then(|light| light.shadow) {
            self.ensure_shadow_map_size(shadow.map_size);
        }
        let frame = FrameUniform::new(
            camera,
            directional,
            graph.hemisphere_light(),
            &self.settings,
            self.shadow_map.texel_size(),
        );
        let queue = &self.context.queue;
        queue.write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&frame));

        let sky = graph.sky();
        if let Some(sky) = sky {
            let uniform = SkyPassUniform::new(sky);
            queue.write_buffer(&self.sky_buffer, 0, bytemuck::bytes_of(&uniform));
        }

        self.draws.write(
            &self.context.device,
            &self.context.queue,
            &self.layouts.draw,
            &instances,
        );

        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame-encoder"),
            });
        if frame.shadows_enabled() {
            self.shadow_pass(&mut encoder, &instances);
        }
        self.main_pass(&mut encoder, &target, &instances, sky.is_some());

        self.context.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.context.resize(width, height);
        let (width, height) = self.context.size();
        self.depth.resize(&self.context.device, width, height);
        log::debug!("Renderer resized to {width}x{height}");
    }
}

fn create_shadow_bind_group(
    device: &wgpu::Device,
    layouts: &SceneLayouts,
    shadow_map: &ShadowMap,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("shadow-map-bind-group"),
        layout: &layouts.shadow_map,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&shadow_map.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&shadow_map.sampler),
            },
        ],
    })
}
