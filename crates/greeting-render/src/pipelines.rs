//! Bind group layouts and render pipelines for the three scene passes.
//!
//! | group | shadow pass | sky pass        | lit pass             |
//! |-------|-------------|-----------------|----------------------|
//! | 0     | frame       | frame           | frame                |
//! | 1     | draw (dyn)  | sky             | draw (dyn)           |
//! | 2     |             |                 | shadow map + sampler |

use std::num::NonZeroU64;

use greeting_scene::{Side, Vertex};

use crate::depth::{DepthBuffer, ShadowMap};
use crate::uniforms::{DrawUniform, FrameUniform, SkyPassUniform};

const COMMON_SHADER: &str = include_str!("shaders/common.wgsl");
const SHADOW_SHADER: &str = include_str!("shaders/shadow.wgsl");
const SKY_SHADER: &str = include_str!("shaders/sky.wgsl");
const LIT_SHADER: &str = include_str!("shaders/lit.wgsl");

/// A pass shader with the shared declarations prepended.
pub fn shader_source(pass: &str) -> String {
    format!("{COMMON_SHADER}\n{pass}")
}

pub fn shadow_shader_source() -> String {
    shader_source(SHADOW_SHADER)
}

pub fn sky_shader_source() -> String {
    shader_source(SKY_SHADER)
}

pub fn lit_shader_source() -> String {
    shader_source(LIT_SHADER)
}

/// Faces to cull so that only the material's visible side is drawn.
pub fn cull_mode_for(side: Side) -> Option<wgpu::Face> {
    match side {
        Side::Front => Some(wgpu::Face::Back),
        Side::Back => Some(wgpu::Face::Front),
        Side::Double => None,
    }
}

/// Buffer layout of [`Vertex`]: position then normal.
pub fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &ATTRIBUTES,
    }
}

fn uniform_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    dynamic: bool,
    size: usize,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: dynamic,
            min_binding_size: NonZeroU64::new(size as u64),
        },
        count: None,
    }
}

pub struct SceneLayouts {
    pub frame: wgpu::BindGroupLayout,
    pub draw: wgpu::BindGroupLayout,
    pub sky: wgpu::BindGroupLayout,
    pub shadow_map: wgpu::BindGroupLayout,
}

impl SceneLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let frame = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame-bgl"),
            entries: &[uniform_entry(
                0,
                wgpu::ShaderStages::VERTEX_FRAGMENT,
                false,
                std::mem::size_of::<FrameUniform>(),
            )],
        });
        let draw = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("draw-bgl"),
            entries: &[uniform_entry(
                0,
                wgpu::ShaderStages::VERTEX_FRAGMENT,
                true,
                std::mem::size_of::<DrawUniform>(),
            )],
        });
        let sky = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sky-bgl"),
            entries: &[uniform_entry(
                0,
                wgpu::ShaderStages::FRAGMENT,
                false,
                std::mem::size_of::<SkyPassUniform>(),
            )],
        });
        let shadow_map = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("shadow-map-bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        });
        Self {
            frame,
            draw,
            sky,
            shadow_map,
        }
    }
}

pub struct ScenePipelines {
    pub shadow: wgpu::RenderPipeline,
    pub sky: wgpu::RenderPipeline,
    lit_front: wgpu::RenderPipeline,
    lit_back: wgpu::RenderPipeline,
    lit_double: wgpu::RenderPipeline,
}

impl ScenePipelines {
    pub fn new(
        device: &wgpu::Device,
        layouts: &SceneLayouts,
        color_format: wgpu::TextureFormat,
    ) -> Self {
        let shadow_module = create_module(device, "shadow-shader", shadow_shader_source());
        let sky_module = create_module(device, "sky-shader", sky_shader_source());
        let lit_module = create_module(device, "lit-shader", lit_shader_source());

        let shadow_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("shadow-pipeline-layout"),
            bind_group_layouts: &[&layouts.frame, &layouts.draw],
            immediate_size: 0,
        });
        let sky_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sky-pipeline-layout"),
            bind_group_layouts: &[&layouts.frame, &layouts.sky],
            immediate_size: 0,
        });
        let lit_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lit-pipeline-layout"),
            bind_group_layouts: &[&layouts.frame, &layouts.draw, &layouts.shadow_map],
            immediate_size: 0,
        });

        let lit = |side: Side, label: &str| {
            create_lit_pipeline(device, &lit_layout, &lit_module, color_format, side, label)
        };

        Self {
            shadow: create_shadow_pipeline(device, &shadow_layout, &shadow_module),
            sky: create_sky_pipeline(device, &sky_layout, &sky_module, color_format),
            lit_front: lit(Side::Front, "lit-front-pipeline"),
            lit_back: lit(Side::Back, "lit-back-pipeline"),
            lit_double: lit(Side::Double, "lit-double-pipeline"),
        }
    }

    /// Lit pipeline culling the faces `side` hides.
    pub fn lit(&self, side: Side) -> &wgpu::RenderPipeline {
        match side {
            Side::Front => &self.lit_front,
            Side::Back => &self.lit_back,
            Side::Double => &self.lit_double,
        }
    }
}

fn create_module(device: &wgpu::Device, label: &str, source: String) -> wgpu::ShaderModule {
    log::debug!("Compiling shader '{label}'");
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    })
}

fn create_shadow_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    module: &wgpu::ShaderModule,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("shadow-pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some("vs_shadow"),
            buffers: &[vertex_layout()],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: ShadowMap::FORMAT,
            depth_write_enabled: true,
            depth_compare: ShadowMap::COMPARE_FUNCTION,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState {
                constant: 2,
                slope_scale: 1.5,
                clamp: 0.0,
            },
        }),
        multisample: wgpu::MultisampleState::default(),
        fragment: None,
        multiview_mask: None,
        cache: None,
    })
}

fn create_sky_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    module: &wgpu::ShaderModule,
    color_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("sky-pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some("vs_sky"),
            buffers: &[],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState::default(),
        // Drawn first, behind everything, without touching depth.
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DepthBuffer::FORMAT,
            depth_write_enabled: false,
            depth_compare: wgpu::CompareFunction::Always,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some("fs_sky"),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview_mask: None,
        cache: None,
    })
}

fn create_lit_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    module: &wgpu::ShaderModule,
    color_format: wgpu::TextureFormat,
    side: Side,
    label: &str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some("vs_main"),
            buffers: &[vertex_layout()],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: cull_mode_for(side),
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DepthBuffer::FORMAT,
            depth_write_enabled: true,
            depth_compare: DepthBuffer::COMPARE_FUNCTION,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview_mask: None,
        cache: None,
    })
}
