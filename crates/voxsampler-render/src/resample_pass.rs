//! Slice-by-slice resampling pass.
//!
//! Every output slice is one render pass of a fullscreen triangle into the
//! slice target, followed by a copy of that target into the staging buffer.
//! The per-slice uniforms live in a single buffer and are selected with a
//! dynamic offset, so the whole block is encoded into one command buffer.

use voxsampler_core::SamplingTransform;

use crate::buffer::{align_to, create_dynamic_uniform_buffer, pack_strided, update_buffer};
use crate::engine::{GpuContext, SliceTarget, TARGET_FORMAT};
use crate::error::{RenderError, RenderResult};
use crate::volume_texture::VolumeTexture;

/// GPU representation of the per-slice uniforms.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SliceUniforms {
    pub index_to_texcoord: [[f32; 4]; 4],
    pub slice: [f32; 4],
}

impl SliceUniforms {
    /// Uniforms for output slice `z` of `transform`.
    #[allow(clippy::cast_precision_loss)]
    pub fn new(transform: &SamplingTransform, z: u32) -> Self {
        Self {
            index_to_texcoord: transform.index_to_texcoord().to_cols_array_2d(),
            slice: [z as f32, 0.0, 0.0, 0.0],
        }
    }
}

const SLICE_UNIFORMS_SIZE: u64 = std::mem::size_of::<SliceUniforms>() as u64;

/// Resampling render resources.
pub struct ResamplePass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_stride: u64,
    uniform_buffer: Option<wgpu::Buffer>,
    uniform_slices: u32,
}

impl ResamplePass {
    /// Creates the resampling pipeline.
    pub fn new(ctx: &GpuContext) -> RenderResult<Self> {
        let device = &ctx.device;
        let uniform_stride = align_to(
            SLICE_UNIFORMS_SIZE,
            u64::from(ctx.limits().min_uniform_buffer_offset_alignment),
        );

        ctx.scoped("creating resample pipeline", |_| {
            let bind_group_layout =
                device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("Resample Bind Group Layout"),
                    entries: &[
                        // Volume texture
                        wgpu::BindGroupLayoutEntry {
                            binding: 0,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Texture {
                                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                                view_dimension: wgpu::TextureViewDimension::D3,
                                multisampled: false,
                            },
                            count: None,
                        },
                        // Trilinear sampler
                        wgpu::BindGroupLayoutEntry {
                            binding: 1,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                            count: None,
                        },
                        // Slice uniforms
                        wgpu::BindGroupLayoutEntry {
                            binding: 2,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Uniform,
                                has_dynamic_offset: true,
                                min_binding_size: wgpu::BufferSize::new(SLICE_UNIFORMS_SIZE),
                            },
                            count: None,
                        },
                    ],
                });

            let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Resample Shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("shaders/resample.wgsl").into()),
            });

            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Resample Pipeline Layout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

            let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Resample Pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: TARGET_FORMAT,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

            Self {
                pipeline,
                bind_group_layout,
                uniform_stride,
                uniform_buffer: None,
                uniform_slices: 0,
            }
        })
    }

    /// Byte distance between consecutive slice uniforms.
    pub fn uniform_stride(&self) -> u64 {
        self.uniform_stride
    }

    /// Writes the uniforms for every slice of `transform`, growing the
    /// uniform buffer when the block is deeper than any before it.
    pub fn write_uniforms(
        &mut self,
        ctx: &GpuContext,
        transform: &SamplingTransform,
    ) -> RenderResult<()> {
        let depth = transform.output().z;
        let size = self.uniform_stride * u64::from(depth);
        if size > ctx.limits().max_buffer_size {
            return Err(RenderError::LimitExceeded {
                what: "slice uniform buffer size",
                requested: size,
                limit: ctx.limits().max_buffer_size,
            });
        }

        if self.uniform_buffer.is_none() || self.uniform_slices < depth {
            if let Some(old) = self.uniform_buffer.take() {
                old.destroy();
            }
            ctx.trace(format_args!("creating slice uniform buffer for {depth} slices"));
            let buffer = ctx.scoped("allocating slice uniforms", |ctx| {
                create_dynamic_uniform_buffer(&ctx.device, size, Some("Slice Uniform Buffer"))
            })?;
            self.uniform_buffer = Some(buffer);
            self.uniform_slices = depth;
        }

        let slices: Vec<SliceUniforms> = (0..depth)
            .map(|z| SliceUniforms::new(transform, z))
            .collect();
        let bytes = pack_strided(&slices, self.uniform_stride as usize);
        if let Some(buffer) = &self.uniform_buffer {
            update_buffer(&ctx.queue, buffer, &bytes);
        }
        Ok(())
    }

    /// Creates a bind group reading `volume` with the current uniforms.
    pub fn create_bind_group(
        &self,
        device: &wgpu::Device,
        volume: &VolumeTexture,
    ) -> Option<wgpu::BindGroup> {
        let uniform_buffer = self.uniform_buffer.as_ref()?;
        Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Resample Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(volume.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(volume.sampler()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: uniform_buffer,
                        offset: 0,
                        size: wgpu::BufferSize::new(SLICE_UNIFORMS_SIZE),
                    }),
                },
            ],
        }))
    }

    /// Renders output slice `z` into `target_view`.
    pub fn render_slice(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        target_view: &wgpu::TextureView,
        bind_group: &wgpu::BindGroup,
        z: u32,
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Resample Slice Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            ..Default::default()
        });

        #[allow(clippy::cast_possible_truncation)]
        let offset = (u64::from(z) * self.uniform_stride) as wgpu::DynamicOffset;
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, bind_group, &[offset]);
        render_pass.draw(0..3, 0..1); // Fullscreen triangle
    }

    /// Encodes the whole block: one pass and one copy per output slice.
    pub fn encode_block(
        &mut self,
        ctx: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        volume: &VolumeTexture,
        target: &SliceTarget,
        transform: &SamplingTransform,
    ) -> RenderResult<()> {
        self.write_uniforms(ctx, transform)?;
        let bind_group = self.create_bind_group(&ctx.device, volume).ok_or_else(|| {
            RenderError::ValidationFailed("binding slice uniforms: buffer missing".into())
        })?;
        for z in 0..transform.output().z {
            self.render_slice(encoder, target.view(), &bind_group, z);
            target.encode_copy(encoder, z);
        }
        ctx.trace(format_args!(
            "encoded {} slice passes",
            transform.output().z
        ));
        Ok(())
    }

    /// Frees the uniform buffer immediately.
    pub fn destroy(mut self) {
        if let Some(buffer) = self.uniform_buffer.take() {
            buffer.destroy();
        }
    }
}
