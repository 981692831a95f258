//! wgpu binding of the effect shaders
//!
//! [`GpuEffectProgram`] owns the pipeline of one template and a ring of
//! uniform slots, one per draw of that template in the current frame.
//! [`EffectContext`] holds the loaded programs, tracks which one is bound and
//! implements [`UniformSink`] by writing into the bound program's block.
//!
//! Per frame: `begin_frame`, then for each node `update` (which claims a slot
//! and returns an [`EffectDraw`]) and `EffectDraw::draw` inside the render
//! pass. Every node reads its own slot through a dynamic offset, so nodes
//! sharing a template never see each other's uniforms.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::effects::RenderOpProps;
use crate::error::{Result, ShaderError};
use crate::program::ShaderProgram;
use crate::registry::ShaderRegistry;
use crate::template::ShaderTemplate;
use crate::uniforms::{UniformBlock, UniformData, UniformSink};

/// Pipeline settings shared by every effect program
#[derive(Clone, Debug)]
pub struct EffectPipelineConfig {
    /// Render target format
    pub format: wgpu::TextureFormat,
    /// MSAA sample count
    pub sample_count: u32,
    /// Blending with the render target (None = replace)
    pub blend: Option<wgpu::BlendState>,
    /// Uniform slots per template, i.e. draws of one template per frame
    pub max_draws_per_frame: u32,
}

impl Default for EffectPipelineConfig {
    fn default() -> Self {
        Self {
            format: wgpu::TextureFormat::Bgra8UnormSrgb,
            sample_count: 1,
            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
            max_draws_per_frame: 256,
        }
    }
}

/// Slot allocation inside a per-frame uniform buffer
///
/// Slots are `stride` bytes apart, where `stride` is the block size rounded up
/// to the device's dynamic offset alignment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UniformRing {
    stride: u64,
    capacity: u32,
    cursor: u32,
}

impl UniformRing {
    pub fn new(block_size: u64, alignment: u64, capacity: u32) -> Self {
        let alignment = alignment.max(1);
        let stride = block_size.max(1).div_ceil(alignment) * alignment;
        Self {
            stride,
            capacity: capacity.max(1),
            cursor: 0,
        }
    }

    pub fn stride(&self) -> u64 {
        self.stride
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Slots claimed since the last `reset`
    pub fn used(&self) -> u32 {
        self.cursor
    }

    /// Total buffer size backing every slot
    pub fn buffer_size(&self) -> u64 {
        self.stride * self.capacity as u64
    }

    /// Claim the next slot, returning its byte offset
    pub fn claim(&mut self) -> Option<u64> {
        if self.cursor >= self.capacity {
            return None;
        }
        let offset = self.cursor as u64 * self.stride;
        self.cursor += 1;
        Some(offset)
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }
}

/// GPU resources of one shader template
pub struct GpuEffectProgram {
    template: Arc<ShaderTemplate>,
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    ring: UniformRing,
    block: UniformBlock,
}

/// One node's draw: the program plus the uniform slot its update wrote
#[derive(Clone, Copy)]
pub struct EffectDraw<'a> {
    pub program: &'a GpuEffectProgram,
    pub offset: u32,
}

impl EffectDraw<'_> {
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>, bind_group: &wgpu::BindGroup) {
        self.program.draw(render_pass, bind_group, self.offset);
    }
}

impl GpuEffectProgram {
    /// Compile the template's WGSL and build its pipeline
    ///
    /// The source is validated with naga first so that a bad module is
    /// reported as [`ShaderError::Compile`] instead of a device error.
    pub fn new(
        device: &wgpu::Device,
        template: Arc<ShaderTemplate>,
        config: &EffectPipelineConfig,
    ) -> Result<Self> {
        template.validate()?;

        let label = template.name().to_string();
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&label),
            source: wgpu::ShaderSource::Wgsl(template.source().into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Effect Bind Group Layout"),
            entries: &[
                // Uniforms
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: wgpu::BufferSize::new(template.layout().size() as u64),
                    },
                    count: None,
                },
                // Node texture
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                // Node sampler
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Effect Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&label),
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
                    format: config.format,
                    blend: config.blend,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: config.sample_count,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        let layout = template.layout().clone();
        let ring = UniformRing::new(
            layout.size() as u64,
            device.limits().min_uniform_buffer_offset_alignment as u64,
            config.max_draws_per_frame,
        );
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Effect Uniforms Buffer"),
            size: ring.buffer_size(),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut block = UniformBlock::new(layout);
        template.defaults().apply(&mut block)?;

        debug!(
            "Created GPU program '{}' ({} slots of {} bytes)",
            label,
            ring.capacity(),
            ring.stride()
        );

        Ok(Self {
            template,
            pipeline,
            bind_group_layout,
            uniform_buffer,
            ring,
            block,
        })
    }

    pub fn template(&self) -> &Arc<ShaderTemplate> {
        &self.template
    }

    pub fn block(&self) -> &UniformBlock {
        &self.block
    }

    /// Bind group for one node texture
    pub fn bind_group(
        &self,
        device: &wgpu::Device,
        texture: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Effect Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: &self.uniform_buffer,
                        offset: 0,
                        size: wgpu::BufferSize::new(self.block.as_bytes().len() as u64),
                    }),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(texture),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    pub fn ring(&self) -> &UniformRing {
        &self.ring
    }

    /// Release every uniform slot for a new frame
    pub fn begin_frame(&mut self) {
        self.ring.reset();
    }

    /// Write the uniform block into the next free slot
    ///
    /// Returns the dynamic offset to draw with.
    pub fn flush(&mut self, queue: &wgpu::Queue) -> Result<u32> {
        let offset = self.ring.claim().ok_or_else(|| ShaderError::UniformRingFull {
            shader: self.template.name().to_string(),
            capacity: self.ring.capacity(),
        })?;
        queue.write_buffer(&self.uniform_buffer, offset, self.block.as_bytes());
        Ok(offset as u32)
    }

    /// Record the draw of one node quad reading the slot at `offset`
    pub fn draw(
        &self,
        render_pass: &mut wgpu::RenderPass<'_>,
        bind_group: &wgpu::BindGroup,
        offset: u32,
    ) {
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, bind_group, &[offset]);
        // 6 vertices per quad (2 triangles)
        render_pass.draw(0..6, 0..1);
    }
}

impl UniformSink for GpuEffectProgram {
    fn upload(&mut self, name: &str, data: UniformData<'_>) -> Result<()> {
        self.block.upload(name, data)
    }
}

/// Loaded GPU programs and the currently bound one
#[derive(Default)]
pub struct EffectContext {
    programs: FxHashMap<String, GpuEffectProgram>,
    bound: Option<String>,
}

impl EffectContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a GPU program for one template
    ///
    /// Loading a second template under an already loaded name is a
    /// [`ShaderError::DuplicateShader`]; the first program stays loaded.
    pub fn load(
        &mut self,
        device: &wgpu::Device,
        template: Arc<ShaderTemplate>,
        config: &EffectPipelineConfig,
    ) -> Result<()> {
        let name = template.name().to_string();
        ensure_unloaded(&self.programs, &name)?;
        let program = GpuEffectProgram::new(device, template, config)?;
        self.programs.insert(name, program);
        Ok(())
    }

    /// Build GPU programs for every registered template
    pub fn load_registry(
        &mut self,
        device: &wgpu::Device,
        registry: &ShaderRegistry,
        config: &EffectPipelineConfig,
    ) -> Result<()> {
        for template in registry.templates() {
            self.load(device, template.clone(), config)?;
        }
        Ok(())
    }

    pub fn program(&self, name: &str) -> Option<&GpuEffectProgram> {
        self.programs.get(name)
    }

    /// Make a loaded program the target of uniform uploads
    pub fn use_program(&mut self, name: &str) -> Result<&GpuEffectProgram> {
        let program = self
            .programs
            .get(name)
            .ok_or_else(|| ShaderError::UnknownShader(name.to_string()))?;
        self.bound = Some(name.to_string());
        Ok(program)
    }

    pub fn unbind(&mut self) {
        self.bound = None;
    }

    pub fn bound(&self) -> Option<&GpuEffectProgram> {
        self.bound.as_deref().and_then(|name| self.programs.get(name))
    }

    /// Release the uniform slots of every loaded program
    pub fn begin_frame(&mut self) {
        for program in self.programs.values_mut() {
            program.begin_frame();
        }
    }

    /// Bind `program`'s template, push its uniforms and write them into a
    /// fresh slot of the template's uniform ring
    pub fn update(
        &mut self,
        program: &ShaderProgram,
        op: &RenderOpProps,
        queue: &wgpu::Queue,
    ) -> Result<EffectDraw<'_>> {
        self.use_program(program.name())?;
        program.update(op, self)?;

        let gpu = self
            .programs
            .get_mut(program.name())
            .ok_or(ShaderError::NoProgramBound)?;
        let offset = gpu.flush(queue)?;
        Ok(EffectDraw {
            program: gpu,
            offset,
        })
    }
}

fn ensure_unloaded<V>(programs: &FxHashMap<String, V>, name: &str) -> Result<()> {
    if programs.contains_key(name) {
        return Err(ShaderError::DuplicateShader(name.to_string()));
    }
    Ok(())
}

impl UniformSink for EffectContext {
    fn upload(&mut self, name: &str, data: UniformData<'_>) -> Result<()> {
        let bound = self.bound.as_deref().ok_or(ShaderError::NoProgramBound)?;
        self.programs
            .get_mut(bound)
            .ok_or(ShaderError::NoProgramBound)?
            .upload(name, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_without_bound_program() {
        let mut ctx = EffectContext::new();
        assert_eq!(ctx.uniform_1f("alpha", 1.0), Err(ShaderError::NoProgramBound));
        assert_eq!(ctx.uniform_rgba("border_color", 0xff), Err(ShaderError::NoProgramBound));
        assert!(ctx.bound().is_none());
    }

    #[test]
    fn test_use_unknown_program() {
        let mut ctx = EffectContext::new();
        assert!(matches!(
            ctx.use_program("Rounded"),
            Err(ShaderError::UnknownShader(_))
        ));
        ctx.unbind();
        assert_eq!(ctx.uniform_1i("side", 0), Err(ShaderError::NoProgramBound));
    }

    #[test]
    fn test_default_pipeline_config() {
        let config = EffectPipelineConfig::default();
        assert_eq!(config.sample_count, 1);
        assert_eq!(config.blend, Some(wgpu::BlendState::ALPHA_BLENDING));
        assert_eq!(config.max_draws_per_frame, 256);
    }

    #[test]
    fn test_ring_gives_each_draw_its_own_slot() {
        // 112 byte block, 256 byte offset alignment
        let mut ring = UniformRing::new(112, 256, 3);
        assert_eq!(ring.stride(), 256);
        assert_eq!(ring.buffer_size(), 768);

        let first = ring.claim().unwrap();
        let second = ring.claim().unwrap();
        assert_eq!((first, second), (0, 256));
        assert_eq!(ring.used(), 2);
    }

    #[test]
    fn test_ring_is_exhausted_until_reset() {
        let mut ring = UniformRing::new(256, 256, 2);
        assert_eq!(ring.stride(), 256);
        assert!(ring.claim().is_some());
        assert!(ring.claim().is_some());
        assert_eq!(ring.claim(), None);

        ring.reset();
        assert_eq!(ring.claim(), Some(0));
    }

    #[test]
    fn test_loading_a_name_twice_is_an_error() {
        let mut loaded: FxHashMap<String, ()> = FxHashMap::default();
        assert_eq!(ensure_unloaded(&loaded, "Rounded"), Ok(()));

        loaded.insert("Rounded".to_string(), ());
        assert_eq!(
            ensure_unloaded(&loaded, "Rounded"),
            Err(ShaderError::DuplicateShader("Rounded".to_string()))
        );
        assert_eq!(ensure_unloaded(&loaded, "Border"), Ok(()));
    }

    #[test]
    fn test_ring_stride_is_aligned() {
        let ring = UniformRing::new(300, 256, 1);
        assert_eq!(ring.stride(), 512);
        assert_eq!(UniformRing::new(48, 16, 1).stride(), 48);
    }
}
