//! 渲染管线状态
//!
//! 所有管线共享同一套绑定组布局约定：
//!
//! | group | 内容 |
//! |-------|------|
//! | 0 | 每次绘制的常量（动态偏移 uniform） |
//! | 1 | 本通道的描述符表（光照 / 源贴图） |
//!
//! 管线通过 [`PipelineKind`] 索引。

use std::num::NonZeroU64;
use std::ops::Index;

use tracing::debug;

use crate::geometry::Vertex;
use crate::gfx::DEPTH_FORMAT;
use crate::renderer::constants::{PerDrawConstants, PerFrameConstants};
use crate::renderer::shaders;

/// 环境贴图（立方体贴图）格式
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// BRDF 查找表格式
pub const BRDF_LUT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rg16Float;

/// 管线种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineKind {
    SimpleForward,
    SampleEnvMap,
    EquirectangularToCube,
    GenerateIrradianceMap,
    PrefilterEnvMap,
    BrdfIntegration,
}

/// 颜色目标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorTarget {
    /// 交换链格式，使用场景的 MSAA 采样数
    Surface,
    /// 单采样的离屏目标
    Offscreen(wgpu::TextureFormat),
}

/// group 1 的布局
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassTable {
    /// 每帧常量 + 辐照度 + 预过滤 + BRDF LUT + 采样器
    Lighting,
    /// 立方体贴图 + 采样器
    CubeSource,
    /// 2D 贴图 + 采样器
    EquirectSource,
    /// 不使用任何绑定组
    None,
}

/// 管线的固定功能状态
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineDesc {
    pub shader: &'static str,
    pub color_target: ColorTarget,
    /// (写入深度, 比较函数)
    pub depth: Option<(bool, wgpu::CompareFunction)>,
    pub cull_mode: Option<wgpu::Face>,
    /// 是否使用 `Vertex` 顶点缓冲（否则为全屏三角形）
    pub uses_mesh: bool,
    pub pass_table: PassTable,
}

impl PipelineKind {
    pub const ALL: [PipelineKind; 6] = [
        PipelineKind::SimpleForward,
        PipelineKind::SampleEnvMap,
        PipelineKind::EquirectangularToCube,
        PipelineKind::GenerateIrradianceMap,
        PipelineKind::PrefilterEnvMap,
        PipelineKind::BrdfIntegration,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            PipelineKind::SimpleForward => "SimpleForward",
            PipelineKind::SampleEnvMap => "SampleEnvMap",
            PipelineKind::EquirectangularToCube => "EquirectangularToCube",
            PipelineKind::GenerateIrradianceMap => "GenerateIrradianceMap",
            PipelineKind::PrefilterEnvMap => "PrefilterEnvMap",
            PipelineKind::BrdfIntegration => "BrdfIntegration",
        }
    }

    pub fn desc(self) -> PipelineDesc {
        let cube_pass = |shader: &'static str| PipelineDesc {
            shader,
            color_target: ColorTarget::Offscreen(HDR_FORMAT),
            depth: None,
            cull_mode: None,
            uses_mesh: true,
            pass_table: PassTable::CubeSource,
        };

        match self {
            PipelineKind::SimpleForward => PipelineDesc {
                shader: shaders::SIMPLE_FORWARD,
                color_target: ColorTarget::Surface,
                depth: Some((true, wgpu::CompareFunction::Less)),
                cull_mode: Some(wgpu::Face::Back),
                uses_mesh: true,
                pass_table: PassTable::Lighting,
            },
            PipelineKind::SampleEnvMap => PipelineDesc {
                shader: shaders::SAMPLE_ENV_MAP,
                color_target: ColorTarget::Surface,
                depth: Some((false, wgpu::CompareFunction::LessEqual)),
                cull_mode: None,
                uses_mesh: true,
                pass_table: PassTable::CubeSource,
            },
            PipelineKind::EquirectangularToCube => PipelineDesc {
                pass_table: PassTable::EquirectSource,
                ..cube_pass(shaders::EQUIRECT_TO_CUBE)
            },
            PipelineKind::GenerateIrradianceMap => cube_pass(shaders::GENERATE_IRRADIANCE_MAP),
            PipelineKind::PrefilterEnvMap => cube_pass(shaders::PREFILTER_ENV_MAP),
            PipelineKind::BrdfIntegration => PipelineDesc {
                shader: shaders::BRDF_INTEGRATION,
                color_target: ColorTarget::Offscreen(BRDF_LUT_FORMAT),
                depth: None,
                cull_mode: None,
                uses_mesh: false,
                pass_table: PassTable::None,
            },
        }
    }
}

/// 绑定组布局（根签名的对应物）
pub struct BindGroupLayouts {
    pub per_draw: wgpu::BindGroupLayout,
    pub lighting: wgpu::BindGroupLayout,
    pub cube_source: wgpu::BindGroupLayout,
    pub equirect_source: wgpu::BindGroupLayout,
}

fn texture_entry(binding: u32, view_dimension: wgpu::TextureViewDimension) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

fn dynamic_uniform_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    size: usize,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: true,
            min_binding_size: NonZeroU64::new(size as u64),
        },
        count: None,
    }
}

fn uniform_window(binding: u32, buffer: &wgpu::Buffer, size: usize) -> wgpu::BindGroupEntry<'_> {
    wgpu::BindGroupEntry {
        binding,
        resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
            buffer,
            offset: 0,
            size: NonZeroU64::new(size as u64),
        }),
    }
}

impl BindGroupLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let per_draw = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Per Draw Layout"),
            entries: &[dynamic_uniform_entry(
                0,
                wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                std::mem::size_of::<PerDrawConstants>(),
            )],
        });

        let lighting = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Lighting Layout"),
            entries: &[
                dynamic_uniform_entry(
                    0,
                    wgpu::ShaderStages::FRAGMENT,
                    std::mem::size_of::<PerFrameConstants>(),
                ),
                texture_entry(1, wgpu::TextureViewDimension::Cube),
                texture_entry(2, wgpu::TextureViewDimension::Cube),
                texture_entry(3, wgpu::TextureViewDimension::D2),
                sampler_entry(4),
            ],
        });

        let cube_source = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Cube Source Layout"),
            entries: &[texture_entry(0, wgpu::TextureViewDimension::Cube), sampler_entry(1)],
        });

        let equirect_source = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Equirect Source Layout"),
            entries: &[texture_entry(0, wgpu::TextureViewDimension::D2), sampler_entry(1)],
        });

        Self {
            per_draw,
            lighting,
            cube_source,
            equirect_source,
        }
    }

    /// 每次绘制常量的绑定组，绑定上传缓冲开头的一个窗口，绘制时用动态偏移定位
    pub fn per_draw_bind_group(&self, device: &wgpu::Device, upload: &wgpu::Buffer) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Per Draw Bind Group"),
            layout: &self.per_draw,
            entries: &[uniform_window(0, upload, std::mem::size_of::<PerDrawConstants>())],
        })
    }

    /// 前向光照的描述符表
    pub fn lighting_bind_group(
        &self,
        device: &wgpu::Device,
        upload: &wgpu::Buffer,
        irradiance: &wgpu::TextureView,
        prefiltered: &wgpu::TextureView,
        brdf_lut: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Lighting Bind Group"),
            layout: &self.lighting,
            entries: &[
                uniform_window(0, upload, std::mem::size_of::<PerFrameConstants>()),
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(irradiance),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(prefiltered),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(brdf_lut),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    /// 单张源贴图 + 采样器；`cube` 决定使用哪个布局
    pub fn source_bind_group(
        &self,
        device: &wgpu::Device,
        cube: bool,
        view: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
    ) -> wgpu::BindGroup {
        let (label, layout) = if cube {
            ("Cube Source Bind Group", &self.cube_source)
        } else {
            ("Equirect Source Bind Group", &self.equirect_source)
        };
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    fn pass_table(&self, table: PassTable) -> Option<&wgpu::BindGroupLayout> {
        match table {
            PassTable::Lighting => Some(&self.lighting),
            PassTable::CubeSource => Some(&self.cube_source),
            PassTable::EquirectSource => Some(&self.equirect_source),
            PassTable::None => None,
        }
    }
}

/// 全部渲染管线
pub struct Pipelines {
    pub layouts: BindGroupLayouts,
    /// 线性过滤、边缘钳制、三线性 mip 的采样器
    pub linear_sampler: wgpu::Sampler,
    pipelines: Vec<wgpu::RenderPipeline>,
    msaa_samples: u32,
}

impl Pipelines {
    /// 创建所有管线
    ///
    /// # 参数
    ///
    /// * `surface_format` - 交换链格式（场景管线的颜色目标）
    /// * `msaa_samples` - 场景管线的采样数
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat, msaa_samples: u32) -> Self {
        let layouts = BindGroupLayouts::new(device);

        let pipelines = PipelineKind::ALL
            .iter()
            .map(|&kind| {
                debug!("Creating pipeline {}", kind.label());
                Self::create_pipeline(device, &layouts, kind, surface_format, msaa_samples)
            })
            .collect();

        let linear_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Linear Clamp Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            layouts,
            linear_sampler,
            pipelines,
            msaa_samples,
        }
    }

    pub fn msaa_samples(&self) -> u32 {
        self.msaa_samples
    }

    fn create_pipeline(
        device: &wgpu::Device,
        layouts: &BindGroupLayouts,
        kind: PipelineKind,
        surface_format: wgpu::TextureFormat,
        msaa_samples: u32,
    ) -> wgpu::RenderPipeline {
        let desc = kind.desc();
        let module = shaders::create_module(device, kind.label(), desc.shader);

        let bind_group_layouts: Vec<&wgpu::BindGroupLayout> = match layouts.pass_table(desc.pass_table) {
            Some(table) => vec![&layouts.per_draw, table],
            None => Vec::new(),
        };
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(kind.label()),
            bind_group_layouts: &bind_group_layouts,
            push_constant_ranges: &[],
        });

        let (format, sample_count) = match desc.color_target {
            ColorTarget::Surface => (surface_format, msaa_samples),
            ColorTarget::Offscreen(format) => (format, 1),
        };

        let vertex_buffers = if desc.uses_mesh {
            vec![Vertex::buffer_layout()]
        } else {
            Vec::new()
        };

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(kind.label()),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: "vs_main",
                buffers: &vertex_buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: desc.cull_mode,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: desc.depth.map(|(depth_write_enabled, depth_compare)| wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled,
                depth_compare,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: sample_count,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        })
    }
}

impl Index<PipelineKind> for Pipelines {
    type Output = wgpu::RenderPipeline;

    fn index(&self, kind: PipelineKind) -> &Self::Output {
        &self.pipelines[kind.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_indices_follow_all() {
        for (i, kind) in PipelineKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn test_scene_pipelines_target_surface() {
        let forward = PipelineKind::SimpleForward.desc();
        assert_eq!(forward.color_target, ColorTarget::Surface);
        assert_eq!(forward.depth, Some((true, wgpu::CompareFunction::Less)));
        assert_eq!(forward.cull_mode, Some(wgpu::Face::Back));
        assert_eq!(forward.pass_table, PassTable::Lighting);

        let sky = PipelineKind::SampleEnvMap.desc();
        assert_eq!(sky.depth, Some((false, wgpu::CompareFunction::LessEqual)));
        assert_eq!(sky.cull_mode, None);
    }

    #[test]
    fn test_precompute_pipelines_are_offscreen() {
        for kind in [
            PipelineKind::EquirectangularToCube,
            PipelineKind::GenerateIrradianceMap,
            PipelineKind::PrefilterEnvMap,
        ] {
            let desc = kind.desc();
            assert_eq!(desc.color_target, ColorTarget::Offscreen(HDR_FORMAT), "{}", kind.label());
            assert!(desc.depth.is_none());
            assert!(desc.cull_mode.is_none());
            assert!(desc.uses_mesh);
        }
        assert_eq!(
            PipelineKind::EquirectangularToCube.desc().pass_table,
            PassTable::EquirectSource
        );

        let brdf = PipelineKind::BrdfIntegration.desc();
        assert_eq!(brdf.color_target, ColorTarget::Offscreen(BRDF_LUT_FORMAT));
        assert!(!brdf.uses_mesh);
        assert_eq!(brdf.pass_table, PassTable::None);
    }
}
