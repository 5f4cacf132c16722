//! 基于图像的光照：环境贴图预计算
//!
//! 启动时一次性完成，全部录制进同一个命令编码器：
//!
//! 1. 等距柱状 HDR → 环境立方体贴图（完整 mip 链）
//! 2. 环境贴图 → 辐照度贴图（漫反射卷积，完整 mip 链）
//! 3. 环境贴图 → 预过滤贴图（每级 mip 对应一个粗糙度）
//! 4. 分离和近似的 BRDF 积分查找表
//!
//! 每个面的常量从当前帧的上传堆分配，源贴图的绑定组放在当前帧的
//! 着色器可见描述符堆里；提交后等待 GPU 完成，这些临时分配随之重置。

pub mod cubemap;
pub mod hdr;

pub use cubemap::GpuCubemap;
pub use hdr::{load_equirect_hdr, procedural_sky, EnvironmentSource, EquirectImage};

use std::path::Path;
use std::time::Instant;

use crate::core::error::Result;
use crate::core::scene::EnvironmentConfig;
use crate::geometry::StaticMesh;
use crate::gfx::GraphicsContext;
use crate::ibl_info;
use crate::math::{cube_face_projection, cube_face_view, mip_level_count, Matrix4};
use crate::renderer::buffers::MeshBuffers;
use crate::renderer::constants::PerDrawConstants;
use crate::renderer::mipmap::MipmapGenerator;
use crate::renderer::pipelines::{PipelineKind, Pipelines, BRDF_LUT_FORMAT};

/// 预过滤贴图第 `mip` 级对应的粗糙度
pub fn prefilter_roughness(mip: u32, levels: u32) -> f32 {
    if levels <= 1 {
        0.0
    } else {
        mip as f32 / (levels - 1) as f32
    }
}

/// 每级 mip 的边长
pub fn mip_chain(resolution: u32, levels: u32) -> Vec<u32> {
    (0..levels).map(|mip| (resolution >> mip).max(1)).collect()
}

/// 环境面板显示的摘要
#[derive(Debug, Clone)]
pub struct EnvironmentSummary {
    pub source: EnvironmentSource,
    pub env_resolution: u32,
    pub env_mips: u32,
    pub irradiance_resolution: u32,
    pub irradiance_mips: u32,
    pub prefiltered_resolution: u32,
    pub prefiltered_mips: u32,
    pub brdf_lut_resolution: u32,
}

/// 预计算完成的全部 IBL 贴图
pub struct EnvironmentMaps {
    pub env_map: GpuCubemap,
    pub irradiance_map: GpuCubemap,
    pub prefiltered_map: GpuCubemap,
    brdf_lut: wgpu::Texture,
    brdf_lut_view: wgpu::TextureView,
    source: EnvironmentSource,
}

/// 立方体贴图的一组面绘制
struct FacePass<'a> {
    pipeline: &'a wgpu::RenderPipeline,
    per_draw: &'a wgpu::BindGroup,
    source: &'a wgpu::BindGroup,
    meshes: &'a MeshBuffers,
    cube: &'a StaticMesh,
}

impl FacePass<'_> {
    /// 把立方体网格画进 `target` 第 `mip` 级的六个面，`offsets[f]` 为第 f 面的常量偏移
    fn record(&self, encoder: &mut wgpu::CommandEncoder, target: &GpuCubemap, mip: u32, offsets: &[u64]) {
        let size = target.mip_size(mip) as f32;
        for (face, &offset) in offsets.iter().enumerate().take(6) {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Cube Face Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target.face_view(mip, face as u32),
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_viewport(0.0, 0.0, size, size, 0.0, 1.0);
            pass.set_pipeline(self.pipeline);
            pass.set_bind_group(0, self.per_draw, &[offset as u32]);
            pass.set_bind_group(1, self.source, &[]);
            self.meshes.bind(&mut pass);
            MeshBuffers::draw(&mut pass, self.cube);
        }
    }
}

impl EnvironmentMaps {
    /// 生成所有 IBL 贴图并等待 GPU 完成
    ///
    /// # 参数
    ///
    /// * `meshes` / `cube` - 静态网格缓冲及其中的立方体
    /// * `config` - 分辨率与 HDR 路径
    pub fn precompute(
        ctx: &mut GraphicsContext,
        pipelines: &Pipelines,
        mipmaps: &MipmapGenerator,
        meshes: &MeshBuffers,
        cube: &StaticMesh,
        config: &EnvironmentConfig,
    ) -> Result<Self> {
        let started = Instant::now();

        // 1. 源 HDR 贴图
        let (image, source) = hdr::load_or_procedural(Path::new(&config.hdr_path));
        ibl_info!(
            source = %source,
            width = image.width(),
            height = image.height(),
            "Loaded equirectangular environment"
        );
        let equirect = image.upload(&ctx.device, &ctx.queue);
        let equirect_view = equirect.create_view(&wgpu::TextureViewDescriptor::default());
        drop(image);

        // 2. 目标贴图
        let env_map = GpuCubemap::new(
            &ctx.device,
            "Environment Map",
            config.cube_resolution,
            mip_level_count(config.cube_resolution),
        );
        let irradiance_map = GpuCubemap::new(
            &ctx.device,
            "Irradiance Map",
            config.irradiance_resolution,
            mip_level_count(config.irradiance_resolution),
        );
        let prefiltered_map = GpuCubemap::new(
            &ctx.device,
            "Prefiltered Environment Map",
            config.prefiltered_resolution,
            config.prefiltered_mip_levels,
        );
        let (brdf_lut, brdf_lut_view) = create_brdf_lut(&ctx.device, config.brdf_lut_resolution);

        // 3. 每个面的常量
        let projection = cube_face_projection();
        let identity = Matrix4::identity();
        let face_constants =
            |face: usize| PerDrawConstants::new(&(projection * cube_face_view(face)), &identity);

        let mut face_offsets = Vec::with_capacity(6);
        for face in 0..6 {
            face_offsets.push(ctx.upload_heap_mut().push(&face_constants(face))?);
        }

        let prefilter_levels = prefiltered_map.mip_levels();
        let mut prefilter_offsets = Vec::with_capacity(prefilter_levels as usize * 6);
        for mip in 0..prefilter_levels {
            let roughness = prefilter_roughness(mip, prefilter_levels);
            for face in 0..6 {
                let constants = face_constants(face).with_roughness(roughness);
                prefilter_offsets.push(ctx.upload_heap_mut().push(&constants)?);
            }
        }

        // 4. 描述符
        let layouts = &pipelines.layouts;
        let sampler = &pipelines.linear_sampler;
        let per_draw = layouts.per_draw_bind_group(&ctx.device, ctx.upload_buffer());
        let per_draw = ctx.gpu_descriptor_heap_mut().allocate(per_draw)?;
        let equirect_table = layouts.source_bind_group(&ctx.device, false, &equirect_view, sampler);
        let equirect_table = ctx.gpu_descriptor_heap_mut().allocate(equirect_table)?;
        let env_table = layouts.source_bind_group(&ctx.device, true, env_map.cube_view(), sampler);
        let env_table = ctx.gpu_descriptor_heap_mut().allocate(env_table)?;

        let mut encoder = ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("IBL Precompute Encoder"),
        });

        // 5. 等距柱状 → 立方体
        {
            let heap = ctx.gpu_descriptor_heap();
            FacePass {
                pipeline: &pipelines[PipelineKind::EquirectangularToCube],
                per_draw: heap.get(per_draw)?,
                source: heap.get(equirect_table)?,
                meshes,
                cube,
            }
            .record(&mut encoder, &env_map, 0, &face_offsets);
        }
        let (device, cpu_heap) = ctx.device_and_cpu_heap();
        mipmaps.generate(device, &mut encoder, cpu_heap, env_map.texture())?;

        // 6. 辐照度卷积
        {
            let heap = ctx.gpu_descriptor_heap();
            FacePass {
                pipeline: &pipelines[PipelineKind::GenerateIrradianceMap],
                per_draw: heap.get(per_draw)?,
                source: heap.get(env_table)?,
                meshes,
                cube,
            }
            .record(&mut encoder, &irradiance_map, 0, &face_offsets);
        }
        let (device, cpu_heap) = ctx.device_and_cpu_heap();
        mipmaps.generate(device, &mut encoder, cpu_heap, irradiance_map.texture())?;

        // 7. 预过滤：每级 mip 一个粗糙度
        {
            let heap = ctx.gpu_descriptor_heap();
            let pass = FacePass {
                pipeline: &pipelines[PipelineKind::PrefilterEnvMap],
                per_draw: heap.get(per_draw)?,
                source: heap.get(env_table)?,
                meshes,
                cube,
            };
            for (mip, offsets) in prefilter_offsets.chunks_exact(6).enumerate() {
                pass.record(&mut encoder, &prefiltered_map, mip as u32, offsets);
            }
        }

        // 8. BRDF 积分查找表
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("BRDF Integration Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &brdf_lut_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&pipelines[PipelineKind::BrdfIntegration]);
            pass.draw(0..3, 0..1);
        }

        // 9. 提交并等待，临时资源随后释放
        ctx.submit(std::iter::once(encoder.finish()));
        ctx.wait_for_gpu();
        drop(equirect_view);
        drop(equirect);

        ibl_info!(
            env = config.cube_resolution,
            irradiance = config.irradiance_resolution,
            prefiltered = ?mip_chain(prefiltered_map.size(), prefilter_levels),
            "Environment maps precomputed in {:.2?}",
            started.elapsed()
        );

        Ok(Self {
            env_map,
            irradiance_map,
            prefiltered_map,
            brdf_lut,
            brdf_lut_view,
            source,
        })
    }

    pub fn brdf_lut_view(&self) -> &wgpu::TextureView {
        &self.brdf_lut_view
    }

    /// 预过滤贴图的最大 LOD（对应粗糙度 1）
    pub fn max_reflection_lod(&self) -> f32 {
        (self.prefiltered_map.mip_levels() - 1) as f32
    }

    pub fn summary(&self) -> EnvironmentSummary {
        EnvironmentSummary {
            source: self.source.clone(),
            env_resolution: self.env_map.size(),
            env_mips: self.env_map.mip_levels(),
            irradiance_resolution: self.irradiance_map.size(),
            irradiance_mips: self.irradiance_map.mip_levels(),
            prefiltered_resolution: self.prefiltered_map.size(),
            prefiltered_mips: self.prefiltered_map.mip_levels(),
            brdf_lut_resolution: self.brdf_lut.width(),
        }
    }
}

fn create_brdf_lut(device: &wgpu::Device, resolution: u32) -> (wgpu::Texture, wgpu::TextureView) {
    let resolution = resolution.max(1);
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("BRDF LUT"),
        size: wgpu::Extent3d {
            width: resolution,
            height: resolution,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: BRDF_LUT_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}
