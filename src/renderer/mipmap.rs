//! mip 链生成
//!
//! 对每个数组层，用全屏三角形把 mip-1 线性降采样到 mip。
//! 临时绑定组放在 CPU 描述符堆中，录制完成后回滚。

use std::collections::HashMap;

use tracing::debug;

use crate::core::error::{GraphicsError, Result};
use crate::gfx::context::BindGroupHeap;
use crate::renderer::shaders;

/// 检查纹理是否可以生成 mip 链
///
/// 要求正方形、边长为 2 的幂且至少有 2 级 mip。
pub fn validate_mip_source(width: u32, height: u32, mip_level_count: u32) -> Result<()> {
    if width != height {
        return Err(GraphicsError::InvalidTexture(format!(
            "mip generation requires a square texture, got {}x{}",
            width, height
        ))
        .into());
    }
    if !width.is_power_of_two() {
        return Err(GraphicsError::InvalidTexture(format!(
            "mip generation requires a power-of-two size, got {}",
            width
        ))
        .into());
    }
    if mip_level_count <= 1 {
        return Err(GraphicsError::InvalidTexture(
            "mip generation requires more than one mip level".to_string(),
        )
        .into());
    }
    Ok(())
}

/// mip 生成器，每种格式一条管线
pub struct MipmapGenerator {
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    pipelines: HashMap<wgpu::TextureFormat, wgpu::RenderPipeline>,
}

impl MipmapGenerator {
    pub fn new(device: &wgpu::Device, formats: &[wgpu::TextureFormat]) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Mipmap Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Mipmap Sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let module = shaders::create_module(device, "Mipmap", shaders::MIPMAP);
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mipmap Pipeline Layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipelines = formats
            .iter()
            .map(|&format| {
                let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some("Mipmap Pipeline"),
                    layout: Some(&pipeline_layout),
                    vertex: wgpu::VertexState {
                        module: &module,
                        entry_point: "vs_main",
                        buffers: &[],
                    },
                    fragment: Some(wgpu::FragmentState {
                        module: &module,
                        entry_point: "fs_main",
                        targets: &[Some(format.into())],
                    }),
                    primitive: wgpu::PrimitiveState::default(),
                    depth_stencil: None,
                    multisample: wgpu::MultisampleState::default(),
                    multiview: None,
                });
                (format, pipeline)
            })
            .collect();

        Self {
            layout,
            sampler,
            pipelines,
        }
    }

    /// 录制整条 mip 链的生成命令
    pub fn generate(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        heap: &mut BindGroupHeap,
        texture: &wgpu::Texture,
    ) -> Result<()> {
        validate_mip_source(texture.width(), texture.height(), texture.mip_level_count())?;

        let pipeline = self.pipelines.get(&texture.format()).ok_or_else(|| {
            GraphicsError::InvalidTexture(format!("no mipmap pipeline for {:?}", texture.format()))
        })?;

        let layers = texture.depth_or_array_layers();
        let mips = texture.mip_level_count();
        debug!(layers, mips, size = texture.width(), "Generating mip chain");

        let state = heap.state();
        let result = (|| -> Result<()> {
            for layer in 0..layers {
                for mip in 1..mips {
                    let view = |level: u32| {
                        texture.create_view(&wgpu::TextureViewDescriptor {
                            label: Some("Mip View"),
                            dimension: Some(wgpu::TextureViewDimension::D2),
                            base_mip_level: level,
                            mip_level_count: Some(1),
                            base_array_layer: layer,
                            array_layer_count: Some(1),
                            ..Default::default()
                        })
                    };
                    let source = view(mip - 1);
                    let target = view(mip);

                    let handle = heap.allocate(device.create_bind_group(&wgpu::BindGroupDescriptor {
                        label: Some("Mipmap Bind Group"),
                        layout: &self.layout,
                        entries: &[
                            wgpu::BindGroupEntry {
                                binding: 0,
                                resource: wgpu::BindingResource::TextureView(&source),
                            },
                            wgpu::BindGroupEntry {
                                binding: 1,
                                resource: wgpu::BindingResource::Sampler(&self.sampler),
                            },
                        ],
                    }))?;
                    let bind_group = heap.get(handle)?;

                    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("Mipmap Pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view: &target,
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
                    pass.set_pipeline(pipeline);
                    pass.set_bind_group(0, bind_group, &[]);
                    pass.draw(0..3, 0..1);
                }
            }
            Ok(())
        })();

        heap.restore(state);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_mip_source() {
        assert!(validate_mip_source(512, 512, 10).is_ok());
        assert!(validate_mip_source(64, 64, 2).is_ok());
    }

    #[test]
    fn test_rejects_non_square() {
        assert!(validate_mip_source(512, 256, 9).is_err());
    }

    #[test]
    fn test_rejects_non_power_of_two() {
        assert!(validate_mip_source(300, 300, 4).is_err());
    }

    #[test]
    fn test_rejects_single_mip() {
        assert!(validate_mip_source(256, 256, 1).is_err());
    }
}
