//! GPU 立方体贴图

use crate::math::mip_level_count;
use crate::renderer::pipelines::HDR_FORMAT;

/// 带 mip 链的 Rgba16Float 立方体贴图
///
/// 除了采样用的立方体视图外，还为每个 (mip, face) 预先创建了 2D 渲染目标视图。
pub struct GpuCubemap {
    texture: wgpu::Texture,
    cube_view: wgpu::TextureView,
    face_views: Vec<wgpu::TextureView>,
    size: u32,
    mip_levels: u32,
}

impl GpuCubemap {
    pub fn new(device: &wgpu::Device, label: &str, size: u32, mip_levels: u32) -> Self {
        let size = size.max(1);
        let mip_levels = mip_levels.clamp(1, mip_level_count(size));

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 6,
            },
            mip_level_count: mip_levels,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: HDR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let cube_view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });

        let face_views = (0..mip_levels)
            .flat_map(|mip| (0..6).map(move |face| (mip, face)))
            .map(|(mip, face)| {
                texture.create_view(&wgpu::TextureViewDescriptor {
                    label: Some("Cube Face View"),
                    dimension: Some(wgpu::TextureViewDimension::D2),
                    base_mip_level: mip,
                    mip_level_count: Some(1),
                    base_array_layer: face,
                    array_layer_count: Some(1),
                    ..Default::default()
                })
            })
            .collect();

        Self {
            texture,
            cube_view,
            face_views,
            size,
            mip_levels,
        }
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn cube_view(&self) -> &wgpu::TextureView {
        &self.cube_view
    }

    /// 第 `mip` 级第 `face` 面的渲染目标视图
    pub fn face_view(&self, mip: u32, face: u32) -> &wgpu::TextureView {
        &self.face_views[(mip * 6 + face) as usize]
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn mip_levels(&self) -> u32 {
        self.mip_levels
    }

    /// 第 `mip` 级的边长
    pub fn mip_size(&self, mip: u32) -> u32 {
        (self.size >> mip).max(1)
    }
}
