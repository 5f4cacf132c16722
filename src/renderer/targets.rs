//! 多重采样渲染目标
//!
//! 场景先渲染到 N 倍采样的颜色/深度目标，UI 通道结束时解析到交换链图像。
//! 采样数为 1 时场景直接渲染到交换链图像。

use tracing::debug;

use crate::gfx::DEPTH_FORMAT;

/// 场景渲染目标
pub struct RenderTargets {
    msaa_color: Option<wgpu::TextureView>,
    depth: wgpu::TextureView,
    format: wgpu::TextureFormat,
    sample_count: u32,
    size: (u32, u32),
}

/// 颜色附件：渲染视图和可选的解析目标
pub struct ColorAttachment<'a> {
    pub view: &'a wgpu::TextureView,
    pub resolve_target: Option<&'a wgpu::TextureView>,
}

/// 纹理尺寸至少为 1x1
pub fn target_extent(width: u32, height: u32) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: width.max(1),
        height: height.max(1),
        depth_or_array_layers: 1,
    }
}

impl RenderTargets {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        sample_count: u32,
    ) -> Self {
        let (msaa_color, depth) = Self::create_views(device, format, width, height, sample_count);
        Self {
            msaa_color,
            depth,
            format,
            sample_count,
            size: (width, height),
        }
    }

    fn create_views(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        sample_count: u32,
    ) -> (Option<wgpu::TextureView>, wgpu::TextureView) {
        let size = target_extent(width, height);

        let msaa_color = (sample_count > 1).then(|| {
            device
                .create_texture(&wgpu::TextureDescriptor {
                    label: Some("MSAA Color Target"),
                    size,
                    mip_level_count: 1,
                    sample_count,
                    dimension: wgpu::TextureDimension::D2,
                    format,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                    view_formats: &[],
                })
                .create_view(&wgpu::TextureViewDescriptor::default())
        });

        let depth = device
            .create_texture(&wgpu::TextureDescriptor {
                label: Some("Depth Target"),
                size,
                mip_level_count: 1,
                sample_count,
                dimension: wgpu::TextureDimension::D2,
                format: DEPTH_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            })
            .create_view(&wgpu::TextureViewDescriptor::default());

        (msaa_color, depth)
    }

    /// 窗口尺寸变化时重建
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if self.size == (width, height) {
            return;
        }
        debug!(width, height, samples = self.sample_count, "Recreating render targets");
        let (msaa_color, depth) = Self::create_views(device, self.format, width, height, self.sample_count);
        self.msaa_color = msaa_color;
        self.depth = depth;
        self.size = (width, height);
    }

    /// 场景通道的颜色附件（不解析）
    pub fn scene_color<'a>(&'a self, back_buffer: &'a wgpu::TextureView) -> ColorAttachment<'a> {
        ColorAttachment {
            view: self.msaa_color.as_ref().unwrap_or(back_buffer),
            resolve_target: None,
        }
    }

    /// 最后一个通道的颜色附件，多重采样时解析到交换链图像
    pub fn final_color<'a>(&'a self, back_buffer: &'a wgpu::TextureView) -> ColorAttachment<'a> {
        match &self.msaa_color {
            Some(view) => ColorAttachment {
                view,
                resolve_target: Some(back_buffer),
            },
            None => ColorAttachment {
                view: back_buffer,
                resolve_target: None,
            },
        }
    }

    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_extent_never_zero() {
        let extent = target_extent(0, 720);
        assert_eq!((extent.width, extent.height, extent.depth_or_array_layers), (1, 720, 1));
    }
}
