//! wgpu 图形上下文
//!
//! 负责设备初始化和帧节奏：
//! - 创建 wgpu 实例、窗口表面、适配器、逻辑设备和命令队列
//! - 配置交换链并确定 MSAA 采样数
//! - 持有每帧的上传堆和着色器可见描述符堆，以及一个持久的 CPU 描述符堆
//! - 呈现后按需等待 GPU，保证 CPU 最多领先一帧

use std::collections::VecDeque;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use tracing::{debug, info, warn};
use winit::window::Window;

use crate::core::error::{GraphicsError, Result};
use crate::core::Config;
use crate::gfx::descriptor::{DescriptorHeap, DescriptorHeapStats, DESCRIPTOR_HEAP_CAPACITY};
use crate::gfx::frame::{next_frame_index, FrameSync, FRAMES_IN_FLIGHT};
use crate::gfx::upload::{GpuUploadHeap, UploadHeap, UPLOAD_HEAP_CAPACITY};

/// 深度缓冲格式
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// 绑定组描述符堆
pub type BindGroupHeap = DescriptorHeap<wgpu::BindGroup>;

/// 堆使用情况，供性能面板显示
#[derive(Debug, Clone, Copy, Default)]
pub struct HeapUsage {
    pub upload_used: u64,
    pub upload_capacity: u64,
    pub gpu_descriptors: DescriptorHeapStats,
    pub cpu_descriptors: DescriptorHeapStats,
}

/// 图形上下文
pub struct GraphicsContext {
    /// wgpu 实例（入口点）
    pub instance: wgpu::Instance,
    /// 窗口表面
    pub surface: wgpu::Surface<'static>,
    /// 图形适配器（GPU）
    pub adapter: wgpu::Adapter,
    /// 逻辑设备
    pub device: wgpu::Device,
    /// 命令队列
    pub queue: wgpu::Queue,
    /// 表面配置
    pub surface_config: wgpu::SurfaceConfiguration,

    window: Arc<Window>,
    msaa_samples: u32,

    /// 当前帧槽位（0 或 1）
    frame_index: usize,
    frame_sync: FrameSync,
    /// 已呈现但尚未确认完成的帧：(fence 值, 该帧最后一次提交)
    pending: VecDeque<(u64, wgpu::SubmissionIndex)>,
    last_submission: Option<wgpu::SubmissionIndex>,

    upload_heaps: [GpuUploadHeap; FRAMES_IN_FLIGHT],
    gpu_descriptor_heaps: [BindGroupHeap; FRAMES_IN_FLIGHT],
    cpu_descriptor_heap: BindGroupHeap,
}

impl GraphicsContext {
    /// 创建图形上下文
    ///
    /// # 参数
    ///
    /// * `window` - 已创建的窗口
    /// * `config` - 引擎配置（后端、垂直同步、MSAA）
    pub fn new(window: Arc<Window>, config: &Config) -> Result<Self> {
        info!("Initializing graphics context");

        // 1. 创建 wgpu 实例
        let backends = config.graphics.backend.to_wgpu_backends();
        debug!("Creating wgpu instance for {:?}", backends);
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends,
            dx12_shader_compiler: Default::default(),
            flags: wgpu::InstanceFlags::from_build_config(),
            gles_minor_version: wgpu::Gles3MinorVersion::Automatic,
        });

        // 2. 创建表面
        debug!("Creating surface");
        let surface = instance
            .create_surface(Arc::clone(&window))
            .map_err(|e| GraphicsError::DeviceCreation(format!("Failed to create surface: {}", e)))?;

        // 3. 请求适配器（选择 GPU）
        debug!("Requesting adapter");
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| GraphicsError::DeviceCreation("Failed to find suitable adapter".to_string()))?;

        let adapter_info = adapter.get_info();
        info!(
            "Selected adapter: {} ({:?}, {:?})",
            adapter_info.name, adapter_info.backend, adapter_info.device_type
        );

        // 4. 请求设备和队列
        // 8x MSAA 需要适配器相关的格式特性
        let required_features =
            adapter.features() & wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES;
        debug!("Requesting device and queue with {:?}", required_features);
        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Main Device"),
                required_features,
                required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
            },
            None,
        ))
        .map_err(|e| GraphicsError::DeviceCreation(format!("Failed to create device: {}", e)))?;

        device.on_uncaptured_error(Box::new(|error| {
            tracing::error!("wgpu error: {}", error);
        }));

        // 5. 配置表面
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = choose_surface_format(&surface_caps.formats).ok_or_else(|| {
            GraphicsError::SwapchainError("Surface reports no supported formats".to_string())
        })?;
        if surface_format.is_srgb() {
            warn!("No linear 8-bit surface format available, output will be gamma corrected twice");
        }
        debug!("Surface format: {:?}", surface_format);

        let present_mode = if config.graphics.vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        };

        let size = window.inner_size();
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: FRAMES_IN_FLIGHT as u32,
        };
        surface.configure(&device, &surface_config);

        // 6. 确定 MSAA 采样数
        let msaa_samples = {
            let adapter_specific = device
                .features()
                .contains(wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES);
            let supports = |count: u32| {
                [surface_format, DEPTH_FORMAT].iter().all(|&format| {
                    if adapter_specific {
                        adapter
                            .get_texture_format_features(format)
                            .flags
                            .sample_count_supported(count)
                    } else {
                        // WebGPU 保证可渲染格式支持 1 和 4
                        matches!(count, 1 | 4)
                    }
                })
            };
            pick_sample_count(config.graphics.msaa_samples, supports)
        };
        if msaa_samples != config.graphics.msaa_samples {
            warn!(
                requested = config.graphics.msaa_samples,
                selected = msaa_samples,
                "Requested MSAA sample count is not supported"
            );
        }

        // 7. 创建每帧资源
        let upload_heaps = [
            GpuUploadHeap::new(&device, "Upload Heap 0", UPLOAD_HEAP_CAPACITY),
            GpuUploadHeap::new(&device, "Upload Heap 1", UPLOAD_HEAP_CAPACITY),
        ];
        let gpu_descriptor_heaps = [
            DescriptorHeap::new("GPU Descriptor Heap 0", DESCRIPTOR_HEAP_CAPACITY),
            DescriptorHeap::new("GPU Descriptor Heap 1", DESCRIPTOR_HEAP_CAPACITY),
        ];
        let cpu_descriptor_heap = DescriptorHeap::new("CPU Descriptor Heap", DESCRIPTOR_HEAP_CAPACITY);

        info!(
            width = surface_config.width,
            height = surface_config.height,
            msaa = msaa_samples,
            "Graphics context initialized successfully"
        );

        Ok(Self {
            instance,
            surface,
            adapter,
            device,
            queue,
            surface_config,
            window,
            msaa_samples,
            frame_index: 0,
            frame_sync: FrameSync::new(),
            pending: VecDeque::new(),
            last_submission: None,
            upload_heaps,
            gpu_descriptor_heaps,
            cpu_descriptor_heap,
        })
    }

    /// 获取窗口引用
    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn window_arc(&self) -> Arc<Window> {
        Arc::clone(&self.window)
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_config.format
    }

    pub fn msaa_samples(&self) -> u32 {
        self.msaa_samples
    }

    pub fn size(&self) -> (u32, u32) {
        (self.surface_config.width, self.surface_config.height)
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.surface_config.width as f32 / self.surface_config.height.max(1) as f32
    }

    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    /// 已呈现的帧数
    pub fn frame_count(&self) -> u64 {
        self.frame_sync.frame_count()
    }

    /// 重新配置表面（用于窗口调整），返回尺寸是否有效
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&self.device, &self.surface_config);
        debug!(width, height, "Surface reconfigured");
        true
    }

    /// 获取下一个交换链图像
    ///
    /// 表面丢失或过期时重新配置并返回 `None`，调用方跳过这一帧。
    pub fn acquire(&mut self) -> Result<Option<wgpu::SurfaceTexture>> {
        match self.surface.get_current_texture() {
            Ok(frame) => Ok(Some(frame)),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                debug!("Surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.surface_config);
                Ok(None)
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("Timed out acquiring swapchain image");
                Ok(None)
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                Err(GraphicsError::SwapchainError("Out of memory acquiring swapchain image".to_string()).into())
            }
        }
    }

    /// 当前帧的上传堆
    pub fn upload_heap_mut(&mut self) -> &mut UploadHeap {
        self.upload_heaps[self.frame_index].heap_mut()
    }

    /// 当前帧上传堆对应的 GPU 缓冲
    pub fn upload_buffer(&self) -> &wgpu::Buffer {
        self.upload_heaps[self.frame_index].buffer()
    }

    /// 当前帧的着色器可见描述符堆
    pub fn gpu_descriptor_heap(&self) -> &BindGroupHeap {
        &self.gpu_descriptor_heaps[self.frame_index]
    }

    pub fn gpu_descriptor_heap_mut(&mut self) -> &mut BindGroupHeap {
        &mut self.gpu_descriptor_heaps[self.frame_index]
    }

    /// 持久的 CPU 描述符堆
    pub fn cpu_descriptor_heap(&self) -> &BindGroupHeap {
        &self.cpu_descriptor_heap
    }

    pub fn cpu_descriptor_heap_mut(&mut self) -> &mut BindGroupHeap {
        &mut self.cpu_descriptor_heap
    }

    /// 同时借出设备和 CPU 描述符堆（mipmap 生成需要两者）
    pub fn device_and_cpu_heap(&mut self) -> (&wgpu::Device, &mut BindGroupHeap) {
        (&self.device, &mut self.cpu_descriptor_heap)
    }

    pub fn heap_usage(&self) -> HeapUsage {
        let upload = self.upload_heaps[self.frame_index].heap();
        HeapUsage {
            upload_used: upload.used(),
            upload_capacity: upload.capacity(),
            gpu_descriptors: self.gpu_descriptor_heap().stats(),
            cpu_descriptors: self.cpu_descriptor_heap.stats(),
        }
    }

    /// 写入当前帧的上传堆并提交命令
    pub fn submit<I>(&mut self, command_buffers: I)
    where
        I: IntoIterator<Item = wgpu::CommandBuffer>,
    {
        self.upload_heaps[self.frame_index].flush(&self.queue);
        self.last_submission = Some(self.queue.submit(command_buffers));
    }

    /// 呈现并推进到下一帧
    pub fn present_frame(&mut self, frame: wgpu::SurfaceTexture) {
        // 1. 呈现
        frame.present();

        // 2. signal：GPU 执行完到目前为止提交的工作后更新完成值
        let fence = self.frame_sync.signal();
        let completed = self.frame_sync.completion_handle();
        self.queue.on_submitted_work_done(move || {
            completed.fetch_max(fence, Ordering::AcqRel);
        });
        if let Some(index) = self.last_submission.take() {
            self.pending.push_back((fence, index));
        }
        self.device.poll(wgpu::Maintain::Poll);

        // 3. 两帧在飞时等待较旧的一帧
        if self.frame_sync.must_wait() {
            let target = self.frame_sync.wait_target();
            self.wait_for_fence(target);
        }

        // 4. 切换帧槽位，它上一次的使用者就是刚等待完成的那一帧
        self.frame_index = next_frame_index(self.frame_index);

        // 5. 该槽位的 GPU 工作已完成，可以复用
        self.reset_frame_heaps();
    }

    /// 阻塞直到所有已提交的工作完成
    pub fn wait_for_gpu(&mut self) {
        self.device.poll(wgpu::Maintain::Wait);

        let frame_count = self.frame_sync.frame_count();
        self.frame_sync.mark_completed(frame_count);
        self.pending.clear();
        self.last_submission = None;

        self.reset_frame_heaps();
    }

    /// 阻塞直到 `fence` 对应的帧完成
    fn wait_for_fence(&mut self, fence: u64) {
        let mut target = None;
        while let Some((value, _)) = self.pending.front() {
            if *value > fence {
                break;
            }
            target = self.pending.pop_front().map(|(_, index)| index);
        }

        match target {
            Some(index) => {
                self.device.poll(wgpu::Maintain::WaitForSubmissionIndex(index));
            }
            // 该帧没有提交任何命令
            None => {
                self.device.poll(wgpu::Maintain::Poll);
            }
        }
        self.frame_sync.mark_completed(fence);
    }

    fn reset_frame_heaps(&mut self) {
        self.upload_heaps[self.frame_index].reset();
        self.gpu_descriptor_heaps[self.frame_index].reset();
    }
}

/// 选择交换链格式
///
/// 着色器自己做 gamma 校正，因此优先 8 位线性格式。
pub fn choose_surface_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    formats
        .iter()
        .copied()
        .find(|f| matches!(f, wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Bgra8Unorm))
        .or_else(|| formats.iter().copied().find(|f| !f.is_srgb()))
        .or_else(|| formats.first().copied())
}

/// 在支持的采样数中选择不超过 `requested` 的最大值
pub fn pick_sample_count(requested: u32, supports: impl Fn(u32) -> bool) -> u32 {
    [16, 8, 4, 2]
        .into_iter()
        .filter(|&count| count <= requested)
        .find(|&count| supports(count))
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::TextureFormat;

    #[test]
    fn test_prefers_linear_surface_format() {
        let formats = [TextureFormat::Bgra8UnormSrgb, TextureFormat::Bgra8Unorm];
        assert_eq!(choose_surface_format(&formats), Some(TextureFormat::Bgra8Unorm));
    }

    #[test]
    fn test_surface_format_fallbacks() {
        let formats = [TextureFormat::Bgra8UnormSrgb, TextureFormat::Rgb10a2Unorm];
        assert_eq!(choose_surface_format(&formats), Some(TextureFormat::Rgb10a2Unorm));

        let formats = [TextureFormat::Rgba8UnormSrgb];
        assert_eq!(choose_surface_format(&formats), Some(TextureFormat::Rgba8UnormSrgb));

        assert_eq!(choose_surface_format(&[]), None);
    }

    #[test]
    fn test_pick_sample_count() {
        assert_eq!(pick_sample_count(8, |_| true), 8);
        assert_eq!(pick_sample_count(8, |c| c <= 4), 4);
        assert_eq!(pick_sample_count(8, |c| c == 1 || c == 4), 4);
        assert_eq!(pick_sample_count(1, |_| true), 1);
        assert_eq!(pick_sample_count(6, |_| true), 4);
        assert_eq!(pick_sample_count(16, |_| false), 1);
    }
}
