//! GUI 状态管理
//!
//! GuiState 保存面板上可编辑的参数和只读的统计信息。
//! 渲染器每帧从这里读取参数，不直接依赖 egui。

use crate::core::Config;
use crate::core::SceneConfig;
use crate::gfx::HeapUsage;
use crate::ibl::EnvironmentSummary;

/// GUI 状态
pub struct GuiState {
    // 性能监控
    pub fps: f32,
    pub frame_time_ms: f32,
    pub heap_usage: HeapUsage,

    // 设备信息
    pub adapter_name: String,
    pub backend: String,
    pub msaa_samples: u32,

    // 相机
    pub camera_paused: bool,
    pub camera_speed: f32,
    pub camera_radius: f32,
    pub camera_height: f32,

    // 材质
    pub albedo: [f32; 3],
    pub ao: f32,

    // 光照
    pub light_intensity: f32,
    pub ibl_enabled: bool,
    pub env_intensity: f32,
    pub skybox_enabled: bool,

    /// 预计算完成后才有
    pub environment: Option<EnvironmentSummary>,
}

impl GuiState {
    /// 从配置和场景创建 GUI 状态
    pub fn new(config: &Config, scene: &SceneConfig) -> Self {
        Self {
            fps: 0.0,
            frame_time_ms: 0.0,
            heap_usage: HeapUsage::default(),

            adapter_name: String::new(),
            backend: config.graphics.backend.name().to_string(),
            msaa_samples: config.graphics.msaa_samples,

            camera_paused: false,
            camera_speed: scene.camera.orbit_speed,
            camera_radius: scene.camera.orbit_radius,
            camera_height: scene.camera.orbit_height,

            albedo: scene.grid.albedo,
            ao: scene.grid.ao,

            light_intensity: 1.0,
            ibl_enabled: true,
            env_intensity: scene.environment.intensity,
            skybox_enabled: true,

            environment: None,
        }
    }

    /// 更新性能统计
    pub fn update_performance(&mut self, fps: f32, frame_time_ms: f32) {
        self.fps = fps;
        self.frame_time_ms = frame_time_ms;
    }

    /// 着色器实际使用的环境光强度（关闭 IBL 时为 0）
    pub fn effective_env_intensity(&self) -> f32 {
        if self.ibl_enabled {
            self.env_intensity
        } else {
            0.0
        }
    }

    /// 天空盒亮度（关闭时为 0，天空画成黑色）
    pub fn skybox_intensity(&self) -> f32 {
        if self.skybox_enabled {
            self.env_intensity
        } else {
            0.0
        }
    }
}
