//! 配置管理模块
//!
//! 提供渲染器配置的加载、解析和管理功能。
//! 支持从 TOML 配置文件加载，也支持命令行参数覆盖。
//!
//! # 配置文件格式 (config.toml)
//!
//! ```toml
//! [window]
//! width = 1920
//! height = 1080
//! title = "ImageBasedPBR"
//! resizable = true
//!
//! [graphics]
//! backend = "auto"    # auto, dx12, vulkan, metal, gl
//! vsync = false
//! msaa_samples = 8
//!
//! [logging]
//! level = "info"      # trace, debug, info, warn, error
//! file_output = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::{ConfigError, Result};

/// 渲染器配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// 窗口配置
    #[serde(default)]
    pub window: WindowConfig,

    /// 图形配置
    #[serde(default)]
    pub graphics: GraphicsConfig,

    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 窗口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// 窗口宽度
    #[serde(default = "default_width")]
    pub width: u32,

    /// 窗口高度
    #[serde(default = "default_height")]
    pub height: u32,

    /// 窗口标题
    #[serde(default = "default_title")]
    pub title: String,

    /// 是否可调整大小
    #[serde(default = "default_resizable")]
    pub resizable: bool,
}

/// 图形配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphicsConfig {
    /// 图形后端选择
    #[serde(default = "default_backend")]
    pub backend: GraphicsBackend,

    /// 垂直同步
    #[serde(default = "default_vsync")]
    pub vsync: bool,

    /// 期望的 MSAA 采样数，设备不支持时向下回退
    #[serde(default = "default_msaa")]
    pub msaa_samples: u32,
}

/// 图形后端类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphicsBackend {
    /// 由 wgpu 按平台挑选（Windows 上为 DX12）
    Auto,
    /// DirectX 12 后端
    Dx12,
    /// Vulkan 后端
    Vulkan,
    /// Metal 后端
    Metal,
    /// OpenGL / GLES 后端
    Gl,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// 是否输出到文件
    #[serde(default = "default_file_output")]
    pub file_output: bool,

    /// 日志文件路径
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

// 默认值函数
fn default_width() -> u32 { 1920 }
fn default_height() -> u32 { 1080 }
fn default_title() -> String { "ImageBasedPBR".to_string() }
fn default_resizable() -> bool { true }
fn default_backend() -> GraphicsBackend { GraphicsBackend::Auto }
fn default_vsync() -> bool { false }
fn default_msaa() -> u32 { 8 }
fn default_log_level() -> LogLevel { LogLevel::Info }
fn default_file_output() -> bool { false }
fn default_log_file() -> String { "logs/ibl_render.log".to_string() }

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            title: default_title(),
            resizable: default_resizable(),
        }
    }
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            vsync: default_vsync(),
            msaa_samples: default_msaa(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_output: default_file_output(),
            log_file: default_log_file(),
        }
    }
}

impl Config {
    /// 从配置文件加载
    ///
    /// # 参数
    ///
    /// * `path` - 配置文件路径
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let contents = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path_str))?;

        Self::from_toml_str(&contents)
    }

    /// 从 TOML 字符串解析
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()).into())
    }

    /// 从配置文件加载，如果文件不存在或无法解析则使用默认配置
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::from_file(path).unwrap_or_default()
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, contents)?;
        Ok(())
    }

    /// 从命令行参数覆盖配置
    ///
    /// 支持的参数：
    /// - `--dx12` / `--vulkan` / `--metal` / `--gl`: 指定图形后端
    /// - `--width <value>` / `--height <value>`: 设置窗口尺寸
    /// - `--msaa <value>`: 设置 MSAA 采样数
    /// - `--vsync`: 开启垂直同步
    /// - `--save-config <path>`: 由调用方处理，这里忽略
    pub fn apply_args<I>(&mut self, args: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();

        for (flag, backend) in [
            ("--dx12", GraphicsBackend::Dx12),
            ("--vulkan", GraphicsBackend::Vulkan),
            ("--metal", GraphicsBackend::Metal),
            ("--gl", GraphicsBackend::Gl),
        ] {
            if args.iter().any(|a| a == flag) {
                self.graphics.backend = backend;
            }
        }

        if args.iter().any(|a| a == "--vsync") {
            self.graphics.vsync = true;
        }

        if let Some(width) = value_after(&args, "--width") {
            self.window.width = width;
        }
        if let Some(height) = value_after(&args, "--height") {
            self.window.height = height;
        }
        if let Some(samples) = value_after(&args, "--msaa") {
            self.graphics.msaa_samples = samples;
        }
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        // 验证窗口尺寸
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::InvalidValue {
                field: "window.width/height".to_string(),
                reason: "Window dimensions must be greater than 0".to_string(),
            }.into());
        }

        // 验证 MSAA 采样数
        if !matches!(self.graphics.msaa_samples, 1 | 2 | 4 | 8 | 16) {
            return Err(ConfigError::InvalidValue {
                field: "graphics.msaa_samples".to_string(),
                reason: "MSAA samples must be 1, 2, 4, 8, or 16".to_string(),
            }.into());
        }

        Ok(())
    }
}

fn value_after(args: &[String], flag: &str) -> Option<u32> {
    let idx = args.iter().position(|a| a == flag)?;
    args.get(idx + 1)?.parse().ok()
}

impl GraphicsBackend {
    /// 转换为 wgpu 的后端集合
    pub fn to_wgpu_backends(&self) -> wgpu::Backends {
        match self {
            GraphicsBackend::Auto => wgpu::Backends::PRIMARY,
            GraphicsBackend::Dx12 => wgpu::Backends::DX12,
            GraphicsBackend::Vulkan => wgpu::Backends::VULKAN,
            GraphicsBackend::Metal => wgpu::Backends::METAL,
            GraphicsBackend::Gl => wgpu::Backends::GL,
        }
    }

    /// 获取后端名称
    pub fn name(&self) -> &'static str {
        match self {
            GraphicsBackend::Auto => "Auto",
            GraphicsBackend::Dx12 => "DirectX 12",
            GraphicsBackend::Vulkan => "Vulkan",
            GraphicsBackend::Metal => "Metal",
            GraphicsBackend::Gl => "OpenGL",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.window.width, 1920);
        assert_eq!(config.window.height, 1080);
        assert_eq!(config.graphics.backend, GraphicsBackend::Auto);
        assert_eq!(config.graphics.msaa_samples, 8);
        assert!(!config.graphics.vsync);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.window.width = 0;
        assert!(config.validate().is_err());

        config.window.width = 800;
        config.graphics.msaa_samples = 3;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_args() {
        let mut config = Config::default();
        config.apply_args(["ibl_render", "--dx12", "--width", "1280", "--msaa", "4", "--vsync"]);

        assert_eq!(config.graphics.backend, GraphicsBackend::Dx12);
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.window.height, 1080);
        assert_eq!(config.graphics.msaa_samples, 4);
        assert!(config.graphics.vsync);
    }

    #[test]
    fn test_apply_args_ignores_bad_values() {
        let mut config = Config::default();
        config.apply_args(["ibl_render", "--height", "tall", "--width"]);
        assert_eq!(config.window.width, 1920);
        assert_eq!(config.window.height, 1080);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = Config::from_toml_str("[graphics]\nbackend = \"vulkan\"\n").unwrap();
        assert_eq!(config.graphics.backend, GraphicsBackend::Vulkan);
        assert_eq!(config.graphics.msaa_samples, 8);
        assert_eq!(config.window.title, "ImageBasedPBR");
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(Config::from_toml_str("[graphics\nbackend = 1").is_err());
    }

    #[test]
    fn test_backend_mapping() {
        assert_eq!(GraphicsBackend::Dx12.to_wgpu_backends(), wgpu::Backends::DX12);
        assert_eq!(GraphicsBackend::Auto.to_wgpu_backends(), wgpu::Backends::PRIMARY);
    }
}
