//! 核心功能模块
//!
//! 本模块提供了渲染器的基础功能：日志系统、配置管理、场景描述和错误处理。
//! 这些模块独立于具体的 GPU 资源，可以在不创建设备的情况下使用和测试。
//!
//! # 模块组织
//!
//! - `log`：日志系统，提供结构化的日志记录功能
//! - `config`：配置管理，支持从 config.toml 加载渲染器设置
//! - `scene`：场景描述，支持从 scene.toml 加载环境贴图、球体阵列、相机与光源
//! - `error`：错误处理，定义统一的错误类型

pub mod log;
pub mod config;
pub mod scene;
pub mod error;

// 重新导出常用类型，方便使用
pub use error::{Result, IblRenderError};
pub use config::Config;
pub use scene::SceneConfig;
