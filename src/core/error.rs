//! 错误处理模块
//!
//! 定义了渲染器中使用的统一错误类型，手动实现 `Display` / `Error` / `From`。
//!
//! # 设计原则
//!
//! - 为每种错误类型提供清晰的上下文信息
//! - 支持错误链（error source）
//! - 易于模式匹配和错误处理

use std::fmt;
use std::path::PathBuf;

/// 渲染器统一的 Result 类型
pub type Result<T> = std::result::Result<T, IblRenderError>;

/// 渲染器的错误类型
#[derive(Debug)]
pub enum IblRenderError {
    /// 配置错误
    Config(ConfigError),

    /// 图形 API 错误
    Graphics(GraphicsError),

    /// 网格加载错误
    MeshLoading(MeshLoadError),

    /// 纹理加载错误
    Texture(TextureLoadError),

    /// IO 错误
    Io(std::io::Error),

    /// 初始化错误
    Initialization(String),

    /// 运行时错误
    Runtime(String),
}

/// 配置相关的错误
#[derive(Debug)]
pub enum ConfigError {
    /// 配置文件未找到
    FileNotFound(String),

    /// 配置文件解析失败
    ParseError(String),

    /// 配置值无效
    InvalidValue { field: String, reason: String },
}

/// 图形 API 相关的错误
#[derive(Debug)]
pub enum GraphicsError {
    /// 设备创建失败
    DeviceCreation(String),

    /// 交换链错误
    SwapchainError(String),

    /// 资源创建失败
    ResourceCreation(String),

    /// 线性分配的堆已满（上传堆 / 描述符堆）
    HeapExhausted {
        heap: &'static str,
        requested: u64,
        available: u64,
    },

    /// 描述符句柄已失效（所在堆已被重置或回滚）
    StaleDescriptor { heap: &'static str, index: u32 },

    /// 纹理不满足操作要求
    InvalidTexture(String),
}

/// 网格加载相关的错误
#[derive(Debug)]
pub enum MeshLoadError {
    /// 文件不存在
    FileNotFound(PathBuf),

    /// 不支持的文件格式
    UnsupportedFormat(String),

    /// 解析失败（行号从 1 开始）
    ParseError { line: usize, reason: String },

    /// 数据验证失败
    ValidationError(String),

    /// 外部库错误
    ExternalLibraryError(String),
}

/// 纹理加载相关的错误
#[derive(Debug)]
pub enum TextureLoadError {
    /// 文件不存在
    FileNotFound(PathBuf),

    /// 解码失败
    DecodeError(String),

    /// 尺寸无效
    InvalidDimensions { width: u32, height: u32 },
}

impl fmt::Display for IblRenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IblRenderError::Config(e) => write!(f, "Configuration error: {}", e),
            IblRenderError::Graphics(e) => write!(f, "Graphics error: {}", e),
            IblRenderError::MeshLoading(e) => write!(f, "Mesh loading error: {}", e),
            IblRenderError::Texture(e) => write!(f, "Texture loading error: {}", e),
            IblRenderError::Io(e) => write!(f, "IO error: {}", e),
            IblRenderError::Initialization(msg) => write!(f, "Initialization error: {}", msg),
            IblRenderError::Runtime(msg) => write!(f, "Runtime error: {}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {}", path),
            ConfigError::ParseError(msg) => write!(f, "Failed to parse config: {}", msg),
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphicsError::DeviceCreation(msg) => write!(f, "Device creation failed: {}", msg),
            GraphicsError::SwapchainError(msg) => write!(f, "Swapchain error: {}", msg),
            GraphicsError::ResourceCreation(msg) => write!(f, "Resource creation failed: {}", msg),
            GraphicsError::HeapExhausted { heap, requested, available } => write!(
                f,
                "{} exhausted: requested {}, only {} available",
                heap, requested, available
            ),
            GraphicsError::StaleDescriptor { heap, index } => {
                write!(f, "Stale descriptor {} in {}", index, heap)
            }
            GraphicsError::InvalidTexture(msg) => write!(f, "Invalid texture: {}", msg),
        }
    }
}

impl fmt::Display for MeshLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeshLoadError::FileNotFound(path) => write!(f, "Mesh file not found: {}", path.display()),
            MeshLoadError::UnsupportedFormat(msg) => write!(f, "Unsupported mesh format: {}", msg),
            MeshLoadError::ParseError { line, reason } => {
                write!(f, "Failed to parse mesh at line {}: {}", line, reason)
            }
            MeshLoadError::ValidationError(msg) => write!(f, "Mesh validation failed: {}", msg),
            MeshLoadError::ExternalLibraryError(msg) => write!(f, "External library error: {}", msg),
        }
    }
}

impl fmt::Display for TextureLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureLoadError::FileNotFound(path) => {
                write!(f, "Texture file not found: {}", path.display())
            }
            TextureLoadError::DecodeError(msg) => write!(f, "Failed to decode texture: {}", msg),
            TextureLoadError::InvalidDimensions { width, height } => {
                write!(f, "Invalid texture dimensions: {}x{}", width, height)
            }
        }
    }
}

impl std::error::Error for IblRenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IblRenderError::Io(e) => Some(e),
            IblRenderError::Config(e) => Some(e),
            IblRenderError::Graphics(e) => Some(e),
            IblRenderError::MeshLoading(e) => Some(e),
            IblRenderError::Texture(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for ConfigError {}
impl std::error::Error for GraphicsError {}
impl std::error::Error for MeshLoadError {}
impl std::error::Error for TextureLoadError {}

// 实现 From trait 以便于错误转换
impl From<std::io::Error> for IblRenderError {
    fn from(err: std::io::Error) -> Self {
        IblRenderError::Io(err)
    }
}

impl From<ConfigError> for IblRenderError {
    fn from(err: ConfigError) -> Self {
        IblRenderError::Config(err)
    }
}

impl From<GraphicsError> for IblRenderError {
    fn from(err: GraphicsError) -> Self {
        IblRenderError::Graphics(err)
    }
}

impl From<MeshLoadError> for IblRenderError {
    fn from(err: MeshLoadError) -> Self {
        IblRenderError::MeshLoading(err)
    }
}

impl From<TextureLoadError> for IblRenderError {
    fn from(err: TextureLoadError) -> Self {
        IblRenderError::Texture(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heap_exhausted_message() {
        let err: IblRenderError = GraphicsError::HeapExhausted {
            heap: "GPU upload heap",
            requested: 512,
            available: 256,
        }
        .into();

        let msg = err.to_string();
        assert!(msg.contains("GPU upload heap"));
        assert!(msg.contains("512"));
        assert!(msg.contains("256"));
    }

    #[test]
    fn test_error_source_chain() {
        use std::error::Error;

        let err: IblRenderError = MeshLoadError::ParseError {
            line: 3,
            reason: "expected 3 indices".to_string(),
        }
        .into();

        assert!(err.source().is_some());
        assert!(err.to_string().contains("line 3"));
    }
}
