/// 网格加载器模块
///
/// 提供统一的网格加载接口和各种格式的具体实现。
///
/// # 支持的格式
///
/// - **PLY**: ASCII PLY 格式（场景默认使用的立方体与球体）
/// - **OBJ**: Wavefront OBJ 格式（使用 tobj crate）
///
/// # 使用示例
///
/// ```rust,no_run
/// use ibl_render::geometry::loaders::{MeshLoader, PlyLoader};
/// use std::path::Path;
///
/// let mesh = PlyLoader::load_from_file(Path::new("assets/meshes/sphere.ply"))?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
use crate::core::error::{MeshLoadError, Result};
use crate::geometry::mesh::MeshData;
use std::path::Path;

pub mod obj_loader;
pub mod ply_loader;

pub use obj_loader::ObjLoader;
pub use ply_loader::PlyLoader;

/// 网格加载器 trait
///
/// 加载器无状态，只产生 CPU 侧的 `MeshData`，不涉及 GPU 资源。
pub trait MeshLoader {
    /// 从文件路径加载网格
    ///
    /// # 错误
    ///
    /// - 文件不存在或无法读取
    /// - 文件格式错误或损坏
    /// - 数据验证失败
    fn load_from_file(path: &Path) -> Result<MeshData>;

    /// 从内存数据加载网格
    fn load_from_memory(data: &[u8]) -> Result<MeshData>;

    /// 支持的扩展名（小写，不含点号）
    fn supported_extensions() -> &'static [&'static str];
}

/// 根据文件扩展名选择合适的加载器
pub fn load_mesh(path: &Path) -> Result<MeshData> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .ok_or_else(|| MeshLoadError::UnsupportedFormat("无法确定文件扩展名".to_string()))?;

    match extension.as_str() {
        e if PlyLoader::supported_extensions().contains(&e) => PlyLoader::load_from_file(path),
        e if ObjLoader::supported_extensions().contains(&e) => ObjLoader::load_from_file(path),
        _ => Err(MeshLoadError::UnsupportedFormat(format!("不支持的文件格式: .{}", extension)).into()),
    }
}
