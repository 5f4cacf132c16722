/// 几何体加载和处理模块
///
/// # 模块结构
///
/// - `vertex`: 顶点数据结构定义
/// - `mesh`: 网格数据、绘制范围与合并缓冲
/// - `primitives`: 程序化立方体与球体
/// - `loaders`: PLY / OBJ 加载器
///
/// ```text
/// 文件 (PLY/OBJ)  或  primitives
///     ↓
/// MeshData (CPU侧数据)
///     ↓
/// MeshBatch (合并顶点/索引)
///     ↓
/// Renderer (上传到GPU)
/// ```

pub mod loaders;
pub mod mesh;
pub mod primitives;
pub mod vertex;

pub use loaders::{load_mesh, MeshLoader, ObjLoader, PlyLoader};
pub use mesh::{MeshBatch, MeshData, StaticMesh};
pub use vertex::Vertex;

use crate::core::error::{IblRenderError, MeshLoadError, Result};
use std::path::Path;

/// 加载网格文件，文件不存在时使用程序化网格代替
pub fn load_mesh_or_else(path: &Path, fallback: impl FnOnce() -> MeshData) -> Result<MeshData> {
    match load_mesh(path) {
        Ok(mesh) => Ok(mesh),
        Err(IblRenderError::MeshLoading(MeshLoadError::FileNotFound(missing))) => {
            tracing::warn!(path = %missing.display(), "Mesh file not found, using procedural mesh");
            Ok(fallback())
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_falls_back() {
        let mesh = load_mesh_or_else(Path::new("missing/cube.ply"), primitives::cube).unwrap();
        assert_eq!(mesh.name.as_deref(), Some("Cube"));
    }

    #[test]
    fn test_unsupported_format_is_not_masked() {
        assert!(load_mesh_or_else(Path::new("missing/cube.fbx"), primitives::cube).is_err());
    }

    #[test]
    fn test_bundled_cube_matches_procedural() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/meshes/cube.ply");
        let loaded = load_mesh(&path).unwrap();
        let generated = primitives::cube();

        assert_eq!(loaded.indices, generated.indices);
        for (a, b) in loaded.vertices.iter().zip(&generated.vertices) {
            assert_eq!(a.position, b.position);
            assert_eq!(a.normal, b.normal);
        }
    }
}
