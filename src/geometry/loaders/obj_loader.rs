/// OBJ 文件加载器
///
/// 使用 tobj crate 加载 Wavefront OBJ 格式的网格。
/// 多个对象会合并为一个网格，缺失的法线从面重建。
/// OBJ 的正面三角形外法线为 `cross(e1, e2)`，加载时翻转绕序。
use super::MeshLoader;
use crate::core::error::{MeshLoadError, Result};
use crate::geometry::mesh::{flip_winding, reconstruct_normals, MeshData};
use crate::geometry::vertex::Vertex;
use std::path::Path;

/// OBJ 格式加载器
pub struct ObjLoader;

impl ObjLoader {
    fn load_options() -> tobj::LoadOptions {
        tobj::LoadOptions {
            triangulate: true,  // 自动三角化
            single_index: true, // 位置与法线共用索引
            ..Default::default()
        }
    }

    fn build(models: Vec<tobj::Model>, name: &str) -> Result<MeshData> {
        if models.is_empty() {
            return Err(MeshLoadError::ValidationError("OBJ 文件不包含任何模型".to_string()).into());
        }

        let mut mesh_data = MeshData::with_name(name);
        let mut has_normals = true;

        for model in &models {
            let mesh = &model.mesh;
            let positions = &mesh.positions;
            let normals = &mesh.normals;

            if positions.len() % 3 != 0 {
                return Err(MeshLoadError::ValidationError(format!(
                    "顶点位置数据不完整: {} 个浮点数",
                    positions.len()
                ))
                .into());
            }

            let vertex_start = mesh_data.vertices.len() as u32;
            let vertex_count = positions.len() / 3;
            has_normals &= normals.len() >= vertex_count * 3;

            for i in 0..vertex_count {
                let position = [positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2]];
                let normal = if normals.len() >= (i + 1) * 3 {
                    [normals[i * 3], normals[i * 3 + 1], normals[i * 3 + 2]]
                } else {
                    [0.0; 3]
                };
                mesh_data.vertices.push(Vertex::new(position, normal));
            }

            mesh_data
                .indices
                .extend(mesh.indices.iter().map(|&index| vertex_start + index));
        }

        mesh_data.validate().map_err(MeshLoadError::ValidationError)?;
        flip_winding(&mut mesh_data.indices);

        if !has_normals {
            tracing::info!("OBJ 文件缺少法线数据，正在重建...");
            reconstruct_normals(&mut mesh_data.vertices, &mesh_data.indices);
        }

        tracing::info!(
            "成功加载 OBJ 文件: {} 个顶点, {} 个三角形, {} 个对象",
            mesh_data.vertex_count(),
            mesh_data.triangle_count(),
            models.len()
        );

        Ok(mesh_data)
    }
}

impl MeshLoader for ObjLoader {
    fn load_from_file(path: &Path) -> Result<MeshData> {
        if !path.exists() {
            return Err(MeshLoadError::FileNotFound(path.to_path_buf()).into());
        }

        let (models, _materials) = tobj::load_obj(path, &Self::load_options())
            .map_err(|e| MeshLoadError::ExternalLibraryError(format!("tobj 解析失败: {}", e)))?;

        let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("Unnamed");
        Self::build(models, name)
    }

    fn load_from_memory(data: &[u8]) -> Result<MeshData> {
        let mut reader = std::io::BufReader::new(data);
        // 材质库被忽略
        let (models, _materials) = tobj::load_obj_buf(&mut reader, &Self::load_options(), |_| {
            Ok((Vec::new(), Default::default()))
        })
        .map_err(|e| MeshLoadError::ExternalLibraryError(format!("tobj 解析失败: {}", e)))?;

        Self::build(models, "Memory")
    }

    fn supported_extensions() -> &'static [&'static str] {
        &["obj"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = "o Triangle
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 3
";

    #[test]
    fn test_supported_extensions() {
        assert_eq!(ObjLoader::supported_extensions(), &["obj"]);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ObjLoader::load_from_file(Path::new("nonexistent.obj"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_memory_reconstructs_normals() {
        let mesh = ObjLoader::load_from_memory(TRIANGLE.as_bytes()).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.indices, vec![0, 2, 1]);
        for v in &mesh.vertices {
            assert!((v.normal[2] - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_load_quad_is_triangulated() {
        let quad = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
        let mesh = ObjLoader::load_from_memory(quad.as_bytes()).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
    }
}
