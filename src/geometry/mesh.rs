/// 网格数据结构模块
///
/// - `MeshData`：CPU 侧的单个网格（从文件加载或程序生成）
/// - `StaticMesh`：合并缓冲中一个网格的绘制范围
/// - `MeshBatch`：把多个网格拼进同一对顶点/索引缓冲

use super::vertex::Vertex;

/// CPU侧网格数据
///
/// 索引是网格局部的（从 0 开始），合并时通过 `base_vertex_location` 偏移。
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    /// 顶点数组
    pub vertices: Vec<Vertex>,

    /// 三角形顶点索引，每3个索引定义一个三角形
    pub indices: Vec<u32>,

    /// 网格名称（可选），用于调试和日志
    pub name: Option<String>,
}

impl MeshData {
    /// 创建一个指定名称的空网格数据
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            name: Some(name.into()),
        }
    }

    /// 获取顶点数量
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// 获取索引数量
    #[inline]
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// 获取三角形数量
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// 验证网格数据的有效性
    ///
    /// 检查：
    /// - 网格非空
    /// - 索引数量是3的倍数（每个三角形3个顶点）
    /// - 所有索引都在有效范围内
    pub fn validate(&self) -> Result<(), String> {
        if self.vertices.is_empty() || self.indices.is_empty() {
            return Err("网格不包含任何顶点或三角形".to_string());
        }

        if self.indices.len() % 3 != 0 {
            return Err(format!(
                "索引数量必须是3的倍数，当前为: {}",
                self.indices.len()
            ));
        }

        let vertex_count = self.vertices.len() as u32;
        if let Some(i) = self.indices.iter().position(|&idx| idx >= vertex_count) {
            return Err(format!(
                "索引 {} 处的值 {} 超出顶点范围 (0-{})",
                i,
                self.indices[i],
                vertex_count - 1
            ));
        }

        Ok(())
    }
}

/// 反转三角形绕序（交换每个三角形的后两个索引）
///
/// 网格文件中的正面三角形满足外法线为 `cross(e1, e2)`，
/// 加载后翻转为与 `primitives` 一致的绕序。
pub fn flip_winding(indices: &mut [u32]) {
    for triangle in indices.chunks_exact_mut(3) {
        triangle.swap(1, 2);
    }
}

/// 从三角形面重建顶点法线
///
/// 正面为左手坐标系下逆时针可见的三角形，因此外法线为 `cross(e2, e1)`。
/// 面法线按面积加权累加后归一化；退化顶点保留零法线。
pub fn reconstruct_normals(vertices: &mut [Vertex], indices: &[u32]) {
    use crate::math::Vector3;

    let mut accum = vec![Vector3::zeros(); vertices.len()];

    for triangle in indices.chunks_exact(3) {
        let [i0, i1, i2] = [triangle[0] as usize, triangle[1] as usize, triangle[2] as usize];
        let p0 = Vector3::from(vertices[i0].position);
        let p1 = Vector3::from(vertices[i1].position);
        let p2 = Vector3::from(vertices[i2].position);

        let face_normal = (p2 - p0).cross(&(p1 - p0));
        accum[i0] += face_normal;
        accum[i1] += face_normal;
        accum[i2] += face_normal;
    }

    for (vertex, n) in vertices.iter_mut().zip(accum) {
        vertex.normal = n.try_normalize(1e-12).unwrap_or_else(Vector3::zeros).into();
    }
}

/// 合并缓冲中的一个静态网格
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticMesh {
    pub index_count: u32,
    pub start_index_location: u32,
    pub base_vertex_location: i32,
}

impl StaticMesh {
    /// `draw_indexed` 的索引范围
    pub fn index_range(&self) -> std::ops::Range<u32> {
        self.start_index_location..self.start_index_location + self.index_count
    }
}

/// 多个网格合并后的顶点/索引数据
#[derive(Debug, Clone, Default)]
pub struct MeshBatch {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub meshes: Vec<StaticMesh>,
}

impl MeshBatch {
    /// 追加一个网格，返回它在 `meshes` 中的下标
    pub fn push(&mut self, mesh: &MeshData) -> usize {
        self.meshes.push(StaticMesh {
            index_count: mesh.indices.len() as u32,
            start_index_location: self.indices.len() as u32,
            base_vertex_location: self.vertices.len() as i32,
        });
        self.vertices.extend_from_slice(&mesh.vertices);
        self.indices.extend_from_slice(&mesh.indices);
        self.meshes.len() - 1
    }

    /// 获取网格
    pub fn mesh(&self, index: usize) -> Option<&StaticMesh> {
        self.meshes.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> MeshData {
        let mut mesh = MeshData::with_name("Triangle");
        mesh.vertices.push(Vertex::new([0.0, 0.0, 0.0], [0.0; 3]));
        mesh.vertices.push(Vertex::new([1.0, 0.0, 0.0], [0.0; 3]));
        mesh.vertices.push(Vertex::new([0.0, 1.0, 0.0], [0.0; 3]));
        mesh.indices.extend_from_slice(&[0, 1, 2]);
        mesh
    }

    #[test]
    fn test_mesh_data_counts() {
        let mesh = triangle();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.index_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_mesh_data_validation_invalid_index_count() {
        let mut mesh = triangle();
        mesh.indices.push(0);
        assert!(mesh.validate().is_err());
    }

    #[test]
    fn test_mesh_data_validation_invalid_index_range() {
        let mut mesh = triangle();
        mesh.indices[2] = 5;

        let result = mesh.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("超出顶点范围"));
    }

    #[test]
    fn test_empty_mesh_is_invalid() {
        assert!(MeshData::default().validate().is_err());
    }

    #[test]
    fn test_reconstruct_normals_faces_viewer() {
        // (0,0)->(1,0)->(0,1) 在 xy 平面上逆时针；左手系中观察者位于 -Z 一侧
        let mut mesh = triangle();
        reconstruct_normals(&mut mesh.vertices, &mesh.indices);
        for v in &mesh.vertices {
            assert!((v.normal[2] + 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_flip_winding_reverses_normals() {
        let mut mesh = triangle();
        flip_winding(&mut mesh.indices);
        assert_eq!(mesh.indices, vec![0, 2, 1]);

        reconstruct_normals(&mut mesh.vertices, &mesh.indices);
        for v in &mesh.vertices {
            assert!((v.normal[2] - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_batch_offsets() {
        let mut batch = MeshBatch::default();
        let first = batch.push(&triangle());
        let second = batch.push(&triangle());

        assert_eq!(first, 0);
        assert_eq!(second, 1);
        assert_eq!(batch.vertices.len(), 6);
        assert_eq!(batch.indices, vec![0, 1, 2, 0, 1, 2]);

        let mesh = batch.mesh(1).unwrap();
        assert_eq!(mesh.start_index_location, 3);
        assert_eq!(mesh.base_vertex_location, 3);
        assert_eq!(mesh.index_range(), 3..6);
        assert!(batch.mesh(2).is_none());
    }
}
