/// ASCII PLY 加载器
///
/// 支持的头部语法：
///
/// ```text
/// ply
/// format ascii 1.0
/// comment ...
/// element vertex N
/// property float x|y|z|nx|ny|nz|s|t
/// element face M
/// property list uchar uint vertex_indices
/// end_header
/// ```
///
/// 顶点行按属性声明顺序读取；面必须是三角形（`3 a b c`）。
/// 文件中三角形的外法线为 `cross(b - a, c - a)`，加载时翻转为 `a c b`。
/// 缺少法线时从面法线重建，纹理坐标被忽略。
use super::MeshLoader;
use crate::core::error::{MeshLoadError, Result};
use crate::geometry::mesh::{reconstruct_normals, MeshData};
use crate::geometry::vertex::Vertex;
use std::path::Path;

/// PLY 格式加载器
pub struct PlyLoader;

/// 顶点元素中我们关心的列
#[derive(Debug, Default)]
struct VertexColumns {
    position: [Option<usize>; 3],
    normal: [Option<usize>; 3],
    count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Element {
    None,
    Vertex,
    Face,
    Other,
}

fn parse_error(line: usize, reason: impl Into<String>) -> MeshLoadError {
    MeshLoadError::ParseError {
        line,
        reason: reason.into(),
    }
}

impl PlyLoader {
    /// 解析 ASCII PLY 文本
    pub fn parse(text: &str, name: &str) -> Result<MeshData> {
        let mut lines = text.lines().enumerate().map(|(i, l)| (i + 1, l.trim()));

        let mut vertex_count: Option<usize> = None;
        let mut face_count: Option<usize> = None;
        let mut columns = VertexColumns::default();
        let mut current = Element::None;
        let mut header_done = false;

        for (line_no, line) in lines.by_ref() {
            let mut tokens = line.split_whitespace();
            let Some(keyword) = tokens.next() else { continue };

            match keyword {
                "ply" | "comment" | "obj_info" => {}
                "format" => {
                    if tokens.next() != Some("ascii") {
                        return Err(MeshLoadError::UnsupportedFormat(
                            "只支持 ASCII PLY".to_string(),
                        ).into());
                    }
                }
                "element" => {
                    let kind = tokens.next().ok_or_else(|| parse_error(line_no, "element 缺少名称"))?;
                    let count = tokens
                        .next()
                        .and_then(|c| c.parse::<usize>().ok())
                        .ok_or_else(|| parse_error(line_no, "element 数量无效"))?;
                    current = match kind {
                        "vertex" => {
                            vertex_count = Some(count);
                            Element::Vertex
                        }
                        "face" => {
                            face_count = Some(count);
                            Element::Face
                        }
                        _ => Element::Other,
                    };
                }
                "property" => {
                    if current == Element::Vertex {
                        let name = tokens.last().ok_or_else(|| parse_error(line_no, "property 缺少名称"))?;
                        let column = columns.count;
                        match name {
                            "x" => columns.position[0] = Some(column),
                            "y" => columns.position[1] = Some(column),
                            "z" => columns.position[2] = Some(column),
                            "nx" => columns.normal[0] = Some(column),
                            "ny" => columns.normal[1] = Some(column),
                            "nz" => columns.normal[2] = Some(column),
                            _ => {}
                        }
                        columns.count += 1;
                    }
                }
                "end_header" => {
                    header_done = true;
                    break;
                }
                other => {
                    return Err(parse_error(line_no, format!("未知的头部关键字 '{}'", other)).into());
                }
            }
        }

        if !header_done {
            return Err(parse_error(0, "缺少 end_header").into());
        }
        let vertex_count = vertex_count.ok_or_else(|| parse_error(0, "缺少 element vertex"))?;
        let face_count = face_count.ok_or_else(|| parse_error(0, "缺少 element face"))?;
        let position_cols = match columns.position {
            [Some(x), Some(y), Some(z)] => [x, y, z],
            _ => return Err(MeshLoadError::ValidationError("PLY 顶点缺少 x/y/z 属性".to_string()).into()),
        };
        let normal_cols = match columns.normal {
            [Some(x), Some(y), Some(z)] => Some([x, y, z]),
            _ => None,
        };

        let mut mesh = MeshData::with_name(name);
        mesh.vertices.reserve(vertex_count);
        mesh.indices.reserve(face_count * 3);

        let mut data_lines = lines.filter(|(_, l)| !l.is_empty());

        let mut values = Vec::with_capacity(columns.count);
        for _ in 0..vertex_count {
            let (line_no, line) = data_lines
                .next()
                .ok_or_else(|| parse_error(0, "顶点数据提前结束"))?;

            values.clear();
            for token in line.split_whitespace() {
                let value = token
                    .parse::<f32>()
                    .map_err(|_| parse_error(line_no, format!("无效的数值 '{}'", token)))?;
                values.push(value);
            }
            if values.len() < columns.count {
                return Err(parse_error(
                    line_no,
                    format!("期望 {} 列，实际 {} 列", columns.count, values.len()),
                ).into());
            }

            let position = position_cols.map(|c| values[c]);
            let normal = normal_cols.map(|cols| cols.map(|c| values[c])).unwrap_or([0.0; 3]);
            mesh.vertices.push(Vertex::new(position, normal));
        }

        for _ in 0..face_count {
            let (line_no, line) = data_lines
                .next()
                .ok_or_else(|| parse_error(0, "面数据提前结束"))?;

            let indices = line
                .split_whitespace()
                .map(|t| t.parse::<u32>())
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| parse_error(line_no, format!("无效的索引: {}", e)))?;

            match indices.as_slice() {
                [3, a, b, c] => mesh.indices.extend_from_slice(&[*a, *c, *b]),
                [n, ..] => {
                    return Err(parse_error(line_no, format!("只支持三角形面，实际为 {} 边形", n)).into());
                }
                [] => return Err(parse_error(line_no, "空的面定义").into()),
            }
        }

        mesh.validate().map_err(MeshLoadError::ValidationError)?;

        if normal_cols.is_none() {
            tracing::info!(mesh = name, "PLY 文件缺少法线数据，正在重建...");
            reconstruct_normals(&mut mesh.vertices, &mesh.indices);
        }

        tracing::debug!(
            mesh = name,
            vertices = mesh.vertex_count(),
            triangles = mesh.triangle_count(),
            "Parsed PLY mesh"
        );

        Ok(mesh)
    }
}

impl MeshLoader for PlyLoader {
    fn load_from_file(path: &Path) -> Result<MeshData> {
        if !path.exists() {
            return Err(MeshLoadError::FileNotFound(path.to_path_buf()).into());
        }

        let text = std::fs::read_to_string(path)?;
        let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("Unnamed");
        Self::parse(&text, name)
    }

    fn load_from_memory(data: &[u8]) -> Result<MeshData> {
        let text = std::str::from_utf8(data)
            .map_err(|e| MeshLoadError::UnsupportedFormat(format!("PLY 不是有效的 UTF-8 文本: {}", e)))?;
        Self::parse(text, "Memory")
    }

    fn supported_extensions() -> &'static [&'static str] {
        &["ply"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::IblRenderError;

    const QUAD: &str = "ply
format ascii 1.0
comment two triangles
element vertex 4
property float x
property float y
property float z
property float nx
property float ny
property float nz
property float s
property float t
element face 2
property list uchar uint vertex_indices
end_header
0 0 0 0 0 -1 0 0
1 0 0 0 0 -1 1 0
1 1 0 0 0 -1 1 1
0 1 0 0 0 -1 0 1
3 0 1 2
3 0 2 3
";

    #[test]
    fn test_parse_quad() {
        let mesh = PlyLoader::parse(QUAD, "Quad").unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.indices, vec![0, 2, 1, 0, 3, 2]);
        assert_eq!(mesh.vertices[2].position, [1.0, 1.0, 0.0]);
        assert_eq!(mesh.vertices[2].normal, [0.0, 0.0, -1.0]);
        assert_eq!(mesh.name.as_deref(), Some("Quad"));
    }

    #[test]
    fn test_property_order_is_respected() {
        let text = "ply
format ascii 1.0
element vertex 3
property float nx
property float ny
property float nz
property float x
property float y
property float z
element face 1
property list uchar int vertex_indices
end_header
0 0 -1 5 6 7
0 0 -1 8 6 7
0 0 -1 5 9 7
3 0 1 2
";
        let mesh = PlyLoader::parse(text, "Reordered").unwrap();
        assert_eq!(mesh.vertices[0].position, [5.0, 6.0, 7.0]);
        assert_eq!(mesh.vertices[0].normal, [0.0, 0.0, -1.0]);
    }

    #[test]
    fn test_missing_normals_are_reconstructed() {
        let text = "ply
format ascii 1.0
element vertex 3
property float x
property float y
property float z
element face 1
property list uchar int vertex_indices
end_header
0 0 0
1 0 0
0 1 0
3 0 1 2
";
        let mesh = PlyLoader::parse(text, "Tri").unwrap();
        assert_eq!(mesh.indices, vec![0, 2, 1]);
        for v in &mesh.vertices {
            assert!((v.normal[2] - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_reconstructed_normals_point_outward() {
        // 四面体，每个面的 cross(b - a, c - a) 朝外
        let text = "ply
format ascii 1.0
element vertex 4
property float x
property float y
property float z
element face 4
property list uchar int vertex_indices
end_header
0 0 0
1 0 0
0 1 0
0 0 1
3 0 2 1
3 0 1 3
3 0 3 2
3 1 2 3
";
        let mesh = PlyLoader::parse(text, "Tetrahedron").unwrap();
        let centroid = [0.25f32, 0.25, 0.25];
        for v in &mesh.vertices {
            let outward: f32 = (0..3).map(|i| (v.position[i] - centroid[i]) * v.normal[i]).sum();
            assert!(outward > 0.0, "normal {:?} at {:?} points inward", v.normal, v.position);
        }
    }

    #[test]
    fn test_quad_faces_are_rejected() {
        let text = QUAD.replace("3 0 2 3", "4 0 1 2 3");
        let err = PlyLoader::parse(&text, "Quad").unwrap_err();
        match err {
            IblRenderError::MeshLoading(MeshLoadError::ParseError { line, .. }) => assert_eq!(line, 21),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_truncated_data() {
        let text = QUAD.replace("3 0 2 3\n", "");
        assert!(PlyLoader::parse(&text, "Quad").is_err());
    }

    #[test]
    fn test_binary_format_rejected() {
        let text = QUAD.replace("format ascii 1.0", "format binary_little_endian 1.0");
        assert!(PlyLoader::parse(&text, "Quad").is_err());
    }

    #[test]
    fn test_missing_positions() {
        let text = QUAD.replace("property float z\n", "");
        assert!(PlyLoader::parse(&text, "Quad").is_err());
    }

    #[test]
    fn test_out_of_range_index() {
        let text = QUAD.replace("3 0 2 3", "3 0 2 9");
        assert!(PlyLoader::parse(&text, "Quad").is_err());
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = PlyLoader::load_from_file(Path::new("nonexistent.ply"));
        assert!(matches!(
            result,
            Err(IblRenderError::MeshLoading(MeshLoadError::FileNotFound(_)))
        ));
    }

    #[test]
    fn test_load_from_memory() {
        let mesh = PlyLoader::load_from_memory(QUAD.as_bytes()).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
    }
}
