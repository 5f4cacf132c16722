//! 程序化生成的基础网格
//!
//! 当 `assets/meshes` 下的 PLY 文件缺失时作为替代。
//! 三角形从外部观察均为逆时针（左手坐标系），法线朝外。

use super::mesh::MeshData;
use super::vertex::Vertex;
use crate::math::{constants, Vector3};

/// 以原点为中心、边长为 2 的立方体（24 个顶点，每个面独立法线）
pub fn cube() -> MeshData {
    let mut mesh = MeshData::with_name("Cube");

    for [nx, ny, nz] in crate::math::CUBE_FACE_DIRECTIONS {
        let n = Vector3::new(nx, ny, nz);
        let v = if ny.abs() > 0.5 { Vector3::z() } else { Vector3::y() };
        // u × v = -n，使 (00, 10, 11) 从外部看为逆时针
        let u = n.cross(&v);

        let base = mesh.vertices.len() as u32;
        for (s, t) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let p = n + u * s + v * t;
            mesh.vertices.push(Vertex::new(p.into(), n.into()));
        }
        mesh.indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    mesh
}

/// 单位 UV 球
///
/// `rings` 为纬线分段数，`segments` 为经线分段数。
pub fn uv_sphere(rings: u32, segments: u32) -> MeshData {
    let rings = rings.max(2);
    let segments = segments.max(3);
    let mut mesh = MeshData::with_name("Sphere");

    for i in 0..=rings {
        let phi = constants::PI * i as f32 / rings as f32;
        for j in 0..=segments {
            let theta = constants::TAU * j as f32 / segments as f32;
            let p = [phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin()];
            mesh.vertices.push(Vertex::new(p, p));
        }
    }

    let stride = segments + 1;
    for i in 0..rings {
        for j in 0..segments {
            let a = i * stride + j;
            let b = a + 1;
            let c = a + stride;
            let d = c + 1;
            // 极点处的退化三角形跳过
            if i != 0 {
                mesh.indices.extend_from_slice(&[a, c, b]);
            }
            if i != rings - 1 {
                mesh.indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 左手系中外部可见逆时针 ⇔ cross(e1, e2) 指向网格内部
    fn assert_outward_ccw(mesh: &MeshData) {
        for tri in mesh.indices.chunks_exact(3) {
            let p: Vec<Vector3> = tri
                .iter()
                .map(|&i| Vector3::from(mesh.vertices[i as usize].position))
                .collect();
            let centroid = (p[0] + p[1] + p[2]) / 3.0;
            let cross = (p[1] - p[0]).cross(&(p[2] - p[0]));
            assert!(cross.norm() > 1e-8, "degenerate triangle {:?}", tri);
            assert!(cross.dot(&centroid) < 0.0, "triangle {:?} is wound clockwise", tri);
        }
    }

    #[test]
    fn test_cube_counts() {
        let cube = cube();
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.triangle_count(), 12);
        assert!(cube.validate().is_ok());
    }

    #[test]
    fn test_cube_winding_and_normals() {
        let cube = cube();
        assert_outward_ccw(&cube);
        for v in &cube.vertices {
            let p = Vector3::from(v.position);
            let n = Vector3::from(v.normal);
            assert!((n.norm() - 1.0).abs() < 1e-6);
            assert!((p.dot(&n) - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_sphere_counts() {
        let sphere = uv_sphere(16, 32);
        assert_eq!(sphere.vertex_count(), 17 * 33);
        // 两个极环各少一半三角形
        assert_eq!(sphere.triangle_count(), (2 * 16 - 2) * 32);
        assert!(sphere.validate().is_ok());
    }

    #[test]
    fn test_sphere_winding() {
        assert_outward_ccw(&uv_sphere(8, 12));
    }

    #[test]
    fn test_reconstructed_normals_match_analytic() {
        let mut sphere = uv_sphere(12, 24);
        let analytic: Vec<[f32; 3]> = sphere.vertices.iter().map(|v| v.normal).collect();
        crate::geometry::mesh::reconstruct_normals(&mut sphere.vertices, &sphere.indices);

        for (v, n) in sphere.vertices.iter().zip(analytic) {
            let len = Vector3::from(v.normal).norm();
            // 接缝处的重复顶点只累加了一侧的面
            if len > 0.5 {
                assert!(Vector3::from(v.normal).dot(&Vector3::from(n)) > 0.8);
            }
        }
    }
}
