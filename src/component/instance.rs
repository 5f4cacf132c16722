//! 静态网格实例

use crate::core::scene::GridConfig;
use crate::math::{matrix, Matrix4, Vector3};

/// 静态网格实例
///
/// `mesh_index` 指向合并缓冲中的网格，材质参数逐实例变化。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticMeshInstance {
    pub position: Vector3,
    /// (pitch, yaw, roll)，弧度
    pub rotation: Vector3,
    pub mesh_index: usize,
    pub roughness: f32,
    pub metallic: f32,
}

impl StaticMeshInstance {
    /// 物体到世界的变换：先旋转后平移
    pub fn object_to_world(&self) -> Matrix4 {
        matrix::translation(&self.position)
            * matrix::rotation_roll_pitch_yaw(self.rotation.x, self.rotation.y, self.rotation.z)
    }
}

/// 生成球体阵列
///
/// 阵列位于 z = 0 平面并以原点为中心。每行金属度递增 1/(rows-1)，
/// 每列粗糙度从 `start_roughness` 递增 1/columns，二者都截断到 1。
pub fn build_sphere_grid(grid: &GridConfig, mesh_index: usize) -> Vec<StaticMeshInstance> {
    let rows = grid.rows as f32;
    let columns = grid.columns as f32;
    let metallic_step = if grid.rows > 1 { 1.0 / (rows - 1.0) } else { 0.0 };
    let roughness_step = 1.0 / columns;

    let mut instances = Vec::with_capacity((grid.rows * grid.columns) as usize);
    let mut metallic = 0.0f32;

    for row in 0..grid.rows {
        let mut roughness = grid.start_roughness;
        for column in 0..grid.columns {
            let x = grid.spacing * (-columns * 0.5 + column as f32 + 0.5);
            let y = grid.spacing * (-rows * 0.5 + row as f32 + 0.5);

            instances.push(StaticMeshInstance {
                position: Vector3::new(x, y, 0.0),
                rotation: Vector3::zeros(),
                mesh_index,
                roughness,
                metallic,
            });

            roughness = (roughness + roughness_step).min(1.0);
        }
        metallic = (metallic + metallic_step).min(1.0);
    }

    instances
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_grid_layout() {
        let instances = build_sphere_grid(&GridConfig::default(), 1);
        assert_eq!(instances.len(), 35);
        assert!(instances.iter().all(|i| i.mesh_index == 1));

        // 第一行第一列位于左下角
        let first = instances[0];
        assert!((first.position.x - 2.2 * -3.0).abs() < 1e-5);
        assert!((first.position.y - 2.2 * -2.0).abs() < 1e-5);
        assert_eq!(first.position.z, 0.0);

        // 阵列以原点为中心
        let center: Vector3 = instances.iter().map(|i| i.position).sum::<Vector3>() / 35.0;
        assert!(center.norm() < 1e-4);
    }

    #[test]
    fn test_material_progression() {
        let instances = build_sphere_grid(&GridConfig::default(), 0);

        for row in 0..5 {
            let row_items = &instances[row * 7..(row + 1) * 7];
            assert!((row_items[0].roughness - 0.03).abs() < 1e-6);
            for pair in row_items.windows(2) {
                assert!(pair[1].roughness > pair[0].roughness);
                assert_eq!(pair[1].metallic, pair[0].metallic);
            }
            assert!((row_items[0].metallic - row as f32 * 0.25).abs() < 1e-6);
        }
        assert!(instances.iter().all(|i| i.roughness <= 1.0 && i.metallic <= 1.0));
    }

    #[test]
    fn test_single_row_grid() {
        let grid = GridConfig { rows: 1, columns: 3, ..GridConfig::default() };
        let instances = build_sphere_grid(&grid, 0);
        assert_eq!(instances.len(), 3);
        assert!(instances.iter().all(|i| i.metallic == 0.0));
    }

    #[test]
    fn test_roughness_clamped() {
        let grid = GridConfig { columns: 2, start_roughness: 0.9, ..GridConfig::default() };
        let instances = build_sphere_grid(&grid, 0);
        assert_eq!(instances[1].roughness, 1.0);
    }

    #[test]
    fn test_object_to_world_translates() {
        let instance = StaticMeshInstance {
            position: Vector3::new(1.0, 2.0, 3.0),
            rotation: Vector3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0),
            mesh_index: 0,
            roughness: 0.5,
            metallic: 0.0,
        };
        let world = instance.object_to_world();
        let origin = world * crate::math::Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert!((origin.xyz() - instance.position).norm() < 1e-6);
    }
}
