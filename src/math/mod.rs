//! 统一的数学库模块
//!
//! 基于 `nalgebra`，提供与 DirectXMath 一致的左手坐标系变换。
//!
//! # 约定
//!
//! - 左手坐标系：+X 向右，+Y 向上，+Z 指向屏幕内
//! - 列向量：`clip = projection * view * world * position`
//! - 裁剪空间深度范围 0..1（与 wgpu / D3D12 一致）
//! - nalgebra 以列主序存储，`as_slice()` 可直接作为 WGSL `mat4x4<f32>` 上传

pub use nalgebra::{
    Matrix4 as Mat4, Point3, Vector2 as Vec2, Vector3 as Vec3, Vector4 as Vec4,
};

// 类型别名，使用更简洁的名称
pub type Vector2 = Vec2<f32>;
pub type Vector3 = Vec3<f32>;
pub type Vector4 = Vec4<f32>;
pub type Matrix4 = Mat4<f32>;

/// 数学常量
pub mod constants {
    /// π
    pub const PI: f32 = std::f32::consts::PI;

    /// 2π
    pub const TAU: f32 = std::f32::consts::TAU;

    /// π/2
    pub const HALF_PI: f32 = std::f32::consts::FRAC_PI_2;

    /// 角度转弧度的系数
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// 浮点数比较的 epsilon
    pub const EPSILON: f32 = 1e-6;
}

/// 数学工具函数
pub mod utils {
    use super::constants;

    /// 饱和函数（限制在 0.0-1.0）
    pub fn saturate(value: f32) -> f32 {
        value.clamp(0.0, 1.0)
    }

    /// 角度转弧度
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// 将角度规约到 [-π, π)，等价于 XMScalarModAngle
    pub fn mod_angle(angle: f32) -> f32 {
        let shifted = angle + constants::PI;
        shifted - constants::TAU * (shifted / constants::TAU).floor() - constants::PI
    }

    /// 检查两个浮点数是否近似相等
    pub fn approx_eq(a: f32, b: f32, epsilon: f32) -> bool {
        (a - b).abs() < epsilon
    }
}

/// 左手坐标系矩阵辅助函数
pub mod matrix {
    use super::*;

    /// 创建平移矩阵
    pub fn translation(offset: &Vector3) -> Matrix4 {
        Matrix4::new_translation(offset)
    }

    /// 按 roll(Z) → pitch(X) → yaw(Y) 顺序旋转，对应 XMMatrixRotationRollPitchYaw
    pub fn rotation_roll_pitch_yaw(pitch: f32, yaw: f32, roll: f32) -> Matrix4 {
        let rx = Matrix4::from_axis_angle(&Vector3::x_axis(), pitch);
        let ry = Matrix4::from_axis_angle(&Vector3::y_axis(), yaw);
        let rz = Matrix4::from_axis_angle(&Vector3::z_axis(), roll);
        ry * rx * rz
    }

    /// 沿方向观察的视图矩阵（XMMatrixLookToLH）
    pub fn look_to_lh(eye: &Vector3, direction: &Vector3, up: &Vector3) -> Matrix4 {
        let z = direction.normalize();
        let x = up.cross(&z).normalize();
        let y = z.cross(&x);

        Matrix4::new(
            x.x, x.y, x.z, -x.dot(eye),
            y.x, y.y, y.z, -y.dot(eye),
            z.x, z.y, z.z, -z.dot(eye),
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// 朝向目标点的视图矩阵（XMMatrixLookAtLH）
    pub fn look_at_lh(eye: &Vector3, focus: &Vector3, up: &Vector3) -> Matrix4 {
        look_to_lh(eye, &(focus - eye), up)
    }

    /// 透视投影矩阵（XMMatrixPerspectiveFovLH），深度映射到 0..1
    pub fn perspective_fov_lh(fov_y: f32, aspect: f32, near: f32, far: f32) -> Matrix4 {
        let h = 1.0 / (0.5 * fov_y).tan();
        let w = h / aspect;
        let range = far / (far - near);

        Matrix4::new(
            w, 0.0, 0.0, 0.0,
            0.0, h, 0.0, 0.0,
            0.0, 0.0, range, -range * near,
            0.0, 0.0, 1.0, 0.0,
        )
    }

    /// 去掉视图矩阵的平移分量，用于天空盒
    pub fn view_without_translation(view: &Matrix4) -> Matrix4 {
        let mut m = *view;
        m[(0, 3)] = 0.0;
        m[(1, 3)] = 0.0;
        m[(2, 3)] = 0.0;
        m
    }
}

/// 立方体贴图六个面的观察方向，顺序为 +X, -X, +Y, -Y, +Z, -Z
pub const CUBE_FACE_DIRECTIONS: [[f32; 3]; 6] = [
    [1.0, 0.0, 0.0],
    [-1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, -1.0, 0.0],
    [0.0, 0.0, 1.0],
    [0.0, 0.0, -1.0],
];

/// 每个面对应的上方向
pub const CUBE_FACE_UPS: [[f32; 3]; 6] = [
    [0.0, 1.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, -1.0],
    [0.0, 0.0, 1.0],
    [0.0, 1.0, 0.0],
    [0.0, 1.0, 0.0],
];

/// 从原点看向第 `face` 个面的视图矩阵
pub fn cube_face_view(face: usize) -> Matrix4 {
    let [dx, dy, dz] = CUBE_FACE_DIRECTIONS[face];
    let [ux, uy, uz] = CUBE_FACE_UPS[face];
    matrix::look_to_lh(
        &Vector3::zeros(),
        &Vector3::new(dx, dy, dz),
        &Vector3::new(ux, uy, uz),
    )
}

/// 渲染立方体贴图面使用的 90° 投影
pub fn cube_face_projection() -> Matrix4 {
    matrix::perspective_fov_lh(constants::HALF_PI, 1.0, 0.1, 10.0)
}

/// 边长为 `size` 的完整 mip 链长度
pub fn mip_level_count(size: u32) -> u32 {
    32 - size.max(1).leading_zeros()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transform_point(m: &Matrix4, p: Vector3) -> Vector4 {
        m * Vector4::new(p.x, p.y, p.z, 1.0)
    }

    #[test]
    fn test_look_at_lh_moves_focus_onto_positive_z() {
        let eye = Vector3::new(12.0, 6.0, 0.0);
        let view = matrix::look_at_lh(&eye, &Vector3::zeros(), &Vector3::y());

        let focus = transform_point(&view, Vector3::zeros());
        assert!(focus.x.abs() < 1e-5);
        assert!(focus.y.abs() < 1e-5);
        assert!((focus.z - eye.norm()).abs() < 1e-4);

        let eye_in_view = transform_point(&view, eye);
        assert!(eye_in_view.xyz().norm() < 1e-4);
    }

    #[test]
    fn test_perspective_depth_range() {
        let proj = matrix::perspective_fov_lh(constants::PI / 3.0, 16.0 / 9.0, 0.1, 100.0);

        let near = transform_point(&proj, Vector3::new(0.0, 0.0, 0.1));
        let far = transform_point(&proj, Vector3::new(0.0, 0.0, 100.0));

        assert!((near.z / near.w).abs() < 1e-5);
        assert!((far.z / far.w - 1.0).abs() < 1e-5);
        assert!((near.w - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_cube_face_views_look_down_their_axis() {
        for face in 0..6 {
            let view = cube_face_view(face);
            let [dx, dy, dz] = CUBE_FACE_DIRECTIONS[face];
            let p = transform_point(&view, Vector3::new(dx, dy, dz));
            // 面方向上的点落在视图空间 +Z 轴上
            assert!(p.x.abs() < 1e-5, "face {}", face);
            assert!(p.y.abs() < 1e-5, "face {}", face);
            assert!((p.z - 1.0).abs() < 1e-5, "face {}", face);
        }
    }

    #[test]
    fn test_cube_face_up_vectors() {
        // +Y 面：上方向为 -Z，因此 -Z 方向的点在屏幕上方
        let view = cube_face_view(2);
        let p = transform_point(&view, Vector3::new(0.0, 1.0, -1.0));
        assert!(p.y > 0.0);

        // -Y 面：上方向为 +Z
        let view = cube_face_view(3);
        let p = transform_point(&view, Vector3::new(0.0, -1.0, 1.0));
        assert!(p.y > 0.0);
    }

    #[test]
    fn test_view_without_translation() {
        let view = matrix::look_at_lh(&Vector3::new(3.0, 4.0, 5.0), &Vector3::zeros(), &Vector3::y());
        let sky = matrix::view_without_translation(&view);
        let origin = transform_point(&sky, Vector3::zeros());
        assert!(origin.xyz().norm() < 1e-6);
        assert_eq!(sky.fixed_view::<3, 3>(0, 0), view.fixed_view::<3, 3>(0, 0));
    }

    #[test]
    fn test_mod_angle() {
        assert!(utils::approx_eq(utils::mod_angle(0.5), 0.5, 1e-5));
        assert!(utils::approx_eq(utils::mod_angle(constants::TAU + 0.5), 0.5, 1e-4));
        assert!(utils::approx_eq(utils::mod_angle(-constants::TAU - 0.5), -0.5, 1e-4));
        let a = utils::mod_angle(1000.0);
        assert!((-constants::PI..constants::PI).contains(&a));
    }

    #[test]
    fn test_mip_level_count() {
        assert_eq!(mip_level_count(512), 10);
        assert_eq!(mip_level_count(256), 9);
        assert_eq!(mip_level_count(64), 7);
        assert_eq!(mip_level_count(1), 1);
    }

    #[test]
    fn test_rotation_identity_and_translation() {
        let world = matrix::translation(&Vector3::new(1.0, 2.0, 3.0))
            * matrix::rotation_roll_pitch_yaw(0.0, 0.0, 0.0);
        let p = transform_point(&world, Vector3::zeros());
        assert_eq!(p.xyz(), Vector3::new(1.0, 2.0, 3.0));
    }
}
