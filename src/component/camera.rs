//! 环绕相机
//!
//! 相机在高度 h 的水平圆上绕焦点匀速旋转，始终看向焦点。

use crate::core::scene::CameraConfig;
use crate::math::{matrix, utils, Matrix4, Vector3};

/// 环绕相机
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    /// 环绕半径
    pub radius: f32,

    /// 相机高度
    pub height: f32,

    /// 角速度（弧度/秒）
    pub speed: f32,

    /// 是否暂停环绕
    pub paused: bool,

    focus: Vector3,

    /// 当前角度，规约到 [-π, π)
    angle: f32,

    /// 垂直视场角（弧度）
    fov_y: f32,
    near_z: f32,
    far_z: f32,
}

impl OrbitCamera {
    /// 从场景配置创建相机
    pub fn from_config(config: &CameraConfig) -> Self {
        Self {
            radius: config.orbit_radius,
            height: config.orbit_height,
            speed: config.orbit_speed,
            paused: false,
            focus: Vector3::from(config.focus),
            angle: 0.0,
            fov_y: utils::deg_to_rad(config.fov),
            near_z: config.near_clip,
            far_z: config.far_clip,
        }
    }

    /// 推进 `delta_time` 秒
    ///
    /// 速度恒定且未暂停时，角度等于 `mod_angle(speed * time)`。
    pub fn update(&mut self, delta_time: f32) {
        if !self.paused {
            self.angle = utils::mod_angle(self.angle + self.speed * delta_time);
        }
    }

    /// 当前角度（弧度）
    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// 世界空间位置
    pub fn position(&self) -> Vector3 {
        Vector3::new(
            self.radius * self.angle.cos(),
            self.height,
            self.radius * self.angle.sin(),
        )
    }

    pub fn focus(&self) -> Vector3 {
        self.focus
    }

    /// 视图矩阵（左手坐标系，上方向 +Y）
    pub fn view_matrix(&self) -> Matrix4 {
        matrix::look_at_lh(&self.position(), &self.focus, &Vector3::y())
    }

    /// 投影矩阵
    pub fn projection_matrix(&self, aspect: f32) -> Matrix4 {
        matrix::perspective_fov_lh(self.fov_y, aspect, self.near_z, self.far_z)
    }

    /// 垂直视场角（弧度）
    pub fn fov_y(&self) -> f32 {
        self.fov_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> OrbitCamera {
        OrbitCamera::from_config(&CameraConfig::default())
    }

    #[test]
    fn test_initial_position() {
        let camera = camera();
        assert_eq!(camera.position(), Vector3::new(12.0, 6.0, 0.0));
        assert!((camera.fov_y() - std::f32::consts::FRAC_PI_3).abs() < 1e-6);
    }

    #[test]
    fn test_orbit_matches_speed_times_time() {
        let mut camera = camera();
        for _ in 0..600 {
            camera.update(1.0 / 60.0);
        }
        // t = 10s, a = 2.5
        assert!((camera.angle() - 2.5).abs() < 1e-3);

        let p = camera.position();
        assert!((p.x - 12.0 * 2.5f32.cos()).abs() < 1e-2);
        assert!((p.z - 12.0 * 2.5f32.sin()).abs() < 1e-2);
        assert_eq!(p.y, 6.0);
    }

    #[test]
    fn test_angle_wraps() {
        let mut camera = camera();
        camera.speed = 1.0;
        camera.update(10.0);
        assert!(camera.angle() >= -std::f32::consts::PI && camera.angle() < std::f32::consts::PI);
        assert!((camera.angle() - utils::mod_angle(10.0)).abs() < 1e-5);
    }

    #[test]
    fn test_paused_camera_stays() {
        let mut camera = camera();
        camera.paused = true;
        camera.update(5.0);
        assert_eq!(camera.angle(), 0.0);
    }

    #[test]
    fn test_view_looks_at_focus() {
        let mut camera = camera();
        camera.update(3.0);
        let focus = camera.view_matrix() * crate::math::Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert!(focus.x.abs() < 1e-4);
        assert!(focus.y.abs() < 1e-4);
        assert!(focus.z > 0.0);
    }
}
