//! 点光源

use crate::core::scene::PointLightConfig;
use crate::math::Vector3;

/// 光源颜色（RGB，线性空间）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// 创建新颜色
    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// 转换为数组
    pub fn to_array(&self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    /// 带强度的颜色（颜色 * 强度）
    pub fn with_intensity(&self, intensity: f32) -> [f32; 3] {
        [self.r * intensity, self.g * intensity, self.b * intensity]
    }
}

impl From<[f32; 3]> for Color {
    fn from([r, g, b]: [f32; 3]) -> Self {
        Self::new(r, g, b)
    }
}

/// 点光源
///
/// 颜色即辐射强度，衰减为 1/d²，没有范围截断。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Vector3,
    pub color: Color,
}

impl PointLight {
    pub fn new(position: Vector3, color: Color) -> Self {
        Self { position, color }
    }

    /// 着色器使用的 vec4 位置（w = 1）
    pub fn position_vec4(&self) -> [f32; 4] {
        [self.position.x, self.position.y, self.position.z, 1.0]
    }

    /// 着色器使用的 vec4 颜色（w = 0）
    pub fn color_vec4(&self, intensity: f32) -> [f32; 4] {
        let [r, g, b] = self.color.with_intensity(intensity);
        [r, g, b, 0.0]
    }
}

impl From<&PointLightConfig> for PointLight {
    fn from(config: &PointLightConfig) -> Self {
        Self::new(Vector3::from(config.position), Color::from(config.color))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let config = PointLightConfig {
            position: [-10.0, 10.0, -10.0],
            color: [300.0, 300.0, 300.0],
        };
        let light = PointLight::from(&config);
        assert_eq!(light.position_vec4(), [-10.0, 10.0, -10.0, 1.0]);
        assert_eq!(light.color_vec4(1.0), [300.0, 300.0, 300.0, 0.0]);
    }

    #[test]
    fn test_intensity_scale() {
        let light = PointLight::new(Vector3::zeros(), Color::new(1.0, 2.0, 3.0));
        assert_eq!(light.color_vec4(0.5), [0.5, 1.0, 1.5, 0.0]);
    }
}
