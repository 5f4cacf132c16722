//! 着色器共享的常量布局
//!
//! 与 `common.wgsl` / `simple_forward.wgsl` 中的结构一一对应，
//! 每个结构填充到 256 字节，恰好占用上传堆的一个对齐块。

use bytemuck::{Pod, Zeroable};

use crate::component::PointLight;
use crate::core::scene::MAX_LIGHTS;
use crate::math::{Matrix4, Vector3};

/// 每次绘制的常量
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct PerDrawConstants {
    pub object_to_clip: [[f32; 4]; 4],
    pub object_to_world: [[f32; 4]; 4],
    pub albedo: [f32; 3],
    pub metallic: f32,
    pub roughness: f32,
    pub ao: f32,
    _padding: [f32; 26],
}

impl PerDrawConstants {
    /// 只带变换的常量，材质参数为零
    pub fn new(object_to_clip: &Matrix4, object_to_world: &Matrix4) -> Self {
        Self {
            object_to_clip: *object_to_clip.as_ref(),
            object_to_world: *object_to_world.as_ref(),
            ..Self::zeroed()
        }
    }

    pub fn with_material(mut self, albedo: [f32; 3], metallic: f32, roughness: f32, ao: f32) -> Self {
        self.albedo = albedo;
        self.metallic = metallic;
        self.roughness = roughness;
        self.ao = ao;
        self
    }

    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness;
        self
    }
}

/// 每帧的光照常量
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct PerFrameConstants {
    pub light_positions: [[f32; 4]; MAX_LIGHTS],
    pub light_colors: [[f32; 4]; MAX_LIGHTS],
    pub viewer_position: [f32; 4],
    /// x: 环境光强度, y: 预过滤贴图最大 lod, z: 光源数量
    pub ibl_params: [f32; 4],
    _padding: [f32; 24],
}

impl PerFrameConstants {
    /// 超过 `MAX_LIGHTS` 的光源被忽略
    pub fn new(
        lights: &[PointLight],
        light_intensity: f32,
        viewer_position: &Vector3,
        env_intensity: f32,
        max_reflection_lod: f32,
    ) -> Self {
        let mut constants = Self::zeroed();
        let count = lights.len().min(MAX_LIGHTS);

        for (i, light) in lights.iter().take(count).enumerate() {
            constants.light_positions[i] = light.position_vec4();
            constants.light_colors[i] = light.color_vec4(light_intensity);
        }

        constants.viewer_position = [viewer_position.x, viewer_position.y, viewer_position.z, 1.0];
        constants.ibl_params = [env_intensity, max_reflection_lod, count as f32, 0.0];
        constants
    }
}
