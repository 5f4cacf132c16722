//! 着色器源码
//!
//! WGSL 没有 `#include`，各着色器在编译期按固定顺序拼接：
//!
//! ```text
//! common.wgsl      常量、PerDrawConstants、顶点输入、色调映射
//! sampling.wgsl    GGX 重要性采样与 BRDF 项
//! cube_face.wgsl   渲染立方体贴图面的顶点着色器
//! fullscreen.wgsl  全屏三角形顶点着色器
//! ```

macro_rules! shader_source {
    ($($file:literal),+ $(,)?) => {
        concat!($(include_str!(concat!("shaders/", $file)), "\n"),+)
    };
}

/// 球体前向着色
pub const SIMPLE_FORWARD: &str = shader_source!("common.wgsl", "sampling.wgsl", "simple_forward.wgsl");

/// 天空盒
pub const SAMPLE_ENV_MAP: &str = shader_source!("common.wgsl", "sample_env_map.wgsl");

/// 等距柱状投影转立方体贴图
pub const EQUIRECT_TO_CUBE: &str = shader_source!("common.wgsl", "cube_face.wgsl", "equirect_to_cube.wgsl");

/// 辐照度卷积
pub const GENERATE_IRRADIANCE_MAP: &str =
    shader_source!("common.wgsl", "cube_face.wgsl", "irradiance.wgsl");

/// GGX 预过滤
pub const PREFILTER_ENV_MAP: &str =
    shader_source!("common.wgsl", "sampling.wgsl", "cube_face.wgsl", "prefilter.wgsl");

/// BRDF 积分查找表
pub const BRDF_INTEGRATION: &str =
    shader_source!("common.wgsl", "sampling.wgsl", "fullscreen.wgsl", "brdf_lut.wgsl");

/// mip 降采样
pub const MIPMAP: &str = shader_source!("fullscreen.wgsl", "mipmap.wgsl");

/// 创建着色器模块
pub fn create_module(device: &wgpu::Device, label: &str, source: &'static str) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sources_are_composed_in_order() {
        let common = SIMPLE_FORWARD.find("struct PerDrawConstants").unwrap();
        let sampling = SIMPLE_FORWARD.find("fn distribution_ggx").unwrap();
        let forward = SIMPLE_FORWARD.find("fn fs_main").unwrap();
        assert!(common < sampling && sampling < forward);
    }

    #[test]
    fn test_each_module_has_one_entry_pair() {
        for source in [
            SIMPLE_FORWARD,
            SAMPLE_ENV_MAP,
            EQUIRECT_TO_CUBE,
            GENERATE_IRRADIANCE_MAP,
            PREFILTER_ENV_MAP,
            BRDF_INTEGRATION,
            MIPMAP,
        ] {
            assert_eq!(source.matches("fn vs_main").count(), 1);
            assert_eq!(source.matches("fn fs_main").count(), 1);
        }
    }

    #[test]
    fn test_mipmap_does_not_bind_per_draw() {
        assert!(!MIPMAP.contains("per_draw"));
    }
}
