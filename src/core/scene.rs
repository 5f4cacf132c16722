//! 场景配置模块
//!
//! 定义场景配置：环境贴图分辨率、网格路径、球体阵列、环绕相机和点光源。
//! 所有字段都带有默认值，缺省时与经典的 IBL 演示场景一致。

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::error::{ConfigError, IblRenderError, Result};

/// 着色器中点光源数组的长度
pub const MAX_LIGHTS: usize = 4;

/// 环境贴图配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// 等距柱状投影 HDR 文件路径
    #[serde(default = "default_hdr_path")]
    pub hdr_path: String,

    /// 环境立方体贴图边长
    #[serde(default = "default_cube_resolution")]
    pub cube_resolution: u32,

    /// 辐照度贴图边长
    #[serde(default = "default_irradiance_resolution")]
    pub irradiance_resolution: u32,

    /// 预过滤环境贴图 mip 0 边长
    #[serde(default = "default_prefiltered_resolution")]
    pub prefiltered_resolution: u32,

    /// 预过滤环境贴图 mip 数量（粗糙度 0..1 均分到各级）
    #[serde(default = "default_prefiltered_mip_levels")]
    pub prefiltered_mip_levels: u32,

    /// BRDF 积分查找表边长
    #[serde(default = "default_brdf_lut_resolution")]
    pub brdf_lut_resolution: u32,

    /// 环境光强度
    #[serde(default = "default_intensity")]
    pub intensity: f32,
}

fn default_hdr_path() -> String { "assets/textures/newport_loft.hdr".to_string() }
fn default_cube_resolution() -> u32 { 512 }
fn default_irradiance_resolution() -> u32 { 64 }
fn default_prefiltered_resolution() -> u32 { 256 }
fn default_prefiltered_mip_levels() -> u32 { 6 }
fn default_brdf_lut_resolution() -> u32 { 512 }
fn default_intensity() -> f32 { 1.0 }

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            hdr_path: default_hdr_path(),
            cube_resolution: default_cube_resolution(),
            irradiance_resolution: default_irradiance_resolution(),
            prefiltered_resolution: default_prefiltered_resolution(),
            prefiltered_mip_levels: default_prefiltered_mip_levels(),
            brdf_lut_resolution: default_brdf_lut_resolution(),
            intensity: default_intensity(),
        }
    }
}

/// 网格文件配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshesConfig {
    /// 天空盒与立方体贴图渲染使用的立方体
    #[serde(default = "default_cube_mesh")]
    pub cube: String,

    /// 球体阵列使用的球体
    #[serde(default = "default_sphere_mesh")]
    pub sphere: String,
}

fn default_cube_mesh() -> String { "assets/meshes/cube.ply".to_string() }
fn default_sphere_mesh() -> String { "assets/meshes/sphere.ply".to_string() }

impl Default for MeshesConfig {
    fn default() -> Self {
        Self {
            cube: default_cube_mesh(),
            sphere: default_sphere_mesh(),
        }
    }
}

/// 球体阵列配置
///
/// 行方向递增金属度，列方向递增粗糙度。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    #[serde(default = "default_rows")]
    pub rows: u32,

    #[serde(default = "default_columns")]
    pub columns: u32,

    /// 相邻球心距离
    #[serde(default = "default_spacing")]
    pub spacing: f32,

    #[serde(default = "default_albedo")]
    pub albedo: [f32; 3],

    #[serde(default = "default_ao")]
    pub ao: f32,

    /// 每行第一列的粗糙度
    #[serde(default = "default_start_roughness")]
    pub start_roughness: f32,
}

fn default_rows() -> u32 { 5 }
fn default_columns() -> u32 { 7 }
fn default_spacing() -> f32 { 2.2 }
fn default_albedo() -> [f32; 3] { [0.5, 0.0, 0.0] }
fn default_ao() -> f32 { 1.0 }
fn default_start_roughness() -> f32 { 0.03 }

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: default_rows(),
            columns: default_columns(),
            spacing: default_spacing(),
            albedo: default_albedo(),
            ao: default_ao(),
            start_roughness: default_start_roughness(),
        }
    }
}

/// 相机配置
///
/// 相机绕焦点做水平圆周运动：位置 (r·cos a, h, r·sin a)，a = speed·t。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "default_orbit_radius")]
    pub orbit_radius: f32,

    #[serde(default = "default_orbit_height")]
    pub orbit_height: f32,

    /// 角速度（弧度/秒）
    #[serde(default = "default_orbit_speed")]
    pub orbit_speed: f32,

    #[serde(default = "default_focus")]
    pub focus: [f32; 3],

    /// 视野角度（Field of View，度数）
    #[serde(default = "default_fov")]
    pub fov: f32,

    /// 近裁剪面距离
    #[serde(default = "default_near_clip")]
    pub near_clip: f32,

    /// 远裁剪面距离
    #[serde(default = "default_far_clip")]
    pub far_clip: f32,
}

fn default_orbit_radius() -> f32 { 12.0 }
fn default_orbit_height() -> f32 { 6.0 }
fn default_orbit_speed() -> f32 { 0.25 }
fn default_focus() -> [f32; 3] { [0.0, 0.0, 0.0] }
fn default_fov() -> f32 { 60.0 }
fn default_near_clip() -> f32 { 0.1 }
fn default_far_clip() -> f32 { 100.0 }

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            orbit_radius: default_orbit_radius(),
            orbit_height: default_orbit_height(),
            orbit_speed: default_orbit_speed(),
            focus: default_focus(),
            fov: default_fov(),
            near_clip: default_near_clip(),
            far_clip: default_far_clip(),
        }
    }
}

/// 点光源配置
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLightConfig {
    pub position: [f32; 3],
    /// 线性空间辐射强度（未归一化）
    pub color: [f32; 3],
}

fn default_lights() -> Vec<PointLightConfig> {
    [[-10.0, 10.0], [10.0, 10.0], [-10.0, -10.0], [10.0, -10.0]]
        .into_iter()
        .map(|[x, y]| PointLightConfig {
            position: [x, y, -10.0],
            color: [300.0, 300.0, 300.0],
        })
        .collect()
}

/// 场景配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneConfig {
    #[serde(default)]
    pub environment: EnvironmentConfig,

    #[serde(default)]
    pub meshes: MeshesConfig,

    #[serde(default)]
    pub grid: GridConfig,

    #[serde(default)]
    pub camera: CameraConfig,

    #[serde(default = "default_lights")]
    pub lights: Vec<PointLightConfig>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            environment: EnvironmentConfig::default(),
            meshes: MeshesConfig::default(),
            grid: GridConfig::default(),
            camera: CameraConfig::default(),
            lights: default_lights(),
        }
    }
}

impl SceneConfig {
    /// 从文件加载场景配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| IblRenderError::Config(ConfigError::FileNotFound(format!(
                "Failed to read scene config file '{}': {}",
                path.display(),
                e
            ))))?;

        Self::from_toml_str(&contents)
    }

    /// 从 TOML 字符串解析场景配置
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| IblRenderError::Config(ConfigError::ParseError(format!(
                "Failed to parse scene config: {}",
                e
            ))))
    }

    /// 从文件加载，如果文件不存在或无法解析则返回默认配置
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if path.exists() {
            match Self::from_file(path) {
                Ok(config) => {
                    tracing::info!("Loaded scene config from: {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to load scene config: {}, using defaults", e);
                    Self::default()
                }
            }
        } else {
            tracing::info!("Scene config not found, using defaults");
            Self::default()
        }
    }

    /// 校验场景参数
    pub fn validate(&self) -> Result<()> {
        let env = &self.environment;

        for (field, size) in [
            ("environment.cube_resolution", env.cube_resolution),
            ("environment.irradiance_resolution", env.irradiance_resolution),
            ("environment.prefiltered_resolution", env.prefiltered_resolution),
            ("environment.brdf_lut_resolution", env.brdf_lut_resolution),
        ] {
            if !size.is_power_of_two() {
                return Err(invalid(field, format!("{} is not a power of two", size)));
            }
        }

        // 环境图和辐照度图需要生成完整 mip 链，至少两级
        for (field, size) in [
            ("environment.cube_resolution", env.cube_resolution),
            ("environment.irradiance_resolution", env.irradiance_resolution),
        ] {
            if size < 2 {
                return Err(invalid(field, format!("{} is too small for a mip chain, expected >= 2", size)));
            }
        }

        let max_levels = crate::math::mip_level_count(env.prefiltered_resolution);
        if env.prefiltered_mip_levels == 0 || env.prefiltered_mip_levels > max_levels {
            return Err(invalid(
                "environment.prefiltered_mip_levels",
                format!("must be in 1..={} for a {}px cube", max_levels, env.prefiltered_resolution),
            ));
        }

        if self.grid.rows == 0 || self.grid.columns == 0 {
            return Err(invalid("grid.rows/columns", "grid must contain at least one sphere".to_string()));
        }

        if self.lights.len() > MAX_LIGHTS {
            return Err(invalid(
                "lights",
                format!("at most {} point lights are supported, got {}", MAX_LIGHTS, self.lights.len()),
            ));
        }

        let camera = &self.camera;
        if camera.near_clip <= 0.0 || camera.far_clip <= camera.near_clip {
            return Err(invalid("camera.near_clip/far_clip", "expected 0 < near < far".to_string()));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: String) -> IblRenderError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason,
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scene() {
        let scene = SceneConfig::default();
        assert_eq!(scene.environment.cube_resolution, 512);
        assert_eq!(scene.environment.irradiance_resolution, 64);
        assert_eq!(scene.environment.prefiltered_resolution, 256);
        assert_eq!(scene.environment.prefiltered_mip_levels, 6);
        assert_eq!(scene.grid.rows, 5);
        assert_eq!(scene.grid.columns, 7);
        assert_eq!(scene.lights.len(), 4);
        assert_eq!(scene.lights[0].position, [-10.0, 10.0, -10.0]);
        assert!(scene.validate().is_ok());
    }

    #[test]
    fn test_default_camera() {
        let camera = CameraConfig::default();
        assert_eq!(camera.fov, 60.0);
        assert_eq!(camera.near_clip, 0.1);
        assert_eq!(camera.far_clip, 100.0);
        assert_eq!(camera.orbit_radius, 12.0);
    }

    #[test]
    fn test_partial_scene_toml() {
        let scene = SceneConfig::from_toml_str(
            "[grid]\nrows = 2\n\n[[lights]]\nposition = [0.0, 5.0, 0.0]\ncolor = [10.0, 10.0, 10.0]\n",
        )
        .unwrap();

        assert_eq!(scene.grid.rows, 2);
        assert_eq!(scene.grid.columns, 7);
        assert_eq!(scene.lights.len(), 1);
        assert_eq!(scene.environment.hdr_path, "assets/textures/newport_loft.hdr");
    }

    #[test]
    fn test_validation_rejects_bad_resolutions() {
        let mut scene = SceneConfig::default();
        scene.environment.cube_resolution = 500;
        assert!(scene.validate().is_err());

        let mut scene = SceneConfig::default();
        scene.environment.prefiltered_mip_levels = 10;
        assert!(scene.validate().is_err());

        let mut scene = SceneConfig::default();
        scene.environment.prefiltered_mip_levels = 9;
        assert!(scene.validate().is_ok());
    }

    #[test]
    fn test_validation_requires_mip_chain() {
        let mut scene = SceneConfig::default();
        scene.environment.irradiance_resolution = 1;
        assert!(scene.validate().is_err());

        let mut scene = SceneConfig::default();
        scene.environment.cube_resolution = 1;
        assert!(scene.validate().is_err());

        // 两级是最小的可生成 mip 链
        let mut scene = SceneConfig::default();
        scene.environment.irradiance_resolution = 2;
        assert!(scene.validate().is_ok());
        assert!(crate::renderer::mipmap::validate_mip_source(2, 2, crate::math::mip_level_count(2)).is_ok());

        // 预过滤图逐级渲染，不生成 mip，1 像素可用
        let mut scene = SceneConfig::default();
        scene.environment.prefiltered_resolution = 1;
        scene.environment.prefiltered_mip_levels = 1;
        assert!(scene.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_too_many_lights() {
        let mut scene = SceneConfig::default();
        scene.lights.push(scene.lights[0]);
        assert!(scene.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_empty_grid() {
        let mut scene = SceneConfig::default();
        scene.grid.columns = 0;
        assert!(scene.validate().is_err());
    }
}
