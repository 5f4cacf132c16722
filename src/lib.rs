//! ImageBasedPBR - 基于图像光照的 PBR 渲染演示
//!
//! 从一张等距柱状 HDR 环境图出发，启动时在 GPU 上预计算
//! 环境立方体贴图、辐照度贴图、预过滤贴图和 BRDF 查找表，
//! 然后用 Cook-Torrance 点光源 + 分离和近似的 IBL 渲染一组
//! 金属度/粗糙度渐变的球体，背景为环境天空盒。
//!
//! # 模块结构
//!
//! - `core`: 配置、场景描述、日志和错误处理
//! - `math`: 左手坐标系的矩阵与工具函数
//! - `geometry`: 顶点格式、网格合并、PLY/OBJ 加载器和程序化网格
//! - `component`: 环绕相机、点光源和静态网格实例
//! - `gfx`: wgpu 设备、每帧上传堆、描述符堆和帧同步
//! - `ibl`: 环境贴图预计算
//! - `renderer`: 管线、渲染目标和每帧绘制
//! - `gui`: egui 调试面板
//!
//! # 使用示例
//!
//! ```no_run
//! use ibl_render::component::build_sphere_grid;
//! use ibl_render::core::SceneConfig;
//!
//! let scene = SceneConfig::from_file_or_default("scene.toml");
//! let spheres = build_sphere_grid(&scene.grid, 1);
//! println!("{} spheres", spheres.len());
//! ```

pub mod core;
pub mod math;
pub mod geometry;
pub mod component;
pub mod gfx;
pub mod ibl;
pub mod renderer;
pub mod gui;
