//! 场景对象模块
//!
//! 演示场景只包含三类对象：环绕相机、点光源和静态网格实例。
//! 它们都是纯 CPU 数据，每帧由渲染器转换为常量缓冲。

mod camera;
mod instance;
mod light;

pub use camera::OrbitCamera;
pub use instance::{build_sphere_grid, StaticMeshInstance};
pub use light::{Color, PointLight};
