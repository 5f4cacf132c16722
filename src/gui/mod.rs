//! GUI 系统模块
//!
//! 基于 egui + egui-winit + egui-wgpu 的调试界面。
//! 面板只修改 [`GuiState`]，渲染器每帧读取它。

mod manager;
mod state;
mod metrics;
pub mod panels;

pub use manager::GuiManager;
pub use metrics::PerformanceMetrics;
pub use state::GuiState;
