//! GUI 面板模块
//!
//! 每个面板是一个 `render(ui, state)` 函数，由 `GuiManager` 依次调用。

pub mod performance;
pub mod camera;
pub mod material;
pub mod lighting;
pub mod environment;
