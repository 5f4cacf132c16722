//! 相机面板

use egui;
use crate::gui::state::GuiState;

/// 渲染相机面板
pub fn render(ui: &mut egui::Ui, state: &mut GuiState) {
    ui.collapsing("相机", |ui| {
        ui.checkbox(&mut state.camera_paused, "暂停环绕");
        ui.add(egui::Slider::new(&mut state.camera_speed, -2.0..=2.0).text("角速度 (rad/s)"));
        ui.add(egui::Slider::new(&mut state.camera_radius, 2.0..=40.0).text("半径"));
        ui.add(egui::Slider::new(&mut state.camera_height, -20.0..=20.0).text("高度"));
    });
}
