//! 光照面板

use egui;
use crate::gui::state::GuiState;

/// 渲染光照面板
pub fn render(ui: &mut egui::Ui, state: &mut GuiState) {
    ui.collapsing("光照", |ui| {
        ui.add(egui::Slider::new(&mut state.light_intensity, 0.0..=5.0).text("点光源强度"));
        ui.separator();

        ui.checkbox(&mut state.ibl_enabled, "基于图像的光照");
        ui.add_enabled(
            state.ibl_enabled || state.skybox_enabled,
            egui::Slider::new(&mut state.env_intensity, 0.0..=4.0).text("环境光强度"),
        );
        ui.checkbox(&mut state.skybox_enabled, "天空盒");
    });
}
