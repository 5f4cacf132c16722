//! 材质面板
//!
//! 金属度和粗糙度由球体在阵列中的位置决定，这里只调整共享的反照率和 AO。

use egui;
use crate::gui::state::GuiState;

/// 渲染材质面板
pub fn render(ui: &mut egui::Ui, state: &mut GuiState) {
    ui.collapsing("材质", |ui| {
        ui.horizontal(|ui| {
            ui.label("反照率");
            ui.color_edit_button_rgb(&mut state.albedo);
        });
        ui.add(egui::Slider::new(&mut state.ao, 0.0..=1.0).text("环境光遮蔽"));
    });
}
