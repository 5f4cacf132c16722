//! 环境贴图面板
//!
//! 显示预计算贴图的来源、分辨率和 mip 数量。

use egui;
use crate::gui::state::GuiState;
use crate::ibl::mip_chain;

/// 渲染环境贴图面板
pub fn render(ui: &mut egui::Ui, state: &GuiState) {
    ui.collapsing("环境贴图", |ui| {
        let Some(env) = &state.environment else {
            ui.label("尚未生成");
            return;
        };

        ui.label(format!("来源: {}", env.source));
        egui::Grid::new("environment_maps").striped(true).show(ui, |ui| {
            ui.label("贴图");
            ui.label("分辨率");
            ui.label("Mip");
            ui.end_row();

            for (name, resolution, mips) in [
                ("环境", env.env_resolution, env.env_mips),
                ("辐照度", env.irradiance_resolution, env.irradiance_mips),
                ("预过滤", env.prefiltered_resolution, env.prefiltered_mips),
                ("BRDF LUT", env.brdf_lut_resolution, 1),
            ] {
                ui.label(name);
                ui.label(format!("{0}x{0}", resolution));
                ui.label(mips.to_string());
                ui.end_row();
            }
        });

        let chain = mip_chain(env.prefiltered_resolution, env.prefiltered_mips);
        ui.label(format!("预过滤 mip 链: {:?}", chain));
    });
}
