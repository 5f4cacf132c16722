//! 性能监控面板
//!
//! 显示 FPS、帧时间以及上传堆和描述符堆的占用。

use egui;
use crate::gfx::HeapUsage;
use crate::gui::state::GuiState;

/// 渲染性能面板
pub fn render(ui: &mut egui::Ui, state: &GuiState) {
    ui.collapsing("性能监控", |ui| {
        ui.label(format!("FPS: {:.1}", state.fps));
        ui.label(format!("帧时间: {:.3} ms", state.frame_time_ms));

        if state.frame_time_ms > 0.0 {
            let target_60fps = 1000.0 / 60.0;
            let color = if state.frame_time_ms <= target_60fps {
                egui::Color32::GREEN
            } else {
                egui::Color32::RED
            };

            ui.colored_label(color,
                if state.frame_time_ms <= target_60fps {
                    "✓ 性能良好"
                } else {
                    "⚠ 性能警告"
                }
            );
        }

        ui.separator();
        ui.label(format!("适配器: {}", state.adapter_name));
        ui.label(format!("后端: {}  MSAA: {}x", state.backend, state.msaa_samples));

        heap_usage(ui, &state.heap_usage);
    });
}

fn heap_usage(ui: &mut egui::Ui, usage: &HeapUsage) {
    let fraction = |used: u64, capacity: u64| {
        if capacity == 0 {
            0.0
        } else {
            used as f32 / capacity as f32
        }
    };

    ui.label("上传堆");
    ui.add(
        egui::ProgressBar::new(fraction(usage.upload_used, usage.upload_capacity))
            .text(format!("{} / {} KiB", usage.upload_used / 1024, usage.upload_capacity / 1024)),
    );

    for (name, stats) in [("GPU 描述符堆", &usage.gpu_descriptors), ("CPU 描述符堆", &usage.cpu_descriptors)] {
        ui.label(name);
        ui.add(
            egui::ProgressBar::new(fraction(stats.used as u64, stats.capacity as u64))
                .text(format!("{} / {} (峰值 {})", stats.used, stats.capacity, stats.high_water_mark)),
        );
    }
}
