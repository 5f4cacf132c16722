//! GUI 管理器
//!
//! GuiManager 集成 egui 和 wgpu：处理输入事件，每帧构建面板，
//! 并在场景之后把 UI 画进多重采样目标。

use egui;
use egui_wgpu::Renderer as EguiRenderer;
use egui_winit::State as EguiState;
use winit::window::Window;

use crate::gfx::GraphicsContext;
use crate::gui::metrics::PerformanceMetrics;
use crate::gui::panels;
use crate::gui::state::GuiState;
use crate::renderer::targets::ColorAttachment;

/// egui 帧的开始/结束配对
///
/// 跳过绘制的帧也必须结束，否则下一次 `begin_frame` 会叠加在未完成的帧上。
struct UiFrame {
    context: egui::Context,
    open: bool,
}

impl UiFrame {
    fn new(context: egui::Context) -> Self {
        Self {
            context,
            open: false,
        }
    }

    /// 开始新的一帧，上一帧若未结束则先丢弃
    fn begin(&mut self, raw_input: egui::RawInput) {
        if self.open {
            let _ = self.context.end_frame();
        }
        self.context.begin_frame(raw_input);
        self.open = true;
    }

    /// 结束当前帧，没有进行中的帧时返回 None
    fn end(&mut self) -> Option<egui::FullOutput> {
        if !self.open {
            return None;
        }
        self.open = false;
        Some(self.context.end_frame())
    }
}

/// GUI 管理器（使用 egui + wgpu）
pub struct GuiManager {
    // egui 核心组件
    frame: UiFrame,
    state: EguiState,
    renderer: EguiRenderer,

    // GUI 状态和统计
    gui_state: GuiState,
    metrics: PerformanceMetrics,
    base_title: String,
}

impl GuiManager {
    /// 创建 GUI 管理器
    ///
    /// egui 渲染器与场景使用相同的颜色格式和采样数，
    /// 这样 UI 通道可以直接接在场景通道之后并负责解析。
    pub fn new(ctx: &GraphicsContext, mut gui_state: GuiState, base_title: impl Into<String>) -> Self {
        let context = egui::Context::default();

        let window = ctx.window();
        let state = EguiState::new(
            context.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
        );

        let renderer = EguiRenderer::new(&ctx.device, ctx.surface_format(), None, ctx.msaa_samples());

        let adapter = ctx.adapter_info();
        gui_state.adapter_name = adapter.name;
        gui_state.backend = format!("{:?}", adapter.backend);
        gui_state.msaa_samples = ctx.msaa_samples();

        Self {
            frame: UiFrame::new(context),
            state,
            renderer,
            gui_state,
            metrics: PerformanceMetrics::new(),
            base_title: base_title.into(),
        }
    }

    /// 处理输入事件
    /// 返回 true 如果事件被 GUI 消费
    pub fn handle_event(&mut self, window: &Window, event: &winit::event::WindowEvent) -> bool {
        self.state.on_window_event(window, event).consumed
    }

    /// 更新帧统计并构建 UI
    ///
    /// 帧统计每秒刷新一次窗口标题。
    pub fn update(&mut self, window: &Window, total_time: f32) {
        if self.metrics.record_frame(total_time) {
            self.gui_state
                .update_performance(self.metrics.fps(), self.metrics.frame_time_ms());
            window.set_title(&self.metrics.window_title(&self.base_title));
        }

        let raw_input = self.state.take_egui_input(window);
        self.frame.begin(raw_input);

        let context = self.frame.context.clone();
        egui::SidePanel::left("control_panel")
            .default_width(300.0)
            .show(&context, |ui| {
                ui.heading("ImageBasedPBR");
                ui.separator();

                panels::performance::render(ui, &self.gui_state);
                ui.separator();

                panels::camera::render(ui, &mut self.gui_state);
                ui.separator();

                panels::material::render(ui, &mut self.gui_state);
                ui.separator();

                panels::lighting::render(ui, &mut self.gui_state);
                ui.separator();

                panels::environment::render(ui, &self.gui_state);
            });
    }

    /// 把 UI 录制到 `target`，返回需要先于主编码器提交的命令缓冲
    pub fn render(
        &mut self,
        ctx: &GraphicsContext,
        encoder: &mut wgpu::CommandEncoder,
        target: ColorAttachment<'_>,
    ) -> Vec<wgpu::CommandBuffer> {
        let Some(full_output) = self.frame.end() else {
            return Vec::new();
        };

        // 处理平台输出（光标、复制粘贴等）
        self.state
            .handle_platform_output(ctx.window(), full_output.platform_output);

        let paint_jobs = self
            .frame
            .context
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let (width, height) = ctx.size();
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [width, height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.renderer
                .update_texture(&ctx.device, &ctx.queue, *id, image_delta);
        }

        let command_buffers = self.renderer.update_buffers(
            &ctx.device,
            &ctx.queue,
            encoder,
            &paint_jobs,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("GUI Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target.view,
                    resolve_target: target.resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load, // 保留场景渲染结果
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.renderer
                .render(&mut render_pass, &paint_jobs, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.renderer.free_texture(id);
        }

        command_buffers
    }

    /// 本帧不绘制（例如交换链图像不可用）时结束已开始的 UI 帧
    pub fn skip_frame(&mut self, window: &Window) {
        if let Some(full_output) = self.frame.end() {
            self.state
                .handle_platform_output(window, full_output.platform_output);
        }
    }

    /// 获取 GUI 状态引用
    pub fn state(&self) -> &GuiState {
        &self.gui_state
    }

    /// 获取 GUI 状态可变引用
    pub fn state_mut(&mut self) -> &mut GuiState {
        &mut self.gui_state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_ends_once() {
        let mut frame = UiFrame::new(egui::Context::default());
        assert!(frame.end().is_none());

        frame.begin(egui::RawInput::default());
        assert!(frame.end().is_some());
        assert!(frame.end().is_none());
    }

    #[test]
    fn test_unfinished_frame_is_closed_before_next() {
        let mut frame = UiFrame::new(egui::Context::default());
        frame.begin(egui::RawInput::default());
        // 上一帧跳过了绘制
        frame.begin(egui::RawInput::default());
        assert!(frame.end().is_some());
        assert!(frame.end().is_none());
    }
}
