//! ImageBasedPBR 演示程序
//!
//! # 使用方法
//!
//! ```bash
//! # 使用配置文件
//! cargo run --release
//!
//! # 指定后端和采样数（命令行覆盖）
//! cargo run --release -- --vulkan --msaa 4
//!
//! # 把最终生效的配置写回文件
//! cargo run --release -- --save-config config.toml
//! ```

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use tracing::{debug, error, info};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::EventLoop;
use winit::keyboard::{Key, NamedKey};
use winit::window::WindowBuilder;

use ibl_render::core::{log, Config, SceneConfig};
use ibl_render::engine_info;
use ibl_render::gfx::GraphicsContext;
use ibl_render::renderer::DemoRenderer;

/// 应用程序入口点
///
/// # 初始化流程
///
/// 1. 加载引擎配置（config.toml）并应用命令行参数
/// 2. 初始化日志系统
/// 3. 加载场景配置（scene.toml）
/// 4. 创建窗口、图形上下文和渲染器
/// 5. 启动主循环
///
/// # 事件处理
///
/// - `CloseRequested` / Escape：退出
/// - `Resized`：重建交换链和 MSAA 目标
/// - `AboutToWait`：请求重绘
/// - `RedrawRequested`：更新并绘制一帧
fn main() -> anyhow::Result<()> {
    // 1. 加载配置（在初始化日志之前）
    let mut config = Config::from_file_or_default("config.toml");
    let args: Vec<String> = std::env::args().collect();
    config.apply_args(&args);
    config.validate().context("Invalid configuration")?;

    if let Some(path) = args
        .iter()
        .position(|a| a == "--save-config")
        .and_then(|i| args.get(i + 1))
    {
        config
            .save_to_file(path)
            .with_context(|| format!("Failed to save config to {}", path))?;
    }

    // 2. 初始化日志系统
    let log_file = config
        .logging
        .file_output
        .then_some(config.logging.log_file.as_str());
    log::init_logger(config.logging.level, config.logging.file_output, log_file)?;
    engine_info!(version = env!("CARGO_PKG_VERSION"), "ImageBasedPBR starting...");

    // 3. 加载场景配置
    let scene = SceneConfig::from_file_or_default("scene.toml");
    scene.validate().context("Invalid scene")?;

    info!(
        backend = config.graphics.backend.name(),
        width = config.window.width,
        height = config.window.height,
        msaa = config.graphics.msaa_samples,
        "Graphics configuration"
    );
    info!(
        hdr = %scene.environment.hdr_path,
        spheres = scene.grid.rows * scene.grid.columns,
        lights = scene.lights.len(),
        "Scene configuration"
    );

    // 4. 创建窗口和渲染器
    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window.title.as_str())
            .with_inner_size(PhysicalSize::new(config.window.width, config.window.height))
            .with_resizable(config.window.resizable)
            .build(&event_loop)?,
    );

    let ctx = GraphicsContext::new(window, &config)?;
    let mut renderer = DemoRenderer::new(ctx, &config, &scene)?;
    info!("Entering main loop...");

    // 5. 主循环
    let start = Instant::now();
    let mut last_frame = start;

    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { event, .. } => {
            if renderer.handle_gui_event(&event) {
                return;
            }

            match event {
                WindowEvent::CloseRequested
                | WindowEvent::KeyboardInput {
                    event:
                        KeyEvent {
                            logical_key: Key::Named(NamedKey::Escape),
                            state: ElementState::Pressed,
                            ..
                        },
                    ..
                } => {
                    info!("Close requested, shutting down...");
                    elwt.exit();
                }
                WindowEvent::Resized(new_size) => {
                    debug!(width = new_size.width, height = new_size.height, "Window resized");
                    renderer.resize(new_size.width, new_size.height);
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let total_time = now.duration_since(start).as_secs_f32();
                    let delta_time = now.duration_since(last_frame).as_secs_f32();
                    last_frame = now;

                    renderer.update(total_time, delta_time);
                    if let Err(e) = renderer.draw() {
                        error!("Draw failed: {}", e);
                        elwt.exit();
                    }
                }
                _ => (),
            }
        }
        Event::AboutToWait => renderer.window().request_redraw(),
        Event::LoopExiting => renderer.wait_for_gpu(),
        _ => (),
    })?;

    Ok(())
}
