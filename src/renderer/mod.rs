//! 渲染器模块
//!
//! `DemoRenderer` 持有图形上下文以及场景所需的全部 GPU 资源：
//!
//! - 初始化：管线、合并的静态网格、球体阵列、IBL 预计算、MSAA 目标和 UI
//! - `update`：帧统计、相机环绕、把 UI 参数同步到场景
//! - `draw`：每帧常量 → 描述符表 → 球体 → 天空盒 → UI → 提交并呈现
//!
//! 着色器相关的子模块：
//!
//! - `shaders`：内嵌的 WGSL 源码
//! - `constants`：与着色器共享的常量布局
//! - `pipelines`：按 [`PipelineKind`] 索引的管线状态
//! - `mipmap`：基于渲染通道的 mip 链生成
//! - `targets`：多重采样颜色与深度目标
//! - `buffers`：合并后的顶点/索引缓冲

pub mod buffers;
pub mod constants;
pub mod mipmap;
pub mod pipelines;
pub mod shaders;
pub mod targets;

pub use buffers::MeshBuffers;
pub use constants::{PerDrawConstants, PerFrameConstants};
pub use mipmap::MipmapGenerator;
pub use pipelines::{PipelineKind, Pipelines, HDR_FORMAT};
pub use targets::RenderTargets;

use std::path::Path;

use tracing::debug;
use winit::window::Window;

use crate::component::{build_sphere_grid, OrbitCamera, PointLight, StaticMeshInstance};
use crate::core::error::Result;
use crate::core::{Config, SceneConfig};
use crate::engine_info;
use crate::geometry::{load_mesh_or_else, primitives, MeshBatch, StaticMesh};
use crate::gfx::{GraphicsContext, HeapUsage};
use crate::gui::{GuiManager, GuiState};
use crate::ibl::EnvironmentMaps;
use crate::math::{matrix, Matrix4};

/// 程序化球体的细分
const SPHERE_RINGS: u32 = 32;
const SPHERE_SEGMENTS: u32 = 64;

/// 场景渲染器
pub struct DemoRenderer {
    ctx: GraphicsContext,
    pipelines: Pipelines,
    meshes: MeshBuffers,
    /// 天空盒使用的立方体
    sky_mesh: StaticMesh,
    instances: Vec<StaticMeshInstance>,
    lights: Vec<PointLight>,
    camera: OrbitCamera,
    environment: EnvironmentMaps,
    targets: RenderTargets,
    gui: GuiManager,
    /// 上一帧提交时的堆占用
    last_heap_usage: HeapUsage,
}

impl DemoRenderer {
    /// 创建渲染器并完成 IBL 预计算
    pub fn new(mut ctx: GraphicsContext, config: &Config, scene: &SceneConfig) -> Result<Self> {
        engine_info!("Initializing renderer");

        // 1. 管线
        debug!("Creating pipelines");
        let pipelines = Pipelines::new(&ctx.device, ctx.surface_format(), ctx.msaa_samples());
        let mipmaps = MipmapGenerator::new(&ctx.device, &[HDR_FORMAT]);

        // 2. 网格：立方体在前，球体在后
        let cube = load_mesh_or_else(Path::new(&scene.meshes.cube), primitives::cube)?;
        let sphere = load_mesh_or_else(Path::new(&scene.meshes.sphere), || {
            primitives::uv_sphere(SPHERE_RINGS, SPHERE_SEGMENTS)
        })?;
        let mut batch = MeshBatch::default();
        let cube_index = batch.push(&cube);
        let sphere_index = batch.push(&sphere);
        let sky_mesh = batch.meshes[cube_index];

        // 3. 球体阵列
        let instances = build_sphere_grid(&scene.grid, sphere_index);
        engine_info!(
            spheres = instances.len(),
            rows = scene.grid.rows,
            columns = scene.grid.columns,
            "Built sphere grid"
        );

        // 4. 静态顶点/索引缓冲
        let meshes = MeshBuffers::new(&ctx.device, &batch);

        // 5. IBL 预计算
        let environment = EnvironmentMaps::precompute(
            &mut ctx,
            &pipelines,
            &mipmaps,
            &meshes,
            &sky_mesh,
            &scene.environment,
        )?;

        // 6. MSAA 目标
        let (width, height) = ctx.size();
        let targets = RenderTargets::new(
            &ctx.device,
            ctx.surface_format(),
            width,
            height,
            ctx.msaa_samples(),
        );

        // 7. UI
        let mut gui_state = GuiState::new(config, scene);
        gui_state.environment = Some(environment.summary());
        let gui = GuiManager::new(&ctx, gui_state, config.window.title.clone());

        let lights = scene.lights.iter().map(PointLight::from).collect();
        let camera = OrbitCamera::from_config(&scene.camera);

        engine_info!("Renderer initialized");

        Ok(Self {
            ctx,
            pipelines,
            meshes,
            sky_mesh,
            instances,
            lights,
            camera,
            environment,
            targets,
            gui,
            last_heap_usage: HeapUsage::default(),
        })
    }

    pub fn window(&self) -> &Window {
        self.ctx.window()
    }

    /// 把窗口事件交给 UI，返回是否被消费
    pub fn handle_gui_event(&mut self, event: &winit::event::WindowEvent) -> bool {
        self.gui.handle_event(self.ctx.window(), event)
    }

    /// 更新帧统计、UI 和相机
    ///
    /// # 参数
    ///
    /// * `total_time` - 启动以来的秒数
    /// * `delta_time` - 距上一帧的秒数
    pub fn update(&mut self, total_time: f32, delta_time: f32) {
        self.gui.state_mut().heap_usage = self.last_heap_usage;
        self.gui.update(self.ctx.window(), total_time);

        let state = self.gui.state();
        self.camera.paused = state.camera_paused;
        self.camera.speed = state.camera_speed;
        self.camera.radius = state.camera_radius;
        self.camera.height = state.camera_height;
        self.camera.update(delta_time);
    }

    /// 绘制一帧
    pub fn draw(&mut self) -> Result<()> {
        // 1. 获取交换链图像
        let Some(frame) = self.ctx.acquire()? else {
            self.gui.skip_frame(self.ctx.window());
            return Ok(());
        };
        let back_buffer = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let state = self.gui.state();
        let albedo = state.albedo;
        let ao = state.ao;
        let light_intensity = state.light_intensity;
        let env_intensity = state.effective_env_intensity();
        let sky_intensity = state.skybox_intensity();

        let view = self.camera.view_matrix();
        let projection = self.camera.projection_matrix(self.ctx.aspect_ratio());
        let view_projection = projection * view;

        // 2. 每帧常量
        let per_frame = PerFrameConstants::new(
            &self.lights,
            light_intensity,
            &self.camera.position(),
            env_intensity,
            self.environment.max_reflection_lod(),
        );
        let per_frame_offset = self.ctx.upload_heap_mut().push(&per_frame)?;

        // 3. 本帧的描述符表
        let layouts = &self.pipelines.layouts;
        let sampler = &self.pipelines.linear_sampler;
        let lighting = layouts.lighting_bind_group(
            &self.ctx.device,
            self.ctx.upload_buffer(),
            self.environment.irradiance_map.cube_view(),
            self.environment.prefiltered_map.cube_view(),
            self.environment.brdf_lut_view(),
            sampler,
        );
        let lighting = self.ctx.gpu_descriptor_heap_mut().allocate(lighting)?;
        let per_draw = layouts.per_draw_bind_group(&self.ctx.device, self.ctx.upload_buffer());
        let per_draw = self.ctx.gpu_descriptor_heap_mut().allocate(per_draw)?;
        let sky_table = layouts.source_bind_group(
            &self.ctx.device,
            true,
            self.environment.env_map.cube_view(),
            sampler,
        );
        let sky_table = self.ctx.gpu_descriptor_heap_mut().allocate(sky_table)?;

        // 4. 每个球体的常量
        let mut draws = Vec::with_capacity(self.instances.len());
        for instance in &self.instances {
            let world = instance.object_to_world();
            let constants = PerDrawConstants::new(&(view_projection * world), &world).with_material(
                albedo,
                instance.metallic,
                instance.roughness,
                ao,
            );
            draws.push((instance.mesh_index, self.ctx.upload_heap_mut().push(&constants)?));
        }

        // 5. 天空盒：去掉视图矩阵的平移
        let sky_to_clip = projection * matrix::view_without_translation(&view);
        let sky = PerDrawConstants::new(&sky_to_clip, &Matrix4::identity())
            .with_material([sky_intensity; 3], 0.0, 0.0, 1.0);
        let sky_offset = self.ctx.upload_heap_mut().push(&sky)?;

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let heap = self.ctx.gpu_descriptor_heap();
            let per_draw = heap.get(per_draw)?;
            let lighting = heap.get(lighting)?;
            let sky_table = heap.get(sky_table)?;
            let color = self.targets.scene_color(&back_buffer);

            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color.view,
                    resolve_target: color.resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.targets.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.meshes.bind(&mut render_pass);

            render_pass.set_pipeline(&self.pipelines[PipelineKind::SimpleForward]);
            render_pass.set_bind_group(1, lighting, &[per_frame_offset as u32]);
            for (mesh_index, offset) in &draws {
                let Some(mesh) = self.meshes.mesh(*mesh_index) else {
                    continue;
                };
                render_pass.set_bind_group(0, per_draw, &[*offset as u32]);
                MeshBuffers::draw(&mut render_pass, mesh);
            }

            render_pass.set_pipeline(&self.pipelines[PipelineKind::SampleEnvMap]);
            render_pass.set_bind_group(0, per_draw, &[sky_offset as u32]);
            render_pass.set_bind_group(1, sky_table, &[]);
            MeshBuffers::draw(&mut render_pass, &self.sky_mesh);
        }

        // 6. UI，多重采样时在这里解析到交换链图像
        let gui_buffers = self
            .gui
            .render(&self.ctx, &mut encoder, self.targets.final_color(&back_buffer));

        // 7. 提交并呈现
        self.last_heap_usage = self.ctx.heap_usage();
        self.ctx
            .submit(gui_buffers.into_iter().chain(std::iter::once(encoder.finish())));
        self.ctx.present_frame(frame);

        Ok(())
    }

    /// 处理窗口大小调整
    pub fn resize(&mut self, width: u32, height: u32) {
        if !self.ctx.resize(width, height) {
            return;
        }
        self.targets.resize(&self.ctx.device, width, height);
    }

    /// 阻塞直到 GPU 空闲（退出前调用）
    pub fn wait_for_gpu(&mut self) {
        self.ctx.wait_for_gpu();
    }
}
