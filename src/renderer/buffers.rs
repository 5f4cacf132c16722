//! 静态顶点/索引缓冲
//!
//! 所有网格合并进同一对缓冲，每个网格用 [`StaticMesh`] 记录自己的绘制范围。

use tracing::debug;
use wgpu::util::DeviceExt;

use crate::geometry::{MeshBatch, StaticMesh};

pub struct MeshBuffers {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    meshes: Vec<StaticMesh>,
}

impl MeshBuffers {
    /// 上传合并后的网格数据
    pub fn new(device: &wgpu::Device, batch: &MeshBatch) -> Self {
        debug!(
            vertices = batch.vertices.len(),
            indices = batch.indices.len(),
            "Creating static vertex and index buffers"
        );

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Static Vertex Buffer"),
            contents: bytemuck::cast_slice(&batch.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Static Index Buffer"),
            contents: bytemuck::cast_slice(&batch.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            meshes: batch.meshes.clone(),
        }
    }

    pub fn mesh(&self, index: usize) -> Option<&StaticMesh> {
        self.meshes.get(index)
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// 绑定顶点和索引缓冲
    pub fn bind<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
    }

    /// 绘制一个网格
    pub fn draw(pass: &mut wgpu::RenderPass<'_>, mesh: &StaticMesh) {
        pass.draw_indexed(mesh.index_range(), mesh.base_vertex_location, 0..1);
    }
}
