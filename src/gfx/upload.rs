//! 每帧上传堆
//!
//! 常量数据以 256 字节对齐的方式线性追加到 CPU 暂存区，
//! 提交前一次性写入同等大小的 GPU uniform 缓冲，
//! 绘制时通过动态偏移引用各自的常量块。
//!
//! 每个帧槽位拥有独立的上传堆，只有在该槽位的 GPU 工作完成后才会被重置。

use bytemuck::Pod;

use crate::core::error::{GraphicsError, Result};

/// 常量缓冲区对齐（与 D3D12 的 CBV 对齐和 wgpu 的动态偏移对齐一致）
pub const UPLOAD_ALIGNMENT: u64 = 256;

/// 每个上传堆的默认容量
pub const UPLOAD_HEAP_CAPACITY: u64 = 8 * 1024 * 1024;

/// 向上对齐到 [`UPLOAD_ALIGNMENT`]
#[inline]
pub fn align_to_upload(size: u64) -> u64 {
    (size + UPLOAD_ALIGNMENT - 1) & !(UPLOAD_ALIGNMENT - 1)
}

/// CPU 侧线性分配器
pub struct UploadHeap {
    name: &'static str,
    data: Vec<u8>,
    size: u64,
}

impl UploadHeap {
    pub fn new(name: &'static str, capacity: u64) -> Self {
        Self {
            name,
            data: vec![0; capacity as usize],
            size: 0,
        }
    }

    /// 分配 `size` 字节（向上对齐到 256），返回字节偏移
    pub fn allocate(&mut self, size: u64) -> Result<u64> {
        let aligned = align_to_upload(size.max(1));
        let capacity = self.capacity();

        if self.size + aligned > capacity {
            return Err(GraphicsError::HeapExhausted {
                heap: self.name,
                requested: aligned,
                available: capacity - self.size,
            }
            .into());
        }

        let offset = self.size;
        self.size += aligned;
        Ok(offset)
    }

    /// 分配并写入一个值
    pub fn push<T: Pod>(&mut self, value: &T) -> Result<u64> {
        self.push_slice(std::slice::from_ref(value))
    }

    /// 分配并写入一段连续数据
    pub fn push_slice<T: Pod>(&mut self, values: &[T]) -> Result<u64> {
        let bytes: &[u8] = bytemuck::cast_slice(values);
        let offset = self.allocate(bytes.len() as u64)?;
        let start = offset as usize;
        self.data[start..start + bytes.len()].copy_from_slice(bytes);
        Ok(offset)
    }

    /// 清空（只能在 GPU 不再读取该帧数据后调用）
    pub fn reset(&mut self) {
        self.size = 0;
    }

    pub fn used(&self) -> u64 {
        self.size
    }

    pub fn capacity(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 已写入的字节
    pub fn bytes(&self) -> &[u8] {
        &self.data[..self.size as usize]
    }
}

/// 上传堆与对应的 GPU 缓冲
pub struct GpuUploadHeap {
    heap: UploadHeap,
    buffer: wgpu::Buffer,
}

impl GpuUploadHeap {
    pub fn new(device: &wgpu::Device, name: &'static str, capacity: u64) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(name),
            size: capacity,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            heap: UploadHeap::new(name, capacity),
            buffer,
        }
    }

    pub fn heap(&self) -> &UploadHeap {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut UploadHeap {
        &mut self.heap
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// 把已写入的范围复制到 GPU 缓冲
    ///
    /// `write_buffer` 在下一次 `submit` 之前生效。
    pub fn flush(&self, queue: &wgpu::Queue) {
        let bytes = self.heap.bytes();
        if !bytes.is_empty() {
            queue.write_buffer(&self.buffer, 0, bytes);
        }
    }

    pub fn reset(&mut self) {
        self.heap.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::IblRenderError;

    #[test]
    fn test_align_to_upload() {
        assert_eq!(align_to_upload(0), 0);
        assert_eq!(align_to_upload(1), 256);
        assert_eq!(align_to_upload(256), 256);
        assert_eq!(align_to_upload(300), 512);
    }

    #[test]
    fn test_offsets_are_aligned() {
        let mut heap = UploadHeap::new("test heap", 4096);
        let a = heap.allocate(16).unwrap();
        let b = heap.push_slice(&[1.0f32; 40]).unwrap();
        let c = heap.allocate(1).unwrap();

        assert_eq!(a, 0);
        assert_eq!(b, 256);
        assert_eq!(c, 512);
        assert!([a, b, c].iter().all(|o| o % UPLOAD_ALIGNMENT == 0));
        assert_eq!(heap.used(), 768);
    }

    #[test]
    fn test_push_writes_data() {
        let mut heap = UploadHeap::new("test heap", 1024);
        heap.allocate(4).unwrap();
        let offset = heap.push_slice(&[7u32, 8, 9]).unwrap() as usize;

        let written: &[u32] = bytemuck::cast_slice(&heap.bytes()[offset..offset + 12]);
        assert_eq!(written, &[7, 8, 9]);
    }

    #[test]
    fn test_exhaustion() {
        let mut heap = UploadHeap::new("test heap", 512);
        heap.allocate(256).unwrap();
        heap.allocate(200).unwrap();

        match heap.allocate(1) {
            Err(IblRenderError::Graphics(GraphicsError::HeapExhausted { requested, available, .. })) => {
                assert_eq!(requested, 256);
                assert_eq!(available, 0);
            }
            other => panic!("expected HeapExhausted, got {:?}", other.map(|_| ())),
        }
        // 失败的分配不改变状态
        assert_eq!(heap.used(), 512);
    }

    #[test]
    fn test_reset() {
        let mut heap = UploadHeap::new("test heap", 512);
        heap.allocate(512).unwrap();
        heap.reset();
        assert_eq!(heap.used(), 0);
        assert_eq!(heap.allocate(10).unwrap(), 0);
    }
}
