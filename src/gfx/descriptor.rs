//! 描述符堆
//!
//! wgpu 中描述符表对应绑定组（`wgpu::BindGroup`）。这里保留线性堆的分配语义：
//! 绑定组按帧分配在有界的堆中，整帧结束后一起释放；也可以保存填充位置，
//! 在一段临时工作结束后回滚到该位置。
//!
//! 每个槽位记录分配时的纪元（epoch）。`reset` 与 `restore` 会递增堆的纪元，
//! 被释放槽位的旧句柄在查询时返回 `StaleDescriptor`，而不是静默地指向新内容；
//! 保存位置之前的描述符表不受 `restore` 影响。

use crate::core::error::{GraphicsError, Result};

/// 每个描述符堆的默认容量
pub const DESCRIPTOR_HEAP_CAPACITY: u32 = 10_000;

/// 堆中一个描述符表的句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorHandle {
    index: u32,
    epoch: u32,
}

impl DescriptorHandle {
    pub fn index(&self) -> u32 {
        self.index
    }
}

/// 堆的填充位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorHeapState {
    size: u32,
}

/// 堆的使用统计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DescriptorHeapStats {
    pub used: u32,
    pub capacity: u32,
    /// 自上次 reset 以来的最大占用
    pub high_water_mark: u32,
}

/// 有界线性描述符堆
pub struct DescriptorHeap<T> {
    name: &'static str,
    capacity: u32,
    entries: Vec<(u32, T)>,
    epoch: u32,
    high_water_mark: u32,
}

impl<T> DescriptorHeap<T> {
    pub fn new(name: &'static str, capacity: u32) -> Self {
        Self {
            name,
            capacity,
            entries: Vec::new(),
            epoch: 0,
            high_water_mark: 0,
        }
    }

    /// 分配一个描述符表
    pub fn allocate(&mut self, value: T) -> Result<DescriptorHandle> {
        let size = self.entries.len() as u32;
        if size >= self.capacity {
            return Err(GraphicsError::HeapExhausted {
                heap: self.name,
                requested: 1,
                available: 0,
            }
            .into());
        }

        self.entries.push((self.epoch, value));
        self.high_water_mark = self.high_water_mark.max(size + 1);

        Ok(DescriptorHandle {
            index: size,
            epoch: self.epoch,
        })
    }

    /// 查询描述符表
    pub fn get(&self, handle: DescriptorHandle) -> Result<&T> {
        match self.entries.get(handle.index as usize) {
            Some((epoch, value)) if *epoch == handle.epoch => Ok(value),
            _ => Err(GraphicsError::StaleDescriptor {
                heap: self.name,
                index: handle.index,
            }
            .into()),
        }
    }

    /// 保存当前填充位置
    pub fn state(&self) -> DescriptorHeapState {
        DescriptorHeapState {
            size: self.entries.len() as u32,
        }
    }

    /// 回滚到之前保存的位置，其后分配的描述符表被释放
    pub fn restore(&mut self, state: DescriptorHeapState) {
        debug_assert!(state.size <= self.entries.len() as u32);
        self.entries.truncate(state.size as usize);
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// 清空堆
    pub fn reset(&mut self) {
        self.entries.clear();
        self.epoch = self.epoch.wrapping_add(1);
        self.high_water_mark = 0;
    }

    pub fn len(&self) -> u32 {
        self.entries.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn stats(&self) -> DescriptorHeapStats {
        DescriptorHeapStats {
            used: self.len(),
            capacity: self.capacity,
            high_water_mark: self.high_water_mark,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::IblRenderError;

    #[test]
    fn test_allocate_and_get() {
        let mut heap = DescriptorHeap::new("test heap", 4);
        let a = heap.allocate("a").unwrap();
        let b = heap.allocate("b").unwrap();

        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(*heap.get(a).unwrap(), "a");
        assert_eq!(*heap.get(b).unwrap(), "b");
        assert_eq!(heap.len(), 2);
    }

    #[test]
    fn test_capacity_is_enforced() {
        let mut heap = DescriptorHeap::new("test heap", 2);
        heap.allocate(0).unwrap();
        heap.allocate(1).unwrap();

        assert!(matches!(
            heap.allocate(2),
            Err(IblRenderError::Graphics(GraphicsError::HeapExhausted { .. }))
        ));
    }

    #[test]
    fn test_state_restore() {
        let mut heap = DescriptorHeap::new("test heap", 8);
        let persistent = heap.allocate(1).unwrap();
        let state = heap.state();

        let scratch = heap.allocate(2).unwrap();
        heap.allocate(3).unwrap();
        assert_eq!(heap.len(), 3);

        heap.restore(state);
        assert_eq!(heap.len(), 1);
        assert!(heap.get(scratch).is_err());

        // 回滚后重新分配从保存的位置继续
        let next = heap.allocate(4).unwrap();
        assert_eq!(next.index(), 1);
        assert_eq!(*heap.get(next).unwrap(), 4);

        // 保存位置之前的描述符表仍然有效
        assert_eq!(*heap.get(persistent).unwrap(), 1);
        assert!(matches!(
            heap.get(scratch),
            Err(IblRenderError::Graphics(GraphicsError::StaleDescriptor { index: 1, .. }))
        ));
    }

    #[test]
    fn test_reset_invalidates_handles() {
        let mut heap = DescriptorHeap::new("test heap", 8);
        let handle = heap.allocate(1).unwrap();
        heap.reset();

        assert!(heap.is_empty());
        assert!(heap.get(handle).is_err());

        let reused = heap.allocate(5).unwrap();
        assert_eq!(reused.index(), handle.index());
        assert_ne!(reused, handle);
    }

    #[test]
    fn test_stats_track_high_water_mark() {
        let mut heap = DescriptorHeap::new("test heap", 8);
        let state = heap.state();
        for i in 0..5 {
            heap.allocate(i).unwrap();
        }
        heap.restore(state);

        let stats = heap.stats();
        assert_eq!(stats.used, 0);
        assert_eq!(stats.capacity, 8);
        assert_eq!(stats.high_water_mark, 5);
    }
}
