//! 帧节奏控制
//!
//! CPU 最多领先 GPU 一帧：第 N 帧提交后，如果第 N-1 帧仍未完成就阻塞等待。
//! 等待结束后，下一个槽位（上一次由第 N-1 帧使用）的上传堆和描述符堆即可复用。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// 同时在飞的最大帧数
pub const FRAMES_IN_FLIGHT: usize = 2;

/// CPU/GPU 帧计数
///
/// `completed` 由 `Queue::on_submitted_work_done` 回调更新，
/// 回调可能在任意线程执行，因此使用原子量。
#[derive(Debug)]
pub struct FrameSync {
    frame_count: u64,
    completed: Arc<AtomicU64>,
}

impl FrameSync {
    pub fn new() -> Self {
        Self {
            frame_count: 0,
            completed: Arc::new(AtomicU64::new(0)),
        }
    }

    /// 记录一帧提交，返回该帧的 fence 值
    pub fn signal(&mut self) -> u64 {
        self.frame_count += 1;
        self.frame_count
    }

    /// 已提交的帧数
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// GPU 已完成的帧数
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }

    /// 在飞帧数达到上限时需要等待
    pub fn must_wait(&self) -> bool {
        self.frame_count - self.completed() >= FRAMES_IN_FLIGHT as u64
    }

    /// 需要等待完成的 fence 值（最旧的在飞帧）
    pub fn wait_target(&self) -> u64 {
        self.completed() + 1
    }

    /// 标记 fence 值已完成，完成值单调不减
    pub fn mark_completed(&self, value: u64) {
        self.completed.fetch_max(value, Ordering::AcqRel);
    }

    /// 供 GPU 完成回调使用的句柄
    pub fn completion_handle(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.completed)
    }
}

impl Default for FrameSync {
    fn default() -> Self {
        Self::new()
    }
}

/// 下一个帧槽位
pub fn next_frame_index(frame_index: usize) -> usize {
    (frame_index + 1) % FRAMES_IN_FLIGHT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_sync_waits_with_two_frames_in_flight() {
        let mut sync = FrameSync::new();

        assert_eq!(sync.signal(), 1);
        assert!(!sync.must_wait());

        assert_eq!(sync.signal(), 2);
        assert!(sync.must_wait());
        assert_eq!(sync.wait_target(), 1);

        sync.mark_completed(1);
        assert!(!sync.must_wait());
    }

    #[test]
    fn test_completion_is_monotonic() {
        let sync = FrameSync::new();
        sync.mark_completed(5);
        sync.mark_completed(3);
        assert_eq!(sync.completed(), 5);

        let handle = sync.completion_handle();
        handle.fetch_max(7, Ordering::AcqRel);
        assert_eq!(sync.completed(), 7);
    }

    #[test]
    fn test_slots_alternate() {
        assert_eq!(next_frame_index(0), 1);
        assert_eq!(next_frame_index(1), 0);
    }

    #[test]
    fn test_frame_loop_simulation() {
        let mut sync = FrameSync::new();
        let mut frame_index = 0;
        // 每个槽位最后一次使用时的 fence 值
        let mut slot_fences = [0u64; FRAMES_IN_FLIGHT];

        for _ in 0..10 {
            let fence = sync.signal();
            slot_fences[frame_index] = fence;

            if sync.must_wait() {
                // 模拟 GPU 完成最旧的在飞帧
                sync.mark_completed(sync.wait_target());
            }
            frame_index = next_frame_index(frame_index);

            assert!(sync.frame_count() - sync.completed() < FRAMES_IN_FLIGHT as u64);
            // 即将复用的槽位上的工作已经完成
            assert!(slot_fences[frame_index] <= sync.completed());
        }
    }
}
