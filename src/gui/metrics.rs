//! 性能统计模块
//!
//! PerformanceMetrics 按秒统计帧数，并生成窗口标题。

/// 性能统计（帧率、帧时间）
#[derive(Debug, Clone)]
pub struct PerformanceMetrics {
    frame_count: u32,
    /// 上一次统计的时间点（秒）
    time_elapsed: f32,
    fps: f32,
    frame_time_ms: f32,
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PerformanceMetrics {
    pub fn new() -> Self {
        Self {
            frame_count: 0,
            time_elapsed: 0.0,
            fps: 0.0,
            frame_time_ms: 0.0,
        }
    }

    /// 记录一帧，`total_time` 为程序启动以来的秒数
    ///
    /// 每满一秒刷新一次统计值并返回 `true`。
    pub fn record_frame(&mut self, total_time: f32) -> bool {
        self.frame_count += 1;

        if total_time - self.time_elapsed < 1.0 {
            return false;
        }

        self.fps = self.frame_count as f32;
        self.frame_time_ms = 1000.0 / self.fps;
        self.frame_count = 0;
        self.time_elapsed += 1.0;
        true
    }

    /// 获取当前 FPS
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// 获取当前帧时间（毫秒）
    pub fn frame_time_ms(&self) -> f32 {
        self.frame_time_ms
    }

    /// 带统计信息的窗口标题
    pub fn window_title(&self, base: &str) -> String {
        format!("[{:.1} fps  {:.3} ms] {}", self.fps, self.frame_time_ms, base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_updates_once_per_second() {
        let mut metrics = PerformanceMetrics::new();
        for i in 0..60 {
            assert!(!metrics.record_frame(i as f32 / 60.0));
        }
        assert!(metrics.record_frame(1.0));
        assert_eq!(metrics.fps(), 61.0);
        assert!((metrics.frame_time_ms() - 1000.0 / 61.0).abs() < 1e-4);

        // 下一次统计从 1 秒处开始计时
        assert!(!metrics.record_frame(1.5));
        assert!(metrics.record_frame(2.0));
        assert_eq!(metrics.fps(), 2.0);
    }

    #[test]
    fn test_window_title() {
        let mut metrics = PerformanceMetrics::new();
        for _ in 0..3 {
            metrics.record_frame(0.5);
        }
        metrics.record_frame(1.0);
        assert_eq!(metrics.window_title("ImageBasedPBR"), "[4.0 fps  250.000 ms] ImageBasedPBR");
    }
}
