//! 图形设备层
//!
//! 在 wgpu 之上提供与显式 API 相同的帧资源模型：
//! - `upload`：每帧 256 字节对齐的常量上传堆
//! - `descriptor`：有界线性描述符堆（绑定组）
//! - `frame`：CPU/GPU 帧计数与帧槽位
//! - `context`：设备、交换链以及上述资源的所有者

pub mod context;
pub mod descriptor;
pub mod frame;
pub mod upload;

pub use context::{BindGroupHeap, GraphicsContext, HeapUsage, DEPTH_FORMAT};
pub use descriptor::{DescriptorHandle, DescriptorHeap, DescriptorHeapState};
pub use frame::{next_frame_index, FrameSync, FRAMES_IN_FLIGHT};
pub use upload::{UploadHeap, UPLOAD_ALIGNMENT};
