mod frontend;
mod loop_control;
mod scheduler;
mod shutdown;

pub use frontend::{FrameView, Frontend, FrontendError};
pub use loop_control::{fps, frame_interval};
pub use scheduler::{Runtime, THINKING_TEXT};
pub use shutdown::ShutdownGuard;
