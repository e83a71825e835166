pub mod core;
pub mod error;
pub mod index;
pub mod manager;
pub mod models;
pub mod pool;
pub mod progress;
pub mod registry;
pub mod task;

pub use core::DownloadTask;
pub use error::TaskError;
pub use index::IndexTask;
pub use manager::{EngineConfig, TaskManager};
pub use models::{ResourceClass, TaskId, TaskStatus, TaskView};
pub use progress::{TaskContext, TaskReporter};
pub use task::{DownloadOptions, MediaType, Task, TaskTrait};
