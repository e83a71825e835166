use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use super::task::Task;

// 任务编号，按提交顺序递增，永不复用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// 资源类别，每个类别对应一个独立的工作池
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceClass {
    Index,
    Download,
    Extract,
}

impl ResourceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceClass::Index => "index",
            ResourceClass::Download => "download",
            ResourceClass::Extract => "extract",
        }
    }
}

impl fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TaskStatus::Queued => "排队中",
            TaskStatus::Running => "运行中",
            TaskStatus::Completed => "已完成",
            TaskStatus::Failed => "失败",
        };
        f.write_str(text)
    }
}

/// 登记表中的任务记录，只由 [`TaskRegistry`](super::registry::TaskRegistry) 持有和修改
#[derive(Debug)]
pub struct TaskRecord {
    pub id: TaskId,
    pub task: Arc<Task>,
    pub display_name: String,
    pub status: TaskStatus,
    pub error: Option<String>,
    pub step_name: Option<String>,
    pub step_progress: Option<f64>,
    pub start_time: Option<Instant>,
    pub end_time: Option<Instant>,
}

impl TaskRecord {
    pub fn new(id: TaskId, task: Task) -> Self {
        let display_name = task.display_name();
        Self {
            id,
            task: Arc::new(task),
            display_name,
            status: TaskStatus::Queued,
            error: None,
            step_name: None,
            step_progress: None,
            start_time: None,
            end_time: None,
        }
    }

    // 排队: 0；运行中: now - start；结束: end - start
    pub fn elapsed(&self, now: Instant) -> Duration {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => end.saturating_duration_since(start),
            (Some(start), None) => now.saturating_duration_since(start),
            _ => Duration::ZERO,
        }
    }

    pub fn view(&self, now: Instant) -> TaskView {
        TaskView {
            id: self.id,
            display_name: self.display_name.clone(),
            resource_class: self.task.resource_class(),
            status: self.status,
            error: self.error.clone(),
            step_name: self.step_name.clone(),
            step_progress: self.step_progress,
            elapsed: self.elapsed(now),
        }
    }
}

/// 提供给外部观察者的只读快照
#[derive(Debug, Clone, PartialEq)]
pub struct TaskView {
    pub id: TaskId,
    pub display_name: String,
    pub resource_class: ResourceClass,
    pub status: TaskStatus,
    pub error: Option<String>,
    pub step_name: Option<String>,
    pub step_progress: Option<f64>,
    pub elapsed: Duration,
}
