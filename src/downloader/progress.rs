use std::fmt;
use std::sync::Arc;

use super::manager::EngineShared;
use super::models::TaskId;
use super::task::Task;

/// 绑定到单个任务编号的进度上报句柄
///
/// 任务只能通过它写入自身的步骤名称和进度，接触不到引擎内部状态。
#[derive(Clone)]
pub struct TaskReporter {
    task_id: TaskId,
    engine: Arc<EngineShared>,
}

impl TaskReporter {
    pub(crate) fn new(task_id: TaskId, engine: Arc<EngineShared>) -> Self {
        Self { task_id, engine }
    }

    pub fn report_progress(&self, step_name: Option<&str>, step_progress: Option<f64>) {
        self.engine
            .report_progress(self.task_id, step_name.map(str::to_owned), step_progress);
    }
}

impl fmt::Debug for TaskReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskReporter")
            .field("task_id", &self.task_id)
            .finish()
    }
}

/// 任务执行时拿到的上下文：进度上报 + 提交后续任务
#[derive(Debug, Clone)]
pub struct TaskContext {
    reporter: TaskReporter,
}

impl TaskContext {
    pub(crate) fn new(task_id: TaskId, engine: Arc<EngineShared>) -> Self {
        Self {
            reporter: TaskReporter::new(task_id, engine),
        }
    }

    pub fn reporter(&self) -> &TaskReporter {
        &self.reporter
    }

    pub fn report_progress(&self, step_name: Option<&str>, step_progress: Option<f64>) {
        self.reporter.report_progress(step_name, step_progress);
    }

    // 立即提交后续任务，不等待它执行
    pub fn emit(&self, task: impl Into<Task>) -> TaskId {
        self.reporter.engine.submit(task.into())
    }
}
