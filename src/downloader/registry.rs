use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::time::Instant;
use tracing::{debug, warn};

use super::models::{TaskId, TaskRecord, TaskStatus, TaskView};
use super::task::Task;

/// 任务登记表
///
/// 所有任务记录的唯一持有者。内部只有一把互斥锁，每次加锁只做 O(1) 的字段更新
/// 或快照拷贝，绝不跨越 `.await` 持有，因此工作线程在执行任务时回调 `submit`
/// 不会死锁。记录按提交顺序存放，下标即 `id - 1`。
#[derive(Debug, Default)]
pub struct TaskRegistry {
    records: Mutex<Vec<TaskRecord>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<TaskRecord>> {
        // 锁内不会 panic，中毒时直接沿用数据
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn slot(id: TaskId) -> Option<usize> {
        (id.0 as usize).checked_sub(1)
    }

    // 分配新编号并以排队状态登记
    pub fn insert(&self, task: Task) -> TaskId {
        let mut records = self.lock();
        let id = TaskId(records.len() as u64 + 1);
        records.push(TaskRecord::new(id, task));
        id
    }

    /// 排队 -> 运行，记录开始时间，返回要执行的任务
    ///
    /// 记录不存在或不处于排队状态时返回 `None`。
    pub fn mark_running(&self, id: TaskId) -> Option<Arc<Task>> {
        let mut records = self.lock();
        let record = Self::slot(id).and_then(|i| records.get_mut(i))?;
        if record.status != TaskStatus::Queued {
            warn!("任务 {} 状态为 {}，无法开始运行", id, record.status);
            return None;
        }
        record.status = TaskStatus::Running;
        record.start_time = Some(Instant::now());
        Some(Arc::clone(&record.task))
    }

    pub fn mark_completed(&self, id: TaskId) -> bool {
        self.finish(id, TaskStatus::Completed, None)
    }

    pub fn mark_failed(&self, id: TaskId, error: String) -> bool {
        self.finish(id, TaskStatus::Failed, Some(error))
    }

    /// 排队 -> 失败，用于任务无法进入工作池的情况
    pub fn fail_queued(&self, id: TaskId, error: String) -> bool {
        let mut records = self.lock();
        let Some(record) = Self::slot(id).and_then(|i| records.get_mut(i)) else {
            return false;
        };
        if record.status != TaskStatus::Queued {
            warn!("任务 {} 状态为 {}，无法标记为入队失败", id, record.status);
            return false;
        }
        record.status = TaskStatus::Failed;
        record.end_time = Some(Instant::now());
        record.error = Some(error);
        true
    }

    // 运行 -> 终态，记录结束时间；终态之后不再变化
    fn finish(&self, id: TaskId, status: TaskStatus, error: Option<String>) -> bool {
        let mut records = self.lock();
        let Some(record) = Self::slot(id).and_then(|i| records.get_mut(i)) else {
            return false;
        };
        if record.status != TaskStatus::Running {
            warn!("任务 {} 状态为 {}，忽略状态变更 -> {}", id, record.status, status);
            return false;
        }
        record.status = status;
        record.end_time = Some(Instant::now());
        record.error = error;
        true
    }

    /// 覆盖步骤名称和进度，只在运行状态下生效
    pub fn report_progress(
        &self,
        id: TaskId,
        step_name: Option<String>,
        step_progress: Option<f64>,
    ) {
        let mut records = self.lock();
        match Self::slot(id).and_then(|i| records.get_mut(i)) {
            Some(record) if record.status == TaskStatus::Running => {
                record.step_name = step_name;
                record.step_progress = step_progress;
            }
            Some(record) => {
                debug!("任务 {} 状态为 {}，忽略进度更新", id, record.status);
            }
            None => {
                debug!("任务 {} 不存在，忽略进度更新", id);
            }
        }
    }

    pub fn snapshot(&self) -> Vec<TaskView> {
        let records = self.lock();
        let now = Instant::now();
        records.iter().map(|record| record.view(now)).collect()
    }

    pub fn status(&self, id: TaskId) -> Option<TaskStatus> {
        let records = self.lock();
        Self::slot(id)
            .and_then(|i| records.get(i))
            .map(|record| record.status)
    }

    // 所有已登记的任务都已结束
    pub fn is_idle(&self) -> bool {
        self.lock().iter().all(|record| record.status.is_terminal())
    }
}
