use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::models::{ResourceClass, TaskId, TaskStatus, TaskView};
use super::pool::ResourcePool;
use super::progress::TaskContext;
use super::registry::TaskRegistry;
use super::task::Task;

/// 各资源池的工作协程数量
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub index_workers: usize,
    pub download_workers: usize,
    pub extract_workers: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            index_workers: 2,
            download_workers: 4,
            extract_workers: 4,
        }
    }
}

impl EngineConfig {
    pub fn workers_for(&self, class: ResourceClass) -> usize {
        let count = match class {
            ResourceClass::Index => self.index_workers,
            ResourceClass::Download => self.download_workers,
            ResourceClass::Extract => self.extract_workers,
        };
        if count == 0 {
            warn!("{} 池的工作协程数为 0，已调整为 1", class);
            return 1;
        }
        count
    }
}

// 引擎内部状态，只通过 TaskManager / TaskContext 访问
pub(crate) struct EngineShared {
    registry: TaskRegistry,
    index_pool: ResourcePool,
    download_pool: ResourcePool,
    extract_pool: ResourcePool,
    // 每有一个任务进入终态就加一
    finished: watch::Sender<u64>,
}

impl EngineShared {
    fn pool(&self, class: ResourceClass) -> &ResourcePool {
        match class {
            ResourceClass::Index => &self.index_pool,
            ResourceClass::Download => &self.download_pool,
            ResourceClass::Extract => &self.extract_pool,
        }
    }

    pub(crate) fn submit(&self, task: Task) -> TaskId {
        let class = task.resource_class();
        let id = self.registry.insert(task);
        debug!("任务 {} 已登记，进入 {} 池", id, class);
        if !self.pool(class).enqueue(id)
            && self
                .registry
                .fail_queued(id, format!("{} 池已关闭，任务无法入队", class))
        {
            self.finished.send_modify(|count| *count += 1);
        }
        id
    }

    pub(crate) fn report_progress(
        &self,
        id: TaskId,
        step_name: Option<String>,
        step_progress: Option<f64>,
    ) {
        self.registry.report_progress(id, step_name, step_progress);
    }

    pub(crate) async fn run_task(self: &Arc<Self>, id: TaskId) {
        let Some(task) = self.registry.mark_running(id) else {
            return;
        };
        let display_name = task.display_name();
        info!("▶ 开始任务 {}: {}", id, display_name);

        // 放到独立的 tokio 任务里执行，任务 panic 只影响它自己的记录
        let ctx = TaskContext::new(id, Arc::clone(self));
        let handle = tokio::spawn(async move { task.execute(&ctx).await });
        let outcome = match handle.await {
            Ok(result) => result.map_err(|e| e.to_string()),
            Err(e) => Err(format!("任务执行崩溃: {}", e)),
        };

        match outcome {
            Ok(()) => {
                self.registry.mark_completed(id);
                info!("✅ 任务完成 {}: {}", id, display_name);
            }
            Err(message) => {
                error!("❌ 任务失败 {}: {}, 错误: {}", id, display_name, message);
                self.registry.mark_failed(id, message);
            }
        }
        self.finished.send_modify(|count| *count += 1);
    }
}

/// 任务引擎
///
/// 持有任务登记表和三个资源池（索引 / 下载 / 提取）。对外只暴露
/// [`submit`](Self::submit)、[`report_progress`](Self::report_progress) 和
/// [`snapshot`](Self::snapshot)。
///
/// 必须在 tokio 运行时中创建：构造时即启动全部工作协程。句柄可以随意克隆；
/// 最后一个句柄释放后，工作协程在手头任务结束后退出，尚在排队的任务被丢弃。
#[derive(Clone)]
pub struct TaskManager {
    shared: Arc<EngineShared>,
}

impl TaskManager {
    pub fn new(config: EngineConfig) -> Self {
        let (index_pool, index_rx) =
            ResourcePool::new(ResourceClass::Index, config.workers_for(ResourceClass::Index));
        let (download_pool, download_rx) = ResourcePool::new(
            ResourceClass::Download,
            config.workers_for(ResourceClass::Download),
        );
        let (extract_pool, extract_rx) = ResourcePool::new(
            ResourceClass::Extract,
            config.workers_for(ResourceClass::Extract),
        );
        let (finished, _) = watch::channel(0);

        let shared = Arc::new(EngineShared {
            registry: TaskRegistry::new(),
            index_pool,
            download_pool,
            extract_pool,
            finished,
        });
        shared.index_pool.spawn_workers(index_rx, &shared);
        shared.download_pool.spawn_workers(download_rx, &shared);
        shared.extract_pool.spawn_workers(extract_rx, &shared);

        info!(
            "任务引擎已启动: index={}, download={}, extract={}",
            shared.index_pool.workers(),
            shared.download_pool.workers(),
            shared.extract_pool.workers()
        );
        Self { shared }
    }

    /// 登记任务并放入对应资源池的队列，立即返回任务编号
    pub fn submit(&self, task: impl Into<Task>) -> TaskId {
        self.shared.submit(task.into())
    }

    /// 覆盖任务的步骤名称和进度；编号未知时什么也不做
    pub fn report_progress(&self, id: TaskId, step_name: Option<&str>, step_progress: Option<f64>) {
        self.shared
            .report_progress(id, step_name.map(str::to_owned), step_progress);
    }

    /// 按提交顺序返回所有任务的只读视图
    pub fn snapshot(&self) -> Vec<TaskView> {
        self.shared.registry.snapshot()
    }

    pub fn status(&self, id: TaskId) -> Option<TaskStatus> {
        self.shared.registry.status(id)
    }

    // 等到所有已登记的任务都进入终态
    pub async fn wait_until_idle(&self) {
        let mut finished = self.shared.finished.subscribe();
        loop {
            if self.shared.registry.is_idle() {
                return;
            }
            if finished.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for TaskManager {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
