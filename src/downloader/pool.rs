use std::sync::{Arc, Weak};

use tokio::sync::{Mutex, mpsc};
use tracing::{debug, error};

use super::manager::EngineShared;
use super::models::{ResourceClass, TaskId};

type SharedReceiver = Arc<Mutex<mpsc::UnboundedReceiver<TaskId>>>;

/// 绑定到单一资源类别的固定容量工作池
///
/// 队列是先进先出的任务编号通道，池内的工作协程共享同一个接收端，
/// 工作协程不会跨池取任务。容量在构造时确定，之后不可调整。
#[derive(Debug)]
pub struct ResourcePool {
    class: ResourceClass,
    workers: usize,
    queue: mpsc::UnboundedSender<TaskId>,
}

impl ResourcePool {
    pub(crate) fn new(
        class: ResourceClass,
        workers: usize,
    ) -> (Self, mpsc::UnboundedReceiver<TaskId>) {
        let (queue, receiver) = mpsc::unbounded_channel();
        (
            Self {
                class,
                workers,
                queue,
            },
            receiver,
        )
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    // 非阻塞入队，调用方（包括正在执行任务的工作协程）不会等待本池的工作协程
    pub(crate) fn enqueue(&self, id: TaskId) -> bool {
        match self.queue.send(id) {
            Ok(()) => true,
            Err(_) => {
                error!("{} 池的队列已关闭，任务 {} 无法入队", self.class, id);
                false
            }
        }
    }

    pub(crate) fn spawn_workers(
        &self,
        receiver: mpsc::UnboundedReceiver<TaskId>,
        engine: &Arc<EngineShared>,
    ) {
        let receiver: SharedReceiver = Arc::new(Mutex::new(receiver));
        for index in 0..self.workers {
            tokio::spawn(worker_loop(
                self.class,
                index,
                Arc::clone(&receiver),
                Arc::downgrade(engine),
            ));
        }
        debug!("{} 池已启动 {} 个工作协程", self.class, self.workers);
    }
}

// 所有池共用的工作循环：取编号 -> 执行 -> 记录结果 -> 继续
//
// 只持有引擎的弱引用，最后一个 TaskManager 句柄释放后，
// 队列发送端随之释放，工作协程在当前任务结束后退出。
async fn worker_loop(
    class: ResourceClass,
    index: usize,
    queue: SharedReceiver,
    engine: Weak<EngineShared>,
) {
    loop {
        let next = {
            let mut receiver = queue.lock().await;
            receiver.recv().await
        };
        let Some(id) = next else {
            break;
        };
        let Some(engine) = engine.upgrade() else {
            break;
        };
        debug!("工作协程 {}-{} 取到任务 {}", class, index, id);
        engine.run_task(id).await;
    }
    debug!("工作协程 {}-{} 退出", class, index);
}
