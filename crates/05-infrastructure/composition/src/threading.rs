//! 主线程派发
//!
//! 指定一个线程作为主线程，其他线程通过 [`MainThreadDispatcher`] 把闭包投递过去，
//! 主线程调用 [`MainThreadPump::run_pending`] 执行。

use services_common::{ThreadingError, ThreadingResult};
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread::{self, ThreadId};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

type Task = Box<dyn FnOnce() + Send + 'static>;

/// 创建派发器与主线程泵，调用线程成为主线程
pub fn main_thread_channel() -> (MainThreadDispatcher, MainThreadPump) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let main_thread = thread::current().id();
    debug!("主线程: {:?}", main_thread);
    (
        MainThreadDispatcher {
            sender,
            main_thread,
        },
        MainThreadPump { receiver },
    )
}

/// 主线程派发器
#[derive(Debug, Clone)]
pub struct MainThreadDispatcher {
    sender: mpsc::UnboundedSender<Task>,
    main_thread: ThreadId,
}

impl MainThreadDispatcher {
    /// 当前是否在主线程上
    pub fn is_running_on_main_thread(&self) -> bool {
        thread::current().id() == self.main_thread
    }

    /// 把闭包投递到主线程，返回可等待的结果
    ///
    /// 闭包在调用时立即入队，不依赖返回值被轮询。
    pub fn post<F, T>(&self, f: F) -> impl Future<Output = ThreadingResult<T>> + Send + 'static
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let task: Task = Box::new(move || {
            let _ = tx.send(catch_unwind(AssertUnwindSafe(f)));
        });
        let queued = self.sender.send(task).is_ok();
        if !queued {
            warn!("主线程泵已关闭，任务被丢弃");
        }

        async move {
            if !queued {
                return Err(ThreadingError::DispatcherClosed);
            }
            match rx.await {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(_)) => Err(ThreadingError::TaskPanicked),
                Err(_) => Err(ThreadingError::DispatcherClosed),
            }
        }
    }

    /// 在主线程上同步执行闭包
    ///
    /// 已在主线程上时直接执行；否则投递并阻塞等待。
    /// 在异步运行时上下文中调用时返回 [`ThreadingError::BlockingInRuntime`]，不入队。
    pub fn send<F, T>(&self, f: F) -> ThreadingResult<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        if self.is_running_on_main_thread() {
            return catch_unwind(AssertUnwindSafe(f)).map_err(|_| ThreadingError::TaskPanicked);
        }
        if tokio::runtime::Handle::try_current().is_ok() {
            warn!("在异步运行时中调用了阻塞派发");
            return Err(ThreadingError::BlockingInRuntime);
        }

        let (tx, rx) = oneshot::channel();
        let task: Task = Box::new(move || {
            let _ = tx.send(catch_unwind(AssertUnwindSafe(f)));
        });
        self.sender
            .send(task)
            .map_err(|_| ThreadingError::DispatcherClosed)?;

        match rx.blocking_recv() {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_)) => Err(ThreadingError::TaskPanicked),
            Err(_) => Err(ThreadingError::DispatcherClosed),
        }
    }
}

/// 主线程泵
#[derive(Debug)]
pub struct MainThreadPump {
    receiver: mpsc::UnboundedReceiver<Task>,
}

impl MainThreadPump {
    /// 执行所有已入队的任务，返回执行数量
    pub fn run_pending(&mut self) -> usize {
        let mut count = 0;
        while let Ok(task) = self.receiver.try_recv() {
            task();
            count += 1;
        }
        count
    }

    /// 持续执行任务，直到所有派发器都被丢弃
    pub async fn run(&mut self) {
        while let Some(task) = self.receiver.recv().await {
            task();
        }
        debug!("所有主线程派发器已关闭");
    }
}
