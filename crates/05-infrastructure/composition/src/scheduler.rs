//! 延迟动作调度器
//!
//! 调度器本身不创建线程，到期动作在调用 [`ActionScheduler::execute_expired_actions`]
//! 的线程上执行。需要自动驱动时可以用 [`ActionScheduler::spawn_driver`]。

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use services_common::SchedulerError;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// 时间来源
pub trait TimeProvider: Send + Sync {
    /// 当前时间
    fn now(&self) -> DateTime<Utc>;
}

/// 系统时钟
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 手动推进的时钟
#[derive(Debug)]
pub struct ManualTimeProvider {
    now: Mutex<DateTime<Utc>>,
}

impl ManualTimeProvider {
    /// 从给定时间开始
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// 推进时钟
    pub fn advance(&self, delta: chrono::Duration) {
        let mut now = self.now.lock();
        *now = *now + delta;
    }
}

impl TimeProvider for ManualTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

type ScheduledAction = Box<dyn FnOnce() + Send + 'static>;

const MINIMUM_ACTION_ID: u64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct ScheduledInvocation {
    invocation_time: DateTime<Utc>,
    action_id: u64,
}

struct SchedulerState {
    /// 按到期时间排序的最小堆，与 `actions` 一一对应
    queue: BinaryHeap<Reverse<ScheduledInvocation>>,
    actions: HashMap<u64, ScheduledAction>,
    next_id: u64,
}

impl SchedulerState {
    /// 分配下一个标识，溢出后回到最小值并跳过仍在等待的动作
    fn allocate_id(&mut self) -> u64 {
        loop {
            let candidate = self.next_id;
            self.next_id = candidate.checked_add(1).unwrap_or(MINIMUM_ACTION_ID);
            if !self.actions.contains_key(&candidate) {
                return candidate;
            }
        }
    }
}

/// 延迟动作调度器
pub struct ActionScheduler {
    time_provider: Arc<dyn TimeProvider>,
    state: Mutex<SchedulerState>,
}

impl ActionScheduler {
    /// 使用系统时钟创建调度器
    pub fn new() -> Self {
        Self::with_time_provider(Arc::new(SystemTimeProvider))
    }

    /// 使用指定时间来源创建调度器
    pub fn with_time_provider(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            time_provider,
            state: Mutex::new(SchedulerState {
                queue: BinaryHeap::new(),
                actions: HashMap::new(),
                next_id: MINIMUM_ACTION_ID,
            }),
        }
    }

    /// 调度动作，返回正数标识
    pub fn schedule_action<F>(&self, action: F, delay_seconds: f64) -> Result<u64, SchedulerError>
    where
        F: FnOnce() + Send + 'static,
    {
        if delay_seconds.is_nan() || delay_seconds < 0.0 {
            return Err(SchedulerError::NegativeDelay { delay_seconds });
        }

        let delay = chrono::Duration::microseconds((delay_seconds * 1_000_000.0) as i64);
        let invocation_time = self
            .time_provider
            .now()
            .checked_add_signed(delay)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let mut state = self.state.lock();
        let action_id = state.allocate_id();

        state.queue.push(Reverse(ScheduledInvocation {
            invocation_time,
            action_id,
        }));
        state.actions.insert(action_id, Box::new(action));

        debug!("调度动作 {}，延迟 {} 秒", action_id, delay_seconds);
        Ok(action_id)
    }

    /// 取消动作，未知标识被忽略
    pub fn cancel_action(&self, action_id: u64) {
        let mut state = self.state.lock();
        if state.actions.remove(&action_id).is_some() {
            state
                .queue
                .retain(|Reverse(invocation)| invocation.action_id != action_id);
            debug!("取消动作 {}", action_id);
        }
    }

    /// 等待执行的动作数量
    pub fn scheduled_actions_count(&self) -> usize {
        self.state.lock().actions.len()
    }

    /// 执行所有到期动作，返回执行的数量
    ///
    /// 动作按到期时间顺序执行，执行时不持有内部锁，动作中可以再次调度。
    /// 动作 panic 会被捕获并记录，不影响其余动作。
    pub fn execute_expired_actions(&self) -> usize {
        let now = self.time_provider.now();
        let mut expired = Vec::new();
        {
            let mut state = self.state.lock();
            while let Some(Reverse(next)) = state.queue.peek().copied() {
                if next.invocation_time > now {
                    break;
                }
                state.queue.pop();
                if let Some(action) = state.actions.remove(&next.action_id) {
                    expired.push((next.action_id, action));
                }
            }
        }

        let count = expired.len();
        for (action_id, action) in expired {
            if catch_unwind(AssertUnwindSafe(action)).is_err() {
                error!("调度动作 {} 执行时发生 panic", action_id);
            }
        }
        count
    }

    /// 在 tokio 运行时中周期性执行到期动作
    pub fn spawn_driver(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                self.execute_expired_actions();
            }
        })
    }
}

impl Default for ActionScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ActionScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionScheduler")
            .field("scheduled_actions", &self.scheduled_actions_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn scheduler() -> (ActionScheduler, Arc<ManualTimeProvider>) {
        let clock = Arc::new(ManualTimeProvider::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        ));
        (ActionScheduler::with_time_provider(clock.clone()), clock)
    }

    #[test]
    fn test_actions_run_in_time_order_when_expired() {
        let (scheduler, clock) = scheduler();
        let log = Arc::new(Mutex::new(Vec::new()));

        let late = log.clone();
        scheduler
            .schedule_action(move || late.lock().push("late"), 2.0)
            .unwrap();
        let early = log.clone();
        scheduler
            .schedule_action(move || early.lock().push("early"), 1.0)
            .unwrap();

        assert_eq!(scheduler.execute_expired_actions(), 0);

        clock.advance(chrono::Duration::seconds(1));
        assert_eq!(scheduler.execute_expired_actions(), 1);
        assert_eq!(scheduler.scheduled_actions_count(), 1);

        clock.advance(chrono::Duration::seconds(5));
        scheduler.execute_expired_actions();
        assert_eq!(*log.lock(), vec!["early", "late"]);
        assert_eq!(scheduler.scheduled_actions_count(), 0);
    }

    #[test]
    fn test_ids_are_positive_and_distinct() {
        let (scheduler, _clock) = scheduler();
        let first = scheduler.schedule_action(|| {}, 0.0).unwrap();
        let second = scheduler.schedule_action(|| {}, 0.0).unwrap();
        assert!(first >= 1);
        assert_ne!(first, second);
    }

    #[test]
    fn test_negative_delay_rejected() {
        let (scheduler, _clock) = scheduler();
        let err = scheduler.schedule_action(|| {}, -1.0).unwrap_err();
        assert_eq!(err, SchedulerError::NegativeDelay { delay_seconds: -1.0 });
        assert_eq!(scheduler.scheduled_actions_count(), 0);
    }

    #[test]
    fn test_cancelled_action_never_runs() {
        let (scheduler, _clock) = scheduler();
        let ran = Arc::new(Mutex::new(false));
        let flag = ran.clone();
        let id = scheduler
            .schedule_action(move || *flag.lock() = true, 0.0)
            .unwrap();

        scheduler.cancel_action(id);
        scheduler.cancel_action(9999);

        assert_eq!(scheduler.execute_expired_actions(), 0);
        assert!(!*ran.lock());
    }

    #[test]
    fn test_cancel_releases_queued_invocation() {
        let (scheduler, _clock) = scheduler();
        let kept = scheduler.schedule_action(|| {}, 3600.0).unwrap();
        for _ in 0..100 {
            let id = scheduler.schedule_action(|| {}, 3600.0).unwrap();
            scheduler.cancel_action(id);
        }

        let state = scheduler.state.lock();
        assert_eq!(state.queue.len(), 1);
        assert_eq!(state.actions.len(), 1);
        assert!(state.actions.contains_key(&kept));
    }

    #[test]
    fn test_wrapped_id_skips_pending_action() {
        let (scheduler, _clock) = scheduler();
        let first = scheduler.schedule_action(|| {}, 60.0).unwrap();
        assert_eq!(first, MINIMUM_ACTION_ID);

        scheduler.state.lock().next_id = u64::MAX;
        let last = scheduler.schedule_action(|| {}, 60.0).unwrap();
        let wrapped = scheduler.schedule_action(|| {}, 60.0).unwrap();

        assert_eq!(last, u64::MAX);
        assert_eq!(wrapped, MINIMUM_ACTION_ID + 1);
        assert_eq!(scheduler.scheduled_actions_count(), 3);
    }

    #[test]
    fn test_panicking_action_does_not_stop_others() {
        let (scheduler, _clock) = scheduler();
        let ran = Arc::new(Mutex::new(false));
        let flag = ran.clone();

        scheduler.schedule_action(|| panic!("动作失败"), 0.0).unwrap();
        scheduler
            .schedule_action(move || *flag.lock() = true, 0.0)
            .unwrap();

        assert_eq!(scheduler.execute_expired_actions(), 2);
        assert!(*ran.lock());
    }

    #[tokio::test]
    async fn test_driver_executes_due_actions() {
        let scheduler = Arc::new(ActionScheduler::new());
        let (tx, rx) = tokio::sync::oneshot::channel();
        scheduler
            .schedule_action(
                move || {
                    let _ = tx.send(());
                },
                0.0,
            )
            .unwrap();

        let driver = scheduler.clone().spawn_driver(Duration::from_millis(10));
        rx.await.unwrap();
        driver.abort();
        assert_eq!(scheduler.scheduled_actions_count(), 0);
    }
}
