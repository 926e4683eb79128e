//! Lifecycle primitives - 单实例创建去重
//!
//! 两种共享状态都用同一个模式防止重复构造：进行中的构造保存为共享 future，
//! 期间到达的调用者等待同一个结果，而不是再发起一次构造。
//!
//! - `SingleFlight<T>`: NotStarted | InProgress，完成后（无论成败）清除标记
//! - `LazySlot<T>`: Empty | Pending | Ready，失败时回到 Empty，可显式失效

use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

type SharedInit<T> = Shared<BoxFuture<'static, Result<T, String>>>;

fn lock<S>(mutex: &Mutex<S>) -> MutexGuard<'_, S> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// 单飞执行器
///
/// 同一时刻最多只有一个操作在执行
pub struct SingleFlight<T: Clone> {
    in_flight: Mutex<Option<(u64, SharedInit<T>)>>,
    next_id: AtomicU64,
}

impl<T> SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            in_flight: Mutex::new(None),
            next_id: AtomicU64::new(0),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        lock(&self.in_flight).is_some()
    }

    /// 执行操作；已有操作在执行时等待它的结果
    pub async fn run<F, Fut>(&self, start: F) -> Result<T, String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, String>> + Send + 'static,
    {
        let (id, flight) = self.join_or_start(start);
        let result = flight.await;

        let mut guard = lock(&self.in_flight);
        if matches!(guard.as_ref(), Some((current, _)) if *current == id) {
            *guard = None;
        }
        result
    }

    fn join_or_start<F, Fut>(&self, start: F) -> (u64, SharedInit<T>)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, String>> + Send + 'static,
    {
        let mut guard = lock(&self.in_flight);
        if let Some((id, flight)) = guard.as_ref() {
            tracing::debug!(flight_id = id, "Joining in-flight operation");
            return (*id, flight.clone());
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let flight = start().boxed().shared();
        *guard = Some((id, flight.clone()));
        (id, flight)
    }
}

impl<T> Default for SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// LazySlot 状态（只读快照）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotStatus {
    Empty,
    Pending,
    Ready,
}

enum SlotState<T: Clone> {
    Empty,
    Pending(u64, SharedInit<T>),
    Ready(T),
}

enum Step<T: Clone> {
    Ready(T),
    Wait(u64, SharedInit<T>),
}

/// 惰性单例槽
///
/// 成功后缓存值；失败后回到 Empty，下一次调用重新构造
pub struct LazySlot<T: Clone> {
    state: Mutex<SlotState<T>>,
    next_id: AtomicU64,
}

impl<T> LazySlot<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SlotState::Empty),
            next_id: AtomicU64::new(0),
        }
    }

    pub fn status(&self) -> SlotStatus {
        match &*lock(&self.state) {
            SlotState::Empty => SlotStatus::Empty,
            SlotState::Pending(..) => SlotStatus::Pending,
            SlotState::Ready(_) => SlotStatus::Ready,
        }
    }

    /// 已就绪的值
    pub fn get(&self) -> Option<T> {
        match &*lock(&self.state) {
            SlotState::Ready(value) => Some(value.clone()),
            _ => None,
        }
    }

    /// 获取值，必要时构造
    pub async fn get_or_init<F, Fut>(&self, init: F) -> Result<T, String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, String>> + Send + 'static,
    {
        let (id, pending) = match self.begin(init) {
            Step::Ready(value) => return Ok(value),
            Step::Wait(id, pending) => (id, pending),
        };

        let result = pending.await;

        let mut guard = lock(&self.state);
        if matches!(&*guard, SlotState::Pending(current, _) if *current == id) {
            *guard = match &result {
                Ok(value) => SlotState::Ready(value.clone()),
                Err(_) => SlotState::Empty,
            };
        }
        result
    }

    fn begin<F, Fut>(&self, init: F) -> Step<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, String>> + Send + 'static,
    {
        let mut guard = lock(&self.state);
        match &*guard {
            SlotState::Ready(value) => Step::Ready(value.clone()),
            SlotState::Pending(id, pending) => Step::Wait(*id, pending.clone()),
            SlotState::Empty => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let pending = init().boxed().shared();
                *guard = SlotState::Pending(id, pending.clone());
                Step::Wait(id, pending)
            }
        }
    }

    /// 清空槽，返回之前就绪的值
    pub fn invalidate(&self) -> Option<T> {
        match std::mem::replace(&mut *lock(&self.state), SlotState::Empty) {
            SlotState::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// 仅当就绪值满足条件时清空（避免误清新建的实例）
    pub fn invalidate_if(&self, predicate: impl FnOnce(&T) -> bool) -> bool {
        let mut guard = lock(&self.state);
        let matched = matches!(&*guard, SlotState::Ready(value) if predicate(value));
        if matched {
            *guard = SlotState::Empty;
        }
        matched
    }
}

impl<T> Default for LazySlot<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
