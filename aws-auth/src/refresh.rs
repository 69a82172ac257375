/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Refresh-ahead cache of a single value.
//!
//! [`RefreshAheadCache`] holds one value produced by an async supplier along with two points in
//! time derived from it:
//! - the *stale time*, after which the value must not be returned and callers wait for a refresh
//! - the *prefetch time*, after which the value is still usable but should be replaced
//!
//! Refreshes are single-flight: concurrent callers that find the value stale all share one
//! supplier invocation and observe the same outcome. A caller that stops waiting (for example,
//! because its request was cancelled) does not cancel the refresh for the other callers.

use arc_swap::ArcSwapOption;
use aws_smithy_async::rt::sleep::{AsyncSleep, SharedAsyncSleep, TokioSleep};
use aws_smithy_async::time::{SharedTimeSource, SystemTimeSource, TimeSource};
use futures_util::future::{FutureExt, Shared, WeakShared};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime};
use tokio::task::JoinHandle;
use tracing::Instrument;

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;
type Supplier<T, E> = Arc<dyn Fn() -> BoxFuture<Result<RefreshResult<T>, E>> + Send + Sync>;
type Refresh<T, E> = Shared<BoxFuture<Result<T, E>>>;

/// A freshly supplied value along with its stale and prefetch times.
#[derive(Clone, Debug)]
pub struct RefreshResult<T> {
    value: T,
    stale_time: Option<SystemTime>,
    prefetch_time: Option<SystemTime>,
}

impl<T> RefreshResult<T> {
    /// Creates a refresh result.
    ///
    /// `None` for `stale_time` means the value never goes stale; `None` for `prefetch_time`
    /// means it is never prefetched. A prefetch time after the stale time is moved back to the
    /// stale time.
    pub fn new(
        value: T,
        stale_time: Option<SystemTime>,
        prefetch_time: Option<SystemTime>,
    ) -> Self {
        let prefetch_time = match (prefetch_time, stale_time) {
            (Some(prefetch), Some(stale)) => Some(prefetch.min(stale)),
            (prefetch, _) => prefetch,
        };
        Self {
            value,
            stale_time,
            prefetch_time,
        }
    }

    /// The supplied value.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// When the value goes stale.
    pub fn stale_time(&self) -> Option<SystemTime> {
        self.stale_time
    }

    /// When the value should be prefetched.
    pub fn prefetch_time(&self) -> Option<SystemTime> {
        self.prefetch_time
    }
}

/// How a cache refreshes values that are still usable but past their prefetch time.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum PrefetchStrategy {
    /// Values are only refreshed once they are stale.
    #[default]
    Disabled,
    /// The first caller to observe a value past its prefetch time refreshes it and waits. Callers
    /// arriving while that refresh is in flight keep receiving the cached value. A failed
    /// prefetch is logged and the cached value is returned.
    OneCallerBlocks,
    /// A background task checks the prefetch time every `check_interval` and refreshes the value
    /// without involving callers. Failures are logged and never surface to callers.
    Background {
        /// How often the background task wakes up.
        check_interval: Duration,
    },
}

struct CacheEntry<T> {
    value: T,
    stale_time: Option<SystemTime>,
    prefetch_time: Option<SystemTime>,
}

impl<T> CacheEntry<T> {
    fn is_stale(&self, now: SystemTime) -> bool {
        matches!(self.stale_time, Some(stale) if now >= stale)
    }

    fn should_prefetch(&self, now: SystemTime) -> bool {
        matches!(self.prefetch_time, Some(prefetch) if now >= prefetch)
    }
}

impl<T> From<RefreshResult<T>> for CacheEntry<T> {
    fn from(result: RefreshResult<T>) -> Self {
        Self {
            value: result.value,
            stale_time: result.stale_time,
            prefetch_time: result.prefetch_time,
        }
    }
}

struct InFlight<T, E> {
    id: u64,
    refresh: WeakShared<BoxFuture<Result<T, E>>>,
}

struct RefreshSlot<T, E> {
    last_id: u64,
    in_flight: Option<InFlight<T, E>>,
}

enum Attempt<T, E> {
    /// The entry no longer needs refreshing.
    Current(T),
    /// Another caller's refresh is in flight.
    Joined(Refresh<T, E>),
    /// This caller started a refresh.
    Started(Refresh<T, E>),
}

struct Inner<T, E> {
    name: &'static str,
    supplier: Supplier<T, E>,
    entry: ArcSwapOption<CacheEntry<T>>,
    slot: Mutex<RefreshSlot<T, E>>,
    time_source: SharedTimeSource,
}

impl<T, E> Inner<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + fmt::Display + Send + Sync + 'static,
{
    /// Joins the refresh in flight, or starts one if the entry still `needs_refresh`.
    fn start_or_join(
        self: &Arc<Self>,
        needs_refresh: fn(&CacheEntry<T>, SystemTime) -> bool,
    ) -> Attempt<T, E> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(refresh) = slot
            .in_flight
            .as_ref()
            .and_then(|in_flight| in_flight.refresh.upgrade())
        {
            return Attempt::Joined(refresh);
        }

        // A refresh may have completed between the caller's check and taking the lock
        if let Some(entry) = self.entry.load_full() {
            if !needs_refresh(&entry, self.time_source.now()) {
                return Attempt::Current(entry.value.clone());
            }
        }

        slot.last_id += 1;
        let id = slot.last_id;
        let span = tracing::debug_span!("refresh", cache = self.name, refresh_id = id);
        let inner = Arc::clone(self);
        let refresh: BoxFuture<Result<T, E>> = Box::pin(
            async move {
                let result = inner.load().await;
                inner.finish(id);
                result
            }
            .instrument(span),
        );
        let refresh = refresh.shared();
        // `downgrade` only fails for a completed future, and this one has not been polled yet
        slot.in_flight = refresh
            .downgrade()
            .map(|weak| InFlight { id, refresh: weak });
        Attempt::Started(refresh)
    }

    async fn load(&self) -> Result<T, E> {
        let result = (self.supplier)().await?;
        let entry = CacheEntry::from(result);
        if entry.is_stale(self.time_source.now()) {
            tracing::warn!(
                cache = self.name,
                "refreshed value is already stale. It will be returned to current callers and refreshed again on next access"
            );
        }
        let value = entry.value.clone();
        self.entry.store(Some(Arc::new(entry)));
        tracing::debug!(cache = self.name, "refreshed cached value");
        Ok(value)
    }

    fn finish(&self, id: u64) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(&slot.in_flight, Some(in_flight) if in_flight.id == id) {
            slot.in_flight = None;
        }
    }
}

/// Thread-safe cache of one value, refreshed ahead of time.
///
/// # Examples
///
/// ```no_run
/// use aws_auth::refresh::{PrefetchStrategy, RefreshAheadCache, RefreshResult};
/// use std::time::Duration;
///
/// # async fn docs() {
/// let cache = RefreshAheadCache::builder(|| async {
///     let token = String::from("token");
///     Ok::<_, String>(RefreshResult::new(token, None, None))
/// })
/// .name("token")
/// .prefetch_strategy(PrefetchStrategy::Background {
///     check_interval: Duration::from_secs(60),
/// })
/// .build();
///
/// let token = cache.get().await;
/// cache.close().await;
/// # }
/// ```
pub struct RefreshAheadCache<T, E> {
    inner: Arc<Inner<T, E>>,
    prefetch_strategy: PrefetchStrategy,
    prefetch_task: Mutex<Option<JoinHandle<()>>>,
}

impl<T, E> fmt::Debug for RefreshAheadCache<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshAheadCache")
            .field("name", &self.inner.name)
            .field("prefetch_strategy", &self.prefetch_strategy)
            .finish()
    }
}

impl<T, E> RefreshAheadCache<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + fmt::Display + Send + Sync + 'static,
{
    /// Returns a builder for a cache whose values come from `supplier`.
    pub fn builder<F, Fut>(supplier: F) -> Builder<T, E>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<RefreshResult<T>, E>> + Send + 'static,
    {
        Builder {
            name: "refresh-ahead",
            supplier: Arc::new(move || Box::pin(supplier()) as BoxFuture<_>),
            time_source: None,
            sleep: None,
            prefetch_strategy: PrefetchStrategy::default(),
        }
    }

    /// Returns the cached value, refreshing it first if it is missing or stale.
    ///
    /// When a refresh is needed, concurrent callers share a single supplier invocation. A failed
    /// refresh is returned to every caller that waited on it and leaves the cache unchanged.
    pub async fn get(&self) -> Result<T, E> {
        let now = self.inner.time_source.now();
        if let Some(entry) = self.inner.entry.load_full() {
            if !entry.is_stale(now) {
                if self.prefetch_strategy == PrefetchStrategy::OneCallerBlocks
                    && entry.should_prefetch(now)
                {
                    return Ok(self.prefetch_in_foreground(&entry).await);
                }
                return Ok(entry.value.clone());
            }
        }

        match self.inner.start_or_join(CacheEntry::is_stale) {
            Attempt::Current(value) => Ok(value),
            Attempt::Joined(refresh) | Attempt::Started(refresh) => refresh.await,
        }
    }

    async fn prefetch_in_foreground(&self, current: &CacheEntry<T>) -> T {
        match self.inner.start_or_join(CacheEntry::should_prefetch) {
            Attempt::Current(value) => value,
            Attempt::Joined(_) => current.value.clone(),
            Attempt::Started(refresh) => match refresh.await {
                Ok(value) => value,
                Err(err) => {
                    tracing::warn!(
                        cache = self.inner.name,
                        error = %err,
                        "prefetch failed. Returning the cached value, which is not yet stale"
                    );
                    current.value.clone()
                }
            },
        }
    }

    /// Stops the background prefetch task, waiting for it to exit.
    ///
    /// A prefetch in flight is cancelled unless foreground callers are also waiting on it, in
    /// which case it completes for them. The cache remains usable after closing; values are then
    /// only refreshed when callers need them.
    pub async fn close(&self) {
        let task = self
            .prefetch_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.abort();
            // the only expected error is the cancellation requested above
            let _ = task.await;
            tracing::debug!(cache = self.inner.name, "stopped background prefetch");
        }
    }
}

impl<T, E> Drop for RefreshAheadCache<T, E> {
    fn drop(&mut self) {
        if let Some(task) = self
            .prefetch_task
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
    }
}

fn spawn_prefetch<T, E>(
    inner: Arc<Inner<T, E>>,
    sleep: SharedAsyncSleep,
    check_interval: Duration,
) -> Option<JoinHandle<()>>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + fmt::Display + Send + Sync + 'static,
{
    let runtime = match tokio::runtime::Handle::try_current() {
        Ok(runtime) => runtime,
        Err(_) => {
            tracing::warn!(
                cache = inner.name,
                "no Tokio runtime is running. Background prefetch is disabled and values will be refreshed when they go stale"
            );
            return None;
        }
    };
    let span = tracing::debug_span!("background_prefetch", cache = inner.name);
    Some(runtime.spawn(
        async move {
            loop {
                sleep.sleep(check_interval).await;
                let now = inner.time_source.now();
                let due = inner
                    .entry
                    .load_full()
                    .is_some_and(|entry| entry.should_prefetch(now));
                if !due {
                    continue;
                }
                let refresh = match inner.start_or_join(CacheEntry::should_prefetch) {
                    Attempt::Current(_) => continue,
                    Attempt::Joined(refresh) | Attempt::Started(refresh) => refresh,
                };
                if let Err(err) = refresh.await {
                    tracing::warn!(
                        error = %err,
                        "background prefetch failed. The cached value will be served until it is stale"
                    );
                }
            }
        }
        .instrument(span),
    ))
}

/// Builder for [`RefreshAheadCache`].
pub struct Builder<T, E> {
    name: &'static str,
    supplier: Supplier<T, E>,
    time_source: Option<SharedTimeSource>,
    sleep: Option<SharedAsyncSleep>,
    prefetch_strategy: PrefetchStrategy,
}

impl<T, E> fmt::Debug for Builder<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("name", &self.name)
            .field("time_source", &self.time_source)
            .field("sleep", &self.sleep)
            .field("prefetch_strategy", &self.prefetch_strategy)
            .finish()
    }
}

impl<T, E> Builder<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + fmt::Display + Send + Sync + 'static,
{
    /// Name of the cache, used in log messages.
    pub fn name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Time source used to decide staleness. Defaults to the system clock.
    pub fn time_source(mut self, time_source: impl TimeSource + 'static) -> Self {
        self.set_time_source(Some(SharedTimeSource::new(time_source)));
        self
    }

    /// Time source used to decide staleness. Defaults to the system clock.
    pub fn set_time_source(&mut self, time_source: Option<SharedTimeSource>) -> &mut Self {
        self.time_source = time_source;
        self
    }

    /// Sleep implementation used by the background prefetch task. Defaults to Tokio.
    pub fn sleep_impl(mut self, sleep: impl AsyncSleep + 'static) -> Self {
        self.set_sleep_impl(Some(SharedAsyncSleep::new(sleep)));
        self
    }

    /// Sleep implementation used by the background prefetch task. Defaults to Tokio.
    pub fn set_sleep_impl(&mut self, sleep: Option<SharedAsyncSleep>) -> &mut Self {
        self.sleep = sleep;
        self
    }

    /// How values past their prefetch time are refreshed.
    ///
    /// Defaults to [`PrefetchStrategy::Disabled`].
    pub fn prefetch_strategy(mut self, prefetch_strategy: PrefetchStrategy) -> Self {
        self.prefetch_strategy = prefetch_strategy;
        self
    }

    /// Builds the cache.
    ///
    /// With [`PrefetchStrategy::Background`], the prefetch task is spawned onto the current Tokio
    /// runtime. Outside of a runtime the cache falls back to refreshing stale values only.
    pub fn build(self) -> RefreshAheadCache<T, E> {
        let inner = Arc::new(Inner {
            name: self.name,
            supplier: self.supplier,
            entry: ArcSwapOption::empty(),
            slot: Mutex::new(RefreshSlot {
                last_id: 0,
                in_flight: None,
            }),
            time_source: self
                .time_source
                .unwrap_or_else(|| SharedTimeSource::new(SystemTimeSource::new())),
        });
        let prefetch_task = match self.prefetch_strategy {
            PrefetchStrategy::Background { check_interval } => spawn_prefetch(
                inner.clone(),
                self.sleep
                    .unwrap_or_else(|| SharedAsyncSleep::new(TokioSleep::new())),
                check_interval,
            ),
            _ => None,
        };
        RefreshAheadCache {
            inner,
            prefetch_strategy: self.prefetch_strategy,
            prefetch_task: Mutex::new(prefetch_task),
        }
    }
}
