/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::policy::CachePolicy;
use crate::refresh::{PrefetchStrategy, RefreshAheadCache};
use aws_smithy_async::future::timeout::Timeout;
use aws_smithy_async::rt::sleep::{AsyncSleep, SharedAsyncSleep, TokioSleep};
use aws_smithy_async::time::{SharedTimeSource, SystemTimeSource, TimeSource};
use aws_types::credential::{
    future, CredentialsError, ProvideCredentials, SharedCredentialsProvider,
};
use aws_types::Credentials;
use std::time::Duration;

const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(5);

/// `LazyCachingCredentialsProvider` implements [`ProvideCredentials`] by caching credentials
/// that it loads by calling a user-provided [`ProvideCredentials`] implementation.
///
/// Credentials are loaded on first use and reused until they are within one minute of expiring
/// (see [`CachePolicy`]). Concurrent callers that find the cache empty or stale share a single
/// load. Credentials that have already expired when they are loaded are rejected with
/// [`CredentialsError::CredentialsExpired`] and never cached.
///
/// Each load is bounded by a timeout (5 seconds unless configured otherwise).
///
/// # Examples
///
/// ```no_run
/// use aws_auth::provider::LazyCachingCredentialsProvider;
/// use aws_auth::refresh::PrefetchStrategy;
/// use aws_types::credential::provide_credentials_fn;
/// use aws_types::Credentials;
/// use std::time::Duration;
///
/// # async fn docs() {
/// let provider = LazyCachingCredentialsProvider::builder(provide_credentials_fn(|| async {
///     // An async process to retrieve credentials would go here:
///     Ok(Credentials::from_keys("example", "example", None).expect("keys are not blank"))
/// }))
/// .load_timeout(Duration::from_secs(30))
/// .prefetch_strategy(PrefetchStrategy::OneCallerBlocks)
/// .build();
/// # provider.close().await;
/// # }
/// ```
#[derive(Debug)]
pub struct LazyCachingCredentialsProvider {
    cache: RefreshAheadCache<Credentials, CredentialsError>,
}

impl LazyCachingCredentialsProvider {
    /// Caches credentials from `loader` with the default configuration.
    pub fn new(loader: impl ProvideCredentials + 'static) -> Self {
        Self::builder(loader).build()
    }

    /// Returns a builder that caches credentials from `loader`.
    pub fn builder(loader: impl ProvideCredentials + 'static) -> Builder {
        Builder {
            loader: SharedCredentialsProvider::new(loader),
            time_source: None,
            sleep: None,
            load_timeout: None,
            policy: CachePolicy::default(),
            prefetch_strategy: PrefetchStrategy::default(),
        }
    }

    /// Stops background prefetching, if enabled.
    pub async fn close(&self) {
        self.cache.close().await
    }
}

impl ProvideCredentials for LazyCachingCredentialsProvider {
    fn provide_credentials<'a>(&'a self) -> future::ProvideCredentials<'a>
    where
        Self: 'a,
    {
        future::ProvideCredentials::new(self.cache.get())
    }
}

/// Builder for [`LazyCachingCredentialsProvider`].
#[derive(Debug)]
pub struct Builder {
    loader: SharedCredentialsProvider,
    time_source: Option<SharedTimeSource>,
    sleep: Option<SharedAsyncSleep>,
    load_timeout: Option<Duration>,
    policy: CachePolicy,
    prefetch_strategy: PrefetchStrategy,
}

impl Builder {
    /// (Optional) Time source used to decide when credentials are stale.
    pub fn time_source(mut self, time_source: impl TimeSource + 'static) -> Self {
        self.time_source = Some(SharedTimeSource::new(time_source));
        self
    }

    /// (Optional) Sleep implementation used for load timeouts and background prefetch.
    pub fn sleep_impl(mut self, sleep: impl AsyncSleep + 'static) -> Self {
        self.sleep = Some(SharedAsyncSleep::new(sleep));
        self
    }

    /// (Optional) Timeout for a single load. Defaults to 5 seconds.
    pub fn load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = Some(timeout);
        self
    }

    /// (Optional) Stale and prefetch windows. Defaults to [`CachePolicy::default`].
    pub fn policy(mut self, policy: CachePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// (Optional) How credentials are refreshed ahead of going stale. Defaults to
    /// [`PrefetchStrategy::Disabled`].
    pub fn prefetch_strategy(mut self, prefetch_strategy: PrefetchStrategy) -> Self {
        self.prefetch_strategy = prefetch_strategy;
        self
    }

    /// Creates the [`LazyCachingCredentialsProvider`].
    pub fn build(self) -> LazyCachingCredentialsProvider {
        let time_source = self
            .time_source
            .unwrap_or_else(|| SharedTimeSource::new(SystemTimeSource::new()));
        let sleep = self
            .sleep
            .unwrap_or_else(|| SharedAsyncSleep::new(TokioSleep::new()));
        let load_timeout = self.load_timeout.unwrap_or(DEFAULT_LOAD_TIMEOUT);
        let loader = self.loader;
        let policy = self.policy;

        let supplier = {
            let time_source = time_source.clone();
            let sleep = sleep.clone();
            move || {
                let loader = loader.clone();
                let time_source = time_source.clone();
                let sleep = sleep.clone();
                async move {
                    let credentials = Timeout::new(
                        loader.provide_credentials(),
                        sleep.sleep(load_timeout),
                    )
                    .await
                    .map_err(|_| CredentialsError::provider_timed_out(load_timeout))??;
                    let now = time_source.now();
                    let expiry = credentials.expiry();
                    if let Some(expiry) = expiry.filter(|_| credentials.is_expired(now)) {
                        tracing::warn!(
                            provider = credentials.provider_name(),
                            "loaded credentials that have already expired"
                        );
                        return Err(CredentialsError::expired(expiry));
                    }
                    tracing::debug!(
                        provider = credentials.provider_name(),
                        "loaded credentials"
                    );
                    Ok::<_, CredentialsError>(policy.refresh_result(credentials, now, expiry))
                }
            }
        };

        let mut cache = RefreshAheadCache::builder(supplier)
            .name("lazy_caching_credentials")
            .prefetch_strategy(self.prefetch_strategy);
        cache.set_time_source(Some(time_source));
        cache.set_sleep_impl(Some(sleep));
        LazyCachingCredentialsProvider {
            cache: cache.build(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fetcher::{fetch_raw_credentials_fn, FetchingCredentialsProvider};
    use crate::json_credentials::RawCredentials;
    use aws_types::credential::{self, provide_credentials_fn};
    use aws_types::time_source::ManualTimeSource;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::{SystemTime, UNIX_EPOCH};
    use tracing_test::traced_test;

    fn epoch_secs(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn credentials(expiry_secs: u64) -> Credentials {
        Credentials::new("test", "test", None, Some(epoch_secs(expiry_secs)), "test").unwrap()
    }

    struct TestLoader {
        results: Arc<Mutex<VecDeque<credential::Result>>>,
        calls: Arc<AtomicUsize>,
    }

    impl TestLoader {
        fn new(results: Vec<credential::Result>) -> Self {
            Self {
                results: Arc::new(Mutex::new(results.into())),
                calls: Default::default(),
            }
        }

        fn provider(&self, time: &ManualTimeSource) -> LazyCachingCredentialsProvider {
            let results = self.results.clone();
            let calls = self.calls.clone();
            LazyCachingCredentialsProvider::builder(provide_credentials_fn(move || {
                calls.fetch_add(1, Ordering::SeqCst);
                let next = results.lock().unwrap().pop_front();
                async move { next.expect("unexpected load") }
            }))
            .time_source(time.clone())
            .build()
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    async fn expect_expiry(expiry_secs: u64, provider: &LazyCachingCredentialsProvider) {
        let creds = provider
            .provide_credentials()
            .await
            .expect("expected credentials");
        assert_eq!(Some(epoch_secs(expiry_secs)), creds.expiry());
    }

    #[tokio::test]
    async fn reuses_credentials_until_a_minute_before_expiry() {
        let time = ManualTimeSource::new(epoch_secs(100));
        let loader = TestLoader::new(vec![Ok(credentials(1000)), Ok(credentials(2000))]);
        let provider = loader.provider(&time);

        expect_expiry(1000, &provider).await;
        time.set_time(epoch_secs(939));
        expect_expiry(1000, &provider).await;
        assert_eq!(1, loader.calls());

        time.set_time(epoch_secs(940));
        expect_expiry(2000, &provider).await;
        assert_eq!(2, loader.calls());
    }

    #[tokio::test]
    #[traced_test]
    async fn already_expired_credentials_are_rejected_and_not_cached() {
        let time = ManualTimeSource::new(epoch_secs(1_000_000_000));
        let loader = TestLoader::new(vec![
            Ok(credentials(946684800)),
            Ok(credentials(1_000_003_600)),
        ]);
        let provider = loader.provider(&time);

        let err = provider.provide_credentials().await.unwrap_err();
        match err {
            CredentialsError::CredentialsExpired(details) => {
                assert_eq!(epoch_secs(946684800), details.expiration())
            }
            other => panic!("expected CredentialsExpired, got {:?}", other),
        }
        assert!(logs_contain("already expired"));

        expect_expiry(1_000_003_600, &provider).await;
        assert_eq!(2, loader.calls());
    }

    #[tokio::test]
    async fn expired_json_credentials_are_never_cached() {
        let time = ManualTimeSource::new(epoch_secs(1_000_000_000));
        let fetches = Arc::new(AtomicUsize::new(0));
        let fetcher = {
            let fetches = fetches.clone();
            fetch_raw_credentials_fn(move || {
                fetches.fetch_add(1, Ordering::SeqCst);
                async {
                    RawCredentials::from_json(
                        r#"{"AccessKeyId":"AKIAEXAMPLE","SecretAccessKey":"secret","Expiration":"2000-01-01T00:00:00Z"}"#,
                    )
                    .map_err(CredentialsError::unhandled)
                }
            })
        };
        let fetching = FetchingCredentialsProvider::new("test", fetcher);
        let provider = LazyCachingCredentialsProvider::builder(fetching)
            .time_source(time)
            .build();

        for _ in 0..2 {
            match provider.provide_credentials().await {
                Err(CredentialsError::CredentialsExpired(details)) => {
                    assert_eq!(epoch_secs(946684800), details.expiration())
                }
                other => panic!("expected CredentialsExpired, got {:?}", other),
            }
        }
        assert_eq!(2, fetches.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn load_failures_are_returned_and_retried() {
        let time = ManualTimeSource::new(epoch_secs(100));
        let loader = TestLoader::new(vec![
            Err(CredentialsError::not_loaded("no credentials configured")),
            Ok(credentials(1000)),
        ]);
        let provider = loader.provider(&time);

        assert!(matches!(
            provider.provide_credentials().await,
            Err(CredentialsError::CredentialsNotLoaded(_))
        ));
        expect_expiry(1000, &provider).await;
    }

    #[tokio::test]
    async fn credentials_without_expiry_are_cached_indefinitely() {
        let time = ManualTimeSource::new(epoch_secs(100));
        let loader = TestLoader::new(vec![Ok(Credentials::for_tests_with_session_token())]);
        let provider = loader.provider(&time);

        let creds = provider.provide_credentials().await.unwrap();
        assert_eq!(Some("notarealsessiontoken"), creds.session_token());
        time.advance(Duration::from_secs(365 * 24 * 60 * 60));
        assert_eq!(
            Some("notarealsessiontoken"),
            provider.provide_credentials().await.unwrap().session_token()
        );
        assert_eq!(1, loader.calls());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_loads_time_out() {
        let provider = LazyCachingCredentialsProvider::builder(provide_credentials_fn(|| {
            std::future::pending::<credential::Result>()
        }))
        .load_timeout(Duration::from_secs(2))
        .build();

        match provider.provide_credentials().await {
            Err(CredentialsError::ProviderTimedOut(details)) => {
                assert_eq!(Duration::from_secs(2), details.timeout_duration())
            }
            other => panic!("expected a timeout, got {:?}", other),
        }
    }
}
