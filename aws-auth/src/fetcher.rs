/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Fetchers of raw credential material and the provider that loads their output.

use crate::json_credentials::{CredentialsLoader, RawCredentials};
use aws_types::credential::{self, future, CredentialsError, ProvideCredentials};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use tracing::Instrument;

/// Boxed future returned by [`RawCredentialsFetcher::fetch`].
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Performs the network or process call that returns raw, unparsed credential material.
///
/// Fetch errors are handed back to callers unchanged.
pub trait RawCredentialsFetcher: Send + Sync + fmt::Debug {
    /// Fetches raw credentials.
    fn fetch(&self) -> BoxFuture<'_, Result<RawCredentials, CredentialsError>>;
}

/// A [`RawCredentialsFetcher`] implemented by a closure.
///
/// See [`fetch_raw_credentials_fn`].
#[derive(Clone, Copy)]
pub struct FetchRawCredentialsFn<F>(F);

impl<F> fmt::Debug for FetchRawCredentialsFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FetchRawCredentialsFn")
    }
}

impl<F, Fut> RawCredentialsFetcher for FetchRawCredentialsFn<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<RawCredentials, CredentialsError>> + Send + 'static,
{
    fn fetch(&self) -> BoxFuture<'_, Result<RawCredentials, CredentialsError>> {
        Box::pin((self.0)())
    }
}

/// Returns a fetcher that calls `f` for every fetch.
pub fn fetch_raw_credentials_fn<F, Fut>(f: F) -> FetchRawCredentialsFn<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<RawCredentials, CredentialsError>> + Send + 'static,
{
    FetchRawCredentialsFn(f)
}

/// Credentials provider that fetches raw credentials and loads them with a [`CredentialsLoader`].
///
/// This provider does not cache. Wrap it in a
/// [`LazyCachingCredentialsProvider`](crate::provider::lazy_caching::LazyCachingCredentialsProvider)
/// to refresh ahead of expiry.
#[derive(Debug)]
pub struct FetchingCredentialsProvider<F> {
    fetcher: F,
    loader: CredentialsLoader,
}

impl<F> FetchingCredentialsProvider<F>
where
    F: RawCredentialsFetcher,
{
    /// Creates a provider whose credentials report `provider_name`.
    pub fn new(provider_name: &'static str, fetcher: F) -> Self {
        Self {
            fetcher,
            loader: CredentialsLoader::new(provider_name),
        }
    }

    async fn credentials(&self) -> credential::Result {
        let raw = self.fetcher.fetch().await?;
        self.loader
            .load(raw)
            .map_err(CredentialsError::unhandled)
    }
}

impl<F> ProvideCredentials for FetchingCredentialsProvider<F>
where
    F: RawCredentialsFetcher,
{
    fn provide_credentials<'a>(&'a self) -> future::ProvideCredentials<'a>
    where
        Self: 'a,
    {
        future::ProvideCredentials::new(
            self.credentials()
                .instrument(tracing::debug_span!("fetch_raw_credentials")),
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::json_credentials::LoadError;
    use std::error::Error;

    #[tokio::test]
    async fn loads_fetched_credentials() {
        let provider = FetchingCredentialsProvider::new(
            "EcsContainer",
            fetch_raw_credentials_fn(|| async {
                RawCredentials::from_json(
                    r#"{"AccessKeyId": "AKID", "SecretAccessKey": "SECRET", "Token": "TOKEN"}"#,
                )
                .map_err(CredentialsError::unhandled)
            }),
        );
        let creds = provider.provide_credentials().await.unwrap();
        assert_eq!("AKID", creds.access_key_id());
        assert_eq!(Some("TOKEN"), creds.session_token());
        assert_eq!("EcsContainer", creds.provider_name());
    }

    #[tokio::test]
    async fn fetch_errors_are_returned_unchanged() {
        let provider = FetchingCredentialsProvider::new(
            "test",
            fetch_raw_credentials_fn(|| async {
                Err(CredentialsError::provider_error("503 Service Unavailable"))
            }),
        );
        let err = provider.provide_credentials().await.unwrap_err();
        assert!(matches!(err, CredentialsError::ProviderError(_)));
        assert_eq!("503 Service Unavailable", err.source().unwrap().to_string());
    }

    #[tokio::test]
    async fn load_errors_are_unhandled() {
        let provider = FetchingCredentialsProvider::new(
            "test",
            fetch_raw_credentials_fn(|| async { Ok(RawCredentials::default()) }),
        );
        let err = provider.provide_credentials().await.unwrap_err();
        let source = err.source().unwrap().downcast_ref::<LoadError>().unwrap();
        assert!(matches!(source, LoadError::MissingField("AccessKeyId")));
    }
}
