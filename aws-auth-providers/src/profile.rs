/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Profile based providers
//!
//! A profile is a named set of properties, as found in `~/.aws/config` and
//! `~/.aws/credentials`. Profile based providers combine two pieces:
//!
//! 1. A [`ProfileSource`] that looks profiles up by name
//! 2. A [`ProfileChainResolver`] that turns a profile's properties into a credentials provider,
//!    following `source_profile` references and wrapping base credentials with role assumption
//!
//! Parsing profile files is left to the caller; any map of profiles can be used as a source.

use aws_types::credential::{
    self, future, CredentialsError, ProvideCredentials, SharedCredentialsProvider,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::Instrument;

mod error;
mod resolve;

pub use error::ProfileFileError;
pub use resolve::{
    AssumeRoleProviderFactory, AssumeRoleRequest, Builder as ResolverBuilder, CredentialSource,
    ProfileChainResolver, WebIdentityProviderFactory, WebIdentityRequest,
};

/// Names of the profile properties read by the resolver.
pub mod properties {
    /// ARN of the role to assume
    pub const ROLE_ARN: &str = "role_arn";
    /// Profile whose credentials are used to assume the role
    pub const SOURCE_PROFILE: &str = "source_profile";
    /// Named source whose credentials are used to assume the role
    pub const CREDENTIAL_SOURCE: &str = "credential_source";
    /// Path of an OIDC token used to assume the role
    pub const WEB_IDENTITY_TOKEN_FILE: &str = "web_identity_token_file";
    /// Session name used when assuming the role
    pub const ROLE_SESSION_NAME: &str = "role_session_name";
    /// External ID used when assuming the role
    pub const EXTERNAL_ID: &str = "external_id";
    /// Duration of the assumed role session
    pub const DURATION_SECONDS: &str = "duration_seconds";
    /// Command that prints credentials
    pub const CREDENTIAL_PROCESS: &str = "credential_process";
    /// Static access key ID
    pub const AWS_ACCESS_KEY_ID: &str = "aws_access_key_id";
    /// Static secret access key
    pub const AWS_SECRET_ACCESS_KEY: &str = "aws_secret_access_key";
    /// Static session token
    pub const AWS_SESSION_TOKEN: &str = "aws_session_token";
    /// Account the credentials belong to
    pub const AWS_ACCOUNT_ID: &str = "aws_account_id";
}

/// A named set of properties.
#[derive(Clone, PartialEq, Eq)]
pub struct Profile {
    name: String,
    properties: HashMap<String, String>,
}

impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // values include secret keys
        let mut keys: Vec<_> = self.properties.keys().collect();
        keys.sort();
        f.debug_struct("Profile")
            .field("name", &self.name)
            .field("properties", &keys)
            .finish()
    }
}

impl Profile {
    /// Creates a profile.
    pub fn new<K, V>(name: impl Into<String>, properties: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            name: name.into(),
            properties: properties
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// The profile's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the value of property `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

/// Looks up profiles by name.
pub trait ProfileSource: Send + Sync + fmt::Debug {
    /// Returns the profile named `name`.
    fn profile(&self, name: &str) -> Option<&Profile>;
}

/// An in-memory set of profiles.
#[derive(Clone, Debug, Default)]
pub struct ProfileSet {
    profiles: HashMap<String, Profile>,
}

impl ProfileSet {
    /// Creates a set from `profiles`. Later profiles replace earlier ones with the same name.
    pub fn new(profiles: impl IntoIterator<Item = Profile>) -> Self {
        profiles.into_iter().collect()
    }
}

impl FromIterator<Profile> for ProfileSet {
    fn from_iter<T: IntoIterator<Item = Profile>>(iter: T) -> Self {
        Self {
            profiles: iter
                .into_iter()
                .map(|profile| (profile.name.clone(), profile))
                .collect(),
        }
    }
}

impl ProfileSource for ProfileSet {
    fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }
}

const DEFAULT_PROFILE: &str = "default";

/// Profile based credentials provider
///
/// Resolves the credentials provider configured by one profile the first time credentials are
/// requested, then delegates to it. The resolved provider is reused for the lifetime of this
/// provider, so resolution (and any resolution error) happens once.
///
/// - An undefined profile, or one that configures no credentials, reports
///   [`CredentialsError::CredentialsNotLoaded`] so that it can be skipped in a
///   [`ChainProvider`](crate::chain::ChainProvider).
/// - A misconfigured profile reports [`CredentialsError::InvalidConfiguration`] with the
///   [`ProfileFileError`] as its source.
///
/// This provider does not cache credentials. Role assumption and process providers are
/// typically wrapped in a
/// [`LazyCachingCredentialsProvider`](aws_auth::provider::LazyCachingCredentialsProvider).
///
/// ```rust
/// use aws_auth_providers::profile::{Profile, ProfileCredentialsProvider, ProfileSet};
///
/// let profiles = ProfileSet::new([Profile::new(
///     "dev",
///     [("aws_access_key_id", "AKIDEXAMPLE"), ("aws_secret_access_key", "SECRET")],
/// )]);
/// let provider = ProfileCredentialsProvider::builder(profiles)
///     .profile_name("dev")
///     .build();
/// ```
pub struct ProfileCredentialsProvider {
    profiles: Arc<dyn ProfileSource>,
    profile_name: String,
    resolver: ProfileChainResolver,
    provider: OnceLock<Result<SharedCredentialsProvider, CredentialsError>>,
}

impl fmt::Debug for ProfileCredentialsProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfileCredentialsProvider")
            .field("profile_name", &self.profile_name)
            .field("resolver", &self.resolver)
            .field("provider", &self.provider.get())
            .finish()
    }
}

impl ProfileCredentialsProvider {
    /// Returns a builder for a provider that reads `profiles`.
    pub fn builder(profiles: impl ProfileSource + 'static) -> Builder {
        Builder {
            profiles: Arc::new(profiles),
            profile_name: None,
            resolver: None,
        }
    }

    fn provider(&self) -> Result<SharedCredentialsProvider, CredentialsError> {
        self.provider.get_or_init(|| self.resolve()).clone()
    }

    fn resolve(&self) -> Result<SharedCredentialsProvider, CredentialsError> {
        let profile = self.profiles.profile(&self.profile_name).ok_or_else(|| {
            CredentialsError::not_loaded(format!("profile `{}` is not defined", self.profile_name))
        })?;
        match self.resolver.resolve(profile, self.profiles.as_ref()) {
            Ok(Some(provider)) => Ok(provider),
            Ok(None) => Err(CredentialsError::not_loaded(format!(
                "profile `{}` does not configure credentials",
                self.profile_name
            ))),
            Err(err) => {
                tracing::warn!(
                    profile = %self.profile_name,
                    error = %err,
                    "profile is misconfigured"
                );
                Err(CredentialsError::invalid_configuration(err))
            }
        }
    }

    async fn load_credentials(&self) -> credential::Result {
        let provider = self.provider()?;
        provider
            .provide_credentials()
            .instrument(tracing::debug_span!(
                "load_profile_credentials",
                profile = %self.profile_name
            ))
            .await
    }
}

impl ProvideCredentials for ProfileCredentialsProvider {
    fn provide_credentials<'a>(&'a self) -> future::ProvideCredentials<'a>
    where
        Self: 'a,
    {
        future::ProvideCredentials::new(self.load_credentials().instrument(tracing::info_span!(
            "load_credentials",
            provider = "Profile"
        )))
    }
}

/// Builder for [`ProfileCredentialsProvider`].
#[derive(Debug)]
pub struct Builder {
    profiles: Arc<dyn ProfileSource>,
    profile_name: Option<String>,
    resolver: Option<ProfileChainResolver>,
}

impl Builder {
    /// Profile to load credentials from. Defaults to `default`.
    pub fn profile_name(mut self, profile_name: impl Into<String>) -> Self {
        self.profile_name = Some(profile_name.into());
        self
    }

    /// Resolver used to interpret the profile. Defaults to [`ProfileChainResolver::default`],
    /// which supports neither role assumption nor web identity federation.
    pub fn resolver(mut self, resolver: ProfileChainResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Creates the [`ProfileCredentialsProvider`].
    pub fn build(self) -> ProfileCredentialsProvider {
        ProfileCredentialsProvider {
            profiles: self.profiles,
            profile_name: self
                .profile_name
                .unwrap_or_else(|| DEFAULT_PROFILE.to_string()),
            resolver: self.resolver.unwrap_or_default(),
            provider: OnceLock::new(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::error::Error;

    fn profiles() -> ProfileSet {
        ProfileSet::new([
            Profile::new(
                "default",
                [("aws_access_key_id", "AKIAX"), ("aws_secret_access_key", "SECRETX")],
            ),
            Profile::new("empty", [("region", "us-east-1")]),
            Profile::new(
                "broken",
                [("role_arn", "arn:aws:iam::123456789012:role/A"), ("source_profile", "broken")],
            ),
        ])
    }

    #[tokio::test]
    async fn loads_the_default_profile() {
        let provider = ProfileCredentialsProvider::builder(profiles()).build();
        let creds = provider.provide_credentials().await.unwrap();
        assert_eq!("AKIAX", creds.access_key_id());
        assert_eq!("Profile", creds.provider_name());
    }

    #[tokio::test]
    async fn missing_and_empty_profiles_are_not_loaded() {
        for name in ["missing", "empty"] {
            let provider = ProfileCredentialsProvider::builder(profiles())
                .profile_name(name)
                .build();
            let err = provider.provide_credentials().await.unwrap_err();
            assert!(matches!(err, CredentialsError::CredentialsNotLoaded(_)), "{}", name);
        }
    }

    #[tokio::test]
    async fn misconfigured_profile_is_invalid_configuration() {
        let provider = ProfileCredentialsProvider::builder(profiles())
            .profile_name("broken")
            .build();
        let err = provider.provide_credentials().await.unwrap_err();
        let source = err
            .source()
            .and_then(|source| source.downcast_ref::<ProfileFileError>())
            .expect("profile error");
        assert!(matches!(source, ProfileFileError::CircularProfile { .. }));
    }

    #[test]
    fn profile_debug_omits_values() {
        let profile = Profile::new("dev", [("aws_secret_access_key", "SECRETX")]);
        let debug = format!("{:?}", profile);
        assert!(debug.contains("aws_secret_access_key"));
        assert!(!debug.contains("SECRETX"));
    }
}
