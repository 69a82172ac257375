/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::credential_process::CredentialProcessProvider;
use crate::environment::EnvironmentVariableCredentialsProvider;
use crate::profile::properties::*;
use crate::profile::{Profile, ProfileFileError, ProfileSource};
use aws_types::credential::SharedCredentialsProvider;
use aws_types::os_shim_internal::Env;
use aws_types::Credentials;
use smithy_auth::BoxError;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

const PROFILE_PROVIDER: &str = "Profile";

/// A named source of base credentials for `credential_source`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum CredentialSource {
    /// EC2 instance metadata
    Ec2InstanceMetadata,
    /// ECS container metadata
    EcsContainer,
    /// Environment variables
    Environment,
}

impl CredentialSource {
    /// Parses a `credential_source` value, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        [
            CredentialSource::Ec2InstanceMetadata,
            CredentialSource::EcsContainer,
            CredentialSource::Environment,
        ]
        .into_iter()
        .find(|source| source.as_str().eq_ignore_ascii_case(name.trim()))
    }

    /// The canonical name of this source.
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialSource::Ec2InstanceMetadata => "Ec2InstanceMetadata",
            CredentialSource::EcsContainer => "EcsContainer",
            CredentialSource::Environment => "Environment",
        }
    }
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a role assumption provider needs to assume `role_arn`.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct AssumeRoleRequest {
    /// Provider of the credentials used to call `AssumeRole`.
    pub source: SharedCredentialsProvider,
    /// The profile assuming the role.
    pub profile: String,
    /// `role_arn`
    pub role_arn: String,
    /// `role_session_name`
    pub session_name: Option<String>,
    /// `external_id`
    pub external_id: Option<String>,
    /// `duration_seconds`
    pub duration_seconds: Option<u32>,
}

/// Everything a web identity provider needs to assume `role_arn`.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct WebIdentityRequest {
    /// The profile assuming the role.
    pub profile: String,
    /// `role_arn`
    pub role_arn: String,
    /// `web_identity_token_file`
    pub web_identity_token_file: PathBuf,
    /// `role_session_name`
    pub session_name: Option<String>,
}

/// Builds providers that assume a role with credentials from another provider.
///
/// Implemented for closures taking an [`AssumeRoleRequest`].
pub trait AssumeRoleProviderFactory: Send + Sync {
    /// Creates the provider for `request`.
    fn create(&self, request: AssumeRoleRequest) -> Result<SharedCredentialsProvider, BoxError>;
}

impl<F> AssumeRoleProviderFactory for F
where
    F: Fn(AssumeRoleRequest) -> Result<SharedCredentialsProvider, BoxError> + Send + Sync,
{
    fn create(&self, request: AssumeRoleRequest) -> Result<SharedCredentialsProvider, BoxError> {
        self(request)
    }
}

/// Builds providers that assume a role with a web identity token.
///
/// Implemented for closures taking a [`WebIdentityRequest`].
pub trait WebIdentityProviderFactory: Send + Sync {
    /// Creates the provider for `request`.
    fn create(&self, request: WebIdentityRequest) -> Result<SharedCredentialsProvider, BoxError>;
}

impl<F> WebIdentityProviderFactory for F
where
    F: Fn(WebIdentityRequest) -> Result<SharedCredentialsProvider, BoxError> + Send + Sync,
{
    fn create(&self, request: WebIdentityRequest) -> Result<SharedCredentialsProvider, BoxError> {
        self(request)
    }
}

/// Turns a profile's credential properties into a credentials provider.
///
/// A profile that sets both `source_profile` and `credential_source` is rejected. Otherwise the
/// first matching rule wins:
///
/// 1. `role_arn` + `web_identity_token_file`: web identity federation
/// 2. `role_arn` + `source_profile`: assume a role with the source profile's credentials,
///    resolved recursively
/// 3. `role_arn` + `credential_source`: assume a role with credentials from a named source
/// 4. `credential_process`: run an external process
/// 5. `aws_session_token`: static session credentials
/// 6. `aws_access_key_id`: static credentials
///
/// A profile matching none of them configures no credentials and resolves to `None`.
///
/// Role assumption and web identity federation are performed by factories supplied to the
/// builder. Resolving a profile that needs one that was not supplied is an error.
#[derive(Clone)]
pub struct ProfileChainResolver {
    assume_role: Option<Arc<dyn AssumeRoleProviderFactory>>,
    web_identity: Option<Arc<dyn WebIdentityProviderFactory>>,
    credential_sources: HashMap<CredentialSource, SharedCredentialsProvider>,
}

impl fmt::Debug for ProfileChainResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sources: Vec<_> = self.credential_sources.keys().collect();
        sources.sort_by_key(|source| source.as_str());
        f.debug_struct("ProfileChainResolver")
            .field("assume_role", &self.assume_role.is_some())
            .field("web_identity", &self.web_identity.is_some())
            .field("credential_sources", &sources)
            .finish()
    }
}

impl Default for ProfileChainResolver {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ProfileChainResolver {
    /// Returns a builder for a resolver.
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Resolves the credentials provider configured by `profile`.
    ///
    /// `profiles` is used to look up `source_profile`s.
    pub fn resolve(
        &self,
        profile: &Profile,
        profiles: &dyn ProfileSource,
    ) -> Result<Option<SharedCredentialsProvider>, ProfileFileError> {
        let span = tracing::debug_span!("resolve_profile", profile = profile.name());
        let _enter = span.enter();
        self.resolve_profile(profile, profiles, &mut Vec::new())
    }

    fn resolve_profile(
        &self,
        profile: &Profile,
        profiles: &dyn ProfileSource,
        visiting: &mut Vec<String>,
    ) -> Result<Option<SharedCredentialsProvider>, ProfileFileError> {
        if profile.get(SOURCE_PROFILE).is_some() && profile.get(CREDENTIAL_SOURCE).is_some() {
            return Err(ProfileFileError::ConflictingProfileConfig {
                profile: profile.name().into(),
            });
        }

        if let Some(role_arn) = profile.get(ROLE_ARN) {
            if let Some(token_file) = profile.get(WEB_IDENTITY_TOKEN_FILE) {
                return self.web_identity(profile, role_arn, token_file).map(Some);
            }
            if let Some(source_profile) = profile.get(SOURCE_PROFILE) {
                let source =
                    self.source_profile_provider(profile, source_profile, profiles, visiting)?;
                return self.assume_role(profile, role_arn, source).map(Some);
            }
            if let Some(credential_source) = profile.get(CREDENTIAL_SOURCE) {
                let source = self.credential_source_provider(profile, credential_source)?;
                return self.assume_role(profile, role_arn, source).map(Some);
            }
        }

        if let Some(command) = profile.get(CREDENTIAL_PROCESS) {
            tracing::debug!(profile = profile.name(), "using credential_process");
            let provider = CredentialProcessProvider::new(command);
            let provider = match profile.get(AWS_ACCOUNT_ID) {
                Some(account_id) => provider.with_account_id(account_id),
                None => provider,
            };
            return Ok(Some(SharedCredentialsProvider::new(provider)));
        }

        if profile.get(AWS_SESSION_TOKEN).is_some() {
            let session_token = required(profile, AWS_SESSION_TOKEN)?;
            return static_credentials(profile, Some(session_token.to_string())).map(Some);
        }

        if profile.get(AWS_ACCESS_KEY_ID).is_some() {
            return static_credentials(profile, None).map(Some);
        }

        tracing::debug!(profile = profile.name(), "profile does not configure credentials");
        Ok(None)
    }

    fn source_profile_provider(
        &self,
        profile: &Profile,
        source_profile: &str,
        profiles: &dyn ProfileSource,
        visiting: &mut Vec<String>,
    ) -> Result<SharedCredentialsProvider, ProfileFileError> {
        if source_profile == profile.name() || visiting.iter().any(|name| name == source_profile)
        {
            let mut profiles = visiting.clone();
            profiles.push(profile.name().into());
            return Err(ProfileFileError::CircularProfile {
                profiles,
                next: source_profile.into(),
            });
        }
        let missing = |reason| ProfileFileError::MissingSourceCredentials {
            profile: profile.name().into(),
            source_profile: source_profile.into(),
            reason,
        };
        let source = profiles
            .profile(source_profile)
            .ok_or_else(|| missing("is not defined"))?;

        visiting.push(profile.name().into());
        let resolved = self.resolve_profile(source, profiles, visiting);
        visiting.pop();
        resolved?.ok_or_else(|| missing("does not configure credentials"))
    }

    fn credential_source_provider(
        &self,
        profile: &Profile,
        value: &str,
    ) -> Result<SharedCredentialsProvider, ProfileFileError> {
        let credential_source = CredentialSource::from_name(value).ok_or_else(|| {
            ProfileFileError::InvalidCredentialSource {
                profile: profile.name().into(),
                value: value.into(),
            }
        })?;
        self.credential_sources
            .get(&credential_source)
            .cloned()
            .ok_or_else(|| ProfileFileError::UnavailableCredentialSource {
                profile: profile.name().into(),
                credential_source,
            })
    }

    fn assume_role(
        &self,
        profile: &Profile,
        role_arn: &str,
        source: SharedCredentialsProvider,
    ) -> Result<SharedCredentialsProvider, ProfileFileError> {
        let factory =
            self.assume_role
                .as_ref()
                .ok_or_else(|| ProfileFileError::RoleAssumptionUnsupported {
                    profile: profile.name().into(),
                })?;
        let duration_seconds = profile
            .get(DURATION_SECONDS)
            .map(|value| {
                value
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| ProfileFileError::InvalidProperty {
                        profile: profile.name().into(),
                        property: DURATION_SECONDS,
                        value: value.into(),
                    })
            })
            .transpose()?;
        tracing::debug!(profile = profile.name(), role_arn, "assuming role");
        factory
            .create(AssumeRoleRequest {
                source,
                profile: profile.name().into(),
                role_arn: role_arn.into(),
                session_name: profile.get(ROLE_SESSION_NAME).map(Into::into),
                external_id: profile.get(EXTERNAL_ID).map(Into::into),
                duration_seconds,
            })
            .map_err(|source| ProfileFileError::ProviderConstruction {
                profile: profile.name().into(),
                source,
            })
    }

    fn web_identity(
        &self,
        profile: &Profile,
        role_arn: &str,
        token_file: &str,
    ) -> Result<SharedCredentialsProvider, ProfileFileError> {
        let factory =
            self.web_identity
                .as_ref()
                .ok_or_else(|| ProfileFileError::WebIdentityUnsupported {
                    profile: profile.name().into(),
                })?;
        tracing::debug!(profile = profile.name(), role_arn, "using web identity token");
        factory
            .create(WebIdentityRequest {
                profile: profile.name().into(),
                role_arn: role_arn.into(),
                web_identity_token_file: PathBuf::from(token_file),
                session_name: profile.get(ROLE_SESSION_NAME).map(Into::into),
            })
            .map_err(|source| ProfileFileError::ProviderConstruction {
                profile: profile.name().into(),
                source,
            })
    }
}

fn required<'a>(profile: &'a Profile, property: &'static str) -> Result<&'a str, ProfileFileError> {
    profile
        .get(property)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ProfileFileError::MissingProperty {
            profile: profile.name().into(),
            property,
        })
}

fn static_credentials(
    profile: &Profile,
    session_token: Option<String>,
) -> Result<SharedCredentialsProvider, ProfileFileError> {
    let access_key_id = required(profile, AWS_ACCESS_KEY_ID)?;
    let secret_access_key = required(profile, AWS_SECRET_ACCESS_KEY)?;
    tracing::debug!(
        profile = profile.name(),
        session = session_token.is_some(),
        "using static credentials"
    );
    let credentials = Credentials::new(
        access_key_id,
        secret_access_key,
        session_token,
        None,
        PROFILE_PROVIDER,
    )
    .map_err(|err| ProfileFileError::ProviderConstruction {
        profile: profile.name().into(),
        source: err.into(),
    })?;
    let credentials = match profile.get(AWS_ACCOUNT_ID) {
        Some(account_id) => credentials.with_account_id(account_id),
        None => credentials,
    };
    Ok(SharedCredentialsProvider::new(credentials))
}

/// Builder for [`ProfileChainResolver`].
#[derive(Default)]
pub struct Builder {
    assume_role: Option<Arc<dyn AssumeRoleProviderFactory>>,
    web_identity: Option<Arc<dyn WebIdentityProviderFactory>>,
    credential_sources: HashMap<CredentialSource, SharedCredentialsProvider>,
    env: Option<Env>,
}

impl fmt::Debug for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("assume_role", &self.assume_role.is_some())
            .field("web_identity", &self.web_identity.is_some())
            .field("credential_sources", &self.credential_sources.keys())
            .field("env", &self.env)
            .finish()
    }
}

impl Builder {
    /// Factory used for profiles that assume a role.
    pub fn assume_role_factory(
        mut self,
        factory: impl AssumeRoleProviderFactory + 'static,
    ) -> Self {
        self.assume_role = Some(Arc::new(factory));
        self
    }

    /// Factory used for profiles that assume a role with a web identity token.
    pub fn web_identity_factory(
        mut self,
        factory: impl WebIdentityProviderFactory + 'static,
    ) -> Self {
        self.web_identity = Some(Arc::new(factory));
        self
    }

    /// Provider used for `credential_source = <credential_source>`.
    ///
    /// [`CredentialSource::Environment`] defaults to an
    /// [`EnvironmentVariableCredentialsProvider`]; the other sources have no default.
    pub fn credential_source(
        mut self,
        credential_source: CredentialSource,
        provider: impl Into<SharedCredentialsProvider>,
    ) -> Self {
        self.credential_sources
            .insert(credential_source, provider.into());
        self
    }

    /// Environment read by the default `Environment` credential source.
    pub fn env(mut self, env: Env) -> Self {
        self.env = Some(env);
        self
    }

    /// Builds the resolver.
    pub fn build(self) -> ProfileChainResolver {
        let env = self.env.unwrap_or_default();
        let mut credential_sources = self.credential_sources;
        credential_sources
            .entry(CredentialSource::Environment)
            .or_insert_with(|| {
                SharedCredentialsProvider::new(EnvironmentVariableCredentialsProvider::new_with_env(
                    env,
                ))
            });
        ProfileChainResolver {
            assume_role: self.assume_role,
            web_identity: self.web_identity,
            credential_sources,
        }
    }
}
