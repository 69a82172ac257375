/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::profile::CredentialSource;
use smithy_auth::BoxError;

/// A profile's credentials configuration could not be turned into a provider.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ProfileFileError {
    /// The profile sets both `source_profile` and `credential_source`.
    #[error("profile `{profile}` sets both `source_profile` and `credential_source`")]
    ConflictingProfileConfig {
        /// The misconfigured profile.
        profile: String,
    },

    /// Following `source_profile` led back to a profile that was already being resolved.
    #[error(
        "profile formed an infinite loop. first we loaded {profiles:?}, then attempted to reload {next}"
    )]
    CircularProfile {
        /// The profiles visited, in order.
        profiles: Vec<String>,
        /// The profile that would have been visited again.
        next: String,
    },

    /// The `source_profile` of a role profile is undefined or configures no credentials.
    #[error("profile `{profile}` sources credentials from `{source_profile}`, which {reason}")]
    MissingSourceCredentials {
        /// The profile assuming a role.
        profile: String,
        /// The profile it sources credentials from.
        source_profile: String,
        /// Why no credentials were found.
        reason: &'static str,
    },

    /// `credential_source` names something other than `Ec2InstanceMetadata`, `EcsContainer` or
    /// `Environment`.
    #[error(
        "invalid credential source in `{profile}`: `{value}` is not one of Ec2InstanceMetadata, EcsContainer or Environment"
    )]
    InvalidCredentialSource {
        /// The misconfigured profile.
        profile: String,
        /// The rejected value.
        value: String,
    },

    /// `credential_source` names a known source for which no provider was configured.
    #[error("profile `{profile}` uses credential source `{credential_source}`, but no provider is configured for it")]
    UnavailableCredentialSource {
        /// The profile naming the source.
        profile: String,
        /// The source without a provider.
        credential_source: CredentialSource,
    },

    /// A property required by the profile's kind of credentials is missing or empty.
    #[error("profile `{profile}` is missing required property `{property}`")]
    MissingProperty {
        /// The incomplete profile.
        profile: String,
        /// The missing property.
        property: &'static str,
    },

    /// A property has a value that cannot be used.
    #[error("profile `{profile}` has an invalid `{property}`: `{value}`")]
    InvalidProperty {
        /// The misconfigured profile.
        profile: String,
        /// The property.
        property: &'static str,
        /// The rejected value.
        value: String,
    },

    /// The profile assumes a role but no role assumption factory was configured.
    #[error("profile `{profile}` assumes a role, but role assumption is not configured")]
    RoleAssumptionUnsupported {
        /// The profile assuming a role.
        profile: String,
    },

    /// The profile uses a web identity token but no web identity factory was configured.
    #[error("profile `{profile}` uses a web identity token, but web identity federation is not configured")]
    WebIdentityUnsupported {
        /// The profile using web identity.
        profile: String,
    },

    /// A factory failed to construct the provider for a profile.
    #[error("failed to construct the credentials provider for profile `{profile}`")]
    ProviderConstruction {
        /// The profile being resolved.
        profile: String,
        /// The factory's error.
        source: BoxError,
    },
}
