/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! The AWS credentials value type.

use crate::attributes::AccountId;
use aws_smithy_types::date_time::Format;
use aws_smithy_types::DateTime;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;
use zeroize::Zeroizing;

/// AWS SDK Credentials
///
/// An opaque struct representing credentials that may be used in an AWS SDK, modeled on
/// the [CRT credentials implementation](https://github.com/awslabs/aws-c-auth/blob/main/source/credentials.c).
///
/// Credentials are immutable and cheap to clone. Basic and session credentials share this one
/// type and differ only in whether a session token is present.
///
/// When `Credentials` is dropped, its contents are zeroed in memory. Credentials uses an interior Arc to ensure
/// that even when cloned, credentials don't exist in multiple memory locations.
#[derive(Clone, Eq, PartialEq)]
pub struct Credentials(Arc<Inner>);

#[derive(Clone, Eq, PartialEq)]
struct Inner {
    access_key_id: Zeroizing<String>,
    secret_access_key: Zeroizing<String>,
    session_token: Zeroizing<Option<String>>,

    /// Credential Expiry
    ///
    /// A SystemTime at which the credentials should no longer be used because they have expired.
    /// The primary purpose of this value is to allow credentials to communicate to the caching
    /// provider when they need to be refreshed.
    ///
    /// If these credentials never expire, this value will be set to `None`
    expires_after: Option<SystemTime>,

    account_id: Option<AccountId>,

    provider_name: &'static str,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut creds = f.debug_struct("Credentials");
        creds
            .field("provider_name", &self.0.provider_name)
            .field("access_key_id", &self.0.access_key_id.as_str())
            .field("secret_access_key", &"** redacted **");
        if self.0.session_token.is_some() {
            creds.field("session_token", &"** redacted **");
        }
        match self.0.expires_after {
            Some(expiry) => creds.field("expires_after", &fmt_system_time(expiry)),
            None => creds.field("expires_after", &"never"),
        };
        if let Some(account_id) = &self.0.account_id {
            creds.field("account_id", &account_id.as_str());
        }
        creds.finish()
    }
}

/// Formats `time` as an RFC-3339 date-time, falling back to its `Debug` output.
pub(crate) fn fmt_system_time(time: SystemTime) -> String {
    DateTime::from(time)
        .fmt(Format::DateTime)
        .unwrap_or_else(|_| format!("{:?}", time))
}

const STATIC_CREDENTIALS: &str = "Static";

impl Credentials {
    /// Creates credentials, validating that the access key ID and secret access key are not blank.
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
        expires_after: Option<SystemTime>,
        provider_name: &'static str,
    ) -> Result<Self, InvalidCredentials> {
        let access_key_id = Zeroizing::new(access_key_id.into());
        let secret_access_key = Zeroizing::new(secret_access_key.into());
        if access_key_id.trim().is_empty() {
            return Err(InvalidCredentials::blank("access_key_id"));
        }
        if secret_access_key.trim().is_empty() {
            return Err(InvalidCredentials::blank("secret_access_key"));
        }
        Ok(Credentials(Arc::new(Inner {
            access_key_id,
            secret_access_key,
            session_token: Zeroizing::new(session_token),
            expires_after,
            account_id: None,
            provider_name,
        })))
    }

    /// Creates non-expiring credentials attributed to the `Static` provider.
    pub fn from_keys(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
    ) -> Result<Self, InvalidCredentials> {
        Self::new(
            access_key_id,
            secret_access_key,
            session_token,
            None,
            STATIC_CREDENTIALS,
        )
    }

    /// Returns a copy of these credentials scoped to `account_id`.
    pub fn with_account_id(mut self, account_id: impl Into<AccountId>) -> Self {
        Arc::make_mut(&mut self.0).account_id = Some(account_id.into());
        self
    }

    /// Returns the access key ID.
    pub fn access_key_id(&self) -> &str {
        &self.0.access_key_id
    }

    /// Returns the secret access key.
    pub fn secret_access_key(&self) -> &str {
        &self.0.secret_access_key
    }

    /// Returns the session token, if these are session credentials.
    pub fn session_token(&self) -> Option<&str> {
        self.0.session_token.as_deref()
    }

    /// Returns the time after which these credentials must no longer be used.
    pub fn expiry(&self) -> Option<SystemTime> {
        self.0.expires_after
    }

    /// Returns true if these credentials have expired at `now`.
    pub fn is_expired(&self, now: SystemTime) -> bool {
        matches!(self.0.expires_after, Some(expiry) if expiry <= now)
    }

    /// Returns the account ID these credentials are scoped to, if known.
    pub fn account_id(&self) -> Option<&AccountId> {
        self.0.account_id.as_ref()
    }

    /// Returns the name of the provider that produced these credentials.
    pub fn provider_name(&self) -> &'static str {
        self.0.provider_name
    }

    /// Creates static test credentials.
    #[cfg(feature = "test-util")]
    pub fn for_tests() -> Self {
        Self::new(
            "ANOTREAL",
            "notrealrnrELgWzOk3IfjzDKtFBhDby",
            None,
            None,
            "test",
        )
        .expect("test credentials are valid")
    }

    /// Creates static test credentials with a session token.
    #[cfg(feature = "test-util")]
    pub fn for_tests_with_session_token() -> Self {
        Self::new(
            "ANOTREAL",
            "notrealrnrELgWzOk3IfjzDKtFBhDby",
            Some("notarealsessiontoken".to_string()),
            None,
            "test",
        )
        .expect("test credentials are valid")
    }
}

/// Error returned when credentials are constructed from invalid parts.
#[derive(Debug)]
pub struct InvalidCredentials {
    field: &'static str,
}

impl InvalidCredentials {
    fn blank(field: &'static str) -> Self {
        Self { field }
    }

    /// The name of the offending field.
    pub fn field(&self) -> &'static str {
        self.field
    }
}

impl fmt::Display for InvalidCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "credentials field `{}` must not be blank", self.field)
    }
}

impl Error for InvalidCredentials {}
