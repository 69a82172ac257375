/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Credentials Provider for external process

use aws_auth::json_credentials::{CredentialsLoader, RawCredentials};
use aws_types::credential::{self, future, CredentialsError, ProvideCredentials};
use std::borrow::Cow;
use std::fmt;
use tokio::process::Command;

/// External process credentials provider
///
/// This credentials provider runs a configured external process and parses
/// its output to retrieve credentials. The external process must exit with
/// status 0 and output the following JSON format to `stdout` to provide credentials:
///
/// ```json
/// {
///     "Version": 1,
///     "AccessKeyId": "access key id",
///     "SecretAccessKey": "secret access key",
///     "SessionToken": "session token",
///     "Expiration": "time that the expiration will expire"
/// }
/// ```
///
/// The `Version` must be set to 1. `AccessKeyId` and `SecretAccessKey` are always required.
/// `SessionToken`, `Expiration` and `AccountId` are optional.
///
/// The process is run with `sh -c` (`cmd.exe /C` on Windows) and killed if the load is dropped
/// before it exits.
///
/// **Note:** The credential process provider is meant to be used with a
/// [`LazyCachingCredentialsProvider`](aws_auth::provider::LazyCachingCredentialsProvider), which
/// bounds each run with a timeout and reuses the output until it expires.
#[derive(Clone)]
pub struct CredentialProcessProvider {
    command: String,
    account_id: Option<String>,
}

pub(crate) fn debug_fmt_command_string(command: &str) -> Cow<'_, str> {
    match command.find(char::is_whitespace) {
        Some(index) => Cow::Owned(format!("{} ** arguments redacted **", &command[0..index])),
        None => Cow::Borrowed(command),
    }
}

impl fmt::Debug for CredentialProcessProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // command arguments can hold secrets
        f.debug_struct("CredentialProcessProvider")
            .field("command", &debug_fmt_command_string(&self.command))
            .field("account_id", &self.account_id)
            .finish()
    }
}

impl ProvideCredentials for CredentialProcessProvider {
    fn provide_credentials<'a>(&'a self) -> future::ProvideCredentials<'a>
    where
        Self: 'a,
    {
        future::ProvideCredentials::new(self.credentials())
    }
}

impl CredentialProcessProvider {
    /// Create new [`CredentialProcessProvider`]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            account_id: None,
        }
    }

    /// Account ID to attach to credentials whose output does not name one.
    pub fn with_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    async fn credentials(&self) -> credential::Result {
        tracing::debug!(
            command = %debug_fmt_command_string(&self.command),
            "loading credentials from external process"
        );

        let mut command = if cfg!(windows) {
            let mut command = Command::new("cmd.exe");
            command.args(["/C", self.command.as_str()]);
            command
        } else {
            let mut command = Command::new("sh");
            command.args(["-c", self.command.as_str()]);
            command
        };
        command.kill_on_drop(true);

        let output = command.output().await.map_err(|e| {
            CredentialsError::provider_error(format!(
                "Error retrieving credentials from external process: {}",
                e
            ))
        })?;

        // command arguments may be logged at trace level only
        tracing::trace!(
            command = ?command,
            status = ?output.status,
            "executed command (unredacted)"
        );
        tracing::debug!(
            command = %debug_fmt_command_string(&self.command),
            status = ?output.status,
            "executed command"
        );

        if !output.status.success() {
            let reason =
                std::str::from_utf8(&output.stderr).unwrap_or("could not decode stderr as UTF-8");
            return Err(CredentialsError::provider_error(format!(
                "Error retrieving credentials: external process exited with {}. Stderr: {}",
                output.status, reason
            )));
        }

        let output = std::str::from_utf8(&output.stdout).map_err(|e| {
            CredentialsError::provider_error(format!(
                "Error retrieving credentials from external process: could not decode output as UTF-8: {}",
                e
            ))
        })?;

        let mut raw = RawCredentials::from_json(output).map_err(CredentialsError::provider_error)?;
        if raw.account_id.is_none() {
            raw.account_id = self.account_id.clone();
        }
        CredentialsLoader::new("CredentialProcess")
            .load(raw)
            .map_err(CredentialsError::provider_error)
    }
}
