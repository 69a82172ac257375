/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Credentials from environment variables.

use aws_types::credential::{self, future, CredentialsError, ProvideCredentials};
use aws_types::os_shim_internal::Env;
use aws_types::Credentials;
use std::env::VarError;

const ENV_PROVIDER: &str = "Environment";

/// Loads credentials from the process environment.
///
/// - `AWS_ACCESS_KEY_ID` (required)
/// - `AWS_SECRET_ACCESS_KEY`, or `AWS_SECRET_KEY` when it is unset (required)
/// - `AWS_SESSION_TOKEN`
/// - `AWS_ACCOUNT_ID`
///
/// Empty variables are treated as unset. When a required variable is missing the provider
/// returns [`CredentialsError::CredentialsNotLoaded`].
#[derive(Debug, Clone, Default)]
pub struct EnvironmentVariableCredentialsProvider {
    env: Env,
}

impl EnvironmentVariableCredentialsProvider {
    /// Reads the real process environment.
    pub fn new() -> Self {
        Self::new_with_env(Env::real())
    }

    /// Reads `env`. Used to fake the environment in tests.
    pub fn new_with_env(env: Env) -> Self {
        Self { env }
    }

    fn credentials(&self) -> credential::Result {
        let access_key_id = self.required("AWS_ACCESS_KEY_ID")?;
        let secret_access_key = match self.optional("AWS_SECRET_ACCESS_KEY")? {
            Some(secret) => secret,
            None => self.required("AWS_SECRET_KEY").map_err(|_| {
                CredentialsError::not_loaded("environment variable not set: AWS_SECRET_ACCESS_KEY")
            })?,
        };
        let session_token = self.optional("AWS_SESSION_TOKEN")?;
        let account_id = self.optional("AWS_ACCOUNT_ID")?;

        let credentials = Credentials::new(
            access_key_id,
            secret_access_key,
            session_token,
            None,
            ENV_PROVIDER,
        )
        .map_err(CredentialsError::invalid_configuration)?;
        Ok(match account_id {
            Some(account_id) => credentials.with_account_id(account_id),
            None => credentials,
        })
    }

    fn required(&self, name: &'static str) -> Result<String, CredentialsError> {
        self.optional(name)?.ok_or_else(|| {
            CredentialsError::not_loaded(format!("environment variable not set: {}", name))
        })
    }

    fn optional(&self, name: &'static str) -> Result<Option<String>, CredentialsError> {
        match self.env.get(name) {
            Ok(value) if value.trim().is_empty() => Ok(None),
            Ok(value) => Ok(Some(value)),
            Err(VarError::NotPresent) => Ok(None),
            Err(err @ VarError::NotUnicode(_)) => {
                Err(CredentialsError::invalid_configuration(format!("{}: {}", name, err)))
            }
        }
    }
}

impl ProvideCredentials for EnvironmentVariableCredentialsProvider {
    fn provide_credentials<'a>(&'a self) -> future::ProvideCredentials<'a>
    where
        Self: 'a,
    {
        future::ProvideCredentials::ready(self.credentials())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn provider(vars: &[(&str, &str)]) -> EnvironmentVariableCredentialsProvider {
        EnvironmentVariableCredentialsProvider::new_with_env(Env::from_slice(vars))
    }

    #[tokio::test]
    async fn loads_all_variables() {
        let creds = provider(&[
            ("AWS_ACCESS_KEY_ID", "AKID"),
            ("AWS_SECRET_ACCESS_KEY", "SECRET"),
            ("AWS_SESSION_TOKEN", "TOKEN"),
            ("AWS_ACCOUNT_ID", "123456789012"),
        ])
        .provide_credentials()
        .await
        .unwrap();
        assert_eq!("AKID", creds.access_key_id());
        assert_eq!("SECRET", creds.secret_access_key());
        assert_eq!(Some("TOKEN"), creds.session_token());
        assert_eq!("123456789012", creds.account_id().unwrap().as_str());
        assert_eq!(None, creds.expiry());
        assert_eq!("Environment", creds.provider_name());
    }

    #[tokio::test]
    async fn legacy_secret_key_variable() {
        let creds = provider(&[("AWS_ACCESS_KEY_ID", "AKID"), ("AWS_SECRET_KEY", "SECRET")])
            .provide_credentials()
            .await
            .unwrap();
        assert_eq!("SECRET", creds.secret_access_key());
        assert_eq!(None, creds.session_token());
    }

    #[tokio::test]
    async fn missing_or_empty_variables_are_not_loaded() {
        for vars in [
            &[][..],
            &[("AWS_ACCESS_KEY_ID", "AKID")][..],
            &[("AWS_ACCESS_KEY_ID", ""), ("AWS_SECRET_ACCESS_KEY", "SECRET")][..],
        ] {
            let err = provider(vars).provide_credentials().await.unwrap_err();
            assert!(
                matches!(err, CredentialsError::CredentialsNotLoaded(_)),
                "{:?}",
                err
            );
        }
    }
}
