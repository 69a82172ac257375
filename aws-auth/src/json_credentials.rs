/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Raw credential material and the loader that turns it into [`Credentials`].
//!
//! Credential endpoints (instance metadata, container metadata, `credential_process`) return
//! a small JSON document:
//!
//! ```json
//! {
//!   "AccessKeyId": "ASIARTESTID",
//!   "SecretAccessKey": "TESTSECRETKEY",
//!   "Token": "TESTSESSIONTOKEN",
//!   "Expiration": "2024-01-01T00:00:00Z",
//!   "AccountId": "123456789012"
//! }
//! ```

use aws_smithy_types::date_time::Format;
use aws_smithy_types::DateTime;
use aws_types::credential::InvalidCredentials;
use aws_types::Credentials;
use serde::Deserialize;
use std::error::Error;
use std::fmt;
use std::time::SystemTime;
use zeroize::Zeroizing;

/// Raw, unvalidated credential fields as returned by a fetcher.
#[derive(Clone, Default)]
#[non_exhaustive]
pub struct RawCredentials {
    /// `AccessKeyId`
    pub access_key_id: Option<String>,
    /// `SecretAccessKey`
    pub secret_access_key: Option<Zeroizing<String>>,
    /// `Token` (`SessionToken` in `credential_process` output)
    pub session_token: Option<Zeroizing<String>>,
    /// `Expiration`, unparsed
    pub expiration: Option<String>,
    /// `AccountId`
    pub account_id: Option<String>,
}

impl fmt::Debug for RawCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |field: &Option<Zeroizing<String>>| field.as_ref().map(|_| "** redacted **");
        f.debug_struct("RawCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &redact(&self.secret_access_key))
            .field("session_token", &redact(&self.session_token))
            .field("expiration", &self.expiration)
            .field("account_id", &self.account_id)
            .finish()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct JsonCredentials {
    version: Option<i64>,
    access_key_id: Option<String>,
    secret_access_key: Option<String>,
    #[serde(alias = "SessionToken")]
    token: Option<String>,
    expiration: Option<String>,
    account_id: Option<String>,
}

impl RawCredentials {
    /// Creates raw credentials from an access key ID and secret access key.
    pub fn from_keys(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: Some(access_key_id.into()),
            secret_access_key: Some(Zeroizing::new(secret_access_key.into())),
            ..Default::default()
        }
    }

    /// Sets the session token.
    pub fn with_session_token(mut self, session_token: impl Into<String>) -> Self {
        self.session_token = Some(Zeroizing::new(session_token.into()));
        self
    }

    /// Sets the unparsed expiration.
    pub fn with_expiration(mut self, expiration: impl Into<String>) -> Self {
        self.expiration = Some(expiration.into());
        self
    }

    /// Parses raw credentials out of a credentials JSON document.
    ///
    /// Unknown keys are ignored. When a `Version` key is present it must be `1`.
    pub fn from_json(document: &str) -> Result<Self, LoadError> {
        let json: JsonCredentials = serde_json::from_str(document).map_err(LoadError::InvalidJson)?;
        match json.version {
            None | Some(1) => {}
            Some(version) => return Err(LoadError::UnsupportedVersion(version)),
        }
        Ok(Self {
            access_key_id: json.access_key_id,
            secret_access_key: json.secret_access_key.map(Zeroizing::new),
            session_token: json.token.map(Zeroizing::new),
            expiration: json.expiration,
            account_id: json.account_id,
        })
    }
}

/// Error returned when raw credentials could not be turned into [`Credentials`].
#[derive(Debug)]
#[non_exhaustive]
pub enum LoadError {
    /// The document was not valid credentials JSON.
    InvalidJson(serde_json::Error),
    /// The document declared a `Version` other than 1.
    UnsupportedVersion(i64),
    /// A required field was absent.
    MissingField(&'static str),
    /// `Expiration` was not an ISO-8601 date-time.
    BadExpiration {
        /// The rejected value.
        value: String,
        /// Why it was rejected.
        source: Box<dyn Error + Send + Sync + 'static>,
    },
    /// The fields were present but did not form valid credentials.
    InvalidCredentials(InvalidCredentials),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::InvalidJson(_) => write!(f, "credentials response was not valid JSON"),
            LoadError::UnsupportedVersion(version) => write!(
                f,
                "credentials response version {} is not supported (expected 1)",
                version
            ),
            LoadError::MissingField(field) => {
                write!(f, "credentials response is missing `{}`", field)
            }
            LoadError::BadExpiration { value, .. } => {
                write!(f, "credentials expiration `{}` is not a valid date-time", value)
            }
            LoadError::InvalidCredentials(_) => write!(f, "credentials response was invalid"),
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LoadError::InvalidJson(err) => Some(err as _),
            LoadError::BadExpiration { source, .. } => Some(source.as_ref() as _),
            LoadError::InvalidCredentials(err) => Some(err as _),
            LoadError::UnsupportedVersion(_) | LoadError::MissingField(_) => None,
        }
    }
}

/// Parses an ISO-8601 expiration.
///
/// Offsets are converted to UTC. A trailing `+0000` offset (which some credential endpoints
/// emit) is treated as `Z`.
pub fn parse_expiration(value: &str) -> Result<SystemTime, LoadError> {
    let bad_expiration = |source: Box<dyn Error + Send + Sync>| LoadError::BadExpiration {
        value: value.to_string(),
        source,
    };
    let normalized = match value.strip_suffix("+0000") {
        Some(prefix) => format!("{}Z", prefix),
        None => value.to_string(),
    };
    let date_time = DateTime::from_str(&normalized, Format::DateTimeWithOffset)
        .map_err(|err| bad_expiration(err.into()))?;
    SystemTime::try_from(date_time).map_err(|err| bad_expiration(err.into()))
}

/// Turns [`RawCredentials`] into [`Credentials`] attributed to one provider.
///
/// Loading is pure: it does not consult the clock, so credentials that have already expired
/// load successfully and are rejected by the cache instead.
#[derive(Clone, Debug)]
pub struct CredentialsLoader {
    provider_name: &'static str,
}

impl CredentialsLoader {
    /// Creates a loader whose credentials report `provider_name`.
    pub fn new(provider_name: &'static str) -> Self {
        Self { provider_name }
    }

    /// Validates `raw` and converts it into credentials.
    pub fn load(&self, raw: RawCredentials) -> Result<Credentials, LoadError> {
        let access_key_id = raw
            .access_key_id
            .ok_or(LoadError::MissingField("AccessKeyId"))?;
        let secret_access_key = raw
            .secret_access_key
            .ok_or(LoadError::MissingField("SecretAccessKey"))?;
        let expiration = raw
            .expiration
            .as_deref()
            .map(parse_expiration)
            .transpose()?;
        let credentials = Credentials::new(
            access_key_id,
            secret_access_key.as_str(),
            raw.session_token.map(|token| token.to_string()),
            expiration,
            self.provider_name,
        )
        .map_err(LoadError::InvalidCredentials)?;
        Ok(match raw.account_id {
            Some(account_id) => credentials.with_account_id(account_id),
            None => credentials,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::{Duration, UNIX_EPOCH};

    const FULL_RESPONSE: &str = r#"{
        "Code" : "Success",
        "LastUpdated" : "2021-09-17T20:57:08Z",
        "Type" : "AWS-HMAC",
        "AccessKeyId" : "ASIARTEST",
        "SecretAccessKey" : "xjtest",
        "Token" : "IQote///test",
        "Expiration" : "2021-09-18T03:31:56Z",
        "AccountId" : "123456789012"
    }"#;

    #[test]
    fn loads_a_full_response() {
        let raw = RawCredentials::from_json(FULL_RESPONSE).unwrap();
        let creds = CredentialsLoader::new("Ec2InstanceMetadata").load(raw).unwrap();
        assert_eq!("ASIARTEST", creds.access_key_id());
        assert_eq!("xjtest", creds.secret_access_key());
        assert_eq!(Some("IQote///test"), creds.session_token());
        assert_eq!(
            Some(UNIX_EPOCH + Duration::from_secs(1631935916)),
            creds.expiry()
        );
        assert_eq!("123456789012", creds.account_id().unwrap().as_str());
        assert_eq!("Ec2InstanceMetadata", creds.provider_name());
    }

    #[test]
    fn offset_without_colon_is_utc() {
        let zulu = parse_expiration("2024-01-01T00:00:00Z").unwrap();
        let offset = parse_expiration("2024-01-01T00:00:00+0000").unwrap();
        assert_eq!(zulu, offset);
        assert_eq!(UNIX_EPOCH + Duration::from_secs(1704067200), offset);
    }

    #[test]
    fn unparseable_expiration_is_fatal() {
        let raw = RawCredentials::from_keys("akid", "secret").with_expiration("next tuesday");
        match CredentialsLoader::new("test").load(raw) {
            Err(LoadError::BadExpiration { value, .. }) => assert_eq!("next tuesday", value),
            other => panic!("expected BadExpiration, got {:?}", other),
        }
    }

    #[test]
    fn missing_required_fields() {
        let raw = RawCredentials::from_json(r#"{"SecretAccessKey": "secret"}"#).unwrap();
        assert!(matches!(
            CredentialsLoader::new("test").load(raw),
            Err(LoadError::MissingField("AccessKeyId"))
        ));
        let raw = RawCredentials::from_json(r#"{"AccessKeyId": "akid"}"#).unwrap();
        assert!(matches!(
            CredentialsLoader::new("test").load(raw),
            Err(LoadError::MissingField("SecretAccessKey"))
        ));
    }

    #[test]
    fn process_output_shape() {
        let raw = RawCredentials::from_json(
            r#"{
                "Version": 1,
                "AccessKeyId": "ASIARTESTID",
                "SecretAccessKey": "TESTSECRETKEY",
                "SessionToken": "TESTSESSIONTOKEN",
                "Expiration": "2022-05-02T18:36:00+00:00"
            }"#,
        )
        .unwrap();
        let creds = CredentialsLoader::new("CredentialProcess").load(raw).unwrap();
        assert_eq!(Some("TESTSESSIONTOKEN"), creds.session_token());
        assert_eq!(
            Some(UNIX_EPOCH + Duration::from_secs(1651516560)),
            creds.expiry()
        );

        assert!(matches!(
            RawCredentials::from_json(
                r#"{"Version": 2, "AccessKeyId": "a", "SecretAccessKey": "b"}"#
            ),
            Err(LoadError::UnsupportedVersion(2))
        ));
    }

    #[test]
    fn debug_redacts_secrets() {
        let raw = RawCredentials::from_keys("akid", "secret").with_session_token("token");
        let debug = format!("{:?}", raw);
        assert!(debug.contains("akid"));
        assert!(!debug.contains("secret\""));
        assert!(!debug.contains("token\""));
    }
}
