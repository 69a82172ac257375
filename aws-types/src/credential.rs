/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! AWS SDK Credentials
//!
//! ## Implementing your own credentials provider
//!
//! [`Credentials`] implement [`ProvideCredentials`] directly, so static credentials need no
//! custom provider:
//! ```rust
//! use aws_types::credential::SharedCredentialsProvider;
//! use aws_types::Credentials;
//!
//! let creds = Credentials::from_keys("akid", "secret_key", None).expect("keys are not blank");
//! let provider = SharedCredentialsProvider::new(creds);
//! ```
//!
//! Dynamically loaded credentials are best provided by defining an inherent `async fn` on your
//! structure, then calling it from the trait implementation:
//! ```rust
//! use aws_types::credential::{future, provide_credentials, CredentialsError, ProvideCredentials};
//! use aws_types::Credentials;
//!
//! #[derive(Debug)]
//! struct SubprocessCredentialProvider;
//!
//! async fn invoke_command(command: &str) -> String {
//!     // implementation elided...
//!     # String::from("akid\nsecret")
//! }
//!
//! /// Parse access key and secret from the first two lines of a string
//! fn parse_credentials(creds: &str) -> provide_credentials::Result {
//!     let mut lines = creds.lines();
//!     let akid = lines.next().ok_or_else(|| CredentialsError::provider_error("missing access key"))?;
//!     let secret = lines.next().ok_or_else(|| CredentialsError::provider_error("missing secret"))?;
//!     Credentials::new(akid, secret, None, None, "CustomCommand")
//!         .map_err(CredentialsError::provider_error)
//! }
//!
//! impl SubprocessCredentialProvider {
//!     async fn load_credentials(&self) -> provide_credentials::Result {
//!         let creds = invoke_command("load-credentials.py").await;
//!         parse_credentials(&creds)
//!     }
//! }
//!
//! impl ProvideCredentials for SubprocessCredentialProvider {
//!     fn provide_credentials<'a>(&'a self) -> future::ProvideCredentials<'a>
//!     where
//!         Self: 'a,
//!     {
//!         future::ProvideCredentials::new(self.load_credentials())
//!     }
//! }
//! ```

mod credential_fn;
pub mod credentials;
pub mod provide_credentials;

pub use credential_fn::{provide_credentials_fn, ProvideCredentialsFn};
pub use credentials::{Credentials, InvalidCredentials};
pub use provide_credentials::error;
pub use provide_credentials::future;
pub use provide_credentials::{
    CredentialsError, ProvideCredentials, Result, SharedCredentialsProvider,
};
