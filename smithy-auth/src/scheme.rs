/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Auth schemes and their signers.

use crate::identity::{GetIdentityResolver, Identity, SharedIdentityResolver};
use crate::option::{AuthSchemeId, AuthSchemeOption};
use crate::BoxError;
use bytes::Bytes;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// HTTP request type handed to signers.
pub type HttpRequest = http::Request<Bytes>;

/// An auth scheme.
///
/// Auth schemes have unique identifiers (the `scheme_id`) and provide an identity resolver and
/// a signer.
pub trait AuthScheme: Send + Sync + fmt::Debug {
    /// Returns the unique identifier associated with this auth scheme.
    fn scheme_id(&self) -> AuthSchemeId;

    /// Returns the identity resolver that can resolve an identity for this scheme, if one is available.
    ///
    /// The scheme doesn't own an identity resolver. It chooses a compatible one from the
    /// configured registry, and may use the option's identity properties to do so.
    fn identity_resolver(
        &self,
        identity_resolvers: &dyn GetIdentityResolver,
        option: &AuthSchemeOption,
    ) -> Option<SharedIdentityResolver>;

    /// Returns the signing implementation for this auth scheme.
    fn signer(&self) -> &dyn Sign;
}

/// Container for a shared auth scheme implementation.
#[derive(Clone, Debug)]
pub struct SharedAuthScheme(Arc<dyn AuthScheme>);

impl SharedAuthScheme {
    /// Creates a new [`SharedAuthScheme`] from the given auth scheme.
    pub fn new(auth_scheme: impl AuthScheme + 'static) -> Self {
        Self(Arc::new(auth_scheme))
    }
}

impl AuthScheme for SharedAuthScheme {
    fn scheme_id(&self) -> AuthSchemeId {
        self.0.scheme_id()
    }

    fn identity_resolver(
        &self,
        identity_resolvers: &dyn GetIdentityResolver,
        option: &AuthSchemeOption,
    ) -> Option<SharedIdentityResolver> {
        self.0.identity_resolver(identity_resolvers, option)
    }

    fn signer(&self) -> &dyn Sign {
        self.0.signer()
    }
}

/// Signing implementation for an auth scheme.
pub trait Sign: Send + Sync + fmt::Debug {
    /// Sign the given request with the given identity.
    ///
    /// If the provided identity is incompatible with this signer, an error must be returned.
    fn sign_http_request(
        &self,
        request: &mut HttpRequest,
        identity: &Identity,
        option: &AuthSchemeOption,
    ) -> Result<(), BoxError>;
}

/// The auth schemes enabled for a request, keyed by scheme ID.
#[derive(Clone, Debug, Default)]
pub struct AuthSchemes {
    schemes: HashMap<AuthSchemeId, SharedAuthScheme>,
}

impl AuthSchemes {
    /// Returns a builder for a set of enabled schemes.
    pub fn builder() -> AuthSchemesBuilder {
        AuthSchemesBuilder::default()
    }

    /// Returns the enabled scheme with the given ID.
    pub fn scheme(&self, scheme_id: &AuthSchemeId) -> Option<&SharedAuthScheme> {
        self.schemes.get(scheme_id)
    }
}

/// Builder for [`AuthSchemes`].
#[derive(Debug, Default)]
pub struct AuthSchemesBuilder {
    schemes: HashMap<AuthSchemeId, SharedAuthScheme>,
}

impl AuthSchemesBuilder {
    /// Enables `auth_scheme` under its own scheme ID.
    pub fn auth_scheme(mut self, auth_scheme: impl AuthScheme + 'static) -> Self {
        let auth_scheme = SharedAuthScheme::new(auth_scheme);
        self.schemes.insert(auth_scheme.scheme_id(), auth_scheme);
        self
    }

    /// Builds the set of enabled schemes.
    pub fn build(self) -> AuthSchemes {
        AuthSchemes {
            schemes: self.schemes,
        }
    }
}
