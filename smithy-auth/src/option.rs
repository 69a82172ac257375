/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Auth scheme identifiers and the options a request may be authenticated with.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

/// Scheme ID of the sentinel scheme that disables authentication for a request.
///
/// Selecting it never consults an identity resolver or a signer.
pub const NO_AUTH_SCHEME_ID: AuthSchemeId = AuthSchemeId::new("noAuth");

/// New type around an auth scheme ID.
///
/// Each auth scheme must have a unique string identifier associated with it. The identifier is
/// how auth scheme options refer to schemes, and how identity resolvers are registered.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct AuthSchemeId {
    scheme_id: Cow<'static, str>,
}

impl AuthSchemeId {
    /// Creates a new auth scheme ID.
    pub const fn new(scheme_id: &'static str) -> Self {
        Self {
            scheme_id: Cow::Borrowed(scheme_id),
        }
    }

    /// Returns the string equivalent of this auth scheme ID.
    pub fn inner(&self) -> &str {
        &self.scheme_id
    }
}

impl fmt::Display for AuthSchemeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.scheme_id)
    }
}

impl From<&'static str> for AuthSchemeId {
    fn from(scheme_id: &'static str) -> Self {
        Self::new(scheme_id)
    }
}

impl From<String> for AuthSchemeId {
    fn from(scheme_id: String) -> Self {
        Self {
            scheme_id: Cow::Owned(scheme_id),
        }
    }
}

/// One entry of the ordered preference list produced for a request.
///
/// The identity properties are forwarded to the identity resolver (and can be used by a scheme to
/// pick its resolver), for example a signing name or a region set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthSchemeOption {
    scheme_id: AuthSchemeId,
    identity_properties: HashMap<String, String>,
}

impl AuthSchemeOption {
    /// Creates an option for `scheme_id` without identity properties.
    pub fn new(scheme_id: impl Into<AuthSchemeId>) -> Self {
        Self {
            scheme_id: scheme_id.into(),
            identity_properties: HashMap::new(),
        }
    }

    /// Creates an option for `scheme_id` carrying the given identity properties.
    pub fn with_identity_properties<K, V>(
        scheme_id: impl Into<AuthSchemeId>,
        identity_properties: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            scheme_id: scheme_id.into(),
            identity_properties: identity_properties
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Returns the ID of the scheme this option refers to.
    pub fn scheme_id(&self) -> &AuthSchemeId {
        &self.scheme_id
    }

    /// Returns the identity properties declared by this option.
    pub fn identity_properties(&self) -> &HashMap<String, String> {
        &self.identity_properties
    }

    /// Returns a single identity property.
    pub fn identity_property(&self, key: &str) -> Option<&str> {
        self.identity_properties.get(key).map(String::as_str)
    }

    /// Returns true if this is the `noAuth` option.
    pub fn is_no_auth(&self) -> bool {
        self.scheme_id == NO_AUTH_SCHEME_ID
    }
}

impl From<AuthSchemeId> for AuthSchemeOption {
    fn from(scheme_id: AuthSchemeId) -> Self {
        Self::new(scheme_id)
    }
}
