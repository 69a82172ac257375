/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Identities and the resolvers that produce them.

use crate::option::AuthSchemeId;
use aws_smithy_types::Document;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

/// An identity resolved for a request.
///
/// The identity data is type erased; signers downcast it back to the concrete type they expect
/// (for example, AWS credentials) with [`Identity::data`].
#[derive(Clone)]
pub struct Identity {
    data: Arc<dyn Any + Send + Sync>,
    data_debug: Arc<dyn fmt::Debug + Send + Sync>,
    expiration: Option<SystemTime>,
}

impl Identity {
    /// Creates a new identity with the given data and expiration time.
    pub fn new<T>(data: T, expiration: Option<SystemTime>) -> Self
    where
        T: Any + fmt::Debug + Send + Sync,
    {
        let data = Arc::new(data);
        Self {
            data: data.clone(),
            data_debug: data,
            expiration,
        }
    }

    /// Returns the raw identity data if it is of type `T`.
    pub fn data<T: Any>(&self) -> Option<&T> {
        self.data.downcast_ref()
    }

    /// Returns the expiration time of this identity, if any.
    pub fn expiration(&self) -> Option<SystemTime> {
        self.expiration
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("data", &self.data_debug)
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// Properties handed to an identity resolver for a single resolution.
///
/// Built from the selected option's identity properties overlaid with per-request properties.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IdentityProperties {
    properties: HashMap<String, Document>,
}

impl IdentityProperties {
    /// Creates an empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a property, replacing any previous value for `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Document>) {
        self.properties.insert(key.into(), value.into());
    }

    /// Returns the property stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Document> {
        self.properties.get(key)
    }

    /// Returns the property stored under `key` if it is a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.properties.get(key) {
            Some(Document::String(value)) => Some(value),
            _ => None,
        }
    }

    /// Iterates over all properties.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Document)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns true when no properties are set.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for IdentityProperties
where
    K: Into<String>,
    V: Into<Document>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut properties = IdentityProperties::new();
        properties.extend(iter);
        properties
    }
}

impl<K, V> Extend<(K, V)> for IdentityProperties
where
    K: Into<String>,
    V: Into<Document>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

/// Future new-types used by identity resolvers.
pub mod future {
    use super::Identity;
    use crate::BoxError;
    use aws_smithy_async::future::now_or_later::NowOrLater;
    use std::future::Future;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
    type IdentityResult = Result<Identity, BoxError>;

    /// Future new-type that [`ResolveIdentity::resolve_identity`](super::ResolveIdentity::resolve_identity) returns.
    pub struct IdentityFuture<'a>(NowOrLater<IdentityResult, BoxFuture<'a, IdentityResult>>);

    impl<'a> IdentityFuture<'a> {
        /// Creates an `IdentityFuture` from a future.
        pub fn new(future: impl Future<Output = IdentityResult> + Send + 'a) -> Self {
            IdentityFuture(NowOrLater::new(Box::pin(future)))
        }

        /// Creates an `IdentityFuture` that is already resolved.
        pub fn ready(result: IdentityResult) -> Self {
            IdentityFuture(NowOrLater::ready(result))
        }
    }

    impl std::fmt::Debug for IdentityFuture<'_> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("IdentityFuture")
        }
    }

    impl Future for IdentityFuture<'_> {
        type Output = IdentityResult;

        fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
            Pin::new(&mut self.0).poll(cx)
        }
    }
}

/// Resolver for identities.
///
/// Every auth scheme that needs an identity has a compatible resolver. The resolver is invoked
/// once per request and is free to cache; identity resolution must never block the calling
/// thread.
pub trait ResolveIdentity: Send + Sync + fmt::Debug {
    /// Asynchronously resolves an identity for a request.
    fn resolve_identity<'a>(&'a self, properties: &'a IdentityProperties)
        -> future::IdentityFuture<'a>;
}

/// Container for a shared identity resolver.
#[derive(Clone, Debug)]
pub struct SharedIdentityResolver(Arc<dyn ResolveIdentity>);

impl SharedIdentityResolver {
    /// Creates a new [`SharedIdentityResolver`] from the given resolver.
    pub fn new(resolver: impl ResolveIdentity + 'static) -> Self {
        Self(Arc::new(resolver))
    }
}

impl ResolveIdentity for SharedIdentityResolver {
    fn resolve_identity<'a>(
        &'a self,
        properties: &'a IdentityProperties,
    ) -> future::IdentityFuture<'a> {
        self.0.resolve_identity(properties)
    }
}

/// Lookup of identity resolvers by scheme.
pub trait GetIdentityResolver: Send + Sync {
    /// Returns the identity resolver registered for the given scheme ID.
    fn identity_resolver(&self, scheme_id: &AuthSchemeId) -> Option<SharedIdentityResolver>;
}

/// Registry of identity resolvers keyed by auth scheme ID.
#[derive(Clone, Debug, Default)]
pub struct IdentityResolvers {
    resolvers: HashMap<AuthSchemeId, SharedIdentityResolver>,
}

impl IdentityResolvers {
    /// Returns a builder for an identity resolver registry.
    pub fn builder() -> IdentityResolversBuilder {
        IdentityResolversBuilder::default()
    }
}

impl GetIdentityResolver for IdentityResolvers {
    fn identity_resolver(&self, scheme_id: &AuthSchemeId) -> Option<SharedIdentityResolver> {
        self.resolvers.get(scheme_id).cloned()
    }
}

/// Builder for [`IdentityResolvers`].
#[derive(Debug, Default)]
pub struct IdentityResolversBuilder {
    resolvers: HashMap<AuthSchemeId, SharedIdentityResolver>,
}

impl IdentityResolversBuilder {
    /// Registers `resolver` for `scheme_id`, replacing any previous registration.
    pub fn identity_resolver(
        mut self,
        scheme_id: impl Into<AuthSchemeId>,
        resolver: impl ResolveIdentity + 'static,
    ) -> Self {
        self.resolvers
            .insert(scheme_id.into(), SharedIdentityResolver::new(resolver));
        self
    }

    /// Builds the registry.
    pub fn build(self) -> IdentityResolvers {
        IdentityResolvers {
            resolvers: self.resolvers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Login {
        user: &'static str,
    }

    #[test]
    fn identity_data_downcasts_to_its_concrete_type() {
        let identity = Identity::new(Login { user: "alice" }, None);
        assert_eq!(Some(&Login { user: "alice" }), identity.data::<Login>());
        assert!(identity.data::<String>().is_none());
        assert!(format!("{:?}", identity).contains("alice"));
    }

    #[test]
    fn later_properties_replace_earlier_ones() {
        let mut properties: IdentityProperties =
            [("region", "us-east-1"), ("name", "s3")].into_iter().collect();
        properties.extend([("region", "eu-west-1")]);
        assert_eq!(Some("eu-west-1"), properties.get_str("region"));
        assert_eq!(Some("s3"), properties.get_str("name"));
    }
}
