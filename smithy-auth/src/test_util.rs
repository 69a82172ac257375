/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::identity::{
    future::IdentityFuture, GetIdentityResolver, Identity, IdentityProperties, ResolveIdentity,
    SharedIdentityResolver,
};
use crate::option::{AuthSchemeId, AuthSchemeOption};
use crate::scheme::{AuthScheme, HttpRequest, Sign};
use crate::BoxError;

pub(crate) const SIGV4: AuthSchemeId = AuthSchemeId::new("sigv4");
pub(crate) const SIGV4A: AuthSchemeId = AuthSchemeId::new("sigv4a");

#[derive(Debug)]
pub(crate) struct StaticIdentityResolver {
    data: &'static str,
}

impl StaticIdentityResolver {
    pub(crate) fn new(data: &'static str) -> Self {
        Self { data }
    }
}

impl ResolveIdentity for StaticIdentityResolver {
    fn resolve_identity<'a>(&'a self, _properties: &'a IdentityProperties) -> IdentityFuture<'a> {
        IdentityFuture::ready(Ok(Identity::new(self.data, None)))
    }
}

#[derive(Debug)]
pub(crate) struct TestSigner;

impl Sign for TestSigner {
    fn sign_http_request(
        &self,
        request: &mut HttpRequest,
        identity: &Identity,
        _option: &AuthSchemeOption,
    ) -> Result<(), BoxError> {
        let data = identity
            .data::<&'static str>()
            .ok_or("identity was not a static str")?;
        request
            .headers_mut()
            .insert(http::header::AUTHORIZATION, data.parse()?);
        Ok(())
    }
}

#[derive(Debug)]
pub(crate) struct TestAuthScheme {
    scheme_id: AuthSchemeId,
    signer: TestSigner,
}

impl TestAuthScheme {
    pub(crate) fn new(scheme_id: AuthSchemeId) -> Self {
        Self {
            scheme_id,
            signer: TestSigner,
        }
    }
}

impl AuthScheme for TestAuthScheme {
    fn scheme_id(&self) -> AuthSchemeId {
        self.scheme_id.clone()
    }

    fn identity_resolver(
        &self,
        identity_resolvers: &dyn GetIdentityResolver,
        _option: &AuthSchemeOption,
    ) -> Option<SharedIdentityResolver> {
        identity_resolvers.identity_resolver(&self.scheme_id)
    }

    fn signer(&self) -> &dyn Sign {
        &self.signer
    }
}
