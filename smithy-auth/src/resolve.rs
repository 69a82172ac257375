/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::identity::{Identity, IdentityProperties, ResolveIdentity};
use crate::option::AuthSchemeId;
use crate::select::SelectedAuthScheme;
use crate::BoxError;
use tracing::Instrument;

/// Error returned when the identity resolver of the selected scheme fails.
#[derive(Debug, thiserror::Error)]
#[error("failed to resolve an identity for auth scheme `{scheme_id}`")]
pub struct IdentityResolutionError {
    scheme_id: AuthSchemeId,
    #[source]
    source: BoxError,
}

impl IdentityResolutionError {
    /// The scheme whose identity resolver failed.
    pub fn scheme_id(&self) -> &AuthSchemeId {
        &self.scheme_id
    }
}

/// Resolves the identity for a selected auth scheme.
///
/// The resolver receives the selected option's identity properties overlaid with
/// `request_properties`; a request property replaces an option property with the same key.
///
/// Returns `Ok(None)` without doing any work when `noAuth` was selected.
pub async fn resolve_identity(
    selected: &SelectedAuthScheme,
    request_properties: IdentityProperties,
) -> Result<Option<Identity>, IdentityResolutionError> {
    let resolver = match selected.identity_resolver() {
        Some(resolver) => resolver,
        None => return Ok(None),
    };
    let option = selected.option();

    let mut properties: IdentityProperties = option
        .identity_properties()
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    properties.extend(
        request_properties
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone())),
    );

    let span = tracing::debug_span!("resolve_identity", scheme_id = %option.scheme_id());
    resolver
        .resolve_identity(&properties)
        .instrument(span)
        .await
        .map(Some)
        .map_err(|source| IdentityResolutionError {
            scheme_id: option.scheme_id().clone(),
            source,
        })
}
