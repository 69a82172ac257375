/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Auth scheme selection and identity resolution.
//!
//! A client resolves an ordered list of [`AuthSchemeOption`](option::AuthSchemeOption)s for each
//! request. [`select_auth_scheme`](select::select_auth_scheme) walks that list and picks the
//! first option whose scheme is enabled and has an identity resolver configured.
//! [`resolve_identity`](resolve::resolve_identity) then asks the chosen resolver for an
//! [`Identity`](identity::Identity) that the scheme's signer can use.

#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod identity;
pub mod option;
pub mod resolve;
pub mod scheme;
pub mod select;

#[cfg(test)]
mod test_util;

/// A boxed error that is `Send` and `Sync`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub use identity::{
    GetIdentityResolver, Identity, IdentityProperties, IdentityResolvers, ResolveIdentity,
    SharedIdentityResolver,
};
pub use option::{AuthSchemeId, AuthSchemeOption, NO_AUTH_SCHEME_ID};
pub use resolve::{resolve_identity, IdentityResolutionError};
pub use scheme::{AuthScheme, AuthSchemes, Sign, SharedAuthScheme};
pub use select::{select_auth_scheme, SelectedAuthScheme, SelectionError};
