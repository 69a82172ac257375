/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::identity::{GetIdentityResolver, SharedIdentityResolver};
use crate::option::{AuthSchemeId, AuthSchemeOption};
use crate::scheme::{AuthScheme, AuthSchemes, SharedAuthScheme, Sign};
use std::fmt;

/// Why an auth scheme option was passed over during selection.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum RejectionReason {
    /// The scheme is not in the set of schemes enabled for the request.
    NotEnabled,
    /// The scheme is enabled, but no compatible identity resolver is configured.
    NoIdentityResolver,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::NotEnabled => f.write_str("scheme not enabled for this request"),
            RejectionReason::NoIdentityResolver => f.write_str("no identity resolver configured"),
        }
    }
}

/// An option that was explored and rejected while selecting an auth scheme.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExploredOption {
    scheme_id: AuthSchemeId,
    reason: RejectionReason,
}

impl ExploredOption {
    /// The scheme ID of the rejected option.
    pub fn scheme_id(&self) -> &AuthSchemeId {
        &self.scheme_id
    }

    /// Why the option was rejected.
    pub fn reason(&self) -> RejectionReason {
        self.reason
    }
}

impl fmt::Display for ExploredOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.scheme_id, self.reason)
    }
}

/// The outcome of auth scheme selection for one request.
#[derive(Clone, Debug)]
pub struct SelectedAuthScheme {
    identity_resolver: Option<SharedIdentityResolver>,
    scheme: Option<SharedAuthScheme>,
    option: AuthSchemeOption,
    explored: Vec<ExploredOption>,
}

impl SelectedAuthScheme {
    /// The identity resolver for the selected scheme. `None` only for `noAuth`.
    pub fn identity_resolver(&self) -> Option<&SharedIdentityResolver> {
        self.identity_resolver.as_ref()
    }

    /// The signer for the selected scheme. `None` only for `noAuth`.
    pub fn signer(&self) -> Option<&dyn Sign> {
        self.scheme.as_ref().map(|scheme| scheme.signer())
    }

    /// The option that was selected.
    pub fn option(&self) -> &AuthSchemeOption {
        &self.option
    }

    /// Options that were rejected before this one was selected, in preference order.
    pub fn explored(&self) -> &[ExploredOption] {
        &self.explored
    }
}

/// Error returned when no auth scheme option could be used for a request.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SelectionError {
    /// Every option was rejected.
    #[error("no auth scheme matched the auth options: [{}]", render_explored(.explored))]
    AllSchemesFailed {
        /// The rejected options, in preference order.
        explored: Vec<ExploredOption>,
    },
}

impl SelectionError {
    /// The options that were rejected, in preference order.
    pub fn explored(&self) -> &[ExploredOption] {
        match self {
            SelectionError::AllSchemesFailed { explored } => explored,
        }
    }
}

fn render_explored(explored: &[ExploredOption]) -> String {
    explored
        .iter()
        .map(ExploredOption::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Selects the auth scheme to use for a request.
///
/// Options are tried in order and the first usable option wins:
/// - `noAuth` is selected immediately, without an identity resolver or signer.
/// - An option whose scheme is not enabled is skipped.
/// - An option whose scheme has no compatible identity resolver is skipped.
///
/// The reason for every skipped option is kept, both on the selected scheme and on the error
/// returned when nothing matched.
pub fn select_auth_scheme(
    options: &[AuthSchemeOption],
    auth_schemes: &AuthSchemes,
    identity_resolvers: &dyn GetIdentityResolver,
) -> Result<SelectedAuthScheme, SelectionError> {
    let mut explored = Vec::new();
    for option in options {
        let scheme_id = option.scheme_id();
        if option.is_no_auth() {
            tracing::debug!(
                scheme_id = %scheme_id,
                explored = %render_explored(&explored),
                "selected auth scheme"
            );
            return Ok(SelectedAuthScheme {
                identity_resolver: None,
                scheme: None,
                option: option.clone(),
                explored,
            });
        }

        let scheme = match auth_schemes.scheme(scheme_id) {
            Some(scheme) => scheme,
            None => {
                explored.push(ExploredOption {
                    scheme_id: scheme_id.clone(),
                    reason: RejectionReason::NotEnabled,
                });
                continue;
            }
        };
        let identity_resolver = match scheme.identity_resolver(identity_resolvers, option) {
            Some(resolver) => resolver,
            None => {
                explored.push(ExploredOption {
                    scheme_id: scheme_id.clone(),
                    reason: RejectionReason::NoIdentityResolver,
                });
                continue;
            }
        };

        tracing::debug!(
            scheme_id = %scheme_id,
            explored = %render_explored(&explored),
            "selected auth scheme"
        );
        return Ok(SelectedAuthScheme {
            identity_resolver: Some(identity_resolver),
            scheme: Some(scheme.clone()),
            option: option.clone(),
            explored,
        });
    }

    tracing::debug!(
        explored = %render_explored(&explored),
        "no auth scheme could be selected"
    );
    Err(SelectionError::AllSchemesFailed { explored })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdentityResolvers;
    use crate::option::NO_AUTH_SCHEME_ID;
    use crate::test_util::{StaticIdentityResolver, TestAuthScheme, SIGV4, SIGV4A};
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    fn sigv4_only() -> (AuthSchemes, IdentityResolvers) {
        (
            AuthSchemes::builder()
                .auth_scheme(TestAuthScheme::new(SIGV4))
                .build(),
            IdentityResolvers::builder()
                .identity_resolver(SIGV4, StaticIdentityResolver::new("creds"))
                .build(),
        )
    }

    #[test]
    fn first_usable_option_wins_and_reasons_are_kept() {
        let (schemes, resolvers) = sigv4_only();
        let options = vec![AuthSchemeOption::new(SIGV4A), AuthSchemeOption::new(SIGV4)];

        let selected = select_auth_scheme(&options, &schemes, &resolvers).expect("sigv4 matches");

        assert_eq!(&SIGV4, selected.option().scheme_id());
        assert!(selected.identity_resolver().is_some());
        assert!(selected.signer().is_some());
        assert_eq!(
            vec![ExploredOption {
                scheme_id: SIGV4A,
                reason: RejectionReason::NotEnabled,
            }],
            selected.explored()
        );
        assert_eq!(
            "sigv4a: scheme not enabled for this request",
            selected.explored()[0].to_string()
        );
    }

    #[test]
    fn no_auth_needs_neither_scheme_nor_resolver() {
        let options = vec![AuthSchemeOption::new(NO_AUTH_SCHEME_ID)];
        let selected = select_auth_scheme(
            &options,
            &AuthSchemes::default(),
            &IdentityResolvers::default(),
        )
        .expect("noAuth always matches");

        assert!(selected.identity_resolver().is_none());
        assert!(selected.signer().is_none());
        assert!(selected.option().is_no_auth());
    }

    #[test]
    fn enabled_scheme_without_resolver_is_skipped() {
        let schemes = AuthSchemes::builder()
            .auth_scheme(TestAuthScheme::new(SIGV4A))
            .auth_scheme(TestAuthScheme::new(SIGV4))
            .build();
        let resolvers = IdentityResolvers::builder()
            .identity_resolver(SIGV4, StaticIdentityResolver::new("creds"))
            .build();
        let options = vec![AuthSchemeOption::new(SIGV4A), AuthSchemeOption::new(SIGV4)];

        let selected = select_auth_scheme(&options, &schemes, &resolvers).expect("sigv4 matches");
        assert_eq!(&SIGV4, selected.option().scheme_id());
        assert_eq!(
            RejectionReason::NoIdentityResolver,
            selected.explored()[0].reason()
        );
    }

    #[test]
    fn all_rejected_is_an_error_listing_every_option() {
        let schemes = AuthSchemes::builder()
            .auth_scheme(TestAuthScheme::new(SIGV4))
            .build();
        let options = vec![AuthSchemeOption::new(SIGV4A), AuthSchemeOption::new(SIGV4)];

        let err = select_auth_scheme(&options, &schemes, &IdentityResolvers::default())
            .expect_err("nothing matches");

        assert_eq!(2, err.explored().len());
        assert_eq!(
            "no auth scheme matched the auth options: [sigv4a: scheme not enabled for this request, sigv4: no identity resolver configured]",
            err.to_string()
        );
    }

    #[test]
    fn empty_option_list_fails() {
        let (schemes, resolvers) = sigv4_only();
        let err = select_auth_scheme(&[], &schemes, &resolvers).expect_err("no options");
        assert!(err.explored().is_empty());
    }

    #[test]
    #[traced_test]
    fn selection_logs_why_options_were_skipped() {
        let (schemes, resolvers) = sigv4_only();
        let options = vec![AuthSchemeOption::new(SIGV4A), AuthSchemeOption::new(SIGV4)];

        select_auth_scheme(&options, &schemes, &resolvers).expect("sigv4 matches");

        assert!(logs_contain("selected auth scheme"));
        assert!(logs_contain("scheme_id=sigv4"));
        assert!(logs_contain("sigv4a: scheme not enabled for this request"));
    }

    #[test]
    #[traced_test]
    fn failed_selection_logs_every_rejection() {
        let schemes = AuthSchemes::builder()
            .auth_scheme(TestAuthScheme::new(SIGV4))
            .build();
        let options = vec![AuthSchemeOption::new(SIGV4A), AuthSchemeOption::new(SIGV4)];

        select_auth_scheme(&options, &schemes, &IdentityResolvers::default())
            .expect_err("nothing matches");

        assert!(logs_contain("no auth scheme could be selected"));
        assert!(logs_contain("sigv4a: scheme not enabled for this request"));
        assert!(logs_contain("sigv4: no identity resolver configured"));
    }
}
