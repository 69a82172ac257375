/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use aws_auth::provider::LazyCachingCredentialsProvider;
use aws_auth_providers::chain::ChainProvider;
use aws_auth_providers::environment::EnvironmentVariableCredentialsProvider;
use aws_auth_providers::profile::{
    AssumeRoleRequest, Profile, ProfileChainResolver, ProfileCredentialsProvider, ProfileSet,
};
use aws_types::credential::{
    provide_credentials_fn, CredentialsError, ProvideCredentials, SharedCredentialsProvider,
};
use aws_types::os_shim_internal::Env;
use aws_types::Credentials;
use bytes::Bytes;
use pretty_assertions::assert_eq;
use smithy_auth::scheme::HttpRequest;
use smithy_auth::select::RejectionReason;
use smithy_auth::{
    resolve_identity, select_auth_scheme, AuthScheme, AuthSchemeId, AuthSchemeOption, AuthSchemes,
    BoxError, GetIdentityResolver, Identity, IdentityProperties, IdentityResolvers, Sign,
    SharedIdentityResolver,
};
use std::sync::{Arc, Mutex};

const SIGV4: AuthSchemeId = AuthSchemeId::new("sigv4");
const SIGV4A: AuthSchemeId = AuthSchemeId::new("sigv4a");

#[derive(Debug)]
struct KeyIdSigner;

impl Sign for KeyIdSigner {
    fn sign_http_request(
        &self,
        request: &mut HttpRequest,
        identity: &Identity,
        _option: &AuthSchemeOption,
    ) -> Result<(), BoxError> {
        let credentials = identity
            .data::<Credentials>()
            .ok_or("identity does not hold AWS credentials")?;
        let header = format!("TEST Credential={}", credentials.access_key_id());
        request
            .headers_mut()
            .insert(http::header::AUTHORIZATION, header.parse()?);
        Ok(())
    }
}

#[derive(Debug)]
struct KeyIdScheme {
    signer: KeyIdSigner,
}

impl AuthScheme for KeyIdScheme {
    fn scheme_id(&self) -> AuthSchemeId {
        SIGV4
    }

    fn identity_resolver(
        &self,
        identity_resolvers: &dyn GetIdentityResolver,
        _option: &AuthSchemeOption,
    ) -> Option<SharedIdentityResolver> {
        identity_resolvers.identity_resolver(&SIGV4)
    }

    fn signer(&self) -> &dyn Sign {
        &self.signer
    }
}

fn profiles() -> ProfileSet {
    ProfileSet::new([
        Profile::new(
            "base",
            [
                ("aws_access_key_id", "AKIDBASE"),
                ("aws_secret_access_key", "SECRETBASE"),
            ],
        ),
        Profile::new(
            "dev",
            [
                ("role_arn", "arn:aws:iam::123456789012:role/Dev"),
                ("source_profile", "base"),
            ],
        ),
    ])
}

/// Assumes a role by swapping in fixed credentials, recording the base key it was handed.
fn role_resolver(base_keys: Arc<Mutex<Vec<String>>>) -> ProfileChainResolver {
    ProfileChainResolver::builder()
        .assume_role_factory(move |request: AssumeRoleRequest| {
            let base_keys = base_keys.clone();
            let source = request.source;
            Ok::<_, BoxError>(SharedCredentialsProvider::new(
                provide_credentials_fn(move || {
                    let base_keys = base_keys.clone();
                    let source = source.clone();
                    async move {
                        let base = source.provide_credentials().await?;
                        base_keys
                            .lock()
                            .unwrap()
                            .push(base.access_key_id().to_string());
                        Ok::<_, CredentialsError>(
                            Credentials::new("AKIDROLE", "SECRETROLE", None, None, "AssumeRole")
                                .expect("keys are not blank"),
                        )
                    }
                }),
            ))
        })
        .build()
}

#[tokio::test]
async fn request_is_signed_with_assumed_role_credentials_from_a_profile() {
    let base_keys = Arc::new(Mutex::new(Vec::new()));
    let profile_provider = ProfileCredentialsProvider::builder(profiles())
        .profile_name("dev")
        .resolver(role_resolver(base_keys.clone()))
        .build();
    let chain = ChainProvider::first_try(
        "Environment",
        EnvironmentVariableCredentialsProvider::new_with_env(Env::from_slice(&[])),
    )
    .or_else("Profile", profile_provider);
    let credentials = SharedCredentialsProvider::new(LazyCachingCredentialsProvider::new(chain));

    let auth_schemes = AuthSchemes::builder()
        .auth_scheme(KeyIdScheme { signer: KeyIdSigner })
        .build();
    let identity_resolvers = IdentityResolvers::builder()
        .identity_resolver(SIGV4, credentials)
        .build();
    let options = [AuthSchemeOption::new(SIGV4A), AuthSchemeOption::new(SIGV4)];

    let selected = select_auth_scheme(&options, &auth_schemes, &identity_resolvers)
        .expect("sigv4 is enabled and has a resolver");
    assert_eq!(&SIGV4, selected.option().scheme_id());
    assert_eq!(1, selected.explored().len());
    assert_eq!(&SIGV4A, selected.explored()[0].scheme_id());
    assert_eq!(RejectionReason::NotEnabled, selected.explored()[0].reason());

    for _ in 0..2 {
        let identity = resolve_identity(&selected, IdentityProperties::new())
            .await
            .expect("credentials resolve")
            .expect("sigv4 needs an identity");
        let mut request: HttpRequest = http::Request::builder()
            .uri("https://example.amazonaws.com")
            .body(Bytes::new())
            .unwrap();
        selected
            .signer()
            .expect("sigv4 has a signer")
            .sign_http_request(&mut request, &identity, selected.option())
            .unwrap();
        assert_eq!(
            "TEST Credential=AKIDROLE",
            request.headers()[http::header::AUTHORIZATION]
        );
    }

    // credentials without an expiry are cached after the first load
    assert_eq!(vec!["AKIDBASE".to_string()], *base_keys.lock().unwrap());
}

#[tokio::test]
async fn unconfigured_profile_fails_identity_resolution() {
    let provider = ProfileCredentialsProvider::builder(profiles())
        .profile_name("missing")
        .build();
    let identity_resolvers = IdentityResolvers::builder()
        .identity_resolver(SIGV4, SharedCredentialsProvider::new(provider))
        .build();
    let auth_schemes = AuthSchemes::builder()
        .auth_scheme(KeyIdScheme { signer: KeyIdSigner })
        .build();

    let selected = select_auth_scheme(
        &[AuthSchemeOption::new(SIGV4)],
        &auth_schemes,
        &identity_resolvers,
    )
    .unwrap();
    let err = resolve_identity(&selected, IdentityProperties::new())
        .await
        .unwrap_err();
    assert_eq!(&SIGV4, err.scheme_id());
}
