/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Credentials providers that source credentials from named profiles, environment variables and
//! external processes.
//!
//! The entry point for profile based configuration is
//! [`ProfileCredentialsProvider`](profile::ProfileCredentialsProvider). Its chain resolution is
//! available on its own through [`ProfileChainResolver`](profile::ProfileChainResolver).

#![warn(
    missing_debug_implementations,
    missing_docs,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod chain;
pub mod credential_process;
pub mod environment;
pub mod profile;
