/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Credentials shared by AWS SDK clients and the providers that load them.

#![warn(
    missing_debug_implementations,
    missing_docs,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod attributes;
pub mod credential;
pub mod os_shim_internal;
#[cfg(feature = "test-util")]
pub mod time_source;

pub use credential::Credentials;
