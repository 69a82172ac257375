/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Credential loading and refresh-ahead caching.
//!
//! - [`json_credentials`] parses the credentials JSON shape returned by credential endpoints
//! - [`fetcher`] turns raw fetches into a credentials provider
//! - [`refresh`] caches a single value and refreshes it ahead of expiry
//! - [`provider::LazyCachingCredentialsProvider`] caches another credentials provider

#![warn(
    missing_debug_implementations,
    missing_docs,
    rustdoc::all,
    unreachable_pub
)]

pub mod fetcher;
pub mod json_credentials;
pub mod policy;
pub mod provider;
pub mod refresh;
