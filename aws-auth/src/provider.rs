/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Credentials providers built on the refresh-ahead cache.

pub mod lazy_caching;

pub use lazy_caching::LazyCachingCredentialsProvider;
