/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Pieces of data carried alongside credentials.

use std::fmt;
use zeroize::Zeroizing;

/// Unique identifier of the AWS account a set of credentials belongs to.
#[derive(Clone, Eq, PartialEq)]
pub struct AccountId {
    // zeroed on drop
    inner: Zeroizing<String>,
}

impl AccountId {
    /// Return the string equivalent of this account id.
    pub fn as_str(&self) -> &str {
        &self.inner
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccountId").field(&self.as_str()).finish()
    }
}

impl<T> From<T> for AccountId
where
    T: Into<String>,
{
    fn from(value: T) -> Self {
        Self {
            inner: Zeroizing::new(value.into()),
        }
    }
}
