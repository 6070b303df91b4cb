// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Errors that can arise while compiling a resource configuration into a
//! document. All of these are synchronous, non-retryable validation failures
//! that abort the single compile call.

use scoria_api_types::Feature;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum CompileError {
    /// More than one mutually-exclusive selector was populated.
    #[error("configuration is ambiguous: {0} and {1} are both set")]
    ConfigurationAmbiguous(&'static str, &'static str),

    /// A field required by the resolved configuration shape is missing.
    #[error("configuration is incomplete: {context} requires {field}")]
    ConfigurationIncomplete {
        field: &'static str,
        context: &'static str,
    },

    /// A positional side list's length doesn't match the list it annotates.
    #[error(
        "configuration is inconsistent: {list} has {actual} entries but \
         {expected} are required to match the data disk count"
    )]
    ConfigurationInconsistent {
        list: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A field's value lies outside its kind-and-OS-specific enumerated set.
    #[error("{value} is not a supported {field} for {context}")]
    UnsupportedEnumValue {
        field: &'static str,
        value: String,
        context: &'static str,
    },

    /// A feature was toggled on but the version table has no minimum-version
    /// entry for it.
    #[error("no minimum schema version is known for feature {0}")]
    VersionUnsatisfiable(Feature),
}
