// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A resource-description compiler.
//!
//! Scoria turns a normalized set of deployment options for one infrastructure
//! resource kind into a [`scoria_api_types::ResourceDocument`]: a nested
//! key/value tree conforming to the target deployment service's versioned
//! template schema.
//!
//! Compilation is a pure function. Each [`ResourceConfiguration`] carries
//! everything the compiler needs, including the feature-gating
//! [`scoria_api_types::VersionTable`]; there is no I/O, no logging, no shared
//! state, and no randomness (random name components, where wanted, are
//! supplied by the caller). A compile call either produces one complete,
//! internally consistent document or fails with a [`CompileError`] naming the
//! offending field; it never emits a partial document or silently defaults
//! past a contradiction in its input.

pub mod compile;
pub mod error;
pub(crate) mod naming;
pub mod resolver;
pub mod storage_profile;

pub use compile::ResourceConfiguration;
pub use error::CompileError;
pub use storage_profile::StorageProfileVariant;
