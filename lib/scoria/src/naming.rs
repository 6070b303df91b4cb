// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Uniform name rewriting for batch ("count") deployments.
//!
//! When a configuration asks for N instances, every name-bearing field the
//! deployment engine dereferences at provisioning time must be rewritten to
//! an index-parameterized expression. Compilers route all such fields through
//! a [`Namer`] so the rewrite cannot be applied to some names and missed on
//! others.

use scoria_api_types::{CopyDirective, CopyMode, NameExpr};

#[derive(Clone, Copy, Debug)]
pub(crate) struct Namer {
    count: Option<u32>,
}

impl Namer {
    /// A count of 0 or 1 is an ordinary single-instance deployment.
    pub fn new(count: Option<u32>) -> Self {
        Self { count: count.filter(|c| *c > 1) }
    }

    pub fn is_batch(&self) -> bool {
        self.count.is_some()
    }

    /// A name-bearing field value for `base`.
    pub fn name<S: Into<String>>(&self, base: S) -> NameExpr {
        match self.count {
            Some(_) => NameExpr::indexed(base),
            None => NameExpr::literal(base),
        }
    }

    /// A composite name with a fixed trailing part (e.g. a ".vhd" blob
    /// extension) that must survive index insertion.
    pub fn suffixed<S: Into<String>>(&self, prefix: S, suffix: &str) -> NameExpr {
        match self.count {
            Some(_) => NameExpr::Indexed {
                prefix: prefix.into(),
                suffix: suffix.to_owned(),
            },
            None => NameExpr::literal(format!("{}{suffix}", prefix.into())),
        }
    }

    /// The copy directive for the document, when this is a batch deployment.
    pub fn copy_directive(&self, loop_name: &str) -> Option<CopyDirective> {
        self.count.map(|count| CopyDirective {
            name: loop_name.to_owned(),
            count,
            mode: CopyMode::Parallel,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn single_instance_names_are_literal() {
        let namer = Namer::new(None);
        assert_eq!(namer.name("vm1"), NameExpr::literal("vm1"));
        assert!(namer.copy_directive("vmcopy").is_none());

        let namer = Namer::new(Some(1));
        assert!(!namer.is_batch());
        assert_eq!(
            namer.suffixed("osdisk", ".vhd"),
            NameExpr::literal("osdisk.vhd")
        );
    }

    #[test]
    fn batch_names_are_indexed() {
        let namer = Namer::new(Some(3));
        assert!(namer.is_batch());
        assert_eq!(namer.name("vm"), NameExpr::indexed("vm"));
        assert_eq!(
            namer.suffixed("osdisk", ".vhd"),
            NameExpr::Indexed {
                prefix: "osdisk".to_string(),
                suffix: ".vhd".to_string()
            }
        );

        let copy = namer.copy_directive("vmcopy").unwrap();
        assert_eq!(copy.count, 3);
        assert_eq!(copy.mode, CopyMode::Parallel);
    }
}
