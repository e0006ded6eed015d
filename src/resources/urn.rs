//! Resource URN parsing.

use std::fmt;
use std::str::FromStr;

use crate::error::PropertyError;

const URN_PREFIX: &str = "urn:pulumi:";

/// A parsed `urn:pulumi:<stack>::<project>::<type>::<name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Urn {
    /// Stack the resource belongs to.
    pub stack: String,
    /// Project the resource belongs to.
    pub project: String,
    /// Qualified type, parents first, joined by `$`.
    pub qualified_type: String,
    /// Resource name.
    pub name: String,
}

impl Urn {
    /// The resource's own type token, e.g. `pulumiservice:index:Team`.
    #[must_use]
    pub fn type_token(&self) -> &str {
        self.qualified_type
            .rsplit('$')
            .next()
            .unwrap_or(&self.qualified_type)
    }
}

impl FromStr for Urn {
    type Err = PropertyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix(URN_PREFIX)
            .ok_or_else(|| PropertyError::invalid_id("urn", s))?;

        match rest.splitn(4, "::").collect::<Vec<_>>().as_slice() {
            [stack, project, qualified_type, name] if !qualified_type.is_empty() => Ok(Self {
                stack: (*stack).to_string(),
                project: (*project).to_string(),
                qualified_type: (*qualified_type).to_string(),
                name: (*name).to_string(),
            }),
            _ => Err(PropertyError::invalid_id("urn", s)),
        }
    }
}

impl fmt::Display for Urn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{URN_PREFIX}{}::{}::{}::{}",
            self.stack, self.project, self.qualified_type, self.name
        )
    }
}
