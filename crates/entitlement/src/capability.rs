//! Worker capability tags and their dependency graph.
//!
//! Capabilities gate optional worker behavior per bot. A capability may
//! require others; [`close_over_dependencies`] expands a requested set to a
//! consistent one, so a bot granted `elite` always carries `base` too.

use std::{collections::BTreeSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::EntitlementError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// Core mirroring features: points, redeems, standard commands.
    Base,
    /// Premium worker features layered on top of the core set.
    Elite,
}

impl Capability {
    pub const ALL: &'static [Capability] = &[Self::Base, Self::Elite];

    /// Capabilities this one cannot function without.
    pub fn requires(self) -> &'static [Capability] {
        match self {
            Self::Base => &[],
            Self::Elite => &[Self::Base],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Elite => "elite",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = EntitlementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "base" => Ok(Self::Base),
            "elite" => Ok(Self::Elite),
            other => Err(EntitlementError::UnknownCapability(other.to_string())),
        }
    }
}

/// Ordered capability set. `BTreeSet` keeps serialization deterministic.
pub type CapabilitySet = BTreeSet<Capability>;

/// Expands `caps` with every transitive requirement.
///
/// The graph is declared on [`Capability::requires`]; this walks it rather
/// than special-casing any pair, so new capabilities only need to state
/// their own edges.
pub fn close_over_dependencies(caps: &CapabilitySet) -> CapabilitySet {
    let mut closed = caps.clone();
    let mut queue: Vec<Capability> = caps.iter().copied().collect();
    while let Some(cap) = queue.pop() {
        for &dep in cap.requires() {
            if closed.insert(dep) {
                queue.push(dep);
            }
        }
    }
    closed
}
