//! Production scope registry
//!
//! The supported scopes are fixed at build time. Each one maps to a static
//! [`ScopeDescriptor`] carrying what a query needs: the AMI catalog to
//! search, the join columns between datasets and hashtags, and the
//! campaign tag table when one is known.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::datamodel::{ScopeTags, MC16_TAGS, MC20_TAGS, MC23_TAGS};
use crate::error::AmiError;

/// Columns correlating hashtag membership to dataset identity:
/// `DATASET.IDENTIFIER = HASHTAGS.DATASETFK`
const HASHTAG_JOIN: &[&str] = &["IDENTIFIER", "DATASETFK"];

/// A Monte Carlo production scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Scope {
    #[value(name = "mc16_13TeV")]
    Mc16,
    #[value(name = "mc20_13TeV")]
    Mc20,
    #[value(name = "mc21_13p6TeV")]
    Mc21,
    #[value(name = "mc23_13p6TeV")]
    Mc23,
}

/// Static description of a scope
#[derive(Debug, Serialize)]
pub struct ScopeDescriptor {
    /// Full scope name, e.g. `mc20_13TeV`
    pub name: &'static str,

    /// Scope prefix, e.g. `mc20`
    pub short: &'static str,

    /// AMI catalog holding this scope's event-generation metadata
    pub table_hint: &'static str,

    /// `[dataset key, hashtag foreign key]`
    pub join_columns: &'static [&'static str],

    /// Campaign tag table, when known
    pub tags: Option<&'static ScopeTags>,
}

static MC16: ScopeDescriptor = ScopeDescriptor {
    name: "mc16_13TeV",
    short: "mc16",
    table_hint: "mc15_001:production",
    join_columns: HASHTAG_JOIN,
    tags: Some(&MC16_TAGS),
};

static MC20: ScopeDescriptor = ScopeDescriptor {
    name: "mc20_13TeV",
    short: "mc20",
    table_hint: "mc15_001:production",
    join_columns: HASHTAG_JOIN,
    tags: Some(&MC20_TAGS),
};

static MC21: ScopeDescriptor = ScopeDescriptor {
    name: "mc21_13p6TeV",
    short: "mc21",
    table_hint: "mc21_001:production",
    join_columns: HASHTAG_JOIN,
    tags: None,
};

static MC23: ScopeDescriptor = ScopeDescriptor {
    name: "mc23_13p6TeV",
    short: "mc23",
    table_hint: "mc23_001:production",
    join_columns: HASHTAG_JOIN,
    tags: Some(&MC23_TAGS),
};

impl Scope {
    pub const ALL: [Scope; 4] = [
        Scope::Mc16,
        Scope::Mc20,
        Scope::Mc21,
        Scope::Mc23,
    ];

    /// The descriptor for this scope
    pub fn descriptor(self) -> &'static ScopeDescriptor {
        match self {
            Scope::Mc16 => &MC16,
            Scope::Mc20 => &MC20,
            Scope::Mc21 => &MC21,
            Scope::Mc23 => &MC23,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.descriptor().name
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = AmiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scope::ALL
            .into_iter()
            .find(|scope| scope.as_str() == s)
            .ok_or_else(|| AmiError::UnknownScope {
                name: s.to_string(),
                legal: legal_names(),
            })
    }
}

fn legal_names() -> String {
    Scope::ALL
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Look up the descriptor for a scope name
pub fn resolve(name: &str) -> Result<&'static ScopeDescriptor, AmiError> {
    name.parse::<Scope>().map(Scope::descriptor)
}

impl ScopeDescriptor {
    /// The campaign tag table, or a lookup error for scopes without one
    pub fn scope_tags(&self) -> Result<&'static ScopeTags, AmiError> {
        self.tags.ok_or_else(|| AmiError::UnknownScope {
            name: self.short.to_string(),
            legal: Scope::ALL
                .iter()
                .map(|s| s.descriptor())
                .filter(|d| d.tags.is_some())
                .map(|d| d.short)
                .collect::<Vec<_>>()
                .join(", "),
        })
    }

    /// Dataset side of the hashtag join
    pub fn dataset_key(&self) -> &'static str {
        self.join_columns[0]
    }

    /// Hashtag side of the hashtag join
    pub fn hashtag_key(&self) -> &'static str {
        self.join_columns[1]
    }
}
