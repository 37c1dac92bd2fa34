//! AMI command rendering
//!
//! Every lookup is an AMI `SearchQuery` against one scope's catalog.
//! Identifiers are backtick quoted, string literals single quoted with
//! embedded quotes doubled.

use serde::Serialize;
use std::fmt;

use crate::datamodel::{CentralPageHashAddress, HASH_SCOPES};
use crate::error::AmiError;
use crate::scope::ScopeDescriptor;

pub const DATASET_TABLE: &str = "DATASET";
pub const HASHTAGS_TABLE: &str = "HASHTAGS";

/// Logical dataset name column of `DATASET`
pub const LDN_COLUMN: &str = "LOGICALDATASETNAME";

/// Query language of a `SearchQuery`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Entity-relative MQL, no FROM clause
    Mql,
    Sql,
}

impl Language {
    fn flag(self) -> &'static str {
        match self {
            Language::Mql => "mql",
            Language::Sql => "sql",
        }
    }
}

/// A rendered AMI `SearchQuery` command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AmiCommand {
    pub catalog: String,
    pub entity: String,
    pub language: Language,
    pub text: String,
}

impl fmt::Display for AmiCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SearchQuery -catalog=\"{}\" -entity=\"{}\" -{}=\"{}\"",
            self.catalog,
            self.entity,
            self.language.flag(),
            self.text.replace('"', "\\\"")
        )
    }
}

fn ident(name: &str) -> String {
    format!("`{}`", name)
}

fn column(table: &str, name: &str) -> String {
    format!("{}.{}", ident(table), ident(name))
}

fn literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Hashtags whose name contains `search`, case-insensitively
pub fn hashtag_search(descriptor: &ScopeDescriptor, search: &str) -> AmiCommand {
    let pattern = format!("%{}%", search.to_lowercase());
    let text = format!(
        "SELECT DISTINCT {},{} WHERE LOWER({}) LIKE {}",
        ident("NAME"),
        ident("SCOPE"),
        ident("NAME"),
        literal(&pattern)
    );

    AmiCommand {
        catalog: descriptor.table_hint.to_string(),
        entity: HASHTAGS_TABLE.to_string(),
        language: Language::Mql,
        text,
    }
}

/// `DATASET.IDENTIFIER IN (...)` for each filled slot of `addr`
fn membership_conditions(
    descriptor: &ScopeDescriptor,
    addr: &CentralPageHashAddress,
) -> Vec<String> {
    addr.filled()
        .map(|(n, hashtag)| {
            let alias = format!("h{}", n + 1);
            format!(
                "{} IN (SELECT {} FROM {} {} WHERE {}={} AND {}={})",
                column(DATASET_TABLE, descriptor.dataset_key()),
                column(&alias, descriptor.hashtag_key()),
                ident(HASHTAGS_TABLE),
                ident(&alias),
                column(&alias, "SCOPE"),
                literal(HASH_SCOPES[n]),
                column(&alias, "NAME"),
                literal(hashtag)
            )
        })
        .collect()
}

/// Hashtags at level `missing_index` on datasets carrying every hashtag
/// already in `addr`
pub fn missing_tag(
    descriptor: &ScopeDescriptor,
    addr: &CentralPageHashAddress,
    missing_index: usize,
) -> Result<AmiCommand, AmiError> {
    let level = HASH_SCOPES.get(missing_index).ok_or_else(|| {
        AmiError::InvalidInput(format!("hashtag level {} out of range", missing_index + 1))
    })?;

    let mut conditions = vec![format!("{}={}", column(HASHTAGS_TABLE, "SCOPE"), literal(level))];
    conditions.extend(membership_conditions(descriptor, addr));

    let text = format!(
        "SELECT DISTINCT {},{} FROM {} JOIN {} ON {}={} WHERE {}",
        column(HASHTAGS_TABLE, "SCOPE"),
        column(HASHTAGS_TABLE, "NAME"),
        ident(DATASET_TABLE),
        ident(HASHTAGS_TABLE),
        column(DATASET_TABLE, descriptor.dataset_key()),
        column(HASHTAGS_TABLE, descriptor.hashtag_key()),
        conditions.join(" AND ")
    );

    Ok(AmiCommand {
        catalog: descriptor.table_hint.to_string(),
        entity: DATASET_TABLE.to_string(),
        language: Language::Sql,
        text,
    })
}

/// Logical dataset names carrying every hashtag in `addr`
pub fn datasets_with_hashtags(
    descriptor: &ScopeDescriptor,
    addr: &CentralPageHashAddress,
) -> Result<AmiCommand, AmiError> {
    let conditions = membership_conditions(descriptor, addr);
    if conditions.is_empty() {
        return Err(AmiError::InvalidInput(
            "at least one hashtag is needed to search for datasets".to_string(),
        ));
    }

    let text = format!(
        "SELECT DISTINCT {} FROM {} WHERE {}",
        column(DATASET_TABLE, LDN_COLUMN),
        ident(DATASET_TABLE),
        conditions.join(" AND ")
    );

    Ok(AmiCommand {
        catalog: descriptor.table_hint.to_string(),
        entity: DATASET_TABLE.to_string(),
        language: Language::Sql,
        text,
    })
}
