//! ami-helper - Find ATLAS datasets by AMI hashtag
//!
//! Production scopes are a closed set with static descriptors. A lookup
//! renders an AMI `SearchQuery` command for a scope, submits it through an
//! [`AmiClient`], and hands back the validated rows in service order.

pub mod ami;
pub mod client;
pub mod datamodel;
pub mod error;
pub mod executor;
pub mod query;
pub mod scope;

pub use client::{AmiClient, HttpClient, TransportError};
pub use datamodel::CentralPageHashAddress;
pub use error::AmiError;
pub use executor::{execute, execute_command, QueryResult, Row};
pub use scope::{resolve, Scope, ScopeDescriptor};
