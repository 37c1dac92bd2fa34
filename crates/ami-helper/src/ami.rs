//! Hashtag and dataset lookups built on the executor

use tracing::{debug, warn};

use crate::client::AmiClient;
use crate::datamodel::{add_hash_to_addr, make_central_page_hash_address, CentralPageHashAddress};
use crate::error::AmiError;
use crate::executor::{execute, execute_command};
use crate::query::{self, LDN_COLUMN};
use crate::scope::Scope;

/// Hashtags in `scope` whose name contains `search` (case-insensitive),
/// each as an address with only its own level filled
pub fn find_hashtag<C>(
    client: &C,
    scope: Scope,
    search: &str,
) -> Result<Vec<CentralPageHashAddress>, AmiError>
where
    C: AmiClient + ?Sized,
{
    let result = execute(client, scope.descriptor(), search)?;

    result
        .rows()
        .iter()
        .map(|row| {
            make_central_page_hash_address(scope, row.require("SCOPE")?, row.require("NAME")?)
        })
        .collect()
}

/// Extend `addr` with every hashtag at level `missing_index` that shares a
/// dataset with the hashtags already in it
pub fn find_missing_tag<C>(
    client: &C,
    addr: &CentralPageHashAddress,
    missing_index: usize,
) -> Result<Vec<CentralPageHashAddress>, AmiError>
where
    C: AmiClient + ?Sized,
{
    let command = query::missing_tag(addr.scope.descriptor(), addr, missing_index)?;
    let result = execute_command(client, &command)?;

    result
        .rows()
        .iter()
        .map(|row| add_hash_to_addr(addr, row.require("SCOPE")?, row.require("NAME")?))
        .collect()
}

/// Every complete 4-tuple reachable from `addr`, filling empty levels in
/// ascending order
pub fn find_hashtag_tuples<C>(
    client: &C,
    addr: &CentralPageHashAddress,
) -> Result<Vec<CentralPageHashAddress>, AmiError>
where
    C: AmiClient + ?Sized,
{
    let mut frontier = vec![addr.clone()];

    for index in addr.missing_indices() {
        let mut next = Vec::new();
        for partial in &frontier {
            next.extend(find_missing_tag(client, partial, index)?);
        }
        debug!("Level {} expanded {} -> {} addresses", index + 1, frontier.len(), next.len());

        if next.is_empty() {
            warn!("No datasets carry {} plus a level {} hashtag", addr, index + 1);
            return Ok(next);
        }
        frontier = next;
    }

    Ok(frontier)
}

/// Logical dataset names carrying every hashtag in `addr`
pub fn find_dids_with_hashtags<C>(
    client: &C,
    addr: &CentralPageHashAddress,
) -> Result<Vec<String>, AmiError>
where
    C: AmiClient + ?Sized,
{
    let command = query::datasets_with_hashtags(addr.scope.descriptor(), addr)?;
    let result = execute_command(client, &command)?;

    result
        .rows()
        .iter()
        .map(|row| row.require(LDN_COLUMN).map(str::to_string))
        .collect()
}
