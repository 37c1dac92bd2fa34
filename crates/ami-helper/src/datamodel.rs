//! Production tag tables and hashtag addresses
//!
//! Each scope with a tag table lists the event-generation, simulation and
//! reconstruction tags that make up its campaigns. A dataset name carries
//! these tags (`..._s4162_r15540_...`), which is how a campaign is
//! recognised from a name alone.
//!
//! Datasets on the PMG central page are labelled with up to four
//! hashtags, one per level PMGL1..PMGL4. A [`CentralPageHashAddress`]
//! holds one slot per level.

use serde::{Serialize, Serializer};
use std::fmt;

use crate::error::AmiError;
use crate::scope::Scope;

/// Hashtag levels, in slot order
pub const HASH_SCOPES: [&str; 4] = ["PMGL1", "PMGL2", "PMGL3", "PMGL4"];

#[derive(Debug, Serialize)]
pub struct EvgenInfo {
    pub short: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SimInfo {
    pub short: &'static str,
    /// Full simulation s-tags
    pub full_sim: &'static [&'static str],
    /// Fast simulation a-tags keyed by flavour ("AF2", "AF3")
    pub fast_sim: &'static [(&'static str, &'static [&'static str])],
}

#[derive(Debug, Serialize)]
pub struct RecoInfo {
    pub short: &'static str,
    /// Campaign name -> r-tags
    pub campaigns: &'static [(&'static str, &'static [&'static str])],
}

#[derive(Debug, Serialize)]
pub struct ScopeTags {
    pub evgen: EvgenInfo,
    pub sim: SimInfo,
    pub reco: RecoInfo,
}

pub static MC16_TAGS: ScopeTags = ScopeTags {
    evgen: EvgenInfo { short: "mc15" },
    sim: SimInfo {
        short: "mc16",
        full_sim: &["s3126"],
        fast_sim: &[("AF2", &["a875"])],
    },
    reco: RecoInfo {
        short: "mc16",
        campaigns: &[
            ("mc16a", &["r9364"]),
            ("mc16d", &["r10201"]),
            ("mc16e", &["r10724"]),
        ],
    },
};

pub static MC20_TAGS: ScopeTags = ScopeTags {
    evgen: EvgenInfo { short: "mc15" },
    sim: SimInfo {
        short: "mc16",
        full_sim: &["s3681", "s4231", "s3797"],
        fast_sim: &[("AF2", &["a907"])],
    },
    reco: RecoInfo {
        short: "mc20",
        campaigns: &[
            ("mc20a", &["r13167", "r14859"]),
            ("mc20d", &["r13144", "r14860"]),
            ("mc20e", &["r13145", "r14861"]),
        ],
    },
};

pub static MC23_TAGS: ScopeTags = ScopeTags {
    evgen: EvgenInfo { short: "mc23" },
    sim: SimInfo {
        short: "mc23",
        full_sim: &["s4162", "s4159", "s4369"],
        fast_sim: &[("AF3", &["a910", "a911", "a934"])],
    },
    reco: RecoInfo {
        short: "mc23",
        campaigns: &[
            ("mc23a", &["r15540", "r14622"]),
            ("mc23d", &["r15530", "r15224"]),
            ("mc23e", &["r16083"]),
        ],
    },
};

/// Every `"<campaign> - <sim flavour>"` label with the `<sim>_<reco>` tag
/// pairs that identify it, in table order (full sim before fast sim)
pub fn tag_combinations(tags: &ScopeTags) -> Vec<(String, Vec<String>)> {
    let mut combinations = Vec::new();

    for &(campaign, reco_tags) in tags.reco.campaigns {
        let flavours = std::iter::once(("FS", tags.sim.full_sim))
            .chain(tags.sim.fast_sim.iter().copied());

        for (flavour, sim_tags) in flavours {
            let pairs = sim_tags
                .iter()
                .flat_map(|s| reco_tags.iter().map(move |r| format!("{}_{}", s, r)))
                .collect();
            combinations.push((format!("{} - {}", campaign, flavour), pairs));
        }
    }

    combinations
}

/// Work out which campaign a dataset name belongs to
pub fn get_campaign(tags: &ScopeTags, dataset: &str) -> Result<String, AmiError> {
    let tokens: Vec<&str> = dataset.split(['.', '_']).collect();
    let pairs: Vec<String> = tokens.windows(2).map(|w| format!("{}_{}", w[0], w[1])).collect();

    tag_combinations(tags)
        .into_iter()
        .find(|(_, combos)| combos.iter().any(|c| pairs.contains(c)))
        .map(|(label, _)| label)
        .ok_or_else(|| AmiError::NoCampaign(dataset.to_string()))
}

/// Slot index for a hash scope name ("PMGL1" -> 0)
pub fn hash_scope_index(hash_scope: &str) -> Result<usize, AmiError> {
    HASH_SCOPES
        .iter()
        .position(|s| *s == hash_scope)
        .ok_or_else(|| AmiError::UnknownHashScope {
            name: hash_scope.to_string(),
            legal: HASH_SCOPES.join(", "),
        })
}

/// A position on the PMG central page: one hashtag per level
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CentralPageHashAddress {
    #[serde(serialize_with = "serialize_scope")]
    pub scope: Scope,
    pub hash_tags: [Option<String>; 4],
}

fn serialize_scope<S: Serializer>(scope: &Scope, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(scope.as_str())
}

impl CentralPageHashAddress {
    pub fn new(scope: Scope, hash_tags: [Option<String>; 4]) -> Self {
        Self { scope, hash_tags }
    }

    /// An address with all four levels filled
    pub fn complete(scope: Scope, tags: [&str; 4]) -> Self {
        Self::new(scope, tags.map(|t| Some(t.to_string())))
    }

    /// Slots that still need a hashtag, ascending
    pub fn missing_indices(&self) -> Vec<usize> {
        self.hash_tags
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_none())
            .map(|(i, _)| i)
            .collect()
    }

    /// Filled slots as (index, hashtag)
    pub fn filled(&self) -> impl Iterator<Item = (usize, &str)> {
        self.hash_tags
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.as_deref().map(|t| (i, t)))
    }

    pub fn is_complete(&self) -> bool {
        self.hash_tags.iter().all(Option::is_some)
    }
}

impl fmt::Display for CentralPageHashAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tags: Vec<&str> = self
            .hash_tags
            .iter()
            .map(|t| t.as_deref().unwrap_or("-"))
            .collect();
        f.write_str(&tags.join(" "))
    }
}

/// Build an address with a single slot filled
pub fn make_central_page_hash_address(
    scope: Scope,
    hash_scope: &str,
    hashtag: &str,
) -> Result<CentralPageHashAddress, AmiError> {
    let index = hash_scope_index(hash_scope)?;
    let mut hash_tags: [Option<String>; 4] = Default::default();
    hash_tags[index] = Some(hashtag.to_string());
    Ok(CentralPageHashAddress::new(scope, hash_tags))
}

/// Copy of `addr` with one more slot filled
pub fn add_hash_to_addr(
    addr: &CentralPageHashAddress,
    hash_scope: &str,
    hashtag: &str,
) -> Result<CentralPageHashAddress, AmiError> {
    let index = hash_scope_index(hash_scope)?;
    let mut next = addr.clone();
    next.hash_tags[index] = Some(hashtag.to_string());
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_address_each_level() {
        for (i, level) in HASH_SCOPES.iter().enumerate() {
            let addr = make_central_page_hash_address(Scope::Mc20, level, "hash123").unwrap();
            assert_eq!(addr.scope, Scope::Mc20);
            for (j, slot) in addr.hash_tags.iter().enumerate() {
                if i == j {
                    assert_eq!(slot.as_deref(), Some("hash123"));
                } else {
                    assert!(slot.is_none());
                }
            }
        }
    }

    #[test]
    fn test_make_address_unknown_level() {
        let err = make_central_page_hash_address(Scope::Mc16, "INVALID_SCOPE", "x").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Unknown hash scope: INVALID_SCOPE"));
        assert!(msg.contains("legal ones:"));
    }

    #[test]
    fn test_add_hash_keeps_existing() {
        let addr = make_central_page_hash_address(Scope::Mc23, "PMGL1", "Top").unwrap();
        let next = add_hash_to_addr(&addr, "PMGL3", "ttbar").unwrap();
        assert_eq!(next.hash_tags[0].as_deref(), Some("Top"));
        assert_eq!(next.hash_tags[2].as_deref(), Some("ttbar"));
        assert_eq!(next.missing_indices(), vec![1, 3]);
        // Original untouched
        assert_eq!(addr.missing_indices(), vec![1, 2, 3]);
    }

    #[test]
    fn test_display() {
        let addr = make_central_page_hash_address(Scope::Mc20, "PMGL2", "Higgs").unwrap();
        assert_eq!(addr.to_string(), "- Higgs - -");

        let full = CentralPageHashAddress::complete(Scope::Mc20, ["a", "b", "c", "d"]);
        assert!(full.is_complete());
        assert_eq!(full.to_string(), "a b c d");
    }

    #[test]
    fn test_serialize_address() {
        let addr = make_central_page_hash_address(Scope::Mc20, "PMGL1", "Top").unwrap();
        let json = serde_json::to_value(&addr).unwrap();
        assert_eq!(json["scope"], "mc20_13TeV");
        assert_eq!(json["hash_tags"][0], "Top");
        assert!(json["hash_tags"][1].is_null());
    }

    #[test]
    fn test_tag_combinations_order() {
        let combos = tag_combinations(&MC23_TAGS);
        let labels: Vec<&str> = combos.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "mc23a - FS",
                "mc23a - AF3",
                "mc23d - FS",
                "mc23d - AF3",
                "mc23e - FS",
                "mc23e - AF3"
            ]
        );
        assert_eq!(
            combos[0].1,
            vec![
                "s4162_r15540",
                "s4162_r14622",
                "s4159_r15540",
                "s4159_r14622",
                "s4369_r15540",
                "s4369_r14622"
            ]
        );
    }

    #[test]
    fn test_campaign_fullsim() {
        let dataset = "mc23_13p6TeV.801167.DAOD_LLP1.e12345_s4162_r15540_p5678";
        assert_eq!(get_campaign(&MC23_TAGS, dataset).unwrap(), "mc23a - FS");
    }

    #[test]
    fn test_campaign_af3() {
        let dataset = "mc23_13p6TeV.801168.AOD.e12345_a910_r15224_p5678";
        assert_eq!(get_campaign(&MC23_TAGS, dataset).unwrap(), "mc23d - AF3");
    }

    #[test]
    fn test_campaign_mc20() {
        let dataset = "mc20_13TeV.410470.PhPy8EG.deriv.DAOD_PHYS.e6337_s3681_r13145_p5855";
        assert_eq!(get_campaign(&MC20_TAGS, dataset).unwrap(), "mc20e - FS");
    }

    #[test]
    fn test_campaign_no_match() {
        let err = get_campaign(&MC23_TAGS, "mc23_13p6TeV.some.dataset.without.tags").unwrap_err();
        assert!(matches!(err, AmiError::NoCampaign(_)));
    }

    #[test]
    fn test_campaign_ignores_partial_tags() {
        // r155401 is not r15540
        let dataset = "mc23_13p6TeV.801167.AOD.e12345_s4162_r155401";
        assert!(get_campaign(&MC23_TAGS, dataset).is_err());
    }
}
