//! Seed candidate determination
//!
//! The candidate pipeline turns a snapshot of the world — one unscheduled
//! Shoot, all Seeds, all Shoots, the referenced CloudProfile — into a
//! single Seed, or a scheduling error explaining why no Seed qualifies.
//! Stages run in a fixed order, each shrinking the candidate list:
//!
//! 1. usable Seeds (not deleting, visible, ready)
//! 2. CloudProfile seed selector, then Shoot seed selector
//! 3. provider match (with `providerTypes` wildcard support)
//! 4. multi-zonal Seeds for zone-tolerant control planes
//! 5. eligibility: network disjointness, taint tolerations, capacity
//! 6. strategy: same region or minimal region distance
//! 7. tie-break: fewest currently hosted Shoots
//!
//! Every stage is a pure function over its inputs; the pipeline holds no
//! state between runs.

use crate::conditions::{
    is_condition_true, SEED_BACKUP_BUCKETS_READY, SEED_BOOTSTRAPPED, SEED_GARDENLET_READY,
};
use crate::config::Strategy;
use crate::crd::{
    CloudProfile, Seed, SeedSelector, SeedTaint, Shoot, Toleration, FAILURE_TOLERANCE_ZONE,
    PURPOSE_TESTING, RESOURCE_SHOOTS,
};
use crate::network;
use crate::selector::Selector;
use kube::ResourceExt;
use std::collections::BTreeMap;
use std::fmt;

/// Initial running minimum of the region-distance search. Any real region
/// pair scores far below this.
const MAX_REGION_DISTANCE: usize = 1000;

/// Distance penalty for Seeds of a different provider than the Shoot.
const CROSS_PROVIDER_PENALTY: usize = 2;

/// A scheduling failure, carrying enough context to diagnose it from the
/// surfaced event alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulingError {
    /// No Seed survived the usability filter
    NoUsableSeeds { considered: usize },
    /// A seed selector failed to compile
    InvalidSelector { kind: &'static str, reason: String },
    /// No Seed carries the labels a selector requires
    NoSeedsMatchingSelector {
        kind: &'static str,
        selector: String,
        considered: usize,
    },
    /// No Seed has an admissible provider type
    NoSeedsMatchingProvider { provider: String, considered: usize },
    /// No Seed has enough zones for a zone-tolerant control plane
    NoMultiZonalSeeds { considered: usize },
    /// Every remaining Seed was rejected by an eligibility predicate
    NoEligibleSeeds {
        considered: usize,
        rejections: BTreeMap<String, String>,
    },
    /// The strategy stage eliminated every remaining Seed
    NoCandidatesForStrategy {
        cloud_profile: String,
        region: String,
        strategy: Strategy,
    },
}

impl fmt::Display for SchedulingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulingError::NoUsableSeeds { considered } => write!(
                f,
                "none of the {} seeds is valid for scheduling (not deleting, visible and ready)",
                considered
            ),
            SchedulingError::InvalidSelector { kind, reason } => write!(
                f,
                "label selector conversion failed for seed selector of '{}': {}",
                kind, reason
            ),
            SchedulingError::NoSeedsMatchingSelector {
                kind,
                selector,
                considered,
            } => write!(
                f,
                "none out of the {} seeds has the matching labels required by seed selector of '{}' (selector: '{}')",
                considered, kind, selector
            ),
            SchedulingError::NoSeedsMatchingProvider {
                provider,
                considered,
            } => write!(
                f,
                "none out of the {} seeds has a matching provider for '{}'",
                considered, provider
            ),
            SchedulingError::NoMultiZonalSeeds { considered } => write!(
                f,
                "none of the {} seeds has at least 3 zones for hosting a shoot control plane with failure tolerance type 'zone'",
                considered
            ),
            SchedulingError::NoEligibleSeeds {
                considered,
                rejections,
            } => {
                let entries: Vec<String> = rejections
                    .iter()
                    .map(|(seed, reason)| format!("{} => {}", seed, reason))
                    .collect();
                write!(
                    f,
                    "0/{} seed cluster candidate(s) are eligible for scheduling: {{{}}}",
                    considered,
                    entries.join(", ")
                )
            }
            SchedulingError::NoCandidatesForStrategy {
                cloud_profile,
                region,
                strategy,
            } => write!(
                f,
                "no matching seed candidate found for configuration (cloud profile '{}', region '{}', strategy '{}')",
                cloud_profile, region, strategy
            ),
        }
    }
}

impl std::error::Error for SchedulingError {}

/// Runs the full candidate pipeline and returns the chosen Seed.
pub fn determine_seed(
    shoot: &Shoot,
    seeds: &[Seed],
    shoots: &[Shoot],
    cloud_profile: &CloudProfile,
    strategy: Strategy,
) -> Result<Seed, SchedulingError> {
    let usage = calculate_seed_usage(shoots);

    let candidates = filter_usable_seeds(seeds.to_vec())?;
    let candidates = filter_matching_label_selector(
        candidates,
        cloud_profile.spec.seed_selector.as_ref(),
        "CloudProfile",
    )?;
    let candidates =
        filter_matching_label_selector(candidates, shoot.spec.seed_selector.as_ref(), "Shoot")?;
    let candidates = filter_matching_providers(candidates, cloud_profile, shoot)?;
    let candidates = filter_for_zonal_control_planes(candidates, shoot)?;
    let candidates = filter_eligible(candidates, shoot, &usage)?;
    let candidates = apply_strategy(candidates, shoot, strategy)?;

    seed_with_least_shoots(candidates, &usage).ok_or_else(|| {
        SchedulingError::NoCandidatesForStrategy {
            cloud_profile: shoot.spec.cloud_profile_name.clone(),
            region: shoot.spec.region.clone(),
            strategy,
        }
    })
}

/// Counts Shoots per Seed by their `spec.seedName` binding.
pub fn calculate_seed_usage(shoots: &[Shoot]) -> BTreeMap<String, usize> {
    let mut usage = BTreeMap::new();
    for shoot in shoots {
        if let Some(seed_name) = shoot.spec.seed_name.as_ref().filter(|name| !name.is_empty()) {
            *usage.entry(seed_name.clone()).or_insert(0) += 1;
        }
    }
    usage
}

fn filter_usable_seeds(seeds: Vec<Seed>) -> Result<Vec<Seed>, SchedulingError> {
    let considered = seeds.len();
    let usable: Vec<Seed> = seeds.into_iter().filter(|seed| is_usable_seed(seed)).collect();

    if usable.is_empty() {
        return Err(SchedulingError::NoUsableSeeds { considered });
    }
    Ok(usable)
}

fn is_usable_seed(seed: &Seed) -> bool {
    seed.metadata.deletion_timestamp.is_none()
        && seed.spec.settings.scheduling.visible
        && seed_is_ready(seed)
}

fn seed_is_ready(seed: &Seed) -> bool {
    let conditions = seed
        .status
        .as_ref()
        .map(|status| status.conditions.as_slice())
        .unwrap_or(&[]);

    if !is_condition_true(conditions, SEED_BOOTSTRAPPED)
        || !is_condition_true(conditions, SEED_GARDENLET_READY)
    {
        return false;
    }

    if seed.spec.backup.is_some() && !is_condition_true(conditions, SEED_BACKUP_BUCKETS_READY) {
        return false;
    }

    true
}

fn filter_matching_label_selector(
    seeds: Vec<Seed>,
    seed_selector: Option<&SeedSelector>,
    kind: &'static str,
) -> Result<Vec<Seed>, SchedulingError> {
    let Some(seed_selector) = seed_selector else {
        return Ok(seeds);
    };

    let selector = Selector::compile(seed_selector).map_err(|err| {
        SchedulingError::InvalidSelector {
            kind,
            reason: err.to_string(),
        }
    })?;

    let considered = seeds.len();
    let empty = BTreeMap::new();
    let matching: Vec<Seed> = seeds
        .into_iter()
        .filter(|seed| selector.matches(seed.metadata.labels.as_ref().unwrap_or(&empty)))
        .collect();

    if matching.is_empty() {
        return Err(SchedulingError::NoSeedsMatchingSelector {
            kind,
            selector: selector.to_string(),
            considered,
        });
    }
    Ok(matching)
}

fn filter_matching_providers(
    seeds: Vec<Seed>,
    cloud_profile: &CloudProfile,
    shoot: &Shoot,
) -> Result<Vec<Seed>, SchedulingError> {
    let enabled: &[String] = cloud_profile
        .spec
        .seed_selector
        .as_ref()
        .map(|selector| selector.provider_types.as_slice())
        .unwrap_or(&[]);

    let considered = seeds.len();
    let matching: Vec<Seed> = seeds
        .into_iter()
        .filter(|seed| {
            provider_matches(&seed.spec.provider.r#type, &shoot.spec.provider.r#type, enabled)
        })
        .collect();

    if matching.is_empty() {
        return Err(SchedulingError::NoSeedsMatchingProvider {
            provider: shoot.spec.provider.r#type.clone(),
            considered,
        });
    }
    Ok(matching)
}

fn provider_matches(seed_provider: &str, shoot_provider: &str, enabled: &[String]) -> bool {
    if enabled.is_empty() {
        return seed_provider == shoot_provider;
    }
    enabled.iter().any(|p| p == "*" || p == seed_provider)
}

/// A control plane with failure tolerance type "zone" needs a Seed
/// spanning at least three zones.
fn filter_for_zonal_control_planes(
    seeds: Vec<Seed>,
    shoot: &Shoot,
) -> Result<Vec<Seed>, SchedulingError> {
    if !has_zonal_failure_tolerance(shoot) {
        return Ok(seeds);
    }

    let considered = seeds.len();
    let matching: Vec<Seed> = seeds
        .into_iter()
        .filter(|seed| seed.spec.provider.zones.len() >= 3)
        .collect();

    if matching.is_empty() {
        return Err(SchedulingError::NoMultiZonalSeeds { considered });
    }
    Ok(matching)
}

fn has_zonal_failure_tolerance(shoot: &Shoot) -> bool {
    shoot
        .spec
        .control_plane
        .as_ref()
        .and_then(|control_plane| control_plane.high_availability.as_ref())
        .is_some_and(|ha| ha.failure_tolerance.r#type == FAILURE_TOLERANCE_ZONE)
}

fn filter_eligible(
    seeds: Vec<Seed>,
    shoot: &Shoot,
    usage: &BTreeMap<String, usize>,
) -> Result<Vec<Seed>, SchedulingError> {
    let considered = seeds.len();
    let mut rejections = BTreeMap::new();
    let mut candidates = Vec::new();

    for seed in seeds {
        match eligibility_rejection(&seed, shoot, usage) {
            Some(reason) => {
                rejections.insert(seed.name_any(), reason);
            }
            None => candidates.push(seed),
        }
    }

    if candidates.is_empty() {
        return Err(SchedulingError::NoEligibleSeeds {
            considered,
            rejections,
        });
    }
    Ok(candidates)
}

fn eligibility_rejection(
    seed: &Seed,
    shoot: &Shoot,
    usage: &BTreeMap<String, usize>,
) -> Option<String> {
    let findings = network_findings(seed, shoot);
    if !findings.is_empty() {
        return Some(format!("invalid networks: [{}]", findings.join(", ")));
    }

    if !taints_are_tolerated(&seed.spec.taints, &shoot.spec.tolerations) {
        return Some("shoot does not tolerate the seed's taints".to_string());
    }

    if let Some(&allocatable) = seed
        .status
        .as_ref()
        .and_then(|status| status.allocatable.get(RESOURCE_SHOOTS))
    {
        let hosted = usage.get(&seed.name_any()).copied().unwrap_or(0);
        if hosted as i64 >= allocatable {
            return Some("seed does not have available capacity for shoots".to_string());
        }
    }

    None
}

/// Collects overlaps between the Shoot's and the Seed's networks. The
/// Shoot's pod/service CIDRs fall back to the Seed's shoot defaults when
/// unset, since those are the CIDRs the Shoot would end up with.
fn network_findings(seed: &Seed, shoot: &Shoot) -> Vec<String> {
    let defaults = seed.spec.networks.shoot_defaults.as_ref();
    let shoot_pods = shoot
        .spec
        .networking
        .pods
        .as_deref()
        .or_else(|| defaults.and_then(|d| d.pods.as_deref()));
    let shoot_services = shoot
        .spec
        .networking
        .services
        .as_deref()
        .or_else(|| defaults.and_then(|d| d.services.as_deref()));

    network::disjointness_findings(&[
        ("shoot node", shoot.spec.networking.nodes.as_deref()),
        ("shoot pod", shoot_pods),
        ("shoot service", shoot_services),
        ("seed node", seed.spec.networks.nodes.as_deref()),
        ("seed pod", Some(seed.spec.networks.pods.as_str())),
        ("seed service", Some(seed.spec.networks.services.as_str())),
    ])
}

/// Every taint must be matched by a toleration with the same key whose
/// value is either absent or equal to the taint's.
fn taints_are_tolerated(taints: &[SeedTaint], tolerations: &[Toleration]) -> bool {
    taints.iter().all(|taint| {
        tolerations.iter().any(|toleration| {
            toleration.key == taint.key
                && (toleration.value.is_none() || toleration.value == taint.value)
        })
    })
}

fn apply_strategy(
    seeds: Vec<Seed>,
    shoot: &Shoot,
    strategy: Strategy,
) -> Result<Vec<Seed>, SchedulingError> {
    let candidates = if shoot.spec.purpose.as_deref() == Some(PURPOSE_TESTING) {
        candidates_of_same_provider(seeds, shoot)
    } else {
        match strategy {
            Strategy::SameRegion => candidates_with_same_region(seeds, shoot),
            Strategy::MinimalDistance => candidates_with_minimal_distance(seeds, shoot),
        }
    };

    if candidates.is_empty() {
        return Err(SchedulingError::NoCandidatesForStrategy {
            cloud_profile: shoot.spec.cloud_profile_name.clone(),
            region: shoot.spec.region.clone(),
            strategy,
        });
    }
    Ok(candidates)
}

/// Testing Shoots only need a provider match; any region will do.
fn candidates_of_same_provider(seeds: Vec<Seed>, shoot: &Shoot) -> Vec<Seed> {
    seeds
        .into_iter()
        .filter(|seed| seed.spec.provider.r#type == shoot.spec.provider.r#type)
        .collect()
}

fn candidates_with_same_region(seeds: Vec<Seed>, shoot: &Shoot) -> Vec<Seed> {
    seeds
        .into_iter()
        .filter(|seed| {
            seed.spec.provider.r#type == shoot.spec.provider.r#type
                && seed.spec.provider.region == shoot.spec.region
        })
        .collect()
}

/// Keeps the Seeds tied at the minimal region distance. Cross-provider
/// Seeds carry a constant penalty so same-provider Seeds win ties without
/// being mandatory.
fn candidates_with_minimal_distance(seeds: Vec<Seed>, shoot: &Shoot) -> Vec<Seed> {
    let mut min_distance = MAX_REGION_DISTANCE;
    let mut candidates = Vec::new();

    for seed in seeds {
        let mut distance = levenshtein(&seed.spec.provider.region, &shoot.spec.region);
        if seed.spec.provider.r#type != shoot.spec.provider.r#type {
            distance += CROSS_PROVIDER_PENALTY;
        }

        if distance == min_distance {
            candidates.push(seed);
        } else if distance < min_distance {
            min_distance = distance;
            candidates = vec![seed];
        }
    }

    candidates
}

/// Levenshtein edit distance between two region codes.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

/// Picks the candidate currently hosting the fewest Shoots. Candidates are
/// sorted by name first so the result does not depend on store ordering;
/// the strict `<` keeps the lexicographically first Seed on load ties.
fn seed_with_least_shoots(
    mut candidates: Vec<Seed>,
    usage: &BTreeMap<String, usize>,
) -> Option<Seed> {
    candidates.sort_by_key(|seed| seed.name_any());

    let mut best: Option<(usize, Seed)> = None;
    for seed in candidates {
        let hosted = usage.get(&seed.name_any()).copied().unwrap_or(0);
        let replace = match &best {
            None => true,
            Some((least, _)) => hosted < *least,
        };
        if replace {
            best = Some((hosted, seed));
        }
    }

    best.map(|(_, seed)| seed)
}
