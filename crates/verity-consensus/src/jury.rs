//! Diversity-constrained jury selection

use crate::error::JuryError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::debug;
use verity_domain::ClaimId;

/// A candidate juror
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Juror {
    /// Actor identifier
    pub actor_id: String,
    /// Domain expertise in [0, 1]
    pub expertise: f64,
    /// Historical calibration in [0, 1]
    pub calibration: f64,
    /// Diversity cluster the juror belongs to
    pub diversity_cluster: String,
}

impl Juror {
    /// Build a juror
    pub fn new(actor_id: impl Into<String>, expertise: f64, calibration: f64, cluster: impl Into<String>) -> Self {
        Self {
            actor_id: actor_id.into(),
            expertise,
            calibration,
            diversity_cluster: cluster.into(),
        }
    }

    /// Vote weight: expertise × calibration
    pub fn weight(&self) -> f64 {
        self.expertise * self.calibration
    }

    fn is_eligible(&self) -> bool {
        !self.actor_id.is_empty()
            && (0.0..=1.0).contains(&self.expertise)
            && (0.0..=1.0).contains(&self.calibration)
    }
}

/// Constraints a panel must satisfy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JuryConstraints {
    /// Clusters that must each contribute at least `min_per_cluster` jurors
    #[serde(default)]
    pub required_clusters: Vec<String>,

    /// Minimum seats for each required cluster
    #[serde(default = "default_min_per_cluster")]
    pub min_per_cluster: usize,

    /// Maximum seats any one cluster may hold
    #[serde(default = "default_max_per_cluster")]
    pub max_per_cluster: usize,

    /// Minimum fraction of the pool's clusters the panel must cover
    #[serde(default = "default_quorum_percentage")]
    pub quorum_percentage: f64,

    /// Target panel size
    #[serde(default = "default_panel_size")]
    pub panel_size: usize,
}

fn default_min_per_cluster() -> usize {
    1
}

fn default_max_per_cluster() -> usize {
    3
}

fn default_quorum_percentage() -> f64 {
    0.5
}

fn default_panel_size() -> usize {
    7
}

impl Default for JuryConstraints {
    fn default() -> Self {
        Self {
            required_clusters: Vec::new(),
            min_per_cluster: default_min_per_cluster(),
            max_per_cluster: default_max_per_cluster(),
            quorum_percentage: default_quorum_percentage(),
            panel_size: default_panel_size(),
        }
    }
}

impl JuryConstraints {
    fn validate(&self) -> Result<(), JuryError> {
        if self.panel_size == 0 {
            return Err(JuryError::InvalidConstraints("panel_size must be at least 1".to_string()));
        }
        if self.max_per_cluster == 0 || self.min_per_cluster > self.max_per_cluster {
            return Err(JuryError::InvalidConstraints(format!(
                "min_per_cluster {} / max_per_cluster {} are inconsistent",
                self.min_per_cluster, self.max_per_cluster
            )));
        }
        if !(0.0..=1.0).contains(&self.quorum_percentage) {
            return Err(JuryError::InvalidConstraints(format!(
                "quorum_percentage must be within [0, 1], got {}",
                self.quorum_percentage
            )));
        }
        let reserved = self.required_clusters.len().saturating_mul(self.min_per_cluster);
        if reserved > self.panel_size {
            return Err(JuryError::InvalidConstraints(format!(
                "{} required seats exceed panel_size {}",
                reserved, self.panel_size
            )));
        }
        Ok(())
    }
}

/// A seated juror and their vote weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seat {
    /// The juror
    #[serde(flatten)]
    pub juror: Juror,
    /// expertise × calibration
    pub weight: f64,
}

/// A selected panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    /// Claim the panel was convened for
    pub claim_id: ClaimId,
    /// Seats in selection order
    pub jurors: Vec<Seat>,
    /// Seats per cluster
    pub cluster_counts: BTreeMap<String, usize>,
    /// Fraction of the pool's clusters represented
    pub coverage: f64,
    /// Constraints the panel was selected under
    pub constraints: JuryConstraints,
}

impl Panel {
    /// Number of seats
    pub fn len(&self) -> usize {
        self.jurors.len()
    }

    /// Whether no juror was seated
    pub fn is_empty(&self) -> bool {
        self.jurors.is_empty()
    }

    /// Find a seat by actor id
    pub fn seat(&self, actor_id: &str) -> Option<&Seat> {
        self.jurors.iter().find(|s| s.juror.actor_id == actor_id)
    }
}

/// Selects panels from a candidate pool
///
/// Selection is deterministic: candidates are ranked by calibration
/// (descending), then actor id, then cluster. Required clusters are filled
/// first; remaining seats go to the best-ranked candidates whose cluster is
/// below `max_per_cluster`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JurySelector;

impl JurySelector {
    /// Create a selector
    pub fn new() -> Self {
        Self
    }

    /// Select a panel for `claim_id`
    pub fn select_jury(
        &self,
        claim_id: ClaimId,
        pool: &[Juror],
        constraints: &JuryConstraints,
    ) -> Result<Panel, JuryError> {
        constraints.validate()?;

        let mut ranked: Vec<&Juror> = pool.iter().filter(|j| j.is_eligible()).collect();
        ranked.sort_by(|a, b| {
            b.calibration
                .total_cmp(&a.calibration)
                .then_with(|| a.actor_id.cmp(&b.actor_id))
                .then_with(|| a.diversity_cluster.cmp(&b.diversity_cluster))
        });
        let mut seen_ids = HashSet::new();
        ranked.retain(|j| seen_ids.insert(j.actor_id.as_str()));

        let pool_clusters: BTreeSet<&str> = ranked.iter().map(|j| j.diversity_cluster.as_str()).collect();

        let mut seated: Vec<&Juror> = Vec::with_capacity(constraints.panel_size);
        let mut seated_ids: HashSet<&str> = HashSet::new();
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();

        let mut required_seen = HashSet::new();
        for cluster in constraints
            .required_clusters
            .iter()
            .filter(|c| required_seen.insert(c.as_str()))
        {
            let members: Vec<&Juror> = ranked
                .iter()
                .copied()
                .filter(|j| &j.diversity_cluster == cluster)
                .collect();
            if members.len() < constraints.min_per_cluster {
                return Err(JuryError::ClusterShortfall {
                    cluster: cluster.clone(),
                    available: members.len(),
                    required: constraints.min_per_cluster,
                });
            }
            for juror in members.into_iter().take(constraints.min_per_cluster) {
                seated_ids.insert(juror.actor_id.as_str());
                *counts.entry(juror.diversity_cluster.clone()).or_insert(0) += 1;
                seated.push(juror);
            }
        }

        for juror in &ranked {
            if seated.len() >= constraints.panel_size {
                break;
            }
            if seated_ids.contains(juror.actor_id.as_str()) {
                continue;
            }
            let count = counts.entry(juror.diversity_cluster.clone()).or_insert(0);
            if *count >= constraints.max_per_cluster {
                continue;
            }
            *count += 1;
            seated_ids.insert(juror.actor_id.as_str());
            seated.push(juror);
        }
        counts.retain(|_, n| *n > 0);

        let coverage = if pool_clusters.is_empty() {
            0.0
        } else {
            counts.len() as f64 / pool_clusters.len() as f64
        };
        if coverage < constraints.quorum_percentage {
            return Err(JuryError::CoverageBelowQuorum {
                coverage,
                required: constraints.quorum_percentage,
            });
        }

        debug!(
            claim_id = %claim_id,
            seats = seated.len(),
            clusters = counts.len(),
            coverage,
            "Selected jury"
        );

        Ok(Panel {
            claim_id,
            jurors: seated
                .into_iter()
                .map(|j| Seat {
                    juror: j.clone(),
                    weight: j.weight(),
                })
                .collect(),
            cluster_counts: counts,
            coverage,
            constraints: constraints.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pool() -> Vec<Juror> {
        vec![
            Juror::new("alice", 0.9, 0.95, "science"),
            Juror::new("bob", 0.8, 0.90, "science"),
            Juror::new("carol", 0.7, 0.85, "science"),
            Juror::new("dave", 0.6, 0.80, "science"),
            Juror::new("erin", 0.9, 0.60, "law"),
            Juror::new("frank", 0.5, 0.70, "journalism"),
        ]
    }

    #[test]
    fn test_required_clusters_and_cap() {
        let constraints = JuryConstraints {
            required_clusters: vec!["law".to_string(), "journalism".to_string()],
            min_per_cluster: 1,
            max_per_cluster: 2,
            quorum_percentage: 1.0,
            panel_size: 4,
        };
        let panel = JurySelector::new()
            .select_jury(ClaimId::new(), &pool(), &constraints)
            .unwrap();

        let ids: Vec<&str> = panel.jurors.iter().map(|s| s.juror.actor_id.as_str()).collect();
        assert_eq!(ids, vec!["erin", "frank", "alice", "bob"]);
        assert_eq!(panel.cluster_counts.get("science"), Some(&2));
        assert_eq!(panel.coverage, 1.0);
        assert!((panel.seat("alice").unwrap().weight - 0.855).abs() < 1e-9);
    }

    #[test]
    fn test_missing_required_cluster() {
        let constraints = JuryConstraints {
            required_clusters: vec!["science".to_string(), "medicine".to_string()],
            ..Default::default()
        };
        let err = JurySelector::new()
            .select_jury(ClaimId::new(), &pool()[..1], &constraints)
            .unwrap_err();
        assert!(matches!(err, JuryError::ClusterShortfall { ref cluster, available: 0, .. } if cluster == "medicine"));
    }

    #[test]
    fn test_coverage_below_quorum() {
        let constraints = JuryConstraints {
            max_per_cluster: 1,
            quorum_percentage: 1.0,
            panel_size: 1,
            ..Default::default()
        };
        let err = JurySelector::new()
            .select_jury(ClaimId::new(), &pool(), &constraints)
            .unwrap_err();
        assert!(matches!(err, JuryError::CoverageBelowQuorum { .. }));
    }

    #[test]
    fn test_invalid_constraints() {
        let constraints = JuryConstraints {
            required_clusters: vec!["a".to_string(), "b".to_string()],
            min_per_cluster: 2,
            panel_size: 3,
            ..Default::default()
        };
        let err = JurySelector::new()
            .select_jury(ClaimId::new(), &pool(), &constraints)
            .unwrap_err();
        assert!(matches!(err, JuryError::InvalidConstraints(_)));
    }

    #[test]
    fn test_ineligible_and_duplicate_candidates_skipped() {
        let mut candidates = pool();
        candidates.push(Juror::new("alice", 0.1, 0.1, "law"));
        candidates.push(Juror::new("ghost", f64::NAN, 0.9, "law"));
        let panel = JurySelector::new()
            .select_jury(ClaimId::new(), &candidates, &JuryConstraints::default())
            .unwrap();
        assert!(panel.seat("ghost").is_none());
        assert_eq!(panel.jurors.iter().filter(|s| s.juror.actor_id == "alice").count(), 1);
        assert_eq!(panel.seat("alice").unwrap().juror.diversity_cluster, "science");
    }

    fn arb_pool() -> impl Strategy<Value = Vec<Juror>> {
        prop::collection::vec(
            (0u8..20, 0.0f64..=1.0, 0.0f64..=1.0, 0u8..4).prop_map(|(id, e, c, k)| {
                Juror::new(format!("j{}", id), e, c, format!("cluster{}", k))
            }),
            0..24,
        )
    }

    proptest! {
        #[test]
        fn prop_selection_is_deterministic(pool in arb_pool(), size in 1usize..8, max in 1usize..4) {
            let constraints = JuryConstraints {
                max_per_cluster: max,
                quorum_percentage: 0.0,
                panel_size: size,
                ..Default::default()
            };
            let claim_id = ClaimId::new();
            let selector = JurySelector::new();
            let first = selector.select_jury(claim_id, &pool, &constraints).unwrap();
            let second = selector.select_jury(claim_id, &pool, &constraints).unwrap();
            prop_assert_eq!(&first, &second);

            let mut reversed = pool.clone();
            reversed.reverse();
            let third = selector.select_jury(claim_id, &reversed, &constraints).unwrap();
            let ids = |p: &Panel| p.jurors.iter().map(|s| s.juror.actor_id.clone()).collect::<Vec<_>>();
            prop_assert_eq!(ids(&first), ids(&third));

            prop_assert!(first.len() <= size);
            prop_assert!(first.cluster_counts.values().all(|n| *n <= max));
        }
    }
}
