// ABOUTME: Maps model-asserted product ids back onto the catalog snapshot
// ABOUTME: Drops unknown ids, attaches score and reason, ranks by score, and applies the result policy

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use tracing::{debug, info};
use vitrine_core::{Product, RecommendationCandidate, ResolvedRecommendation};

use crate::reply::ModelRecommendation;

/// Guards applied after ranking. The prompt asks the model for the same limits,
/// but nothing obliges it to comply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverPolicy {
    pub max_results: Option<usize>,
    pub min_score: Option<u8>,
}

impl Default for ResolverPolicy {
    fn default() -> Self {
        Self {
            max_results: Some(5),
            min_score: Some(70),
        }
    }
}

impl ResolverPolicy {
    /// Keep every resolved candidate
    pub fn unbounded() -> Self {
        Self {
            max_results: None,
            min_score: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecommendationResolver {
    policy: ResolverPolicy,
}

impl RecommendationResolver {
    pub fn new(policy: ResolverPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ResolverPolicy {
        self.policy
    }

    /// Resolve recommendations against `catalog`, best match first.
    /// Ties keep the model's order.
    pub fn resolve(
        &self,
        recommendations: &[ModelRecommendation],
        catalog: &[Product],
    ) -> Vec<ResolvedRecommendation> {
        // Reversed so the first product with a given id wins
        let index: HashMap<&str, &Product> =
            catalog.iter().map(|p| (p.id.as_str(), p)).rev().collect();

        let mut seen = HashSet::new();
        let mut resolved: Vec<ResolvedRecommendation> = recommendations
            .iter()
            .filter_map(|rec| {
                let Some(product) = index.get(rec.product_id.as_str()) else {
                    debug!("Dropping unknown product reference: {}", rec.product_id);
                    return None;
                };
                if !seen.insert(rec.product_id.as_str()) {
                    debug!("Dropping duplicate product reference: {}", rec.product_id);
                    return None;
                }
                Some(ResolvedRecommendation {
                    candidate: RecommendationCandidate {
                        product_id: product.id.clone(),
                        match_score: rec.match_score,
                        reason: rec.reason.clone(),
                    },
                    product: (*product).clone(),
                })
            })
            .collect();

        let matched = resolved.len();
        resolved.sort_by_key(|r| Reverse(r.match_score()));

        if let Some(min_score) = self.policy.min_score {
            resolved.retain(|r| r.match_score() >= min_score);
        }
        if let Some(max_results) = self.policy.max_results {
            resolved.truncate(max_results);
        }

        info!(
            "Resolved {} of {} recommendations ({} matched the catalog)",
            resolved.len(),
            recommendations.len(),
            matched
        );
        resolved
    }
}
