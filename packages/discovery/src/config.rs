// ABOUTME: Discovery engine configuration
// ABOUTME: Prompt grounding bounds, resolver policy, debounce interval, and upload limits

use std::time::Duration;

use vitrine_config::constants::{
    VITRINE_CATALOG_EXCERPT_SIZE, VITRINE_FILTER_DEBOUNCE_MS, VITRINE_HISTORY_WINDOW,
    VITRINE_MAX_IMAGE_BYTES, VITRINE_RESOLVER_MAX_RESULTS, VITRINE_RESOLVER_MIN_SCORE,
};
use vitrine_config::parse_env_or_default_with_validation;
use vitrine_core::DEFAULT_MAX_IMAGE_BYTES;

use crate::resolver::ResolverPolicy;

pub const DEFAULT_CATALOG_EXCERPT_SIZE: usize = 50;
pub const DEFAULT_HISTORY_WINDOW: usize = 2;
pub const DEFAULT_FILTER_DEBOUNCE_MS: u64 = 300;
pub const DEFAULT_WELCOME_MESSAGE: &str =
    "Hi! Tell me what you're looking for, or attach a photo, and I'll find matching products.";

#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryConfig {
    /// Number of catalog products sent to the model as grounding
    pub catalog_excerpt_size: usize,
    /// Number of completed turns sent to the model as history
    pub history_window: usize,
    pub filter_debounce: Duration,
    pub resolver: ResolverPolicy,
    pub max_image_bytes: usize,
    pub welcome_message: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            catalog_excerpt_size: DEFAULT_CATALOG_EXCERPT_SIZE,
            history_window: DEFAULT_HISTORY_WINDOW,
            filter_debounce: Duration::from_millis(DEFAULT_FILTER_DEBOUNCE_MS),
            resolver: ResolverPolicy::default(),
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
        }
    }
}

impl DiscoveryConfig {
    pub fn from_env() -> Self {
        let defaults = ResolverPolicy::default();
        let max_results = parse_env_or_default_with_validation(
            VITRINE_RESOLVER_MAX_RESULTS,
            defaults.max_results.unwrap_or(0),
            |v: usize| v <= 100,
        );
        let min_score = parse_env_or_default_with_validation(
            VITRINE_RESOLVER_MIN_SCORE,
            defaults.min_score.unwrap_or(0),
            |v: u8| v <= 100,
        );

        Self {
            catalog_excerpt_size: parse_env_or_default_with_validation(
                VITRINE_CATALOG_EXCERPT_SIZE,
                DEFAULT_CATALOG_EXCERPT_SIZE,
                |v| (1..=500).contains(&v),
            ),
            history_window: parse_env_or_default_with_validation(
                VITRINE_HISTORY_WINDOW,
                DEFAULT_HISTORY_WINDOW,
                |v| v <= 50,
            ),
            filter_debounce: Duration::from_millis(parse_env_or_default_with_validation(
                VITRINE_FILTER_DEBOUNCE_MS,
                DEFAULT_FILTER_DEBOUNCE_MS,
                |v| v <= 10_000,
            )),
            // 0 disables the corresponding guard
            resolver: ResolverPolicy {
                max_results: (max_results > 0).then_some(max_results),
                min_score: (min_score > 0).then_some(min_score),
            },
            max_image_bytes: parse_env_or_default_with_validation(
                VITRINE_MAX_IMAGE_BYTES,
                DEFAULT_MAX_IMAGE_BYTES,
                |v| v > 0,
            ),
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DiscoveryConfig::default();
        assert_eq!(config.catalog_excerpt_size, 50);
        assert_eq!(config.history_window, 2);
        assert_eq!(config.filter_debounce, Duration::from_millis(300));
        assert_eq!(config.resolver.max_results, Some(5));
        assert_eq!(config.resolver.min_score, Some(70));
    }

    #[test]
    fn test_from_env_zero_disables_resolver_guards() {
        std::env::set_var(VITRINE_RESOLVER_MAX_RESULTS, "0");
        std::env::set_var(VITRINE_RESOLVER_MIN_SCORE, "0");

        let config = DiscoveryConfig::from_env();
        assert_eq!(config.resolver, ResolverPolicy::unbounded());

        std::env::remove_var(VITRINE_RESOLVER_MAX_RESULTS);
        std::env::remove_var(VITRINE_RESOLVER_MIN_SCORE);
    }
}
