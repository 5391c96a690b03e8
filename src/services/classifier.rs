//! World classification: flat-world detection and exemption lookup.
//!
//! A world is flat when any of these match, checked in order:
//! 1. It is listed in `flat-worlds` (manual override)
//! 2. Its terrain generator's type name contains "flat" or "void"
//! 3. Its name contains "flat", "creative" or "build"
//!
//! All comparisons are case-insensitive. Detection never fails: if the host
//! cannot report a generator, automatic detection stops and the world counts
//! as not flat unless it is listed manually.

use crate::host::WorldRegistry;
use crate::state::ConfigStore;
use regex::Regex;
use std::sync::Arc;

/// Why a world was (or was not) classified as flat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlatDetection {
    /// Listed in the `flat-worlds` configuration
    Manual,
    /// Generator type name matched; carries the lowercased name
    Generator(String),
    /// World name matched a flat-world naming pattern
    NamePattern,
    NotFlat,
}

impl FlatDetection {
    pub fn is_flat(&self) -> bool {
        !matches!(self, FlatDetection::NotFlat)
    }

    /// True for the heuristic outcomes (generator or name).
    pub fn is_auto_detected(&self) -> bool {
        matches!(
            self,
            FlatDetection::Generator(_) | FlatDetection::NamePattern
        )
    }
}

/// Classifies worlds against the current configuration and host metadata.
pub struct WorldClassifier {
    config: Arc<ConfigStore>,
    registry: Arc<dyn WorldRegistry>,

    /// Matches generator type names of flat/void generators
    generator_pattern: Regex,

    /// Matches world names conventionally used for flat worlds
    name_pattern: Regex,
}

impl WorldClassifier {
    pub fn new(config: Arc<ConfigStore>, registry: Arc<dyn WorldRegistry>) -> Self {
        Self {
            config,
            registry,
            generator_pattern: Regex::new(r"(?i)flat|void").expect("Invalid generator regex"),
            name_pattern: Regex::new(r"(?i)flat|creative|build").expect("Invalid world name regex"),
        }
    }

    /// Check if a world is flat.
    pub fn is_flat(&self, world: &str) -> bool {
        self.detect(world).is_flat()
    }

    /// Check if a world is exempt from slime management.
    pub fn is_exempt(&self, world: &str) -> bool {
        self.config.read(|c| c.is_world_exempt(world))
    }

    /// Classify a world, reporting which rule matched.
    pub fn detect(&self, world: &str) -> FlatDetection {
        let debug = self.config.read(|c| c.enable_debug_messages);

        if self.config.read(|c| c.is_flat_world(world)) {
            if debug {
                tracing::debug!("World '{}' is manually configured as flat", world);
            }
            return FlatDetection::Manual;
        }

        match self.registry.generator_name(world) {
            Ok(Some(generator)) if self.generator_pattern.is_match(&generator) => {
                let generator = generator.to_lowercase();
                if debug {
                    tracing::debug!(
                        "World '{}' detected as flat via generator: {}",
                        world,
                        generator
                    );
                }
                return FlatDetection::Generator(generator);
            }
            Ok(_) => {}
            Err(e) => {
                // A failed lookup ends auto-detection; the name is not consulted
                if debug {
                    tracing::debug!("Could not auto-detect if world '{}' is flat: {}", world, e);
                }
                return FlatDetection::NotFlat;
            }
        }

        if self.name_pattern.is_match(world) {
            if debug {
                tracing::debug!("World '{}' detected as flat via name pattern", world);
            }
            return FlatDetection::NamePattern;
        }

        FlatDetection::NotFlat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HostError, MockWorldRegistry};
    use crate::models::SlimeConfig;

    fn classifier_with(
        config: SlimeConfig,
        generator: Result<Option<String>, HostError>,
    ) -> WorldClassifier {
        let mut registry = MockWorldRegistry::new();
        registry
            .expect_generator_name()
            .returning(move |_| generator.clone());
        WorldClassifier::new(
            Arc::new(ConfigStore::in_memory(config)),
            Arc::new(registry),
        )
    }

    #[test]
    fn test_manual_override_wins() {
        let mut config = SlimeConfig::default();
        config.add_flat_world("survival");
        let classifier = classifier_with(config, Ok(None));

        assert_eq!(classifier.detect("survival"), FlatDetection::Manual);
    }

    #[test]
    fn test_generator_heuristic() {
        let classifier =
            classifier_with(SlimeConfig::default(), Ok(Some("VoidWorldGenerator".to_string())));

        assert_eq!(
            classifier.detect("skyblock"),
            FlatDetection::Generator("voidworldgenerator".to_string())
        );
    }

    #[test]
    fn test_name_heuristic_is_case_insensitive() {
        let classifier = classifier_with(SlimeConfig::default(), Ok(None));

        assert_eq!(classifier.detect("Plots_FLAT"), FlatDetection::NamePattern);
        assert_eq!(classifier.detect("Creative"), FlatDetection::NamePattern);
        assert_eq!(classifier.detect("buildserver"), FlatDetection::NamePattern);
        assert_eq!(classifier.detect("world"), FlatDetection::NotFlat);
    }

    #[test]
    fn test_non_matching_generator_falls_through_to_name() {
        let classifier =
            classifier_with(SlimeConfig::default(), Ok(Some("TerraGenerator".to_string())));

        assert_eq!(classifier.detect("world"), FlatDetection::NotFlat);
        assert_eq!(classifier.detect("creative"), FlatDetection::NamePattern);
    }

    #[test]
    fn test_introspection_failure_means_not_flat() {
        let classifier = classifier_with(
            SlimeConfig::default(),
            Err(HostError::Introspection {
                world: "creative".to_string(),
                reason: "generator unavailable".to_string(),
            }),
        );

        // The name heuristic is skipped once the lookup failed
        assert_eq!(classifier.detect("creative"), FlatDetection::NotFlat);
        assert!(!classifier.is_flat("world"));
    }

    #[test]
    fn test_introspection_failure_keeps_manual_override() {
        let mut config = SlimeConfig::default();
        config.add_flat_world("creative");
        let classifier = classifier_with(
            config,
            Err(HostError::Introspection {
                world: "creative".to_string(),
                reason: "boom".to_string(),
            }),
        );

        assert_eq!(classifier.detect("creative"), FlatDetection::Manual);
    }

    #[test]
    fn test_exemption_lookup() {
        let mut config = SlimeConfig::default();
        config.add_exempt_world("lobby");
        let classifier = classifier_with(config, Ok(None));

        assert!(classifier.is_exempt("lobby"));
        assert!(!classifier.is_exempt("world"));
    }
}
