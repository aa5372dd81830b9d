//! Discovery configuration.

/// Which components discovery scans.
///
/// # Example
///
/// ```
/// use interpose_discovery::DiscoveryConfig;
///
/// let config = DiscoveryConfig::new().with_excluded("test_support");
/// assert!(config.excludes("my_app_test_support"));
/// assert!(!config.excludes("my_app"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct DiscoveryConfig {
    excluded: Vec<String>,
}

impl DiscoveryConfig {
    /// Scans every component.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Skips components whose name contains `fragment`.
    #[must_use]
    pub fn with_excluded(mut self, fragment: impl Into<String>) -> Self {
        self.excluded.push(fragment.into());
        self
    }

    /// Returns `true` if a component named `component` is skipped.
    #[must_use]
    pub fn excludes(&self, component: &str) -> bool {
        self.excluded
            .iter()
            .any(|fragment| component.contains(fragment.as_str()))
    }

    /// The exclusion fragments.
    #[must_use]
    pub fn excluded(&self) -> &[String] {
        &self.excluded
    }
}
