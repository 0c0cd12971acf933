use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{CleanResult, ConfigSchema, GroupingResult, OrganizerError, ProviderKind, TabRecord};

/// Shared call policy. These are constants of the system, not per-provider
/// tunables: every backend is asked the same way.
pub(crate) const SAMPLING_TEMPERATURE: f32 = 0.3;
/// Categorize enumerates structured groups and needs the larger budget.
pub(crate) const MAX_TOKENS_CATEGORIZE: u32 = 4096;
pub(crate) const MAX_TOKENS_CLEAN: u32 = 1024;
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Uniform contract over one LLM backend.
///
/// Instances are immutable after construction (credentials and model are read
/// once), so concurrent calls on a single instance are safe. Construction
/// never performs network I/O; every backend call happens lazily inside the
/// operation that needs it.
#[async_trait]
pub trait TabProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Field descriptors for this provider's settings form. Pure, no I/O,
    /// stable for the provider kind.
    fn config_schema(&self) -> ConfigSchema;

    /// Asks the backend to group the tab snapshot. An empty snapshot yields
    /// an empty result without a network call.
    async fn categorize(
        &self,
        tabs: &[TabRecord],
        guidance: Option<&str>,
    ) -> Result<GroupingResult, OrganizerError>;

    /// Asks the backend which tabs match the (mandatory) instruction and
    /// resolves the proposed indices into title/URL detail pairs.
    async fn clean_tabs(
        &self,
        tabs: &[TabRecord],
        guidance: &str,
    ) -> Result<CleanResult, OrganizerError>;

    /// Best-effort credential probe: one minimal request, every failure kind
    /// collapsed to `false`. Never fails.
    async fn test_connection(&self) -> bool;
}
