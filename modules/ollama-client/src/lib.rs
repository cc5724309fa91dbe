mod client;
mod util;

pub use client::OllamaClient;
pub use util::strip_code_blocks;

use anyhow::Result;
use async_trait::async_trait;

// =============================================================================
// TextGenerator Trait
// =============================================================================

/// Seam for the inference boundary. Production wires in [`OllamaClient`];
/// tests substitute fixed or failing generators.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for `prompt`. An `Err` means the service itself
    /// was unreachable or returned a non-success status — callers treat it as
    /// a transport failure, not as malformed model output.
    async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String>;
}
