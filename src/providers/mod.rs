/*!
 * Provider implementations for translation services.
 *
 * This module contains the translation seam used by the orchestrator and
 * its implementations:
 * - Ollama: Local LLM server
 * - Mock: Scriptable provider for tests and dry runs
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Common trait for all translation providers
///
/// The orchestrator treats a provider as an opaque `(source, target, text)`
/// function. `source` may be `auto`, in which case the provider decides.
/// Implementations must be safe to call from many units at once.
#[async_trait]
pub trait Translator: Send + Sync + Debug {
    /// Translate a block of text
    ///
    /// # Arguments
    /// * `source_language` - Source language code, or `auto`
    /// * `target_language` - Target language code
    /// * `text` - Text to translate, possibly several lines
    ///
    /// # Returns
    /// * `Result<String, ProviderError>` - The translated text or an error
    async fn translate(
        &self,
        source_language: &str,
        target_language: &str,
        text: &str,
    ) -> Result<String, ProviderError>;

    /// Short provider name for log messages
    fn name(&self) -> &str;
}

pub mod ollama;
pub mod mock;
