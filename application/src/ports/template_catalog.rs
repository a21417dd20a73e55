//! Template catalog port
//!
//! Looks up command templates by tool name.

use super::document_store::StoreError;
use async_trait::async_trait;
use waverun_domain::CommandTemplate;

/// Port for the command template catalog.
#[async_trait]
pub trait TemplateCatalog: Send + Sync {
    /// The template registered under `name`, if any.
    async fn find_template(&self, name: &str) -> Result<Option<CommandTemplate>, StoreError>;
}
