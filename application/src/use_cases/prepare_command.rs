//! Prepare Command use case.
//!
//! Turns a tool run into something an executor can launch: the output
//! directory it must create and the fully resolved command line.
//!
//! 1. Output directory from the namespace and the tool's hierarchy address
//! 2. Template from the tool's own text, else from the catalog
//! 3. Host or port metadata lookup, depending on the template level
//! 4. Placeholder substitution; leftovers are logged, not rejected

use crate::ports::document_store::StoreError;
use crate::ports::hierarchy_store::HierarchyStore;
use crate::ports::template_catalog::TemplateCatalog;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};
use waverun_domain::tool::residual_placeholders;
use waverun_domain::{DomainError, Level, PortRecord, TargetMetadata, TargetRecord, ToolRun};

/// Errors that can occur while preparing a command.
#[derive(Error, Debug)]
pub enum PrepareCommandError {
    #[error(transparent)]
    Template(#[from] DomainError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl PrepareCommandError {
    /// Check if no template could be found for the tool
    pub fn is_template_not_found(&self) -> bool {
        matches!(self, Self::Template(DomainError::TemplateNotFound(_)))
    }
}

/// A command ready to hand to an executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedCommand {
    /// Directory the executor must create before running the command.
    pub output_dir: String,
    /// Resolved command line.
    pub command: String,
    /// Placeholders left unresolved in `command`.
    pub unresolved: Vec<String>,
}

pub struct PrepareCommandUseCase {
    catalog: Arc<dyn TemplateCatalog>,
    hierarchy: Arc<dyn HierarchyStore>,
    namespace: String,
}

impl Clone for PrepareCommandUseCase {
    fn clone(&self) -> Self {
        Self {
            catalog: self.catalog.clone(),
            hierarchy: self.hierarchy.clone(),
            namespace: self.namespace.clone(),
        }
    }
}

impl PrepareCommandUseCase {
    pub fn new(
        catalog: Arc<dyn TemplateCatalog>,
        hierarchy: Arc<dyn HierarchyStore>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            catalog,
            hierarchy,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub async fn execute(&self, tool: &ToolRun) -> Result<PreparedCommand, PrepareCommandError> {
        let output_dir = tool.output_path(&self.namespace);

        let catalog_entry = if tool.text().trim().is_empty() {
            self.catalog.find_template(tool.name()).await?
        } else {
            None
        };
        let template = tool.template(catalog_entry)?;

        let address = tool.address();
        let mut host: Option<TargetRecord> = None;
        let mut port: Option<PortRecord> = None;
        match template.level {
            Level::Host => {
                host = self.hierarchy.find_host(address.host_name()).await?;
                if host.is_none() {
                    debug!("No host record for {}", address.host_name());
                }
            }
            Level::Port => {
                port = self
                    .hierarchy
                    .find_port(
                        address.host_name(),
                        address.port_number(),
                        address.protocol(),
                    )
                    .await?;
                if port.is_none() {
                    debug!("No port record for {}", address);
                }
            }
            Level::Wave | Level::Domain | Level::Network => {}
        }

        let metadata = TargetMetadata {
            host: host.as_ref(),
            port: port.as_ref(),
        };
        let command = tool.resolve_command(&template, &output_dir, metadata);
        let unresolved = residual_placeholders(&command);
        if !unresolved.is_empty() {
            warn!(
                "Command for {} still has placeholders: {}",
                tool.detailed_summary(),
                unresolved.join(" ")
            );
        }

        Ok(PreparedCommand {
            output_dir,
            command,
            unresolved,
        })
    }
}
