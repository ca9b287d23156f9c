//! Per-resource records.

use super::Converter;
use crate::error::Result;
use crate::syntax::{Block, Body};
use crate::types::ResourceConfig;
use serde_json::Value;
use std::path::Path;

/// Block type declaring managed resources.
pub const RESOURCE_BLOCK: &str = "resource";

impl Converter<'_> {
    /// One record per top-level `resource "<type>" "<name>"` block, in
    /// declaration order. Each record's config is the canonical value of the
    /// block body, so repeated declarations stay separate records.
    ///
    /// # Errors
    ///
    /// Returns the first conversion error of any resource body.
    pub fn resource_configs(&self, body: &Body, file: &Path) -> Result<Vec<ResourceConfig>> {
        let mut resources = Vec::new();

        for block in body.blocks.iter().filter(|block| block.kind == RESOURCE_BLOCK) {
            let [resource_type, name] = block.labels.as_slice() else {
                tracing::debug!(
                    file = %file.display(),
                    labels = ?block.labels,
                    "Skipping resource block without a type and name"
                );
                continue;
            };

            resources.push(ResourceConfig {
                id: format!("{resource_type}.{name}"),
                name: name.clone(),
                resource_type: resource_type.clone(),
                source: file.to_path_buf(),
                line: self.ctx.line_of(block.span.start),
                config: self.resource_body(block)?,
            });
        }

        Ok(resources)
    }

    /// Converted at the depth the block body has inside the document.
    fn resource_body(&self, block: &Block) -> Result<Value> {
        let document_depth = self.descend(0)?;
        self.body(&block.body, document_depth).map(Value::Object)
    }
}
