//! Explicit get-or-compute cache for parsed coordinate templates.
//!
//! Owned by the input composer for the lifetime of one generation pass;
//! nothing survives across runs. Shared templates (a catalyst appearing in
//! dozens of combinations) are parsed once.

use crate::engine::error::EngineError;
use crate::engine::inputs::{parse_xyz, XyzTemplate};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Default)]
pub struct TemplateCache {
    data: HashMap<String, XyzTemplate>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the parsed template for `identifier`, loading it on first
    /// use. A variant-specific file (`{identifier}_{variant}.xyz`) takes
    /// precedence over the plain one. Load failures are not cached.
    pub fn get_or_load(
        &mut self,
        templates_dir: &Path,
        identifier: &str,
        variant: Option<&str>,
    ) -> Result<&XyzTemplate, EngineError> {
        let key = match variant {
            Some(v) => format!("{identifier}_{v}"),
            None => identifier.to_owned(),
        };
        if !self.data.contains_key(&key) {
            let template = load_template(templates_dir, identifier, variant)?;
            self.data.insert(key.clone(), template);
        }
        Ok(&self.data[&key])
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

fn load_template(
    templates_dir: &Path,
    identifier: &str,
    variant: Option<&str>,
) -> Result<XyzTemplate, EngineError> {
    let mut candidates = Vec::with_capacity(2);
    if let Some(v) = variant {
        candidates.push(templates_dir.join(format!("{identifier}_{v}.xyz")));
    }
    candidates.push(templates_dir.join(format!("{identifier}.xyz")));

    for path in &candidates {
        if path.is_file() {
            let text = std::fs::read_to_string(path)?;
            return parse_xyz(&text, identifier);
        }
    }
    Err(EngineError::MissingTemplate {
        path: candidates.pop().unwrap_or_else(|| templates_dir.to_path_buf()),
    })
}
