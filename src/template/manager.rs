//! In-memory template repository

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use crate::binding::PlaceholderBinding;
use crate::error::{ArgumentError, SubstitutionError};
use crate::render::{ImageFormat, RenderError, RenderingBackend};
use crate::substitution::{self, scan_placeholders, SubstitutionConfig};
use crate::variable::{PlaceholderDefinition, Value};

use super::defaults::default_template;
use super::entity::{Template, TemplateKind};

/// Errors that can occur during template operations
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Template not found in the manager
    #[error("template not found: {name}")]
    NotFound { name: String },

    /// Another template already uses this id or name
    #[error("duplicate template: {name}")]
    Duplicate { name: String },

    /// Template JSON could not be read or written
    #[error("invalid template JSON: {0}")]
    Import(#[from] serde_json::Error),

    #[error("error accessing template file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Argument(#[from] ArgumentError),

    #[error(transparent)]
    Substitution(#[from] SubstitutionError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Repository of templates keyed by id
///
/// Names are unique across the manager so templates can be addressed by name
/// from the command line.
#[derive(Debug, Default)]
pub struct TemplateManager {
    templates: HashMap<Uuid, Template>,
    /// Base path for resolving relative file paths
    base_path: Option<PathBuf>,
}

impl TemplateManager {
    /// Create a new empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new manager with a base path for file resolution
    pub fn with_base_path(base_path: PathBuf) -> Self {
        Self {
            templates: HashMap::new(),
            base_path: Some(base_path),
        }
    }

    pub fn base_path(&self) -> Option<&PathBuf> {
        self.base_path.as_ref()
    }

    /// Resolve a relative path against the base path
    pub fn resolve_path(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        match &self.base_path {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Create a template, declaring a placeholder for every token in `markup`
    ///
    /// Tokens that match one of the kind's default placeholders get that typed
    /// definition; all others are declared as optional text.
    pub fn create(
        &mut self,
        kind: TemplateKind,
        name: impl Into<String>,
        markup: impl Into<String>,
    ) -> Result<Uuid, TemplateError> {
        let markup = markup.into();
        let defaults = kind.default_placeholders();
        let declared: Vec<PlaceholderDefinition> = scan_placeholders(&markup)
            .into_iter()
            .map(|token| {
                defaults
                    .iter()
                    .find(|def| def.name == token)
                    .cloned()
                    .unwrap_or_else(|| PlaceholderDefinition::text(token))
            })
            .collect();
        self.insert(Template::new(kind, name, markup).with_placeholders(declared)?)
    }

    /// Add an existing template
    ///
    /// Rejects a taken id or name and any invalid or repeated placeholder name.
    pub fn insert(&mut self, template: Template) -> Result<Uuid, TemplateError> {
        template.check_placeholders()?;
        if self.templates.contains_key(&template.id()) {
            return Err(TemplateError::Duplicate {
                name: template.id().to_string(),
            });
        }
        self.check_name_free(&template.name, None)?;

        let id = template.id();
        info!(%id, name = %template.name, kind = %template.kind, "added template");
        self.templates.insert(id, template);
        Ok(id)
    }

    fn check_name_free(&self, name: &str, except: Option<Uuid>) -> Result<(), TemplateError> {
        let taken = self
            .templates
            .values()
            .any(|t| t.name == name && Some(t.id()) != except);
        if taken {
            Err(TemplateError::Duplicate {
                name: name.to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Get a template by id
    pub fn get(&self, id: Uuid) -> Option<&Template> {
        self.templates.get(&id)
    }

    fn require(&self, id: Uuid) -> Result<&Template, TemplateError> {
        self.get(id).ok_or_else(|| TemplateError::NotFound {
            name: id.to_string(),
        })
    }

    /// Get a template by its display name
    pub fn find_by_name(&self, name: &str) -> Option<&Template> {
        self.templates.values().find(|t| t.name == name)
    }

    /// Templates of one kind, sorted by name
    pub fn list_by_kind(&self, kind: TemplateKind) -> Vec<&Template> {
        let mut found: Vec<&Template> = self.templates.values().filter(|t| t.kind == kind).collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        found
    }

    /// All templates, sorted by name
    pub fn list(&self) -> Vec<&Template> {
        let mut all: Vec<&Template> = self.templates.values().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    /// Get all template names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.values().map(|t| t.name.as_str())
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.templates.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Edit a template in place
    ///
    /// The edit is applied to a copy and only stored if the resulting name is
    /// still unique.
    pub fn update<F>(&mut self, id: Uuid, edit: F) -> Result<&Template, TemplateError>
    where
        F: FnOnce(&mut Template),
    {
        self.try_update(id, |template| {
            edit(template);
            Ok(())
        })
    }

    /// Like [`TemplateManager::update`] for edits that can fail
    ///
    /// Nothing is stored when the edit returns an error.
    pub fn try_update<F>(&mut self, id: Uuid, edit: F) -> Result<&Template, TemplateError>
    where
        F: FnOnce(&mut Template) -> Result<(), ArgumentError>,
    {
        let mut edited = self.require(id)?.clone();
        edit(&mut edited)?;
        edited.check_placeholders()?;
        self.check_name_free(&edited.name, Some(id))?;

        debug!(%id, name = %edited.name, "updated template");
        self.templates.insert(id, edited);
        self.require(id)
    }

    /// Copy a template under a new name and id
    pub fn duplicate(&mut self, id: Uuid, new_name: impl Into<String>) -> Result<Uuid, TemplateError> {
        let copy = self.require(id)?.duplicate(new_name);
        self.insert(copy)
    }

    /// Remove a template
    pub fn delete(&mut self, id: Uuid) -> Result<Template, TemplateError> {
        let removed = self.templates.remove(&id).ok_or_else(|| TemplateError::NotFound {
            name: id.to_string(),
        })?;
        info!(%id, name = %removed.name, "deleted template");
        Ok(removed)
    }

    /// Serialize a template to pretty-printed JSON
    pub fn export_json(&self, id: Uuid) -> Result<String, TemplateError> {
        Ok(serde_json::to_string_pretty(self.require(id)?)?)
    }

    /// Add a template from its JSON form, keeping its id
    pub fn import_json(&mut self, json: &str) -> Result<Uuid, TemplateError> {
        let template: Template = serde_json::from_str(json)?;
        self.insert(template)
    }

    /// Write a template's JSON form to `path`
    pub fn export_file(&self, id: Uuid, path: impl AsRef<Path>) -> Result<PathBuf, TemplateError> {
        let json = self.export_json(id)?;
        let path = self.resolve_path(path);
        std::fs::write(&path, json).map_err(|source| TemplateError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// Read a template's JSON form from `path`
    pub fn import_file(&mut self, path: impl AsRef<Path>) -> Result<Uuid, TemplateError> {
        let path = self.resolve_path(path);
        let json = std::fs::read_to_string(&path).map_err(|source| TemplateError::Io {
            path: path.clone(),
            source,
        })?;
        self.import_json(&json)
    }

    /// Add the built-in template for every kind that has no template yet
    ///
    /// Returns the ids of the templates added.
    pub fn ensure_defaults(&mut self) -> Result<Vec<Uuid>, TemplateError> {
        let mut added = Vec::new();
        for kind in TemplateKind::ALL {
            if !self.list_by_kind(kind).is_empty() {
                continue;
            }
            if let Some(template) = default_template(kind) {
                added.push(self.insert(template)?);
            }
        }
        Ok(added)
    }

    /// Bind one value to a template's placeholder
    pub fn binding(
        &self,
        id: Uuid,
        name: &str,
        value: Option<Value>,
    ) -> Result<PlaceholderBinding, TemplateError> {
        Ok(PlaceholderBinding::for_template(self.require(id)?, name, value)?)
    }

    /// Substitute `values` into a template's markup
    pub fn apply_variables<I, S>(
        &self,
        id: Uuid,
        values: I,
        config: &SubstitutionConfig,
    ) -> Result<String, TemplateError>
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        let template = self.require(id)?;
        Ok(substitution::apply_variables(template, values, config)?)
    }

    /// Substitute `values` and export the result at the template's device size
    ///
    /// Relative paths are resolved against the base path. Returns the path
    /// written.
    #[allow(clippy::too_many_arguments)]
    pub async fn render<I, S>(
        &self,
        id: Uuid,
        values: I,
        config: &SubstitutionConfig,
        backend: &dyn RenderingBackend,
        path: impl AsRef<Path>,
        format: ImageFormat,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, TemplateError>
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        let markup = self.apply_variables(id, values, config)?;
        let (width, height) = self.require(id)?.presentation.device.output_size();
        let path = self.resolve_path(path);
        backend
            .export_to_image(&markup, &path, format, width, height, cancel)
            .await?;
        Ok(path)
    }
}
