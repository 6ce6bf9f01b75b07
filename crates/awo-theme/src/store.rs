//! Theme persistence seam.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::theme::{OverrideSet, Theme};

/// Where themes and tenant branding come from.
///
/// Implementations must be safe to call from many threads. Returned themes
/// are owned copies; the engine never mutates what the store holds.
pub trait ThemeStore: Send + Sync {
    /// Fetch a theme. Unknown ids fail with [`Error::NotFound`].
    fn get_theme(&self, id: &str) -> Result<Theme>;

    /// Insert or replace a theme.
    fn save_theme(&self, theme: Theme) -> Result<()>;

    /// Remove a theme. Unknown ids fail with [`Error::NotFound`].
    fn delete_theme(&self, id: &str) -> Result<()>;

    /// Ids of all stored themes, sorted.
    fn list_themes(&self) -> Result<Vec<String>>;

    /// Branding overrides for a tenant, if it has any.
    fn tenant_overrides(&self, _tenant_id: &str) -> Result<Option<OverrideSet>> {
        Ok(None)
    }
}

/// An in-memory [`ThemeStore`].
#[derive(Default)]
pub struct MemoryThemeStore {
    themes: RwLock<HashMap<String, Theme>>,
    tenants: RwLock<HashMap<String, OverrideSet>>,
}

impl MemoryThemeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style theme insert.
    #[must_use]
    pub fn with_theme(self, theme: Theme) -> Self {
        self.themes.write().insert(theme.id.clone(), theme);
        self
    }

    /// Builder-style tenant branding insert.
    #[must_use]
    pub fn with_tenant(self, tenant_id: impl Into<String>, overrides: OverrideSet) -> Self {
        self.set_tenant_overrides(tenant_id, overrides);
        self
    }

    /// Insert or replace a tenant's branding.
    pub fn set_tenant_overrides(&self, tenant_id: impl Into<String>, overrides: OverrideSet) {
        self.tenants.write().insert(tenant_id.into(), overrides);
    }

    /// Remove a tenant's branding. Returns `true` if there was any.
    pub fn remove_tenant_overrides(&self, tenant_id: &str) -> bool {
        self.tenants.write().remove(tenant_id).is_some()
    }
}

impl ThemeStore for MemoryThemeStore {
    fn get_theme(&self, id: &str) -> Result<Theme> {
        self.themes.read().get(id).cloned().ok_or_else(|| Error::theme_not_found(id))
    }

    fn save_theme(&self, theme: Theme) -> Result<()> {
        self.themes.write().insert(theme.id.clone(), theme);
        Ok(())
    }

    fn delete_theme(&self, id: &str) -> Result<()> {
        self.themes
            .write()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::theme_not_found(id))
    }

    fn list_themes(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self.themes.read().keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    fn tenant_overrides(&self, tenant_id: &str) -> Result<Option<OverrideSet>> {
        Ok(self.tenants.read().get(tenant_id).cloned())
    }
}
