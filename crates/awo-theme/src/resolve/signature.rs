//! Variant signatures: the identity of one resolved view of a theme.

use std::fmt;

/// Identifies a (theme, tenant, dark mode, overrides) combination.
///
/// Two requests share cached results only if their signatures are equal.
/// `revision` is the content fingerprint of the base theme, so publishing a
/// changed theme never reuses entries computed from the old one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariantSignature {
    theme_id: String,
    tenant_id: Option<String>,
    dark_mode: bool,
    overrides: u64,
    revision: u64,
}

impl VariantSignature {
    /// Signature of the plain light-mode theme.
    pub fn new(theme_id: impl Into<String>) -> Self {
        Self {
            theme_id: theme_id.into(),
            tenant_id: None,
            dark_mode: false,
            overrides: 0,
            revision: 0,
        }
    }

    #[must_use]
    pub fn with_tenant(mut self, tenant_id: Option<impl Into<String>>) -> Self {
        self.tenant_id = tenant_id.map(Into::into);
        self
    }

    #[must_use]
    pub fn with_dark_mode(mut self, dark_mode: bool) -> Self {
        self.dark_mode = dark_mode;
        self
    }

    /// Set the identity of the applied override sets.
    #[must_use]
    pub fn with_overrides(mut self, digest: u64) -> Self {
        self.overrides = digest;
        self
    }

    /// Set the base theme's content fingerprint.
    #[must_use]
    pub fn with_revision(mut self, revision: u64) -> Self {
        self.revision = revision;
        self
    }

    pub fn theme_id(&self) -> &str {
        &self.theme_id
    }

    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    pub fn overrides(&self) -> u64 {
        self.overrides
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The same variant with dark mode forced on.
    pub fn dark_variant(&self) -> Self {
        self.clone().with_dark_mode(true)
    }

    /// Whether this signature falls under an invalidation scope.
    ///
    /// A `None` tenant scope covers the theme for every tenant and for
    /// tenant-less requests.
    pub fn in_scope(&self, theme_id: &str, tenant_id: Option<&str>) -> bool {
        self.theme_id == theme_id && tenant_id.is_none_or(|t| self.tenant_id.as_deref() == Some(t))
    }
}

impl fmt::Display for VariantSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{:016x}:{:016x}",
            self.theme_id,
            self.tenant_id.as_deref().unwrap_or("-"),
            if self.dark_mode { "dark" } else { "light" },
            self.overrides,
            self.revision
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_field_distinguishes() {
        let base = VariantSignature::new("corporate");
        let variants = [
            base.clone(),
            VariantSignature::new("other"),
            base.clone().with_tenant(Some("acme")),
            base.clone().with_dark_mode(true),
            base.clone().with_overrides(7),
            base.clone().with_revision(9),
        ];
        let unique: HashSet<_> = variants.iter().cloned().collect();
        assert_eq!(unique.len(), variants.len());
    }

    #[test]
    fn scope_matching() {
        let acme = VariantSignature::new("corporate").with_tenant(Some("acme"));
        let plain = VariantSignature::new("corporate");

        assert!(acme.in_scope("corporate", None));
        assert!(acme.in_scope("corporate", Some("acme")));
        assert!(!acme.in_scope("corporate", Some("globex")));
        assert!(!acme.in_scope("other", None));
        assert!(plain.in_scope("corporate", None));
        assert!(!plain.in_scope("corporate", Some("acme")));
    }

    #[test]
    fn display_is_readable() {
        let sig = VariantSignature::new("corporate").with_tenant(Some("acme")).with_dark_mode(true);
        assert!(sig.to_string().starts_with("corporate:acme:dark:"));
        assert!(VariantSignature::new("x").to_string().starts_with("x:-:light:"));
    }
}
