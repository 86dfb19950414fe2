//! Declaration file templates.

/// Placeholder replaced with the package name in a [`TextTemplate`].
pub const PACKAGE_PLACEHOLDER: &str = "{package}";

/// Produces the content of a declaration file for a package.
///
/// Implemented for any `Fn(&str) -> String + Sync`, so a closure works anywhere a
/// template is expected. Rendering must be pure: the same name always yields
/// the same content, otherwise every run rewrites every file.
pub trait Template: Sync {
    /// Render the declaration for `package`.
    fn render(&self, package: &str) -> String;
}

impl<F> Template for F
where
    F: Fn(&str) -> String + Sync,
{
    fn render(&self, package: &str) -> String {
        self(package)
    }
}

/// A text template with a `{package}` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextTemplate {
    text: String,
}

impl TextTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Default for TextTemplate {
    /// A bare `package <name>;` declaration.
    fn default() -> Self {
        Self::new("package {package};")
    }
}

impl Template for TextTemplate {
    fn render(&self, package: &str) -> String {
        self.text.replace(PACKAGE_PLACEHOLDER, package)
    }
}
