//! Export configuration.
//!
//! Everything that varies between studios or deployments (names, language,
//! footer text, fonts) lives in [`ExportConfig`]; the layout templates only
//! read from it.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;
use crate::locale::Locale;
use crate::model::Layout;

/// What goes at the bottom of every page.
#[derive(Clone, Debug, PartialEq)]
pub enum FooterStyle {
    /// Page number centered in the bottom margin.
    PageNumber,
    /// Fixed text right-aligned over a thin rule, e.g. the studio name.
    Text(String),
}

/// Optional rule and label drawn at the top of every page.
#[derive(Clone, Debug, PartialEq)]
pub struct HeaderStyle {
    /// `{page}` is replaced with the current page number.
    pub label: String,
    pub rule_color: [u8; 3],
}

impl HeaderStyle {
    pub fn label_for(&self, page_number: u32) -> String {
        self.label.replace("{page}", &page_number.to_string())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LayoutProfile {
    pub footer: FooterStyle,
    pub header: Option<HeaderStyle>,
}

impl Default for LayoutProfile {
    fn default() -> Self {
        Self {
            footer: FooterStyle::PageNumber,
            header: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ExportConfig {
    /// Appears in the file name: `Portfolio-<app_name>-<Layout>.pdf`.
    pub app_name: String,
    pub output_dir: PathBuf,
    pub locale: Locale,
    pub full: LayoutProfile,
    pub compact: LayoutProfile,
    pub text_only: LayoutProfile,
    /// System font family to embed instead of Helvetica.
    pub font_family: Option<String>,
    /// Per-image request timeout. `None` waits for as long as the server takes.
    pub fetch_timeout: Option<Duration>,
    /// Document title written to the PDF info dictionary.
    pub title: Option<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            app_name: "Archifolio".into(),
            output_dir: PathBuf::from("."),
            locale: Locale::default(),
            full: LayoutProfile::default(),
            compact: LayoutProfile::default(),
            text_only: LayoutProfile::default(),
            font_family: None,
            fetch_timeout: None,
            title: None,
        }
    }
}

impl ExportConfig {
    pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn with_profile(mut self, layout: Layout, profile: LayoutProfile) -> Self {
        match layout {
            Layout::Full => self.full = profile,
            Layout::Compact => self.compact = profile,
            Layout::TextOnly => self.text_only = profile,
        }
        self
    }

    /// Applies the same footer to all three layouts.
    pub fn with_footer(mut self, footer: FooterStyle) -> Self {
        for profile in [&mut self.full, &mut self.compact, &mut self.text_only] {
            profile.footer = footer.clone();
        }
        self
    }

    pub fn with_header(mut self, header: HeaderStyle) -> Self {
        for profile in [&mut self.full, &mut self.compact, &mut self.text_only] {
            profile.header = Some(header.clone());
        }
        self
    }

    pub fn with_font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = Some(family.into());
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn profile(&self, layout: Layout) -> &LayoutProfile {
        match layout {
            Layout::Full => &self.full,
            Layout::Compact => &self.compact,
            Layout::TextOnly => &self.text_only,
        }
    }

    pub fn file_name(&self, layout: Layout) -> String {
        format!("Portfolio-{}-{}.pdf", self.app_name, layout.name())
    }

    pub fn document_title(&self) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| format!("Portfolio {}", self.app_name))
    }

    pub fn validate(&self) -> Result<(), Error> {
        let name = self.app_name.trim();
        if name.is_empty() {
            return Err(Error::InvalidConfig("app name must not be empty".into()));
        }
        if name.contains(['/', '\\']) {
            return Err(Error::InvalidConfig(format!(
                "app name '{name}' cannot contain path separators"
            )));
        }
        if self.fetch_timeout.is_some_and(|t| t.is_zero()) {
            return Err(Error::InvalidConfig("fetch timeout must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_encodes_layout() {
        let config = ExportConfig::default();
        assert_eq!(config.file_name(Layout::Full), "Portfolio-Archifolio-Full.pdf");
        assert_eq!(
            config.with_app_name("Studio").file_name(Layout::TextOnly),
            "Portfolio-Studio-TextOnly.pdf"
        );
    }

    #[test]
    fn footer_applies_to_every_layout() {
        let config = ExportConfig::default()
            .with_footer(FooterStyle::Text("STUDIO".into()));
        for layout in Layout::ALL {
            assert_eq!(config.profile(layout).footer, FooterStyle::Text("STUDIO".into()));
        }
    }

    #[test]
    fn header_label_substitutes_page() {
        let header = HeaderStyle {
            label: "architettura {page}".into(),
            rule_color: [119, 139, 159],
        };
        assert_eq!(header.label_for(4), "architettura 4");
    }

    #[test]
    fn rejects_bad_app_name() {
        assert!(ExportConfig::default().with_app_name("  ").validate().is_err());
        assert!(ExportConfig::default().with_app_name("a/b").validate().is_err());
        assert!(ExportConfig::default().validate().is_ok());
    }
}
