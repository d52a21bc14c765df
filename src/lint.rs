//! Template lint
//!
//! Substitution silently leaves alone anything that is not an exact
//! `{{ key }}` token for a configured key. This module finds the tokens that
//! were probably meant to be placeholders anyway, so authors can fix them
//! before sending a half-filled email.

use std::fmt;

use ariadne::{Color, Label, Report, ReportKind, Source};
use logos::Logos;

use crate::config::GeneratorConfig;

/// Byte range in template text
pub type Span = std::ops::Range<usize>;

/// Coarse tokens of a template: brace pairs that look like placeholders, and
/// everything else.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum Piece {
    #[regex(r"\{\{[ \t]*[A-Za-z0-9_\-]+[ \t]*\}\}")]
    Placeholder,
    #[token("{")]
    Brace,
    #[regex(r"[^{]+")]
    Text,
}

/// A lint warning about a template placeholder
#[derive(Debug, Clone, PartialEq)]
pub struct LintWarning {
    pub category: LintCategory,
    pub message: String,
    pub span: Span,
}

/// Category of placeholder defect
#[derive(Debug, Clone, PartialEq)]
pub enum LintCategory {
    /// Well-formed placeholder naming a key that is not configured
    UnknownKey,
    /// Placeholder-like token whose spacing will not match
    Malformed,
}

impl fmt::Display for LintCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LintCategory::UnknownKey => write!(f, "unknown-key"),
            LintCategory::Malformed => write!(f, "malformed"),
        }
    }
}

impl fmt::Display for LintWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} at {:?}", self.category, self.message, self.span)
    }
}

impl LintWarning {
    /// Format the warning with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let mut buf = Vec::new();
        let written = Report::build(ReportKind::Warning, filename, self.span.start)
            .with_message(&self.message)
            .with_label(
                Label::new((filename, self.span.clone()))
                    .with_message(self.category.to_string())
                    .with_color(Color::Yellow),
            )
            .finish()
            .write((filename, Source::from(source)), &mut buf);
        match written {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => self.to_string(),
        }
    }
}

/// Check a template against the configured key set
pub fn check(template: &str, config: &GeneratorConfig) -> Vec<LintWarning> {
    let mut warnings = Vec::new();
    let mut lexer = Piece::lexer(template);

    while let Some(piece) = lexer.next() {
        if piece != Ok(Piece::Placeholder) {
            continue;
        }
        let span = lexer.span();
        let inner = &lexer.slice()[2..span.len() - 2];
        let key = inner.trim_matches(|c| c == ' ' || c == '\t');

        if inner.len() != key.len() + 2 || !inner.starts_with(' ') || !inner.ends_with(' ') {
            warnings.push(LintWarning {
                category: LintCategory::Malformed,
                message: format!(
                    "'{}' will not be substituted; write it as '{{{{ {} }}}}'",
                    lexer.slice(),
                    key
                ),
                span,
            });
        } else if !config.has_key(key) {
            warnings.push(LintWarning {
                category: LintCategory::UnknownKey,
                message: format!("'{}' is not a configured parameter and will be left as-is", key),
                span,
            });
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lint(template: &str) -> Vec<LintWarning> {
        check(template, &GeneratorConfig::default())
    }

    #[test]
    fn test_clean_template() {
        assert!(lint("<h1>{{ header }}</h1><a href=\"{{ tracking_link }}\">{{ cta }}</a>").is_empty());
    }

    #[test]
    fn test_unknown_key_reported_with_span() {
        let template = "Hi {{ header }} {{ missing }}";
        let warnings = lint(template);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].category, LintCategory::UnknownKey);
        assert_eq!(&template[warnings[0].span.clone()], "{{ missing }}");
    }

    #[test]
    fn test_malformed_spacing_reported() {
        let warnings = lint("{{cta}} {{  header }} {{ subject}}");
        assert_eq!(warnings.len(), 3);
        assert!(warnings.iter().all(|w| w.category == LintCategory::Malformed));
        assert!(warnings[0].message.contains("{{ cta }}"));
    }

    #[test]
    fn test_css_braces_ignored() {
        assert!(lint("<style>p { color: red; } a {{ }}</style>").is_empty());
    }

    #[test]
    fn test_format_mentions_message() {
        let template = "{{ nope }}";
        let warnings = lint(template);
        let rendered = warnings[0].format(template, "custom.html");
        assert!(rendered.contains("nope"));
        assert!(rendered.contains("custom.html"));
    }
}
