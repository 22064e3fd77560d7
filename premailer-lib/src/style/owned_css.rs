// Fully-owned CSS rules, detached from the lightningcss parse lifetime so
// they can be produced on worker threads and kept after the source text.
use std::fmt;

/// One rule of a `<style>` block, as handed over by the CSS parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedRule {
    Style(OwnedRule),
    Media(MediaRule),
    /// Any other at-rule (`@font-face`, `@import`, ...), already serialized.
    Verbatim(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedRule {
    /// e.g. "div", ".red", "#header > p"; one entry per comma-separated selector.
    pub selectors: Vec<String>,
    /// Declarations in source order.
    pub declarations: Vec<OwnedDeclaration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRule {
    /// The media query list, e.g. "screen and (max-width: 600px)".
    pub condition: String,
    pub rules: Vec<ParsedRule>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedDeclaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

impl OwnedRule {
    /// The comma-joined selector text of the rule.
    pub fn selector_text(&self) -> String {
        self.selectors.join(", ")
    }

    /// A copy of this rule narrowed to one selector, keeping every declaration.
    pub fn with_single_selector(&self, selector: &str) -> OwnedRule {
        OwnedRule {
            selectors: vec![selector.to_string()],
            declarations: self.declarations.clone(),
        }
    }
}

impl OwnedDeclaration {
    pub fn new(property: impl Into<String>, value: impl Into<String>, important: bool) -> Self {
        OwnedDeclaration {
            property: property.into(),
            value: value.into(),
            important,
        }
    }
}

impl fmt::Display for OwnedRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Selectors: {:?}", self.selectors)?;
        for decl in &self.declarations {
            if decl.important {
                writeln!(f, "  {}: {} !important", decl.property, decl.value)?;
            } else {
                writeln!(f, "  {}: {}", decl.property, decl.value)?;
            }
        }
        Ok(())
    }
}
