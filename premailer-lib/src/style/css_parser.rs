use std::sync::{Arc, RwLock};

use crate::style::css_source::{RuleSource, SourceMap};
use crate::style::inline_style::parse_declaration_block;
use crate::style::owned_css::{MediaRule, OwnedDeclaration, OwnedRule, ParsedRule};
use lightningcss::declaration::DeclarationBlock;
use lightningcss::printer::PrinterOptions;
use lightningcss::properties::Property;
use lightningcss::rules::{style::StyleRule, CssRule, CssRuleList, Location};
use lightningcss::stylesheet::{ParserOptions, StyleSheet as LightningStyleSheet};
use lightningcss::traits::ToCss;
use log::{debug, trace};
use rayon::prelude::*;
use thiserror::Error;

/// A `<style>` block whose text lightningcss rejected, or whose parsed
/// rules could not be printed back to text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CssParseError {
    pub message: String,
}

impl CssParseError {
    fn new(message: impl Into<String>) -> Self {
        CssParseError {
            message: message.into(),
        }
    }
}

/// The rules of one block, and what lightningcss skipped to read them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedStyleSheet {
    pub rules: Vec<ParsedRule>,
    /// One message per rule or declaration list dropped by error recovery.
    pub warnings: Vec<String>,
}

/// Parse each block on the rayon pool.
///
/// The result has one slot per input block, in input order; a failing block
/// only fills its own slot.
pub fn parse_blocks(blocks: &[String]) -> Vec<Result<ParsedStyleSheet, CssParseError>> {
    blocks
        .par_iter()
        .enumerate()
        .map(|(block_index, css_text)| {
            let parsed = parse_stylesheet(css_text);
            match &parsed {
                Ok(sheet) => debug!(
                    "style block {}: {} rules, {} warnings",
                    block_index,
                    sheet.rules.len(),
                    sheet.warnings.len()
                ),
                Err(err) => debug!("style block {}: {}", block_index, err),
            }
            parsed
        })
        .collect()
}

/// Parse a raw CSS string (LightningCSS) and convert it to fully-owned rules.
///
/// lightningcss runs with error recovery: a rule it cannot read is dropped
/// and reported in [`ParsedStyleSheet::warnings`]. The text of every kept
/// rule comes from the source, never from lightningcss' printer.
pub fn parse_stylesheet(css_text: &str) -> Result<ParsedStyleSheet, CssParseError> {
    let warnings = Arc::new(RwLock::new(Vec::new()));
    let options = ParserOptions {
        error_recovery: true,
        warnings: Some(Arc::clone(&warnings)),
        ..ParserOptions::default()
    };
    let sheet = LightningStyleSheet::parse(css_text, options)
        .map_err(|err| CssParseError::new(err.to_string()))?;
    let sources = SourceMap::scan(css_text);
    let rules = convert_rules(&sheet.rules, &sources)?;

    let warnings = warnings
        .read()
        .map(|list| list.iter().map(|warning| warning.to_string()).collect())
        .unwrap_or_default();
    Ok(ParsedStyleSheet { rules, warnings })
}

fn source_at<'s, 'i>(sources: &'s SourceMap<'i>, loc: Location) -> Option<&'s RuleSource<'i>> {
    sources.get(loc.line, loc.column)
}

fn convert_rules(
    rules: &CssRuleList<'_>,
    sources: &SourceMap<'_>,
) -> Result<Vec<ParsedRule>, CssParseError> {
    let mut owned_rules = Vec::new();
    for rule in &rules.0 {
        match rule {
            CssRule::Style(style_rule) => {
                let owned = convert_style_rule(style_rule, sources)?;
                trace!("{}", owned);
                owned_rules.push(ParsedRule::Style(owned));
            }
            CssRule::Media(media_rule) => {
                let condition = match source_at(sources, media_rule.loc) {
                    Some(RuleSource::Media { condition }) => condition.to_string(),
                    _ => print(&media_rule.query)?,
                };
                owned_rules.push(ParsedRule::Media(MediaRule {
                    condition,
                    rules: convert_rules(&media_rule.rules, sources)?,
                }));
            }
            other => {
                let css = match rule_location(other).and_then(|loc| source_at(sources, loc)) {
                    Some(RuleSource::AtRule { text }) => text.clone(),
                    _ => print(other)?,
                };
                if !css.trim().is_empty() {
                    owned_rules.push(ParsedRule::Verbatim(css));
                }
            }
        }
    }
    Ok(owned_rules)
}

fn rule_location(rule: &CssRule<'_>) -> Option<Location> {
    let loc = match rule {
        CssRule::Import(rule) => rule.loc,
        CssRule::Namespace(rule) => rule.loc,
        CssRule::FontFace(rule) => rule.loc,
        CssRule::Keyframes(rule) => rule.loc,
        CssRule::Page(rule) => rule.loc,
        CssRule::Supports(rule) => rule.loc,
        CssRule::CounterStyle(rule) => rule.loc,
        CssRule::LayerStatement(rule) => rule.loc,
        CssRule::LayerBlock(rule) => rule.loc,
        CssRule::Unknown(rule) => rule.loc,
        _ => return None,
    };
    Some(loc)
}

/// Copy a single StyleRule's selectors + declarations into an OwnedRule.
fn convert_style_rule(
    style_rule: &StyleRule<'_>,
    sources: &SourceMap<'_>,
) -> Result<OwnedRule, CssParseError> {
    let Some(RuleSource::Style { selectors, block }) = source_at(sources, style_rule.loc) else {
        return Ok(OwnedRule {
            selectors: print_selectors(style_rule)?,
            declarations: convert_declarations(&style_rule.declarations)?,
        });
    };

    let selectors = if selectors.len() == style_rule.selectors.0.len() {
        selectors.iter().map(|selector| selector.to_string()).collect()
    } else {
        print_selectors(style_rule)?
    };
    Ok(OwnedRule {
        selectors,
        declarations: parse_declaration_block(block),
    })
}

fn print_selectors(style_rule: &StyleRule<'_>) -> Result<Vec<String>, CssParseError> {
    style_rule.selectors.0.iter().map(print).collect()
}

fn convert_declarations(
    block: &DeclarationBlock<'_>,
) -> Result<Vec<OwnedDeclaration>, CssParseError> {
    let normal = block
        .declarations
        .iter()
        .map(|property| convert_property(property, false));
    let important = block
        .important_declarations
        .iter()
        .map(|property| convert_property(property, true));
    normal.chain(important).collect()
}

fn convert_property(
    property: &Property<'_>,
    important: bool,
) -> Result<OwnedDeclaration, CssParseError> {
    // Printing the id keeps vendor prefixes, `name()` alone would drop them.
    let name = print(&property.property_id())?;
    let value = property
        .value_to_css_string(PrinterOptions::default())
        .map_err(|err| CssParseError::new(err.to_string()))?;
    Ok(OwnedDeclaration::new(name, value, important))
}

fn print<T: ToCss>(value: &T) -> Result<String, CssParseError> {
    value
        .to_css_string(PrinterOptions::default())
        .map_err(|err| CssParseError::new(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn style(rule: &ParsedRule) -> &OwnedRule {
        match rule {
            ParsedRule::Style(owned) => owned,
            other => panic!("expected style rule, got {:?}", other),
        }
    }

    fn rules(css: &str) -> Vec<ParsedRule> {
        let sheet = parse_stylesheet(css).unwrap();
        assert_eq!(sheet.warnings, Vec::<String>::new());
        sheet.rules
    }

    #[test]
    fn test_selectors_are_split_by_the_parser() {
        let rules = rules(r#"h1, .title, a[title="x,y"] { font-size: 12px }"#);
        let rule = style(&rules[0]);

        assert_eq!(rule.selectors, vec!["h1", ".title", r#"a[title="x,y"]"#]);
        assert_eq!(
            rule.declarations,
            vec![OwnedDeclaration::new("font-size", "12px", false)]
        );
    }

    #[test]
    fn test_important_flag_is_kept() {
        let rules = rules(".a { text-align: center !important; color: red }");
        let rule = style(&rules[0]);

        assert_eq!(
            rule.declarations,
            vec![
                OwnedDeclaration::new("text-align", "center", true),
                OwnedDeclaration::new("color", "red", false),
            ]
        );
    }

    #[test]
    fn test_values_are_not_normalized() {
        let rules = rules(
            r#"p{font-family:"Helvetica Neue", Arial; color:#FFFFFF; margin:0px 0px 0px 0px; background-color:rgb(255,0,0)} .b{color:blue}"#,
        );

        assert_eq!(
            style(&rules[0]).declarations,
            vec![
                OwnedDeclaration::new("font-family", r#""Helvetica Neue", Arial"#, false),
                OwnedDeclaration::new("color", "#FFFFFF", false),
                OwnedDeclaration::new("margin", "0px 0px 0px 0px", false),
                OwnedDeclaration::new("background-color", "rgb(255,0,0)", false),
            ]
        );
        assert_eq!(
            style(&rules[1]).declarations,
            vec![OwnedDeclaration::new("color", "blue", false)]
        );
    }

    #[test]
    fn test_media_keeps_condition_and_inner_rules() {
        let rules = rules("@media screen and (max-width: 600px) { .a { color: blue } }");

        match &rules[0] {
            ParsedRule::Media(media) => {
                assert_eq!(media.condition, "screen and (max-width: 600px)");
                let inner = style(&media.rules[0]);
                assert_eq!(inner.selectors, vec![".a"]);
                assert_eq!(
                    inner.declarations,
                    vec![OwnedDeclaration::new("color", "blue", false)]
                );
            }
            other => panic!("expected media rule, got {:?}", other),
        }
    }

    #[test]
    fn test_other_at_rules_are_verbatim() {
        let rules = rules("@font-face { font-family: \"Foo\"; src: url(foo.woff) }");

        assert_eq!(
            rules,
            vec![ParsedRule::Verbatim(
                "@font-face { font-family: \"Foo\"; src: url(foo.woff) }".to_string()
            )]
        );
    }

    #[test]
    fn test_invalid_rule_is_dropped_with_a_warning() {
        let sheet = parse_stylesheet(".a { color: red } ..b { color: green } .c { color: blue }")
            .unwrap();

        let selectors: Vec<String> = sheet
            .rules
            .iter()
            .map(|rule| style(rule).selector_text())
            .collect();
        assert_eq!(selectors, vec![".a", ".c"]);
        assert_eq!(sheet.warnings.len(), 1);
    }

    #[test]
    fn test_hacks_do_not_lose_the_rule() {
        let sheet = parse_stylesheet("p{color:red; *zoom:1} td{mso-line-height-rule:exactly}")
            .unwrap();

        assert_eq!(
            style(&sheet.rules[0]).declarations,
            vec![OwnedDeclaration::new("color", "red", false)]
        );
        assert_eq!(
            style(&sheet.rules[1]).declarations,
            vec![OwnedDeclaration::new("mso-line-height-rule", "exactly", false)]
        );
        assert!(!sheet.warnings.is_empty());
    }

    #[test]
    fn test_parse_blocks_keeps_positions() {
        let blocks = vec![
            "p { color: red }".to_string(),
            "..broken { color: red }".to_string(),
            "".to_string(),
        ];
        let parsed = parse_blocks(&blocks);

        assert_eq!(parsed.len(), 3);
        let counts: Vec<(usize, usize)> = parsed
            .iter()
            .map(|sheet| {
                let sheet = sheet.as_ref().unwrap();
                (sheet.rules.len(), sheet.warnings.len())
            })
            .collect();
        assert_eq!(counts, vec![(1, 0), (0, 1), (0, 0)]);
    }
}
