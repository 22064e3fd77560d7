use crate::inline::specificity::{Importance, RuleOrigin, SpecificityKey, StyleRule};
use crate::style::owned_css::{OwnedRule, ParsedRule};
use log::trace;

/// The parsed rules of one `<style>` element.
#[derive(Debug, Clone, Default)]
pub struct StyleSheetBlock {
    /// Position among the collected `<style>` elements, in document order.
    pub index: usize,
    pub rules: Vec<ParsedRule>,
}

impl StyleSheetBlock {
    pub fn new(index: usize, rules: Vec<ParsedRule>) -> Self {
        StyleSheetBlock { index, rules }
    }
}

/// Find the style rule a [`StyleRule`] was split from.
pub fn origin_rule(blocks: &[StyleSheetBlock], origin: RuleOrigin) -> Option<&OwnedRule> {
    let block = blocks.iter().find(|block| block.index == origin.block_index)?;
    match block.rules.get(origin.rule_index)? {
        ParsedRule::Style(rule) => Some(rule),
        _ => None,
    }
}

/// Whether a single selector may be inlined at all.
///
/// Any `:` (pseudo-classes, pseudo-elements, and also `:` inside attribute
/// values) or `*` (universal selector, also `*=`) keeps the selector in the
/// residual stylesheet.
pub fn is_inlineable_selector(selector: &str) -> bool {
    !selector.contains(':') && !selector.contains('*')
}

/// Output of classification: inlineable rules (unranked) and leftovers.
#[derive(Debug, Default)]
pub struct Classified {
    pub rules: Vec<StyleRule>,
    pub leftovers: Vec<ParsedRule>,
}

/// Splits parsed rules by selector and importance.
#[derive(Debug, Default)]
pub struct RuleClassifier {
    emission_counter: usize,
    classified: Classified,
}

impl RuleClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classify_block(&mut self, block: &StyleSheetBlock) {
        for (rule_index, rule) in block.rules.iter().enumerate() {
            match rule {
                ParsedRule::Style(style_rule) => {
                    let origin = RuleOrigin {
                        block_index: block.index,
                        rule_index,
                    };
                    self.classify_style_rule(origin, style_rule);
                }
                ParsedRule::Media(_) | ParsedRule::Verbatim(_) => {
                    self.classified.leftovers.push(rule.clone());
                }
            }
        }
    }

    fn classify_style_rule(&mut self, origin: RuleOrigin, rule: &OwnedRule) {
        let (important, normal): (Vec<_>, Vec<_>) =
            rule.declarations.iter().partition(|decl| decl.important);
        let normal: Vec<(String, String)> = normal
            .into_iter()
            .map(|decl| (decl.property.clone(), decl.value.clone()))
            .collect();
        let important: Vec<(String, String)> = important
            .into_iter()
            .map(|decl| (decl.property.clone(), decl.value.clone()))
            .collect();

        for selector in &rule.selectors {
            let selector = selector.trim();
            if !is_inlineable_selector(selector) {
                trace!("leaving `{}` in the stylesheet", selector);
                self.classified
                    .leftovers
                    .push(ParsedRule::Style(rule.with_single_selector(selector)));
                continue;
            }
            if !normal.is_empty() {
                self.emit(Importance::Normal, origin, selector, &normal);
            }
            if !important.is_empty() {
                self.emit(Importance::Important, origin, selector, &important);
            }
        }
    }

    fn emit(
        &mut self,
        importance: Importance,
        origin: RuleOrigin,
        selector: &str,
        declarations: &[(String, String)],
    ) {
        let key = SpecificityKey {
            importance,
            block_index: origin.block_index,
            emission: self.emission_counter,
        };
        self.emission_counter += 1;
        self.classified.rules.push(StyleRule {
            key,
            selector: selector.to_string(),
            declarations: declarations.to_vec(),
            origin,
        });
    }

    pub fn finish(self) -> Classified {
        self.classified
    }
}

/// Classify every block, in block order.
pub fn classify(blocks: &[StyleSheetBlock]) -> Classified {
    let mut classifier = RuleClassifier::new();
    for block in blocks {
        classifier.classify_block(block);
    }
    classifier.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::owned_css::{MediaRule, OwnedDeclaration};
    use pretty_assertions::assert_eq;

    fn style_rule(selectors: &[&str], declarations: Vec<OwnedDeclaration>) -> ParsedRule {
        ParsedRule::Style(OwnedRule {
            selectors: selectors.iter().map(|s| s.to_string()).collect(),
            declarations,
        })
    }

    fn decl(property: &str, value: &str, important: bool) -> OwnedDeclaration {
        OwnedDeclaration::new(property, value, important)
    }

    #[test]
    fn test_rule_is_split_by_selector_and_importance() {
        let block = StyleSheetBlock::new(
            0,
            vec![style_rule(
                &["h1", ".title"],
                vec![decl("color", "red", false), decl("margin", "0", true)],
            )],
        );
        let classified = classify(&[block]);

        let summary: Vec<(Importance, usize, &str, Vec<(String, String)>)> = classified
            .rules
            .iter()
            .map(|rule| {
                (
                    rule.key.importance,
                    rule.key.emission,
                    rule.selector.as_str(),
                    rule.declarations.clone(),
                )
            })
            .collect();
        let color = vec![("color".to_string(), "red".to_string())];
        let margin = vec![("margin".to_string(), "0".to_string())];

        assert_eq!(
            summary,
            vec![
                (Importance::Normal, 0, "h1", color.clone()),
                (Importance::Important, 1, "h1", margin.clone()),
                (Importance::Normal, 2, ".title", color),
                (Importance::Important, 3, ".title", margin),
            ]
        );
        assert!(classified.leftovers.is_empty());
    }

    #[test]
    fn test_pseudo_and_wildcard_selectors_are_leftovers() {
        let block = StyleSheetBlock::new(
            0,
            vec![style_rule(
                &["a:hover", "p", "*", "a[href*=x]"],
                vec![decl("color", "red", false), decl("margin", "0", true)],
            )],
        );
        let classified = classify(&[block]);

        assert_eq!(classified.rules.len(), 2);
        assert!(classified.rules.iter().all(|rule| rule.selector == "p"));
        assert_eq!(
            classified.leftovers,
            vec![
                style_rule(
                    &["a:hover"],
                    vec![decl("color", "red", false), decl("margin", "0", true)]
                ),
                style_rule(
                    &["*"],
                    vec![decl("color", "red", false), decl("margin", "0", true)]
                ),
                style_rule(
                    &["a[href*=x]"],
                    vec![decl("color", "red", false), decl("margin", "0", true)]
                ),
            ]
        );
    }

    #[test]
    fn test_media_rules_are_never_split() {
        let media = ParsedRule::Media(MediaRule {
            condition: "print".to_string(),
            rules: vec![style_rule(&["p"], vec![decl("color", "red", false)])],
        });
        let block = StyleSheetBlock::new(0, vec![media.clone()]);
        let classified = classify(&[block]);

        assert!(classified.rules.is_empty());
        assert_eq!(classified.leftovers, vec![media]);
    }

    #[test]
    fn test_emission_counter_spans_blocks() {
        let rule = style_rule(&["p"], vec![decl("color", "red", false)]);
        let first = StyleSheetBlock::new(0, vec![rule.clone()]);
        let second = StyleSheetBlock::new(1, vec![rule]);
        let classified = classify(&[first, second]);

        let keys: Vec<(usize, usize)> = classified
            .rules
            .iter()
            .map(|rule| (rule.key.block_index, rule.key.emission))
            .collect();
        assert_eq!(keys, vec![(0, 0), (1, 1)]);
    }

    #[test]
    fn test_origin_rule_lookup() {
        let rule = style_rule(&["p"], vec![decl("color", "red", false)]);
        let blocks = vec![StyleSheetBlock::new(3, vec![rule.clone()])];
        let origin = RuleOrigin {
            block_index: 3,
            rule_index: 0,
        };

        let missing = RuleOrigin {
            block_index: 0,
            rule_index: 0,
        };

        assert_eq!(
            origin_rule(&blocks, origin).map(|found| ParsedRule::Style(found.clone())),
            Some(rule)
        );
        assert!(origin_rule(&blocks, missing).is_none());
    }
}
