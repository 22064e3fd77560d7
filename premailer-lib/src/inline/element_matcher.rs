use std::collections::{HashMap, HashSet};

use crate::dom::dom_tree::{Document, NodeId};
use crate::inline::classifier::{origin_rule, StyleSheetBlock};
use crate::inline::specificity::{RuleOrigin, StyleRule};
use crate::parser::dom_indices::DomIndices;
use crate::style::css_matcher::select;
use crate::style::owned_css::{OwnedDeclaration, OwnedRule, ParsedRule};
use log::{trace, warn};

/// The rules matched by one element, in ranked order.
#[derive(Debug, Clone)]
pub struct ElementBinding<'r> {
    /// Transform-scoped synthetic identity of the element.
    pub identity: usize,
    pub element: NodeId,
    pub rules: Vec<&'r StyleRule>,
}

#[derive(Debug, Default)]
pub struct MatchOutcome<'r> {
    /// One binding per matched element, in order of first match.
    pub bindings: Vec<ElementBinding<'r>>,
    /// Selectors the matcher could not evaluate, as leftover rules.
    pub degraded: Vec<ParsedRule>,
}

/// Resolves ranked rules against a document.
pub struct ElementMatcher<'d> {
    document: &'d Document,
    indices: DomIndices,
    next_identity: usize,
    identities: HashMap<NodeId, usize>,
    failed: HashSet<(RuleOrigin, String)>,
}

impl<'d> ElementMatcher<'d> {
    pub fn new(document: &'d Document) -> Self {
        ElementMatcher {
            document,
            indices: DomIndices::build(document),
            next_identity: 0,
            identities: HashMap::new(),
            failed: HashSet::new(),
        }
    }

    pub fn match_rules<'r>(
        mut self,
        ranked: &'r [StyleRule],
        blocks: &[StyleSheetBlock],
    ) -> MatchOutcome<'r> {
        let mut outcome = MatchOutcome::default();

        for rule in ranked {
            let matched = match select(self.document, &self.indices, &rule.selector) {
                Ok(matched) => matched,
                Err(err) => {
                    warn!("{}, leaving it in the stylesheet", err);
                    if self.failed.insert((rule.origin, rule.selector.clone())) {
                        outcome.degraded.push(degrade(rule, blocks));
                    }
                    continue;
                }
            };
            trace!("`{}` matched {} elements", rule.selector, matched.len());

            for element in matched {
                match self.identities.get(&element) {
                    Some(&identity) => outcome.bindings[identity].rules.push(rule),
                    None => {
                        let identity = self.next_identity;
                        self.next_identity += 1;
                        self.identities.insert(element, identity);
                        outcome.bindings.push(ElementBinding {
                            identity,
                            element,
                            rules: vec![rule],
                        });
                    }
                }
            }
        }
        outcome
    }
}

/// Single-selector copy of the rule `rule` was split from.
fn degrade(rule: &StyleRule, blocks: &[StyleSheetBlock]) -> ParsedRule {
    let owned = match origin_rule(blocks, rule.origin) {
        Some(origin) => origin.with_single_selector(&rule.selector),
        None => OwnedRule {
            selectors: vec![rule.selector.clone()],
            declarations: rule
                .declarations
                .iter()
                .map(|(property, value)| {
                    OwnedDeclaration::new(property.as_str(), value.as_str(), false)
                })
                .collect(),
        },
    };
    ParsedRule::Style(owned)
}

/// Match `ranked` against `document` and bind the rules per element.
pub fn match_rules<'r>(
    document: &Document,
    ranked: &'r [StyleRule],
    blocks: &[StyleSheetBlock],
) -> MatchOutcome<'r> {
    ElementMatcher::new(document).match_rules(ranked, blocks)
}
