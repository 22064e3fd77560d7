use crate::dom::dom_tree::{Document, ElementNode, NodeId};
use crate::parser::dom_indices::DomIndices;
use std::collections::HashSet;
use std::iter::Peekable;
use std::str::Chars;
use thiserror::Error;

/// ------------------------------
/// 1. Selector Parsing
/// ------------------------------

/// A selector the matcher cannot evaluate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot evaluate selector `{selector}`: {reason}")]
pub struct SelectorError {
    pub selector: String,
    pub reason: String,
}

/// Supported attribute selector operators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeOperator {
    /// [attr="value"]
    Exact,
    /// [attr~="value"]
    Includes,
    /// [attr|="value"]
    DashMatch,
    /// [attr^="value"]
    Prefix,
    /// [attr$="value"]
    Suffix,
    /// [attr*="value"]
    Substring,
}

/// Represents one attribute condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSelector {
    pub name: String,
    /// `None` means only an existence check.
    pub operator: Option<AttributeOperator>,
    pub value: String,
    pub case_insensitive: bool,
}

/// A compound selector: an optional tag, id, classes, and attribute conditions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompoundSelector {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: HashSet<String>,
    pub attributes: Vec<AttributeSelector>,
}

/// A complex selector composed of a key compound selector and a list of ancestor parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    pub key: CompoundSelector,
    /// Ancestors with their combinators, in right-to-left order.
    pub ancestors: Vec<(Combinator, CompoundSelector)>,
}

/// Supported combinators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Descendant combinator (a space).
    Descendant,
    /// Child combinator (`>`).
    Child,
    /// Adjacent sibling combinator (`+`).
    AdjacentSibling,
    /// General sibling combinator (`~`).
    GeneralSibling,
}

impl CompoundSelector {
    fn is_empty(&self) -> bool {
        self.tag.is_none()
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attributes.is_empty()
    }
}

struct SelectorParser<'a> {
    selector: &'a str,
    chars: Peekable<Chars<'a>>,
}

/// Parse a complex selector string (e.g. `div.red > p#header + span[lang|=en]`).
///
/// Only type, id, class and attribute selectors joined by the four
/// combinators are understood. Pseudo-classes, pseudo-elements, the
/// universal selector, namespaces, escapes and selector lists are errors.
pub fn parse_selector(selector: &str) -> Result<ComplexSelector, SelectorError> {
    let mut parser = SelectorParser {
        selector,
        chars: selector.trim().chars().peekable(),
    };
    let mut compounds = vec![parser.parse_compound()?];
    let mut combinators = Vec::new();

    loop {
        let saw_space = parser.skip_whitespace();
        let combinator = match parser.chars.peek().copied() {
            None => break,
            Some('>') => Combinator::Child,
            Some('+') => Combinator::AdjacentSibling,
            Some('~') => Combinator::GeneralSibling,
            Some(_) if saw_space => Combinator::Descendant,
            Some(ch) => return Err(parser.error(format!("unexpected `{}`", ch))),
        };
        if combinator != Combinator::Descendant {
            parser.chars.next();
            parser.skip_whitespace();
        }
        combinators.push(combinator);
        compounds.push(parser.parse_compound()?);
    }

    let key = compounds.pop().unwrap_or_default();
    let ancestors = combinators
        .into_iter()
        .rev()
        .zip(compounds.into_iter().rev())
        .collect();
    Ok(ComplexSelector { key, ancestors })
}

impl SelectorParser<'_> {
    fn error(&self, reason: impl Into<String>) -> SelectorError {
        SelectorError {
            selector: self.selector.to_string(),
            reason: reason.into(),
        }
    }

    fn skip_whitespace(&mut self) -> bool {
        let mut skipped = false;
        while self.chars.next_if(|ch| ch.is_whitespace()).is_some() {
            skipped = true;
        }
        skipped
    }

    /// Parse a compound selector, e.g. `div.red#header[disabled][data-type~="main"]`.
    fn parse_compound(&mut self) -> Result<CompoundSelector, SelectorError> {
        let mut compound = CompoundSelector::default();
        if self.chars.peek().copied().is_some_and(is_ident_start) {
            compound.tag = Some(self.parse_ident()?.to_ascii_lowercase());
        }

        while let Some(&ch) = self.chars.peek() {
            match ch {
                '#' => {
                    self.chars.next();
                    let id = self.parse_ident()?;
                    match &compound.id {
                        None => compound.id = Some(id),
                        Some(_) => compound.attributes.push(AttributeSelector {
                            name: "id".to_string(),
                            operator: Some(AttributeOperator::Exact),
                            value: id,
                            case_insensitive: false,
                        }),
                    }
                }
                '.' => {
                    self.chars.next();
                    compound.classes.insert(self.parse_ident()?);
                }
                '[' => {
                    self.chars.next();
                    let attribute = self.parse_attribute()?;
                    compound.attributes.push(attribute);
                }
                ':' => {
                    return Err(self.error("pseudo-classes and pseudo-elements are not supported"))
                }
                '*' => return Err(self.error("the universal selector is not supported")),
                ch if ch.is_whitespace() || matches!(ch, '>' | '+' | '~') => break,
                other => return Err(self.error(format!("unsupported `{}`", other))),
            }
        }

        if compound.is_empty() {
            return Err(self.error("empty compound selector"));
        }
        Ok(compound)
    }

    fn parse_ident(&mut self) -> Result<String, SelectorError> {
        let mut ident = String::new();
        while let Some(&ch) = self.chars.peek() {
            if ch == '\\' {
                return Err(self.error("escaped identifiers are not supported"));
            }
            if !is_ident_char(ch) {
                break;
            }
            ident.push(ch);
            self.chars.next();
        }
        if ident.is_empty() {
            return Err(self.error("expected an identifier"));
        }
        Ok(ident)
    }

    /// Parse an attribute selector after its opening `[`, through the closing `]`.
    fn parse_attribute(&mut self) -> Result<AttributeSelector, SelectorError> {
        self.skip_whitespace();
        let name = self.parse_ident()?;
        self.skip_whitespace();

        let operator = match self.chars.next() {
            Some(']') => {
                return Ok(AttributeSelector {
                    name,
                    operator: None,
                    value: String::new(),
                    case_insensitive: false,
                })
            }
            Some('=') => AttributeOperator::Exact,
            Some(prefix) => {
                let operator = match prefix {
                    '~' => AttributeOperator::Includes,
                    '|' => AttributeOperator::DashMatch,
                    '^' => AttributeOperator::Prefix,
                    '$' => AttributeOperator::Suffix,
                    '*' => AttributeOperator::Substring,
                    other => {
                        return Err(self.error(format!("unknown attribute operator `{}`", other)))
                    }
                };
                if self.chars.next() != Some('=') {
                    return Err(self.error("malformed attribute operator"));
                }
                operator
            }
            None => return Err(self.error("unterminated attribute selector")),
        };

        self.skip_whitespace();
        let value = match self.chars.peek().copied() {
            Some(quote) if quote == '"' || quote == '\'' => {
                self.chars.next();
                let mut value = String::new();
                loop {
                    match self.chars.next() {
                        Some(ch) if ch == quote => break,
                        Some('\\') => return Err(self.error("escaped strings are not supported")),
                        Some(ch) => value.push(ch),
                        None => return Err(self.error("unterminated string")),
                    }
                }
                value
            }
            _ => self.parse_ident()?,
        };

        self.skip_whitespace();
        let mut case_insensitive = false;
        if let Some(flag) = self.chars.peek().copied() {
            if flag.eq_ignore_ascii_case(&'i') || flag.eq_ignore_ascii_case(&'s') {
                self.chars.next();
                case_insensitive = flag.eq_ignore_ascii_case(&'i');
                self.skip_whitespace();
            }
        }
        if self.chars.next() != Some(']') {
            return Err(self.error("unterminated attribute selector"));
        }

        Ok(AttributeSelector {
            name,
            operator: Some(operator),
            value,
            case_insensitive,
        })
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch == '-' || !ch.is_ascii()
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' || !ch.is_ascii()
}

/// ------------------------------
/// 2. Selector Matching
/// ------------------------------

/// Returns the elements matching `selector`, in document order.
pub fn select(
    document: &Document,
    indices: &DomIndices,
    selector: &str,
) -> Result<Vec<NodeId>, SelectorError> {
    let complex = parse_selector(selector)?;
    Ok(select_parsed(document, indices, &complex))
}

/// Like [`select`], for an already parsed selector.
pub fn select_parsed(
    document: &Document,
    indices: &DomIndices,
    complex: &ComplexSelector,
) -> Vec<NodeId> {
    candidates(indices, &complex.key)
        .iter()
        .copied()
        .filter(|&node| matches_complex_selector(document, node, complex))
        .collect()
}

/// Narrow the search to one index list using the most selective part of the key.
fn candidates<'a>(indices: &'a DomIndices, key: &CompoundSelector) -> &'a [NodeId] {
    if let Some(id) = &key.id {
        return indices.by_id(id);
    }
    if let Some(class) = key.classes.iter().next() {
        return indices.by_class(class);
    }
    if let Some(tag) = &key.tag {
        return indices.by_tag(tag);
    }
    &indices.all
}

/// Returns true if the given ElementNode matches the CompoundSelector.
pub fn matches_compound(elem: &ElementNode, compound: &CompoundSelector) -> bool {
    if let Some(tag) = &compound.tag {
        if !elem.tag.eq_ignore_ascii_case(tag) {
            return false;
        }
    }
    if let Some(id_val) = &compound.id {
        if elem.attribute("id") != Some(id_val.as_str()) {
            return false;
        }
    }
    if !compound.classes.iter().all(|class| elem.has_class(class)) {
        return false;
    }
    compound
        .attributes
        .iter()
        .all(|attr_sel| matches_attribute(elem, attr_sel))
}

fn matches_attribute(elem: &ElementNode, attr_sel: &AttributeSelector) -> bool {
    let Some(actual) = elem
        .attributes
        .iter()
        .find(|attr| (*attr.name.local).eq_ignore_ascii_case(&attr_sel.name))
        .map(|attr| &*attr.value)
    else {
        return false;
    };
    let Some(operator) = &attr_sel.operator else {
        return true;
    };

    let (actual, expected) = if attr_sel.case_insensitive {
        (actual.to_lowercase(), attr_sel.value.to_lowercase())
    } else {
        (actual.to_string(), attr_sel.value.clone())
    };
    match operator {
        AttributeOperator::Exact => actual == expected,
        AttributeOperator::Includes => actual.split_whitespace().any(|word| word == expected),
        AttributeOperator::DashMatch => {
            actual == expected || actual.starts_with(&format!("{}-", expected))
        }
        // An empty value never matches for the substring operators.
        AttributeOperator::Prefix => !expected.is_empty() && actual.starts_with(&expected),
        AttributeOperator::Suffix => !expected.is_empty() && actual.ends_with(&expected),
        AttributeOperator::Substring => !expected.is_empty() && actual.contains(&expected),
    }
}

/// Matches a ComplexSelector against a candidate element, right to left.
pub fn matches_complex_selector(
    document: &Document,
    candidate: NodeId,
    complex: &ComplexSelector,
) -> bool {
    match document.element(candidate) {
        Some(elem) if matches_compound(elem, &complex.key) => {
            matches_ancestors(document, candidate, &complex.ancestors)
        }
        _ => false,
    }
}

fn matches_at(document: &Document, node: NodeId, compound: &CompoundSelector) -> bool {
    document
        .element(node)
        .map(|elem| matches_compound(elem, compound))
        .unwrap_or(false)
}

fn matches_ancestors(
    document: &Document,
    node: NodeId,
    ancestors: &[(Combinator, CompoundSelector)],
) -> bool {
    let Some(((combinator, compound), rest)) = ancestors.split_first() else {
        return true;
    };
    match combinator {
        Combinator::Child => document.parent_element(node).is_some_and(|parent| {
            matches_at(document, parent, compound) && matches_ancestors(document, parent, rest)
        }),
        Combinator::AdjacentSibling => {
            document
                .previous_element_sibling(node)
                .is_some_and(|sibling| {
                    matches_at(document, sibling, compound)
                        && matches_ancestors(document, sibling, rest)
                })
        }
        // The two open-ended combinators backtrack: the nearest match is not
        // necessarily the one the rest of the chain needs.
        Combinator::Descendant => {
            let mut current = document.parent_element(node);
            while let Some(ancestor) = current {
                if matches_at(document, ancestor, compound)
                    && matches_ancestors(document, ancestor, rest)
                {
                    return true;
                }
                current = document.parent_element(ancestor);
            }
            false
        }
        Combinator::GeneralSibling => {
            let mut current = document.previous_element_sibling(node);
            while let Some(sibling) = current {
                if matches_at(document, sibling, compound)
                    && matches_ancestors(document, sibling, rest)
                {
                    return true;
                }
                current = document.previous_element_sibling(sibling);
            }
            false
        }
    }
}
