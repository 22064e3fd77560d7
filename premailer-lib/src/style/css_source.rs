//! Source text of the rules of a stylesheet, keyed by where each rule starts.
//!
//! lightningcss decides which rules a block holds. Selectors, declarations,
//! media conditions and other at-rules are then taken from here, so they
//! reach the document as the author wrote them.

use std::collections::HashMap;

use cssparser::{
    AtRuleParser, CowRcStr, DeclarationParser, ParseError, Parser, ParserInput, ParserState,
    QualifiedRuleParser, RuleBodyItemParser, RuleBodyParser, StyleSheetParser,
};

/// Raw text of one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleSource<'i> {
    /// Comma-separated selectors and the text between the braces.
    Style {
        selectors: Vec<&'i str>,
        block: &'i str,
    },
    /// The condition of an `@media` rule; its inner rules have their own entries.
    Media { condition: &'i str },
    /// Any other at-rule, whole.
    AtRule { text: String },
}

/// Rule sources keyed by the (line, column) of each rule's first token,
/// the same position lightningcss records as a rule's `loc`.
#[derive(Debug, Default)]
pub struct SourceMap<'i> {
    rules: HashMap<(u32, u32), RuleSource<'i>>,
}

impl<'i> SourceMap<'i> {
    pub fn scan(css: &'i str) -> Self {
        let mut input = ParserInput::new(css);
        let mut parser = Parser::new(&mut input);
        let mut source_map = SourceMap::default();
        for _ in StyleSheetParser::new(&mut parser, &mut source_map) {}
        source_map
    }

    pub fn get(&self, line: u32, column: u32) -> Option<&RuleSource<'i>> {
        self.rules.get(&(line, column))
    }

    fn insert(&mut self, start: &ParserState, source: RuleSource<'i>) {
        let location = start.source_location();
        self.rules.insert((location.line, location.column), source);
    }
}

fn consume_rest<'i>(input: &mut Parser<'i, '_>) -> &'i str {
    let start = input.position();
    while input.next().is_ok() {}
    input.slice_from(start)
}

impl<'i> QualifiedRuleParser<'i> for SourceMap<'i> {
    type Prelude = Vec<&'i str>;
    type QualifiedRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, ()>> {
        input.parse_comma_separated(|selector| Ok(consume_rest(selector).trim()))
    }

    fn parse_block<'t>(
        &mut self,
        selectors: Self::Prelude,
        start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<(), ParseError<'i, ()>> {
        let block = consume_rest(input);
        self.insert(start, RuleSource::Style { selectors, block });
        Ok(())
    }
}

impl<'i> AtRuleParser<'i> for SourceMap<'i> {
    /// At-keyword name and trimmed prelude text.
    type Prelude = (CowRcStr<'i>, &'i str);
    type AtRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, ()>> {
        Ok((name, consume_rest(input).trim()))
    }

    fn rule_without_block(
        &mut self,
        prelude: Self::Prelude,
        start: &ParserState,
    ) -> Result<(), ()> {
        let (name, prelude) = prelude;
        let text = if prelude.is_empty() {
            format!("@{};", name)
        } else {
            format!("@{} {};", name, prelude)
        };
        self.insert(start, RuleSource::AtRule { text });
        Ok(())
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<(), ParseError<'i, ()>> {
        let (name, condition) = prelude;
        if name.eq_ignore_ascii_case("media") {
            let body: RuleBodyParser<'_, '_, '_, Self, (), ()> = RuleBodyParser::new(input, self);
            for _ in body {}
            self.insert(start, RuleSource::Media { condition });
        } else {
            consume_rest(input);
            // The nested parser stops in front of the closing brace.
            let text = format!("{}}}", input.slice_from(start.position()));
            self.insert(start, RuleSource::AtRule { text });
        }
        Ok(())
    }
}

impl<'i> DeclarationParser<'i> for SourceMap<'i> {
    type Declaration = ();
    type Error = ();
}

impl<'i> RuleBodyItemParser<'i, (), ()> for SourceMap<'i> {
    fn parse_declarations(&self) -> bool {
        false
    }

    fn parse_qualified(&self) -> bool {
        true
    }
}
