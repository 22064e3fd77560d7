//! Reading and writing the `style="..."` attribute, and the raw
//! declarations of stylesheet rules.
//!
//! Values are kept exactly as the author wrote them (only trimmed), so a
//! declaration survives inlining byte for byte.

use crate::style::owned_css::OwnedDeclaration;
use cssparser::{Delimiter, ParseError, Parser, ParserInput, Token};

/// A single declaration of a style attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineDeclaration {
    /// Property name, ASCII-lowercased.
    pub property: String,
    /// Raw value text, including a trailing `!important` if present.
    pub value: String,
}

struct RawDeclaration<'i> {
    property: String,
    /// Value text without `!important`.
    value: &'i str,
    important: bool,
    /// Everything after the colon.
    text: &'i str,
}

/// Parse the value of a `style` attribute into a list of declarations.
///
/// Invalid items (no property name, no colon, empty value) are skipped.
/// When a property repeats, only its last occurrence is kept, at the
/// position of that last occurrence.
pub fn parse_style_attribute(input: &str) -> Vec<InlineDeclaration> {
    let mut declarations: Vec<InlineDeclaration> = Vec::new();
    for raw in parse_raw_declarations(input) {
        declarations.retain(|existing| existing.property != raw.property);
        declarations.push(InlineDeclaration {
            property: raw.property,
            value: raw.text.to_string(),
        });
    }
    declarations
}

/// Parse the text between a rule's braces into declarations, in source
/// order, with `!important` split off into the flag.
///
/// Items that are not `name: value` (hacks such as `*zoom: 1`, nested
/// rules) are skipped.
pub fn parse_declaration_block(input: &str) -> Vec<OwnedDeclaration> {
    parse_raw_declarations(input)
        .into_iter()
        .map(|raw| OwnedDeclaration::new(raw.property, raw.value, raw.important))
        .collect()
}

fn parse_raw_declarations(input: &str) -> Vec<RawDeclaration<'_>> {
    let mut parser_input = ParserInput::new(input);
    let mut parser = Parser::new(&mut parser_input);
    let mut declarations = Vec::new();

    while !parser.is_exhausted() {
        let parsed = parser.parse_until_after(Delimiter::Semicolon, parse_declaration);
        if let Ok(declaration) = parsed {
            declarations.push(declaration);
        }
    }
    declarations
}

fn parse_declaration<'i>(
    parser: &mut Parser<'i, '_>,
) -> Result<RawDeclaration<'i>, ParseError<'i, ()>> {
    let name = parser.expect_ident()?.clone();
    let property = if name.starts_with("--") {
        name.to_string()
    } else {
        name.to_ascii_lowercase()
    };
    parser.expect_colon()?;

    let start = parser.position();
    let mut value_end = None;
    loop {
        let before = parser.position();
        match parser.next() {
            Err(_) => break,
            Ok(&Token::Delim('!')) => {}
            Ok(_) => continue,
        }
        let bang = parser
            .try_parse(|parser| parser.expect_ident_matching("important"))
            .is_ok();
        if bang && parser.is_exhausted() {
            value_end = Some(before);
            break;
        }
    }

    let text = parser.slice_from(start).trim();
    let value = match value_end {
        Some(end) => parser.slice(start..end).trim(),
        None => text,
    };
    if value.is_empty() {
        return Err(parser.new_custom_error(()));
    }
    Ok(RawDeclaration {
        property,
        value,
        important: value_end.is_some(),
        text,
    })
}

/// Serialize declarations as `property:value;` pairs.
pub fn serialize_style_attribute<'a, I>(declarations: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut style = String::new();
    for (property, value) in declarations {
        style.push_str(property);
        style.push(':');
        style.push_str(value);
        style.push(';');
    }
    style
}
