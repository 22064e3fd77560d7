use crate::dom::dom_tree::{Document, NodeId};
use crate::style::owned_css::{MediaRule, OwnedRule, ParsedRule};
use log::{debug, warn};

/// Serialize leftover rules as one stylesheet, every declaration forced
/// `!important`. Verbatim at-rules are copied as they are.
pub fn render_leftovers(leftovers: &[ParsedRule]) -> String {
    let mut css = String::new();
    for rule in leftovers {
        render_rule(&mut css, rule);
    }
    css
}

fn render_rule(css: &mut String, rule: &ParsedRule) {
    match rule {
        ParsedRule::Style(style) => render_style(css, style),
        ParsedRule::Media(media) => render_media(css, media),
        ParsedRule::Verbatim(text) => {
            css.push_str(text);
            css.push('\n');
        }
    }
}

fn render_style(css: &mut String, rule: &OwnedRule) {
    let declarations: Vec<String> = rule
        .declarations
        .iter()
        .map(|decl| format!("{}:{} !important", decl.property, decl.value))
        .collect();
    css.push_str(&rule.selector_text());
    if declarations.is_empty() {
        css.push_str("{ }\n");
    } else {
        css.push_str(&format!("{{ {} }}\n", declarations.join("; ")));
    }
}

fn render_media(css: &mut String, media: &MediaRule) {
    css.push_str(&format!("@media {} {{\n", media.condition));
    for rule in &media.rules {
        render_rule(css, rule);
    }
    css.push_str("}\n");
}

/// The first `<style>` element without a `media` attribute.
pub fn leftover_target(document: &Document) -> Option<NodeId> {
    document
        .elements_by_tag("style")
        .into_iter()
        .find(|&style| document.get_attribute(style, "media").is_none())
}

/// Append rendered leftovers to the document's first style element.
///
/// Returns false when the document has nowhere to put them; the text is
/// then dropped.
pub fn append_leftovers(document: &mut Document, leftovers: &[ParsedRule]) -> bool {
    if leftovers.is_empty() {
        return true;
    }
    let Some(target) = leftover_target(document) else {
        warn!(
            "no <style> element to hold {} leftover rules, dropping them",
            leftovers.len()
        );
        return false;
    };

    let css = render_leftovers(leftovers);
    let existing = document.text_content(target);
    if !existing.is_empty() && !existing.ends_with('\n') {
        document.append_text(target, "\n");
    }
    document.append_text(target, &css);
    debug!("appended {} leftover rules", leftovers.len());
    true
}
