use std::fs;
use std::path::Path;

use crate::dom::dom_tree::{Document, NodeId};
use crate::error::PremailerError;
use crate::inline::classifier::{classify, StyleSheetBlock};
use crate::inline::element_matcher::match_rules;
use crate::inline::leftover::append_leftovers;
use crate::inline::merger::apply_bindings;
use crate::inline::specificity::rank;
use crate::parser::html::create_dom_tree;
use crate::parser::serialize::to_html;
use crate::style::css_parser::parse_blocks;
use log::{debug, warn};

/// What to do with a `<style>` block that cannot be parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseFailurePolicy {
    /// Fail the whole transform before the document is touched.
    #[default]
    Abort,
    /// Leave the block's text in place and inline the other blocks.
    PassThrough,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PremailerOptions {
    pub on_parse_failure: ParseFailurePolicy,
    /// Empty the text of every `<style>` block whose rules were consumed.
    pub clear_style_blocks: bool,
    /// Treat a block that needed error recovery as a parse failure.
    pub strict_css: bool,
}

impl Default for PremailerOptions {
    fn default() -> Self {
        PremailerOptions {
            on_parse_failure: ParseFailurePolicy::Abort,
            clear_style_blocks: true,
            strict_css: false,
        }
    }
}

/// A block left untouched under [`ParseFailurePolicy::PassThrough`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedBlock {
    pub block_index: usize,
    pub message: String,
}

/// Something the CSS parser skipped in a block that was still inlined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssWarning {
    pub block_index: usize,
    pub message: String,
}

/// Inlines the `<style>` rules of one HTML document.
///
/// ```no_run
/// use premailer_lib::premailer::Premailer;
///
/// let mut premailer = Premailer::from_html_str(
///     r#"<style>p { color: red }</style><p>hello</p>"#,
/// );
/// let html = premailer.transform()?;
/// assert!(html.contains(r#"<p style="color:red;">"#));
/// # Ok::<(), premailer_lib::error::PremailerError>(())
/// ```
#[derive(Debug)]
pub struct Premailer {
    document: Document,
    options: PremailerOptions,
    processed: bool,
    output: Option<String>,
    skipped: Vec<SkippedBlock>,
    warnings: Vec<CssWarning>,
}

impl Premailer {
    pub fn new(document: Document) -> Self {
        Self::with_options(document, PremailerOptions::default())
    }

    pub fn with_options(document: Document, options: PremailerOptions) -> Self {
        Premailer {
            document,
            options,
            processed: false,
            output: None,
            skipped: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn from_html_str(html: &str) -> Self {
        Self::new(create_dom_tree(html))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PremailerError> {
        let path = path.as_ref();
        let html = fs::read_to_string(path).map_err(|source| PremailerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_html_str(&html))
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    /// Blocks that were not inlined because they failed to parse.
    pub fn skipped_blocks(&self) -> &[SkippedBlock] {
        &self.skipped
    }

    /// Rules and declarations dropped by error recovery in inlined blocks.
    pub fn css_warnings(&self) -> &[CssWarning] {
        &self.warnings
    }

    /// Inline the document's styles and return the serialized HTML.
    ///
    /// The document is only processed once; later calls return the same
    /// output without touching it again.
    pub fn transform(&mut self) -> Result<String, PremailerError> {
        if !self.processed {
            self.inline_styles()?;
            self.processed = true;
        }
        if let Some(output) = &self.output {
            return Ok(output.clone());
        }
        let output = to_html(&self.document).map_err(PremailerError::Serialization)?;
        self.output = Some(output.clone());
        Ok(output)
    }

    fn inline_styles(&mut self) -> Result<(), PremailerError> {
        let style_elements = self.style_elements();
        let texts: Vec<String> = style_elements
            .iter()
            .map(|&element| self.document.text_content(element))
            .collect();
        debug!("parsing {} style blocks", texts.len());

        let mut blocks = Vec::with_capacity(texts.len());
        let mut consumed = Vec::new();
        let mut skipped = Vec::new();
        let mut warnings = Vec::new();
        for (block_index, parsed) in parse_blocks(&texts).into_iter().enumerate() {
            let failure = match parsed {
                Ok(sheet) if self.options.strict_css && !sheet.warnings.is_empty() => {
                    sheet.warnings.join("; ")
                }
                Ok(sheet) => {
                    for message in sheet.warnings {
                        warn!("style block {}: skipped {}", block_index, message);
                        warnings.push(CssWarning {
                            block_index,
                            message,
                        });
                    }
                    blocks.push(StyleSheetBlock::new(block_index, sheet.rules));
                    consumed.push(style_elements[block_index]);
                    continue;
                }
                Err(err) => err.message,
            };

            match self.options.on_parse_failure {
                ParseFailurePolicy::Abort => {
                    return Err(PremailerError::Parse {
                        block_index,
                        message: failure,
                    });
                }
                ParseFailurePolicy::PassThrough => {
                    warn!("style block {} left as is: {}", block_index, failure);
                    blocks.push(StyleSheetBlock::new(block_index, Vec::new()));
                    skipped.push(SkippedBlock {
                        block_index,
                        message: failure,
                    });
                }
            }
        }
        self.skipped = skipped;
        self.warnings = warnings;

        if self.options.clear_style_blocks {
            for element in consumed {
                self.document.set_text_content(element, "");
            }
        }

        let classified = classify(&blocks);
        let ranked = rank(classified.rules);
        let outcome = match_rules(&self.document, &ranked, &blocks);
        debug!(
            "{} ranked rules bound to {} elements",
            ranked.len(),
            outcome.bindings.len()
        );
        apply_bindings(&mut self.document, outcome.bindings);

        let mut leftovers = classified.leftovers;
        leftovers.extend(outcome.degraded);
        append_leftovers(&mut self.document, &leftovers);
        Ok(())
    }

    /// `<style>` elements without a `media` attribute, in document order.
    fn style_elements(&self) -> Vec<NodeId> {
        self.document
            .elements_by_tag("style")
            .into_iter()
            .filter(|&element| self.document.get_attribute(element, "media").is_none())
            .collect()
    }
}
