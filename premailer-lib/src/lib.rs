//! Inline the rules of an HTML document's `<style>` blocks into the `style`
//! attributes of the elements they match, as e-mail clients expect.
//!
//! Rules that cannot be inlined (`@media`, other at-rules, pseudo-classes,
//! universal selectors) are written back into the first `<style>` element,
//! every declaration marked `!important`.

pub mod dom;
pub mod error;
pub mod inline;
pub mod parser;
pub mod premailer;
pub mod style;

pub use crate::error::PremailerError;
pub use crate::premailer::{
    CssWarning, ParseFailurePolicy, Premailer, PremailerOptions, SkippedBlock,
};
