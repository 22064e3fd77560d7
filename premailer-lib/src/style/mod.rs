pub mod css_matcher;
pub mod css_parser;
pub mod css_source;
pub mod inline_style;
pub mod owned_css;
