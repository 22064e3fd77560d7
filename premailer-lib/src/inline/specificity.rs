//! Ranking of inlineable rules into one application order.
//!
//! The "specificity" used here is NOT CSS selector specificity. Rules are
//! ordered by importance, then by the `<style>` block they came from, then by
//! the order the classifier emitted them. So `#id p` and `p` in the same
//! block apply in source order, whatever their selector weights are.

/// Whether a rule carries `!important` declarations. Normal sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Importance {
    Normal,
    Important,
}

/// Total-order key of a [`StyleRule`]; fields compare in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpecificityKey {
    pub importance: Importance,
    pub block_index: usize,
    pub emission: usize,
}

/// Where a [`StyleRule`] came from: a top-level rule of one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleOrigin {
    pub block_index: usize,
    pub rule_index: usize,
}

/// One selector paired with either the normal or the important half of a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRule {
    pub key: SpecificityKey,
    pub selector: String,
    /// property -> value, in the order they were declared.
    pub declarations: Vec<(String, String)>,
    pub origin: RuleOrigin,
}

/// Sort rules into application order: later rules override earlier ones.
pub fn rank(mut rules: Vec<StyleRule>) -> Vec<StyleRule> {
    rules.sort_by_key(|rule| rule.key);
    rules
}
