//! Element locators and ordered fallback lists.

use std::fmt;

/// How to find one element in the rendered DOM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Locator {
    /// An XPath expression.
    XPath(&'static str),
    /// A CSS selector.
    Css(&'static str),
}

impl Locator {
    /// The raw selector text.
    pub fn selector(&self) -> &'static str {
        match self {
            Locator::XPath(s) | Locator::Css(s) => s,
        }
    }

    pub(crate) fn to_fantoccini(self) -> fantoccini::Locator<'static> {
        match self {
            Locator::XPath(s) => fantoccini::Locator::XPath(s),
            Locator::Css(s) => fantoccini::Locator::Css(s),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::XPath(s) => write!(f, "xpath:{}", s),
            Locator::Css(s) => write!(f, "css:{}", s),
        }
    }
}

/// A logical UI element plus the locators that may resolve it, primary first.
///
/// Lookups try each locator in order and stop at the first that resolves.
#[derive(Debug, Clone, Copy)]
pub struct FallbackLocators {
    /// Human-readable name used in logs ("filters button").
    pub name: &'static str,
    /// Candidate locators, most specific first.
    pub candidates: &'static [Locator],
}

impl FallbackLocators {
    pub const fn new(name: &'static str, candidates: &'static [Locator]) -> Self {
        Self { name, candidates }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Locator> {
        self.candidates.iter()
    }
}
