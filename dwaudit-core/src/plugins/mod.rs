//! Built-in checks and insights.
//!
//! Checks report rule violations as issue results; insights report profiling
//! statistics. Every built-in is listed in [`builtin_constructors`], which is
//! the single place the registry learns about them.

pub mod checks;
pub mod insights;

#[cfg(test)]
pub(crate) mod test_support;

use crate::plugin::{Plugin, PluginConstructor};

fn construct<P: Plugin + Default + 'static>() -> Box<dyn Plugin> {
    Box::new(P::default())
}

static BUILTINS: &[PluginConstructor] = &[
    construct::<checks::TrailingCharacters>,
    construct::<checks::LeadingCharacters>,
    construct::<checks::CaseDuplicates>,
    construct::<checks::SpecialCharacters>,
    construct::<checks::NumericStrings>,
    construct::<checks::NumericRange>,
    construct::<checks::FutureDates>,
    construct::<checks::DateOutliers>,
    construct::<checks::TimestampPatterns>,
    construct::<checks::Uniqueness>,
    construct::<checks::PatternMatch>,
    construct::<checks::NullRatio>,
    construct::<insights::TopValues>,
    construct::<insights::Quantiles>,
    construct::<insights::LengthStats>,
    construct::<insights::Cardinality>,
    construct::<insights::NumericSummary>,
];

/// Constructors of every built-in plugin, in registration order.
pub fn builtin_constructors() -> &'static [PluginConstructor] {
    BUILTINS
}
