//! Rule checks producing issue results.
//!
//! Checks emit results only for rules that are actually violated; a clean
//! column produces no results.

mod case_duplicates;
mod dates;
mod nulls;
mod numeric_strings;
mod pattern;
mod range;
mod special_chars;
mod timestamp_patterns;
mod uniqueness;
mod whitespace;

pub use case_duplicates::CaseDuplicates;
pub use dates::{DateOutliers, FutureDates};
pub use nulls::NullRatio;
pub use numeric_strings::NumericStrings;
pub use pattern::PatternMatch;
pub use range::NumericRange;
pub use special_chars::SpecialCharacters;
pub use timestamp_patterns::TimestampPatterns;
pub use uniqueness::Uniqueness;
pub use whitespace::{LeadingCharacters, TrailingCharacters};
