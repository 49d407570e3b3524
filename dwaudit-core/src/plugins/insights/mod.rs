//! Profiling insights producing statistic results.

mod cardinality;
mod distribution;
mod length_stats;
mod top_values;

pub use cardinality::Cardinality;
pub use distribution::{NumericSummary, Quantiles};
pub use length_stats::LengthStats;
pub use top_values::TopValues;
