//! Utility functions for string formatting and comparison.

pub mod format;

pub use format::{cmp_ignore_case, format_date, format_optional, truncate_string};
