//! Column tables for the datasets gradlearn ships loaders for.

use crate::loader::{ColumnFormat, TableFormat};

pub const SPAM: f64 = 1.0;
pub const NOT_SPAM: f64 = 0.0;

/// UCI spambase: 57 non-negative features and a 0/1 spam label.
///
/// - 48 `word_freq_*` percentages in [0, 100]
/// - 6 `char_freq_*` percentages in [0, 100]
/// - `capital_run_length_average`, a real >= 0
/// - `capital_run_length_longest` and `capital_run_length_total`, integers >= 0
pub fn spambase_format() -> TableFormat {
    let mut columns = Vec::with_capacity(58);
    columns.extend(std::iter::repeat(ColumnFormat::real().within(0.0, 100.0)).take(48 + 6));
    columns.push(ColumnFormat::real().at_least(0.0));
    columns.extend(std::iter::repeat(ColumnFormat::integer().at_least(0.0)).take(2));
    columns.push(ColumnFormat::integer().one_of(&[NOT_SPAM, SPAM]));
    TableFormat::new(columns)
}

/// Tab-separated reals with a trailing -1/+1 label.
pub fn perceptron_format(n_features: usize) -> TableFormat {
    let mut columns = vec![ColumnFormat::real(); n_features];
    columns.push(ColumnFormat::real().one_of(&[-1.0, 1.0]));
    TableFormat::new(columns).with_delimiter(b'\t')
}
