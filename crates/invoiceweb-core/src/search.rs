//! Case-insensitive search over records

use crate::models::Record;

/// Records matching `term`; an empty term matches everything
pub fn filter<'a, R: Record>(items: &'a [R], term: &str) -> Vec<&'a R> {
    let needle = term.to_lowercase();
    items.iter().filter(|item| item.matches(&needle)).collect()
}
