//! Phone list normalization.

use std::collections::HashSet;

/// Normalize a list of phone numbers.
///
/// Each entry is trimmed, empty entries are dropped and duplicates removed,
/// keeping the first occurrence so the caller's ordering survives.
///
/// ```
/// use customer_core::normalize_phones;
///
/// assert_eq!(normalize_phones([" 111 ", "111", ""]), vec!["111"]);
/// ```
pub fn normalize_phones<I, S>(phones: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    phones
        .into_iter()
        .filter_map(|phone| {
            let trimmed = phone.as_ref().trim();
            (!trimmed.is_empty() && seen.insert(trimmed.to_owned())).then(|| trimmed.to_owned())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_first_seen_order() {
        assert_eq!(
            normalize_phones(["333", " 111", "333 ", "222", "111"]),
            vec!["333", "111", "222"]
        );
    }

    #[test]
    fn test_drops_blank_entries() {
        assert!(normalize_phones(["", "  ", "\t"]).is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(normalize_phones(Vec::<String>::new()).is_empty());
    }
}
