//! Codec for the `key=value[,key=value...]` format of scheduling labels.
//!
//! Parsing never fails: entries without `=` or with an empty key are dropped
//! and the remaining pairs are kept. A later duplicate key wins.

use std::{collections::BTreeMap, convert::Infallible, fmt, ops::Deref, str::FromStr};

const PAIR_SEPARATOR: char = ',';
const KEY_VALUE_SEPARATOR: char = '=';

/// Ordered key/value pairs decoded from one label value.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LabelSet(BTreeMap<String, String>);

impl LabelSet {
    /// Decodes `value`, silently dropping malformed entries.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        Self(
            value
                .split(PAIR_SEPARATOR)
                .filter_map(|entry| {
                    let (key, value) = entry.split_once(KEY_VALUE_SEPARATOR)?;
                    let key = key.trim();
                    if key.is_empty() {
                        tracing::debug!("Dropping label entry without key: {entry:?}");
                        return None;
                    }
                    Some((key.to_string(), value.trim().to_string()))
                })
                .collect(),
        )
    }
}

impl Deref for LabelSet {
    type Target = BTreeMap<String, String>;

    fn deref(&self) -> &Self::Target { &self.0 }
}

impl IntoIterator for LabelSet {
    type IntoIter = std::collections::btree_map::IntoIter<String, String>;
    type Item = (String, String);

    fn into_iter(self) -> Self::IntoIter { self.0.into_iter() }
}

impl<K, V> FromIterator<(K, V)> for LabelSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(key, value)| (key.into(), value.into())).collect())
    }
}

impl FromStr for LabelSet {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> { Ok(Self::parse(value)) }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (key, value)) in self.0.iter().enumerate() {
            if index > 0 {
                write!(f, "{PAIR_SEPARATOR}")?;
            }
            write!(f, "{key}{KEY_VALUE_SEPARATOR}{value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_parse_pairs() {
        let set = LabelSet::parse("zone=us-east,disk=ssd");
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("zone").map(String::as_str), Some("us-east"));
        assert_eq!(set.get("disk").map(String::as_str), Some("ssd"));
    }

    #[test]
    fn test_parse_drops_malformed_entries() {
        let set = LabelSet::parse("zone=us-east,garbage,=nokey,,disk=ssd");
        assert_eq!(set, LabelSet::from_iter([("zone", "us-east"), ("disk", "ssd")]));
    }

    #[test]
    fn test_parse_keeps_equals_in_value_and_trims() {
        let set = LabelSet::parse(" expr = a=b , empty=");
        assert_eq!(set.get("expr").map(String::as_str), Some("a=b"));
        assert_eq!(set.get("empty").map(String::as_str), Some(""));
    }

    #[test]
    fn test_parse_last_duplicate_wins() {
        assert_eq!(LabelSet::parse("a=1,a=2").get("a").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_parse_empty() {
        assert!(LabelSet::parse("").is_empty());
    }

    #[test]
    fn test_display() {
        let set = LabelSet::from_iter([("b", "2"), ("a", "1")]);
        assert_eq!(set.to_string(), "a=1,b=2");
    }

    proptest! {
        #[test]
        fn parse_is_stable_under_reserialization(value in "[a-z=, .:_-]{1,64}") {
            let parsed = LabelSet::parse(&value);
            let reparsed = LabelSet::parse(&parsed.to_string());
            prop_assert_eq!(parsed, reparsed);
        }
    }
}
