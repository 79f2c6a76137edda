use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub const MIN_TIER: u8 = 1;
pub const MAX_TIER: u8 = 10;

/// One of the ten difficulty bands partitioning the catalog.
///
/// Catalog files encode tiers as strings (`"3"`); numbers are accepted too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tier(u8);

impl Tier {
    pub const FIRST: Tier = Tier(MIN_TIER);
    pub const LAST: Tier = Tier(MAX_TIER);

    pub fn new(value: u8) -> Option<Self> {
        (MIN_TIER..=MAX_TIER).contains(&value).then_some(Tier(value))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn next(self) -> Option<Tier> {
        Tier::new(self.0 + 1)
    }

    pub fn is_last(self) -> bool {
        self == Tier::LAST
    }

    pub fn all() -> impl Iterator<Item = Tier> {
        (MIN_TIER..=MAX_TIER).map(Tier)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parsed = value
            .trim()
            .parse::<u8>()
            .map_err(|_| format!("Invalid tier: {}", value))?;
        Tier::new(parsed).ok_or_else(|| format!("Tier out of range: {}", value))
    }
}

impl Serialize for Tier {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Tier {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Number(u8),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Text(text) => text.parse().map_err(serde::de::Error::custom),
            Repr::Number(n) => Tier::new(n)
                .ok_or_else(|| serde::de::Error::custom(format!("Tier out of range: {}", n))),
        }
    }
}

/// A paradox record from the content catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: String,
    pub tier: Tier,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub is_learned: bool,
}

impl ContentItem {
    pub fn has_examples(&self) -> bool {
        self.examples.iter().any(|example| !example.trim().is_empty())
    }

    pub fn has_description(&self) -> bool {
        !self.description.trim().is_empty()
    }

    pub(crate) fn with_flags(mut self, flags: ItemFlags) -> Self {
        self.is_favorite = flags.is_favorite;
        self.is_learned = flags.is_learned;
        self
    }
}

/// Learner-owned state attached to a catalog item at runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFlags {
    pub is_favorite: bool,
    pub is_learned: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_accepts_string_and_number_encodings() {
        let from_text: Tier = serde_json::from_str("\"7\"").unwrap();
        let from_number: Tier = serde_json::from_str("7").unwrap();
        assert_eq!(from_text, from_number);
        assert_eq!(serde_json::to_string(&from_text).unwrap(), "\"7\"");
    }

    #[test]
    fn tier_rejects_out_of_range() {
        assert!(serde_json::from_str::<Tier>("\"0\"").is_err());
        assert!(serde_json::from_str::<Tier>("11").is_err());
        assert!(Tier::new(10).unwrap().next().is_none());
    }

    #[test]
    fn content_item_flags_default_to_false() {
        let item: ContentItem = serde_json::from_str(
            r#"{"id":"zeno","tier":"1","title":"Zeno's Arrow","description":"Motion is impossible","examples":["An arrow in flight"]}"#,
        )
        .unwrap();
        assert!(!item.is_favorite);
        assert!(!item.is_learned);
        assert!(item.has_examples());
    }
}
