//! Marker icon categories and the fixed icon/size table.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

/// Category code attached to every event, selecting its marker icon.
///
/// Decoded from a small integer. Unknown codes, `null`, numeric strings out
/// of range and values of any other type fall back to [`Self::Other`] so a
/// single bad record never fails a whole bounds response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "u8")]
pub enum IconCategory {
    /// Anything not covered below.
    #[default]
    Other,
    /// Fireworks displays.
    Fireworks,
    /// Festivals and traditional events.
    Festival,
    /// Food events.
    Gourmet,
    /// Art exhibitions.
    Art,
    /// Game events.
    Game,
    /// Sports and hands-on activities.
    Activity,
    /// Concerts and music events.
    Music,
    /// Seasonal events.
    Seasonal,
}

impl IconCategory {
    /// Every category in code order.
    pub const ALL: [Self; 9] = [
        Self::Other,
        Self::Fireworks,
        Self::Festival,
        Self::Gourmet,
        Self::Art,
        Self::Game,
        Self::Activity,
        Self::Music,
        Self::Seasonal,
    ];

    /// Returns the wire code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Other => 0,
            Self::Fireworks => 1,
            Self::Festival => 2,
            Self::Gourmet => 3,
            Self::Art => 4,
            Self::Game => 5,
            Self::Activity => 6,
            Self::Music => 7,
            Self::Seasonal => 8,
        }
    }
}

impl From<u8> for IconCategory {
    fn from(code: u8) -> Self {
        match code {
            1 => Self::Fireworks,
            2 => Self::Festival,
            3 => Self::Gourmet,
            4 => Self::Art,
            5 => Self::Game,
            6 => Self::Activity,
            7 => Self::Music,
            8 => Self::Seasonal,
            _ => Self::Other,
        }
    }
}

/// Whatever the server put in `icon_category`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireCode {
    Number(i64),
    Text(String),
    Unusable(IgnoredAny),
}

impl<'de> Deserialize<'de> for IconCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = match WireCode::deserialize(deserializer)? {
            WireCode::Number(n) => Some(n),
            WireCode::Text(s) => s.trim().parse::<i64>().ok(),
            WireCode::Unusable(_) => None,
        };
        Ok(code
            .and_then(|n| u8::try_from(n).ok())
            .map_or(Self::Other, Self::from))
    }
}

impl From<IconCategory> for u8 {
    fn from(category: IconCategory) -> Self {
        category.code()
    }
}

/// How one category is drawn on the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IconSpec {
    /// Category this entry describes.
    pub category: IconCategory,
    /// Image path relative to the asset root.
    pub image: &'static str,
    /// Rendered marker edge length in pixels.
    pub size: u32,
    /// Short label.
    pub label: &'static str,
    /// One-line description for the legend.
    pub description: &'static str,
}

/// Immutable icon table, one entry per [`IconCategory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconCatalog {
    entries: [IconSpec; 9],
}

impl IconCatalog {
    /// Looks up the icon for a category.
    #[must_use]
    pub fn spec(&self, category: IconCategory) -> &IconSpec {
        let [other, ..] = &self.entries;
        self.entries
            .iter()
            .find(|e| e.category == category)
            .unwrap_or(other)
    }

    /// Returns all entries in code order.
    #[must_use]
    pub fn legend(&self) -> &[IconSpec] {
        &self.entries
    }
}

impl Default for IconCatalog {
    fn default() -> Self {
        const fn entry(
            category: IconCategory,
            image: &'static str,
            size: u32,
            label: &'static str,
            description: &'static str,
        ) -> IconSpec {
            IconSpec {
                category,
                image,
                size,
                label,
                description,
            }
        }

        Self {
            entries: [
                entry(
                    IconCategory::Other,
                    "/other.svg",
                    40,
                    "Other",
                    "Other events",
                ),
                entry(
                    IconCategory::Fireworks,
                    "/hanabi.svg",
                    100,
                    "Fireworks",
                    "Fireworks displays",
                ),
                entry(
                    IconCategory::Festival,
                    "/maturi.png",
                    40,
                    "Festival",
                    "Festivals and traditional events",
                ),
                entry(
                    IconCategory::Gourmet,
                    "/gurume.png",
                    40,
                    "Gourmet",
                    "Food and gourmet events",
                ),
                entry(IconCategory::Art, "/art.png", 40, "Art", "Art exhibitions"),
                entry(IconCategory::Game, "/game.png", 40, "Game", "Game events"),
                entry(
                    IconCategory::Activity,
                    "/activity.png",
                    40,
                    "Activity",
                    "Sports and hands-on activities",
                ),
                entry(
                    IconCategory::Music,
                    "/music.png",
                    40,
                    "Music",
                    "Concerts and music events",
                ),
                entry(
                    IconCategory::Seasonal,
                    "/seasonal.png",
                    40,
                    "Seasonal",
                    "Seasonal events",
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_codes_fall_back_to_other() {
        assert_eq!(IconCategory::from(42), IconCategory::Other);
        let decoded: IconCategory = serde_json::from_str("200").unwrap_or(IconCategory::Music);
        assert_eq!(decoded, IconCategory::Other);
    }

    #[test]
    fn malformed_codes_decode_as_other() {
        for raw in ["null", "300", "-1", "1.5", "\"fireworks\"", "[1]"] {
            let decoded: IconCategory = serde_json::from_str(raw).unwrap_or(IconCategory::Music);
            assert_eq!(decoded, IconCategory::Other, "input {raw}");
        }
    }

    #[test]
    fn numeric_strings_are_accepted() {
        let decoded: IconCategory = serde_json::from_str("\"7\"").unwrap_or_default();
        assert_eq!(decoded, IconCategory::Music);
    }

    #[test]
    fn categories_serialize_as_codes() {
        assert_eq!(
            serde_json::to_string(&IconCategory::Seasonal).unwrap_or_default(),
            "8"
        );
    }

    #[test]
    fn codes_round_trip_for_every_category() {
        for category in IconCategory::ALL {
            assert_eq!(IconCategory::from(category.code()), category);
        }
    }

    #[test]
    fn fireworks_marker_is_large() {
        let catalog = IconCatalog::default();
        assert_eq!(catalog.spec(IconCategory::Fireworks).size, 100);
        assert_eq!(catalog.spec(IconCategory::Festival).size, 40);
        assert_eq!(catalog.spec(IconCategory::Other).image, "/other.svg");
    }

    #[test]
    fn legend_is_in_code_order() {
        let catalog = IconCatalog::default();
        let codes: Vec<u8> = catalog.legend().iter().map(|e| e.category.code()).collect();
        assert_eq!(codes, (0..=8).collect::<Vec<u8>>());
    }
}
