//! Catalog metadata records.
//!
//! Field names follow the AniList GraphQL schema (camelCase on the wire) so
//! that responses decode directly and cached records round-trip unchanged.

use serde::{Deserialize, Serialize};

/// A manga as described by the remote catalog.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manga {
    /// AniList id
    pub id: i64,
    /// MyAnimeList id, when AniList knows it
    #[serde(default)]
    pub id_mal: Option<i64>,
    /// Titles in the languages AniList tracks
    #[serde(default)]
    pub title: MangaTitle,
    /// Alternative names
    #[serde(default, deserialize_with = "null_as_default")]
    pub synonyms: Vec<String>,
    /// Synopsis (may contain HTML)
    #[serde(default)]
    pub description: Option<String>,
    /// Genre names
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<String>,
    /// Tags with their relevance rank
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<MangaTag>,
    /// Chapter count, when finished or known
    #[serde(default)]
    pub chapters: Option<u32>,
    /// Volume count, when finished or known
    #[serde(default)]
    pub volumes: Option<u32>,
    /// Publishing status (FINISHED, RELEASING, ...)
    #[serde(default)]
    pub status: Option<String>,
    /// First publication date
    #[serde(default)]
    pub start_date: Option<FuzzyDate>,
    /// Cover art
    #[serde(default)]
    pub cover_image: Option<CoverImage>,
    /// Banner art URL
    #[serde(default)]
    pub banner_image: Option<String>,
    /// AniList page URL
    #[serde(default)]
    pub site_url: Option<String>,
    /// ISO 3166-1 alpha-2 country code
    #[serde(default)]
    pub country_of_origin: Option<String>,
}

impl Manga {
    /// Returns the best human-readable title: English, then romaji, then native.
    pub fn display_title(&self) -> &str {
        self.title
            .english
            .as_deref()
            .or(self.title.romaji.as_deref())
            .or(self.title.native.as_deref())
            .unwrap_or("")
    }

    /// Iterates over every known name: titles first, then synonyms.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        [
            self.title.english.as_deref(),
            self.title.romaji.as_deref(),
            self.title.native.as_deref(),
        ]
        .into_iter()
        .flatten()
        .chain(self.synonyms.iter().map(String::as_str))
    }
}

/// Titles of a manga.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MangaTitle {
    /// Romanized title
    #[serde(default)]
    pub romaji: Option<String>,
    /// Official English title
    #[serde(default)]
    pub english: Option<String>,
    /// Title in the original script
    #[serde(default)]
    pub native: Option<String>,
}

/// A catalog tag.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MangaTag {
    /// Tag name
    pub name: String,
    /// Short explanation
    #[serde(default)]
    pub description: Option<String>,
    /// Relevance, 0-100
    #[serde(default)]
    pub rank: Option<u8>,
}

/// A date where any component may be unknown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuzzyDate {
    /// Year
    #[serde(default)]
    pub year: Option<i32>,
    /// Month (1-12)
    #[serde(default)]
    pub month: Option<u8>,
    /// Day of month
    #[serde(default)]
    pub day: Option<u8>,
}

/// Cover art URLs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverImage {
    /// Largest available rendition
    #[serde(default)]
    pub extra_large: Option<String>,
    /// Large rendition
    #[serde(default)]
    pub large: Option<String>,
    /// Medium rendition
    #[serde(default)]
    pub medium: Option<String>,
    /// Dominant color as a hex string
    #[serde(default)]
    pub color: Option<String>,
}

// AniList sends `null` instead of `[]` for some list fields.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_anilist_media() {
        let json = r##"{
            "id": 30013,
            "idMal": 13,
            "title": {"romaji": "ONE PIECE", "english": "One Piece", "native": "ONE PIECE"},
            "synonyms": ["OP"],
            "genres": ["Action", "Adventure"],
            "tags": [{"name": "Pirates", "rank": 94}],
            "chapters": null,
            "status": "RELEASING",
            "startDate": {"year": 1997, "month": 7, "day": 22},
            "coverImage": {"extraLarge": "https://img/xl.jpg", "color": "#e4a15d"},
            "siteUrl": "https://anilist.co/manga/30013",
            "countryOfOrigin": "JP"
        }"##;

        let manga: Manga = serde_json::from_str(json).unwrap();
        assert_eq!(manga.id, 30013);
        assert_eq!(manga.id_mal, Some(13));
        assert_eq!(manga.display_title(), "One Piece");
        assert_eq!(manga.tags[0].rank, Some(94));
        assert_eq!(manga.start_date.unwrap().year, Some(1997));
        assert_eq!(
            manga.cover_image.unwrap().extra_large.as_deref(),
            Some("https://img/xl.jpg")
        );
    }

    #[test]
    fn test_null_lists_decode_as_empty() {
        let manga: Manga =
            serde_json::from_str(r#"{"id": 1, "synonyms": null, "genres": null, "tags": null}"#)
                .unwrap();
        assert!(manga.synonyms.is_empty());
        assert!(manga.genres.is_empty());
        assert!(manga.tags.is_empty());
    }

    #[test]
    fn test_display_title_fallback() {
        let mut manga = Manga {
            id: 1,
            ..Default::default()
        };
        assert_eq!(manga.display_title(), "");

        manga.title.native = Some("ワンピース".into());
        assert_eq!(manga.display_title(), "ワンピース");

        manga.title.romaji = Some("Wan Piisu".into());
        assert_eq!(manga.display_title(), "Wan Piisu");
    }

    #[test]
    fn test_names_includes_synonyms() {
        let manga = Manga {
            id: 1,
            title: MangaTitle {
                romaji: Some("Shingeki no Kyojin".into()),
                english: Some("Attack on Titan".into()),
                native: None,
            },
            synonyms: vec!["AoT".into()],
            ..Default::default()
        };

        let names: Vec<&str> = manga.names().collect();
        assert_eq!(names, vec!["Attack on Titan", "Shingeki no Kyojin", "AoT"]);
    }
}
