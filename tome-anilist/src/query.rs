//! GraphQL documents sent to AniList.

/// Fields requested for every media record.
macro_rules! media_fields {
    () => {
        r#"
        id
        idMal
        title { romaji english native }
        synonyms
        description(asHtml: false)
        genres
        tags { name description rank }
        chapters
        volumes
        status
        startDate { year month day }
        coverImage { extraLarge large medium color }
        bannerImage
        siteUrl
        countryOfOrigin
        "#
    };
}

/// Looks up a single manga by AniList id.
pub(crate) const SEARCH_BY_ID: &str = concat!(
    "query ($id: Int) { Media(id: $id, type: MANGA) {",
    media_fields!(),
    "} }"
);

/// Searches manga by free text, one page at a time.
pub(crate) const SEARCH_BY_NAME: &str = concat!(
    "query ($query: String, $page: Int, $perPage: Int) { ",
    "Page(page: $page, perPage: $perPage) { media(search: $query, type: MANGA) {",
    media_fields!(),
    "} } }"
);
