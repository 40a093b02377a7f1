use serde::{Deserialize, Serialize};

pub const PLACEHOLDER_POSTER: &str = "/images/poster.png";
pub const POSTER_BASE: &str = "https://image.tmdb.org/t/p/w500";

// Storage format (camelCase). The TMDB wire format lives in `tmdb`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: i32,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub original_title: Option<String>,
    #[serde(default)]
    pub original_language: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<i32>,
    #[serde(default)]
    pub popularity: f32,
    #[serde(default)]
    pub vote_average: f32,
    #[serde(default)]
    pub vote_count: i32,
    #[serde(default)]
    pub adult: bool,
    #[serde(default)]
    pub video: bool,
}

impl Movie {
    pub fn same_movie(&self, other: &Movie) -> bool {
        self.id == other.id
    }

    // Not idempotent: a CDN path would be prefixed again.
    pub fn with_display_poster(self) -> Self {
        let poster_path = Some(display_poster(self.poster_path.as_deref()));
        Self {
            poster_path,
            ..self
        }
    }

    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.original_title.as_deref())
            .unwrap_or("(untitled)")
    }
}

pub fn display_poster(raw: Option<&str>) -> String {
    match raw {
        Some(p) if !p.is_empty() => format!("{POSTER_BASE}{p}"),
        _ => PLACEHOLDER_POSTER.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieListPage {
    pub page: i32,
    pub results: Vec<Movie>,
    pub total_pages: i32,
    pub total_results: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn poster_gets_cdn_prefix() {
        let movie = Movie {
            id: 1,
            poster_path: Some("/abc.jpg".to_string()),
            ..Default::default()
        }
        .with_display_poster();
        assert_eq!(
            movie.poster_path.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/abc.jpg")
        );
    }

    #[test]
    fn missing_or_empty_poster_uses_placeholder() {
        let missing = Movie::default().with_display_poster();
        let empty = Movie {
            poster_path: Some(String::new()),
            ..Default::default()
        }
        .with_display_poster();
        assert_eq!(missing.poster_path.as_deref(), Some(PLACEHOLDER_POSTER));
        assert_eq!(empty.poster_path.as_deref(), Some(PLACEHOLDER_POSTER));
    }

    #[test]
    fn storage_format_is_camel_case() {
        let movie = Movie {
            id: 42,
            original_title: Some("Orig".to_string()),
            poster_path: Some("/p.jpg".to_string()),
            genre_ids: vec![18, 35],
            vote_count: 7,
            ..Default::default()
        };
        let value = serde_json::to_value(&movie).unwrap();
        assert_eq!(value["id"], json!(42));
        assert_eq!(value["originalTitle"], json!("Orig"));
        assert_eq!(value["posterPath"], json!("/p.jpg"));
        assert_eq!(value["genreIds"], json!([18, 35]));
        assert_eq!(value["voteCount"], json!(7));
        assert!(value.get("original_title").is_none());
        assert_eq!(value.as_object().unwrap().len(), 14);
    }

    #[test]
    fn sparse_stored_movie_decodes_with_defaults() {
        let movie: Movie = serde_json::from_value(json!({ "id": 9, "title": "Nine" })).unwrap();
        assert_eq!(movie.id, 9);
        assert_eq!(movie.display_title(), "Nine");
        assert!(movie.genre_ids.is_empty());
        assert!(!movie.adult);
    }

    #[test]
    fn identity_ignores_other_fields() {
        let a = Movie {
            id: 3,
            title: Some("A".to_string()),
            ..Default::default()
        };
        let b = Movie {
            id: 3,
            title: Some("B".to_string()),
            vote_count: 100,
            ..Default::default()
        };
        assert!(a.same_movie(&b));
        assert_ne!(a, b);
    }
}
