//! Movie graph domain types.
//!
//! The graph holds two kinds of node and one kind of edge:
//!
//! | Type | Identity | Attributes |
//! |------|----------|------------|
//! | `Movie` | `title` | `released` (year), `tagline` |
//! | `Person` | `name` | none |
//! | credit edge | (person, movie, role) | none |
//!
//! Credit edges always point from a person to a movie and carry one of the
//! four [`RelationshipRole`]s. A person may hold several roles on the same
//! movie, but never the same role twice.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel name returned by the top-actor ranking when nobody acted in anything.
pub const NO_ACTORS_FOUND: &str = "no actors found";

/// Type of credit between a person and a movie.
///
/// This is a closed set. Values arriving from outside the process are parsed
/// with [`RelationshipRole::parse`], which accepts only the exact upper-case
/// edge label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipRole {
    /// Person acted in the movie.
    ActedIn,
    /// Person directed the movie.
    Directed,
    /// Person produced the movie.
    Produced,
    /// Person wrote the movie.
    Wrote,
}

impl RelationshipRole {
    /// Returns all role variants.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::ActedIn, Self::Directed, Self::Produced, Self::Wrote]
    }

    /// Returns the edge label for this role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ActedIn => "ACTED_IN",
            Self::Directed => "DIRECTED",
            Self::Produced => "PRODUCED",
            Self::Wrote => "WROTE",
        }
    }

    /// Parses a role from its exact edge label.
    ///
    /// No case folding or trimming is applied.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|role| role.as_str() == s)
    }

    /// Returns `true` for the roles that link movies in the related-movies traversal.
    #[must_use]
    pub const fn is_director_or_producer(&self) -> bool {
        matches!(self, Self::Directed | Self::Produced)
    }
}

impl fmt::Display for RelationshipRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RelationshipRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| Error::InvalidRole(s.to_string()))
    }
}

/// A movie node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    /// Unique title.
    pub title: String,
    /// Release year.
    #[serde(default)]
    pub released: Option<i64>,
    /// Tagline.
    #[serde(default)]
    pub tagline: Option<String>,
}

/// A person credited on a movie, as seen from the movie.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Credit {
    /// Person name.
    pub person: String,
    /// Credit type.
    pub role: RelationshipRole,
}

impl Credit {
    /// Creates a new credit.
    #[must_use]
    pub fn new(person: impl Into<String>, role: RelationshipRole) -> Self {
        Self {
            person: person.into(),
            role,
        }
    }
}

/// A movie credited to a person, as seen from the person.
///
/// Returned by the director/producer filmography and by the related-movies
/// traversal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MovieRole {
    /// Movie title.
    pub title: String,
    /// Credit type.
    pub role: RelationshipRole,
}

impl MovieRole {
    /// Creates a new movie role.
    #[must_use]
    pub fn new(title: impl Into<String>, role: RelationshipRole) -> Self {
        Self {
            title: title.into(),
            role,
        }
    }
}

/// A movie with every person credited on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieDetails {
    /// Unique title.
    pub title: String,
    /// Release year.
    pub released: Option<i64>,
    /// Tagline.
    pub tagline: Option<String>,
    /// Incoming credits of any role, ordered by person then role.
    pub people: Vec<Credit>,
}

impl MovieDetails {
    /// Combines a movie node with its credits.
    #[must_use]
    pub fn from_parts(movie: Movie, people: Vec<Credit>) -> Self {
        Self {
            title: movie.title,
            released: movie.released,
            tagline: movie.tagline,
            people,
        }
    }
}

/// The person with the most `ACTED_IN` credits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopActor {
    /// Person name, or [`NO_ACTORS_FOUND`].
    pub name: String,
    /// Number of distinct movies acted in.
    pub movie_count: u64,
}

impl TopActor {
    /// Sentinel result for a dataset without any `ACTED_IN` edge.
    #[must_use]
    pub fn none_found() -> Self {
        Self {
            name: NO_ACTORS_FOUND.to_string(),
            movie_count: 0,
        }
    }

    /// Returns `true` if this is the empty-dataset sentinel.
    #[must_use]
    pub fn is_none_found(&self) -> bool {
        self.movie_count == 0 && self.name == NO_ACTORS_FOUND
    }
}

/// Release year as submitted by a client.
///
/// Web forms submit the year as text, API clients as a number; both are
/// accepted and checked during validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum YearInput {
    /// Numeric year.
    Number(i64),
    /// Year as text, e.g. `"2010"`.
    Text(String),
}

impl From<i64> for YearInput {
    fn from(year: i64) -> Self {
        Self::Number(year)
    }
}

impl From<&str> for YearInput {
    fn from(year: &str) -> Self {
        Self::Text(year.to_string())
    }
}

/// Request to record a movie and optionally one credit on it.
///
/// Field names follow the wire format (`movieTitle`, `movieYear`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddDataRequest {
    /// Movie title (required).
    #[serde(default)]
    pub movie_title: Option<String>,
    /// Release year (required).
    #[serde(default)]
    pub movie_year: Option<YearInput>,
    /// Tagline.
    #[serde(default)]
    pub movie_tagline: Option<String>,
    /// Credited person. Ignored unless `person_role` is also set.
    #[serde(default)]
    pub person_name: Option<String>,
    /// Credit role. Ignored unless `person_name` is also set.
    #[serde(default)]
    pub person_role: Option<String>,
}

impl AddDataRequest {
    /// Creates a request for a movie without tagline or credit.
    #[must_use]
    pub fn new(title: impl Into<String>, year: impl Into<YearInput>) -> Self {
        Self {
            movie_title: Some(title.into()),
            movie_year: Some(year.into()),
            ..Self::default()
        }
    }

    /// Sets the tagline.
    #[must_use]
    pub fn with_tagline(mut self, tagline: impl Into<String>) -> Self {
        self.movie_tagline = Some(tagline.into());
        self
    }

    /// Sets the credited person and role.
    #[must_use]
    pub fn with_credit(mut self, person: impl Into<String>, role: impl Into<String>) -> Self {
        self.person_name = Some(person.into());
        self.person_role = Some(role.into());
        self
    }
}

/// Confirmation returned by a successful add-data call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddDataResponse {
    /// Human readable confirmation.
    pub message: String,
}

impl AddDataResponse {
    /// The standard success confirmation.
    #[must_use]
    pub fn added() -> Self {
        Self {
            message: "Data added successfully".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("ACTED_IN", Some(RelationshipRole::ActedIn) ; "acted in")]
    #[test_case("DIRECTED", Some(RelationshipRole::Directed) ; "directed")]
    #[test_case("PRODUCED", Some(RelationshipRole::Produced) ; "produced")]
    #[test_case("WROTE", Some(RelationshipRole::Wrote) ; "wrote")]
    #[test_case("acted_in", None ; "lowercase is rejected")]
    #[test_case(" WROTE", None ; "whitespace is rejected")]
    #[test_case("HACKED", None ; "unknown label")]
    #[test_case("ACTED_IN]->(m) DETACH DELETE m //", None ; "injection attempt")]
    #[test_case("", None ; "empty")]
    fn test_role_parse(input: &str, expected: Option<RelationshipRole>) {
        assert_eq!(RelationshipRole::parse(input), expected);
    }

    #[test]
    fn test_role_from_str_error() {
        let err = "HACKED".parse::<RelationshipRole>().unwrap_err();
        assert!(matches!(err, Error::InvalidRole(ref r) if r == "HACKED"));
    }

    #[test]
    fn test_role_roundtrip_through_label() {
        for role in RelationshipRole::all() {
            assert_eq!(RelationshipRole::parse(role.as_str()), Some(*role));
            assert_eq!(role.to_string(), role.as_str());
        }
    }

    #[test]
    fn test_role_serializes_as_label() {
        let json = serde_json::to_string(&RelationshipRole::ActedIn).unwrap();
        assert_eq!(json, "\"ACTED_IN\"");
        let role: RelationshipRole = serde_json::from_str("\"PRODUCED\"").unwrap();
        assert_eq!(role, RelationshipRole::Produced);
    }

    #[test]
    fn test_director_or_producer() {
        assert!(RelationshipRole::Directed.is_director_or_producer());
        assert!(RelationshipRole::Produced.is_director_or_producer());
        assert!(!RelationshipRole::ActedIn.is_director_or_producer());
        assert!(!RelationshipRole::Wrote.is_director_or_producer());
    }

    #[test]
    fn test_top_actor_wire_format() {
        let json = serde_json::to_value(TopActor::none_found()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "no actors found", "movieCount": 0})
        );
        assert!(TopActor::none_found().is_none_found());
    }

    #[test]
    fn test_add_data_request_accepts_text_and_numeric_year() {
        let text: AddDataRequest =
            serde_json::from_str(r#"{"movieTitle": "Heat", "movieYear": "1995"}"#).unwrap();
        assert_eq!(text.movie_year, Some(YearInput::Text("1995".to_string())));

        let number: AddDataRequest =
            serde_json::from_str(r#"{"movieTitle": "Heat", "movieYear": 1995}"#).unwrap();
        assert_eq!(number.movie_year, Some(YearInput::Number(1995)));
        assert_eq!(number.person_name, None);
    }

    #[test]
    fn test_movie_details_wire_format() {
        let details = MovieDetails::from_parts(
            Movie {
                title: "Inception".to_string(),
                released: Some(2010),
                tagline: Some("Dreams feel real".to_string()),
            },
            vec![Credit::new("Leonardo DiCaprio", RelationshipRole::ActedIn)],
        );
        assert_eq!(
            serde_json::to_value(&details).unwrap(),
            serde_json::json!({
                "title": "Inception",
                "released": 2010,
                "tagline": "Dreams feel real",
                "people": [{"person": "Leonardo DiCaprio", "role": "ACTED_IN"}]
            })
        );
    }
}
