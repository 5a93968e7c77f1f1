//! Validated, transactional upsert of movies and credits.
//!
//! A request is first turned into a [`MovieUpsert`]; every check happens
//! there, so an invalid request never produces a statement. Applying the
//! upsert runs the movie merge and the optional credit merge in the caller's
//! session; the caller commits.

use crate::models::{AddDataRequest, RelationshipRole, YearInput};
use crate::storage::{GraphSession, Statement};
use crate::{Error, Result};

/// Message for a request without title or year.
pub const MISSING_TITLE_OR_YEAR: &str = "Movie title and year are required";
/// Message for a year that is not an integer.
pub const INVALID_YEAR: &str = "Movie year must be an integer";

/// A validated add-data request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieUpsert {
    /// Movie title, as submitted.
    pub title: String,
    /// Release year.
    pub released: i64,
    /// Tagline; empty when none was submitted.
    pub tagline: String,
    /// Credit to merge, when both person and role were submitted.
    pub credit: Option<(String, RelationshipRole)>,
}

impl MovieUpsert {
    /// Returns the statements this upsert runs, in order.
    #[must_use]
    pub fn statements(&self) -> Vec<Statement> {
        let mut statements = vec![Statement::merge_movie(
            &self.title,
            self.released,
            &self.tagline,
        )];
        if let Some((person, role)) = &self.credit {
            statements.push(Statement::merge_credit(person, &self.title, *role));
        }
        statements
    }

    /// Runs the upsert in `session`.
    ///
    /// # Errors
    ///
    /// Returns the first store error; the session is left uncommitted.
    pub fn apply(&self, session: &mut dyn GraphSession) -> Result<()> {
        for statement in self.statements() {
            session.run(&statement)?;
        }
        Ok(())
    }
}

impl TryFrom<&AddDataRequest> for MovieUpsert {
    type Error = Error;

    fn try_from(request: &AddDataRequest) -> Result<Self> {
        let title = present(request.movie_title.as_deref())
            .ok_or_else(|| Error::InvalidInput(MISSING_TITLE_OR_YEAR.to_string()))?;
        let released = parse_year(request.movie_year.as_ref())?;

        let person = present(request.person_name.as_deref());
        let role = present(request.person_role.as_deref())
            .map(str::parse::<RelationshipRole>)
            .transpose()?;

        let credit = match (person, role) {
            (Some(person), Some(role)) => Some((person.to_string(), role)),
            _ => None,
        };

        Ok(Self {
            title: title.to_string(),
            released,
            tagline: request.movie_tagline.clone().unwrap_or_default(),
            credit,
        })
    }
}

/// Returns the value unless it is absent or blank.
fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_year(year: Option<&YearInput>) -> Result<i64> {
    match year {
        Some(YearInput::Number(year)) => Ok(*year),
        Some(YearInput::Text(text)) if !text.trim().is_empty() => text
            .trim()
            .parse()
            .map_err(|_| Error::InvalidInput(INVALID_YEAR.to_string())),
        _ => Err(Error::InvalidInput(MISSING_TITLE_OR_YEAR.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StatementKind;

    fn request() -> AddDataRequest {
        AddDataRequest::new("Inception", 2010)
    }

    #[test]
    fn test_minimal_request() {
        let upsert = MovieUpsert::try_from(&request()).unwrap();
        assert_eq!(upsert.title, "Inception");
        assert_eq!(upsert.released, 2010);
        assert_eq!(upsert.tagline, "");
        assert!(upsert.credit.is_none());
        assert_eq!(upsert.statements().len(), 1);
    }

    #[test]
    fn test_credit_request() {
        let upsert = MovieUpsert::try_from(
            &request()
                .with_tagline("Your mind is the scene of the crime")
                .with_credit("Christopher Nolan", "DIRECTED"),
        )
        .unwrap();

        assert_eq!(
            upsert.credit,
            Some(("Christopher Nolan".to_string(), RelationshipRole::Directed))
        );
        let kinds: Vec<_> = upsert.statements().iter().map(Statement::kind).collect();
        assert_eq!(
            kinds,
            vec![
                StatementKind::MergeMovie,
                StatementKind::MergeCredit(RelationshipRole::Directed)
            ]
        );
    }

    #[test]
    fn test_year_as_text() {
        let upsert = MovieUpsert::try_from(&AddDataRequest::new("Heat", " 1995 ")).unwrap();
        assert_eq!(upsert.released, 1995);
    }

    #[test]
    fn test_missing_fields() {
        let no_title = AddDataRequest {
            movie_year: Some(2010.into()),
            ..AddDataRequest::default()
        };
        let blank_title = AddDataRequest::new("   ", 2010);
        let no_year = AddDataRequest {
            movie_title: Some("Inception".to_string()),
            ..AddDataRequest::default()
        };
        let blank_year = AddDataRequest::new("Inception", "");

        for request in [no_title, blank_title, no_year, blank_year] {
            let err = MovieUpsert::try_from(&request).unwrap_err();
            assert!(
                matches!(&err, Error::InvalidInput(msg) if msg == MISSING_TITLE_OR_YEAR),
                "{request:?} -> {err}"
            );
        }
    }

    #[test]
    fn test_non_integer_year() {
        let err = MovieUpsert::try_from(&AddDataRequest::new("Inception", "twenty-ten"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(msg) if msg == INVALID_YEAR));
    }

    #[test]
    fn test_invalid_role_is_rejected() {
        let err = MovieUpsert::try_from(&request().with_credit("Eve", "HACKED")).unwrap_err();
        assert!(matches!(err, Error::InvalidRole(role) if role == "HACKED"));
    }

    #[test]
    fn test_role_without_person_is_still_validated() {
        let mut req = request();
        req.person_role = Some("acted_in".to_string());
        assert!(matches!(
            MovieUpsert::try_from(&req),
            Err(Error::InvalidRole(_))
        ));
    }

    #[test]
    fn test_half_credit_is_skipped() {
        let mut person_only = request();
        person_only.person_name = Some("Leonardo DiCaprio".to_string());
        let mut role_only = request();
        role_only.person_role = Some("ACTED_IN".to_string());
        let blank_person = request().with_credit("  ", "ACTED_IN");

        for req in [person_only, role_only, blank_person] {
            let upsert = MovieUpsert::try_from(&req).unwrap();
            assert!(upsert.credit.is_none(), "{req:?}");
        }
    }
}
