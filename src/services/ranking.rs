//! Top-actor ranking.

use crate::Result;
use crate::models::TopActor;
use crate::services::decode::decode_rows;
use crate::storage::{GraphSession, Statement};

/// Returns the person with the most distinct `ACTED_IN` movies.
///
/// Ties are broken by the store's ordering. Without any `ACTED_IN` edge the
/// [`TopActor::none_found`] sentinel is returned instead of an error.
///
/// # Errors
///
/// Returns an error if the statement fails or the row breaks its contract.
pub fn top_actor(session: &mut dyn GraphSession) -> Result<TopActor> {
    let statement = Statement::top_actor();
    let rows = session.run(&statement)?;
    let ranked: Vec<RankedActor> = decode_rows(statement.kind().name(), rows)?;

    Ok(ranked
        .into_iter()
        .next()
        .filter(|actor| actor.movie_count > 0)
        .map_or_else(TopActor::none_found, |actor| TopActor {
            name: actor.name,
            movie_count: actor.movie_count,
        }))
}

/// Row shape of the top-actor statement.
#[derive(serde::Deserialize)]
struct RankedActor {
    name: String,
    movie_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Row, StoreValue};

    /// Session returning canned rows.
    struct Canned(Vec<Row>);

    impl GraphSession for Canned {
        fn run(&mut self, _statement: &Statement) -> Result<Vec<Row>> {
            Ok(std::mem::take(&mut self.0))
        }

        fn commit(self: Box<Self>) -> Result<()> {
            Ok(())
        }
    }

    fn ranked(name: &str, count: i64) -> Row {
        [
            ("name".to_string(), StoreValue::from(name)),
            ("movie_count".to_string(), StoreValue::from(count)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_first_row_wins() {
        let mut session = Canned(vec![ranked("Tom Hanks", 12), ranked("Meg Ryan", 3)]);
        let top = top_actor(&mut session).unwrap();
        assert_eq!(top.name, "Tom Hanks");
        assert_eq!(top.movie_count, 12);
    }

    #[test]
    fn test_empty_result_is_sentinel() {
        let mut session = Canned(Vec::new());
        assert!(top_actor(&mut session).unwrap().is_none_found());
    }

    #[test]
    fn test_negative_count_fails() {
        let mut session = Canned(vec![ranked("Nobody", -1)]);
        assert!(top_actor(&mut session).is_err());
    }
}
