//! Related-movies traversal.
//!
//! Two hops over `DIRECTED`/`PRODUCED` edges: from a movie to the people who
//! directed or produced it, then to the other movies those people directed or
//! produced. Depth is fixed at two.

use crate::Result;
use crate::models::MovieRole;
use crate::services::decode::decode_rows;
use crate::storage::{GraphSession, Statement};
use std::collections::BTreeSet;

/// Returns the movies related to `title`, each with the role that links it.
///
/// The result never contains `title` itself, holds each (title, role) pair
/// once, and is ordered by title then role, whatever the store returns.
/// An unknown title yields an empty list.
///
/// # Errors
///
/// Returns an error if the statement fails or a row breaks its contract.
pub fn related_movies(session: &mut dyn GraphSession, title: &str) -> Result<Vec<MovieRole>> {
    let statement = Statement::related_movies(title);
    let rows = session.run(&statement)?;
    let related: Vec<MovieRole> = decode_rows(statement.kind().name(), rows)?;
    Ok(finish(title, related))
}

/// Drops the source title and any non-linking role, dedupes and orders.
fn finish(title: &str, related: Vec<MovieRole>) -> Vec<MovieRole> {
    related
        .into_iter()
        .filter(|movie| movie.title != title && movie.role.is_director_or_producer())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
