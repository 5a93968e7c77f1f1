//! Decoding of normalized store rows into domain values.

use crate::storage::{Row, normalize, normalize_row};
use crate::{Error, Result};
use serde::de::DeserializeOwned;

/// Decodes whole rows, one value per row.
pub fn decode_rows<T: DeserializeOwned>(operation: &str, rows: Vec<Row>) -> Result<Vec<T>> {
    rows.into_iter()
        .map(|row| decode(operation, normalize_row(row)))
        .collect()
}

/// Decodes a single column of every row.
pub fn decode_column<T: DeserializeOwned>(
    operation: &str,
    rows: Vec<Row>,
    column: &str,
) -> Result<Vec<T>> {
    rows.into_iter()
        .map(|mut row| {
            let value = row.remove(column).ok_or_else(|| {
                Error::operation(operation, format!("result row has no column '{column}'"))
            })?;
            decode(operation, normalize(value))
        })
        .collect()
}

fn decode<T: DeserializeOwned>(operation: &str, value: serde_json::Value) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| Error::operation(operation, format!("unexpected result row: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MovieRole, RelationshipRole};
    use crate::storage::StoreValue;

    fn row(pairs: &[(&str, StoreValue)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_decode_column() {
        let rows = vec![
            row(&[("title", "Heat".into())]),
            row(&[("title", "Ronin".into())]),
        ];
        let titles: Vec<String> = decode_column("list_movies", rows, "title").unwrap();
        assert_eq!(titles, vec!["Heat", "Ronin"]);
    }

    #[test]
    fn test_decode_rows() {
        let rows = vec![row(&[("title", "Heat".into()), ("role", "DIRECTED".into())])];
        let decoded: Vec<MovieRole> = decode_rows("related_movies", rows).unwrap();
        assert_eq!(decoded, vec![MovieRole::new("Heat", RelationshipRole::Directed)]);
    }

    #[test]
    fn test_contract_violations_fail() {
        let missing = vec![row(&[("name", "Heat".into())])];
        assert!(decode_column::<String>("list_movies", missing, "title").is_err());

        let null_title = vec![row(&[("title", StoreValue::Null)])];
        assert!(decode_column::<String>("list_movies", null_title, "title").is_err());

        let bad_role = vec![row(&[("title", "Heat".into()), ("role", "HACKED".into())])];
        assert!(decode_rows::<MovieRole>("related_movies", bad_role).is_err());
    }
}
