//! Row-scanning helpers shared by every repository.
//!
//! They work on a `PgRow` regardless of whether it came from `fetch_one`,
//! `fetch_optional` or `fetch_all`. Nullable joined columns become `None`
//! instead of an error or a zero value.

use sqlx::{postgres::PgRow, Row};

use crate::models::common::{ContactRef, NamedRef};

/// Build a [`NamedRef`] from a nullable `(id, name)` column pair
pub fn named_ref(row: &PgRow, id_column: &str, name_column: &str) -> Result<Option<NamedRef>, sqlx::Error> {
    let id: Option<i64> = row.try_get(id_column)?;
    let name: Option<String> = row.try_get(name_column)?;
    Ok(match (id, name) {
        (Some(id), Some(name)) => Some(NamedRef { id, name }),
        _ => None,
    })
}

/// Build a [`ContactRef`] from a nullable `(id, fio)` column pair
pub fn contact_ref(row: &PgRow, id_column: &str, fio_column: &str) -> Result<Option<ContactRef>, sqlx::Error> {
    let id: Option<i64> = row.try_get(id_column)?;
    let fio: Option<String> = row.try_get(fio_column)?;
    Ok(match (id, fio) {
        (Some(id), Some(fio)) => Some(ContactRef { id, fio }),
        _ => None,
    })
}

/// Map every row with `scan`, stopping at the first failure
pub fn scan_all<T>(
    rows: &[PgRow],
    scan: impl Fn(&PgRow) -> Result<T, sqlx::Error>,
) -> Result<Vec<T>, sqlx::Error> {
    rows.iter().map(scan).collect()
}
