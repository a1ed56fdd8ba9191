//! Dynamic SQL fragments assembled from optional request fields.
//!
//! Column names and operators are `&'static str` supplied by repository code;
//! every value goes through `push_bind` and ends up as a positional parameter.

use sqlx::{Encode, Postgres, QueryBuilder, Type};

/// `%term%` for `ILIKE ... ESCAPE '\'`; wildcards in the term match literally
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// `UPDATE <table> SET ...` built from the present fields of an edit request
pub struct UpdateBuilder<'args> {
    query: QueryBuilder<'args, Postgres>,
    assignments: usize,
    fields: usize,
}

impl<'args> UpdateBuilder<'args> {
    pub fn new(table: &'static str) -> Self {
        Self {
            query: QueryBuilder::new(format!("UPDATE {} SET ", table)),
            assignments: 0,
            fields: 0,
        }
    }

    fn push_column(&mut self, column: &'static str) {
        if self.assignments > 0 {
            self.query.push(", ");
        }
        self.query.push(column).push(" = ");
        self.assignments += 1;
    }

    /// Assign `column` only when a value is present
    pub fn set<T>(&mut self, column: &'static str, value: Option<T>) -> &mut Self
    where
        T: 'args + Encode<'args, Postgres> + Type<Postgres> + Send,
    {
        if let Some(value) = value {
            self.push_column(column);
            self.query.push_bind(value);
            self.fields += 1;
        }
        self
    }

    /// Always assign `column`; `None` writes NULL
    pub fn set_nullable<T>(&mut self, column: &'static str, value: Option<T>) -> &mut Self
    where
        T: 'args + Encode<'args, Postgres> + Type<Postgres> + Send,
    {
        self.push_column(column);
        self.query.push_bind(value);
        self.fields += 1;
        self
    }

    /// Assign `column = NOW()`; does not count as a requested change
    pub fn touch(&mut self, column: &'static str) -> &mut Self {
        self.push_column(column);
        self.query.push("NOW()");
        self
    }

    /// True when the request carried no field to change
    pub fn is_empty(&self) -> bool {
        self.fields == 0
    }

    /// Number of requested field changes
    pub fn field_count(&self) -> usize {
        self.fields
    }

    /// Close the statement with `WHERE <key_column> = $n`.
    ///
    /// Callers may append further `AND ...` conditions to the returned builder.
    pub fn where_key(mut self, key_column: &'static str, key: i64) -> QueryBuilder<'args, Postgres> {
        self.query.push(" WHERE ").push(key_column).push(" = ");
        self.query.push_bind(key);
        self.query
    }
}

/// `SELECT ... [WHERE ...] [ORDER BY ...] [LIMIT ... OFFSET ...]` built from a filter object
pub struct FilterBuilder<'args> {
    query: QueryBuilder<'args, Postgres>,
    conditions: usize,
}

impl<'args> FilterBuilder<'args> {
    /// Start from a fixed "select fields + joins" fragment
    pub fn new(select: impl Into<String>) -> Self {
        Self {
            query: QueryBuilder::new(select),
            conditions: 0,
        }
    }

    fn push_prefix(&mut self) {
        self.query
            .push(if self.conditions == 0 { " WHERE " } else { " AND " });
        self.conditions += 1;
    }

    fn compare<T>(&mut self, column: &'static str, op: &'static str, value: Option<T>) -> &mut Self
    where
        T: 'args + Encode<'args, Postgres> + Type<Postgres> + Send,
    {
        if let Some(value) = value {
            self.push_prefix();
            self.query.push(column).push(" ").push(op).push(" ");
            self.query.push_bind(value);
        }
        self
    }

    pub fn eq<T>(&mut self, column: &'static str, value: Option<T>) -> &mut Self
    where
        T: 'args + Encode<'args, Postgres> + Type<Postgres> + Send,
    {
        self.compare(column, "=", value)
    }

    pub fn gte<T>(&mut self, column: &'static str, value: Option<T>) -> &mut Self
    where
        T: 'args + Encode<'args, Postgres> + Type<Postgres> + Send,
    {
        self.compare(column, ">=", value)
    }

    pub fn lte<T>(&mut self, column: &'static str, value: Option<T>) -> &mut Self
    where
        T: 'args + Encode<'args, Postgres> + Type<Postgres> + Send,
    {
        self.compare(column, "<=", value)
    }

    /// Case-insensitive substring match over one or more columns
    pub fn search(&mut self, columns: &[&'static str], term: Option<&str>) -> &mut Self {
        let term = match term.map(str::trim) {
            Some(t) if !t.is_empty() && !columns.is_empty() => t,
            _ => return self,
        };
        let pattern = contains_pattern(term);

        self.push_prefix();
        self.query.push("(");
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                self.query.push(" OR ");
            }
            self.query.push(*column).push(" ILIKE ");
            self.query.push_bind(pattern.clone());
            self.query.push(" ESCAPE '\\'");
        }
        self.query.push(")");
        self
    }

    /// Fixed condition without parameters, added when `enabled`
    pub fn condition(&mut self, enabled: bool, sql: &'static str) -> &mut Self {
        if enabled {
            self.push_prefix();
            self.query.push(sql);
        }
        self
    }

    pub fn order_by(&mut self, clause: &'static str) -> &mut Self {
        self.query.push(" ORDER BY ").push(clause);
        self
    }

    /// `LIMIT/OFFSET` for 1-based pages; nothing when no page size is requested
    pub fn paginate(&mut self, page: Option<i64>, per_page: Option<i64>) -> &mut Self {
        if let Some(per_page) = per_page.filter(|n| *n > 0) {
            let page = page.unwrap_or(1).max(1);
            self.query.push(" LIMIT ");
            self.query.push_bind(per_page);
            self.query.push(" OFFSET ");
            self.query.push_bind((page - 1) * per_page);
        }
        self
    }

    #[cfg(test)]
    pub fn sql(&self) -> &str {
        self.query.sql()
    }

    pub fn into_query(self) -> QueryBuilder<'args, Postgres> {
        self.query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_only_present_fields() {
        let name = Some("Main dam");
        let mut update = UpdateBuilder::new("reservoirs");
        update
            .set("name", name)
            .set::<f64>("normal_level_m", None)
            .set("dead_level_m", Some(102.5_f64));
        assert_eq!(update.field_count(), 2);

        let query = update.where_key("id", 7);
        assert_eq!(
            query.sql(),
            "UPDATE reservoirs SET name = $1, dead_level_m = $2 WHERE id = $3"
        );
    }

    #[test]
    fn test_update_empty_request() {
        let mut update = UpdateBuilder::new("positions");
        update.set::<String>("name", None).touch("updated_at");
        assert!(update.is_empty());
    }

    #[test]
    fn test_update_nullable_always_assigned() {
        let mut update = UpdateBuilder::new("shutdowns");
        update
            .set_nullable::<f64>("generation_loss_mwh", None)
            .set::<String>("reason", None)
            .touch("updated_at");
        assert_eq!(update.field_count(), 1);
        assert_eq!(
            update.where_key("id", 1).sql(),
            "UPDATE shutdowns SET generation_loss_mwh = $1, updated_at = NOW() WHERE id = $2"
        );
    }

    #[test]
    fn test_filter_without_conditions() {
        let mut filter = FilterBuilder::new("SELECT * FROM positions p");
        filter.eq::<i64>("p.id", None).search(&["p.name"], Some("   "));
        filter.order_by("p.name");
        assert_eq!(filter.sql(), "SELECT * FROM positions p ORDER BY p.name");
    }

    #[test]
    fn test_filter_numbers_parameters_in_order() {
        let mut filter = FilterBuilder::new("SELECT * FROM contacts c");
        filter
            .eq("c.organization_id", Some(3_i64))
            .search(&["c.fio", "c.email"], Some("ivan"))
            .condition(true, "c.department_id IS NOT NULL")
            .lte("c.position_id", Some(9_i64));
        filter.order_by("c.fio").paginate(Some(2), Some(20));
        assert_eq!(
            filter.sql(),
            "SELECT * FROM contacts c WHERE c.organization_id = $1 \
             AND (c.fio ILIKE $2 ESCAPE '\\' OR c.email ILIKE $3 ESCAPE '\\') \
             AND c.department_id IS NOT NULL AND c.position_id <= $4 \
             ORDER BY c.fio LIMIT $5 OFFSET $6"
        );
    }

    #[test]
    fn test_search_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("ivan"), "%ivan%");
        assert_eq!(contains_pattern("50%"), "%50\\%%");
        assert_eq!(contains_pattern("a_b"), "%a\\_b%");
        assert_eq!(contains_pattern(r"C:\dam"), r"%C:\\dam%");
    }
}
