use std::fmt;

use crate::path::Path;
use crate::value::Value;

/// Filter operator. Closed set; the compiler matches exhaustively and
/// anything it can't express for a given entry becomes an
/// `UnsupportedPredicate` error instead of being dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Membership test against the supplied values.
    Eq,
    /// Array-overlap test between a supplied array and an array column.
    Any,
    /// Full-text prefix search against the table's search index.
    Search,
    /// Marker entry: combine the *next* condition with OR instead of AND.
    Or,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operator::Eq => "EQUALS",
            Operator::Any => "ANY",
            Operator::Search => "SEARCH",
            Operator::Or => "OR",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub column: String,
    pub order: SortOrder,
}

/// One filter entry: a path, an operator, and its values. OR markers carry
/// an empty path and no values.
#[derive(Debug, Clone, PartialEq)]
pub struct Where {
    pub path: Path,
    pub operator: Operator,
    pub values: Vec<Value>,
}

/// Mutable specification of what to retrieve from one root table.
///
/// Built fluently, compiled by [`compile`](crate::compile). The entry order
/// of selects and filters is significant: it drives join emission order and
/// the scope of OR markers.
#[derive(Debug, Clone)]
pub struct Query {
    root: String,
    selects: Vec<Path>,
    wheres: Vec<Where>,
    sorts: Vec<Sort>,
}

impl Query {
    pub fn new(root: impl Into<String>) -> Query {
        Query {
            root: root.into(),
            selects: Vec::new(),
            wheres: Vec::new(),
            sorts: Vec::new(),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn selects(&self) -> &[Path] {
        &self.selects
    }

    pub fn wheres(&self) -> &[Where] {
        &self.wheres
    }

    pub fn sorts(&self) -> &[Sort] {
        &self.sorts
    }

    /// Add a field path to retrieve, e.g. `"name"` or `"mother/name"`.
    pub fn select(&mut self, path: impl Into<Path>) -> &mut Query {
        self.selects.push(path.into());
        self
    }

    pub(crate) fn set_selects(&mut self, selects: Vec<Path>) {
        self.selects = selects;
    }

    /// Add a filter condition, AND-combined with what precedes it unless an
    /// OR marker intervenes.
    pub fn filter<V: Into<Value>>(
        &mut self,
        path: impl Into<Path>,
        operator: Operator,
        values: impl IntoIterator<Item = V>,
    ) -> &mut Query {
        self.wheres.push(Where {
            path: path.into(),
            operator,
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Alias of [`filter`](Query::filter), reading better after an
    /// [`or_filter`](Query::or_filter).
    pub fn and<V: Into<Value>>(
        &mut self,
        path: impl Into<Path>,
        operator: Operator,
        values: impl IntoIterator<Item = V>,
    ) -> &mut Query {
        self.filter(path, operator, values)
    }

    /// Insert a bare OR marker: the next condition combines with OR.
    pub fn or(&mut self) -> &mut Query {
        self.wheres.push(Where {
            path: Path::new(Vec::<String>::new()),
            operator: Operator::Or,
            values: Vec::new(),
        });
        self
    }

    /// OR-combine the given condition with the accumulated ones.
    pub fn or_filter<V: Into<Value>>(
        &mut self,
        path: impl Into<Path>,
        operator: Operator,
        values: impl IntoIterator<Item = V>,
    ) -> &mut Query {
        self.or();
        self.filter(path, operator, values)
    }

    /// Add a full-text search over the root table's plain columns. Terms are
    /// whitespace-separated; each matches as a prefix, all must match.
    pub fn search(&mut self, terms: &str) -> &mut Query {
        self.wheres.push(Where {
            path: Path::new(Vec::<String>::new()),
            operator: Operator::Search,
            values: terms
                .split_whitespace()
                .map(|t| Value::Text(t.to_string()))
                .collect(),
        });
        self
    }

    pub fn sort(&mut self, column: impl Into<String>, order: SortOrder) -> &mut Query {
        self.sorts.push(Sort {
            column: column.into(),
            order,
        });
        self
    }

    pub fn asc(&mut self, column: impl Into<String>) -> &mut Query {
        self.sort(column, SortOrder::Asc)
    }

    pub fn desc(&mut self, column: impl Into<String>) -> &mut Query {
        self.sort(column, SortOrder::Desc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fluent_chain_accumulates_in_order() {
        let mut query = Query::new("Person");
        query
            .select("name")
            .select("mother/name")
            .filter("age", Operator::Eq, [42])
            .or_filter("name", Operator::Eq, ["piet"])
            .search("blue eyes")
            .asc("name");

        assert_eq!(query.root(), "Person");
        assert_eq!(query.selects().len(), 2);
        assert_eq!(query.selects()[1], Path::parse("mother/name"));

        // or_filter expands to a marker entry plus the condition.
        assert_eq!(query.wheres().len(), 4);
        assert_eq!(query.wheres()[1].operator, Operator::Or);
        assert!(query.wheres()[1].values.is_empty());
        assert_eq!(query.wheres()[2].operator, Operator::Eq);

        assert_eq!(query.wheres()[3].operator, Operator::Search);
        assert_eq!(
            query.wheres()[3].values,
            vec![
                Value::Text("blue".to_string()),
                Value::Text("eyes".to_string())
            ]
        );

        assert_eq!(query.sorts()[0].column, "name");
        assert_eq!(query.sorts()[0].order, SortOrder::Asc);
    }
}
