use catalog::{ColumnKind, ColumnType, SchemaCatalog, Table, ROW_ID, SEARCH_VECTOR};
use indexmap::IndexSet;
use tracing::trace;

use crate::errors::{QueryError, Result};
use crate::path::Path;
use crate::query::{Operator, Query, SortOrder, Where};
use crate::value::Value;

/// A fully resolved query, ready to execute: parameterized SQL plus the
/// typed output fields rows decode against.
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<Value>,
    pub fields: Vec<CompiledField>,
}

#[derive(Debug, Clone)]
pub struct CompiledField {
    /// Full `/`-joined path the field is keyed by in result rows.
    pub alias: String,
    pub ctype: ColumnType,
    /// Whether the underlying column is array-valued (reference arrays).
    pub array: bool,
}

/// Combination state for the next filter condition. `OrOnce` is set by an OR
/// marker and applies to exactly one condition before falling back to `And`;
/// it never chains.
#[derive(Debug, Clone, Copy)]
enum Combine {
    And,
    OrOnce,
}

/// Resolve a query against the catalog and emit the select list, join
/// graph, filter conditions and ordering.
///
/// Everything is resolved here, before any engine round trip: unresolvable
/// paths, unsupported operators and value coercion failures never reach the
/// engine. Join and filter emission order is derived solely from the entry
/// order of the query plus first-seen order of path prefixes, so compiling
/// the same query twice yields identical text.
pub fn compile(catalog: &SchemaCatalog, query: &Query) -> Result<CompiledQuery> {
    let root = catalog.require_table(query.root())?;

    // The select list defaults to the root's own plain columns.
    let mut select_paths: Vec<Path> = query.selects().to_vec();
    if select_paths.is_empty() {
        select_paths = root
            .plain_columns()
            .map(|c| Path::new([c.name.as_str()]))
            .collect();
    }
    if select_paths.is_empty() {
        select_paths.push(Path::new([ROW_ID]));
    }

    let mut fields = Vec::with_capacity(select_paths.len());
    let mut field_exprs = Vec::with_capacity(select_paths.len());
    for path in &select_paths {
        let (table, ctype) = resolve_terminal(catalog, root, path)?;
        let array = is_array_column(table, path.terminal());
        field_exprs.push(format!(
            "{}.{} AS {}",
            quote_ident(&path.join_alias(root.name())),
            quote_ident(path.terminal()),
            quote_ident(&path.field_alias()),
        ));
        fields.push(CompiledField {
            alias: path.field_alias(),
            ctype,
            array,
        });
    }

    // Joins derive from select and filter paths alike; shared prefixes are
    // deduplicated by first-seen order.
    let mut joins = JoinBuilder {
        catalog,
        root,
        seen: IndexSet::new(),
        joins: Vec::new(),
    };
    for path in &select_paths {
        joins.add_path(path)?;
    }
    for entry in query.wheres() {
        if !entry.path.is_empty() {
            joins.add_path(&entry.path)?;
        }
    }

    let mut conditions = ConditionBuilder {
        catalog,
        root,
        params: Vec::new(),
    };
    let filter = conditions.build(query.wheres())?;

    let mut order_by = Vec::with_capacity(query.sorts().len());
    for sort in query.sorts() {
        if sort.column != ROW_ID {
            root.require_column(&sort.column)?;
        }
        order_by.push(format!(
            "{}.{} {}",
            quote_ident(root.name()),
            quote_ident(&sort.column),
            match sort.order {
                SortOrder::Asc => "ASC",
                SortOrder::Desc => "DESC",
            },
        ));
    }

    let mut sql = format!(
        "SELECT {} FROM {} AS {}",
        field_exprs.join(", "),                 // SELECT <fields>
        qualify(catalog.name(), root.name()),   // FROM <schema>.<table>
        quote_ident(root.name()),               // AS <root alias>
    );
    for join in &joins.joins {
        sql.push(' ');
        sql.push_str(join);
    }
    if let Some(filter) = filter {
        sql.push_str(" WHERE ");
        sql.push_str(&filter);
    }
    if !order_by.is_empty() {
        sql.push_str(" ORDER BY ");
        sql.push_str(&order_by.join(", "));
    }
    trace!(?sql);

    Ok(CompiledQuery {
        sql,
        params: conditions.params,
        fields,
    })
}

/// Compile `query` reshaped to select exactly one column.
pub(crate) fn compile_for_column(
    catalog: &SchemaCatalog,
    query: &Query,
    column: &str,
) -> Result<CompiledQuery> {
    let mut shaped = query.clone();
    shaped.set_selects(vec![Path::parse(column)]);
    compile(catalog, &shaped)
}

/// Walk a path from `root` through its reference hops, returning the table
/// the terminal field lives on and the field's declared type.
fn resolve_terminal<'a>(
    catalog: &'a SchemaCatalog,
    root: &'a Table,
    path: &Path,
) -> Result<(&'a Table, ColumnType)> {
    let mut table = root;
    for seg in path
        .segments()
        .iter()
        .take(path.len().saturating_sub(1))
    {
        let column = table
            .column(seg)
            .ok_or_else(|| unresolved(seg, table.name()))?;
        let target = column
            .kind
            .ref_table()
            .ok_or_else(|| unresolved(seg, table.name()))?;
        table = catalog.require_table(target)?;
    }

    let terminal = path.terminal();
    if terminal == ROW_ID {
        // Implicit identity column, present on every managed table.
        return Ok((table, ColumnType::Uuid));
    }
    let column = table
        .column(terminal)
        .ok_or_else(|| unresolved(terminal, table.name()))?;
    Ok((table, column.ctype))
}

fn is_array_column(table: &Table, column: &str) -> bool {
    table
        .column(column)
        .is_some_and(|c| matches!(c.kind, ColumnKind::RefArray { .. }))
}

struct JoinBuilder<'a> {
    catalog: &'a SchemaCatalog,
    root: &'a Table,
    /// Join aliases already emitted, in first-seen order.
    seen: IndexSet<Path>,
    joins: Vec<String>,
}

impl JoinBuilder<'_> {
    /// Emit the joins a path needs, one per reference hop, reusing any the
    /// query already produced for a shared prefix.
    fn add_path(&mut self, path: &Path) -> Result<()> {
        let mut table = self.root;
        let mut left_alias = self.root.name().to_string();

        for idx in 0..path.len().saturating_sub(1) {
            let seg = path.segments()[idx].as_str();
            let column = table
                .column(seg)
                .ok_or_else(|| unresolved(seg, table.name()))?;

            let prefix = path.prefix(idx + 1);
            let alias = format!("{}/{}", self.root.name(), prefix);
            let first_seen = self.seen.insert(prefix);

            let target = match &column.kind {
                ColumnKind::Plain => return Err(unresolved(seg, table.name())),

                ColumnKind::Ref {
                    table: target,
                    column: target_column,
                } => {
                    let target = self.catalog.require_table(target)?;
                    if first_seen {
                        self.joins.push(format!(
                            "LEFT JOIN {} AS {} ON {}.{} = {}.{}",
                            qualify(self.catalog.name(), target.name()),
                            quote_ident(&alias),
                            quote_ident(&alias),
                            quote_ident(target_column),
                            quote_ident(&left_alias),
                            quote_ident(&column.name),
                        ));
                    }
                    target
                }

                ColumnKind::RefArray {
                    table: target,
                    column: target_column,
                } => {
                    let target = self.catalog.require_table(target)?;
                    if first_seen {
                        self.joins.push(format!(
                            "LEFT JOIN {} AS {} ON {}.{} = ANY ({}.{})",
                            qualify(self.catalog.name(), target.name()),
                            quote_ident(&alias),
                            quote_ident(&alias),
                            quote_ident(target_column),
                            quote_ident(&left_alias),
                            quote_ident(&column.name),
                        ));
                    }
                    target
                }

                ColumnKind::Mref {
                    table: target,
                    column: target_column,
                    join_table,
                } => {
                    let target = self.catalog.require_table(target)?;
                    if first_seen {
                        let link = join_table
                            .clone()
                            .unwrap_or_else(|| format!("{}_{}", table.name(), column.name));
                        let link_alias = format!("{alias}~link");
                        // Into the link table, keyed by the owning side's
                        // identity, then out to the referenced table. Both
                        // joins always travel together.
                        self.joins.push(format!(
                            "LEFT JOIN {} AS {} ON {}.{} = {}.{}",
                            qualify(self.catalog.name(), &link),
                            quote_ident(&link_alias),
                            quote_ident(&link_alias),
                            quote_ident(table.name()),
                            quote_ident(&left_alias),
                            quote_ident(ROW_ID),
                        ));
                        self.joins.push(format!(
                            "LEFT JOIN {} AS {} ON {}.{} = {}.{}",
                            qualify(self.catalog.name(), target.name()),
                            quote_ident(&alias),
                            quote_ident(&alias),
                            quote_ident(target_column),
                            quote_ident(&link_alias),
                            quote_ident(&column.name),
                        ));
                    }
                    target
                }
            };

            left_alias = alias;
            table = target;
        }
        Ok(())
    }
}

struct ConditionBuilder<'a> {
    catalog: &'a SchemaCatalog,
    root: &'a Table,
    params: Vec<Value>,
}

impl ConditionBuilder<'_> {
    fn build(&mut self, wheres: &[Where]) -> Result<Option<String>> {
        let mut acc: Option<String> = None;
        let mut combine = Combine::And;

        for entry in wheres {
            let condition = match entry.operator {
                Operator::Or => {
                    combine = Combine::OrOnce;
                    continue;
                }
                Operator::Search => {
                    if !entry.path.is_empty() {
                        return Err(QueryError::UnsupportedPredicate {
                            operator: entry.operator.to_string(),
                            path: entry.path.to_string(),
                        });
                    }
                    self.search_condition(entry)
                }
                Operator::Eq => self.eq_condition(entry)?,
                Operator::Any => self.any_condition(entry)?,
            };

            acc = Some(match acc {
                None => condition,
                Some(prev) => {
                    let joined = match combine {
                        Combine::And => format!("{prev} AND {condition}"),
                        Combine::OrOnce => format!("{prev} OR {condition}"),
                    };
                    combine = Combine::And;
                    joined
                }
            });
        }
        Ok(acc)
    }

    fn eq_condition(&mut self, entry: &Where) -> Result<String> {
        let (_, ctype) = resolve_terminal(self.catalog, self.root, &entry.path)?;

        // Membership in an empty set matches nothing.
        if entry.values.is_empty() {
            return Ok("FALSE".to_string());
        }

        let mut placeholders = Vec::with_capacity(entry.values.len());
        for value in &entry.values {
            let coerced = value.coerce_to(ctype).ok_or_else(|| QueryError::InvalidValue {
                value: value.to_string(),
                expected: ctype,
                column: entry.path.field_alias(),
            })?;
            placeholders.push(self.push_param(coerced));
        }

        Ok(format!(
            "{}.{} IN ({})",
            quote_ident(&entry.path.join_alias(self.root.name())),
            quote_ident(entry.path.terminal()),
            placeholders.join(", "),
        ))
    }

    fn any_condition(&mut self, entry: &Where) -> Result<String> {
        let (_, ctype) = resolve_terminal(self.catalog, self.root, &entry.path)?;

        let array = array_value(&entry.values, ctype).ok_or_else(|| QueryError::InvalidValue {
            value: entry
                .values
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(", "),
            expected: ctype,
            column: entry.path.field_alias(),
        })?;
        let placeholder = self.push_param(array);

        Ok(format!(
            "{} && {}.{}",
            placeholder,
            quote_ident(&entry.path.join_alias(self.root.name())),
            quote_ident(entry.path.terminal()),
        ))
    }

    fn search_condition(&mut self, entry: &Where) -> String {
        let terms: Vec<String> = entry
            .values
            .iter()
            .filter_map(|v| match v {
                Value::Text(s) => Some(s),
                _ => None,
            })
            .flat_map(|s| s.split_whitespace())
            .map(|term| format!("{term}:*"))
            .collect();

        if terms.is_empty() {
            return "FALSE".to_string();
        }

        let placeholder = self.push_param(Value::Text(terms.join(" & ")));
        format!(
            "{}.{} @@ to_tsquery({})",
            quote_ident(self.root.name()),
            quote_ident(SEARCH_VECTOR),
            placeholder,
        )
    }

    fn push_param(&mut self, value: Value) -> String {
        self.params.push(value);
        format!("${}", self.params.len())
    }
}

/// Build an array parameter for an overlap test, coercing scalars to the
/// column's element type. A single already-array value passes through.
fn array_value(values: &[Value], ctype: ColumnType) -> Option<Value> {
    if let [single] = values {
        if single.is_array() {
            return single.coerce_to(ctype);
        }
    }

    match ctype {
        ColumnType::Int => values
            .iter()
            .map(|v| match v.coerce_to(ColumnType::Int) {
                Some(Value::Int(i)) => Some(i),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(Value::IntArray),
        ColumnType::Text => values
            .iter()
            .map(|v| match v.coerce_to(ColumnType::Text) {
                Some(Value::Text(s)) => Some(s),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(Value::TextArray),
        ColumnType::Uuid => values
            .iter()
            .map(|v| match v.coerce_to(ColumnType::Uuid) {
                Some(Value::Uuid(u)) => Some(u),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(Value::UuidArray),
        _ => None,
    }
}

fn unresolved(segment: &str, table: &str) -> QueryError {
    QueryError::UnresolvedPath {
        segment: segment.to_string(),
        table: table.to_string(),
    }
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn qualify(schema: &str, table: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::Column;

    fn people_catalog() -> SchemaCatalog {
        let mut catalog = SchemaCatalog::new("People");
        catalog
            .add_table(
                Table::new("Person")
                    .with_column(Column::plain("name", ColumnType::Text))
                    .with_column(Column::plain("age", ColumnType::Int))
                    .with_column(Column::reference(
                        "mother",
                        ColumnType::Uuid,
                        "Person",
                        ROW_ID,
                    ))
                    .with_column(Column::reference_array(
                        "pets",
                        ColumnType::Uuid,
                        "Pet",
                        ROW_ID,
                    ))
                    .with_column(Column::many_to_many(
                        "groups",
                        ColumnType::Uuid,
                        "Group",
                        ROW_ID,
                    )),
            )
            .unwrap();
        catalog
            .add_table(
                Table::new("Pet")
                    .with_column(Column::plain("name", ColumnType::Text)),
            )
            .unwrap();
        catalog
            .add_table(
                Table::new("Group")
                    .with_column(Column::plain("name", ColumnType::Text)),
            )
            .unwrap();
        catalog.validate().unwrap();
        catalog
    }

    fn join_count(sql: &str) -> usize {
        sql.matches("LEFT JOIN").count()
    }

    #[test]
    fn plain_query_has_no_joins() {
        let catalog = people_catalog();
        let mut query = Query::new("Person");
        query
            .select("name")
            .filter("age", Operator::Eq, [42]);

        let compiled = compile(&catalog, &query).unwrap();
        assert_eq!(join_count(&compiled.sql), 0);
        assert_eq!(
            compiled.sql,
            r#"SELECT "Person"."name" AS "name" FROM "People"."Person" AS "Person" WHERE "Person"."age" IN ($1)"#
        );
        assert_eq!(compiled.params, vec![Value::Int(42)]);
    }

    #[test]
    fn default_select_is_all_plain_columns() {
        let catalog = people_catalog();
        let compiled = compile(&catalog, &Query::new("Person")).unwrap();
        assert_eq!(
            compiled.sql,
            r#"SELECT "Person"."name" AS "name", "Person"."age" AS "age" FROM "People"."Person" AS "Person""#
        );
        let aliases: Vec<_> = compiled.fields.iter().map(|f| f.alias.as_str()).collect();
        assert_eq!(aliases, vec!["name", "age"]);
    }

    #[test]
    fn single_ref_hop_joins_once_with_path_aliases() {
        let catalog = people_catalog();
        let mut query = Query::new("Person");
        query.select("mother/name");

        let compiled = compile(&catalog, &query).unwrap();
        assert_eq!(
            compiled.sql,
            r#"SELECT "Person/mother"."name" AS "mother/name" FROM "People"."Person" AS "Person" LEFT JOIN "People"."Person" AS "Person/mother" ON "Person/mother"."ts_id" = "Person"."mother""#
        );
        assert_eq!(compiled.fields[0].alias, "mother/name");
        assert_eq!(compiled.fields[0].ctype, ColumnType::Text);
    }

    #[test]
    fn shared_prefix_reuses_one_join() {
        let catalog = people_catalog();
        let mut query = Query::new("Person");
        query
            .select("mother/name")
            .select("mother/age")
            .filter("mother/name", Operator::Eq, ["ann"]);

        let compiled = compile(&catalog, &query).unwrap();
        assert_eq!(join_count(&compiled.sql), 1);
    }

    #[test]
    fn deep_path_joins_every_hop() {
        let catalog = people_catalog();
        let mut query = Query::new("Person");
        query.select("mother/mother/name");

        let compiled = compile(&catalog, &query).unwrap();
        assert_eq!(join_count(&compiled.sql), 2);
        assert!(compiled.sql.contains(r#"AS "Person/mother""#));
        assert!(compiled.sql.contains(r#"AS "Person/mother/mother""#));
        assert!(compiled.sql.contains(
            r#"LEFT JOIN "People"."Person" AS "Person/mother/mother" ON "Person/mother/mother"."ts_id" = "Person/mother"."mother""#
        ));
    }

    #[test]
    fn ref_array_joins_with_overlap_condition() {
        let catalog = people_catalog();
        let mut query = Query::new("Person");
        query.select("pets/name");

        let compiled = compile(&catalog, &query).unwrap();
        assert_eq!(
            compiled.sql,
            r#"SELECT "Person/pets"."name" AS "pets/name" FROM "People"."Person" AS "Person" LEFT JOIN "People"."Pet" AS "Person/pets" ON "Person/pets"."ts_id" = ANY ("Person"."pets")"#
        );
    }

    #[test]
    fn mref_emits_link_and_target_joins_exactly_once() {
        let catalog = people_catalog();
        let mut query = Query::new("Person");
        query
            .select("groups/name")
            .filter("groups/name", Operator::Eq, ["admins"]);

        let compiled = compile(&catalog, &query).unwrap();
        // One join into the link table, one out to the target, regardless of
        // how many entries share the prefix.
        assert_eq!(join_count(&compiled.sql), 2);
        assert!(compiled.sql.contains(
            r#"LEFT JOIN "People"."Person_groups" AS "Person/groups~link" ON "Person/groups~link"."Person" = "Person"."ts_id""#
        ));
        assert!(compiled.sql.contains(
            r#"LEFT JOIN "People"."Group" AS "Person/groups" ON "Person/groups"."ts_id" = "Person/groups~link"."groups""#
        ));
    }

    #[test]
    fn filter_only_paths_still_join() {
        let catalog = people_catalog();
        let mut query = Query::new("Person");
        query
            .select("name")
            .filter("mother/name", Operator::Eq, ["ann"]);

        let compiled = compile(&catalog, &query).unwrap();
        assert_eq!(join_count(&compiled.sql), 1);
        assert!(compiled.sql.ends_with(r#"WHERE "Person/mother"."name" IN ($1)"#));
    }

    #[test]
    fn eq_with_empty_values_matches_nothing() {
        let catalog = people_catalog();
        let mut query = Query::new("Person");
        query.filter("age", Operator::Eq, Vec::<Value>::new());

        let compiled = compile(&catalog, &query).unwrap();
        assert!(compiled.sql.ends_with("WHERE FALSE"));
        assert!(compiled.params.is_empty());
    }

    #[test]
    fn eq_coerces_values_to_column_type() {
        let catalog = people_catalog();
        let mut query = Query::new("Person");
        query.filter("age", Operator::Eq, ["42"]);

        let compiled = compile(&catalog, &query).unwrap();
        assert_eq!(compiled.params, vec![Value::Int(42)]);
    }

    #[test]
    fn eq_rejects_uncoercible_value() {
        let catalog = people_catalog();
        let mut query = Query::new("Person");
        query.filter("age", Operator::Eq, [true]);

        match compile(&catalog, &query) {
            Err(QueryError::InvalidValue { column, .. }) => assert_eq!(column, "age"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn or_marker_scopes_exactly_one_condition() {
        let catalog = people_catalog();
        let mut query = Query::new("Person");
        query
            .select("name")
            .filter("age", Operator::Eq, [1])
            .or()
            .filter("name", Operator::Eq, ["b"])
            .filter("age", Operator::Eq, [3]);

        let compiled = compile(&catalog, &query).unwrap();
        assert!(compiled.sql.ends_with(
            r#"WHERE "Person"."age" IN ($1) OR "Person"."name" IN ($2) AND "Person"."age" IN ($3)"#
        ));
    }

    #[test]
    fn or_before_first_condition_does_not_leak() {
        let catalog = people_catalog();
        let mut query = Query::new("Person");
        query
            .select("name")
            .or()
            .filter("age", Operator::Eq, [1])
            .filter("age", Operator::Eq, [2]);

        let compiled = compile(&catalog, &query).unwrap();
        // The marker is consumed by the first combination, not chained.
        assert!(compiled.sql.ends_with(
            r#"WHERE "Person"."age" IN ($1) OR "Person"."age" IN ($2)"#
        ));
    }

    #[test]
    fn search_compiles_prefix_tsquery_on_root() {
        let catalog = people_catalog();
        let mut query = Query::new("Person");
        query.select("name").search("blue eyes");

        let compiled = compile(&catalog, &query).unwrap();
        assert!(compiled.sql.ends_with(
            r#"WHERE "Person"."ts_search_vector" @@ to_tsquery($1)"#
        ));
        assert_eq!(
            compiled.params,
            vec![Value::Text("blue:* & eyes:*".to_string())]
        );
    }

    #[test]
    fn any_builds_array_overlap() {
        let catalog = people_catalog();
        let id = uuid::Uuid::nil();
        let mut query = Query::new("Person");
        query.select("name").filter("pets", Operator::Any, [id]);

        let compiled = compile(&catalog, &query).unwrap();
        assert!(compiled.sql.ends_with(r#"WHERE $1 && "Person"."pets""#));
        assert_eq!(compiled.params, vec![Value::UuidArray(vec![id])]);
    }

    #[test]
    fn unresolved_segment_names_segment_and_table() {
        let catalog = people_catalog();
        let mut query = Query::new("Person");
        query.select("father/name");

        match compile(&catalog, &query) {
            Err(QueryError::UnresolvedPath { segment, table }) => {
                assert_eq!(segment, "father");
                assert_eq!(table, "Person");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn plain_column_mid_path_is_unresolved() {
        let catalog = people_catalog();
        let mut query = Query::new("Person");
        query.select("name/anything");

        match compile(&catalog, &query) {
            Err(QueryError::UnresolvedPath { segment, table }) => {
                assert_eq!(segment, "name");
                assert_eq!(table, "Person");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn search_with_path_is_unsupported_predicate() {
        let catalog = people_catalog();
        let mut query = Query::new("Person");
        query.filter("name", Operator::Search, ["x"]);

        match compile(&catalog, &query) {
            Err(QueryError::UnsupportedPredicate { operator, path }) => {
                assert_eq!(operator, "SEARCH");
                assert_eq!(path, "name");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn sort_emits_order_by_on_root() {
        let catalog = people_catalog();
        let mut query = Query::new("Person");
        query.select("name").asc("name").desc("age");

        let compiled = compile(&catalog, &query).unwrap();
        assert!(compiled.sql.ends_with(
            r#"ORDER BY "Person"."name" ASC, "Person"."age" DESC"#
        ));
    }

    #[test]
    fn sort_on_unknown_column_fails() {
        let catalog = people_catalog();
        let mut query = Query::new("Person");
        query.asc("shoe_size");
        assert!(matches!(
            compile(&catalog, &query),
            Err(QueryError::Catalog(_))
        ));
    }

    #[test]
    fn params_number_across_all_conditions() {
        let catalog = people_catalog();
        let mut query = Query::new("Person");
        query
            .select("name")
            .filter("age", Operator::Eq, [1, 2])
            .filter("name", Operator::Eq, ["x"]);

        let compiled = compile(&catalog, &query).unwrap();
        assert!(compiled.sql.contains("IN ($1, $2)"));
        assert!(compiled.sql.contains("IN ($3)"));
        assert_eq!(compiled.params.len(), 3);
    }

    #[test]
    fn identifiers_with_quotes_are_escaped() {
        assert_eq!(quote_ident(r#"od"d"#), r#""od""d""#);
    }

    #[test]
    fn unknown_root_table_fails_before_compile() {
        let catalog = people_catalog();
        let query = Query::new("Nobody");
        assert!(matches!(
            compile(&catalog, &query),
            Err(QueryError::Catalog(_))
        ));
    }
}
