use crate::types::{SchemaCatalog, Table};

/// Order tables so that directly referenced tables come before the tables
/// referencing them, suitable for materializing a schema definition table by
/// table.
///
/// This is a single pass over *direct* forward references: each table is
/// inserted in front of the first already-placed table that references it.
/// Indirect reference chains and cycles are not resolved; tables involved in
/// them keep their relative catalog order. Schemas with circular references
/// need deferred constraint creation, which this does not attempt.
pub fn merge_order(catalog: &SchemaCatalog) -> Vec<&Table> {
    let mut ordered: Vec<&Table> = Vec::new();
    for table in catalog.tables() {
        let pos = ordered
            .iter()
            .position(|placed| references(placed, table.name()))
            .unwrap_or(ordered.len());
        ordered.insert(pos, table);
    }
    ordered
}

/// Whether `table` has a reference column directly targeting `target`.
fn references(table: &Table, target: &str) -> bool {
    table
        .columns()
        .iter()
        .any(|c| c.kind.ref_table() == Some(target))
}
