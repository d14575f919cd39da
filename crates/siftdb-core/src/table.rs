use crate::{
    catalog::{Attribute, AttributeId, Catalog, Layout},
    store::{FieldReading, FieldTarget, ObjectStore, RecordKey, StoreRef},
    value::Value,
};
use serde::{Deserialize, Serialize};

///
/// Layout projection
///
/// Turns a result page into a header row and per-record cell rows.
/// Header-cell count and row-cell count stay in lock-step for every
/// record: both sides derive from the same resolved column shapes,
/// and expanded relationship columns enumerate the related
/// collection in the store's stable key order.
///

///
/// HeaderCell
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct HeaderCell {
    pub attribute: AttributeId,
    pub label: String,
    /// Composite key for building sort/label links; expanded columns
    /// carry `<field_name>:<related pk>`.
    pub key: String,
    pub sortable: bool,
}

///
/// TableRow
///

#[derive(Clone, Debug, PartialEq)]
pub struct TableRow {
    pub key: RecordKey,
    pub cells: Vec<Value>,
}

///
/// LayoutProjector
///

pub struct LayoutProjector<'a, S: ObjectStore + ?Sized> {
    catalog: &'a Catalog,
    store: &'a S,
}

/// One layout column, resolved against store metadata. A populated
/// `matrix` means one header/row cell per record of the related
/// collection.
struct ResolvedColumn<'a> {
    attribute: &'a Attribute,
    target: FieldTarget,
    expand: bool,
    matrix: Option<(StoreRef, Vec<RecordKey>)>,
}

impl<'a, S: ObjectStore + ?Sized> LayoutProjector<'a, S> {
    pub const fn new(catalog: &'a Catalog, store: &'a S) -> Self {
        Self { catalog, store }
    }

    /// Header row for a layout.
    #[must_use]
    pub fn header(&self, layout: &Layout) -> Vec<HeaderCell> {
        let mut header = Vec::new();

        for column in self.resolve_columns(layout) {
            match &column.matrix {
                Some((rel_store, keys)) => {
                    for key in keys {
                        header.push(HeaderCell {
                            attribute: column.attribute.id,
                            label: format!(
                                "{}: {}",
                                column.attribute.name,
                                self.display_or_key(rel_store, *key)
                            ),
                            key: format!("{}:{key}", column.attribute.field_name),
                            sortable: column.attribute.sortable(),
                        });
                    }
                }
                None => header.push(HeaderCell {
                    attribute: column.attribute.id,
                    label: column.attribute.name.clone(),
                    key: column.attribute.field_name.clone(),
                    sortable: column.attribute.sortable(),
                }),
            }
        }

        header
    }

    /// Project records into cell rows matching the header.
    #[must_use]
    pub fn rows(&self, layout: &Layout, keys: &[RecordKey]) -> Vec<TableRow> {
        let Some(collection) = self.catalog.collection(layout.collection) else {
            return Vec::new();
        };
        let columns = self.resolve_columns(layout);

        keys.iter()
            .map(|key| {
                let mut cells = Vec::new();
                for column in &columns {
                    self.push_cells(&collection.store_ref, *key, column, &mut cells);
                }

                TableRow { key: *key, cells }
            })
            .collect()
    }

    fn push_cells(
        &self,
        store_ref: &StoreRef,
        key: RecordKey,
        column: &ResolvedColumn<'_>,
        cells: &mut Vec<Value>,
    ) {
        let reading = self
            .store
            .read(store_ref, key, &column.target)
            .unwrap_or(FieldReading::Missing);

        if let Some((_, matrix)) = &column.matrix {
            let linked = match &reading {
                FieldReading::Related { keys, .. } => keys.as_slice(),
                _ => &[],
            };
            for related in matrix {
                let mark = if linked.contains(related) { "X" } else { "" };
                cells.push(Value::text(mark));
            }
            return;
        }

        cells.push(match reading {
            FieldReading::Value(value) => value,
            FieldReading::Missing => Value::Null,
            FieldReading::Related { store, keys } => {
                if column.target.is_many() {
                    self.joined_cell(&store, &keys)
                } else {
                    self.single_related_cell(store_ref, key, column, &store, &keys)
                }
            }
        });
    }

    /// Collapsed to-many cell: related display strings with `"`
    /// doubled, joined with `";"` and wrapped in double quotes;
    /// empty when nothing is linked.
    fn joined_cell(&self, rel_store: &StoreRef, keys: &[RecordKey]) -> Value {
        let parts: Vec<String> = keys
            .iter()
            .map(|k| self.display_or_key(rel_store, *k).replace('"', "\"\""))
            .collect();

        if parts.is_empty() {
            return Value::text("");
        }
        Value::text(format!("\"{}\"", parts.join("\";\"")))
    }

    /// To-one cell: the related record's display, or — for an
    /// expanded column with a selector — the sub-attribute reached
    /// one hop through the relation.
    fn single_related_cell(
        &self,
        store_ref: &StoreRef,
        key: RecordKey,
        column: &ResolvedColumn<'_>,
        rel_store: &StoreRef,
        keys: &[RecordKey],
    ) -> Value {
        if column.expand
            && let FieldTarget::Related { rest, .. } = &column.target
            && !rest.is_empty()
        {
            return self
                .store
                .read_values(store_ref, key, &column.target)
                .ok()
                .and_then(|values| values.into_iter().next())
                .unwrap_or(Value::Null);
        }

        keys.first()
            .map_or(Value::Null, |k| Value::Text(self.display_or_key(rel_store, *k)))
    }

    /// Resolve layout columns to targets and shapes. Columns whose
    /// attribute or collection has vanished are skipped consistently
    /// on both the header and row sides; a matrix whose related
    /// collection cannot be enumerated degrades to a collapsed cell.
    fn resolve_columns(&self, layout: &Layout) -> Vec<ResolvedColumn<'_>> {
        layout
            .columns()
            .iter()
            .filter_map(|column| {
                let attribute = self.catalog.attribute(column.attribute)?;
                let target = self.catalog.resolve(attribute, self.store)?;

                let matrix = if column.expand
                    && target.is_many()
                    && let FieldTarget::Related { store, .. } = &target
                {
                    self.store.keys(store).ok().map(|keys| (store.clone(), keys))
                } else {
                    None
                };

                Some(ResolvedColumn {
                    attribute,
                    target,
                    expand: column.expand,
                    matrix,
                })
            })
            .collect()
    }

    fn display_or_key(&self, store: &StoreRef, key: RecordKey) -> String {
        self.store
            .display(store, key)
            .unwrap_or_else(|_| key.to_string())
    }
}

///
/// TESTS
///
