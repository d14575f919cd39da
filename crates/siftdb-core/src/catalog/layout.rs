use crate::catalog::{AttributeId, CollectionId, LayoutId};
use serde::{Deserialize, Serialize};

///
/// Layout
///
/// An ordered selection of attributes describing how results are
/// rendered into a table. Columns are kept sorted by
/// (position, insertion order); columns without a position sort
/// last.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Layout {
    pub id: LayoutId,
    pub collection: CollectionId,
    pub name: String,
    columns: Vec<LayoutColumn>,
}

///
/// LayoutColumn
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct LayoutColumn {
    pub attribute: AttributeId,
    pub position: Option<u32>,
    pub expand: bool,
}

impl Layout {
    pub fn new(id: LayoutId, collection: CollectionId, name: impl Into<String>) -> Self {
        Self {
            id,
            collection,
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Columns in render order.
    #[must_use]
    pub fn columns(&self) -> &[LayoutColumn] {
        &self.columns
    }

    pub(crate) fn push_column(&mut self, column: LayoutColumn) {
        self.columns.push(column);
        self.columns
            .sort_by_key(|c| c.position.unwrap_or(u32::MAX));
    }
}

impl LayoutColumn {
    #[must_use]
    pub const fn new(attribute: AttributeId) -> Self {
        Self {
            attribute,
            position: None,
            expand: false,
        }
    }

    #[must_use]
    pub const fn at_position(mut self, position: u32) -> Self {
        self.position = Some(position);
        self
    }

    /// Render this column as a presence matrix, one cell per record
    /// of the related collection.
    #[must_use]
    pub const fn expanded(mut self) -> Self {
        self.expand = true;
        self
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_sort_by_position_with_unpositioned_last() {
        let mut layout = Layout::new(LayoutId(1), CollectionId(1), "layout");
        layout.push_column(LayoutColumn::new(AttributeId(1)));
        layout.push_column(LayoutColumn::new(AttributeId(2)).at_position(1));
        layout.push_column(LayoutColumn::new(AttributeId(3)).at_position(0));

        let order: Vec<AttributeId> = layout.columns().iter().map(|c| c.attribute).collect();
        assert_eq!(order, vec![AttributeId(3), AttributeId(2), AttributeId(1)]);
    }

    #[test]
    fn equal_positions_keep_insertion_order() {
        let mut layout = Layout::new(LayoutId(1), CollectionId(1), "layout");
        layout.push_column(LayoutColumn::new(AttributeId(1)).at_position(2));
        layout.push_column(LayoutColumn::new(AttributeId(2)).at_position(2));

        let order: Vec<AttributeId> = layout.columns().iter().map(|c| c.attribute).collect();
        assert_eq!(order, vec![AttributeId(1), AttributeId(2)]);
    }
}
