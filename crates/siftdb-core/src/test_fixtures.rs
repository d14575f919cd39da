//! Shared fixture: an "Entry" collection with scalar, nullable, and
//! many-to-many attributes, mirroring the kind of catalog an
//! administrator would configure.

use crate::{
    catalog::{
        Attribute, AttributeId, Catalog, Collection, CollectionId, Layout, LayoutColumn, LayoutId,
        SavedSearch, SearchCondition, SearchId, SearchOrdering,
    },
    query::{QueryCompiler, QueryPlan},
    store::{MemoryStore, ObjectStore, RecordKey, StoredRecord},
    types::Timestamp,
    value::Value,
};

pub(crate) struct EntryFixture {
    pub catalog: Catalog,
    pub store: MemoryStore,
    pub collection: CollectionId,
    pub author_collection: CollectionId,
    pub title: AttributeId,
    pub body: AttributeId,
    pub pub_date: AttributeId,
    pub authors: AttributeId,
    pub author_name: AttributeId,
    pub layout: LayoutId,
    pub search: SearchId,
    next_attribute: u64,
}

impl EntryFixture {
    pub fn add_condition(&mut self, condition: SearchCondition) {
        self.catalog.add_condition(self.search, condition).unwrap();
    }

    pub fn add_condition_unchecked(&mut self, condition: SearchCondition) {
        self.catalog.add_condition_unchecked(self.search, condition);
    }

    pub fn add_ordering(&mut self, ordering: SearchOrdering) {
        self.catalog.add_ordering(self.search, ordering).unwrap();
    }

    pub fn compile(
        &self,
        freetext: Option<&str>,
        override_ordering: Option<&[SearchOrdering]>,
    ) -> QueryPlan {
        let search = self.catalog.search(self.search).unwrap();
        QueryCompiler::new(&self.catalog, &self.store).compile(search, freetext, override_ordering)
    }

    pub fn describe(&self) -> String {
        crate::describe::describe(&self.catalog, self.catalog.search(self.search).unwrap())
    }

    pub fn all_keys(&self) -> Vec<RecordKey> {
        self.store.keys(&"entry".into()).unwrap()
    }

    pub fn insert_layout(&mut self, id: LayoutId, columns: &[(AttributeId, bool)]) {
        self.catalog
            .insert_layout(Layout::new(id, self.collection, format!("layout {id}")))
            .unwrap();

        #[allow(clippy::cast_possible_truncation)]
        for (i, (attribute, expand)) in columns.iter().enumerate() {
            let mut column = LayoutColumn::new(*attribute).at_position(i as u32);
            if *expand {
                column = column.expanded();
            }
            self.catalog.add_layout_column(id, column).unwrap();
        }
    }

    pub fn push_raw_column(&mut self, layout: LayoutId, column: LayoutColumn) {
        self.catalog.push_raw_column(layout, column);
    }

    /// Register an attribute whose field the store has no metadata
    /// for; it resolves as computed.
    pub fn add_virtual_attribute(&mut self, field: &str) -> AttributeId {
        let id = AttributeId(self.next_attribute);
        self.next_attribute += 1;

        self.catalog
            .insert_attribute(Attribute::new(id, self.collection, field, field))
            .unwrap();
        id
    }
}

pub(crate) fn entry_fixture() -> EntryFixture {
    let mut store = MemoryStore::new();

    store.declare_scalar("author", "name");
    store.insert(
        "author",
        RecordKey(1),
        StoredRecord::new("Jane Doe").field("name", Value::text("Jane Doe")),
    );
    store.insert(
        "author",
        RecordKey(2),
        StoredRecord::new("John \"JJ\" Jones").field("name", Value::text("John \"JJ\" Jones")),
    );

    store.declare_scalar("entry", "title");
    store.declare_scalar("entry", "body");
    store.declare_scalar("entry", "pub_date");
    store.declare_relation("entry", "authors", "author", true);
    store.insert(
        "entry",
        RecordKey(1),
        StoredRecord::new("This is a test")
            .field("title", Value::text("This is a test"))
            .field("body", Value::text("Lorem ipsum dolor sit amet"))
            .field(
                "pub_date",
                Value::Timestamp(Timestamp::parse_rfc3339("2020-06-15T12:00:00Z").unwrap()),
            )
            // Undeclared field, readable as a computed attribute.
            .field("word_count", Value::Int(120))
            .relation("authors", [RecordKey(1), RecordKey(2)]),
    );
    store.insert(
        "entry",
        RecordKey(2),
        StoredRecord::new("Second post")
            .field("title", Value::text("Second post"))
            .field("body", Value::text("Sed do eiusmod tempor"))
            .field("pub_date", Value::Null)
            .relation("authors", [RecordKey(1)]),
    );
    store.insert(
        "entry",
        RecordKey(3),
        StoredRecord::new("Third thoughts")
            .field("title", Value::text("Third thoughts"))
            .field("body", Value::text("Lorem next"))
            .field(
                "pub_date",
                Value::Timestamp(Timestamp::parse_rfc3339("2021-01-01T00:00:00Z").unwrap()),
            ),
    );

    let mut catalog = Catalog::new();

    let collection = CollectionId(1);
    let author_collection = CollectionId(2);
    catalog.insert_collection(Collection::new(collection, "Entry", "entry"));
    catalog.insert_collection(Collection::new(author_collection, "Author", "author"));

    let title = AttributeId(1);
    let body = AttributeId(2);
    let pub_date = AttributeId(3);
    let authors = AttributeId(4);
    let author_name = AttributeId(10);
    catalog
        .insert_attribute(Attribute::new(title, collection, "title", "title"))
        .unwrap();
    catalog
        .insert_attribute(Attribute::new(body, collection, "body", "body"))
        .unwrap();
    catalog
        .insert_attribute(
            Attribute::new(pub_date, collection, "pub_date", "pub_date")
                .with_flags(true, true, false),
        )
        .unwrap();
    catalog
        .insert_attribute(
            Attribute::new(authors, collection, "authors", "authors")
                .with_selector("__name")
                .with_sort_selector("__name"),
        )
        .unwrap();
    catalog
        .insert_attribute(Attribute::new(
            author_name,
            author_collection,
            "name",
            "name",
        ))
        .unwrap();

    let layout = LayoutId(1);
    catalog
        .insert_layout(Layout::new(layout, collection, "Entry layout"))
        .unwrap();
    catalog
        .add_layout_column(layout, LayoutColumn::new(title).at_position(0))
        .unwrap();
    catalog
        .add_layout_column(layout, LayoutColumn::new(body).at_position(1))
        .unwrap();
    catalog
        .add_layout_column(layout, LayoutColumn::new(authors).at_position(2))
        .unwrap();

    let search = SearchId(1);
    catalog
        .insert_search(SavedSearch::new(search, "Entry Search", collection, layout))
        .unwrap();

    EntryFixture {
        catalog,
        store,
        collection,
        author_collection,
        title,
        body,
        pub_date,
        authors,
        author_name,
        layout,
        search,
        next_attribute: 900,
    }
}
