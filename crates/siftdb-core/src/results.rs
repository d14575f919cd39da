use crate::{
    catalog::{Catalog, CatalogError, SearchId},
    query::{
        QueryCompiler, QueryPlan,
        ordering::{OrderDirection, resolve_adhoc},
    },
    store::{ObjectStore, RecordKey},
    table::{HeaderCell, LayoutProjector},
};
use tracing::warn;

/// Fixed page size for result browsing.
pub const PAGE_SIZE: usize = 100;

///
/// SearchParams
///
/// Origin-agnostic request parameters. Every field arrives as an
/// untrusted string; parsing is fail-soft throughout (bad page
/// numbers default, bad ordering resets, never an error).
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SearchParams {
    /// `s` — free-text term.
    pub freetext: Option<String>,
    /// `o` — 1-based ordering column index into the rendered header.
    pub ordering: Option<String>,
    /// `ot` — ordering direction, `asc`/`desc`.
    pub direction: Option<String>,
    /// `p` — 1-based page number.
    pub page: Option<String>,
    /// `label` — label template identifier.
    pub label: Option<String>,
}

impl SearchParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw key/value pairs (e.g. a query string).
    pub fn from_pairs<'p>(pairs: impl IntoIterator<Item = (&'p str, &'p str)>) -> Self {
        let mut params = Self::new();
        for (key, value) in pairs {
            let value = Some(value.to_string());
            match key {
                "s" => params.freetext = value,
                "o" => params.ordering = value,
                "ot" => params.direction = value,
                "p" => params.page = value,
                "label" => params.label = value,
                _ => {}
            }
        }
        params
    }
}

///
/// Retrieval
///
/// Outcome of the caller-facing results wrapper: the compiled plan,
/// the (possibly lazily empty) key set, the rendered header, the
/// resolved ordering request, and an error string in place of any
/// execution failure. Always renderable; never a fault.
///

#[derive(Clone, Debug)]
pub struct Retrieval {
    pub plan: QueryPlan,
    pub keys: Vec<RecordKey>,
    pub freetext: Option<String>,
    pub error: Option<String>,
    pub header: Vec<HeaderCell>,
    pub ordering: Option<usize>,
    pub direction: Option<OrderDirection>,
    evaluated: bool,
}

impl Retrieval {
    #[must_use]
    pub fn count(&self) -> usize {
        self.keys.len()
    }
}

///
/// Page
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Page {
    pub number: usize,
    pub num_pages: usize,
    pub total: usize,
    pub keys: Vec<RecordKey>,
    pub error: Option<String>,
}

///
/// ResultsEngine
///
/// Caller-facing retrieval surface. Execution failures are swallowed
/// into a display string plus a guaranteed-empty result set, so
/// pagination and rendering always succeed.
///

pub struct ResultsEngine<'a, S: ObjectStore + ?Sized> {
    catalog: &'a Catalog,
    store: &'a S,
}

impl<'a, S: ObjectStore + ?Sized> ResultsEngine<'a, S> {
    pub const fn new(catalog: &'a Catalog, store: &'a S) -> Self {
        Self { catalog, store }
    }

    /// Compile and (optionally) evaluate a saved search.
    ///
    /// With `evaluate`, the plan is executed inside a guarded block:
    /// any store failure becomes an error string and an empty key
    /// set. Without it, execution is deferred to `fetch_page`, which
    /// applies the same fallback.
    pub fn get_results(
        &self,
        search_id: SearchId,
        params: &SearchParams,
        evaluate: bool,
    ) -> Result<Retrieval, CatalogError> {
        let search = self
            .catalog
            .search(search_id)
            .ok_or(CatalogError::UnknownSearch(search_id))?;
        let layout = self
            .catalog
            .layout(search.layout)
            .ok_or(CatalogError::UnknownLayout(search.layout))?;

        let header = LayoutProjector::new(self.catalog, self.store).header(layout);
        let adhoc = resolve_adhoc(
            &header,
            params.ordering.as_deref(),
            params.direction.as_deref(),
        );
        let override_ordering = adhoc.ordering.map(|o| vec![o]);

        let plan = QueryCompiler::new(self.catalog, self.store).compile(
            search,
            params.freetext.as_deref(),
            override_ordering.as_deref(),
        );

        let (keys, error) = if evaluate {
            match self.store.execute(&plan) {
                Ok(keys) => (keys, None),
                Err(err) => {
                    warn!(search = %search_id, %err, "search execution failed");
                    (Vec::new(), Some(err.to_string()))
                }
            }
        } else {
            (Vec::new(), None)
        };

        Ok(Retrieval {
            plan,
            keys,
            freetext: params.freetext.clone(),
            error,
            header,
            ordering: adhoc.index,
            direction: adhoc.direction,
            evaluated: evaluate,
        })
    }

    /// Fetch one page of results, executing lazily when
    /// `get_results` was called without evaluation.
    #[must_use]
    pub fn fetch_page(&self, retrieval: &Retrieval, page_raw: Option<&str>) -> Page {
        if retrieval.evaluated || retrieval.error.is_some() {
            return paginate(&retrieval.keys, page_raw, retrieval.error.clone());
        }

        match self.store.execute(&retrieval.plan) {
            Ok(keys) => paginate(&keys, page_raw, None),
            Err(err) => {
                warn!(%err, "deferred search execution failed");
                paginate(&[], page_raw, Some(err.to_string()))
            }
        }
    }
}

/// Slice a key set into one page.
///
/// Non-numeric page input resolves to page 1; numeric but
/// out-of-range input (including zero and negatives) clamps to the
/// last page.
#[must_use]
pub fn paginate(keys: &[RecordKey], page_raw: Option<&str>, error: Option<String>) -> Page {
    let num_pages = keys.len().div_ceil(PAGE_SIZE).max(1);

    let number = match page_raw.unwrap_or("1").parse::<i64>() {
        Err(_) => 1,
        Ok(n) if n < 1 => num_pages,
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Ok(n) if n as usize > num_pages => num_pages,
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Ok(n) => n as usize,
    };

    let start = (number - 1) * PAGE_SIZE;
    let end = (start + PAGE_SIZE).min(keys.len());
    let page_keys = if start < keys.len() {
        keys[start..end].to_vec()
    } else {
        Vec::new()
    };

    Page {
        number,
        num_pages,
        total: keys.len(),
        keys: page_keys,
        error,
    }
}

///
/// TESTS
///
