use crate::{
    catalog::{Catalog, CatalogError, SearchId},
    error::EngineError,
    query::ordering::OrderDirection,
    results::{Retrieval, ResultsEngine, SearchParams},
    store::{ObjectStore, RecordKey, StoreRef},
    table::LayoutProjector,
    value::Value,
};
use thiserror::Error as ThisError;
use tracing::info;

///
/// Export and labels surfaces
///
/// Both are capability injections: the engine depends on the
/// `SpreadsheetSink` and `LabelRenderer` seams and degrades cleanly
/// when no implementation is wired. The export job itself is a pure
/// parameter bundle — a worker re-resolves and re-executes the
/// search independently, which is why compilation stays re-entrant
/// and side-effect free.
///

/// Fixed message when no label renderer is wired.
pub const LABELS_UNAVAILABLE: &str = "Labels generation support not available.";

///
/// ExportJob
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExportJob {
    pub search: SearchId,
    pub recipient: String,
    pub freetext: Option<String>,
    pub ordering: Option<usize>,
    pub direction: Option<OrderDirection>,
}

impl ExportJob {
    pub fn new(search: SearchId, recipient: impl Into<String>) -> Self {
        Self {
            search,
            recipient: recipient.into(),
            freetext: None,
            ordering: None,
            direction: None,
        }
    }

    /// Capture the resolved parameters of a previewed retrieval, so
    /// the worker re-runs exactly what the caller saw.
    #[must_use]
    pub fn from_retrieval(
        search: SearchId,
        recipient: impl Into<String>,
        retrieval: &Retrieval,
    ) -> Self {
        Self {
            search,
            recipient: recipient.into(),
            freetext: retrieval.freetext.clone(),
            ordering: retrieval.ordering,
            direction: retrieval.direction,
        }
    }

    /// Request parameters equivalent to this job.
    #[must_use]
    pub fn params(&self) -> SearchParams {
        SearchParams {
            freetext: self.freetext.clone(),
            ordering: self.ordering.map(|o| o.to_string()),
            direction: self.direction.map(|d| d.as_str().to_string()),
            page: None,
            label: None,
        }
    }
}

///
/// SpreadsheetSink
///
/// Consumes a header row plus cell rows; formatting belongs to the
/// implementation.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("spreadsheet sink error: {0}")]
pub struct SinkError(pub String);

pub trait SpreadsheetSink {
    fn write_header(&mut self, header: &[String]) -> Result<(), SinkError>;

    fn write_row(&mut self, cells: &[Value]) -> Result<(), SinkError>;

    fn finish(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

///
/// ExportSummary
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExportSummary {
    pub rows: usize,
    /// Execution error swallowed during retrieval, if any; the
    /// export still produces a well-formed (empty) sheet.
    pub error: Option<String>,
}

/// Run an export job against a sink: re-resolve the search, write
/// the header and every projected row.
pub fn run_export<S: ObjectStore + ?Sized>(
    catalog: &Catalog,
    store: &S,
    job: &ExportJob,
    sink: &mut dyn SpreadsheetSink,
) -> Result<ExportSummary, EngineError> {
    let engine = ResultsEngine::new(catalog, store);
    let retrieval = engine.get_results(job.search, &job.params(), true)?;

    let search = catalog
        .search(job.search)
        .ok_or(CatalogError::UnknownSearch(job.search))?;
    let layout = catalog
        .layout(search.layout)
        .ok_or(CatalogError::UnknownLayout(search.layout))?;

    let labels: Vec<String> = retrieval.header.iter().map(|h| h.label.clone()).collect();
    sink.write_header(&labels)?;

    let projector = LayoutProjector::new(catalog, store);
    let rows = projector.rows(layout, &retrieval.keys);
    for row in &rows {
        sink.write_row(&row.cells)?;
    }
    sink.finish()?;

    info!(
        search = %job.search,
        recipient = %job.recipient,
        rows = rows.len(),
        "export written"
    );

    Ok(ExportSummary {
        rows: rows.len(),
        error: retrieval.error,
    })
}

///
/// LabelRenderer
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("label rendering error: {0}")]
pub struct LabelError(pub String);

pub trait LabelRenderer {
    /// Render a label document for the given records.
    fn render(
        &self,
        store: &StoreRef,
        keys: &[RecordKey],
        template: &str,
    ) -> Result<Vec<u8>, LabelError>;
}

///
/// LabelOutcome
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LabelOutcome {
    /// A rendered document plus its download name.
    Document { name: String, bytes: Vec<u8> },
    /// No template selected; callers show the available templates
    /// alongside the result count.
    Listing { count: usize, error: Option<String> },
    /// No renderer wired; a fixed informational message, never an
    /// error.
    Unavailable(&'static str),
}

/// Resolve the labels surface for a search.
pub fn render_labels<S: ObjectStore + ?Sized>(
    catalog: &Catalog,
    store: &S,
    renderer: Option<&dyn LabelRenderer>,
    search_id: SearchId,
    params: &SearchParams,
) -> Result<LabelOutcome, EngineError> {
    let Some(renderer) = renderer else {
        return Ok(LabelOutcome::Unavailable(LABELS_UNAVAILABLE));
    };

    let engine = ResultsEngine::new(catalog, store);
    let retrieval = engine.get_results(search_id, params, true)?;

    let Some(template) = params.label.as_deref() else {
        return Ok(LabelOutcome::Listing {
            count: retrieval.count(),
            error: retrieval.error,
        });
    };

    let search = catalog
        .search(search_id)
        .ok_or(CatalogError::UnknownSearch(search_id))?;
    let bytes = renderer.render(&retrieval.plan.store, &retrieval.keys, template)?;

    Ok(LabelOutcome::Document {
        name: format!("labels_{}.pdf", slugify(&search.name)),
        bytes,
    })
}

/// Lowercase, alphanumerics kept, everything else collapsed to
/// single dashes.
fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut dash_pending = false;

    for c in name.chars() {
        if c.is_alphanumeric() {
            if dash_pending && !slug.is_empty() {
                slug.push('-');
            }
            dash_pending = false;
            slug.extend(c.to_lowercase());
        } else {
            dash_pending = true;
        }
    }

    slug
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::{MatchOp, SearchCondition},
        test_fixtures::entry_fixture,
    };

    #[derive(Default)]
    struct VecSink {
        header: Vec<String>,
        rows: Vec<Vec<Value>>,
        finished: bool,
    }

    impl SpreadsheetSink for VecSink {
        fn write_header(&mut self, header: &[String]) -> Result<(), SinkError> {
            self.header = header.to_vec();
            Ok(())
        }

        fn write_row(&mut self, cells: &[Value]) -> Result<(), SinkError> {
            self.rows.push(cells.to_vec());
            Ok(())
        }

        fn finish(&mut self) -> Result<(), SinkError> {
            self.finished = true;
            Ok(())
        }
    }

    #[test]
    fn export_writes_header_and_rows() {
        let fx = entry_fixture();
        let job = ExportJob::new(fx.search, "user@example.org");
        let mut sink = VecSink::default();

        let summary = run_export(&fx.catalog, &fx.store, &job, &mut sink).unwrap();

        assert_eq!(summary.rows, fx.all_keys().len());
        assert!(summary.error.is_none());
        assert!(sink.finished);
        assert!(!sink.header.is_empty());
        for row in &sink.rows {
            assert_eq!(row.len(), sink.header.len());
        }
    }

    #[test]
    fn export_survives_execution_failure_with_empty_sheet() {
        let mut fx = entry_fixture();
        fx.add_condition(SearchCondition::new(fx.title, MatchOp::Regex, "("));

        let job = ExportJob::new(fx.search, "user@example.org");
        let mut sink = VecSink::default();
        let summary = run_export(&fx.catalog, &fx.store, &job, &mut sink).unwrap();

        assert_eq!(summary.rows, 0);
        assert!(summary.error.is_some());
        assert!(!sink.header.is_empty());
    }

    #[test]
    fn job_params_round_trip_resolved_ordering() {
        let fx = entry_fixture();
        let engine = ResultsEngine::new(&fx.catalog, &fx.store);
        let params = SearchParams::from_pairs([("o", "1"), ("ot", "desc"), ("s", "lorem")]);
        let retrieval = engine.get_results(fx.search, &params, true).unwrap();

        let job = ExportJob::from_retrieval(fx.search, "user@example.org", &retrieval);
        let round = job.params();

        assert_eq!(round.freetext.as_deref(), Some("lorem"));
        assert_eq!(round.ordering.as_deref(), Some("1"));
        assert_eq!(round.direction.as_deref(), Some("desc"));
    }

    #[test]
    fn labels_degrade_when_no_renderer_is_wired() {
        let fx = entry_fixture();

        let outcome = render_labels(
            &fx.catalog,
            &fx.store,
            None,
            fx.search,
            &SearchParams::new(),
        )
        .unwrap();

        assert_eq!(outcome, LabelOutcome::Unavailable(LABELS_UNAVAILABLE));
    }

    #[test]
    fn labels_list_templates_without_a_selection() {
        struct Renderer;
        impl LabelRenderer for Renderer {
            fn render(
                &self,
                _store: &StoreRef,
                keys: &[RecordKey],
                _template: &str,
            ) -> Result<Vec<u8>, LabelError> {
                Ok(vec![keys.len() as u8])
            }
        }

        let fx = entry_fixture();
        let outcome = render_labels(
            &fx.catalog,
            &fx.store,
            Some(&Renderer),
            fx.search,
            &SearchParams::new(),
        )
        .unwrap();

        assert!(matches!(outcome, LabelOutcome::Listing { count: 3, .. }));

        let params = SearchParams::from_pairs([("label", "standard")]);
        let outcome =
            render_labels(&fx.catalog, &fx.store, Some(&Renderer), fx.search, &params).unwrap();

        let LabelOutcome::Document { name, bytes } = outcome else {
            panic!("expected a rendered document");
        };
        assert_eq!(name, "labels_entry-search.pdf");
        assert_eq!(bytes, vec![3]);
    }

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(slugify("Entry Search"), "entry-search");
        assert_eq!(slugify("A/B testing!"), "a-b-testing");
        assert_eq!(slugify("--x--"), "x");
    }
}
