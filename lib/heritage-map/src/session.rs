//! Loading a heritage map: running the query plan against an endpoint and keeping the record store
//! and its index current.

use crate::{DesignationIndex, RecordStore, ReconcileError, SessionError};
use futures::stream::{FuturesUnordered, StreamExt};
use heritage_map_model::{DesignationCatalog, LanguageTag, SiteRecord};
use heritage_map_sparql::{
    CoordinatesRow, DesignationDetailsRow, DiscoveryRow, EndpointError, MediaRow, PlannedQuery,
    QueryPlan, QuerySolution, QueryStage, RowError, SparqlEndpoint, ValuesClause,
};
use thiserror::Error;
use tracing::{info, warn};

/// The state handed to a [`PresentationAdapter`] on every notification.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub catalog: &'a DesignationCatalog,
    pub store: &'a RecordStore,
    pub index: &'a DesignationIndex,
}

/// Receives the data model as it fills in.
pub trait PresentationAdapter {
    /// Called once sites and their positions are known, or once the positions failed to load.
    fn data_loaded(&mut self, snapshot: Snapshot<'_>);

    /// Called after the results of an enrichment stage have been merged.
    fn enriched(&mut self, stage: QueryStage, snapshot: Snapshot<'_>);
}

/// An adapter that ignores every notification.
impl PresentationAdapter for () {
    fn data_loaded(&mut self, _snapshot: Snapshot<'_>) {}

    fn enriched(&mut self, _stage: QueryStage, _snapshot: Snapshot<'_>) {}
}

/// How a stage of a load went.
#[derive(Debug)]
pub enum StageOutcome {
    Applied {
        /// Rows that were merged into the store.
        rows: usize,
        /// Rows that were skipped because they could not be read or merged.
        skipped: usize,
    },
    Failed(EndpointError),
}

/// The outcome of every stage of a load, in completion order.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub stages: Vec<(QueryStage, StageOutcome)>,
}

impl LoadReport {
    pub fn outcome(&self, stage: QueryStage) -> Option<&StageOutcome> {
        self.stages
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, outcome)| outcome)
    }

    /// Whether every stage was answered by the endpoint.
    pub fn is_complete(&self) -> bool {
        self.stages
            .iter()
            .all(|(_, outcome)| matches!(outcome, StageOutcome::Applied { .. }))
    }
}

/// A heritage map session: the catalog, the record store and its index, loaded from an endpoint.
#[derive(Debug)]
pub struct Session<E> {
    endpoint: E,
    catalog: DesignationCatalog,
    language: LanguageTag,
    store: RecordStore,
    index: DesignationIndex,
}

impl<E: SparqlEndpoint> Session<E> {
    pub fn new(endpoint: E, catalog: DesignationCatalog, language: LanguageTag) -> Self {
        let store = RecordStore::new();
        let index = DesignationIndex::build(&store, &catalog);
        Self {
            endpoint,
            catalog,
            language,
            store,
            index,
        }
    }

    pub fn endpoint(&self) -> &E {
        &self.endpoint
    }

    pub fn catalog(&self) -> &DesignationCatalog {
        &self.catalog
    }

    pub fn language(&self) -> &LanguageTag {
        &self.language
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn index(&self) -> &DesignationIndex {
        &self.index
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            catalog: &self.catalog,
            store: &self.store,
            index: &self.index,
        }
    }

    pub fn plan(&self) -> QueryPlan<'_> {
        QueryPlan::new(&self.catalog, self.language.clone())
    }

    /// Looks up the record named by a permalink fragment such as `#Q1153`.
    pub fn record_for_fragment(&self, fragment: &str) -> Option<&SiteRecord> {
        self.store.record_for_fragment(fragment)
    }

    /// Runs every stage of the plan and merges the results into the store.
    ///
    /// The discovery stage runs first and its failure aborts the load. The remaining stages are
    /// scoped to the discovered sites and run concurrently. Their responses are merged one at a
    /// time in completion order. `adapter` is notified with
    /// [`data_loaded`](PresentationAdapter::data_loaded) once the coordinates stage is over and
    /// with [`enriched`](PresentationAdapter::enriched) for each other stage, never before
    /// `data_loaded`.
    pub async fn load(
        &mut self,
        adapter: &mut dyn PresentationAdapter,
    ) -> Result<LoadReport, SessionError> {
        let mut report = LoadReport::default();
        let discovery = self.plan().discovery();
        let solutions = self
            .endpoint
            .select(&discovery)
            .await
            .map_err(SessionError::Discovery)?;
        let outcome = self.apply(QueryStage::Discovery, &solutions);
        report.stages.push((QueryStage::Discovery, outcome));
        info!(sites = self.store.len(), "discovered sites");

        let queries = self.scoped_queries();
        let Self {
            endpoint,
            catalog,
            language,
            store,
            index,
        } = self;
        let (endpoint, catalog, language) = (&*endpoint, &*catalog, &*language);
        let mut pending = queries
            .into_iter()
            .map(|query| async move {
                let result = endpoint.select(&query).await;
                (query.stage, result)
            })
            .collect::<FuturesUnordered<_>>();

        let mut data_loaded = false;
        let mut applied_early = Vec::new();
        while let Some((stage, result)) = pending.next().await {
            let outcome = match result {
                Ok(solutions) => apply(store, catalog, language, stage, &solutions),
                Err(error) => {
                    warn!(%stage, "query failed: {error}");
                    StageOutcome::Failed(error)
                }
            };
            if let StageOutcome::Applied { rows, skipped } = &outcome {
                info!(%stage, rows, skipped, "merged query results");
            }
            report.stages.push((stage, outcome));

            *index = DesignationIndex::build(store, catalog);
            let snapshot = Snapshot {
                catalog,
                store: &*store,
                index: &*index,
            };
            if stage == QueryStage::Coordinates {
                adapter.data_loaded(snapshot);
                data_loaded = true;
                for stage in applied_early.drain(..) {
                    adapter.enriched(stage, snapshot);
                }
            } else if data_loaded {
                adapter.enriched(stage, snapshot);
            } else {
                applied_early.push(stage);
            }
        }

        if !data_loaded {
            // Nothing was discovered, so no coordinates were requested.
            *index = DesignationIndex::build(store, catalog);
            let snapshot = Snapshot {
                catalog,
                store: &*store,
                index: &*index,
            };
            adapter.data_loaded(snapshot);
        }
        Ok(report)
    }

    /// The queries of the stages that follow discovery, or none if nothing was discovered.
    fn scoped_queries(&self) -> Vec<PlannedQuery> {
        if self.store.is_empty() {
            return Vec::new();
        }
        let plan = self.plan();
        let all_sites = ValuesClause::sites(self.store.ids());
        let non_members = ValuesClause::sites(self.store.non_member_ids());
        vec![
            plan.coordinates(&non_members),
            plan.designation_details(&all_sites),
            plan.media(&all_sites),
        ]
    }

    fn apply(&mut self, stage: QueryStage, solutions: &[QuerySolution]) -> StageOutcome {
        apply(
            &mut self.store,
            &self.catalog,
            &self.language,
            stage,
            solutions,
        )
    }
}

/// An error that causes a single row to be skipped.
#[derive(Debug, Error)]
enum SkippedRow {
    #[error(transparent)]
    Row(#[from] RowError),
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

fn apply_solution(
    store: &mut RecordStore,
    catalog: &DesignationCatalog,
    language: &LanguageTag,
    stage: QueryStage,
    solution: &QuerySolution,
) -> Result<bool, SkippedRow> {
    Ok(match stage {
        QueryStage::Discovery => {
            store.apply_discovery(DiscoveryRow::from_solution(solution)?, catalog)?
        }
        QueryStage::Coordinates => {
            store.apply_coordinates(CoordinatesRow::from_solution(solution)?)?
        }
        QueryStage::DesignationDetails => store.apply_designation_details(
            DesignationDetailsRow::from_solution(solution)?,
            catalog,
        )?,
        QueryStage::Media => store.apply_media(MediaRow::from_solution(solution, language)?)?,
    })
}

fn apply(
    store: &mut RecordStore,
    catalog: &DesignationCatalog,
    language: &LanguageTag,
    stage: QueryStage,
    solutions: &[QuerySolution],
) -> StageOutcome {
    let mut skipped = 0;
    for solution in solutions {
        if let Err(error) = apply_solution(store, catalog, language, stage, solution) {
            warn!(%stage, "skipping row: {error}");
            skipped += 1;
        }
    }
    StageOutcome::Applied {
        rows: solutions.len() - skipped,
        skipped,
    }
}
