//! UPC tagging application.
//!
//! [`TaggerApp`] owns the startup index, the caches and the tag assigner, and
//! dispatches host events to the functions in [`crate::handlers`]. It is
//! `Send + Sync`: the host may deliver events for different users on
//! different threads and share one app between them.

use std::sync::Arc;

use web_time::Instant;

use crate::cache::{AnnotationCache, MetaCache};
use crate::catalog::{self, CatalogIndex, HostData, HostState};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::events::{Event, EventContext, SessionState};
use crate::handlers;
use crate::navigation::LabelNavigator;
use crate::services::Api;
use crate::tagging::TagAssigner;

/// The tagging application.
pub struct TaggerApp {
    api: Api,
    config: AppConfig,
    index: CatalogIndex,
    metas: Arc<MetaCache>,
    annotations: Arc<AnnotationCache>,
    navigator: LabelNavigator,
    assigner: TagAssigner,
}

impl TaggerApp {
    /// Wire an app around an already built index.
    pub fn new(api: Api, config: AppConfig, index: CatalogIndex) -> Self {
        let metas = Arc::new(MetaCache::for_tags(
            Arc::clone(&api.projects),
            &config.tagging.upc_tag,
            &config.tagging.error_tag,
        ));
        let annotations = Arc::new(AnnotationCache::new(
            Arc::clone(&api.annotations),
            Arc::clone(&metas),
        ));
        let navigator = LabelNavigator::new(config.tagging.product_class.clone());
        let assigner = TagAssigner::new(
            Arc::clone(&metas),
            Arc::clone(&annotations),
            Arc::clone(&api.tagging),
        );

        Self {
            api,
            config,
            index,
            metas,
            annotations,
            navigator,
            assigner,
        }
    }

    /// Download the reference inputs, build the index and wire the app.
    ///
    /// Any input problem aborts startup.
    pub fn initialize(api: Api, config: AppConfig) -> Result<Self, AppError> {
        let start = Instant::now();
        let index = catalog::prepare(api.files.as_ref(), api.members.as_ref(), &config)?;
        log::info!(
            "Index for team {} ready in {:.1} ms",
            config.team_id,
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(Self::new(api, config, index))
    }

    /// Handle one event.
    pub fn handle(
        &self,
        event: Event,
        ctx: &EventContext,
        state: &SessionState,
    ) -> Result<(), AppError> {
        let start = Instant::now();
        let result = match event {
            Event::PrevObject => handlers::prev_object(self, ctx, state),
            Event::NextObject => handlers::next_object(self, ctx, state),
            Event::RefreshUpc => handlers::refresh_upc(self, ctx, state),
            Event::AssignTag => handlers::assign_tag(self, ctx, state),
            Event::AssignTagCatalog => handlers::assign_tag_catalog(self, ctx, state),
            Event::MultiAssignTag => handlers::multi_assign_tag(self, ctx, state),
            Event::MultiAssignTagCatalog => handlers::multi_assign_tag_catalog(self, ctx, state),
            Event::MarkAsError => handlers::mark_as_error(self, ctx, state),
            Event::ManualSelectedFigureChanged => {
                handlers::manual_selected_figure_changed(self, ctx, state)
            }
        };

        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        match &result {
            Ok(()) => log::debug!("{} finished in {:.1} ms", event, elapsed_ms),
            Err(e) => log::error!("{} failed after {:.1} ms: {}", event, elapsed_ms, e),
        }
        result
    }

    /// Handle an event by its host name.
    pub fn handle_named(
        &self,
        name: &str,
        ctx: &EventContext,
        state: &SessionState,
    ) -> Result<(), AppError> {
        self.handle(name.parse()?, ctx, state)
    }

    /// Initial host `data` tree.
    pub fn host_data(&self) -> HostData {
        HostData::from_index(&self.index)
    }

    /// Initial host `state` tree.
    pub fn host_state(&self) -> HostState {
        HostState::initial(&self.index)
    }

    /// Platform services.
    pub fn api(&self) -> &Api {
        &self.api
    }

    /// Configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Worklists, catalog and galleries.
    pub fn index(&self) -> &CatalogIndex {
        &self.index
    }

    /// Schema cache.
    pub fn metas(&self) -> &MetaCache {
        &self.metas
    }

    /// Annotation cache.
    pub fn annotations(&self) -> &AnnotationCache {
        &self.annotations
    }

    /// Product label navigator.
    pub fn navigator(&self) -> &LabelNavigator {
        &self.navigator
    }

    /// Tag writer.
    pub fn assigner(&self) -> &TagAssigner {
        &self.assigner
    }
}
