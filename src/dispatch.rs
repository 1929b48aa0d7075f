//! Query dispatch: intent name + entities to baseline evidence
//!
//! Lookup, bind, execute. Nothing here raises to the caller; every outcome
//! is an [`Evidence`] value.

use crate::evidence::{EmptyReason, Evidence, Row};
use crate::intent::{BindDefaults, Entities, Intent, Params};
use crate::store::{GraphAccessor, Statement, StoreError, StoreResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(10);

pub struct QueryDispatcher {
    accessor: Arc<dyn GraphAccessor>,
    defaults: BindDefaults,
    deadline: Duration,
}

impl QueryDispatcher {
    pub fn new(accessor: Arc<dyn GraphAccessor>) -> Self {
        Self {
            accessor,
            defaults: BindDefaults::default(),
            deadline: DEFAULT_DEADLINE,
        }
    }

    pub fn with_defaults(mut self, defaults: BindDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn accessor(&self) -> &Arc<dyn GraphAccessor> {
        &self.accessor
    }

    /// Dispatch by intent name. Unknown names yield a "no template" sentinel.
    pub async fn dispatch(&self, intent: &str, entities: &Entities) -> Evidence {
        match intent.parse::<Intent>() {
            Ok(intent) => self.dispatch_intent(intent, entities).await,
            Err(_) => {
                info!("No template for intent '{}'", intent);
                Evidence::Empty(EmptyReason::UnknownIntent(intent.to_string()))
            }
        }
    }

    pub async fn dispatch_intent(&self, intent: Intent, entities: &Entities) -> Evidence {
        let template = intent.template();
        let params = match template.bind(entities, &self.defaults) {
            Ok(params) => params,
            Err(e) => {
                warn!("Cannot bind {}: {}", intent, e);
                return Evidence::failed(format!("query failed: {}", StoreError::from(e)));
            }
        };

        let rows = match self.execute(&Statement::Intent(intent), &params).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!("{} failed on {}: {}", intent, self.accessor.name(), e);
                return Evidence::failed(format!("query failed: {}", e));
            }
        };

        if rows.is_empty() {
            debug!("{} matched no data", intent);
            return Evidence::Empty(EmptyReason::NoMatchingData);
        }
        if let Some(row) = rows.iter().find(|r| !template.matches_columns(r.keys())) {
            let got: Vec<&str> = row.keys().map(String::as_str).collect();
            warn!("{} returned unexpected columns {:?}", intent, got);
            return Evidence::Failed(format!(
                "query failed: {} returned columns [{}], expected [{}]",
                intent,
                got.join(", "),
                template.columns.join(", ")
            ));
        }

        debug!("{} returned {} rows", intent, rows.len());
        Evidence::Rows(rows)
    }

    /// Run one statement under the dispatch deadline
    pub async fn execute(&self, statement: &Statement, params: &Params) -> StoreResult<Vec<Row>> {
        tokio::time::timeout(self.deadline, self.accessor.run(statement, params))
            .await
            .unwrap_or(Err(StoreError::Timeout(self.deadline)))
    }
}
