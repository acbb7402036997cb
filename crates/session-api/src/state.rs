use std::sync::Arc;

use session_core::{Bindings, Datastore, DatastoreRegistry, SessionConfig};

/// State of the session middleware: configuration plus the datastore bindings
/// used to resolve a named datastore.
#[derive(Clone)]
pub struct SessionLayer {
    pub config: Arc<SessionConfig>,
    pub bindings: Arc<dyn Bindings>,
}

impl SessionLayer {
    pub fn new(config: SessionConfig, bindings: impl Bindings + 'static) -> Self {
        Self {
            config: Arc::new(config),
            bindings: Arc::new(bindings),
        }
    }

    /// Layer bound directly to one datastore.
    pub fn with_datastore(config: SessionConfig, store: Arc<dyn Datastore>) -> Self {
        Self::new(config.with_datastore(store), DatastoreRegistry::new())
    }
}
