use std::sync::{Arc, RwLock};

use indexmap::IndexMap;

use super::controller::{FormController, FormId, FormOptions, read_lock, write_lock};

/// Map of live forms by identifier. Clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct FormRegistry {
    forms: Arc<RwLock<IndexMap<FormId, FormController>>>,
}

impl FormRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a form and registers it, replacing any form with the same id.
    pub fn create(&self, id: impl Into<FormId>, options: FormOptions) -> FormController {
        let controller = FormController::new(id, options);
        self.register(controller.clone());
        controller
    }

    /// Registers `controller` under its id and returns the form it replaced.
    pub fn register(&self, controller: FormController) -> Option<FormController> {
        let id = controller.id().clone();
        let previous = write_lock(&self.forms, "registering form").insert(id.clone(), controller);
        if previous.is_some() {
            tracing::debug!(form = %id, "replaced registered form");
        } else {
            tracing::debug!(form = %id, "registered form");
        }
        previous
    }

    pub fn get(&self, id: &FormId) -> Option<FormController> {
        read_lock(&self.forms, "looking up form").get(id).cloned()
    }

    /// Registered ids in registration order.
    pub fn keys(&self) -> Vec<FormId> {
        read_lock(&self.forms, "listing forms").keys().cloned().collect()
    }

    pub fn remove(&self, id: &FormId) -> bool {
        let removed = write_lock(&self.forms, "removing form")
            .shift_remove(id)
            .is_some();
        if removed {
            tracing::debug!(form = %id, "removed form");
        }
        removed
    }

    pub fn clear(&self) {
        write_lock(&self.forms, "clearing forms").clear();
    }

    pub fn len(&self) -> usize {
        read_lock(&self.forms, "counting forms").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
