//! Category selection for a new post

use crate::error::{Result, StudioError};
use earshot_core::{Category, CategoryId, CategoryStore};
use std::sync::Arc;
use tracing::{debug, warn};

/// Effect of a toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionChange {
    Selected,
    Unselected,
    /// General is the only selection and stays selected
    KeptGeneral,
    /// Not a loaded category
    Unknown,
}

/// Selected categories for the post being composed.
///
/// Selection order is kept so the procedure receives ids in the order the
/// user picked them.
pub struct CategorySelector {
    store: Arc<dyn CategoryStore>,
    categories: Vec<Category>,
    selected: Vec<CategoryId>,
    general: Option<CategoryId>,
}

impl CategorySelector {
    pub fn new(store: Arc<dyn CategoryStore>) -> Self {
        Self {
            store,
            categories: Vec::new(),
            selected: Vec::new(),
            general: None,
        }
    }

    /// Fetch the catalogue and select the general category if it exists.
    pub async fn load(&mut self) -> Result<usize> {
        let categories = self.store.list_categories().await.map_err(|e| {
            warn!(error = %e, "Could not load categories");
            StudioError::Backend(e)
        })?;

        self.general = categories
            .iter()
            .find(|c| c.is_general())
            .map(|c| c.id.clone());
        self.categories = categories;
        self.reset_to_default();

        debug!(count = self.categories.len(), general = ?self.general, "Categories loaded");
        Ok(self.categories.len())
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn selected_ids(&self) -> &[CategoryId] {
        &self.selected
    }

    pub fn general_id(&self) -> Option<&CategoryId> {
        self.general.as_ref()
    }

    pub fn is_selected(&self, id: &CategoryId) -> bool {
        self.selected.contains(id)
    }

    pub fn toggle(&mut self, id: &CategoryId) -> SelectionChange {
        if !self.categories.iter().any(|c| &c.id == id) {
            return SelectionChange::Unknown;
        }

        if let Some(pos) = self.selected.iter().position(|s| s == id) {
            if self.general.as_ref() == Some(id) && self.selected.len() == 1 {
                return SelectionChange::KeptGeneral;
            }
            self.selected.remove(pos);
            SelectionChange::Unselected
        } else {
            self.selected.push(id.clone());
            SelectionChange::Selected
        }
    }

    /// Back to `{general}`, or nothing when there is no general category
    pub fn reset_to_default(&mut self) {
        self.selected = self.general.iter().cloned().collect();
    }

    /// Make sure at least one category is selected, falling back to general.
    pub fn ensure_selection(&mut self) -> Result<()> {
        if !self.selected.is_empty() {
            return Ok(());
        }
        match &self.general {
            Some(general) => {
                self.selected.push(general.clone());
                Ok(())
            }
            None => Err(StudioError::CategoryRequired),
        }
    }
}
