//! Active orderable category and the concept load issued on every switch.

use shared::{
    domain::{CategoryId, OrderableCategory},
    error::InitializationError,
    protocol::LoadConcepts,
};
use tracing::info;

#[derive(Debug, Clone)]
pub struct CategorySwitchController {
    active_id: CategoryId,
    active_name: String,
    representation: String,
}

impl CategorySwitchController {
    /// Activates the first orderable category and returns the load for it.
    pub fn initialise(
        orderables: &[OrderableCategory],
        locale: &str,
        representation: impl Into<String>,
    ) -> Result<(Self, LoadConcepts), InitializationError> {
        let first = orderables.first().ok_or(InitializationError::NoOrderables)?;
        let controller = Self {
            active_id: first.id.clone(),
            active_name: first.short_name(locale).to_string(),
            representation: representation.into(),
        };
        let load = controller.load_for_active();
        info!(category_id = %controller.active_id, "initial lab category selected");
        Ok((controller, load))
    }

    pub fn active_id(&self) -> &CategoryId {
        &self.active_id
    }

    pub fn active_name(&self) -> &str {
        &self.active_name
    }

    /// Switching to the already-active category issues no load.
    pub fn switch_to(
        &mut self,
        category_id: CategoryId,
        display_name: impl Into<String>,
    ) -> Option<LoadConcepts> {
        self.active_name = display_name.into();
        if category_id == self.active_id {
            return None;
        }
        info!(from = %self.active_id, to = %category_id, "lab category switched");
        self.active_id = category_id;
        Some(self.load_for_active())
    }

    fn load_for_active(&self) -> LoadConcepts {
        LoadConcepts {
            category_id: self.active_id.clone(),
            representation: self.representation.clone(),
        }
    }
}
