pub mod docqa;

use anyhow::Result;

use crate::domain::models::BackendBox;

pub struct BackendManager {}

impl BackendManager {
    pub fn get() -> Result<BackendBox> {
        return Ok(Box::new(docqa::DocQA::from_config()?));
    }
}
