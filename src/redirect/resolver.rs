//! Keyword resolution for the redirect path.
//!
//! Resolution either ends in a redirect target or `NotFound`. The click for a
//! successful resolution is queued on the recorder before the target is
//! returned, and its outcome never reaches the caller.

use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

use crate::analytics::ClickRecorder;
use crate::models::ClickMetadata;
use crate::storage::Storage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Redirect { link_id: i64, url: String },
    NotFound,
}

#[derive(Clone)]
pub struct Resolver {
    storage: Arc<dyn Storage>,
    recorder: Arc<ClickRecorder>,
}

impl Resolver {
    pub fn new(storage: Arc<dyn Storage>, recorder: Arc<ClickRecorder>) -> Self {
        Self { storage, recorder }
    }

    pub fn recorder(&self) -> &Arc<ClickRecorder> {
        &self.recorder
    }

    /// Only lookup failures are errors; recording problems are absorbed
    pub async fn resolve(&self, keyword: &str, metadata: ClickMetadata) -> Result<Resolution> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Ok(Resolution::NotFound);
        }

        let link = match self.storage.get_link_by_keyword(keyword).await? {
            Some(link) if link.is_active => link,
            Some(_) => {
                debug!(keyword, "Keyword is inactive");
                return Ok(Resolution::NotFound);
            }
            None => return Ok(Resolution::NotFound),
        };

        self.recorder.record(link.id, metadata);

        Ok(Resolution::Redirect {
            link_id: link.id,
            url: link.url,
        })
    }
}
