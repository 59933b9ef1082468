use serde::{Deserialize, Serialize};

use crate::model::TeamId;

/// A tracked team. Reference fields change only through an explicit upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub id: TeamId,
    pub name: String,
    pub short_name: Option<String>,
    pub tla: Option<String>,
    pub league: Option<String>,
    pub external_ref: Option<String>,
}
