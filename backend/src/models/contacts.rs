use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::UserType;
use crate::services::distance::Distance;

/// A counterpart user the viewer has interacted with. Computed per request.
#[derive(Debug, Clone, Serialize)]
pub struct Contact {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub user_type: UserType,
    pub language: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub last_interaction: DateTime<Utc>,
    pub transaction_count: i64,
    pub distance: Distance,
}
