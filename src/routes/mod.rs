pub mod delivery;
pub mod events;
pub mod health;
pub mod recipients;
pub mod report;

use axum::Json;
use serde::{Deserialize, Serialize};

/// `{success, data}` wrapper shared by every dashboard endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
}

pub fn success<T: Serialize>(data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        success: true,
        data,
    })
}
