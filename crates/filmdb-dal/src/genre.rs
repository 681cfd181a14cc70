use filmdb_macros::ValueRepository;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, sqlx::FromRow, ValueRepository)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Genre {
    pub id: i64,
    #[garde(length(min = 1, max = 255))]
    pub name: String,
}
