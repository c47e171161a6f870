//! Response DTOs for the HTTP API.

use serde::Serialize;

use crate::auth::AccountPage;
use crate::auth::AccountView;
use crate::effects::Completion;

// ============================================================================
// Generic Response Wrappers
// ============================================================================

/// Generic API response wrapper.
///
/// `warnings` lists best-effort side effects that failed, such as an email
/// that could not be sent. It is omitted when empty.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self {
            data,
            warnings: Vec::new(),
        }
    }
}

impl<T: Serialize> From<Completion<T>> for ApiResponse<T> {
    fn from(completion: Completion<T>) -> Self {
        Self {
            warnings: completion.warnings.iter().map(|w| w.message()).collect(),
            data: completion.value,
        }
    }
}

/// Paginated response wrapper.
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T: Serialize> {
    pub data: Vec<T>,
    pub meta: PaginationMeta,
}

/// Pagination metadata.
#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub per_page: u32,
    /// Total number of items.
    pub total: i64,
}

impl From<AccountPage> for PaginatedResponse<AccountView> {
    fn from(page: AccountPage) -> Self {
        Self {
            data: page.accounts,
            meta: PaginationMeta {
                page: page.page,
                per_page: page.per_page,
                total: page.total,
            },
        }
    }
}

/// Plain acknowledgement.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
