use serde::Deserialize;

/// Request model for creating a new book.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookRequest {
    /// Title of the book
    pub title: String,
    /// Author of the book
    pub author: String,
    /// URL-friendly slug for the book
    pub slug: String,
    /// Optional cover image URL
    pub image_url: Option<String>,
    /// Number of physical copies the shop stocks
    pub total_copies: u32,
}

/// Request model for the admin availability toggle.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateAvailabilityRequest {
    pub is_available: bool,
}
