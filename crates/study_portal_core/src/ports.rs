//! crates/study_portal_core/src/ports.rs
//!
//! Defines the service contracts (traits) the portal core depends on.
//! These traits form the boundary of the hexagonal architecture, keeping the
//! navigation and fetch logic independent of the concrete REST backend.

use async_trait::async_trait;

use crate::domain::{
    Course, CourseSummary, Material, MaterialId, MaterialUpdate, NewMaterial, SearchHit,
    SelectedContext, Session, Subject, UploadFile,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific transport errors (HTTP status, socket failures).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    /// The backend answered with a non-2xx status and a message body.
    #[error("{message} (status {status})")]
    Rejected { status: u16, message: String },
    /// The request never completed.
    #[error("Network error: {0}")]
    Network(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl PortError {
    /// The string shown inline in whichever panel issued the request.
    pub fn user_message(&self) -> String {
        match self {
            PortError::Network(_) => "Network error. Could not connect to server.".to_string(),
            PortError::Rejected { message, .. } => message.clone(),
            PortError::Forbidden(message) => message.clone(),
            PortError::Unauthorized => "You need to be logged in. Please log in.".to_string(),
            PortError::NotFound(what) => format!("Not found: {}", what),
            PortError::Unexpected(message) => message.clone(),
        }
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Read-only access to the course hierarchy and subject search.
#[async_trait]
pub trait CatalogService: Send + Sync {
    async fn list_courses(&self) -> PortResult<Vec<CourseSummary>>;

    async fn list_years(&self, course_code: &str) -> PortResult<Vec<u32>>;

    async fn list_semesters(&self, course_code: &str, year: u32) -> PortResult<Vec<u32>>;

    async fn list_subjects(
        &self,
        course_code: &str,
        year: u32,
        semester: u32,
    ) -> PortResult<Vec<Subject>>;

    /// Free-text subject search across every course.
    async fn search_subjects(&self, query: &str) -> PortResult<Vec<SearchHit>>;
}

/// Material reads and the admin material writes.
///
/// Every write returns the confirmation message the backend sent back.
#[async_trait]
pub trait MaterialService: Send + Sync {
    async fn list_materials(&self, context: &SelectedContext) -> PortResult<Vec<Material>>;

    async fn list_admin_materials(&self, context: &SelectedContext)
        -> PortResult<Vec<Material>>;

    async fn add_material(&self, material: &NewMaterial) -> PortResult<String>;

    async fn upload_material(
        &self,
        material: &NewMaterial,
        file: &UploadFile,
    ) -> PortResult<String>;

    async fn update_material(&self, id: &MaterialId, update: &MaterialUpdate)
        -> PortResult<String>;

    async fn delete_material(&self, id: &MaterialId) -> PortResult<String>;
}

/// Catalog authoring, admin only.
#[async_trait]
pub trait CourseAdminService: Send + Sync {
    async fn list_admin_courses(&self) -> PortResult<Vec<Course>>;

    async fn create_course(&self, course: &Course) -> PortResult<String>;

    async fn update_course(&self, course: &Course) -> PortResult<String>;

    async fn delete_course(&self, code: &str) -> PortResult<String>;
}

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn login_student(&self, email: &str, password: &str) -> PortResult<Session>;

    async fn login_admin(&self, username: &str, password: &str) -> PortResult<Session>;

    async fn signup_student(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> PortResult<String>;

    /// The session the backend still recognises, if any.
    async fn current_session(&self) -> PortResult<Option<Session>>;

    async fn logout(&self) -> PortResult<String>;
}

#[async_trait]
pub trait FavoritesService: Send + Sync {
    async fn list_favorites(&self) -> PortResult<Vec<Material>>;
}
