//! services/portal/src/dashboard/state.rs
//!
//! The shared service bundle and the timing knobs handed to a `Dashboard`.

use crate::config::Config;
use std::sync::Arc;
use std::time::Duration;
use study_portal_core::ports::{
    AuthService, CatalogService, CourseAdminService, FavoritesService, MaterialService,
};

//=========================================================================================
// PortalServices (Shared Across Dashboards)
//=========================================================================================

/// Every port the dashboard talks to, created once at startup.
#[derive(Clone)]
pub struct PortalServices {
    pub catalog: Arc<dyn CatalogService>,
    pub materials: Arc<dyn MaterialService>,
    pub courses: Arc<dyn CourseAdminService>,
    pub auth: Arc<dyn AuthService>,
    pub favorites: Arc<dyn FavoritesService>,
}

impl PortalServices {
    /// Uses one backend for every port.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: CatalogService
            + MaterialService
            + CourseAdminService
            + AuthService
            + FavoritesService
            + 'static,
    {
        Self {
            catalog: backend.clone(),
            materials: backend.clone(),
            courses: backend.clone(),
            auth: backend.clone(),
            favorites: backend,
        }
    }
}

//=========================================================================================
// DashboardSettings
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardSettings {
    /// Quiet period after the last keystroke before a search is sent.
    pub search_debounce: Duration,
    /// How long status and form banners stay visible.
    pub status_ttl: Duration,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            search_debounce: Duration::from_millis(500),
            status_ttl: Duration::from_secs(3),
        }
    }
}

impl DashboardSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            search_debounce: config.search_debounce,
            status_ttl: config.status_ttl,
        }
    }
}
