//! services/portal/src/dashboard/fetch.rs
//!
//! The fetch coordinator. `sync` derives one key per list from the current
//! view and hands every changed key to its `Feed`; a feed that asks for a
//! fetch gets a spawned task, and the task's outcome is committed only if its
//! ticket is still current when it arrives.

use super::Dashboard;
use std::future::Future;
use study_portal_core::domain::{
    Course, CourseSummary, Material, SearchHit, SelectedContext, Subject,
};
use study_portal_core::feed::Ticket;
use study_portal_core::navigation::{BrowseLevel, ViewMode};
use study_portal_core::ports::PortResult;
use tracing::{debug, warn};

/// Material lists are keyed by the context and the refresh counter, so a
/// refresh alone is enough to re-issue the fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialKey {
    pub context: SelectedContext,
    pub refresh: u64,
}

/// What a spawned task reports back to the dashboard.
pub(crate) enum FetchOutcome {
    Courses(Ticket<u64>, Result<Vec<CourseSummary>, String>),
    Years(Ticket<String>, Result<Vec<u32>, String>),
    Semesters(Ticket<(String, u32)>, Result<Vec<u32>, String>),
    Subjects(Ticket<(String, u32, u32)>, Result<Vec<Subject>, String>),
    Materials(Ticket<MaterialKey>, Result<Vec<Material>, String>),
    AdminMaterials(Ticket<MaterialKey>, Result<Vec<Material>, String>),
    AdminCourses(Ticket<u64>, Result<Vec<Course>, String>),
    Search(Ticket<String>, Result<Vec<SearchHit>, String>),
    /// The debounce timer for search `generation` ran out or was cancelled.
    SearchDue { generation: u64 },
}

/// Logs a failed read and turns it into the inline panel message.
fn flatten<T>(what: &str, result: PortResult<T>) -> Result<T, String> {
    result.map_err(|e| {
        warn!("Failed to load {}: {}", what, e);
        e.user_message()
    })
}

impl Dashboard {
    /// Brings every list in line with the current view.
    pub(super) fn sync(&mut self) {
        let view = self.nav.view();
        let path = self.nav.path();
        let context = self.nav.context();

        let courses_key = (view == ViewMode::Browsing(BrowseLevel::Courses))
            .then_some(self.catalog_refresh);
        let years_key = match view {
            ViewMode::Browsing(BrowseLevel::Years) => path.course().map(|c| c.code.clone()),
            _ => None,
        };
        let semesters_key = match (view, path.course(), path.year()) {
            (ViewMode::Browsing(BrowseLevel::Semesters), Some(course), Some(year)) => {
                Some((course.code.clone(), year))
            }
            _ => None,
        };
        let subjects_key = match (view, path.course(), path.year(), path.semester()) {
            (ViewMode::Browsing(BrowseLevel::Subjects), Some(course), Some(year), Some(sem)) => {
                Some((course.code.clone(), year, sem))
            }
            _ => None,
        };
        // Any admin overlay hides (and clears) the student material list.
        let materials_key = match view {
            ViewMode::Browsing(BrowseLevel::Materials) => context.clone().map(|context| MaterialKey {
                context,
                refresh: self.material_refresh,
            }),
            _ => None,
        };
        let admin_materials_key = match view {
            ViewMode::ManageMaterialsPanel => context.map(|context| MaterialKey {
                context,
                refresh: self.material_refresh,
            }),
            _ => None,
        };
        let admin_courses_key =
            (view == ViewMode::ManageCoursesPanel).then_some(self.catalog_refresh);
        let search_key = match view {
            ViewMode::SearchResults => self.active_search.clone(),
            _ => None,
        };

        if let Some(ticket) = self.courses.request(courses_key) {
            let catalog = self.services.catalog.clone();
            self.spawn(async move {
                let result = catalog.list_courses().await;
                FetchOutcome::Courses(ticket, flatten("courses", result))
            });
        }
        if let Some(ticket) = self.years.request(years_key) {
            let catalog = self.services.catalog.clone();
            self.spawn(async move {
                let result = catalog.list_years(&ticket.key).await;
                FetchOutcome::Years(ticket, flatten("years", result))
            });
        }
        if let Some(ticket) = self.semesters.request(semesters_key) {
            let catalog = self.services.catalog.clone();
            self.spawn(async move {
                let (code, year) = &ticket.key;
                let result = catalog.list_semesters(code, *year).await;
                FetchOutcome::Semesters(ticket, flatten("semesters", result))
            });
        }
        if let Some(ticket) = self.subjects.request(subjects_key) {
            let catalog = self.services.catalog.clone();
            self.spawn(async move {
                let (code, year, semester) = &ticket.key;
                let result = catalog.list_subjects(code, *year, *semester).await;
                FetchOutcome::Subjects(ticket, flatten("subjects", result))
            });
        }
        if let Some(ticket) = self.materials.request(materials_key) {
            let materials = self.services.materials.clone();
            self.spawn(async move {
                let result = materials.list_materials(&ticket.key.context).await;
                FetchOutcome::Materials(ticket, flatten("materials", result))
            });
        }
        if let Some(ticket) = self.admin_materials.request(admin_materials_key) {
            let materials = self.services.materials.clone();
            self.spawn(async move {
                let result = materials.list_admin_materials(&ticket.key.context).await;
                FetchOutcome::AdminMaterials(ticket, flatten("admin materials", result))
            });
        }
        if let Some(ticket) = self.admin_courses.request(admin_courses_key) {
            let courses = self.services.courses.clone();
            self.spawn(async move {
                let result = courses.list_admin_courses().await;
                FetchOutcome::AdminCourses(ticket, flatten("admin courses", result))
            });
        }
        if let Some(ticket) = self.search.request(search_key) {
            let catalog = self.services.catalog.clone();
            self.spawn(async move {
                let result = catalog.search_subjects(&ticket.key).await;
                FetchOutcome::Search(ticket, flatten("search results", result))
            });
        }
    }

    /// Runs `task` in the background and routes its outcome to `process_next`.
    pub(super) fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = FetchOutcome> + Send + 'static,
    {
        self.in_flight += 1;
        let tx = self.tx.clone();
        tokio::spawn(async move {
            // The receiver lives as long as the dashboard; a send only fails
            // after it is gone, when nobody wants the outcome.
            let _ = tx.send(task.await);
        });
    }

    pub(super) fn apply(&mut self, outcome: FetchOutcome) {
        let (list, kept) = match outcome {
            FetchOutcome::Courses(ticket, result) => ("courses", self.courses.commit(&ticket, result)),
            FetchOutcome::Years(ticket, result) => ("years", self.years.commit(&ticket, result)),
            FetchOutcome::Semesters(ticket, result) => {
                ("semesters", self.semesters.commit(&ticket, result))
            }
            FetchOutcome::Subjects(ticket, result) => {
                ("subjects", self.subjects.commit(&ticket, result))
            }
            FetchOutcome::Materials(ticket, result) => {
                ("materials", self.materials.commit(&ticket, result))
            }
            FetchOutcome::AdminMaterials(ticket, result) => {
                ("admin materials", self.admin_materials.commit(&ticket, result))
            }
            FetchOutcome::AdminCourses(ticket, result) => {
                ("admin courses", self.admin_courses.commit(&ticket, result))
            }
            FetchOutcome::Search(ticket, result) => ("search", self.search.commit(&ticket, result)),
            FetchOutcome::SearchDue { generation } => {
                self.fire_search(generation);
                return;
            }
        };
        if !kept {
            debug!("Discarded a stale {} response", list);
        }
    }
}
