//! services/portal/src/dashboard/mod.rs
//!
//! The single owner of the portal's view state.
//!
//! A `Dashboard` holds the navigator, every fetched list and the banners. All
//! mutation happens through `&mut self`; network reads run as spawned tasks
//! that report back over a channel, and `process_next` folds each report into
//! the state. Nothing else writes to it.

mod debounce;
mod fetch;
mod mutations;
pub mod state;
pub mod status;
#[cfg(test)]
pub(crate) mod testing;

pub use fetch::MaterialKey;
pub use mutations::PendingDelete;
pub use state::{DashboardSettings, PortalServices};
pub use status::{Banner, StatusKind, StatusMessage};

use crate::error::ActionError;
use fetch::FetchOutcome;
use study_portal_core::catalog::CourseForm;
use study_portal_core::domain::{
    Course, CourseRef, CourseSummary, Material, MaterialFilter, MaterialId, SearchHit,
    SelectedContext, Session, Subject,
};
use study_portal_core::feed::{Feed, Loadable};
use study_portal_core::navigation::{NavigationError, Navigator, Overlay, SelectionPath, ViewMode};
use study_portal_core::ports::PortError;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub struct Dashboard {
    services: PortalServices,
    settings: DashboardSettings,
    session: Session,
    nav: Navigator,

    // --- Search ---
    search_query: String,
    /// The query whose results are (or will be) shown.
    active_search: Option<String>,
    search_generation: u64,
    pending_search: Option<CancellationToken>,
    search: Feed<String, Vec<SearchHit>>,

    // --- Lists ---
    courses: Feed<u64, Vec<CourseSummary>>,
    years: Feed<String, Vec<u32>>,
    semesters: Feed<(String, u32), Vec<u32>>,
    subjects: Feed<(String, u32, u32), Vec<Subject>>,
    materials: Feed<MaterialKey, Vec<Material>>,
    admin_materials: Feed<MaterialKey, Vec<Material>>,
    admin_courses: Feed<u64, Vec<Course>>,

    /// Bumped by material mutations and manual refreshes.
    material_refresh: u64,
    /// Bumped by course mutations and whenever the course panel opens.
    catalog_refresh: u64,
    material_filter: MaterialFilter,
    pending_delete: Option<PendingDelete>,

    status: Banner,
    form_error: Banner,

    tx: mpsc::UnboundedSender<FetchOutcome>,
    rx: mpsc::UnboundedReceiver<FetchOutcome>,
    in_flight: usize,
}

impl Dashboard {
    /// Creates the dashboard at the course list and starts loading it.
    /// Must be called from within a tokio runtime.
    pub fn new(services: PortalServices, settings: DashboardSettings, session: Session) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut dashboard = Self {
            services,
            settings,
            session,
            nav: Navigator::new(),
            search_query: String::new(),
            active_search: None,
            search_generation: 0,
            pending_search: None,
            search: Feed::new(),
            courses: Feed::new(),
            years: Feed::new(),
            semesters: Feed::new(),
            subjects: Feed::new(),
            materials: Feed::new(),
            admin_materials: Feed::new(),
            admin_courses: Feed::new(),
            material_refresh: 0,
            catalog_refresh: 0,
            material_filter: MaterialFilter::default(),
            pending_delete: None,
            status: Banner::new(settings.status_ttl),
            form_error: Banner::new(settings.status_ttl),
            tx,
            rx,
            in_flight: 0,
        };
        info!(
            "Dashboard opened for {} ({})",
            dashboard.session.identity, dashboard.session.role
        );
        dashboard.sync();
        dashboard
    }

    //=====================================================================================
    // Read Access
    //=====================================================================================

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn view(&self) -> ViewMode {
        self.nav.view()
    }

    pub fn path(&self) -> &SelectionPath {
        self.nav.path()
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.nav.overlay()
    }

    pub fn context(&self) -> Option<SelectedContext> {
        self.nav.context()
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn search_results(&self) -> &Loadable<Vec<SearchHit>> {
        self.search.state()
    }

    pub fn search_error(&self) -> Option<&str> {
        self.search.state().error()
    }

    pub fn courses(&self) -> &Loadable<Vec<CourseSummary>> {
        self.courses.state()
    }

    pub fn years(&self) -> &Loadable<Vec<u32>> {
        self.years.state()
    }

    pub fn semesters(&self) -> &Loadable<Vec<u32>> {
        self.semesters.state()
    }

    pub fn subjects(&self) -> &Loadable<Vec<Subject>> {
        self.subjects.state()
    }

    pub fn materials(&self) -> &Loadable<Vec<Material>> {
        self.materials.state()
    }

    /// The material list after the category/format filter.
    pub fn visible_materials(&self) -> Option<Vec<&Material>> {
        self.materials
            .state()
            .ready()
            .map(|materials| self.material_filter.apply(materials))
    }

    pub fn admin_materials(&self) -> &Loadable<Vec<Material>> {
        self.admin_materials.state()
    }

    pub fn admin_courses(&self) -> &Loadable<Vec<Course>> {
        self.admin_courses.state()
    }

    pub fn material_filter(&self) -> MaterialFilter {
        self.material_filter
    }

    pub fn material_refresh(&self) -> u64 {
        self.material_refresh
    }

    pub fn catalog_refresh(&self) -> u64 {
        self.catalog_refresh
    }

    pub fn pending_delete(&self) -> Option<&PendingDelete> {
        self.pending_delete.as_ref()
    }

    /// The material whose edit form is open in the manage-materials panel.
    pub fn editing_material(&self) -> Option<&Material> {
        match self.nav.overlay() {
            Some(Overlay::ManageMaterialsPanel { editing }) => editing.as_ref(),
            _ => None,
        }
    }

    pub fn course_form(&self) -> Option<&CourseForm> {
        match self.nav.overlay() {
            Some(Overlay::CourseEditForm(form)) => Some(form),
            _ => None,
        }
    }

    pub fn course_form_mut(&mut self) -> Option<&mut CourseForm> {
        match self.nav.overlay_mut() {
            Some(Overlay::CourseEditForm(form)) => Some(form),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.get()
    }

    /// The inline error of the open form or panel.
    pub fn form_error(&self) -> Option<&StatusMessage> {
        self.form_error.get()
    }

    /// Finds a course in the loaded course list.
    pub fn find_course(&self, code: &str) -> Option<CourseRef> {
        self.courses
            .state()
            .ready()?
            .iter()
            .find(|course| course.code.eq_ignore_ascii_case(code.trim()))
            .cloned()
    }

    //=====================================================================================
    // Drill-down Navigation
    //=====================================================================================

    pub fn select_course(&mut self, course: CourseRef) {
        self.leave_overlay_state();
        self.nav.select_course(course);
        self.sync();
    }

    /// Returns `false` when no course is selected yet.
    pub fn select_year(&mut self, year: u32) -> bool {
        self.select_with(|nav| nav.select_year(year))
    }

    pub fn select_semester(&mut self, semester: u32) -> bool {
        self.select_with(|nav| nav.select_semester(semester))
    }

    pub fn select_subject(&mut self, subject: &str) -> bool {
        self.select_with(|nav| nav.select_subject(subject))
    }

    fn select_with(&mut self, pick: impl FnOnce(&mut Navigator) -> bool) -> bool {
        let mut nav = self.nav.clone();
        if !pick(&mut nav) {
            return false;
        }
        self.leave_overlay_state();
        self.nav = nav;
        self.sync();
        true
    }

    /// Jumps to the subject of the `index`-th search hit (0-based).
    pub fn select_search_result(&mut self, index: usize) -> Result<(), ActionError> {
        let hit = self
            .search
            .state()
            .ready()
            .and_then(|hits| hits.get(index))
            .cloned()
            .ok_or_else(|| ActionError::NotAvailable("No such search result.".to_string()))?;
        self.leave_overlay_state();
        self.nav.select_search_hit(&hit);
        self.sync();
        Ok(())
    }

    /// Back to the course list, closing whatever was open.
    pub fn reset(&mut self) {
        self.leave_overlay_state();
        self.nav.reset();
        self.sync();
    }

    /// One step back: closes the open overlay, or else clears the deepest
    /// selected level. Returns `false` at the course list.
    pub fn back(&mut self) -> bool {
        if self.nav.overlay().is_some() {
            return self.cancel();
        }
        let moved = self.nav.back();
        if moved {
            self.sync();
        }
        moved
    }

    pub fn set_material_filter(&mut self, filter: MaterialFilter) {
        self.material_filter = filter;
    }

    /// Re-fetches the material lists for the unchanged context.
    pub fn refresh(&mut self) {
        self.material_refresh += 1;
        self.sync();
    }

    //=====================================================================================
    // Overlays
    //=====================================================================================

    pub fn open_add_material(&mut self) -> Result<(), ActionError> {
        self.require_admin()?;
        self.open_guarded(Overlay::AddMaterialForm)?;
        self.sync();
        Ok(())
    }

    /// Opens the admin material list; always loads a fresh copy.
    pub fn open_manage_materials(&mut self) -> Result<(), ActionError> {
        self.require_admin()?;
        self.open_guarded(Overlay::ManageMaterialsPanel { editing: None })?;
        self.material_refresh += 1;
        self.sync();
        Ok(())
    }

    pub fn open_manage_courses(&mut self) -> Result<(), ActionError> {
        self.require_admin()?;
        self.leave_overlay_state();
        self.nav.open(Overlay::ManageCoursesPanel)?;
        self.catalog_refresh += 1;
        self.sync();
        Ok(())
    }

    /// Opens the course form, empty or pre-filled with `course`.
    pub fn open_course_form(&mut self, course: Option<Course>) -> Result<(), ActionError> {
        self.require_admin()?;
        let form = match course {
            Some(course) => CourseForm::edit(course),
            None => CourseForm::new(),
        };
        self.leave_overlay_state();
        self.nav.open(Overlay::CourseEditForm(form))?;
        self.sync();
        Ok(())
    }

    /// Opens the edit form for a material listed in the manage panel.
    pub fn edit_material(&mut self, id: &MaterialId) -> Result<(), ActionError> {
        self.require_admin()?;
        let material = self
            .admin_materials
            .state()
            .ready()
            .and_then(|materials| materials.iter().find(|m| &m.id == id))
            .cloned()
            .ok_or_else(|| ActionError::NotAvailable(format!("No material with id {}.", id)))?;
        match self.nav.overlay_mut() {
            Some(Overlay::ManageMaterialsPanel { editing }) => {
                *editing = Some(material);
                self.form_error.clear();
                Ok(())
            }
            _ => Err(ActionError::NotAvailable(
                "Open the manage materials panel first.".to_string(),
            )),
        }
    }

    /// Closes the innermost open form or panel. Returns `false` when nothing
    /// was open.
    pub fn cancel(&mut self) -> bool {
        self.pending_delete = None;
        self.form_error.clear();
        let Some(overlay) = self.nav.overlay().cloned() else {
            return false;
        };
        match overlay {
            Overlay::ManageMaterialsPanel { editing: Some(_) } => {
                if let Some(Overlay::ManageMaterialsPanel { editing }) = self.nav.overlay_mut() {
                    *editing = None;
                }
            }
            Overlay::CourseEditForm(_) => {
                if let Err(e) = self.nav.open(Overlay::ManageCoursesPanel) {
                    warn!("Could not return to the course panel: {}", e);
                }
            }
            Overlay::SearchResults | Overlay::ManageCoursesPanel => {
                self.clear_search();
                self.nav.reset();
            }
            Overlay::AddMaterialForm | Overlay::ManageMaterialsPanel { editing: None } => {
                self.nav.close_overlay();
            }
        }
        self.sync();
        true
    }

    //=====================================================================================
    // Favorites
    //=====================================================================================

    pub async fn favorites(&self) -> Result<Vec<Material>, String> {
        match self.services.favorites.list_favorites().await {
            Ok(materials) => Ok(materials),
            Err(PortError::Unauthorized) => Err(
                "You need to be logged in to view your favorites. Please log in.".to_string(),
            ),
            Err(e) => {
                warn!("Failed to load favorites: {}", e);
                Err(e.user_message())
            }
        }
    }

    //=====================================================================================
    // Event Loop
    //=====================================================================================

    /// Waits for the next finished fetch (or due search) and applies it.
    ///
    /// Cancel safe: an outcome is applied in the same poll it is received.
    pub async fn process_next(&mut self) -> bool {
        match self.rx.recv().await {
            Some(outcome) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                self.apply(outcome);
                true
            }
            None => false,
        }
    }

    /// Whether any fetch or debounce timer is still outstanding.
    pub fn is_idle(&self) -> bool {
        self.in_flight == 0
    }

    /// Applies outcomes until nothing is outstanding.
    pub async fn settle(&mut self) {
        while !self.is_idle() {
            if !self.process_next().await {
                break;
            }
        }
    }

    //=====================================================================================
    // Helpers
    //=====================================================================================

    fn require_admin(&mut self) -> Result<(), ActionError> {
        if self.session.is_admin() {
            return Ok(());
        }
        let err = ActionError::Forbidden;
        self.status.show(StatusKind::Error, err.to_string());
        Err(err)
    }

    /// Opens a material overlay, reporting an incomplete context as a banner.
    fn open_guarded(&mut self, overlay: Overlay) -> Result<(), ActionError> {
        if self.nav.context().is_none() {
            let err = ActionError::from(NavigationError::IncompleteContext);
            self.status.show(StatusKind::Error, err.to_string());
            return Err(err);
        }
        self.leave_overlay_state();
        self.nav.open(overlay)?;
        Ok(())
    }

    /// Drops everything that belongs to the previous overlay: the search, a
    /// pending confirmation and the inline error.
    fn leave_overlay_state(&mut self) {
        self.clear_search();
        self.pending_delete = None;
        self.form_error.clear();
    }
}
