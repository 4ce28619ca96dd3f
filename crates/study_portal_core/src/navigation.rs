//! crates/study_portal_core/src/navigation.rs
//!
//! The drill-down selection path, the overlay union and the view resolver.
//!
//! `Navigator` is the only writer of the path and the overlay. Every transition
//! keeps two invariants: path fields are only set in prefix order, and at most
//! one overlay is active (there is a single `Option<Overlay>` slot).

use crate::catalog::CourseForm;
use crate::domain::{CourseRef, Material, SearchHit, SelectedContext};

//=========================================================================================
// Selection Path
//=========================================================================================

/// The in-progress drill-down coordinates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionPath {
    course: Option<CourseRef>,
    year: Option<u32>,
    semester: Option<u32>,
    subject: Option<String>,
}

impl SelectionPath {
    pub fn course(&self) -> Option<&CourseRef> {
        self.course.as_ref()
    }

    pub fn year(&self) -> Option<u32> {
        self.year
    }

    pub fn semester(&self) -> Option<u32> {
        self.semester
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.course.is_none()
    }

    /// Sets the course and clears everything below it.
    pub fn set_course(&mut self, course: CourseRef) {
        self.course = Some(course);
        self.year = None;
        self.semester = None;
        self.subject = None;
    }

    /// Returns `false` (and changes nothing) when no course is selected.
    pub fn set_year(&mut self, year: u32) -> bool {
        if self.course.is_none() {
            return false;
        }
        self.year = Some(year);
        self.semester = None;
        self.subject = None;
        true
    }

    pub fn set_semester(&mut self, semester: u32) -> bool {
        if self.year.is_none() {
            return false;
        }
        self.semester = Some(semester);
        self.subject = None;
        true
    }

    pub fn set_subject(&mut self, subject: String) -> bool {
        if self.semester.is_none() {
            return false;
        }
        self.subject = Some(subject);
        true
    }

    /// Clears the deepest selected field. Returns `false` at the root.
    pub fn pop(&mut self) -> bool {
        if self.subject.take().is_some() {
            return true;
        }
        if self.semester.take().is_some() {
            return true;
        }
        if self.year.take().is_some() {
            return true;
        }
        self.course.take().is_some()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Which list the drill-down shows for this much of the path.
    pub fn level(&self) -> BrowseLevel {
        match (&self.course, self.year, self.semester, &self.subject) {
            (None, ..) => BrowseLevel::Courses,
            (Some(_), None, ..) => BrowseLevel::Years,
            (Some(_), Some(_), None, _) => BrowseLevel::Semesters,
            (Some(_), Some(_), Some(_), None) => BrowseLevel::Subjects,
            (Some(_), Some(_), Some(_), Some(_)) => BrowseLevel::Materials,
        }
    }

    /// Materialises only when all four fields are present.
    pub fn context(&self) -> Option<SelectedContext> {
        let course = self.course.as_ref()?;
        Some(SelectedContext {
            course_code: course.code.clone(),
            course_name: course.title.clone(),
            year: self.year?,
            semester: self.semester?,
            subject: self.subject.clone()?,
        })
    }
}

//=========================================================================================
// Overlays and View Mode
//=========================================================================================

/// A panel that temporarily replaces the drill-down view.
#[derive(Debug, Clone, PartialEq)]
pub enum Overlay {
    SearchResults,
    AddMaterialForm,
    /// `editing` holds the material whose edit form is open inside the panel.
    ManageMaterialsPanel { editing: Option<Material> },
    ManageCoursesPanel,
    CourseEditForm(CourseForm),
}

impl Overlay {
    /// Overlays that hide the material list of the selected subject.
    pub fn is_admin(&self) -> bool {
        !matches!(self, Overlay::SearchResults)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowseLevel {
    Courses,
    Years,
    Semesters,
    Subjects,
    Materials,
}

/// The single panel being rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Browsing(BrowseLevel),
    SearchResults,
    AddMaterialForm,
    ManageMaterialsPanel,
    ManageCoursesPanel,
    CourseEditForm,
}

impl ViewMode {
    /// Resolves the active view. An overlay always wins over browsing; the
    /// browsing sub-state follows the depth of the path.
    pub fn resolve(path: &SelectionPath, overlay: Option<&Overlay>) -> Self {
        match overlay {
            Some(Overlay::SearchResults) => ViewMode::SearchResults,
            Some(Overlay::CourseEditForm(_)) => ViewMode::CourseEditForm,
            Some(Overlay::ManageCoursesPanel) => ViewMode::ManageCoursesPanel,
            Some(Overlay::AddMaterialForm) => ViewMode::AddMaterialForm,
            Some(Overlay::ManageMaterialsPanel { .. }) => ViewMode::ManageMaterialsPanel,
            None => ViewMode::Browsing(path.level()),
        }
    }

    pub fn is_overlay(&self) -> bool {
        !matches!(self, ViewMode::Browsing(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    #[error("Please select a Course, Year, Semester, and Subject first.")]
    IncompleteContext,
}

//=========================================================================================
// Navigator
//=========================================================================================

#[derive(Debug, Clone, Default)]
pub struct Navigator {
    path: SelectionPath,
    overlay: Option<Overlay>,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(&self) -> &SelectionPath {
        &self.path
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    pub fn overlay_mut(&mut self) -> Option<&mut Overlay> {
        self.overlay.as_mut()
    }

    pub fn view(&self) -> ViewMode {
        ViewMode::resolve(&self.path, self.overlay.as_ref())
    }

    pub fn context(&self) -> Option<SelectedContext> {
        self.path.context()
    }

    // --- Drill-down selection: every pick returns focus to browsing ---

    pub fn select_course(&mut self, course: CourseRef) {
        self.path.set_course(course);
        self.overlay = None;
    }

    pub fn select_year(&mut self, year: u32) -> bool {
        let applied = self.path.set_year(year);
        if applied {
            self.overlay = None;
        }
        applied
    }

    pub fn select_semester(&mut self, semester: u32) -> bool {
        let applied = self.path.set_semester(semester);
        if applied {
            self.overlay = None;
        }
        applied
    }

    pub fn select_subject(&mut self, subject: impl Into<String>) -> bool {
        let applied = self.path.set_subject(subject.into());
        if applied {
            self.overlay = None;
        }
        applied
    }

    /// Jumps straight to a subject from a search hit.
    pub fn select_search_hit(&mut self, hit: &SearchHit) {
        let mut path = SelectionPath::default();
        path.set_course(CourseRef::new(hit.course_code.clone(), hit.course_name.clone()));
        path.set_year(hit.year);
        path.set_semester(hit.semester);
        path.set_subject(hit.subject_name.clone());
        self.path = path;
        self.overlay = None;
    }

    /// Back to the top-level course list.
    pub fn reset(&mut self) {
        self.path.clear();
        self.overlay = None;
    }

    /// One level up the drill-down. Only meaningful while browsing.
    pub fn back(&mut self) -> bool {
        if self.overlay.is_some() {
            return false;
        }
        self.path.pop()
    }

    // --- Overlays ---

    /// The single setter for overlays. Opening one replaces whatever was open.
    ///
    /// Search results and the catalog panels start from an empty path; the
    /// material panels need a complete context and keep it.
    pub fn open(&mut self, overlay: Overlay) -> Result<(), NavigationError> {
        match &overlay {
            Overlay::AddMaterialForm | Overlay::ManageMaterialsPanel { .. } => {
                if self.path.context().is_none() {
                    return Err(NavigationError::IncompleteContext);
                }
            }
            Overlay::SearchResults | Overlay::ManageCoursesPanel | Overlay::CourseEditForm(_) => {
                self.path.clear();
            }
        }
        self.overlay = Some(overlay);
        Ok(())
    }

    pub fn close_overlay(&mut self) -> Option<Overlay> {
        self.overlay.take()
    }
}
