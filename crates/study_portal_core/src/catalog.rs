//! crates/study_portal_core/src/catalog.rs
//!
//! Structural editing of a course while the admin course form is open.
//! Years and semesters are always numbered 1..=n; removing one renumbers the rest.

use crate::domain::{Course, CourseSemester, CourseYear, Subject};

/// The state behind the add/edit course form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CourseForm {
    /// Code of the course being edited; `None` when adding a new course.
    editing: Option<String>,
    draft: Course,
}

impl CourseForm {
    /// An empty form for a new course.
    pub fn new() -> Self {
        Self::default()
    }

    /// A form pre-filled with an existing course. Its code is locked.
    pub fn edit(course: Course) -> Self {
        Self {
            editing: Some(course.code.clone()),
            draft: course,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn editing_code(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    pub fn draft(&self) -> &Course {
        &self.draft
    }

    /// Returns `false` when editing, the code of an existing course is fixed.
    pub fn set_code(&mut self, code: impl Into<String>) -> bool {
        if self.editing.is_some() {
            return false;
        }
        self.draft.code = code.into();
        true
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.draft.title = title.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.draft.description = description.into();
    }

    pub fn set_duration(&mut self, duration: impl Into<String>) {
        self.draft.duration = duration.into();
    }

    /// Appends a year and returns its number.
    pub fn add_year(&mut self) -> u32 {
        let number = self.draft.years.len() as u32 + 1;
        self.draft.years.push(CourseYear {
            year: number,
            semesters: Vec::new(),
        });
        number
    }

    pub fn remove_year(&mut self, year: u32) -> bool {
        let Some(index) = self.year_index(year) else {
            return false;
        };
        self.draft.years.remove(index);
        for (i, y) in self.draft.years.iter_mut().enumerate() {
            y.year = i as u32 + 1;
        }
        true
    }

    /// Appends a semester to `year` and returns its number.
    pub fn add_semester(&mut self, year: u32) -> Option<u32> {
        let y = self.year_mut(year)?;
        let number = y.semesters.len() as u32 + 1;
        y.semesters.push(CourseSemester {
            semester: number,
            subjects: Vec::new(),
        });
        Some(number)
    }

    pub fn remove_semester(&mut self, year: u32, semester: u32) -> bool {
        let Some(y) = self.year_mut(year) else {
            return false;
        };
        let Some(index) = y.semesters.iter().position(|s| s.semester == semester) else {
            return false;
        };
        y.semesters.remove(index);
        for (i, s) in y.semesters.iter_mut().enumerate() {
            s.semester = i as u32 + 1;
        }
        true
    }

    pub fn add_subject(&mut self, year: u32, semester: u32, subject: Subject) -> bool {
        match self.semester_mut(year, semester) {
            Some(s) => {
                s.subjects.push(subject);
                true
            }
            None => false,
        }
    }

    /// `index` is the subject's 1-based position within the semester.
    pub fn remove_subject(&mut self, year: u32, semester: u32, index: usize) -> bool {
        match self.semester_mut(year, semester) {
            Some(s) if (1..=s.subjects.len()).contains(&index) => {
                s.subjects.remove(index - 1);
                true
            }
            _ => false,
        }
    }

    pub fn rename_subject(
        &mut self,
        year: u32,
        semester: u32,
        index: usize,
        subject: Subject,
    ) -> bool {
        match self.semester_mut(year, semester) {
            Some(s) if (1..=s.subjects.len()).contains(&index) => {
                s.subjects[index - 1] = subject;
                true
            }
            _ => false,
        }
    }

    fn year_index(&self, year: u32) -> Option<usize> {
        self.draft.years.iter().position(|y| y.year == year)
    }

    fn year_mut(&mut self, year: u32) -> Option<&mut CourseYear> {
        self.draft.years.iter_mut().find(|y| y.year == year)
    }

    fn semester_mut(&mut self, year: u32, semester: u32) -> Option<&mut CourseSemester> {
        self.year_mut(year)?
            .semesters
            .iter_mut()
            .find(|s| s.semester == semester)
    }
}
