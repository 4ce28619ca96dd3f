//! crates/study_portal_core/src/domain.rs
//!
//! Defines the pure, core data structures for the portal.
//! These structs are independent of any transport or serialization format.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

//=========================================================================================
// Session
//=========================================================================================

/// The role the backend granted to the logged-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Student,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authenticated user, passed explicitly to whatever needs the role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub role: Role,
    /// Email for students, username for admins.
    pub identity: String,
}

impl Session {
    pub fn new(role: Role, identity: impl Into<String>) -> Self {
        Self {
            role,
            identity: identity.into(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

//=========================================================================================
// Course Catalog
//=========================================================================================

/// The identifier + label pair picked at the top of the drill-down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseRef {
    pub code: String,
    pub title: String,
}

impl CourseRef {
    pub fn new(code: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            title: title.into(),
        }
    }
}

/// One row of the public course list.
pub type CourseSummary = CourseRef;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subject {
    pub name: String,
    pub description: String,
}

impl Subject {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseSemester {
    pub semester: u32,
    pub subjects: Vec<Subject>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseYear {
    pub year: u32,
    pub semesters: Vec<CourseSemester>,
}

/// A full catalog entry, as authored through the admin course form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Course {
    pub code: String,
    pub title: String,
    pub description: String,
    pub duration: String,
    pub years: Vec<CourseYear>,
}

impl Course {
    pub fn summary(&self) -> CourseSummary {
        CourseRef::new(self.code.clone(), self.title.clone())
    }
}

//=========================================================================================
// Navigation Results
//=========================================================================================

/// A single subject match returned by the free-text search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub subject_name: String,
    pub course_code: String,
    pub course_name: String,
    pub year: u32,
    pub semester: u32,
}

/// The fully resolved drill-down coordinates.
///
/// Two contexts are the same context when course code, year, semester and
/// subject match; the course title is carried along for display only.
#[derive(Debug, Clone)]
pub struct SelectedContext {
    pub course_code: String,
    pub course_name: String,
    pub year: u32,
    pub semester: u32,
    pub subject: String,
}

impl PartialEq for SelectedContext {
    fn eq(&self, other: &Self) -> bool {
        self.course_code == other.course_code
            && self.year == other.year
            && self.semester == other.semester
            && self.subject == other.subject
    }
}

impl Eq for SelectedContext {}

impl fmt::Display for SelectedContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, Year {}, Sem {})",
            self.subject, self.course_code, self.year, self.semester
        )
    }
}

//=========================================================================================
// Materials
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MaterialId(pub String);

impl fmt::Display for MaterialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialFormat {
    Pdf,
    Image,
    Document,
    Video,
    Link,
}

impl MaterialFormat {
    pub const ALL: [MaterialFormat; 5] = [
        MaterialFormat::Pdf,
        MaterialFormat::Image,
        MaterialFormat::Document,
        MaterialFormat::Video,
        MaterialFormat::Link,
    ];

    /// The label the backend stores and filters on.
    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialFormat::Pdf => "PDF",
            MaterialFormat::Image => "Image",
            MaterialFormat::Document => "Document",
            MaterialFormat::Video => "Video",
            MaterialFormat::Link => "Link",
        }
    }

    /// Formats whose content is a file sent through the upload endpoint.
    pub fn is_upload(&self) -> bool {
        matches!(
            self,
            MaterialFormat::Pdf | MaterialFormat::Image | MaterialFormat::Document
        )
    }
}

impl FromStr for MaterialFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        MaterialFormat::ALL
            .into_iter()
            .find(|format| format.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown material format '{}'", wanted))
    }
}

impl fmt::Display for MaterialFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialCategory {
    Syllabus,
    Notes,
    Paper,
}

impl MaterialCategory {
    pub const ALL: [MaterialCategory; 3] = [
        MaterialCategory::Syllabus,
        MaterialCategory::Notes,
        MaterialCategory::Paper,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialCategory::Syllabus => "syllabus",
            MaterialCategory::Notes => "notes",
            MaterialCategory::Paper => "paper",
        }
    }
}

impl FromStr for MaterialCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        // "papers" is what the category picker shows
        let wanted = if wanted.eq_ignore_ascii_case("papers") {
            "paper"
        } else {
            wanted
        };
        MaterialCategory::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown material category '{}'", wanted))
    }
}

impl fmt::Display for MaterialCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An uploaded or linked learning resource, as stored by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub id: MaterialId,
    pub title: String,
    pub course_code: String,
    pub year: u32,
    pub semester: u32,
    pub subject: String,
    pub format: MaterialFormat,
    pub category: MaterialCategory,
    pub content_url: Option<String>,
    pub uploaded_by: Option<String>,
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// A validated material ready to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMaterial {
    pub title: String,
    pub course_code: String,
    pub year: u32,
    pub semester: u32,
    pub subject: String,
    pub format: MaterialFormat,
    pub category: MaterialCategory,
    /// Present for URL based formats; uploads get theirs from the file store.
    pub content_url: Option<String>,
}

/// A validated metadata update for an existing material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialUpdate {
    pub title: String,
    pub format: MaterialFormat,
    pub category: MaterialCategory,
    pub content_url: String,
    pub course_code: String,
    pub year: u32,
    pub semester: u32,
    pub subject: String,
}

/// A file picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Narrows the displayed material list by category and format.
/// `None` on either axis means "All".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterialFilter {
    pub category: Option<MaterialCategory>,
    pub format: Option<MaterialFormat>,
}

impl MaterialFilter {
    pub fn matches(&self, material: &Material) -> bool {
        self.category.map_or(true, |c| c == material.category)
            && self.format.map_or(true, |f| f == material.format)
    }

    pub fn apply<'a>(&self, materials: &'a [Material]) -> Vec<&'a Material> {
        materials.iter().filter(|m| self.matches(m)).collect()
    }

    /// The message shown when nothing survives the filter.
    pub fn empty_message(&self) -> String {
        let category = self.category.map_or("All", |c| c.as_str());
        let format = self.format.map_or("All", |f| f.as_str());
        format!(
            "No {} materials of format {} found.",
            category, format
        )
    }
}
