//! services/portal/src/adapters/wire.rs
//!
//! JSON shapes exchanged with the portal backend, and their conversion to and
//! from the core domain types. The core never sees these.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use study_portal_core::domain::{
    Course, CourseSemester, CourseSummary, CourseYear, Material, MaterialId, MaterialUpdate,
    NewMaterial, SearchHit, Subject,
};
use tracing::warn;

//=========================================================================================
// Envelopes
//=========================================================================================

/// Every error (and most write confirmations) carries a `message`.
#[derive(Deserialize, Default)]
pub struct MessageBody {
    #[serde(default)]
    pub message: String,
}

#[derive(Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub message: String,
    pub role: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatus {
    pub is_authenticated: bool,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Serialize)]
pub struct StudentLogin<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Serialize)]
pub struct AdminLogin<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSignup<'a> {
    pub full_name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

//=========================================================================================
// Catalog Records
//=========================================================================================

#[derive(Deserialize)]
pub struct CourseSummaryRecord {
    code: String,
    #[serde(default)]
    title: String,
}

impl CourseSummaryRecord {
    pub fn to_domain(self) -> CourseSummary {
        CourseSummary::new(self.code, self.title)
    }
}

/// Subjects are stored either as bare names or as `{name, description}`.
#[derive(Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub enum SubjectRecord {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        description: String,
    },
}

impl SubjectRecord {
    pub fn to_domain(self) -> Subject {
        match self {
            SubjectRecord::Name(name) => Subject::named(name),
            SubjectRecord::Detailed { name, description } => Subject { name, description },
        }
    }

    fn from_domain(subject: &Subject) -> Self {
        SubjectRecord::Detailed {
            name: subject.name.clone(),
            description: subject.description.clone(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHitRecord {
    subject_name: SubjectRecord,
    course_code: String,
    #[serde(default)]
    course_name: String,
    year: u32,
    semester: u32,
}

impl SearchHitRecord {
    pub fn to_domain(self) -> SearchHit {
        SearchHit {
            subject_name: self.subject_name.to_domain().name,
            course_code: self.course_code,
            course_name: self.course_name,
            year: self.year,
            semester: self.semester,
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct SemesterRecord {
    semester: u32,
    #[serde(default)]
    subjects: Vec<SubjectRecord>,
}

#[derive(Serialize, Deserialize)]
pub struct YearRecord {
    year: u32,
    #[serde(default)]
    semesters: Vec<SemesterRecord>,
}

/// A full catalog entry, used both for reading the admin list and for writes.
#[derive(Serialize, Deserialize)]
pub struct CourseRecord {
    code: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    duration: String,
    #[serde(default)]
    years: Vec<YearRecord>,
}

impl CourseRecord {
    pub fn to_domain(self) -> Course {
        Course {
            code: self.code,
            title: self.title,
            description: self.description,
            duration: self.duration,
            years: self
                .years
                .into_iter()
                .map(|y| CourseYear {
                    year: y.year,
                    semesters: y
                        .semesters
                        .into_iter()
                        .map(|s| CourseSemester {
                            semester: s.semester,
                            subjects: s.subjects.into_iter().map(SubjectRecord::to_domain).collect(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    pub fn from_domain(course: &Course) -> Self {
        Self {
            code: course.code.clone(),
            title: course.title.clone(),
            description: course.description.clone(),
            duration: course.duration.clone(),
            years: course
                .years
                .iter()
                .map(|y| YearRecord {
                    year: y.year,
                    semesters: y
                        .semesters
                        .iter()
                        .map(|s| SemesterRecord {
                            semester: s.semester,
                            subjects: s.subjects.iter().map(SubjectRecord::from_domain).collect(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

//=========================================================================================
// Material Records
//=========================================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialRecord {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    title: String,
    course_code: String,
    year: u32,
    semester: u32,
    subject: String,
    material_format: String,
    material_category: String,
    #[serde(default)]
    content_url: Option<String>,
    #[serde(default)]
    uploaded_by: Option<String>,
    #[serde(default)]
    uploaded_at: Option<String>,
}

impl MaterialRecord {
    /// Returns `None` for records whose format or category this client does
    /// not know, such as the retired `Text` format.
    pub fn to_domain(self) -> Option<Material> {
        let format = match self.material_format.parse() {
            Ok(format) => format,
            Err(e) => {
                warn!("Skipping material {}: {}", self.id, e);
                return None;
            }
        };
        let category = match self.material_category.parse() {
            Ok(category) => category,
            Err(e) => {
                warn!("Skipping material {}: {}", self.id, e);
                return None;
            }
        };
        Some(Material {
            id: MaterialId(self.id),
            title: self.title,
            course_code: self.course_code,
            year: self.year,
            semester: self.semester,
            subject: self.subject,
            format,
            category,
            content_url: self.content_url.filter(|url| !url.is_empty()),
            uploaded_by: self.uploaded_by,
            uploaded_at: self.uploaded_at.as_deref().and_then(parse_timestamp),
        })
    }
}

/// The backend writes naive UTC ISO timestamps; offsets are accepted too.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(stamped) = DateTime::parse_from_rfc3339(raw) {
        return Some(stamped.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

pub fn materials_to_domain(records: Vec<MaterialRecord>) -> Vec<Material> {
    records.into_iter().filter_map(MaterialRecord::to_domain).collect()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMaterialPayload<'a> {
    title: &'a str,
    course_code: &'a str,
    year: u32,
    semester: u32,
    subject: &'a str,
    material_format: &'static str,
    material_category: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_url: Option<&'a str>,
}

impl<'a> NewMaterialPayload<'a> {
    pub fn from_domain(material: &'a NewMaterial) -> Self {
        Self {
            title: &material.title,
            course_code: &material.course_code,
            year: material.year,
            semester: material.semester,
            subject: &material.subject,
            material_format: material.format.as_str(),
            material_category: material.category.as_str(),
            content_url: material.content_url.as_deref(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialUpdatePayload<'a> {
    title: &'a str,
    material_format: &'static str,
    material_category: &'static str,
    content_url: &'a str,
    course_code: &'a str,
    year: u32,
    semester: u32,
    subject: &'a str,
}

impl<'a> MaterialUpdatePayload<'a> {
    pub fn from_domain(update: &'a MaterialUpdate) -> Self {
        Self {
            title: &update.title,
            material_format: update.format.as_str(),
            material_category: update.category.as_str(),
            content_url: &update.content_url,
            course_code: &update.course_code,
            year: update.year,
            semester: update.semester,
            subject: &update.subject,
        }
    }
}
