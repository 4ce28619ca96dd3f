//! crates/study_portal_core/src/validation.rs
//!
//! Advisory checks run before any write is sent. The backend stays authoritative;
//! these only stop obviously incomplete forms from costing a round trip.

use url::Url;

use crate::domain::{
    Course, Material, MaterialCategory, MaterialFormat, MaterialUpdate, NewMaterial,
    SelectedContext, UploadFile,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter a title for the material.")]
    MissingTitle,
    #[error("Please select a material type.")]
    MissingFormat,
    #[error("Please select a material category.")]
    MissingCategory,
    #[error("Content URL cannot be empty for {0} material.")]
    MissingContentUrl(MaterialFormat),
    #[error("Please enter a valid URL.")]
    InvalidUrl,
    #[error("Please choose a file to upload for {0} material.")]
    MissingFile(MaterialFormat),
    #[error("Title, Material Format, and Category are required.")]
    IncompleteEdit,
    #[error("Content URL is required for the selected format.")]
    MissingEditContentUrl,
    #[error("Course code is required.")]
    MissingCourseCode,
    #[error("Course title is required.")]
    MissingCourseTitle,
    #[error("Subject names cannot be empty (Year {year}, Semester {semester}).")]
    EmptySubjectName { year: u32, semester: u32 },
}

//=========================================================================================
// Add Material
//=========================================================================================

/// The raw add-material form.
#[derive(Debug, Clone, Default)]
pub struct MaterialDraft {
    pub title: String,
    pub format: Option<MaterialFormat>,
    pub category: Option<MaterialCategory>,
    pub content_url: String,
    pub file: Option<UploadFile>,
}

/// Which endpoint a validated draft goes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaterialSubmission {
    Linked(NewMaterial),
    Upload(NewMaterial, UploadFile),
}

impl MaterialSubmission {
    pub fn material(&self) -> &NewMaterial {
        match self {
            MaterialSubmission::Linked(material) => material,
            MaterialSubmission::Upload(material, _) => material,
        }
    }
}

impl MaterialDraft {
    /// Checks the draft in form order and binds it to the selected subject.
    pub fn validate(self, context: &SelectedContext) -> Result<MaterialSubmission, ValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        let format = self.format.ok_or(ValidationError::MissingFormat)?;
        let category = self.category.ok_or(ValidationError::MissingCategory)?;

        let mut material = NewMaterial {
            title: title.to_string(),
            course_code: context.course_code.clone(),
            year: context.year,
            semester: context.semester,
            subject: context.subject.clone(),
            format,
            category,
            content_url: None,
        };

        if format.is_upload() {
            let file = self.file.ok_or(ValidationError::MissingFile(format))?;
            return Ok(MaterialSubmission::Upload(material, file));
        }

        let url = self.content_url.trim();
        if url.is_empty() {
            return Err(ValidationError::MissingContentUrl(format));
        }
        check_url(url)?;
        material.content_url = Some(url.to_string());
        Ok(MaterialSubmission::Linked(material))
    }
}

//=========================================================================================
// Edit Material
//=========================================================================================

/// The raw edit-material form. Location fields come from the material itself.
#[derive(Debug, Clone, Default)]
pub struct MaterialEdit {
    pub title: String,
    pub format: Option<MaterialFormat>,
    pub category: Option<MaterialCategory>,
    pub content_url: String,
}

impl MaterialEdit {
    /// Pre-fills the form from the stored material.
    pub fn from_material(material: &Material) -> Self {
        Self {
            title: material.title.clone(),
            format: Some(material.format),
            category: Some(material.category),
            content_url: material.content_url.clone().unwrap_or_default(),
        }
    }

    pub fn validate(self, original: &Material) -> Result<MaterialUpdate, ValidationError> {
        let title = self.title.trim();
        let (Some(format), Some(category)) = (self.format, self.category) else {
            return Err(ValidationError::IncompleteEdit);
        };
        if title.is_empty() {
            return Err(ValidationError::IncompleteEdit);
        }

        // Uploaded files keep a server-relative path, only typed URLs are parsed.
        let url = self.content_url.trim();
        if url.is_empty() {
            return Err(ValidationError::MissingEditContentUrl);
        }
        if !format.is_upload() {
            check_url(url)?;
        }

        Ok(MaterialUpdate {
            title: title.to_string(),
            format,
            category,
            content_url: url.to_string(),
            course_code: original.course_code.clone(),
            year: original.year,
            semester: original.semester,
            subject: original.subject.clone(),
        })
    }
}

//=========================================================================================
// Course
//=========================================================================================

/// Trims the course and checks the fields the backend keys on.
pub fn validate_course(course: &Course) -> Result<Course, ValidationError> {
    let mut course = course.clone();
    course.code = course.code.trim().to_string();
    course.title = course.title.trim().to_string();
    if course.code.is_empty() {
        return Err(ValidationError::MissingCourseCode);
    }
    if course.title.is_empty() {
        return Err(ValidationError::MissingCourseTitle);
    }
    for year in &mut course.years {
        for semester in &mut year.semesters {
            for subject in &mut semester.subjects {
                subject.name = subject.name.trim().to_string();
                if subject.name.is_empty() {
                    return Err(ValidationError::EmptySubjectName {
                        year: year.year,
                        semester: semester.semester,
                    });
                }
            }
        }
    }
    Ok(course)
}

fn check_url(raw: &str) -> Result<(), ValidationError> {
    Url::parse(raw)
        .map(|_| ())
        .map_err(|_| ValidationError::InvalidUrl)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CourseSemester, CourseYear, MaterialId, Subject};
    use bytes::Bytes;

    fn context() -> SelectedContext {
        SelectedContext {
            course_code: "CS101".into(),
            course_name: "Computer Science".into(),
            year: 2,
            semester: 1,
            subject: "Operating Systems".into(),
        }
    }

    fn link_draft(url: &str) -> MaterialDraft {
        MaterialDraft {
            title: "Scheduling lecture".into(),
            format: Some(MaterialFormat::Link),
            category: Some(MaterialCategory::Notes),
            content_url: url.into(),
            file: None,
        }
    }

    #[test]
    fn required_fields_are_checked_in_form_order() {
        let draft = MaterialDraft::default();
        assert_eq!(draft.validate(&context()), Err(ValidationError::MissingTitle));

        let draft = MaterialDraft {
            title: "  Notes  ".into(),
            ..MaterialDraft::default()
        };
        assert_eq!(draft.validate(&context()), Err(ValidationError::MissingFormat));

        let draft = MaterialDraft {
            title: "Notes".into(),
            format: Some(MaterialFormat::Video),
            ..MaterialDraft::default()
        };
        assert_eq!(draft.validate(&context()), Err(ValidationError::MissingCategory));
    }

    #[test]
    fn link_needs_a_parseable_url() {
        assert_eq!(
            link_draft("").validate(&context()),
            Err(ValidationError::MissingContentUrl(MaterialFormat::Link))
        );
        assert_eq!(
            link_draft("not a url").validate(&context()),
            Err(ValidationError::InvalidUrl)
        );

        let submission = link_draft(" https://example.com/os.html ")
            .validate(&context())
            .unwrap();
        let MaterialSubmission::Linked(material) = submission else {
            panic!("expected a linked submission");
        };
        assert_eq!(material.content_url.as_deref(), Some("https://example.com/os.html"));
        assert_eq!(material.subject, "Operating Systems");
        assert_eq!(material.title, "Scheduling lecture");
    }

    #[test]
    fn upload_formats_need_a_file() {
        let mut draft = link_draft("");
        draft.format = Some(MaterialFormat::Pdf);
        assert_eq!(
            draft.clone().validate(&context()),
            Err(ValidationError::MissingFile(MaterialFormat::Pdf))
        );

        draft.file = Some(UploadFile {
            file_name: "os.pdf".into(),
            content_type: Some("application/pdf".into()),
            bytes: Bytes::from_static(b"%PDF-1.4"),
        });
        let submission = draft.validate(&context()).unwrap();
        assert!(matches!(submission, MaterialSubmission::Upload(_, _)));
        assert_eq!(submission.material().format, MaterialFormat::Pdf);
    }

    #[test]
    fn edit_requires_core_fields_and_a_url() {
        let stored = Material {
            id: MaterialId("m1".into()),
            title: "Old".into(),
            course_code: "CS101".into(),
            year: 2,
            semester: 1,
            subject: "Operating Systems".into(),
            format: MaterialFormat::Pdf,
            category: MaterialCategory::Notes,
            content_url: Some("/uploads/os.pdf".into()),
            uploaded_by: Some("superadmin".into()),
            uploaded_at: None,
        };

        let mut edit = MaterialEdit::from_material(&stored);
        edit.title = " ".into();
        assert_eq!(edit.validate(&stored), Err(ValidationError::IncompleteEdit));

        let mut edit = MaterialEdit::from_material(&stored);
        edit.content_url.clear();
        assert_eq!(edit.validate(&stored), Err(ValidationError::MissingEditContentUrl));

        // server-relative upload paths are fine for file formats
        let update = MaterialEdit::from_material(&stored).validate(&stored).unwrap();
        assert_eq!(update.content_url, "/uploads/os.pdf");
        assert_eq!(update.year, 2);

        let mut edit = MaterialEdit::from_material(&stored);
        edit.format = Some(MaterialFormat::Link);
        assert_eq!(edit.validate(&stored), Err(ValidationError::InvalidUrl));
    }

    #[test]
    fn course_needs_code_title_and_named_subjects() {
        let mut course = Course {
            code: " ".into(),
            title: "Computer Science".into(),
            ..Course::default()
        };
        assert_eq!(validate_course(&course), Err(ValidationError::MissingCourseCode));

        course.code = " CS101 ".into();
        course.title = String::new();
        assert_eq!(validate_course(&course), Err(ValidationError::MissingCourseTitle));

        course.title = "Computer Science".into();
        course.years = vec![CourseYear {
            year: 1,
            semesters: vec![CourseSemester {
                semester: 2,
                subjects: vec![Subject::named("Maths"), Subject::named("  ")],
            }],
        }];
        assert_eq!(
            validate_course(&course),
            Err(ValidationError::EmptySubjectName { year: 1, semester: 2 })
        );

        course.years[0].semesters[0].subjects.pop();
        let cleaned = validate_course(&course).unwrap();
        assert_eq!(cleaned.code, "CS101");
    }
}
