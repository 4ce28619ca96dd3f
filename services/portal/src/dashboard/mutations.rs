//! services/portal/src/dashboard/mutations.rs
//!
//! Admin writes. Each one validates locally, performs a single backend call
//! and then either closes its form and bumps a refresh counter, or leaves the
//! form open with the failure shown inline. Lists are never patched locally.

use super::{Dashboard, StatusKind};
use crate::error::ActionError;
use study_portal_core::domain::MaterialId;
use study_portal_core::navigation::{NavigationError, Overlay};
use study_portal_core::ports::PortError;
use study_portal_core::validation::{
    validate_course, MaterialDraft, MaterialEdit, MaterialSubmission,
};
use tracing::{error, info};

/// A delete that is waiting for the user to confirm it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingDelete {
    Material(MaterialId),
    Course(String),
}

impl PendingDelete {
    pub fn prompt(&self) -> String {
        match self {
            PendingDelete::Material(_) => {
                "Are you sure you want to delete this material?".to_string()
            }
            PendingDelete::Course(code) => format!(
                "Are you sure you want to delete course {}? This action is irreversible.",
                code
            ),
        }
    }
}

/// The inline text for a failed write.
fn failure_text(action: &str, err: &PortError) -> String {
    match err {
        PortError::Network(_) => err.user_message(),
        _ => format!("{}: {}", action, err.user_message()),
    }
}

impl Dashboard {
    //=====================================================================================
    // Materials
    //=====================================================================================

    /// Submits the add-material form for the selected subject.
    pub async fn submit_material(&mut self, draft: MaterialDraft) -> Result<(), ActionError> {
        self.require_admin()?;
        if !matches!(self.nav.overlay(), Some(Overlay::AddMaterialForm)) {
            return Err(ActionError::NotAvailable(
                "The add material form is not open.".to_string(),
            ));
        }
        let context = self.nav.context().ok_or(NavigationError::IncompleteContext)?;

        let submission = match draft.validate(&context) {
            Ok(submission) => submission,
            Err(e) => {
                self.form_error.show(StatusKind::Error, e.to_string());
                return Err(e.into());
            }
        };

        let result = match &submission {
            MaterialSubmission::Linked(material) => {
                self.services.materials.add_material(material).await
            }
            MaterialSubmission::Upload(material, file) => {
                self.services.materials.upload_material(material, file).await
            }
        };

        match result {
            Ok(message) => {
                info!(
                    "Material '{}' added to {}: {}",
                    submission.material().title,
                    context,
                    message
                );
                self.form_error.clear();
                self.nav.close_overlay();
                self.material_refresh += 1;
                self.status
                    .show(StatusKind::Success, "Material added successfully!");
                self.sync();
                Ok(())
            }
            Err(e) => {
                error!("Failed to add material: {}", e);
                self.form_error.show(StatusKind::Error, failure_text("Error", &e));
                Err(e.into())
            }
        }
    }

    /// Saves the edit form open in the manage-materials panel.
    pub async fn update_material(&mut self, edit: MaterialEdit) -> Result<(), ActionError> {
        self.require_admin()?;
        let original = self.editing_material().cloned().ok_or_else(|| {
            ActionError::NotAvailable("No material is being edited.".to_string())
        })?;

        let update = match edit.validate(&original) {
            Ok(update) => update,
            Err(e) => {
                self.form_error.show(StatusKind::Error, e.to_string());
                return Err(e.into());
            }
        };

        match self
            .services
            .materials
            .update_material(&original.id, &update)
            .await
        {
            Ok(message) => {
                info!("Material {} updated: {}", original.id, message);
                self.form_error.clear();
                if let Some(Overlay::ManageMaterialsPanel { editing }) = self.nav.overlay_mut() {
                    *editing = None;
                }
                self.material_refresh += 1;
                self.status
                    .show(StatusKind::Success, "Material updated successfully!");
                self.sync();
                Ok(())
            }
            Err(e) => {
                error!("Failed to update material {}: {}", original.id, e);
                self.form_error
                    .show(StatusKind::Error, failure_text("Failed to update material", &e));
                Err(e.into())
            }
        }
    }

    /// Asks for confirmation before deleting a material listed in the panel.
    /// Returns the confirmation prompt.
    pub fn request_delete_material(&mut self, id: &MaterialId) -> Result<String, ActionError> {
        self.require_admin()?;
        if !matches!(self.nav.overlay(), Some(Overlay::ManageMaterialsPanel { .. })) {
            return Err(ActionError::NotAvailable(
                "Open the manage materials panel first.".to_string(),
            ));
        }
        let listed = self
            .admin_materials
            .state()
            .ready()
            .is_some_and(|materials| materials.iter().any(|m| &m.id == id));
        if !listed {
            return Err(ActionError::NotAvailable(format!("No material with id {}.", id)));
        }
        let pending = PendingDelete::Material(id.clone());
        let prompt = pending.prompt();
        self.pending_delete = Some(pending);
        Ok(prompt)
    }

    //=====================================================================================
    // Courses
    //=====================================================================================

    /// Asks for confirmation before deleting a course listed in the panel.
    pub fn request_delete_course(&mut self, code: &str) -> Result<String, ActionError> {
        self.require_admin()?;
        if !matches!(self.nav.overlay(), Some(Overlay::ManageCoursesPanel)) {
            return Err(ActionError::NotAvailable(
                "Open the manage courses panel first.".to_string(),
            ));
        }
        let course = self
            .admin_courses
            .state()
            .ready()
            .and_then(|courses| courses.iter().find(|c| c.code.eq_ignore_ascii_case(code.trim())))
            .map(|course| course.code.clone())
            .ok_or_else(|| ActionError::NotAvailable(format!("No course with code {}.", code)))?;
        let pending = PendingDelete::Course(course);
        let prompt = pending.prompt();
        self.pending_delete = Some(pending);
        Ok(prompt)
    }

    /// Saves the open course form, creating or updating the course.
    pub async fn submit_course_form(&mut self) -> Result<(), ActionError> {
        self.require_admin()?;
        let form = self.course_form().cloned().ok_or_else(|| {
            ActionError::NotAvailable("The course form is not open.".to_string())
        })?;

        let course = match validate_course(form.draft()) {
            Ok(course) => course,
            Err(e) => {
                self.form_error.show(StatusKind::Error, e.to_string());
                return Err(e.into());
            }
        };

        let result = if form.is_editing() {
            self.services.courses.update_course(&course).await
        } else {
            self.services.courses.create_course(&course).await
        };
        let verb = if form.is_editing() { "updated" } else { "added" };

        match result {
            Ok(message) => {
                info!("Course {} {}: {}", course.code, verb, message);
                self.form_error.clear();
                self.nav.open(Overlay::ManageCoursesPanel)?;
                self.catalog_refresh += 1;
                self.status
                    .show(StatusKind::Success, format!("Course {} successfully!", verb));
                self.sync();
                Ok(())
            }
            Err(e) => {
                error!("Failed to save course {}: {}", course.code, e);
                self.form_error
                    .show(StatusKind::Error, failure_text("Failed to save course", &e));
                Err(e.into())
            }
        }
    }

    //=====================================================================================
    // Confirmation
    //=====================================================================================

    /// Performs the pending delete.
    pub async fn confirm_delete(&mut self) -> Result<(), ActionError> {
        self.require_admin()?;
        let pending = self.pending_delete.take().ok_or(ActionError::NothingToConfirm)?;

        match pending {
            PendingDelete::Material(id) => {
                match self.services.materials.delete_material(&id).await {
                    Ok(message) => {
                        info!("Material {} deleted: {}", id, message);
                        self.form_error.clear();
                        if let Some(Overlay::ManageMaterialsPanel { editing }) =
                            self.nav.overlay_mut()
                        {
                            if editing.as_ref().is_some_and(|m| m.id == id) {
                                *editing = None;
                            }
                        }
                        self.material_refresh += 1;
                        self.status
                            .show(StatusKind::Success, "Material deleted successfully!");
                        self.sync();
                        Ok(())
                    }
                    Err(e) => {
                        error!("Failed to delete material {}: {}", id, e);
                        self.form_error
                            .show(StatusKind::Error, failure_text("Failed to delete material", &e));
                        Err(e.into())
                    }
                }
            }
            PendingDelete::Course(code) => match self.services.courses.delete_course(&code).await {
                Ok(message) => {
                    info!("Course {} deleted: {}", code, message);
                    self.form_error.clear();
                    self.catalog_refresh += 1;
                    self.status
                        .show(StatusKind::Success, "Course deleted successfully!");
                    self.sync();
                    Ok(())
                }
                Err(e) => {
                    error!("Failed to delete course {}: {}", code, e);
                    self.form_error
                        .show(StatusKind::Error, failure_text("Failed to delete course", &e));
                    Err(e.into())
                }
            },
        }
    }

    /// Drops the pending delete. Returns whether there was one.
    pub fn cancel_delete(&mut self) -> bool {
        self.pending_delete.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::testing::{admin, dashboard, open_operating_systems, student, FakeBackend};
    use std::time::Duration;
    use study_portal_core::domain::{MaterialCategory, MaterialFormat, Subject};
    use study_portal_core::navigation::{BrowseLevel, ViewMode};
    use study_portal_core::validation::ValidationError;

    fn link_draft(url: &str) -> MaterialDraft {
        MaterialDraft {
            title: "Deadlocks".into(),
            format: Some(MaterialFormat::Link),
            category: Some(MaterialCategory::Notes),
            content_url: url.into(),
            file: None,
        }
    }

    #[tokio::test]
    async fn add_material_validates_then_posts_and_returns_to_the_list() {
        let backend = FakeBackend::new();
        let mut dash = dashboard(&backend, admin());
        open_operating_systems(&mut dash).await;

        dash.open_add_material().unwrap();
        assert_eq!(dash.view(), ViewMode::AddMaterialForm);

        let err = dash.submit_material(link_draft("")).await.unwrap_err();
        assert!(matches!(
            err,
            ActionError::Validation(ValidationError::MissingContentUrl(MaterialFormat::Link))
        ));
        assert_eq!(
            dash.form_error().map(|m| m.text.as_str()),
            Some("Content URL cannot be empty for Link material.")
        );
        assert!(backend.calls_to("add_material").is_empty());
        assert_eq!(dash.view(), ViewMode::AddMaterialForm);

        dash.submit_material(link_draft("https://example.com/deadlocks"))
            .await
            .unwrap();
        assert_eq!(backend.calls_to("add_material"), vec!["add_material Deadlocks"]);
        assert_eq!(dash.view(), ViewMode::Browsing(BrowseLevel::Materials));
        assert_eq!(dash.material_refresh(), 1);
        assert_eq!(
            dash.status().map(|m| (m.kind, m.text.as_str())),
            Some((StatusKind::Success, "Material added successfully!"))
        );
        assert!(dash.form_error().is_none());

        dash.settle().await;
        assert_eq!(dash.materials().ready().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn failed_write_keeps_the_form_open() {
        let backend = FakeBackend::new();
        backend.fail_writes_with(PortError::Rejected {
            status: 400,
            message: "Invalid material type".into(),
        });
        let mut dash = dashboard(&backend, admin());
        open_operating_systems(&mut dash).await;
        dash.open_add_material().unwrap();

        let err = dash
            .submit_material(link_draft("https://example.com/deadlocks"))
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::Port(_)));
        assert_eq!(dash.view(), ViewMode::AddMaterialForm);
        assert_eq!(dash.material_refresh(), 0);
        assert_eq!(
            dash.form_error().map(|m| m.text.as_str()),
            Some("Error: Invalid material type")
        );

        backend.fail_writes_with(PortError::Network("connection reset".into()));
        dash.submit_material(link_draft("https://example.com/deadlocks"))
            .await
            .unwrap_err();
        assert_eq!(
            dash.form_error().map(|m| m.text.as_str()),
            Some("Network error. Could not connect to server.")
        );
        assert_eq!(dash.material_refresh(), 0);
    }

    #[tokio::test]
    async fn upload_formats_go_through_the_upload_endpoint() {
        let backend = FakeBackend::new();
        let mut dash = dashboard(&backend, admin());
        open_operating_systems(&mut dash).await;
        dash.open_add_material().unwrap();

        let mut draft = link_draft("");
        draft.format = Some(MaterialFormat::Pdf);
        draft.file = Some(study_portal_core::domain::UploadFile {
            file_name: "deadlocks.pdf".into(),
            content_type: Some("application/pdf".into()),
            bytes: bytes::Bytes::from_static(b"%PDF-1.4"),
        });
        dash.submit_material(draft).await.unwrap();

        assert_eq!(
            backend.calls_to("upload_material"),
            vec!["upload_material Deadlocks deadlocks.pdf"]
        );
        assert!(backend.calls_to("add_material").is_empty());
    }

    #[tokio::test]
    async fn edit_inside_the_panel_returns_to_the_panel_list() {
        let backend = FakeBackend::new();
        let mut dash = dashboard(&backend, admin());
        open_operating_systems(&mut dash).await;
        dash.open_manage_materials().unwrap();
        dash.settle().await;
        let refresh = dash.material_refresh();

        dash.edit_material(&MaterialId("m1".into())).unwrap();
        let mut edit = MaterialEdit::from_material(dash.editing_material().unwrap());
        edit.title = "Scheduling (revised)".into();
        dash.update_material(edit).await.unwrap();

        assert_eq!(dash.view(), ViewMode::ManageMaterialsPanel);
        assert!(dash.editing_material().is_none());
        assert_eq!(dash.material_refresh(), refresh + 1);
        dash.settle().await;
        let listed = dash.admin_materials().ready().unwrap();
        assert_eq!(listed[0].title, "Scheduling (revised)");
    }

    #[tokio::test]
    async fn invalid_edit_is_reported_without_a_request() {
        let backend = FakeBackend::new();
        let mut dash = dashboard(&backend, admin());
        open_operating_systems(&mut dash).await;
        dash.open_manage_materials().unwrap();
        dash.settle().await;
        dash.edit_material(&MaterialId("m1".into())).unwrap();

        let mut edit = MaterialEdit::from_material(dash.editing_material().unwrap());
        edit.category = None;
        assert!(dash.update_material(edit).await.is_err());
        assert_eq!(
            dash.form_error().map(|m| m.text.as_str()),
            Some("Title, Material Format, and Category are required.")
        );
        assert!(dash.editing_material().is_some());
        assert!(backend.calls_to("update_material").is_empty());
    }

    #[tokio::test]
    async fn delete_waits_for_confirmation() {
        let backend = FakeBackend::new();
        let mut dash = dashboard(&backend, admin());
        open_operating_systems(&mut dash).await;
        dash.open_manage_materials().unwrap();
        dash.settle().await;
        let refresh = dash.material_refresh();

        let prompt = dash.request_delete_material(&MaterialId("m1".into())).unwrap();
        assert_eq!(prompt, "Are you sure you want to delete this material?");
        assert!(backend.calls_to("delete_material").is_empty());

        assert!(dash.cancel_delete());
        assert!(matches!(
            dash.confirm_delete().await,
            Err(ActionError::NothingToConfirm)
        ));

        dash.request_delete_material(&MaterialId("m1".into())).unwrap();
        dash.confirm_delete().await.unwrap();
        assert_eq!(backend.calls_to("delete_material"), vec!["delete_material m1"]);
        assert_eq!(dash.view(), ViewMode::ManageMaterialsPanel);
        assert_eq!(dash.material_refresh(), refresh + 1);
        dash.settle().await;
        assert_eq!(dash.admin_materials().ready().map(Vec::len), Some(0));
    }

    #[tokio::test]
    async fn course_form_saves_and_returns_to_the_course_panel() {
        let backend = FakeBackend::new();
        let mut dash = dashboard(&backend, admin());
        dash.settle().await;
        dash.open_manage_courses().unwrap();
        dash.settle().await;
        assert_eq!(dash.admin_courses().ready().map(Vec::len), Some(2));

        dash.open_course_form(None).unwrap();
        assert_eq!(dash.view(), ViewMode::CourseEditForm);
        {
            let form = dash.course_form_mut().unwrap();
            assert!(form.set_code("EE300"));
            let year = form.add_year();
            let semester = form.add_semester(year).unwrap();
            assert!(form.add_subject(year, semester, Subject::named("Circuits")));
        }
        let err = dash.submit_course_form().await.unwrap_err();
        assert!(matches!(
            err,
            ActionError::Validation(ValidationError::MissingCourseTitle)
        ));
        assert_eq!(dash.view(), ViewMode::CourseEditForm);

        dash.course_form_mut().unwrap().set_title("Electrical Engineering");
        let refresh = dash.catalog_refresh();
        dash.submit_course_form().await.unwrap();

        assert_eq!(backend.calls_to("create_course"), vec!["create_course EE300"]);
        assert_eq!(dash.view(), ViewMode::ManageCoursesPanel);
        assert_eq!(dash.catalog_refresh(), refresh + 1);
        assert_eq!(
            dash.status().map(|m| m.text.as_str()),
            Some("Course added successfully!")
        );
        dash.settle().await;
        assert_eq!(dash.admin_courses().ready().map(Vec::len), Some(3));
    }

    #[tokio::test]
    async fn editing_a_course_keeps_its_code() {
        let backend = FakeBackend::new();
        let mut dash = dashboard(&backend, admin());
        dash.open_manage_courses().unwrap();
        dash.settle().await;
        let course = dash.admin_courses().ready().unwrap()[0].clone();

        dash.open_course_form(Some(course)).unwrap();
        let form = dash.course_form_mut().unwrap();
        assert!(!form.set_code("XX999"));
        form.set_description("Four year programme");
        dash.submit_course_form().await.unwrap();

        assert_eq!(backend.calls_to("update_course"), vec!["update_course CS101"]);
        assert_eq!(
            dash.status().map(|m| m.text.as_str()),
            Some("Course updated successfully!")
        );
    }

    #[tokio::test]
    async fn course_delete_is_confirmed_and_refreshes_the_panel() {
        let backend = FakeBackend::new();
        let mut dash = dashboard(&backend, admin());
        dash.open_manage_courses().unwrap();
        dash.settle().await;

        let prompt = dash.request_delete_course("me200").unwrap();
        assert_eq!(
            prompt,
            "Are you sure you want to delete course ME200? This action is irreversible."
        );
        dash.confirm_delete().await.unwrap();
        assert_eq!(backend.calls_to("delete_course"), vec!["delete_course ME200"]);
        dash.settle().await;
        assert_eq!(dash.admin_courses().ready().map(Vec::len), Some(1));
        assert_eq!(dash.view(), ViewMode::ManageCoursesPanel);
    }

    #[tokio::test]
    async fn students_cannot_mutate() {
        let backend = FakeBackend::new();
        let mut dash = dashboard(&backend, student());
        open_operating_systems(&mut dash).await;

        assert!(matches!(dash.open_add_material(), Err(ActionError::Forbidden)));
        assert!(matches!(dash.open_manage_courses(), Err(ActionError::Forbidden)));
        assert!(matches!(
            dash.submit_material(link_draft("https://example.com")).await,
            Err(ActionError::Forbidden)
        ));
        assert_eq!(dash.view(), ViewMode::Browsing(BrowseLevel::Materials));
        assert_eq!(
            dash.status().map(|m| m.text.as_str()),
            Some("Forbidden: Admin access required")
        );
        assert!(backend.calls_to("add_material").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn success_banner_clears_itself() {
        let backend = FakeBackend::new();
        let mut dash = dashboard(&backend, admin());
        open_operating_systems(&mut dash).await;
        dash.open_add_material().unwrap();
        dash.submit_material(link_draft("https://example.com/deadlocks"))
            .await
            .unwrap();
        dash.settle().await;
        assert!(dash.status().is_some());

        tokio::time::advance(Duration::from_secs(3)).await;
        assert!(dash.status().is_none());
    }
}
