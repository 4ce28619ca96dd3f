//! services/portal/src/dashboard/testing.rs
//!
//! An in-memory backend for dashboard tests. It serves a small fixed catalog,
//! records every call, and can hold a material response until released.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use study_portal_core::domain::{
    Course, CourseRef, CourseSummary, Material, MaterialCategory, MaterialFormat, MaterialId,
    MaterialUpdate, NewMaterial, Role, SearchHit, SelectedContext, Session, Subject, UploadFile,
};
use study_portal_core::ports::{
    AuthService, CatalogService, CourseAdminService, FavoritesService, MaterialService,
    PortError, PortResult,
};
use tokio::sync::Notify;

use super::{Dashboard, DashboardSettings, PortalServices};

#[derive(Default)]
struct Store {
    calls: Vec<String>,
    materials: Vec<Material>,
    courses: Vec<Course>,
    next_id: u32,
    held_subjects: HashMap<String, Arc<Notify>>,
    held_years: HashMap<String, Arc<Notify>>,
    fail_writes: Option<PortError>,
    fail_search: Option<PortError>,
}

#[derive(Default)]
pub(crate) struct FakeBackend {
    store: Mutex<Store>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        let backend = Self::default();
        {
            let mut store = backend.store.lock().unwrap();
            store.courses = vec![
                Course {
                    code: "CS101".into(),
                    title: "Computer Science".into(),
                    ..Course::default()
                },
                Course {
                    code: "ME200".into(),
                    title: "Mechanical Engineering".into(),
                    ..Course::default()
                },
            ];
            store.materials = vec![os_material("m1", "Process scheduling")];
            store.next_id = 2;
        }
        Arc::new(backend)
    }

    fn record(&self, call: String) {
        self.store.lock().unwrap().calls.push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.store.lock().unwrap().calls.clone()
    }

    /// Calls whose description starts with `prefix`.
    pub fn calls_to(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| call.starts_with(prefix))
            .collect()
    }

    /// Makes material reads for `subject` wait until the returned handle is notified.
    pub fn hold_materials_for(&self, subject: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.store
            .lock()
            .unwrap()
            .held_subjects
            .insert(subject.to_string(), gate.clone());
        gate
    }

    /// Makes year reads for `course_code` wait until the returned handle is notified.
    pub fn hold_years_for(&self, course_code: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.store
            .lock()
            .unwrap()
            .held_years
            .insert(course_code.to_string(), gate.clone());
        gate
    }

    pub fn fail_writes_with(&self, err: PortError) {
        self.store.lock().unwrap().fail_writes = Some(err);
    }

    pub fn fail_search_with(&self, err: PortError) {
        self.store.lock().unwrap().fail_search = Some(err);
    }

    fn write_failure(&self) -> PortResult<()> {
        match self.store.lock().unwrap().fail_writes.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn materials_for(&self, context: &SelectedContext) -> Vec<Material> {
        self.store
            .lock()
            .unwrap()
            .materials
            .iter()
            .filter(|m| {
                m.course_code == context.course_code
                    && m.year == context.year
                    && m.semester == context.semester
                    && m.subject == context.subject
            })
            .cloned()
            .collect()
    }
}

pub(crate) fn os_material(id: &str, title: &str) -> Material {
    Material {
        id: MaterialId(id.into()),
        title: title.into(),
        course_code: "CS101".into(),
        year: 2,
        semester: 1,
        subject: "Operating Systems".into(),
        format: MaterialFormat::Link,
        category: MaterialCategory::Notes,
        content_url: Some("https://example.com/scheduling".into()),
        uploaded_by: Some("superadmin".into()),
        uploaded_at: None,
    }
}

pub(crate) fn admin() -> Session {
    Session::new(Role::Admin, "superadmin")
}

pub(crate) fn student() -> Session {
    Session::new(Role::Student, "student@example.edu")
}

pub(crate) fn dashboard(backend: &Arc<FakeBackend>, session: Session) -> Dashboard {
    Dashboard::new(
        PortalServices::from_backend(backend.clone()),
        DashboardSettings::default(),
        session,
    )
}

/// Walks the dashboard down to CS101 / Year 2 / Semester 1 / Operating Systems.
pub(crate) async fn open_operating_systems(dash: &mut Dashboard) {
    dash.settle().await;
    dash.select_course(CourseRef::new("CS101", "Computer Science"));
    dash.settle().await;
    dash.select_year(2);
    dash.settle().await;
    dash.select_semester(1);
    dash.settle().await;
    dash.select_subject("Operating Systems");
    dash.settle().await;
}

//=========================================================================================
// Port Implementations
//=========================================================================================

#[async_trait]
impl CatalogService for FakeBackend {
    async fn list_courses(&self) -> PortResult<Vec<CourseSummary>> {
        self.record("list_courses".into());
        Ok(self
            .store
            .lock()
            .unwrap()
            .courses
            .iter()
            .map(Course::summary)
            .collect())
    }

    async fn list_years(&self, course_code: &str) -> PortResult<Vec<u32>> {
        self.record(format!("list_years {}", course_code));
        let gate = self
            .store
            .lock()
            .unwrap()
            .held_years
            .get(course_code)
            .cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        match course_code {
            "ME200" => Ok(vec![1, 2]),
            _ => Ok(vec![1, 2, 3, 4]),
        }
    }

    async fn list_semesters(&self, course_code: &str, year: u32) -> PortResult<Vec<u32>> {
        self.record(format!("list_semesters {} {}", course_code, year));
        Ok(vec![1, 2])
    }

    async fn list_subjects(
        &self,
        course_code: &str,
        year: u32,
        semester: u32,
    ) -> PortResult<Vec<Subject>> {
        self.record(format!("list_subjects {} {} {}", course_code, year, semester));
        Ok(vec![Subject::named("Operating Systems"), Subject::named("Databases")])
    }

    async fn search_subjects(&self, query: &str) -> PortResult<Vec<SearchHit>> {
        self.record(format!("search {}", query));
        if let Some(err) = self.store.lock().unwrap().fail_search.clone() {
            return Err(err);
        }
        Ok(vec![SearchHit {
            subject_name: "Database Systems".into(),
            course_code: "CS101".into(),
            course_name: "Computer Science".into(),
            year: 3,
            semester: 2,
        }])
    }
}

#[async_trait]
impl MaterialService for FakeBackend {
    async fn list_materials(&self, context: &SelectedContext) -> PortResult<Vec<Material>> {
        self.record(format!("list_materials {}", context));
        let gate = self
            .store
            .lock()
            .unwrap()
            .held_subjects
            .get(&context.subject)
            .cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(self.materials_for(context))
    }

    async fn list_admin_materials(
        &self,
        context: &SelectedContext,
    ) -> PortResult<Vec<Material>> {
        self.record(format!("list_admin_materials {}", context));
        Ok(self.materials_for(context))
    }

    async fn add_material(&self, material: &NewMaterial) -> PortResult<String> {
        self.record(format!("add_material {}", material.title));
        self.write_failure()?;
        let mut store = self.store.lock().unwrap();
        let id = format!("m{}", store.next_id);
        store.next_id += 1;
        store.materials.push(Material {
            id: MaterialId(id),
            title: material.title.clone(),
            course_code: material.course_code.clone(),
            year: material.year,
            semester: material.semester,
            subject: material.subject.clone(),
            format: material.format,
            category: material.category,
            content_url: material.content_url.clone(),
            uploaded_by: Some("superadmin".into()),
            uploaded_at: None,
        });
        Ok("Material added successfully".into())
    }

    async fn upload_material(
        &self,
        material: &NewMaterial,
        file: &UploadFile,
    ) -> PortResult<String> {
        self.record(format!("upload_material {} {}", material.title, file.file_name));
        self.write_failure()?;
        Ok("File uploaded".into())
    }

    async fn update_material(
        &self,
        id: &MaterialId,
        update: &MaterialUpdate,
    ) -> PortResult<String> {
        self.record(format!("update_material {} {}", id, update.title));
        self.write_failure()?;
        let mut store = self.store.lock().unwrap();
        if let Some(material) = store.materials.iter_mut().find(|m| &m.id == id) {
            material.title = update.title.clone();
            material.format = update.format;
            material.category = update.category;
            material.content_url = Some(update.content_url.clone());
        }
        Ok("Material updated".into())
    }

    async fn delete_material(&self, id: &MaterialId) -> PortResult<String> {
        self.record(format!("delete_material {}", id));
        self.write_failure()?;
        self.store.lock().unwrap().materials.retain(|m| &m.id != id);
        Ok("Material deleted".into())
    }
}

#[async_trait]
impl CourseAdminService for FakeBackend {
    async fn list_admin_courses(&self) -> PortResult<Vec<Course>> {
        self.record("list_admin_courses".into());
        Ok(self.store.lock().unwrap().courses.clone())
    }

    async fn create_course(&self, course: &Course) -> PortResult<String> {
        self.record(format!("create_course {}", course.code));
        self.write_failure()?;
        self.store.lock().unwrap().courses.push(course.clone());
        Ok("Course created".into())
    }

    async fn update_course(&self, course: &Course) -> PortResult<String> {
        self.record(format!("update_course {}", course.code));
        self.write_failure()?;
        let mut store = self.store.lock().unwrap();
        if let Some(existing) = store.courses.iter_mut().find(|c| c.code == course.code) {
            *existing = course.clone();
        }
        Ok("Course updated".into())
    }

    async fn delete_course(&self, code: &str) -> PortResult<String> {
        self.record(format!("delete_course {}", code));
        self.write_failure()?;
        self.store.lock().unwrap().courses.retain(|c| c.code != code);
        Ok("Course deleted".into())
    }
}

#[async_trait]
impl AuthService for FakeBackend {
    async fn login_student(&self, email: &str, _password: &str) -> PortResult<Session> {
        self.record(format!("login_student {}", email));
        Ok(Session::new(Role::Student, email))
    }

    async fn login_admin(&self, username: &str, _password: &str) -> PortResult<Session> {
        self.record(format!("login_admin {}", username));
        Ok(Session::new(Role::Admin, username))
    }

    async fn signup_student(
        &self,
        _full_name: &str,
        email: &str,
        _password: &str,
    ) -> PortResult<String> {
        self.record(format!("signup_student {}", email));
        Ok("Student registered successfully".into())
    }

    async fn current_session(&self) -> PortResult<Option<Session>> {
        self.record("current_session".into());
        Ok(None)
    }

    async fn logout(&self) -> PortResult<String> {
        self.record("logout".into());
        Ok("Logged out successfully".into())
    }
}

#[async_trait]
impl FavoritesService for FakeBackend {
    async fn list_favorites(&self) -> PortResult<Vec<Material>> {
        self.record("list_favorites".into());
        Err(PortError::Unauthorized)
    }
}
