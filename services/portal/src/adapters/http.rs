//! services/portal/src/adapters/http.rs
//!
//! This module contains the adapter for the portal's REST backend.
//! It implements every port from the `core` crate over one cookie-carrying
//! `reqwest::Client`, so an authenticated session is reused by all calls.

use async_trait::async_trait;
use reqwest::{multipart, Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use study_portal_core::domain::{
    Course, CourseSummary, Material, MaterialId, MaterialUpdate, NewMaterial, Role, SearchHit,
    SelectedContext, Session, Subject, UploadFile,
};
use study_portal_core::ports::{
    AuthService, CatalogService, CourseAdminService, FavoritesService, MaterialService,
    PortError, PortResult,
};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::wire::{
    materials_to_domain, AdminLogin, AuthStatus, CourseRecord, CourseSummaryRecord, LoginResponse,
    MaterialRecord, MaterialUpdatePayload, MessageBody, NewMaterialPayload, SearchHitRecord,
    StudentLogin, StudentSignup, SubjectRecord,
};
use crate::config::Config;
use crate::error::AppError;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the portal ports against the REST backend.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    /// Creates a new `HttpBackend` with its own cookie store.
    pub fn connect(
        base_url: Url,
        user_agent: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, AppError> {
        let mut builder = Client::builder().user_agent(user_agent).cookie_store(true);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Self::connect(
            config.api_base_url.clone(),
            &config.user_agent,
            config.http_timeout,
        )
    }

    /// Appends path segments to the base URL. Each segment is percent-encoded,
    /// so subject names with spaces or slashes stay a single segment.
    fn endpoint(&self, segments: &[&str]) -> PortResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| PortError::Unexpected(format!("'{}' cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> PortResult<Response> {
        request.send().await.map_err(|e| {
            warn!("Request to the portal backend failed: {}", e);
            PortError::Network(e.to_string())
        })
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> PortResult<T> {
        debug!("GET {}", url);
        let response = self.send(self.client.get(url)).await?;
        decode(response).await
    }

    /// Drill-down lists answer 404 when the parent has no children.
    async fn get_list<T: DeserializeOwned>(&self, url: Url) -> PortResult<Vec<T>> {
        debug!("GET {}", url);
        let response = self.send(self.client.get(url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        decode(response).await
    }

    /// Issues a write and returns the confirmation message.
    async fn write(&self, request: RequestBuilder) -> PortResult<String> {
        let response = self.send(request).await?;
        let body: MessageBody = decode(response).await?;
        Ok(body.message)
    }
}

/// Maps a response to either its decoded body or a `PortError`.
async fn decode<T: DeserializeOwned>(response: Response) -> PortResult<T> {
    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|e| PortError::Network(e.to_string()))?;

    if !status.is_success() {
        return Err(match status {
            StatusCode::UNAUTHORIZED => PortError::Unauthorized,
            StatusCode::FORBIDDEN => PortError::Forbidden(failure_message(status, &body)),
            StatusCode::NOT_FOUND => PortError::NotFound(failure_message(status, &body)),
            _ => PortError::Rejected {
                status: status.as_u16(),
                message: failure_message(status, &body),
            },
        });
    }

    serde_json::from_slice(&body)
        .map_err(|e| PortError::Unexpected(format!("Malformed response body: {}", e)))
}

/// Like `decode`, but a 401 carries the server's reason (bad credentials)
/// instead of meaning "not logged in".
async fn decode_credentials<T: DeserializeOwned>(response: Response) -> PortResult<T> {
    if response.status() != StatusCode::UNAUTHORIZED {
        return decode(response).await;
    }
    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|e| PortError::Network(e.to_string()))?;
    Err(PortError::Rejected {
        status: status.as_u16(),
        message: failure_message(status, &body),
    })
}

fn failure_message(status: StatusCode, body: &[u8]) -> String {
    serde_json::from_slice::<MessageBody>(body)
        .ok()
        .map(|b| b.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()))
}

fn session_from(role: &str, identity: &str) -> PortResult<Session> {
    let role: Role = role.parse().map_err(PortError::Unexpected)?;
    Ok(Session::new(role, identity))
}

//=========================================================================================
// `CatalogService` Trait Implementation
//=========================================================================================

#[async_trait]
impl CatalogService for HttpBackend {
    async fn list_courses(&self) -> PortResult<Vec<CourseSummary>> {
        let url = self.endpoint(&["api", "courses"])?;
        let records: Vec<CourseSummaryRecord> = self.get(url).await?;
        Ok(records.into_iter().map(CourseSummaryRecord::to_domain).collect())
    }

    async fn list_years(&self, course_code: &str) -> PortResult<Vec<u32>> {
        let url = self.endpoint(&["api", "courses", course_code, "years"])?;
        self.get_list(url).await
    }

    async fn list_semesters(&self, course_code: &str, year: u32) -> PortResult<Vec<u32>> {
        let year = year.to_string();
        let url = self.endpoint(&["api", "courses", course_code, "years", &year, "semesters"])?;
        self.get_list(url).await
    }

    async fn list_subjects(
        &self,
        course_code: &str,
        year: u32,
        semester: u32,
    ) -> PortResult<Vec<Subject>> {
        let (year, semester) = (year.to_string(), semester.to_string());
        let url = self.endpoint(&[
            "api", "courses", course_code, "years", &year, "semesters", &semester, "subjects",
        ])?;
        let records: Vec<SubjectRecord> = self.get_list(url).await?;
        Ok(records.into_iter().map(SubjectRecord::to_domain).collect())
    }

    async fn search_subjects(&self, query: &str) -> PortResult<Vec<SearchHit>> {
        let mut url = self.endpoint(&["api", "search", "subjects"])?;
        url.query_pairs_mut().append_pair("q", query.trim());
        let records: Vec<SearchHitRecord> = self.get(url).await?;
        Ok(records.into_iter().map(SearchHitRecord::to_domain).collect())
    }
}

//=========================================================================================
// `MaterialService` Trait Implementation
//=========================================================================================

#[async_trait]
impl MaterialService for HttpBackend {
    async fn list_materials(&self, context: &SelectedContext) -> PortResult<Vec<Material>> {
        let (year, semester) = (context.year.to_string(), context.semester.to_string());
        let url = self.endpoint(&[
            "api",
            "materials",
            &context.course_code,
            &year,
            &semester,
            &context.subject,
        ])?;
        let records: Vec<MaterialRecord> = self.get_list(url).await?;
        Ok(materials_to_domain(records))
    }

    async fn list_admin_materials(
        &self,
        context: &SelectedContext,
    ) -> PortResult<Vec<Material>> {
        let mut url = self.endpoint(&["api", "admin", "materials"])?;
        url.query_pairs_mut()
            .append_pair("courseCode", &context.course_code)
            .append_pair("year", &context.year.to_string())
            .append_pair("semester", &context.semester.to_string())
            .append_pair("subject", &context.subject);
        let records: Vec<MaterialRecord> = self.get_list(url).await?;
        Ok(materials_to_domain(records))
    }

    async fn add_material(&self, material: &NewMaterial) -> PortResult<String> {
        let url = self.endpoint(&["api", "admin", "materials", "add"])?;
        info!("Adding {} material '{}'", material.format, material.title);
        self.write(
            self.client
                .post(url)
                .json(&NewMaterialPayload::from_domain(material)),
        )
        .await
    }

    async fn upload_material(
        &self,
        material: &NewMaterial,
        file: &UploadFile,
    ) -> PortResult<String> {
        let url = self.endpoint(&["api", "admin", "materials", "upload"])?;
        info!(
            "Uploading '{}' ({} bytes) as {} material",
            file.file_name,
            file.bytes.len(),
            material.format
        );

        let mut part = multipart::Part::bytes(file.bytes.to_vec()).file_name(file.file_name.clone());
        if let Some(content_type) = &file.content_type {
            part = part
                .mime_str(content_type)
                .map_err(|e| PortError::Unexpected(e.to_string()))?;
        }
        let form = multipart::Form::new()
            .text("title", material.title.clone())
            .text("courseCode", material.course_code.clone())
            .text("year", material.year.to_string())
            .text("semester", material.semester.to_string())
            .text("subject", material.subject.clone())
            .text("materialFormat", material.format.as_str())
            .text("materialCategory", material.category.as_str())
            .part("file", part);

        self.write(self.client.post(url).multipart(form)).await
    }

    async fn update_material(
        &self,
        id: &MaterialId,
        update: &MaterialUpdate,
    ) -> PortResult<String> {
        let url = self.endpoint(&["api", "admin", "materials", &id.0])?;
        info!("Updating material {}", id);
        self.write(
            self.client
                .put(url)
                .json(&MaterialUpdatePayload::from_domain(update)),
        )
        .await
    }

    async fn delete_material(&self, id: &MaterialId) -> PortResult<String> {
        let url = self.endpoint(&["api", "admin", "materials", &id.0])?;
        info!("Deleting material {}", id);
        self.write(self.client.delete(url)).await
    }
}

//=========================================================================================
// `CourseAdminService` Trait Implementation
//=========================================================================================

#[async_trait]
impl CourseAdminService for HttpBackend {
    async fn list_admin_courses(&self) -> PortResult<Vec<Course>> {
        let url = self.endpoint(&["api", "admin", "courses"])?;
        let records: Vec<CourseRecord> = self.get(url).await?;
        Ok(records.into_iter().map(CourseRecord::to_domain).collect())
    }

    async fn create_course(&self, course: &Course) -> PortResult<String> {
        let url = self.endpoint(&["api", "admin", "courses"])?;
        info!("Creating course {}", course.code);
        self.write(self.client.post(url).json(&CourseRecord::from_domain(course)))
            .await
    }

    async fn update_course(&self, course: &Course) -> PortResult<String> {
        let url = self.endpoint(&["api", "admin", "courses", &course.code])?;
        info!("Updating course {}", course.code);
        self.write(self.client.put(url).json(&CourseRecord::from_domain(course)))
            .await
    }

    async fn delete_course(&self, code: &str) -> PortResult<String> {
        let url = self.endpoint(&["api", "admin", "courses", code])?;
        info!("Deleting course {}", code);
        self.write(self.client.delete(url)).await
    }
}

//=========================================================================================
// `AuthService` Trait Implementation
//=========================================================================================

#[async_trait]
impl AuthService for HttpBackend {
    async fn login_student(&self, email: &str, password: &str) -> PortResult<Session> {
        let url = self.endpoint(&["api", "auth", "login", "student"])?;
        let response = self
            .send(self.client.post(url).json(&StudentLogin { email, password }))
            .await?;
        let body: LoginResponse = decode_credentials(response).await?;
        info!("{}", body.message);
        session_from(&body.role, email)
    }

    async fn login_admin(&self, username: &str, password: &str) -> PortResult<Session> {
        let url = self.endpoint(&["api", "auth", "login", "admin"])?;
        let response = self
            .send(self.client.post(url).json(&AdminLogin { username, password }))
            .await?;
        let body: LoginResponse = decode_credentials(response).await?;
        info!("{}", body.message);
        session_from(&body.role, username)
    }

    async fn signup_student(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> PortResult<String> {
        let url = self.endpoint(&["api", "auth", "signup", "student"])?;
        self.write(self.client.post(url).json(&StudentSignup {
            full_name,
            email,
            password,
        }))
        .await
    }

    async fn current_session(&self) -> PortResult<Option<Session>> {
        let url = self.endpoint(&["api", "check_auth"])?;
        let status: AuthStatus = self.get(url).await?;
        if !status.is_authenticated {
            return Ok(None);
        }
        let role = status.role.unwrap_or_default();
        let identity = status.username.unwrap_or_default();
        session_from(&role, &identity).map(Some)
    }

    async fn logout(&self) -> PortResult<String> {
        let url = self.endpoint(&["api", "logout"])?;
        self.write(self.client.post(url)).await
    }
}

//=========================================================================================
// `FavoritesService` Trait Implementation
//=========================================================================================

#[async_trait]
impl FavoritesService for HttpBackend {
    async fn list_favorites(&self) -> PortResult<Vec<Material>> {
        let url = self.endpoint(&["api", "favorites"])?;
        let records: Vec<MaterialRecord> = self.get(url).await?;
        Ok(materials_to_domain(records))
    }
}
