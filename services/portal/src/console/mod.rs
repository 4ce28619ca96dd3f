//! services/portal/src/console/mod.rs
//!
//! The line-oriented terminal front end.
//!
//! `run` signs the user in, then hands every typed line to a `Shell` that
//! drives one `Dashboard`. Input and finished fetches are awaited together,
//! so a debounced search fires while the user is idle at the prompt.

mod command;
mod render;

pub use command::{Command, CommandError, FormField, HELP, LOGIN_HELP};
pub use render::{breadcrumb, render};

use crate::dashboard::{Dashboard, DashboardSettings, PortalServices};
use crate::error::{ActionError, AppError};
use bytes::Bytes;
use std::path::Path;
use study_portal_core::catalog::CourseForm;
use study_portal_core::domain::{
    MaterialCategory, MaterialFormat, MaterialId, Role, Session, Subject, UploadFile,
};
use study_portal_core::validation::{MaterialDraft, MaterialEdit};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing::{info, warn};

/// What the console does after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    /// Stay in the session, optionally printing a message first.
    Continue(Option<String>),
    /// The session ended; the message is shown on the login screen.
    Logout(String),
    Quit,
}

//=========================================================================================
// Entry Point
//=========================================================================================

/// Runs the console until the user quits or stdin closes.
pub async fn run(services: PortalServices, settings: DashboardSettings) -> Result<(), AppError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let mut resumed = match services.auth.current_session().await {
        Ok(session) => session,
        Err(e) => {
            warn!("Could not check for an existing session: {}", e);
            None
        }
    };

    loop {
        let session = match resumed.take() {
            Some(session) => {
                info!("Resuming session for {} ({})", session.identity, session.role);
                session
            }
            None => match sign_in(&services, &mut lines).await? {
                Some(session) => session,
                None => return Ok(()),
            },
        };

        let mut shell = Shell::new(services.clone(), settings, session);
        match drive(&mut shell, &mut lines).await? {
            Flow::Logout(message) => println!("{}", message),
            _ => return Ok(()),
        }
    }
}

/// Reads login and signup commands until a session is established.
/// Returns `None` when the user quits.
async fn sign_in<R>(
    services: &PortalServices,
    lines: &mut Lines<R>,
) -> Result<Option<Session>, AppError>
where
    R: AsyncBufRead + Unpin,
{
    println!("Please log in.\n{}", LOGIN_HELP);
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match command {
            Command::Login {
                role,
                identity,
                password,
            } => {
                let result = match role {
                    Role::Student => services.auth.login_student(&identity, &password).await,
                    Role::Admin => services.auth.login_admin(&identity, &password).await,
                };
                match result {
                    Ok(session) => {
                        info!("Logged in as {} ({})", session.identity, session.role);
                        return Ok(Some(session));
                    }
                    Err(e) => {
                        warn!("Login failed for {}: {}", identity, e);
                        println!("Login failed: {}", e.user_message());
                    }
                }
            }
            Command::Signup {
                email,
                password,
                full_name,
            } => match services
                .auth
                .signup_student(&full_name, &email, &password)
                .await
            {
                Ok(message) => {
                    info!("Registered student {}", email);
                    println!("{} Please log in.", message);
                }
                Err(e) => {
                    warn!("Signup failed for {}: {}", email, e);
                    println!("Signup failed: {}", e.user_message());
                }
            },
            Command::Help => println!("{}", LOGIN_HELP),
            Command::Quit => return Ok(None),
            _ => println!("Please log in first."),
        }
    }
    Ok(None)
}

/// Feeds input lines to the shell and repaints after each command, and
/// again whenever the last outstanding fetch lands.
async fn drive<R>(shell: &mut Shell, lines: &mut Lines<R>) -> Result<Flow, AppError>
where
    R: AsyncBufRead + Unpin,
{
    print!("{}", shell.render());
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    return Ok(Flow::Quit);
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(command) => match shell.execute(command).await {
                        Flow::Continue(Some(message)) => println!("{}", message),
                        Flow::Continue(None) => {}
                        flow => return Ok(flow),
                    },
                    Err(e) => println!("{}", e),
                }
                print!("{}", shell.render());
            }
            true = shell.dash.process_next() => {
                if shell.dash.is_idle() {
                    print!("{}", shell.render());
                }
            }
        }
    }
}

//=========================================================================================
// Shell
//=========================================================================================

/// One signed-in session: the dashboard plus the material edit being typed.
pub struct Shell {
    services: PortalServices,
    dash: Dashboard,
    edit: Option<MaterialEdit>,
}

impl Shell {
    pub fn new(services: PortalServices, settings: DashboardSettings, session: Session) -> Self {
        Self {
            dash: Dashboard::new(services.clone(), settings, session),
            services,
            edit: None,
        }
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dash
    }

    pub fn dashboard_mut(&mut self) -> &mut Dashboard {
        &mut self.dash
    }

    /// The current screen, showing the material edit as typed so far.
    pub fn render(&self) -> String {
        render(&self.dash, self.edit.as_ref())
    }

    pub async fn execute(&mut self, command: Command) -> Flow {
        let result = match command {
            Command::Quit => return Flow::Quit,
            Command::Logout => return self.logout().await,
            Command::Login { .. } | Command::Signup { .. } => Err(ActionError::NotAvailable(
                "You are already logged in. Log out first.".to_string(),
            )),
            Command::Set(field, value) => self.set_field(field, value),
            Command::Save => self.save().await,
            Command::Edit(id) => {
                let result = self.dash.edit_material(&MaterialId(id));
                self.edit = self.dash.editing_material().map(MaterialEdit::from_material);
                result.map(|_| None)
            }
            command => dispatch(&mut self.dash, command).await,
        };

        // the dashboard may have closed the edit form (save, cancel, delete)
        if self.dash.editing_material().is_none() {
            self.edit = None;
        }

        match result {
            Ok(message) => Flow::Continue(message),
            // everything else already shows up as a banner
            Err(e @ (ActionError::NotAvailable(_) | ActionError::NothingToConfirm)) => {
                Flow::Continue(Some(e.to_string()))
            }
            Err(_) => Flow::Continue(None),
        }
    }

    async fn logout(&self) -> Flow {
        match self.services.auth.logout().await {
            Ok(message) => {
                info!("Logged out {}: {}", self.dash.session().identity, message);
                Flow::Logout("Successfully Logged Out!".to_string())
            }
            Err(e) => {
                warn!("Logout failed: {}", e);
                Flow::Continue(Some(format!("Logout failed: {}", e.user_message())))
            }
        }
    }

    fn set_field(&mut self, field: FormField, value: String) -> Result<Option<String>, ActionError> {
        if let Some(form) = self.dash.course_form_mut() {
            return match field {
                FormField::Code => {
                    if form.set_code(value) {
                        Ok(None)
                    } else {
                        Err(not_available("The course code cannot be changed."))
                    }
                }
                FormField::Title => {
                    form.set_title(value);
                    Ok(None)
                }
                FormField::Description => {
                    form.set_description(value);
                    Ok(None)
                }
                FormField::Duration => {
                    form.set_duration(value);
                    Ok(None)
                }
                _ => Err(not_available("The course form has no such field.")),
            };
        }

        let Some(edit) = self.edit.as_mut() else {
            return Err(not_available("No form is open."));
        };
        match field {
            FormField::Title => edit.title = value,
            FormField::Format => {
                edit.format = Some(value.parse::<MaterialFormat>().map_err(ActionError::NotAvailable)?)
            }
            FormField::Category => {
                edit.category =
                    Some(value.parse::<MaterialCategory>().map_err(ActionError::NotAvailable)?)
            }
            FormField::Url => edit.content_url = value,
            _ => return Err(not_available("The material form has no such field.")),
        }
        Ok(None)
    }

    async fn save(&mut self) -> Result<Option<String>, ActionError> {
        if self.dash.course_form().is_some() {
            return self.dash.submit_course_form().await.map(|_| None);
        }
        match self.edit.clone() {
            Some(edit) => self.dash.update_material(edit).await.map(|_| None),
            None => Err(not_available("No form is open.")),
        }
    }
}

fn not_available(message: &str) -> ActionError {
    ActionError::NotAvailable(message.to_string())
}

/// Commands that only touch the dashboard.
async fn dispatch(dash: &mut Dashboard, command: Command) -> Result<Option<String>, ActionError> {
    match command {
        Command::Help => Ok(Some(HELP.to_string())),

        Command::Home => {
            dash.reset();
            Ok(None)
        }
        Command::Course(code) => {
            let course = dash
                .find_course(&code)
                .ok_or_else(|| ActionError::NotAvailable(format!("No course with code {}.", code)))?;
            dash.select_course(course);
            Ok(None)
        }
        Command::Year(year) => picked(dash.select_year(year), "Select a course first."),
        Command::Semester(semester) => picked(dash.select_semester(semester), "Select a year first."),
        Command::Subject(subject) => {
            picked(dash.select_subject(&subject), "Select a semester first.")
        }
        Command::Back => picked(dash.back(), "Already at the course list."),
        Command::Search(query) => {
            dash.set_search_query(&query);
            Ok(None)
        }
        Command::Pick(position) => {
            let index = position
                .checked_sub(1)
                .ok_or_else(|| not_available("Search results are numbered from 1."))?;
            dash.select_search_result(index).map(|_| None)
        }
        Command::Filter(filter) => {
            dash.set_material_filter(filter);
            Ok(None)
        }
        Command::Refresh => {
            dash.refresh();
            Ok(None)
        }
        Command::Favorites => Ok(Some(match dash.favorites().await {
            Ok(materials) if materials.is_empty() => "You have no favorite materials yet.".to_string(),
            Ok(materials) => materials
                .iter()
                .map(|m| format!("  {} ({} / {}) {}", m.title, m.course_code, m.subject, m.format))
                .collect::<Vec<_>>()
                .join("\n"),
            Err(message) => message,
        })),

        Command::AddMaterial => dash.open_add_material().map(|_| None),
        Command::Submit {
            format,
            category,
            source,
            title,
        } => {
            let mut draft = MaterialDraft {
                title,
                format,
                category,
                ..MaterialDraft::default()
            };
            match source.strip_prefix('@') {
                Some(path) => draft.file = Some(read_upload(Path::new(path)).await?),
                None => draft.content_url = source,
            }
            dash.submit_material(draft).await.map(|_| None)
        }
        Command::ManageMaterials => dash.open_manage_materials().map(|_| None),
        Command::Delete(id) => dash.request_delete_material(&MaterialId(id)).map(Some),

        Command::ManageCourses => dash.open_manage_courses().map(|_| None),
        Command::NewCourse => dash.open_course_form(None).map(|_| None),
        Command::EditCourse(code) => {
            let course = dash
                .admin_courses()
                .ready()
                .and_then(|courses| {
                    courses
                        .iter()
                        .find(|c| c.code.eq_ignore_ascii_case(code.trim()))
                })
                .cloned()
                .ok_or_else(|| ActionError::NotAvailable(format!("No course with code {}.", code)))?;
            dash.open_course_form(Some(course)).map(|_| None)
        }
        Command::DeleteCourse(code) => dash.request_delete_course(&code).map(Some),
        Command::AddYear => edit_course(dash, |form| {
            form.add_year();
            true
        }),
        Command::RemoveYear(year) => edit_course(dash, |form| form.remove_year(year)),
        Command::AddSemester(year) => edit_course(dash, |form| form.add_semester(year).is_some()),
        Command::RemoveSemester(year, semester) => {
            edit_course(dash, |form| form.remove_semester(year, semester))
        }
        Command::AddSubject(year, semester, name) => edit_course(dash, |form| {
            form.add_subject(year, semester, Subject::named(name))
        }),
        Command::RemoveSubject(year, semester, position) => {
            edit_course(dash, |form| form.remove_subject(year, semester, position))
        }
        Command::RenameSubject(year, semester, position, name) => edit_course(dash, |form| {
            let description = subject_description(form, year, semester, position);
            form.rename_subject(
                year,
                semester,
                position,
                Subject { name, description },
            )
        }),

        Command::Confirm => dash.confirm_delete().await.map(|_| None),
        Command::Cancel => {
            if dash.cancel_delete() || dash.cancel() {
                Ok(None)
            } else {
                Ok(Some("Nothing to cancel.".to_string()))
            }
        }

        // handled by the shell
        Command::Quit
        | Command::Logout
        | Command::Login { .. }
        | Command::Signup { .. }
        | Command::Set(..)
        | Command::Save
        | Command::Edit(_) => Ok(None),
    }
}

fn picked(moved: bool, otherwise: &str) -> Result<Option<String>, ActionError> {
    if moved {
        Ok(None)
    } else {
        Err(not_available(otherwise))
    }
}

/// Applies a structural change to the open course form.
fn edit_course(
    dash: &mut Dashboard,
    change: impl FnOnce(&mut CourseForm) -> bool,
) -> Result<Option<String>, ActionError> {
    let form = dash
        .course_form_mut()
        .ok_or_else(|| not_available("The course form is not open."))?;
    if change(form) {
        Ok(None)
    } else {
        Err(not_available("No such year, semester or subject in this course."))
    }
}

fn subject_description(form: &CourseForm, year: u32, semester: u32, position: usize) -> String {
    form.draft()
        .years
        .iter()
        .find(|y| y.year == year)
        .and_then(|y| y.semesters.iter().find(|s| s.semester == semester))
        .and_then(|s| s.subjects.get(position.checked_sub(1)?))
        .map(|subject| subject.description.clone())
        .unwrap_or_default()
}

async fn read_upload(path: &Path) -> Result<UploadFile, ActionError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        warn!("Could not read upload {}: {}", path.display(), e);
        ActionError::NotAvailable(format!("Could not read {}: {}", path.display(), e))
    })?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    Ok(UploadFile {
        content_type: content_type_for(path).map(str::to_string),
        file_name,
        bytes: Bytes::from(bytes),
    })
}

fn content_type_for(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    let content_type = match extension.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "txt" => "text/plain",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        _ => return None,
    };
    Some(content_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::testing::{admin, open_operating_systems, student, FakeBackend};
    use std::sync::Arc;
    use study_portal_core::navigation::{BrowseLevel, ViewMode};

    fn open_shell(backend: &Arc<FakeBackend>, session: Session) -> Shell {
        Shell::new(
            PortalServices::from_backend(backend.clone()),
            DashboardSettings::default(),
            session,
        )
    }

    #[tokio::test]
    async fn commands_walk_the_drill_down() {
        let backend = FakeBackend::new();
        let mut shell = open_shell(&backend, student());
        shell.dashboard_mut().settle().await;

        for command in [
            Command::Course("cs101".into()),
            Command::Year(2),
            Command::Semester(1),
            Command::Subject("Operating Systems".into()),
        ] {
            assert_eq!(shell.execute(command).await, Flow::Continue(None));
            shell.dashboard_mut().settle().await;
        }
        assert_eq!(
            shell.dashboard().view(),
            ViewMode::Browsing(BrowseLevel::Materials)
        );
        assert_eq!(
            shell.execute(Command::Course("XX9".into())).await,
            Flow::Continue(Some("No course with code XX9.".into()))
        );
    }

    #[tokio::test]
    async fn course_form_is_built_and_saved() {
        let backend = FakeBackend::new();
        let mut shell = open_shell(&backend, admin());
        shell.execute(Command::ManageCourses).await;
        shell.dashboard_mut().settle().await;
        shell.execute(Command::NewCourse).await;

        for command in [
            Command::Set(FormField::Code, "EE300".into()),
            Command::Set(FormField::Title, "Electrical Engineering".into()),
            Command::AddYear,
            Command::AddSemester(1),
            Command::AddSubject(1, 1, "Circuits".into()),
            Command::RenameSubject(1, 1, 1, "Circuit Analysis".into()),
        ] {
            assert_eq!(shell.execute(command).await, Flow::Continue(None));
        }
        assert_eq!(
            shell.execute(Command::RemoveSemester(1, 5)).await,
            Flow::Continue(Some("No such year, semester or subject in this course.".into()))
        );

        assert_eq!(shell.execute(Command::Save).await, Flow::Continue(None));
        assert_eq!(backend.calls_to("create_course"), vec!["create_course EE300"]);
        assert_eq!(shell.dashboard().view(), ViewMode::ManageCoursesPanel);
    }

    #[tokio::test]
    async fn material_edit_is_typed_then_saved() {
        let backend = FakeBackend::new();
        let mut shell = open_shell(&backend, admin());
        open_operating_systems(shell.dashboard_mut()).await;
        shell.execute(Command::ManageMaterials).await;
        shell.dashboard_mut().settle().await;

        shell.execute(Command::Edit("m1".into())).await;
        shell
            .execute(Command::Set(FormField::Title, "Scheduling notes".into()))
            .await;
        assert_eq!(
            shell.execute(Command::Set(FormField::Format, "slides".into())).await,
            Flow::Continue(Some("unknown material format 'slides'".into()))
        );
        assert!(shell.render().contains("  title: Scheduling notes"));
        assert_eq!(shell.execute(Command::Save).await, Flow::Continue(None));

        assert_eq!(
            backend.calls_to("update_material"),
            vec!["update_material m1 Scheduling notes"]
        );
        assert!(shell.dashboard().editing_material().is_none());
        assert_eq!(
            shell.execute(Command::Set(FormField::Title, "x".into())).await,
            Flow::Continue(Some("No form is open.".into()))
        );
    }

    #[tokio::test]
    async fn unreadable_upload_is_reported_without_a_request() {
        let backend = FakeBackend::new();
        let mut shell = open_shell(&backend, admin());
        open_operating_systems(shell.dashboard_mut()).await;
        shell.execute(Command::AddMaterial).await;

        let flow = shell
            .execute(Command::Submit {
                format: Some(MaterialFormat::Pdf),
                category: Some(MaterialCategory::Notes),
                source: "@/definitely/not/here.pdf".into(),
                title: "Lecture 1".into(),
            })
            .await;
        let Flow::Continue(Some(message)) = flow else {
            panic!("expected a message, got {:?}", flow);
        };
        assert!(message.starts_with("Could not read /definitely/not/here.pdf"));
        assert!(backend.calls_to("upload_material").is_empty());
        assert_eq!(shell.dashboard().view(), ViewMode::AddMaterialForm);
    }

    #[tokio::test]
    async fn pick_zero_is_refused() {
        let backend = FakeBackend::new();
        let mut shell = open_shell(&backend, student());
        shell.dashboard_mut().settle().await;

        assert_eq!(
            shell.execute(Command::Pick(0)).await,
            Flow::Continue(Some("Search results are numbered from 1.".into()))
        );
        assert_eq!(
            shell.dashboard().view(),
            ViewMode::Browsing(BrowseLevel::Courses)
        );
    }

    #[tokio::test]
    async fn delete_waits_for_confirmation() {
        let backend = FakeBackend::new();
        let mut shell = open_shell(&backend, admin());
        open_operating_systems(shell.dashboard_mut()).await;
        shell.execute(Command::ManageMaterials).await;
        shell.dashboard_mut().settle().await;

        assert_eq!(
            shell.execute(Command::Delete("m1".into())).await,
            Flow::Continue(Some("Are you sure you want to delete this material?".into()))
        );
        assert!(backend.calls_to("delete_material").is_empty());
        assert_eq!(shell.execute(Command::Cancel).await, Flow::Continue(None));
        assert_eq!(
            shell.execute(Command::Confirm).await,
            Flow::Continue(Some("Nothing is waiting for confirmation.".into()))
        );
        // the cancel only dropped the prompt, the panel stays open
        assert_eq!(shell.dashboard().view(), ViewMode::ManageMaterialsPanel);
    }

    #[tokio::test]
    async fn login_screen_ignores_other_commands_until_signed_in() {
        let backend = FakeBackend::new();
        let services = PortalServices::from_backend(backend.clone());
        let input: &[u8] = b"year 2\nlogin tutor x y\n\nlogin admin superadmin secret\n";
        let mut lines = BufReader::new(input).lines();

        let session = sign_in(&services, &mut lines).await.unwrap();
        assert_eq!(session, Some(Session::new(Role::Admin, "superadmin")));
        assert_eq!(backend.calls(), vec!["login_admin superadmin"]);

        let mut lines = BufReader::new(&b"quit\n"[..]).lines();
        assert_eq!(sign_in(&services, &mut lines).await.unwrap(), None);
    }

    #[tokio::test]
    async fn logout_ends_the_session() {
        let backend = FakeBackend::new();
        let mut shell = open_shell(&backend, student());
        let mut lines = BufReader::new(&b"help\nlogout\nhome\n"[..]).lines();

        let flow = drive(&mut shell, &mut lines).await.unwrap();
        assert_eq!(flow, Flow::Logout("Successfully Logged Out!".into()));
        assert_eq!(backend.calls_to("logout").len(), 1);

        // end of input quits
        let mut lines = BufReader::new(&b""[..]).lines();
        let mut shell = open_shell(&backend, student());
        assert_eq!(drive(&mut shell, &mut lines).await.unwrap(), Flow::Quit);
    }

    #[test]
    fn content_type_follows_the_extension() {
        assert_eq!(content_type_for(Path::new("a/notes.PDF")), Some("application/pdf"));
        assert_eq!(content_type_for(Path::new("diagram.jpeg")), Some("image/jpeg"));
        assert_eq!(content_type_for(Path::new("archive.tar.gz")), None);
        assert_eq!(content_type_for(Path::new("README")), None);
    }
}
