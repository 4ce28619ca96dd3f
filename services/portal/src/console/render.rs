//! services/portal/src/console/render.rs
//!
//! Draws the dashboard's current view as plain text.

use crate::dashboard::{Dashboard, StatusKind, StatusMessage};
use std::fmt::{self, Write};
use study_portal_core::catalog::CourseForm;
use study_portal_core::domain::Material;
use study_portal_core::feed::Loadable;
use study_portal_core::navigation::{BrowseLevel, ViewMode};
use study_portal_core::validation::MaterialEdit;

/// Draws the screen. `edit` is the material edit typed so far; without one
/// the edit form shows the stored record.
pub fn render(dash: &Dashboard, edit: Option<&MaterialEdit>) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_screen(&mut out, dash, edit);
    out
}

/// "Courses > CS101 > Year 2 > Semester 1 > Operating Systems"
pub fn breadcrumb(dash: &Dashboard) -> String {
    let path = dash.path();
    let mut parts = vec!["Courses".to_string()];
    if let Some(course) = path.course() {
        parts.push(course.code.clone());
    }
    if let Some(year) = path.year() {
        parts.push(format!("Year {}", year));
    }
    if let Some(semester) = path.semester() {
        parts.push(format!("Semester {}", semester));
    }
    if let Some(subject) = path.subject() {
        parts.push(subject.to_string());
    }
    parts.join(" > ")
}

fn write_screen(out: &mut String, dash: &Dashboard, edit: Option<&MaterialEdit>) -> fmt::Result {
    writeln!(out)?;
    writeln!(
        out,
        "[{} {}] {}",
        dash.session().role,
        dash.session().identity,
        breadcrumb(dash)
    )?;

    match dash.view() {
        ViewMode::Browsing(BrowseLevel::Courses) => {
            writeln!(out, "Select a course:")?;
            write_list(out, dash.courses(), "No courses found.", |c| {
                format!("{} - {}", c.code, c.title)
            })?;
        }
        ViewMode::Browsing(BrowseLevel::Years) => {
            writeln!(out, "Select a year:")?;
            write_list(out, dash.years(), "No years found for this course.", |y| {
                format!("Year {}", y)
            })?;
        }
        ViewMode::Browsing(BrowseLevel::Semesters) => {
            writeln!(out, "Select a semester:")?;
            write_list(out, dash.semesters(), "No semesters found for this year.", |s| {
                format!("Semester {}", s)
            })?;
        }
        ViewMode::Browsing(BrowseLevel::Subjects) => {
            writeln!(out, "Select a subject:")?;
            write_list(out, dash.subjects(), "No subjects found for this semester.", |s| {
                if s.description.is_empty() {
                    s.name.clone()
                } else {
                    format!("{} - {}", s.name, s.description)
                }
            })?;
        }
        ViewMode::Browsing(BrowseLevel::Materials) => write_materials(out, dash)?,
        ViewMode::SearchResults => {
            writeln!(out, "Search results for \"{}\":", dash.search_query().trim())?;
            write_list(out, dash.search_results(), "No subjects found.", |hit| {
                format!(
                    "{} - {} ({}), Year {}, Semester {}",
                    hit.subject_name, hit.course_name, hit.course_code, hit.year, hit.semester
                )
            })?;
        }
        ViewMode::AddMaterialForm => {
            if let Some(context) = dash.context() {
                writeln!(out, "Add material to {}", context)?;
            }
            writeln!(out, "  submit <format> <category> <url|@file> <title>")?;
            writeln!(out, "  formats: PDF, Image, Document, Video, Link")?;
            writeln!(out, "  categories: syllabus, notes, papers")?;
        }
        ViewMode::ManageMaterialsPanel => match dash.editing_material() {
            Some(material) => {
                let draft = edit
                    .cloned()
                    .unwrap_or_else(|| MaterialEdit::from_material(material));
                writeln!(out, "Editing material {}", material.id)?;
                writeln!(out, "  title: {}", draft.title)?;
                writeln!(out, "  format: {}", draft.format.map_or("", |f| f.as_str()))?;
                writeln!(
                    out,
                    "  category: {}",
                    draft.category.map_or("", |c| c.as_str())
                )?;
                writeln!(out, "  url: {}", draft.content_url)?;
                writeln!(out, "  (set <field> <value>, then save or cancel)")?;
            }
            None => {
                if let Some(context) = dash.context() {
                    writeln!(out, "Manage materials for {}", context)?;
                }
                write_list(
                    out,
                    dash.admin_materials(),
                    "No materials found for this subject.",
                    |m| format!("[{}] {}", m.id, material_line(m)),
                )?;
            }
        },
        ViewMode::ManageCoursesPanel => {
            writeln!(out, "Manage courses:")?;
            write_list(out, dash.admin_courses(), "No courses found.", |c| {
                format!("{} - {} ({} years)", c.code, c.title, c.years.len())
            })?;
        }
        ViewMode::CourseEditForm => {
            if let Some(form) = dash.course_form() {
                write_course_form(out, form)?;
            }
        }
    }

    if let Some(pending) = dash.pending_delete() {
        writeln!(out, "? {} (confirm/cancel)", pending.prompt())?;
    }
    if let Some(message) = dash.form_error() {
        write_banner(out, message)?;
    }
    if let Some(message) = dash.status() {
        write_banner(out, message)?;
    }
    Ok(())
}

fn write_list<T>(
    out: &mut String,
    state: &Loadable<Vec<T>>,
    empty: &str,
    line: impl Fn(&T) -> String,
) -> fmt::Result {
    match state {
        Loadable::Idle => Ok(()),
        Loadable::Loading => writeln!(out, "  Loading..."),
        Loadable::Failed(message) => writeln!(out, "  Error: {}", message),
        Loadable::Ready(items) if items.is_empty() => writeln!(out, "  {}", empty),
        Loadable::Ready(items) => {
            for (i, item) in items.iter().enumerate() {
                writeln!(out, "  {}. {}", i + 1, line(item))?;
            }
            Ok(())
        }
    }
}

fn write_materials(out: &mut String, dash: &Dashboard) -> fmt::Result {
    if let Some(context) = dash.context() {
        writeln!(out, "Materials for {}:", context)?;
    }
    match dash.visible_materials() {
        Some(visible) if visible.is_empty() => {
            writeln!(out, "  {}", dash.material_filter().empty_message())
        }
        Some(visible) => {
            for (i, material) in visible.iter().enumerate() {
                writeln!(out, "  {}. {}", i + 1, material_line(material))?;
            }
            Ok(())
        }
        None => write_list(out, dash.materials(), "", |_: &Material| String::new()),
    }
}

fn material_line(material: &Material) -> String {
    let mut line = format!(
        "{} [{}, {}]",
        material.title, material.format, material.category
    );
    if let Some(url) = &material.content_url {
        line.push(' ');
        line.push_str(url);
    }
    line
}

fn write_course_form(out: &mut String, form: &CourseForm) -> fmt::Result {
    let draft = form.draft();
    match form.editing_code() {
        Some(code) => writeln!(out, "Edit course {}", code)?,
        None => writeln!(out, "New course")?,
    }
    writeln!(out, "  code: {}", draft.code)?;
    writeln!(out, "  title: {}", draft.title)?;
    writeln!(out, "  description: {}", draft.description)?;
    writeln!(out, "  duration: {}", draft.duration)?;
    for year in &draft.years {
        writeln!(out, "  Year {}", year.year)?;
        for semester in &year.semesters {
            writeln!(out, "    Semester {}", semester.semester)?;
            for (i, subject) in semester.subjects.iter().enumerate() {
                writeln!(out, "      {}. {}", i + 1, subject.name)?;
            }
        }
    }
    Ok(())
}

fn write_banner(out: &mut String, message: &StatusMessage) -> fmt::Result {
    let marker = match message.kind {
        StatusKind::Success => "*",
        StatusKind::Error => "!",
    };
    writeln!(out, "{} {}", marker, message.text)
}
