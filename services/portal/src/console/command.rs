//! services/portal/src/console/command.rs
//!
//! Parses one line of console input into a `Command`.

use std::str::FromStr;
use study_portal_core::domain::{MaterialCategory, MaterialFilter, MaterialFormat, Role};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command '{0}'. Type 'help' for a list of commands.")]
    Unknown(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
    #[error("'{0}' is not a number.")]
    NotANumber(String),
    #[error("{0}")]
    Invalid(String),
}

/// A field of whichever form is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Format,
    Category,
    Url,
    Code,
    Description,
    Duration,
}

impl FromStr for FormField {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "title" => Ok(FormField::Title),
            "format" => Ok(FormField::Format),
            "category" => Ok(FormField::Category),
            "url" => Ok(FormField::Url),
            "code" => Ok(FormField::Code),
            "description" => Ok(FormField::Description),
            "duration" => Ok(FormField::Duration),
            other => Err(CommandError::Invalid(format!("Unknown field '{}'.", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,

    // --- Session ---
    Login {
        role: Role,
        identity: String,
        password: String,
    },
    Signup {
        email: String,
        password: String,
        full_name: String,
    },
    Logout,

    // --- Browsing ---
    Home,
    Course(String),
    Year(u32),
    Semester(u32),
    Subject(String),
    Back,
    Search(String),
    /// 1-based position in the search results.
    Pick(usize),
    Filter(MaterialFilter),
    Refresh,
    Favorites,

    // --- Materials (admin) ---
    AddMaterial,
    Submit {
        format: Option<MaterialFormat>,
        category: Option<MaterialCategory>,
        /// A URL, or `@path` to upload a local file.
        source: String,
        title: String,
    },
    ManageMaterials,
    Edit(String),
    Delete(String),

    // --- Courses (admin) ---
    ManageCourses,
    NewCourse,
    EditCourse(String),
    DeleteCourse(String),
    AddYear,
    RemoveYear(u32),
    AddSemester(u32),
    RemoveSemester(u32, u32),
    AddSubject(u32, u32, String),
    RemoveSubject(u32, u32, usize),
    RenameSubject(u32, u32, usize, String),

    // --- Forms ---
    Set(FormField, String),
    Save,
    Confirm,
    Cancel,
}

fn number<T: FromStr>(raw: Option<&str>, usage: &'static str) -> Result<T, CommandError> {
    let raw = raw.ok_or(CommandError::Usage(usage))?;
    raw.parse()
        .map_err(|_| CommandError::NotANumber(raw.to_string()))
}

/// Years, semesters and result numbers all count from 1.
fn ordinal<T: FromStr + Default + PartialEq>(
    raw: Option<&str>,
    usage: &'static str,
) -> Result<T, CommandError> {
    let value: T = number(raw, usage)?;
    if value == T::default() {
        return Err(CommandError::Usage(usage));
    }
    Ok(value)
}

fn word(raw: Option<&str>, usage: &'static str) -> Result<String, CommandError> {
    raw.map(str::to_string).ok_or(CommandError::Usage(usage))
}

/// Everything after the first `skip` words, with inner spacing preserved.
fn rest(line: &str, skip: usize) -> String {
    let mut remaining = line.trim_start();
    for _ in 0..skip {
        remaining = remaining
            .split_once(char::is_whitespace)
            .map_or("", |(_, tail)| tail.trim_start());
    }
    remaining.trim_end().to_string()
}

fn filter_axis<T: FromStr>(raw: &str) -> Result<Option<T>, CommandError> {
    if raw.eq_ignore_ascii_case("all") {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .map_err(|_| CommandError::Invalid(format!("Unknown filter value '{}'.", raw)))
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Err(CommandError::Usage("help"));
        };

        let command = match name.to_ascii_lowercase().as_str() {
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,

            "login" => {
                const USAGE: &str = "login <student|admin> <email|username> <password>";
                let role = word(words.next(), USAGE)?
                    .parse()
                    .map_err(|_| CommandError::Usage(USAGE))?;
                Command::Login {
                    role,
                    identity: word(words.next(), USAGE)?,
                    password: word(words.next(), USAGE)?,
                }
            }
            "signup" => {
                const USAGE: &str = "signup <email> <password> <full name>";
                let email = word(words.next(), USAGE)?;
                let password = word(words.next(), USAGE)?;
                let full_name = rest(line, 3);
                if full_name.is_empty() {
                    return Err(CommandError::Usage(USAGE));
                }
                Command::Signup {
                    email,
                    password,
                    full_name,
                }
            }
            "logout" => Command::Logout,

            "home" | "courses" => Command::Home,
            "course" => Command::Course(word(words.next(), "course <code>")?),
            "year" => Command::Year(ordinal(words.next(), "year <number>")?),
            "semester" => Command::Semester(ordinal(words.next(), "semester <number>")?),
            "subject" => {
                let subject = rest(line, 1);
                if subject.is_empty() {
                    return Err(CommandError::Usage("subject <name>"));
                }
                Command::Subject(subject)
            }
            "back" => Command::Back,
            "search" => Command::Search(rest(line, 1)),
            "pick" => Command::Pick(ordinal(words.next(), "pick <result number>")?),
            "filter" => {
                const USAGE: &str = "filter <category|all> <format|all>";
                let category = filter_axis(&word(words.next(), USAGE)?)?;
                let format = match words.next() {
                    Some(raw) => filter_axis(raw)?,
                    None => None,
                };
                Command::Filter(MaterialFilter { category, format })
            }
            "refresh" => Command::Refresh,
            "favorites" => Command::Favorites,

            "add-material" => Command::AddMaterial,
            "submit" => {
                const USAGE: &str = "submit <format> <category> <url|@file> <title>";
                let format = word(words.next(), USAGE)?;
                let category = word(words.next(), USAGE)?;
                let source = word(words.next(), USAGE)?;
                Command::Submit {
                    format: format.parse().ok(),
                    category: category.parse().ok(),
                    source,
                    title: rest(line, 4),
                }
            }
            "manage-materials" => Command::ManageMaterials,
            "edit" => Command::Edit(word(words.next(), "edit <material id>")?),
            "delete" => Command::Delete(word(words.next(), "delete <material id>")?),

            "manage-courses" => Command::ManageCourses,
            "new-course" => Command::NewCourse,
            "edit-course" => Command::EditCourse(word(words.next(), "edit-course <code>")?),
            "delete-course" => Command::DeleteCourse(word(words.next(), "delete-course <code>")?),
            "add-year" => Command::AddYear,
            "remove-year" => Command::RemoveYear(number(words.next(), "remove-year <year>")?),
            "add-semester" => Command::AddSemester(number(words.next(), "add-semester <year>")?),
            "remove-semester" => {
                const USAGE: &str = "remove-semester <year> <semester>";
                Command::RemoveSemester(number(words.next(), USAGE)?, number(words.next(), USAGE)?)
            }
            "add-subject" => {
                const USAGE: &str = "add-subject <year> <semester> <name>";
                let year = number(words.next(), USAGE)?;
                let semester = number(words.next(), USAGE)?;
                let subject = rest(line, 3);
                if subject.is_empty() {
                    return Err(CommandError::Usage(USAGE));
                }
                Command::AddSubject(year, semester, subject)
            }
            "remove-subject" => {
                const USAGE: &str = "remove-subject <year> <semester> <position>";
                Command::RemoveSubject(
                    number(words.next(), USAGE)?,
                    number(words.next(), USAGE)?,
                    number(words.next(), USAGE)?,
                )
            }
            "rename-subject" => {
                const USAGE: &str = "rename-subject <year> <semester> <position> <name>";
                let year = number(words.next(), USAGE)?;
                let semester = number(words.next(), USAGE)?;
                let position = number(words.next(), USAGE)?;
                let subject = rest(line, 4);
                if subject.is_empty() {
                    return Err(CommandError::Usage(USAGE));
                }
                Command::RenameSubject(year, semester, position, subject)
            }

            "set" => {
                const USAGE: &str = "set <field> <value>";
                let field = word(words.next(), USAGE)?.parse()?;
                Command::Set(field, rest(line, 2))
            }
            "save" | "update" => Command::Save,
            "confirm" | "yes" => Command::Confirm,
            "cancel" | "no" => Command::Cancel,

            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

pub const HELP: &str = "\
Browsing
  home                         back to the course list
  course <code>                open a course
  year <n> | semester <n>      pick a year or semester
  subject <name>               open a subject's materials
  back                         one level up (or close the open panel)
  search <text>                search subjects (empty text clears)
  pick <n>                     open the n-th search result
  filter <category|all> <format|all>
  refresh                      reload the material list
  favorites                    list your favorite materials
Materials (admin)
  add-material                 open the add material form
  submit <format> <category> <url|@file> <title>
  manage-materials             list materials for the selected subject
  edit <id>                    edit a material, then 'set' fields and 'save'
  delete <id>                  delete a material (asks to confirm)
Courses (admin)
  manage-courses | new-course | edit-course <code> | delete-course <code>
  add-year | remove-year <y> | add-semester <y> | remove-semester <y> <s>
  add-subject <y> <s> <name> | remove-subject <y> <s> <n>
  rename-subject <y> <s> <n> <name>
Forms
  set <field> <value>          title, format, category, url, code, description, duration
  save (or update) | confirm | cancel
Session
  logout | quit";

pub const LOGIN_HELP: &str = "\
  login student <email> <password>
  login admin <username> <password>
  signup <email> <password> <full name>
  quit";
