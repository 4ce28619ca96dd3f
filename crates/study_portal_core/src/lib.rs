pub mod catalog;
pub mod domain;
pub mod feed;
pub mod navigation;
pub mod ports;
pub mod validation;

pub use catalog::CourseForm;
pub use domain::{
    Course, CourseRef, CourseSemester, CourseSummary, CourseYear, Material, MaterialCategory,
    MaterialFilter, MaterialFormat, MaterialId, MaterialUpdate, NewMaterial, Role, SearchHit,
    SelectedContext, Session, Subject, UploadFile,
};
pub use feed::{Feed, Loadable, Ticket};
pub use navigation::{BrowseLevel, NavigationError, Navigator, Overlay, SelectionPath, ViewMode};
pub use ports::{
    AuthService, CatalogService, CourseAdminService, FavoritesService, MaterialService,
    PortError, PortResult,
};
pub use validation::{
    validate_course, MaterialDraft, MaterialEdit, MaterialSubmission, ValidationError,
};
