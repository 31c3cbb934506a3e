use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::{
    fetch::FetchState,
    models::{
        Assessment, Badge, Certificate, ContentItem, Course, CourseLevel, CourseSearch, CreateAssessmentRequest,
        CreateContentRequest, CreateModuleRequest, CreateReplyRequest, CreateReviewRequest,
        CreateThreadRequest, Enrollment, LoginRequest, Module, ModuleOrder, RecommendedCourse,
        RegisterUserRequest, Review, Role, SubmitAssessmentRequest,
    },
    sequencer::{ContentSequencer, Cursor},
    session::Session,
};

// --- Navigation ---

/// NavItem
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct NavItem {
    pub label: &'static str,
    pub href: &'static str,
    pub active: bool,
}

/// NavView
///
/// The navigation bar. Derived from the session on every request, so it can
/// never disagree with what the route guard decided.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NavView {
    pub items: Vec<NavItem>,
    pub authenticated: bool,
    pub role: Option<Role>,
    pub show_logout: bool,
}

impl NavView {
    pub fn for_session(session: &Session, path: &str) -> Self {
        let mut links = vec![("Home", "/"), ("Courses", "/courses")];
        if session.is_authenticated() {
            links.extend([("Dashboard", "/dashboard"), ("Profile", "/profile")]);
        } else {
            links.extend([("Login", "/login"), ("Register", "/register")]);
        }

        Self {
            items: links
                .into_iter()
                .map(|(label, href)| NavItem {
                    label,
                    href,
                    active: href == path,
                })
                .collect(),
            authenticated: session.is_authenticated(),
            role: session.role(),
            show_logout: session.is_authenticated(),
        }
    }
}

/// Page
///
/// What every page handler answers with.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub nav: NavView,
    pub path: String,
    pub state: T,
}

impl<T> Page<T> {
    pub fn new(session: &Session, path: &str, state: T) -> Self {
        Self {
            nav: NavView::for_session(session, path),
            path: path.to_string(),
            state,
        }
    }
}

// --- Validation ---

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("{0}")]
    Invalid(String),
}

fn require(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required(field));
    }
    Ok(())
}

/// Validate
///
/// The "submit disabled" rule of a form. Mutation handlers check it before any
/// backend call is made.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// LoginForm
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    /// Where the guard intercepted the user, if anywhere.
    pub from: Option<String>,
}

impl Validate for LoginForm {
    fn validate(&self) -> Result<(), ValidationError> {
        require(&self.email, "Email")?;
        require(&self.password, "Password")
    }
}

impl LoginForm {
    pub fn to_request(&self) -> LoginRequest {
        LoginRequest {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        }
    }

    /// Post-login target. Only same-site paths are honoured, and only ones that
    /// are a valid `Location` as-is.
    pub fn return_to(&self) -> &str {
        match self.from.as_deref() {
            Some(path) if is_local_path(path) => path,
            _ => "/dashboard",
        }
    }
}

// Browsers read `\` as `/`, so `/\host` is as off-site as `//host`.
fn is_local_path(path: &str) -> bool {
    path.starts_with('/')
        && !path.starts_with("//")
        && path.bytes().all(|b| b.is_ascii_graphic() && b != b'\\')
}

/// RegisterForm
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterForm {
    pub user_name: String,
    pub email: String,
    pub password: String,
    pub user_type: Option<Role>,
}

impl Validate for RegisterForm {
    fn validate(&self) -> Result<(), ValidationError> {
        require(&self.user_name, "Username")?;
        require(&self.email, "Email")?;
        require(&self.password, "Password")
    }
}

impl RegisterForm {
    pub fn to_request(&self) -> RegisterUserRequest {
        RegisterUserRequest {
            user_name: self.user_name.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            user_type: self.user_type.unwrap_or_default(),
        }
    }
}

/// Thumbnail
///
/// An uploaded image, forwarded to the backend untouched.
#[derive(Debug, Clone, Default)]
pub struct Thumbnail {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// CourseForm
///
/// Built field by field from the multipart upload of the course creation page.
#[derive(Debug, Clone, Default)]
pub struct CourseForm {
    pub title: String,
    pub description: String,
    pub level: CourseLevel,
    pub category: String,
    pub learning_outcomes: Vec<String>,
    pub tags: Vec<String>,
    pub thumbnail: Option<Thumbnail>,
}

impl CourseForm {
    /// Applies one text field. Repeated `learningOutcomes`/`tags` fields append;
    /// blank entries are dropped.
    pub fn set_text(&mut self, name: &str, value: String) -> Result<(), ValidationError> {
        match name {
            "title" => self.title = value,
            "description" => self.description = value,
            "category" => self.category = value,
            "level" => {
                self.level = CourseLevel::parse(&value)
                    .ok_or_else(|| ValidationError::Invalid(format!("Unknown level: {value}")))?
            }
            "learningOutcomes" if !value.trim().is_empty() => {
                self.learning_outcomes.push(value.trim().to_string())
            }
            "tags" if !value.trim().is_empty() => self.tags.push(value.trim().to_string()),
            // Unknown and blank fields are ignored.
            _ => {}
        }
        Ok(())
    }
}

impl Validate for CourseForm {
    fn validate(&self) -> Result<(), ValidationError> {
        require(&self.title, "Title")?;
        require(&self.description, "Description")?;
        require(&self.category, "Category")?;
        match self.thumbnail {
            Some(_) => Ok(()),
            None => Err(ValidationError::Required("Thumbnail")),
        }
    }
}

impl Validate for CreateAssessmentRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        require(&self.title, "Title")?;
        require(&self.due_date, "Due date")?;
        if self.total_points == 0 {
            return Err(ValidationError::Invalid(
                "Total points must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

impl Validate for CreateReviewRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=5).contains(&self.rating) {
            return Err(ValidationError::Invalid(
                "Please select a rating between 1 and 5".into(),
            ));
        }
        require(&self.comment, "Comment")
    }
}

impl Validate for CreateThreadRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        require(&self.title, "Title")?;
        require(&self.content, "Content")
    }
}

impl Validate for CreateReplyRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        require(&self.content, "Reply")
    }
}

impl Validate for CreateModuleRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        require(&self.title, "Module title")
    }
}

impl Validate for CreateContentRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        require(&self.title, "Content title")
    }
}

/// A submission is only accepted once every question has a non-blank answer.
pub fn validate_submission(
    assessment: &Assessment,
    submission: &SubmitAssessmentRequest,
) -> Result<(), ValidationError> {
    let unanswered = assessment.questions.iter().any(|question| {
        !submission
            .answers
            .iter()
            .any(|a| a.question_id == question.id && !a.answer.trim().is_empty())
    });
    if unanswered {
        return Err(ValidationError::Invalid(
            "Please answer all questions before submitting".into(),
        ));
    }
    Ok(())
}

/// New modules go to the end of the course.
pub fn next_module_order(modules: &[Module]) -> i32 {
    modules.len() as i32 + 1
}

/// New content goes to the end of its module; `None` if the module is unknown.
pub fn next_content_order(modules: &[Module], module_id: &str) -> Option<i32> {
    modules
        .iter()
        .find(|m| m.id == module_id)
        .map(|m| m.content_items.len() as i32)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}

/// reorder_plan
///
/// Swaps the module with its neighbour at `order - 1` (up) or `order + 1`
/// (down). `None` when there is no such neighbour, in which case nothing is sent.
pub fn reorder_plan(
    modules: &[Module],
    module_id: &str,
    direction: MoveDirection,
) -> Option<Vec<ModuleOrder>> {
    let module = modules.iter().find(|m| m.id == module_id)?;
    let target = match direction {
        MoveDirection::Up => module.order - 1,
        MoveDirection::Down => module.order + 1,
    };
    let neighbour = modules.iter().find(|m| m.order == target)?;
    Some(vec![
        ModuleOrder {
            id: module.id.clone(),
            order: neighbour.order,
        },
        ModuleOrder {
            id: neighbour.id.clone(),
            order: module.order,
        },
    ])
}

// --- Derived view logic ---

pub fn average_rating(reviews: &[Review]) -> f64 {
    if reviews.is_empty() {
        return 0.0;
    }
    let sum: f64 = reviews.iter().map(|r| f64::from(r.rating)).sum();
    sum / reviews.len() as f64
}

fn is_any(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.eq_ignore_ascii_case("all")
}

/// Narrows an already fetched catalog with the search filters.
pub fn filter_catalog(courses: Vec<Course>, filters: &CourseSearch) -> Vec<Course> {
    let query = filters.query.trim().to_lowercase();
    courses
        .into_iter()
        .filter(|course| {
            query.is_empty()
                || course.title.to_lowercase().contains(&query)
                || course.description.to_lowercase().contains(&query)
                || course
                    .instructor_name()
                    .is_some_and(|name| name.to_lowercase().contains(&query))
        })
        .filter(|course| {
            is_any(&filters.level) || course.level.as_str().eq_ignore_ascii_case(filters.level.trim())
        })
        .filter(|course| {
            is_any(&filters.category)
                || course
                    .category
                    .as_deref()
                    .is_some_and(|c| c.eq_ignore_ascii_case(filters.category.trim()))
        })
        .filter(|course| {
            is_any(&filters.duration)
                || course
                    .duration
                    .as_deref()
                    .is_some_and(|d| d.eq_ignore_ascii_case(filters.duration.trim()))
        })
        .filter(|course| filters.min_price.is_none_or(|min| course.price >= min))
        .filter(|course| filters.max_price.is_none_or(|max| course.price <= max))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationFilter {
    #[default]
    All,
    Similar,
    Popular,
    New,
}

impl RecommendationFilter {
    pub fn matches(&self, course: &RecommendedCourse) -> bool {
        match self {
            RecommendationFilter::All => true,
            RecommendationFilter::Similar => course.similarity_score.is_some_and(|s| s > 0.7),
            RecommendationFilter::Popular => course.enrolled_students > 100,
            RecommendationFilter::New => course.enrolled_students < 50,
        }
    }

    pub fn apply(&self, courses: Vec<RecommendedCourse>) -> Vec<RecommendedCourse> {
        courses.into_iter().filter(|c| self.matches(c)).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeFilter {
    #[default]
    All,
    Unlocked,
    Locked,
}

impl BadgeFilter {
    pub fn apply(&self, badges: Vec<Badge>) -> Vec<Badge> {
        badges
            .into_iter()
            .filter(|badge| match self {
                BadgeFilter::All => true,
                BadgeFilter::Unlocked => badge.unlocked,
                BadgeFilter::Locked => !badge.unlocked,
            })
            .collect()
    }
}

/// EnrolledCourseView
///
/// One dashboard card: an enrollment joined with its course.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrolledCourseView {
    pub course_id: String,
    pub title: String,
    pub description: String,
    pub instructor: Option<String>,
    pub thumbnail: Option<String>,
    pub progress: f64,
    pub enrollment_date: String,
    pub enrollment_status: String,
}

pub const UNKNOWN_COURSE: &str = "Unknown Course";

pub fn join_enrollments(enrollments: Vec<Enrollment>, courses: &[Course]) -> Vec<EnrolledCourseView> {
    enrollments
        .into_iter()
        .map(|enrollment| {
            let course = courses.iter().find(|c| c.id == enrollment.course_id);
            EnrolledCourseView {
                title: course
                    .map(|c| c.title.clone())
                    .unwrap_or_else(|| UNKNOWN_COURSE.to_string()),
                description: course.map(|c| c.description.clone()).unwrap_or_default(),
                instructor: course.and_then(|c| c.instructor_name().map(str::to_string)),
                thumbnail: course.and_then(|c| c.thumbnail.clone()),
                progress: enrollment.progress.clamp(0.0, 100.0),
                enrollment_date: format_date(&enrollment.enrollment_date),
                enrollment_status: enrollment.enrollment_status,
                course_id: enrollment.course_id,
            }
        })
        .collect()
}

/// `Certificate-<title, whitespace runs dashed>-<id>.pdf`
pub fn certificate_file_name(course_title: &str, certificate_id: &str) -> String {
    let title = course_title.split_whitespace().collect::<Vec<_>>().join("-");
    format!("Certificate-{title}-{certificate_id}.pdf")
}

/// Renders backend timestamps as "March 5, 2024". Unparseable input is returned as-is.
pub fn format_date(raw: &str) -> String {
    const FORMAT: &str = "%B %-d, %Y";
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format(FORMAT).to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.format(FORMAT).to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format(FORMAT).to_string();
    }
    raw.to_string()
}

// --- View states ---

/// LearnView
///
/// The learn page: the item under the cursor plus the cursors the previous and
/// next buttons link to (`None` renders the button disabled).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnView {
    pub course_id: String,
    pub cursor: Cursor,
    pub module_title: String,
    pub item: ContentItem,
    pub modules: Vec<Module>,
    pub previous: Option<Cursor>,
    pub next: Option<Cursor>,
    pub is_at_start: bool,
    pub is_at_end: bool,
    pub progress: f64,
}

impl LearnView {
    pub fn from_sequencer(course_id: &str, sequencer: &ContentSequencer) -> Self {
        let step = |forward: bool| {
            let mut lookahead = sequencer.clone();
            let moved = if forward { lookahead.next() } else { lookahead.previous() };
            moved.then(|| lookahead.cursor())
        };
        Self {
            course_id: course_id.to_string(),
            cursor: sequencer.cursor(),
            module_title: sequencer.current_module().title.clone(),
            item: sequencer.current().clone(),
            modules: sequencer.modules().to_vec(),
            previous: step(false),
            next: step(true),
            is_at_start: sequencer.is_at_start(),
            is_at_end: sequencer.is_at_end(),
            progress: sequencer.progress(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionView {
    pub content_id: String,
    pub completed: bool,
    pub progress: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogView {
    pub filters: CourseSearch,
    pub courses: FetchState<Vec<Course>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetailView {
    pub course: FetchState<Course>,
    pub average_rating: FetchState<f64>,
    pub can_manage: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewsView {
    pub reviews: FetchState<Vec<Review>>,
    pub average_rating: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationsView {
    pub filter: RecommendationFilter,
    pub courses: FetchState<Vec<RecommendedCourse>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BadgesView {
    pub filter: BadgeFilter,
    pub badges: FetchState<Vec<Badge>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateView {
    pub certificate: Certificate,
    pub completion_date: String,
    pub file_name: String,
}

impl From<Certificate> for CertificateView {
    fn from(certificate: Certificate) -> Self {
        Self {
            completion_date: format_date(&certificate.completion_date),
            file_name: certificate_file_name(&certificate.course_title, &certificate.certificate_id),
            certificate,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthView {
    pub from: Option<String>,
    pub result: FetchState<()>,
}
