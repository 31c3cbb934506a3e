#![allow(dead_code)]

use async_trait::async_trait;
use axum::http::StatusCode;
use learn_portal::{
    AppConfig, AppState, SessionHub,
    api::{ApiState, LearningApi},
    error::{ApiError, ApiResult},
    models::*,
    session::Session,
    views::CourseForm,
};
use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

// --- STUB BACKEND ---

/// Canned backend. Every call is recorded as `name` (plus the bearer token the
/// session carried) so tests can assert what was, and was not, sent.
#[derive(Default)]
pub struct StubApi {
    pub calls: Mutex<Vec<String>>,
    pub tokens: Mutex<Vec<Option<String>>>,
    pub fail: HashSet<&'static str>,

    pub login_response: LoginResponse,
    pub courses: Vec<Course>,
    pub modules: Vec<Module>,
    pub enrollments: Vec<Enrollment>,
    pub reviews: Vec<Review>,
    pub assessment: Assessment,
    pub badges: Vec<Badge>,
    pub certificate: Certificate,
    pub course_completed: bool,
    pub reorders: Mutex<Vec<Vec<ModuleOrder>>>,
    pub created_course: Mutex<Option<CourseForm>>,
}

impl StubApi {
    fn hit(&self, name: &'static str, session: &Session) -> ApiResult<()> {
        self.calls.lock().unwrap().push(name.to_string());
        self.tokens
            .lock()
            .unwrap()
            .push(session.token().map(str::to_string));
        if self.fail.contains(name) {
            return Err(ApiError::Status {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: format!("{name} exploded"),
            });
        }
        Ok(())
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called(&self, name: &str) -> bool {
        self.calls().iter().any(|c| c == name)
    }
}

#[async_trait]
impl LearningApi for StubApi {
    async fn login(&self, _req: &LoginRequest) -> ApiResult<LoginResponse> {
        self.hit("login", &Session::anonymous())?;
        Ok(self.login_response.clone())
    }
    async fn register(&self, _req: &RegisterUserRequest) -> ApiResult<()> {
        self.hit("register", &Session::anonymous())
    }
    async fn get_profile(&self, session: &Session) -> ApiResult<UserProfile> {
        self.hit("get_profile", session)?;
        Ok(UserProfile::default())
    }
    async fn update_profile(&self, session: &Session, req: &UpdateProfileRequest) -> ApiResult<UserProfile> {
        self.hit("update_profile", session)?;
        Ok(UserProfile {
            full_name: req.full_name.clone().unwrap_or_default(),
            bio: req.bio.clone().unwrap_or_default(),
            ..Default::default()
        })
    }
    async fn get_badges(&self, session: &Session, _user_id: &str) -> ApiResult<Vec<Badge>> {
        self.hit("get_badges", session)?;
        Ok(self.badges.clone())
    }
    async fn list_courses(&self, session: &Session) -> ApiResult<Vec<Course>> {
        self.hit("list_courses", session)?;
        Ok(self.courses.clone())
    }
    async fn search_courses(&self, session: &Session, _filters: &CourseSearch) -> ApiResult<Vec<Course>> {
        self.hit("search_courses", session)?;
        Ok(self.courses.clone())
    }
    async fn recommendations(&self, session: &Session, _current: Option<&str>) -> ApiResult<Vec<RecommendedCourse>> {
        self.hit("recommendations", session)?;
        Ok(vec![])
    }
    async fn get_course(&self, session: &Session, course_id: &str) -> ApiResult<Course> {
        self.hit("get_course", session)?;
        self.courses
            .iter()
            .find(|c| c.id == course_id)
            .cloned()
            .ok_or(ApiError::Status {
                status: StatusCode::NOT_FOUND,
                body: String::new(),
            })
    }
    async fn create_course(&self, session: &Session, form: CourseForm) -> ApiResult<()> {
        self.hit("create_course", session)?;
        *self.created_course.lock().unwrap() = Some(form);
        Ok(())
    }
    async fn list_enrollments(&self, session: &Session) -> ApiResult<Vec<Enrollment>> {
        self.hit("list_enrollments", session)?;
        Ok(self.enrollments.clone())
    }
    async fn enroll(&self, session: &Session, _course_id: &str) -> ApiResult<()> {
        self.hit("enroll", session)
    }
    async fn get_modules(&self, session: &Session, _course_id: &str) -> ApiResult<Vec<Module>> {
        self.hit("get_modules", session)?;
        Ok(self.modules.clone())
    }
    async fn create_module(&self, session: &Session, _course_id: &str, req: &CreateModuleRequest) -> ApiResult<Module> {
        self.hit("create_module", session)?;
        Ok(Module {
            id: "new-module".into(),
            title: req.title.clone(),
            description: req.description.clone(),
            order: req.order,
            content_items: vec![],
        })
    }
    async fn delete_module(&self, session: &Session, _course_id: &str, _module_id: &str) -> ApiResult<()> {
        self.hit("delete_module", session)
    }
    async fn reorder_modules(&self, session: &Session, _course_id: &str, orders: &[ModuleOrder]) -> ApiResult<()> {
        self.hit("reorder_modules", session)?;
        self.reorders.lock().unwrap().push(orders.to_vec());
        Ok(())
    }
    async fn create_content(&self, session: &Session, _course_id: &str, _module_id: &str, req: &CreateContentRequest) -> ApiResult<ContentItem> {
        self.hit("create_content", session)?;
        Ok(ContentItem {
            id: "new-item".into(),
            kind: req.kind,
            title: req.title.clone(),
            content: req.content.clone(),
            order: req.order,
            completed: false,
        })
    }
    async fn delete_content(&self, session: &Session, _course_id: &str, _module_id: &str, _content_id: &str) -> ApiResult<()> {
        self.hit("delete_content", session)
    }
    async fn complete_content(&self, session: &Session, _course_id: &str, _content_id: &str) -> ApiResult<()> {
        self.hit("complete_content", session)
    }
    async fn list_assessments(&self, session: &Session, _course_id: &str) -> ApiResult<Vec<Assessment>> {
        self.hit("list_assessments", session)?;
        Ok(vec![self.assessment.clone()])
    }
    async fn get_assessment(&self, session: &Session, _course_id: &str, _assessment_id: &str) -> ApiResult<Assessment> {
        self.hit("get_assessment", session)?;
        Ok(self.assessment.clone())
    }
    async fn create_assessment(&self, session: &Session, _course_id: &str, req: &CreateAssessmentRequest) -> ApiResult<Assessment> {
        self.hit("create_assessment", session)?;
        Ok(Assessment {
            id: "new-assessment".into(),
            title: req.title.clone(),
            total_points: req.total_points,
            ..Default::default()
        })
    }
    async fn delete_assessment(&self, session: &Session, _course_id: &str, _assessment_id: &str) -> ApiResult<()> {
        self.hit("delete_assessment", session)
    }
    async fn submit_assessment(&self, session: &Session, _course_id: &str, _assessment_id: &str, _req: &SubmitAssessmentRequest) -> ApiResult<()> {
        self.hit("submit_assessment", session)
    }
    async fn grade_submission(&self, session: &Session, _course_id: &str, _assessment_id: &str, _submission_id: &str, _req: &GradeSubmissionRequest) -> ApiResult<Assessment> {
        self.hit("grade_submission", session)?;
        Ok(self.assessment.clone())
    }
    async fn list_threads(&self, session: &Session, _course_id: &str) -> ApiResult<Vec<DiscussionThread>> {
        self.hit("list_threads", session)?;
        Ok(vec![])
    }
    async fn create_thread(&self, session: &Session, _course_id: &str, req: &CreateThreadRequest) -> ApiResult<DiscussionThread> {
        self.hit("create_thread", session)?;
        Ok(DiscussionThread {
            id: "t1".into(),
            title: req.title.clone(),
            content: req.content.clone(),
            ..Default::default()
        })
    }
    async fn add_reply(&self, session: &Session, _course_id: &str, _thread_id: &str, req: &CreateReplyRequest) -> ApiResult<Reply> {
        self.hit("add_reply", session)?;
        Ok(Reply {
            id: "r1".into(),
            content: req.content.clone(),
            ..Default::default()
        })
    }
    async fn list_reviews(&self, session: &Session, _course_id: &str) -> ApiResult<Vec<Review>> {
        self.hit("list_reviews", session)?;
        Ok(self.reviews.clone())
    }
    async fn create_review(&self, session: &Session, _course_id: &str, req: &CreateReviewRequest) -> ApiResult<Review> {
        self.hit("create_review", session)?;
        Ok(Review {
            id: "rev".into(),
            rating: req.rating,
            comment: req.comment.clone(),
            ..Default::default()
        })
    }
    async fn get_progress(&self, session: &Session, _course_id: &str, _student_id: Option<&str>) -> ApiResult<ProgressData> {
        self.hit("get_progress", session)?;
        Ok(ProgressData::default())
    }
    async fn get_analytics(&self, session: &Session, _course_id: &str, _range: TimeRange) -> ApiResult<AnalyticsData> {
        self.hit("get_analytics", session)?;
        Ok(AnalyticsData::default())
    }
    async fn check_completion(&self, session: &Session, _course_id: &str) -> ApiResult<()> {
        self.hit("check_completion", session)?;
        if self.course_completed {
            Ok(())
        } else {
            Err(ApiError::Status {
                status: StatusCode::NOT_FOUND,
                body: String::new(),
            })
        }
    }
    async fn get_certificate(&self, session: &Session, _course_id: &str) -> ApiResult<Certificate> {
        self.hit("get_certificate", session)?;
        Ok(self.certificate.clone())
    }
}

// --- STATE SCAFFOLDING ---

pub fn state_with(api: Arc<StubApi>) -> AppState {
    AppState {
        api: api as ApiState,
        config: AppConfig::default(),
        sessions: SessionHub::default(),
    }
}

pub const STUDENT_COOKIE: &str = "token=student-token; role=student; user_id=s1";
pub const INSTRUCTOR_COOKIE: &str = "token=instructor-token; role=instructor; user_id=i1";

pub fn item(id: &str, order: i32) -> ContentItem {
    ContentItem {
        id: id.into(),
        title: id.to_uppercase(),
        order,
        ..Default::default()
    }
}

pub fn module(id: &str, order: i32, items: Vec<ContentItem>) -> Module {
    Module {
        id: id.into(),
        title: format!("Module {id}"),
        order,
        content_items: items,
        ..Default::default()
    }
}

pub fn review(rating: u8) -> Review {
    Review {
        rating,
        comment: "ok".into(),
        ..Default::default()
    }
}
