use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    client::ApiClient,
    error::{ApiError, ApiResult},
    models::{
        Assessment, Badge, Certificate, ContentItem, Course, CourseSearch, CreateAssessmentRequest,
        CreateContentRequest, CreateModuleRequest, CreateReplyRequest, CreateReviewRequest,
        CreateThreadRequest, DiscussionThread, EnrollRequest, Enrollment, GradeSubmissionRequest,
        LoginRequest, LoginResponse, Module, ModuleOrder, ProgressData, RecommendedCourse,
        RegisterUserRequest, Reply, Review, SubmitAssessmentRequest, TimeRange, UpdateProfileRequest,
        UserProfile, AnalyticsData,
    },
    session::Session,
    views::CourseForm,
};

/// LearningApi
///
/// Every backend operation a view can trigger. Handlers only see this trait, so
/// the HTTP implementation can be swapped for a stub in tests.
///
/// Every method takes the caller's `Session`; whether it carries a token is the
/// client's business, not the call site's.
#[async_trait]
pub trait LearningApi: Send + Sync {
    // --- Identity ---
    async fn login(&self, req: &LoginRequest) -> ApiResult<LoginResponse>;
    async fn register(&self, req: &RegisterUserRequest) -> ApiResult<()>;
    async fn get_profile(&self, session: &Session) -> ApiResult<UserProfile>;
    async fn update_profile(&self, session: &Session, req: &UpdateProfileRequest) -> ApiResult<UserProfile>;
    async fn get_badges(&self, session: &Session, user_id: &str) -> ApiResult<Vec<Badge>>;

    // --- Catalog ---
    async fn list_courses(&self, session: &Session) -> ApiResult<Vec<Course>>;
    async fn search_courses(&self, session: &Session, filters: &CourseSearch) -> ApiResult<Vec<Course>>;
    async fn recommendations(&self, session: &Session, current_course_id: Option<&str>) -> ApiResult<Vec<RecommendedCourse>>;
    async fn get_course(&self, session: &Session, course_id: &str) -> ApiResult<Course>;
    // Multipart: the thumbnail travels as a file part.
    async fn create_course(&self, session: &Session, form: CourseForm) -> ApiResult<()>;

    // --- Enrollment ---
    async fn list_enrollments(&self, session: &Session) -> ApiResult<Vec<Enrollment>>;
    async fn enroll(&self, session: &Session, course_id: &str) -> ApiResult<()>;

    // --- Modules & Content ---
    async fn get_modules(&self, session: &Session, course_id: &str) -> ApiResult<Vec<Module>>;
    async fn create_module(&self, session: &Session, course_id: &str, req: &CreateModuleRequest) -> ApiResult<Module>;
    async fn delete_module(&self, session: &Session, course_id: &str, module_id: &str) -> ApiResult<()>;
    async fn reorder_modules(&self, session: &Session, course_id: &str, orders: &[ModuleOrder]) -> ApiResult<()>;
    async fn create_content(&self, session: &Session, course_id: &str, module_id: &str, req: &CreateContentRequest) -> ApiResult<ContentItem>;
    async fn delete_content(&self, session: &Session, course_id: &str, module_id: &str, content_id: &str) -> ApiResult<()>;
    async fn complete_content(&self, session: &Session, course_id: &str, content_id: &str) -> ApiResult<()>;

    // --- Assessments ---
    async fn list_assessments(&self, session: &Session, course_id: &str) -> ApiResult<Vec<Assessment>>;
    async fn get_assessment(&self, session: &Session, course_id: &str, assessment_id: &str) -> ApiResult<Assessment>;
    async fn create_assessment(&self, session: &Session, course_id: &str, req: &CreateAssessmentRequest) -> ApiResult<Assessment>;
    async fn delete_assessment(&self, session: &Session, course_id: &str, assessment_id: &str) -> ApiResult<()>;
    async fn submit_assessment(&self, session: &Session, course_id: &str, assessment_id: &str, req: &SubmitAssessmentRequest) -> ApiResult<()>;
    // Returns the refreshed assessment, submissions included.
    async fn grade_submission(&self, session: &Session, course_id: &str, assessment_id: &str, submission_id: &str, req: &GradeSubmissionRequest) -> ApiResult<Assessment>;

    // --- Discussions & Reviews ---
    async fn list_threads(&self, session: &Session, course_id: &str) -> ApiResult<Vec<DiscussionThread>>;
    async fn create_thread(&self, session: &Session, course_id: &str, req: &CreateThreadRequest) -> ApiResult<DiscussionThread>;
    async fn add_reply(&self, session: &Session, course_id: &str, thread_id: &str, req: &CreateReplyRequest) -> ApiResult<Reply>;
    async fn list_reviews(&self, session: &Session, course_id: &str) -> ApiResult<Vec<Review>>;
    async fn create_review(&self, session: &Session, course_id: &str, req: &CreateReviewRequest) -> ApiResult<Review>;

    // --- Progress, Analytics, Certificates ---
    async fn get_progress(&self, session: &Session, course_id: &str, student_id: Option<&str>) -> ApiResult<ProgressData>;
    async fn get_analytics(&self, session: &Session, course_id: &str, range: TimeRange) -> ApiResult<AnalyticsData>;
    // Succeeds only when the learner has completed the course.
    async fn check_completion(&self, session: &Session, course_id: &str) -> ApiResult<()>;
    async fn get_certificate(&self, session: &Session, course_id: &str) -> ApiResult<Certificate>;
}

/// ApiState
///
/// The concrete type used to share the API access across the application state.
pub type ApiState = Arc<dyn LearningApi>;

// --- Response envelopes ---

#[derive(Deserialize)]
struct CoursesEnvelope {
    #[serde(default)]
    courses: Vec<Course>,
}

#[derive(Deserialize)]
struct RecommendationsEnvelope {
    courses: Vec<RecommendedCourse>,
}

#[derive(Deserialize)]
struct ModulesEnvelope {
    #[serde(default)]
    modules: Vec<Module>,
}

#[derive(Deserialize)]
struct EnrollmentsEnvelope {
    #[serde(default)]
    enrollments: Vec<Enrollment>,
}

#[derive(Deserialize)]
struct ReviewsEnvelope {
    reviews: Vec<Review>,
}

#[derive(Deserialize)]
struct ReviewEnvelope {
    review: Review,
}

#[derive(Deserialize)]
struct ThreadsEnvelope {
    threads: Vec<DiscussionThread>,
}

#[derive(Deserialize)]
struct BadgesEnvelope {
    badges: Vec<Badge>,
}

/// Percent-encodes one path segment so ids can never change the route shape.
pub fn seg(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for byte in id.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

fn course_path(course_id: &str) -> String {
    format!("/api/Courses/{}", seg(course_id))
}

/// HttpLearningApi
///
/// The production implementation: thin path mapping over `ApiClient`.
#[derive(Clone, Debug)]
pub struct HttpLearningApi {
    client: ApiClient,
}

impl HttpLearningApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}

#[async_trait]
impl LearningApi for HttpLearningApi {
    async fn login(&self, req: &LoginRequest) -> ApiResult<LoginResponse> {
        let response: LoginResponse = self
            .client
            .post_json(&Session::anonymous(), "/api/Users/login", req)
            .await?;
        if response.token.trim().is_empty() {
            return Err(ApiError::Decode("login response carried no token".into()));
        }
        Ok(response)
    }

    async fn register(&self, req: &RegisterUserRequest) -> ApiResult<()> {
        self.client
            .post_json_unit(&Session::anonymous(), "/api/Users", req)
            .await
    }

    async fn get_profile(&self, session: &Session) -> ApiResult<UserProfile> {
        self.client.get_json(session, "/api/Users/profile").await
    }

    async fn update_profile(&self, session: &Session, req: &UpdateProfileRequest) -> ApiResult<UserProfile> {
        self.client.put_json(session, "/api/Users/profile", req).await
    }

    async fn get_badges(&self, session: &Session, user_id: &str) -> ApiResult<Vec<Badge>> {
        let path = format!("/api/Users/{}/badges", seg(user_id));
        let envelope: BadgesEnvelope = self.client.get_json(session, &path).await?;
        Ok(envelope.badges)
    }

    async fn list_courses(&self, session: &Session) -> ApiResult<Vec<Course>> {
        let envelope: CoursesEnvelope = self.client.get_json(session, "/api/Courses").await?;
        Ok(envelope.courses)
    }

    async fn search_courses(&self, session: &Session, filters: &CourseSearch) -> ApiResult<Vec<Course>> {
        let envelope: CoursesEnvelope = self
            .client
            .get_json_with_query(session, "/api/Courses/search", &filters.to_query_pairs())
            .await?;
        Ok(envelope.courses)
    }

    async fn recommendations(&self, session: &Session, current_course_id: Option<&str>) -> ApiResult<Vec<RecommendedCourse>> {
        let query: Vec<(&str, &str)> = current_course_id
            .map(|id| vec![("currentCourseId", id)])
            .unwrap_or_default();
        let envelope: RecommendationsEnvelope = self
            .client
            .get_json_with_query(session, "/api/Courses/recommendations", &query)
            .await?;
        Ok(envelope.courses)
    }

    async fn get_course(&self, session: &Session, course_id: &str) -> ApiResult<Course> {
        self.client.get_json(session, &course_path(course_id)).await
    }

    async fn create_course(&self, session: &Session, form: CourseForm) -> ApiResult<()> {
        let mut multipart = Form::new()
            .text("title", form.title)
            .text("description", form.description)
            .text("level", form.level.as_str().to_string())
            .text("category", form.category)
            .text("learningOutcomes", serde_json::to_string(&form.learning_outcomes)?)
            .text("tags", serde_json::to_string(&form.tags)?);

        if let Some(thumbnail) = form.thumbnail {
            let mut part = Part::bytes(thumbnail.bytes).file_name(thumbnail.file_name);
            if let Some(content_type) = thumbnail.content_type {
                part = part
                    .mime_str(&content_type)
                    .map_err(|e| ApiError::Decode(format!("invalid thumbnail type: {e}")))?;
            }
            multipart = multipart.part("thumbnail", part);
        }

        self.client
            .post_multipart(session, "/api/Courses", multipart)
            .await
    }

    async fn list_enrollments(&self, session: &Session) -> ApiResult<Vec<Enrollment>> {
        let envelope: EnrollmentsEnvelope = self.client.get_json(session, "/api/Enrollments").await?;
        Ok(envelope.enrollments)
    }

    async fn enroll(&self, session: &Session, course_id: &str) -> ApiResult<()> {
        let body = EnrollRequest {
            course_id: course_id.to_string(),
        };
        self.client
            .post_json_unit(session, "/api/Enrollments", &body)
            .await
    }

    async fn get_modules(&self, session: &Session, course_id: &str) -> ApiResult<Vec<Module>> {
        let path = format!("{}/modules", course_path(course_id));
        let envelope: ModulesEnvelope = self.client.get_json(session, &path).await?;
        Ok(envelope.modules)
    }

    async fn create_module(&self, session: &Session, course_id: &str, req: &CreateModuleRequest) -> ApiResult<Module> {
        let path = format!("{}/modules", course_path(course_id));
        self.client.post_json(session, &path, req).await
    }

    async fn delete_module(&self, session: &Session, course_id: &str, module_id: &str) -> ApiResult<()> {
        let path = format!("{}/modules/{}", course_path(course_id), seg(module_id));
        self.client.delete(session, &path).await
    }

    async fn reorder_modules(&self, session: &Session, course_id: &str, orders: &[ModuleOrder]) -> ApiResult<()> {
        let path = format!("{}/modules/reorder", course_path(course_id));
        self.client.post_json_unit(session, &path, orders).await
    }

    async fn create_content(&self, session: &Session, course_id: &str, module_id: &str, req: &CreateContentRequest) -> ApiResult<ContentItem> {
        let path = format!("{}/modules/{}/content", course_path(course_id), seg(module_id));
        self.client.post_json(session, &path, req).await
    }

    async fn delete_content(&self, session: &Session, course_id: &str, module_id: &str, content_id: &str) -> ApiResult<()> {
        let path = format!(
            "{}/modules/{}/content/{}",
            course_path(course_id),
            seg(module_id),
            seg(content_id)
        );
        self.client.delete(session, &path).await
    }

    async fn complete_content(&self, session: &Session, course_id: &str, content_id: &str) -> ApiResult<()> {
        let path = format!("{}/content/{}/complete", course_path(course_id), seg(content_id));
        self.client.post_empty(session, &path).await
    }

    async fn list_assessments(&self, session: &Session, course_id: &str) -> ApiResult<Vec<Assessment>> {
        let path = format!("{}/assessments", course_path(course_id));
        self.client.get_json(session, &path).await
    }

    async fn get_assessment(&self, session: &Session, course_id: &str, assessment_id: &str) -> ApiResult<Assessment> {
        let path = format!("{}/assessments/{}", course_path(course_id), seg(assessment_id));
        self.client.get_json(session, &path).await
    }

    async fn create_assessment(&self, session: &Session, course_id: &str, req: &CreateAssessmentRequest) -> ApiResult<Assessment> {
        let path = format!("{}/assessments", course_path(course_id));
        self.client.post_json(session, &path, req).await
    }

    async fn delete_assessment(&self, session: &Session, course_id: &str, assessment_id: &str) -> ApiResult<()> {
        let path = format!("{}/assessments/{}", course_path(course_id), seg(assessment_id));
        self.client.delete(session, &path).await
    }

    async fn submit_assessment(&self, session: &Session, course_id: &str, assessment_id: &str, req: &SubmitAssessmentRequest) -> ApiResult<()> {
        let path = format!("{}/assessments/{}/submit", course_path(course_id), seg(assessment_id));
        self.client.post_json_unit(session, &path, req).await
    }

    async fn grade_submission(&self, session: &Session, course_id: &str, assessment_id: &str, submission_id: &str, req: &GradeSubmissionRequest) -> ApiResult<Assessment> {
        let path = format!(
            "{}/assessments/{}/grade/{}",
            course_path(course_id),
            seg(assessment_id),
            seg(submission_id)
        );
        self.client.post_json(session, &path, req).await
    }

    async fn list_threads(&self, session: &Session, course_id: &str) -> ApiResult<Vec<DiscussionThread>> {
        let path = format!("{}/discussions", course_path(course_id));
        let envelope: ThreadsEnvelope = self.client.get_json(session, &path).await?;
        Ok(envelope.threads)
    }

    async fn create_thread(&self, session: &Session, course_id: &str, req: &CreateThreadRequest) -> ApiResult<DiscussionThread> {
        let path = format!("{}/discussions", course_path(course_id));
        self.client.post_json(session, &path, req).await
    }

    async fn add_reply(&self, session: &Session, course_id: &str, thread_id: &str, req: &CreateReplyRequest) -> ApiResult<Reply> {
        let path = format!("{}/discussions/{}/replies", course_path(course_id), seg(thread_id));
        self.client.post_json(session, &path, req).await
    }

    async fn list_reviews(&self, session: &Session, course_id: &str) -> ApiResult<Vec<Review>> {
        let path = format!("{}/reviews", course_path(course_id));
        let envelope: ReviewsEnvelope = self.client.get_json(session, &path).await?;
        Ok(envelope.reviews)
    }

    async fn create_review(&self, session: &Session, course_id: &str, req: &CreateReviewRequest) -> ApiResult<Review> {
        let path = format!("{}/reviews", course_path(course_id));
        let envelope: ReviewEnvelope = self.client.post_json(session, &path, req).await?;
        Ok(envelope.review)
    }

    async fn get_progress(&self, session: &Session, course_id: &str, student_id: Option<&str>) -> ApiResult<ProgressData> {
        let path = match student_id {
            Some(student) => format!("{}/progress/{}", course_path(course_id), seg(student)),
            None => format!("{}/progress", course_path(course_id)),
        };
        self.client.get_json(session, &path).await
    }

    async fn get_analytics(&self, session: &Session, course_id: &str, range: TimeRange) -> ApiResult<AnalyticsData> {
        let path = format!("{}/analytics", course_path(course_id));
        self.client
            .get_json_with_query(session, &path, &[("timeRange", range.as_str())])
            .await
    }

    async fn check_completion(&self, session: &Session, course_id: &str) -> ApiResult<()> {
        let path = format!("{}/completion", course_path(course_id));
        self.client.check(session, &path).await
    }

    async fn get_certificate(&self, session: &Session, course_id: &str) -> ApiResult<Certificate> {
        let path = format!("{}/certificate", course_path(course_id));
        self.client.get_json(session, &path).await
    }
}
