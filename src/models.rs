use serde::{Deserialize, Serialize};
use ts_rs::TS;

// --- Identity ---

/// Role
///
/// The role string stored next to the token. Only meaningful while a token is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    #[default]
    Student,
    Instructor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Instructor => "instructor",
        }
    }

    /// Lenient parse of a stored role value. Unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "student" => Some(Role::Student),
            "instructor" => Some(Role::Instructor),
            _ => None,
        }
    }
}

/// AuthenticatedUser
///
/// The user record returned by the backend alongside a freshly issued token.
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub user_name: String,
    pub email: String,
    pub user_type: Role,
}

// --- Catalog ---

/// CourseLevel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum CourseLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl CourseLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseLevel::Beginner => "beginner",
            CourseLevel::Intermediate => "intermediate",
            CourseLevel::Advanced => "advanced",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "beginner" => Some(CourseLevel::Beginner),
            "intermediate" => Some(CourseLevel::Intermediate),
            "advanced" => Some(CourseLevel::Advanced),
            _ => None,
        }
    }
}

/// InstructorRef
///
/// The backend is not consistent here: listings send the instructor's display
/// name, detail views send a small profile object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(untagged)]
#[ts(export)]
pub enum InstructorRef {
    Name(String),
    Profile {
        #[serde(default)]
        id: String,
        name: String,
    },
}

impl InstructorRef {
    pub fn name(&self) -> &str {
        match self {
            InstructorRef::Name(name) => name,
            InstructorRef::Profile { name, .. } => name,
        }
    }
}

/// Course
///
/// Read-only from the shell's perspective except during creation (which goes
/// through the multipart `CourseForm`, not this struct).
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct Course {
    #[serde(alias = "courseId")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub instructor: Option<InstructorRef>,
    pub level: CourseLevel,
    pub category: Option<String>,
    pub price: f64,
    pub thumbnail: Option<String>,
    pub rating: f64,
    pub enrolled_students: u32,
    #[serde(alias = "courseDuration")]
    pub duration: Option<String>,
    pub last_updated: Option<String>,
    /// Only populated by the detail endpoint.
    pub enrolled: bool,
}

impl Course {
    pub fn instructor_name(&self) -> Option<&str> {
        self.instructor.as_ref().map(InstructorRef::name)
    }
}

/// RecommendedCourse
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct RecommendedCourse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub level: CourseLevel,
    pub thumbnail: Option<String>,
    pub instructor: Option<String>,
    pub rating: f64,
    pub enrolled_students: u32,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub similarity_score: Option<f64>,
}

/// CourseSearch
///
/// Filter set shared by the catalog page (applied locally) and the search page
/// (forwarded to the backend). `"all"`, empty strings and absent price bounds
/// mean "no constraint".
#[derive(Debug, Clone, Serialize, Deserialize, TS, PartialEq)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct CourseSearch {
    pub query: String,
    pub level: String,
    pub category: String,
    pub duration: String,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl Default for CourseSearch {
    fn default() -> Self {
        Self {
            query: String::new(),
            level: "all".to_string(),
            category: "all".to_string(),
            duration: "all".to_string(),
            min_price: None,
            max_price: None,
        }
    }
}

impl CourseSearch {
    /// Query parameters for the backend search, skipping default values.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        let text = [
            ("query", &self.query),
            ("level", &self.level),
            ("category", &self.category),
            ("duration", &self.duration),
        ];
        for (key, value) in text {
            let value = value.trim();
            if !value.is_empty() && value != "all" {
                pairs.push((key, value.to_string()));
            }
        }
        // A zero bound is falsy upstream and never sent.
        let prices = [("minPrice", self.min_price), ("maxPrice", self.max_price)];
        for (key, bound) in prices {
            if let Some(bound) = bound.filter(|b| *b > 0.0) {
                pairs.push((key, bound.to_string()));
            }
        }
        pairs
    }
}

// --- Content ---

/// ContentType
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ContentType {
    #[default]
    Text,
    Video,
    Pdf,
    File,
    Image,
    Link,
}

/// ContentItem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct ContentItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ContentType,
    pub title: String,
    pub content: String,
    pub order: i32,
    pub completed: bool,
}

/// Module
///
/// `order` is 1-based and expected to be unique and contiguous within a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct Module {
    pub id: String,
    pub title: String,
    pub description: String,
    pub order: i32,
    pub content_items: Vec<ContentItem>,
}

/// CreateModuleRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateModuleRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub order: i32,
}

/// CreateContentRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct CreateContentRequest {
    #[serde(rename = "type")]
    pub kind: ContentType,
    pub title: String,
    pub description: String,
    pub url: String,
    pub content: String,
    pub duration: String,
    pub order: i32,
}

/// ModuleOrder
///
/// One entry of the reorder payload (`POST /modules/reorder` takes a list).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ModuleOrder {
    pub id: String,
    pub order: i32,
}

// --- Assessments ---

/// AssessmentType
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum AssessmentType {
    #[default]
    Quiz,
    Assignment,
}

/// QuestionType
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum QuestionType {
    #[default]
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
    Essay,
}

/// Question
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct Question {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub question: String,
    pub options: Vec<String>,
    pub points: u32,
}

/// SubmittedAnswer
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct SubmittedAnswer {
    pub question_id: String,
    pub answer: String,
    pub score: Option<f64>,
    pub feedback: Option<String>,
}

/// Submission
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct Submission {
    pub id: String,
    pub student_id: String,
    pub student_name: String,
    pub answers: Vec<SubmittedAnswer>,
    pub submitted_at: String,
    pub total_score: Option<f64>,
}

/// Assessment
///
/// The listing endpoint fills `submissions_count`/`average_score` and leaves
/// `questions` empty; the detail endpoint does the opposite.
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct Assessment {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: AssessmentType,
    pub description: String,
    pub due_date: String,
    pub total_points: u32,
    pub questions: Vec<Question>,
    pub submissions: Vec<Submission>,
    pub submissions_count: u32,
    pub average_score: Option<f64>,
}

/// CreateAssessmentRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct CreateAssessmentRequest {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: AssessmentType,
    pub description: String,
    pub due_date: String,
    pub total_points: u32,
}

impl Default for CreateAssessmentRequest {
    fn default() -> Self {
        Self {
            title: String::new(),
            kind: AssessmentType::Quiz,
            description: String::new(),
            due_date: String::new(),
            total_points: 100,
        }
    }
}

/// AnswerInput
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AnswerInput {
    pub question_id: String,
    pub answer: String,
}

/// SubmitAssessmentRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[ts(export)]
pub struct SubmitAssessmentRequest {
    pub answers: Vec<AnswerInput>,
}

/// QuestionGrade
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct QuestionGrade {
    pub question_id: String,
    pub score: f64,
    #[serde(default)]
    pub feedback: String,
}

/// GradeSubmissionRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[ts(export)]
pub struct GradeSubmissionRequest {
    pub grades: Vec<QuestionGrade>,
}

// --- Enrollment ---

/// Enrollment
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct Enrollment {
    pub enrollment_id: String,
    pub course_id: String,
    pub enrollment_date: String,
    pub enrollment_status: String,
    pub progress: f64,
}

/// EnrollRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct EnrollRequest {
    pub course_id: String,
}

// --- Community ---

/// Review
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct Review {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub rating: u8,
    pub comment: String,
    pub created_at: String,
}

/// CreateReviewRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[ts(export)]
pub struct CreateReviewRequest {
    pub rating: u8,
    pub comment: String,
}

/// Author
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[serde(default)]
#[ts(export)]
pub struct Author {
    pub id: String,
    pub name: String,
    pub role: Role,
}

/// Reply
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct Reply {
    pub id: String,
    pub content: String,
    pub author: Author,
    pub created_at: String,
}

/// DiscussionThread
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct DiscussionThread {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author: Author,
    pub created_at: String,
    pub replies: Vec<Reply>,
}

/// CreateThreadRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[ts(export)]
pub struct CreateThreadRequest {
    pub title: String,
    pub content: String,
}

/// CreateReplyRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[ts(export)]
pub struct CreateReplyRequest {
    pub content: String,
}

// --- Progress & Analytics ---

/// AssessmentScore
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct AssessmentScore {
    pub assessment_id: String,
    pub title: String,
    pub score: f64,
    pub max_score: f64,
    pub completed: bool,
}

/// ModuleProgress
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct ModuleProgress {
    pub module_id: String,
    pub title: String,
    pub progress: f64,
    pub completed: bool,
    pub last_accessed: String,
}

/// ProgressData
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct ProgressData {
    pub overall_progress: f64,
    pub completed_modules: u32,
    pub total_modules: u32,
    pub time_spent: String,
    pub last_accessed: String,
    pub assessment_scores: Vec<AssessmentScore>,
    pub module_progress: Vec<ModuleProgress>,
}

/// EnrollmentStats
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct EnrollmentStats {
    pub total_enrollments: u32,
    pub active_students: u32,
    pub completion_rate: f64,
    pub average_time_to_complete: String,
}

/// EngagementMetrics
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct EngagementMetrics {
    pub average_time_spent: String,
    pub discussion_participation: f64,
    pub assignment_submission_rate: f64,
}

/// RangeCount
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[serde(default)]
#[ts(export)]
pub struct RangeCount {
    pub range: String,
    pub count: u32,
}

/// AverageScore
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct AverageScore {
    pub assessment: String,
    pub average_score: f64,
}

/// PerformanceData
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct PerformanceData {
    pub progress_distribution: Vec<RangeCount>,
    pub assessment_scores: Vec<AverageScore>,
}

/// TrendPoint
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[serde(default)]
#[ts(export)]
pub struct TrendPoint {
    pub date: String,
    pub count: u32,
}

/// ContentEngagement
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[serde(default)]
#[ts(export)]
pub struct ContentEngagement {
    pub content: String,
    pub views: u32,
    pub completion: f64,
}

/// AnalyticsData
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct AnalyticsData {
    pub enrollment_stats: EnrollmentStats,
    pub engagement_metrics: EngagementMetrics,
    pub performance_data: PerformanceData,
    pub enrollment_trend: Vec<TrendPoint>,
    pub content_engagement: Vec<ContentEngagement>,
}

/// TimeRange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum TimeRange {
    Week,
    #[default]
    Month,
    Year,
}

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Week => "week",
            TimeRange::Month => "month",
            TimeRange::Year => "year",
        }
    }
}

// --- Certificates, Badges & Profile ---

/// Certificate
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct Certificate {
    pub certificate_id: String,
    pub course_id: String,
    pub course_title: String,
    pub student_name: String,
    pub completion_date: String,
    pub instructor_name: String,
}

/// BadgeIcon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum BadgeIcon {
    #[default]
    Trophy,
    Academic,
    Chat,
    Group,
    Star,
}

/// Badge
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct Badge {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: BadgeIcon,
    pub progress: Option<f64>,
    pub unlocked: bool,
    pub unlocked_at: Option<String>,
}

/// EnrolledCourseSummary
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct EnrolledCourseSummary {
    pub course_id: String,
    pub title: String,
    pub progress: f64,
    pub last_accessed: String,
}

/// CreatedCourseSummary
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct CreatedCourseSummary {
    pub course_id: String,
    pub title: String,
    pub enrolled_students: u32,
    pub rating: f64,
}

/// UserProfile
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub bio: String,
    pub role: Role,
    pub join_date: String,
    pub profile_picture: Option<String>,
    pub enrolled_courses: Vec<EnrolledCourseSummary>,
    pub created_courses: Vec<CreatedCourseSummary>,
}

/// UpdateProfileRequest
///
/// Partial update payload (PUT /profile). Only provided fields are serialized.
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateProfileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

// --- Auth payloads ---

/// LoginRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// LoginResponse
///
/// The token is issued and signed by the backend; the shell stores it as-is.
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[ts(export)]
pub struct LoginResponse {
    pub token: String,
    pub user: AuthenticatedUser,
}

/// RegisterUserRequest
///
/// The password is forwarded to the backend and never logged by the shell.
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RegisterUserRequest {
    pub user_name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub user_type: Role,
}
