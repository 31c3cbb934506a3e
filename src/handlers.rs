use crate::{
    AppState,
    api::seg,
    error::ApiResult,
    fetch::{FetchState, ViewScope},
    models::{
        AnalyticsData, Assessment, ContentItem, ContentType, Course, CourseSearch,
        CreateAssessmentRequest, CreateContentRequest, CreateModuleRequest, CreateReplyRequest,
        CreateReviewRequest, CreateThreadRequest, DiscussionThread, Enrollment,
        GradeSubmissionRequest, Module, ModuleOrder, ProgressData, Reply, Review,
        SubmitAssessmentRequest, TimeRange, UpdateProfileRequest, UserProfile,
    },
    sequencer::{ContentSequencer, Cursor, SequencerError},
    session::{
        InstructorContext, Session, SessionContext, SessionEvent, cleared_cookies, session_cookies,
    },
    views::{
        AuthView, BadgeFilter, BadgesView, CatalogView, CertificateView, CompletionView,
        CourseDetailView, CourseForm, EnrolledCourseView, LearnView, LoginForm, MoveDirection,
        Page, RecommendationFilter, RecommendationsView, RegisterForm, ReviewsView, Thumbnail,
        Validate, ValidationError, average_rating, filter_catalog, join_enrollments,
        next_content_order, next_module_order, reorder_plan, validate_submission,
    },
};
use axum::{
    Form, Json,
    extract::{Multipart, Path, Query, State},
    http::{StatusCode, Uri, header},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};

type PageJson<T> = Json<Page<T>>;

// --- Helpers ---

fn page<T>(session: &Session, uri: &Uri, state: T) -> PageJson<T> {
    Json(Page::new(session, uri.path(), state))
}

/// 422 with the failed region state. Nothing has been sent to the backend.
fn rejected(err: ValidationError) -> Response {
    tracing::debug!(reason = %err, "form rejected");
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(FetchState::<()>::failed(err.to_string())),
    )
        .into_response()
}

/// Folds a mutation result. Backend failures are shown in the region like fetch
/// failures, so the status stays 200.
fn outcome<T: Serialize>(result: ApiResult<T>, context: &str) -> Response {
    Json(FetchState::from_result(result, context)).into_response()
}

fn see_other_with_cookies(target: &str, cookies: Vec<String>) -> Response {
    let headers = cookies
        .into_iter()
        .map(|cookie| (header::SET_COOKIE, cookie));
    (AppendHeaders(headers), Redirect::to(target)).into_response()
}

// --- Query & Form Structs ---

#[derive(Deserialize, Default)]
pub struct ReturnTo {
    pub from: Option<String>,
}

/// LearnQuery
///
/// Cursor of the learn page, as 0-based indexes (`?module=1&item=0`).
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct LearnQuery {
    pub module: Option<usize>,
    pub item: Option<usize>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RecommendationQuery {
    pub current_course_id: Option<String>,
    pub filter: RecommendationFilter,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressQuery {
    pub student_id: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyticsQuery {
    pub time_range: TimeRange,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct BadgeQuery {
    pub filter: BadgeFilter,
}

/// ModuleForm
///
/// Module creation input. The order is assigned by the shell (appended last).
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct ModuleForm {
    pub title: String,
    pub description: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct ContentForm {
    #[serde(rename = "type")]
    pub kind: ContentType,
    pub title: String,
    pub description: String,
    pub url: String,
    pub content: String,
    pub duration: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderForm {
    pub module_id: String,
    pub direction: MoveDirection,
}

// --- Session Handlers ---

/// login_page
///
/// [Public Route] The login form. `from` is echoed back so the form can post it.
pub async fn login_page(
    SessionContext(session): SessionContext,
    uri: Uri,
    Query(ReturnTo { from }): Query<ReturnTo>,
) -> PageJson<AuthView> {
    page(&session, &uri, AuthView {
        from,
        result: FetchState::Idle,
    })
}

/// login
///
/// [Public Route] Exchanges credentials for a backend-issued token, stores the
/// session cookies, notifies subscribers, and continues to where the guard
/// intercepted the user (or the dashboard).
pub async fn login(
    SessionContext(session): SessionContext,
    State(state): State<AppState>,
    uri: Uri,
    Form(form): Form<LoginForm>,
) -> Response {
    if let Err(e) = form.validate() {
        return rejected(e);
    }

    match state.api.login(&form.to_request()).await {
        Ok(response) => {
            let signed_in = Session::new(
                response.token,
                Some(response.user.user_type),
                Some(response.user.user_id),
            );
            state.sessions.publish(SessionEvent::SignedIn {
                user_id: signed_in.user_id().map(str::to_string),
                role: signed_in.role(),
            });
            tracing::info!(role = ?signed_in.role(), "user signed in");
            see_other_with_cookies(
                form.return_to(),
                session_cookies(&signed_in, state.config.cookie_secure),
            )
        }
        Err(e) => {
            tracing::warn!(error = %e, "login failed");
            page(&session, &uri, AuthView {
                from: form.from.clone(),
                result: FetchState::failed("Invalid email or password"),
            })
            .into_response()
        }
    }
}

pub async fn register_page(SessionContext(session): SessionContext, uri: Uri) -> PageJson<AuthView> {
    page(&session, &uri, AuthView {
        from: None,
        result: FetchState::Idle,
    })
}

/// register
///
/// [Public Route] Creates the account and sends the user to the login form.
pub async fn register(
    SessionContext(session): SessionContext,
    State(state): State<AppState>,
    uri: Uri,
    Form(form): Form<RegisterForm>,
) -> Response {
    if let Err(e) = form.validate() {
        return rejected(e);
    }
    match state.api.register(&form.to_request()).await {
        Ok(()) => Redirect::to("/login").into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "registration failed");
            page(&session, &uri, AuthView {
                from: None,
                result: FetchState::failed("Registration failed"),
            })
            .into_response()
        }
    }
}

/// logout
///
/// Clears token, role and cached identity, then lands on the login form.
/// Safe to call without a session.
pub async fn logout(State(state): State<AppState>) -> Response {
    state.sessions.publish(SessionEvent::SignedOut);
    see_other_with_cookies("/login", cleared_cookies(state.config.cookie_secure))
}

// --- Landing & Dashboard ---

/// home
///
/// [Public Route] The single landing view: navigation plus the course catalog.
pub async fn home(
    SessionContext(session): SessionContext,
    State(state): State<AppState>,
    uri: Uri,
) -> PageJson<FetchState<Vec<Course>>> {
    let courses = FetchState::from_result(
        state.api.list_courses(&session).await,
        "Failed to fetch courses",
    );
    page(&session, &uri, courses)
}

pub async fn enrollments(
    SessionContext(session): SessionContext,
    State(state): State<AppState>,
    uri: Uri,
) -> PageJson<FetchState<Vec<Enrollment>>> {
    let enrollments = FetchState::from_result(
        state.api.list_enrollments(&session).await,
        "Failed to fetch enrollments",
    );
    page(&session, &uri, enrollments)
}

/// dashboard
///
/// [Authenticated Route] Enrollments joined with the catalog. Both lists are
/// fetched concurrently inside one `ViewScope`.
pub async fn dashboard(
    SessionContext(session): SessionContext,
    State(state): State<AppState>,
    uri: Uri,
) -> PageJson<FetchState<Vec<EnrolledCourseView>>> {
    let mut scope = ViewScope::new();
    let enrollments = {
        let (api, session) = (state.api.clone(), session.clone());
        scope.spawn(async move {
            FetchState::from_result(
                api.list_enrollments(&session).await,
                "Failed to fetch enrollments",
            )
        })
    };
    let courses = {
        let (api, session) = (state.api.clone(), session.clone());
        scope.spawn(async move {
            FetchState::from_result(api.list_courses(&session).await, "Failed to fetch courses")
        })
    };

    let enrollments = enrollments.settle("Failed to fetch enrollments").await;
    let courses = courses.settle("Failed to fetch courses").await;

    let cards = match (enrollments, courses) {
        (FetchState::Loaded(enrollments), FetchState::Loaded(courses)) => {
            FetchState::Loaded(join_enrollments(enrollments, &courses))
        }
        (FetchState::Failed(message), _) | (_, FetchState::Failed(message)) => {
            FetchState::Failed(message)
        }
        _ => FetchState::Loading,
    };
    page(&session, &uri, cards)
}

// --- Catalog ---

/// list_courses
///
/// [Authenticated Route] The catalog, narrowed locally by the search filters.
pub async fn list_courses(
    SessionContext(session): SessionContext,
    State(state): State<AppState>,
    uri: Uri,
    Query(filters): Query<CourseSearch>,
) -> PageJson<CatalogView> {
    let courses = FetchState::from_result(
        state.api.list_courses(&session).await,
        "Failed to fetch courses",
    )
    .map(|courses| filter_catalog(courses, &filters));
    page(&session, &uri, CatalogView { filters, courses })
}

/// search_courses
///
/// [Authenticated Route] Same filters, evaluated by the backend.
pub async fn search_courses(
    SessionContext(session): SessionContext,
    State(state): State<AppState>,
    uri: Uri,
    Query(filters): Query<CourseSearch>,
) -> PageJson<CatalogView> {
    let courses = FetchState::from_result(
        state.api.search_courses(&session, &filters).await,
        "Failed to search courses",
    );
    page(&session, &uri, CatalogView { filters, courses })
}

pub async fn recommendations(
    SessionContext(session): SessionContext,
    State(state): State<AppState>,
    uri: Uri,
    Query(query): Query<RecommendationQuery>,
) -> PageJson<RecommendationsView> {
    let courses = FetchState::from_result(
        state
            .api
            .recommendations(&session, query.current_course_id.as_deref())
            .await,
        "Failed to fetch recommendations",
    )
    .map(|courses| query.filter.apply(courses));
    page(&session, &uri, RecommendationsView {
        filter: query.filter,
        courses,
    })
}

/// create_course
///
/// [Instructor Route] Multipart course creation. Required fields are checked
/// before the upload is forwarded; on success the browser goes back to the catalog.
pub async fn create_course(
    InstructorContext(session): InstructorContext,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Response {
    let mut form = CourseForm::default();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(error = %e, "unreadable course upload");
                return (
                    StatusCode::BAD_REQUEST,
                    Json(FetchState::<()>::failed("Invalid course upload")),
                )
                    .into_response();
            }
        };
        let name = field.name().unwrap_or_default().to_string();

        let applied = if name == "thumbnail" {
            let file_name = field.file_name().unwrap_or("thumbnail").to_string();
            let content_type = field.content_type().map(str::to_string);
            field.bytes().await.map(|bytes| {
                if !bytes.is_empty() {
                    form.thumbnail = Some(Thumbnail {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
                Ok(())
            })
        } else {
            field.text().await.map(|value| form.set_text(&name, value))
        };

        match applied {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return rejected(e),
            Err(e) => {
                tracing::debug!(error = %e, field = %name, "unreadable course field");
                return (
                    StatusCode::BAD_REQUEST,
                    Json(FetchState::<()>::failed("Invalid course upload")),
                )
                    .into_response();
            }
        }
    }

    if let Err(e) = form.validate() {
        return rejected(e);
    }

    match state.api.create_course(&session, form).await {
        Ok(()) => Redirect::to("/courses").into_response(),
        Err(e) => outcome::<()>(Err(e), "Failed to create course"),
    }
}

/// course_detail
///
/// [Authenticated Route] The course and its rating, fetched concurrently.
pub async fn course_detail(
    SessionContext(session): SessionContext,
    State(state): State<AppState>,
    uri: Uri,
    Path(course_id): Path<String>,
) -> PageJson<CourseDetailView> {
    let mut scope = ViewScope::new();
    let course = {
        let (api, session, id) = (state.api.clone(), session.clone(), course_id.clone());
        scope.spawn(async move {
            FetchState::from_result(api.get_course(&session, &id).await, "Failed to fetch course")
        })
    };
    let rating = {
        let (api, session, id) = (state.api.clone(), session.clone(), course_id);
        scope.spawn(async move {
            FetchState::from_result(api.list_reviews(&session, &id).await, "Failed to fetch reviews")
                .map(|reviews| average_rating(&reviews))
        })
    };

    let view = CourseDetailView {
        course: course.settle("Failed to fetch course").await,
        average_rating: rating.settle("Failed to fetch reviews").await,
        can_manage: session.is_instructor(),
    };
    page(&session, &uri, view)
}

/// enroll
///
/// [Authenticated Route] Enrolls and continues straight into the course.
pub async fn enroll(
    SessionContext(session): SessionContext,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Response {
    match state.api.enroll(&session, &course_id).await {
        Ok(()) => Redirect::to(&format!("/courses/{}/learn", seg(&course_id))).into_response(),
        Err(e) => outcome::<()>(Err(e), "Failed to enroll in course"),
    }
}

// --- Learning ---

async fn sequencer_for(
    state: &AppState,
    session: &Session,
    course_id: &str,
) -> FetchState<ContentSequencer> {
    match state.api.get_modules(session, course_id).await {
        Ok(modules) => match ContentSequencer::new(modules) {
            Ok(sequencer) => FetchState::Loaded(sequencer),
            Err(_) => FetchState::failed("This course has no content yet"),
        },
        Err(e) => FetchState::from_result(Err(e), "Failed to fetch course content"),
    }
}

/// learn
///
/// [Authenticated Route] The item under the cursor. A cursor that names no item
/// falls back to the first one.
pub async fn learn(
    SessionContext(session): SessionContext,
    State(state): State<AppState>,
    uri: Uri,
    Path(course_id): Path<String>,
    Query(query): Query<LearnQuery>,
) -> PageJson<FetchState<LearnView>> {
    let view = sequencer_for(&state, &session, &course_id)
        .await
        .map(|mut sequencer| {
            let cursor = Cursor {
                module_index: query.module.unwrap_or(0),
                content_index: query.item.unwrap_or(0),
            };
            if let Err(e) = sequencer.seek(cursor) {
                tracing::debug!(reason = %e, "cursor reset to start");
            }
            LearnView::from_sequencer(&course_id, &sequencer)
        });
    page(&session, &uri, view)
}

/// complete_content
///
/// [Authenticated Route] Marks an item complete. The flag only flips once the
/// backend has accepted the mark.
pub async fn complete_content(
    SessionContext(session): SessionContext,
    State(state): State<AppState>,
    Path((course_id, content_id)): Path<(String, String)>,
) -> Response {
    let mut sequencer = match sequencer_for(&state, &session, &course_id).await {
        FetchState::Loaded(sequencer) => sequencer,
        other => return Json(other.map(|_| ())).into_response(),
    };

    match sequencer
        .mark_complete(state.api.as_ref(), &session, &course_id, &content_id)
        .await
    {
        Ok(()) => Json(FetchState::Loaded(CompletionView {
            content_id,
            completed: true,
            progress: sequencer.progress(),
        }))
        .into_response(),
        Err(SequencerError::UnknownItem(_)) => (
            StatusCode::NOT_FOUND,
            Json(FetchState::<()>::failed("Content not found")),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "completion not recorded");
            Json(FetchState::<()>::failed("Failed to mark content as complete")).into_response()
        }
    }
}

// --- Content Management ---

/// list_modules
///
/// [Authenticated Route] Modules and their items in display order.
pub async fn list_modules(
    SessionContext(session): SessionContext,
    State(state): State<AppState>,
    uri: Uri,
    Path(course_id): Path<String>,
) -> PageJson<FetchState<Vec<Module>>> {
    let modules = FetchState::from_result(
        state.api.get_modules(&session, &course_id).await,
        "Failed to fetch modules",
    )
    .map(|mut modules| {
        modules.sort_by_key(|m| m.order);
        for module in &mut modules {
            module.content_items.sort_by_key(|item| item.order);
        }
        modules
    });
    page(&session, &uri, modules)
}

/// create_module
///
/// [Instructor Route] Appends a module at `count + 1`.
pub async fn create_module(
    InstructorContext(session): InstructorContext,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Json(form): Json<ModuleForm>,
) -> Response {
    let mut request = CreateModuleRequest {
        title: form.title.trim().to_string(),
        description: form.description,
        order: 0,
    };
    if let Err(e) = request.validate() {
        return rejected(e);
    }

    let modules = match state.api.get_modules(&session, &course_id).await {
        Ok(modules) => modules,
        Err(e) => return outcome::<Module>(Err(e), "Failed to create module"),
    };
    request.order = next_module_order(&modules);

    outcome(
        state.api.create_module(&session, &course_id, &request).await,
        "Failed to create module",
    )
}

/// reorder_modules
///
/// [Instructor Route] Moves a module one place up or down by swapping it with
/// its neighbour. At either end nothing is sent and the plan is empty.
pub async fn reorder_modules(
    InstructorContext(session): InstructorContext,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Json(form): Json<ReorderForm>,
) -> Response {
    let modules = match state.api.get_modules(&session, &course_id).await {
        Ok(modules) => modules,
        Err(e) => return outcome::<Vec<ModuleOrder>>(Err(e), "Failed to reorder modules"),
    };

    let Some(plan) = reorder_plan(&modules, &form.module_id, form.direction) else {
        return Json(FetchState::Loaded(Vec::<ModuleOrder>::new())).into_response();
    };

    let result = state
        .api
        .reorder_modules(&session, &course_id, &plan)
        .await
        .map(|()| plan);
    outcome(result, "Failed to reorder modules")
}

pub async fn delete_module(
    InstructorContext(session): InstructorContext,
    State(state): State<AppState>,
    Path((course_id, module_id)): Path<(String, String)>,
) -> Response {
    outcome(
        state.api.delete_module(&session, &course_id, &module_id).await,
        "Failed to delete module",
    )
}

/// create_content
///
/// [Instructor Route] Appends an item to a module at `item count`.
pub async fn create_content(
    InstructorContext(session): InstructorContext,
    State(state): State<AppState>,
    Path((course_id, module_id)): Path<(String, String)>,
    Json(form): Json<ContentForm>,
) -> Response {
    let mut request = CreateContentRequest {
        kind: form.kind,
        title: form.title.trim().to_string(),
        description: form.description,
        url: form.url,
        content: form.content,
        duration: form.duration,
        order: 0,
    };
    if let Err(e) = request.validate() {
        return rejected(e);
    }

    let modules = match state.api.get_modules(&session, &course_id).await {
        Ok(modules) => modules,
        Err(e) => return outcome::<ContentItem>(Err(e), "Failed to add content"),
    };
    let Some(order) = next_content_order(&modules, &module_id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(FetchState::<()>::failed("Module not found")),
        )
            .into_response();
    };
    request.order = order;

    outcome(
        state
            .api
            .create_content(&session, &course_id, &module_id, &request)
            .await,
        "Failed to add content",
    )
}

pub async fn delete_content(
    InstructorContext(session): InstructorContext,
    State(state): State<AppState>,
    Path((course_id, module_id, content_id)): Path<(String, String, String)>,
) -> Response {
    outcome(
        state
            .api
            .delete_content(&session, &course_id, &module_id, &content_id)
            .await,
        "Failed to delete content",
    )
}

// --- Assessments ---

pub async fn list_assessments(
    SessionContext(session): SessionContext,
    State(state): State<AppState>,
    uri: Uri,
    Path(course_id): Path<String>,
) -> PageJson<FetchState<Vec<Assessment>>> {
    let assessments = FetchState::from_result(
        state.api.list_assessments(&session, &course_id).await,
        "Failed to fetch assessments",
    );
    page(&session, &uri, assessments)
}

pub async fn get_assessment(
    SessionContext(session): SessionContext,
    State(state): State<AppState>,
    uri: Uri,
    Path((course_id, assessment_id)): Path<(String, String)>,
) -> PageJson<FetchState<Assessment>> {
    let assessment = FetchState::from_result(
        state
            .api
            .get_assessment(&session, &course_id, &assessment_id)
            .await,
        "Failed to fetch assessment",
    );
    page(&session, &uri, assessment)
}

pub async fn create_assessment(
    InstructorContext(session): InstructorContext,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Json(request): Json<CreateAssessmentRequest>,
) -> Response {
    if let Err(e) = request.validate() {
        return rejected(e);
    }
    outcome(
        state
            .api
            .create_assessment(&session, &course_id, &request)
            .await,
        "Failed to create assessment",
    )
}

pub async fn delete_assessment(
    InstructorContext(session): InstructorContext,
    State(state): State<AppState>,
    Path((course_id, assessment_id)): Path<(String, String)>,
) -> Response {
    outcome(
        state
            .api
            .delete_assessment(&session, &course_id, &assessment_id)
            .await,
        "Failed to delete assessment",
    )
}

/// submit_assessment
///
/// [Authenticated Route] Blank answers are refused up front. The assessment is
/// then read back so a missing question is refused too, before submitting.
pub async fn submit_assessment(
    SessionContext(session): SessionContext,
    State(state): State<AppState>,
    Path((course_id, assessment_id)): Path<(String, String)>,
    Json(request): Json<SubmitAssessmentRequest>,
) -> Response {
    if request.answers.is_empty() || request.answers.iter().any(|a| a.answer.trim().is_empty()) {
        return rejected(ValidationError::Invalid(
            "Please answer all questions before submitting".into(),
        ));
    }

    let assessment = match state
        .api
        .get_assessment(&session, &course_id, &assessment_id)
        .await
    {
        Ok(assessment) => assessment,
        Err(e) => return outcome::<()>(Err(e), "Failed to submit assessment"),
    };
    if let Err(e) = validate_submission(&assessment, &request) {
        return rejected(e);
    }

    outcome(
        state
            .api
            .submit_assessment(&session, &course_id, &assessment_id, &request)
            .await,
        "Failed to submit assessment",
    )
}

pub async fn grade_submission(
    InstructorContext(session): InstructorContext,
    State(state): State<AppState>,
    Path((course_id, assessment_id, submission_id)): Path<(String, String, String)>,
    Json(request): Json<GradeSubmissionRequest>,
) -> Response {
    if request.grades.iter().any(|g| g.score < 0.0) {
        return rejected(ValidationError::Invalid("Scores cannot be negative".into()));
    }
    outcome(
        state
            .api
            .grade_submission(&session, &course_id, &assessment_id, &submission_id, &request)
            .await,
        "Failed to grade submission",
    )
}

// --- Discussions & Reviews ---

pub async fn list_threads(
    SessionContext(session): SessionContext,
    State(state): State<AppState>,
    uri: Uri,
    Path(course_id): Path<String>,
) -> PageJson<FetchState<Vec<DiscussionThread>>> {
    let threads = FetchState::from_result(
        state.api.list_threads(&session, &course_id).await,
        "Failed to fetch discussions",
    );
    page(&session, &uri, threads)
}

pub async fn create_thread(
    SessionContext(session): SessionContext,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Json(request): Json<CreateThreadRequest>,
) -> Response {
    if let Err(e) = request.validate() {
        return rejected(e);
    }
    outcome::<DiscussionThread>(
        state.api.create_thread(&session, &course_id, &request).await,
        "Failed to create thread",
    )
}

pub async fn add_reply(
    SessionContext(session): SessionContext,
    State(state): State<AppState>,
    Path((course_id, thread_id)): Path<(String, String)>,
    Json(request): Json<CreateReplyRequest>,
) -> Response {
    if let Err(e) = request.validate() {
        return rejected(e);
    }
    outcome::<Reply>(
        state
            .api
            .add_reply(&session, &course_id, &thread_id, &request)
            .await,
        "Failed to add reply",
    )
}

/// list_reviews
///
/// [Authenticated Route] Reviews plus their mean rating (0 when there are none).
pub async fn list_reviews(
    SessionContext(session): SessionContext,
    State(state): State<AppState>,
    uri: Uri,
    Path(course_id): Path<String>,
) -> PageJson<ReviewsView> {
    let reviews = FetchState::from_result(
        state.api.list_reviews(&session, &course_id).await,
        "Failed to fetch reviews",
    );
    let average = reviews.loaded().map(|r| average_rating(r)).unwrap_or(0.0);
    page(&session, &uri, ReviewsView {
        reviews,
        average_rating: average,
    })
}

pub async fn create_review(
    SessionContext(session): SessionContext,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Json(request): Json<CreateReviewRequest>,
) -> Response {
    if let Err(e) = request.validate() {
        return rejected(e);
    }
    outcome::<Review>(
        state.api.create_review(&session, &course_id, &request).await,
        "Failed to submit review",
    )
}

// --- Progress, Analytics, Certificates ---

pub async fn progress(
    SessionContext(session): SessionContext,
    State(state): State<AppState>,
    uri: Uri,
    Path(course_id): Path<String>,
    Query(query): Query<ProgressQuery>,
) -> PageJson<FetchState<ProgressData>> {
    let progress = FetchState::from_result(
        state
            .api
            .get_progress(&session, &course_id, query.student_id.as_deref())
            .await,
        "Failed to fetch progress data",
    );
    page(&session, &uri, progress)
}

pub async fn analytics(
    InstructorContext(session): InstructorContext,
    State(state): State<AppState>,
    uri: Uri,
    Path(course_id): Path<String>,
    Query(query): Query<AnalyticsQuery>,
) -> PageJson<FetchState<AnalyticsData>> {
    let analytics = FetchState::from_result(
        state
            .api
            .get_analytics(&session, &course_id, query.time_range)
            .await,
        "Failed to fetch analytics data",
    );
    page(&session, &uri, analytics)
}

/// certificate
///
/// [Authenticated Route] Completion is checked first; the certificate itself is
/// only requested for a completed course.
pub async fn certificate(
    SessionContext(session): SessionContext,
    State(state): State<AppState>,
    uri: Uri,
    Path(course_id): Path<String>,
) -> PageJson<FetchState<CertificateView>> {
    if let Err(e) = state.api.check_completion(&session, &course_id).await {
        tracing::debug!(error = %e, "completion check failed");
        return page(&session, &uri, FetchState::failed("Course not completed yet"));
    }

    let certificate = FetchState::from_result(
        state.api.get_certificate(&session, &course_id).await,
        "Failed to fetch certificate",
    )
    .map(CertificateView::from);
    page(&session, &uri, certificate)
}

// --- Profile ---

pub async fn profile(
    SessionContext(session): SessionContext,
    State(state): State<AppState>,
    uri: Uri,
) -> PageJson<FetchState<UserProfile>> {
    let profile = FetchState::from_result(
        state.api.get_profile(&session).await,
        "Failed to fetch profile",
    );
    page(&session, &uri, profile)
}

pub async fn update_profile(
    SessionContext(session): SessionContext,
    State(state): State<AppState>,
    Json(request): Json<UpdateProfileRequest>,
) -> Response {
    outcome::<UserProfile>(
        state.api.update_profile(&session, &request).await,
        "Failed to update profile",
    )
}

/// badges
///
/// [Authenticated Route] The user's badges. The id comes from the cached
/// identity, falling back to the token's subject claim.
pub async fn badges(
    SessionContext(session): SessionContext,
    State(state): State<AppState>,
    uri: Uri,
    Query(query): Query<BadgeQuery>,
) -> PageJson<BadgesView> {
    let user_id = session
        .user_id()
        .map(str::to_string)
        .or_else(|| session.identity().and_then(|claims| claims.sub));

    let badges = match user_id {
        Some(user_id) => FetchState::from_result(
            state.api.get_badges(&session, &user_id).await,
            "Failed to fetch badges",
        )
        .map(|badges| query.filter.apply(badges)),
        None => FetchState::failed("Failed to fetch badges"),
    };
    page(&session, &uri, BadgesView {
        filter: query.filter,
        badges,
    })
}
