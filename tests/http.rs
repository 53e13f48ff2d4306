//! End-to-end flows through the HTTP surface with cookie sessions.

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use attendance_portal::manager::AttendanceManager;
use attendance_portal::settings::AdminCredentials;
use attendance_portal::web::{AppState, configure, session_middleware};

/// A test browser that keeps the session cookie between requests.
struct Browser<S> {
    app: S,
    cookie: Option<Cookie<'static>>,
}

impl<S, B> Browser<S>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    async fn send(&mut self, request: test::TestRequest) -> ServiceResponse<B> {
        let request = match &self.cookie {
            Some(cookie) => request.cookie(cookie.clone()),
            None => request,
        };
        let response = test::call_service(&self.app, request.to_request()).await;
        if let Some(cookie) = response
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
        {
            self.cookie = Some(cookie.into_owned());
        }
        response
    }

    async fn get(&mut self, uri: &str) -> ServiceResponse<B> {
        self.send(test::TestRequest::get().uri(uri)).await
    }

    async fn post(&mut self, uri: &str, form: &[(&str, &str)]) -> ServiceResponse<B> {
        self.send(test::TestRequest::post().uri(uri).set_form(form))
            .await
    }

    /// Fetches a page and returns its body as text.
    async fn page(&mut self, uri: &str) -> String {
        let response = self.get(uri).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {uri}");
        body_text(response).await
    }

    /// Follows a redirect response and returns the body of the target page.
    async fn follow(&mut self, response: ServiceResponse<B>) -> String {
        let location = location(&response);
        self.page(&location).await
    }

    async fn register_student(&mut self, name: &str, email: &str, division: &str) {
        let response = self
            .post(
                "/student/register",
                &[
                    ("name", name),
                    ("email", email),
                    ("password", "secret"),
                    ("sem", "3"),
                    ("stream", "CS"),
                    ("division", division),
                ],
            )
            .await;
        assert_eq!(location(&response), "/student/login");
    }

    async fn register_teacher(&mut self, email: &str) {
        let response = self
            .post(
                "/teacher/register",
                &[
                    ("name", "Grace Hopper"),
                    ("email", email),
                    ("password", "cobol"),
                    ("department", "Computing"),
                ],
            )
            .await;
        assert_eq!(location(&response), "/teacher/login");
    }
}

fn location<B>(response: &ServiceResponse<B>) -> String {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect location")
        .to_str()
        .unwrap()
        .to_string()
}

async fn body_text<B: MessageBody>(response: ServiceResponse<B>) -> String {
    String::from_utf8(test::read_body(response).await.to_vec()).unwrap()
}

fn state() -> web::Data<AppState> {
    web::Data::new(AppState::new(
        AttendanceManager::in_memory().unwrap(),
        Some(AdminCredentials::new("registrar", "s3cret")),
    ))
}

async fn browser_with(
    state: web::Data<AppState>,
    key: Key,
) -> Browser<
    impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
> {
    let app = test::init_service(
        App::new()
            .app_data(state)
            .wrap(session_middleware(key, false))
            .configure(configure),
    )
    .await;

    Browser { app, cookie: None }
}

async fn browser() -> Browser<
    impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
> {
    browser_with(state(), Key::generate()).await
}

const LECTURE_QUERY: &str =
    "/teacher/dashboard?date=2025-03-14&subject=Math&lecture_no=1&sem=3&stream=CS&division=A";

fn lecture_form<'a>(subject: &'a str, present: &[&'a str]) -> Vec<(&'a str, &'a str)> {
    let mut form = vec![
        ("date", "2025-03-14"),
        ("subject", subject),
        ("lecture_no", "1"),
        ("sem", "3"),
        ("stream", "CS"),
        ("division", "A"),
    ];
    form.extend(present.iter().map(|key| (*key, "present")));
    form
}

#[actix_web::test]
async fn landing_page_offers_every_role() {
    let mut browser = browser().await;
    let page = browser.page("/").await;

    assert!(page.contains(r#"href="/student/register""#));
    assert!(page.contains(r#"href="/teacher/login""#));
    assert!(page.contains(r#"href="/admin/login""#));
}

#[actix_web::test]
async fn anonymous_dashboards_redirect_to_login() {
    let mut browser = browser().await;

    for (dashboard, login, message) in [
        ("/student/dashboard", "/student/login", "Please login as student."),
        ("/teacher/dashboard", "/teacher/login", "Please login as teacher."),
        ("/admin/dashboard", "/admin/login", "Please login as admin."),
    ] {
        let response = browser.get(dashboard).await;
        assert_eq!(location(&response), login);
        assert!(browser.follow(response).await.contains(message));
    }
}

#[actix_web::test]
async fn student_registers_logs_in_and_sees_empty_summary() {
    let mut browser = browser().await;
    browser.register_student("Ada", "Ada@Example.com", "A").await;
    assert!(
        browser
            .page("/student/login")
            .await
            .contains("Student registered successfully. Please login.")
    );

    let response = browser
        .post(
            "/student/login",
            &[("email", "ada@example.com"), ("password", "secret")],
        )
        .await;
    assert_eq!(location(&response), "/student/dashboard");

    let page = browser.follow(response).await;
    assert!(page.contains("Logged in as student."));
    assert!(page.contains("Ada (student)"));
    assert!(page.contains("No attendance recorded yet."));
}

#[actix_web::test]
async fn duplicate_registration_is_reported() {
    let mut browser = browser().await;
    browser.register_student("Ada", "ada@example.com", "A").await;

    let response = browser
        .post(
            "/student/register",
            &[
                ("name", "Impostor"),
                ("email", "ada@example.com"),
                ("password", "other"),
                ("sem", "1"),
                ("stream", "EE"),
                ("division", "B"),
            ],
        )
        .await;
    assert_eq!(location(&response), "/student/register");
    assert!(
        browser
            .follow(response)
            .await
            .contains("Email already registered as student.")
    );

    // The same email is still free on the teacher side.
    browser.register_teacher("ada@example.com").await;
}

#[actix_web::test]
async fn registration_with_missing_fields_is_sent_back() {
    let mut browser = browser().await;

    for (uri, form) in [
        ("/student/register", [("name", "Ada"), ("email", "ada@example.com")]),
        ("/teacher/register", [("name", "Grace"), ("password", "cobol")]),
    ] {
        let response = browser.post(uri, &form).await;
        assert_eq!(location(&response), uri);
        assert!(browser.follow(response).await.contains("Please fill all fields."));
    }
}

#[actix_web::test]
async fn failed_logins_share_one_message() {
    let mut browser = browser().await;
    browser.register_student("Ada", "ada@example.com", "A").await;

    for (email, password) in [("ada@example.com", "wrong"), ("nobody@example.com", "secret")] {
        let response = browser
            .post("/student/login", &[("email", email), ("password", password)])
            .await;
        assert_eq!(location(&response), "/student/login");
        assert!(
            browser
                .follow(response)
                .await
                .contains("Invalid email or password.")
        );
    }

    let response = browser.get("/student/dashboard").await;
    assert_eq!(location(&response), "/student/login");
}

#[actix_web::test]
async fn unread_messages_do_not_outgrow_the_cookie() {
    let mut browser = browser().await;

    for attempt in 0..200 {
        let response = browser
            .post(
                "/admin/login",
                &[("username", "admin"), ("password", "guess")],
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "attempt {attempt}");
    }

    let page = browser.page("/admin/login").await;
    assert_eq!(page.matches("Invalid email or password.").count(), 1);
}

#[actix_web::test]
async fn teacher_records_a_lecture_for_the_section() {
    let mut browser = browser().await;
    browser.register_student("Ada", "ada@example.com", "A").await;
    browser.register_student("Bob", "bob@example.com", "A").await;
    browser.register_student("Cy", "cy@example.com", "A").await;
    browser.register_student("Dee", "dee@example.com", "B").await;
    browser.register_teacher("grace@example.com").await;

    let response = browser
        .post(
            "/teacher/login",
            &[("email", "grace@example.com"), ("password", "cobol")],
        )
        .await;
    assert_eq!(location(&response), "/teacher/dashboard");

    let roster = browser.page(LECTURE_QUERY).await;
    assert!(roster.contains(r#"name="status_1""#));
    assert!(roster.contains(r#"name="status_2""#));
    assert!(roster.contains(r#"name="status_3""#));
    assert!(!roster.contains(r#"name="status_4""#));

    let response = browser
        .post(
            "/teacher/dashboard",
            &lecture_form("Math", &["status_1", "status_2"]),
        )
        .await;
    assert_eq!(location(&response), "/teacher/dashboard");
    assert!(
        browser
            .follow(response)
            .await
            .contains("Attendance saved successfully.")
    );

    browser.get("/logout").await;
    browser
        .post(
            "/student/login",
            &[("email", "cy@example.com"), ("password", "secret")],
        )
        .await;
    let summary = browser.page("/student/dashboard").await;
    assert!(summary.contains("<tr><td>Math</td><td>1</td><td>0</td><td>1</td><td>0.00</td></tr>"));

    browser.get("/logout").await;
    browser
        .post(
            "/student/login",
            &[("email", "ada@example.com"), ("password", "secret")],
        )
        .await;
    let summary = browser.page("/student/dashboard").await;
    let row = "<tr><td>Math</td><td>1</td><td>1</td><td>0</td><td>100.00</td></tr>";
    assert!(summary.contains(row));
}

#[actix_web::test]
async fn incomplete_lecture_is_rejected_without_writes() {
    let mut browser = browser().await;
    browser.register_student("Ada", "ada@example.com", "A").await;
    browser.register_teacher("grace@example.com").await;
    browser
        .post(
            "/teacher/login",
            &[("email", "grace@example.com"), ("password", "cobol")],
        )
        .await;

    let page = browser
        .page("/teacher/dashboard?date=2025-03-14&subject=&lecture_no=1&sem=3&stream=CS&division=A")
        .await;
    assert!(page.contains("Please fill all fields to load students."));
    assert!(!page.contains("status_1"));

    let response = browser
        .post("/teacher/dashboard", &lecture_form(" ", &["status_1"]))
        .await;
    assert_eq!(location(&response), "/teacher/dashboard");
    assert!(browser.follow(response).await.contains("Please fill all fields."));

    browser.get("/logout").await;
    browser
        .post(
            "/admin/login",
            &[("username", "registrar"), ("password", "s3cret")],
        )
        .await;
    assert!(
        browser
            .page("/admin/dashboard")
            .await
            .contains("1 students, 1 teachers, 0 attendance records.")
    );
}

#[actix_web::test]
async fn repeated_submission_is_recorded_twice() {
    let mut browser = browser().await;
    browser.register_student("Ada", "ada@example.com", "A").await;
    browser.register_teacher("grace@example.com").await;
    browser
        .post(
            "/teacher/login",
            &[("email", "grace@example.com"), ("password", "cobol")],
        )
        .await;

    for _ in 0..2 {
        let response = browser
            .post("/teacher/dashboard", &lecture_form("Math", &["status_1"]))
            .await;
        assert_eq!(location(&response), "/teacher/dashboard");
    }

    browser.get("/logout").await;
    browser
        .post(
            "/admin/login",
            &[("username", "registrar"), ("password", "s3cret")],
        )
        .await;
    assert!(
        browser
            .page("/admin/dashboard")
            .await
            .contains("1 students, 1 teachers, 2 attendance records.")
    );
}

#[actix_web::test]
async fn empty_section_is_reported() {
    let mut browser = browser().await;
    browser.register_teacher("grace@example.com").await;
    browser
        .post(
            "/teacher/login",
            &[("email", "grace@example.com"), ("password", "cobol")],
        )
        .await;

    let response = browser
        .post("/teacher/dashboard", &lecture_form("Math", &[]))
        .await;
    assert!(
        browser
            .follow(response)
            .await
            .contains("No students found for this section.")
    );
}

#[actix_web::test]
async fn wrong_role_is_sent_to_the_right_login() {
    let mut browser = browser().await;
    browser.register_student("Ada", "ada@example.com", "A").await;
    browser
        .post(
            "/student/login",
            &[("email", "ada@example.com"), ("password", "secret")],
        )
        .await;

    let response = browser
        .post("/teacher/dashboard", &lecture_form("Math", &["status_1"]))
        .await;
    assert_eq!(location(&response), "/teacher/login");
    assert!(
        browser
            .follow(response)
            .await
            .contains("Please login as teacher.")
    );
}

#[actix_web::test]
async fn admin_uses_the_configured_credential() {
    let mut browser = browser().await;

    let response = browser
        .post(
            "/admin/login",
            &[("username", "admin"), ("password", "admin123")],
        )
        .await;
    assert_eq!(location(&response), "/admin/login");

    let response = browser
        .post(
            "/admin/login",
            &[("username", "registrar"), ("password", "s3cret")],
        )
        .await;
    assert_eq!(location(&response), "/admin/dashboard");
    let page = browser.follow(response).await;
    assert!(page.contains("Admin (admin)"));
    assert!(page.contains("0 students, 0 teachers, 0 attendance records."));
}

#[actix_web::test]
async fn logout_clears_the_session() {
    let mut browser = browser().await;
    browser.register_student("Ada", "ada@example.com", "A").await;
    browser
        .post(
            "/student/login",
            &[("email", "ada@example.com"), ("password", "secret")],
        )
        .await;
    assert_eq!(browser.get("/student/dashboard").await.status(), StatusCode::OK);

    let response = browser.get("/logout").await;
    assert_eq!(location(&response), "/");
    assert!(browser.follow(response).await.contains("Logged out."));

    let response = browser.get("/student/dashboard").await;
    assert_eq!(location(&response), "/student/login");
}

#[actix_web::test]
async fn session_for_a_vanished_account_is_dropped() {
    let key = Key::generate();
    let mut original = browser_with(state(), key.clone()).await;
    original.register_student("Ada", "ada@example.com", "A").await;
    original
        .post(
            "/student/login",
            &[("email", "ada@example.com"), ("password", "secret")],
        )
        .await;

    // Same signing key, but a store that has never seen this student.
    let mut other = browser_with(state(), key).await;
    other.cookie = original.cookie.clone();

    let response = other.get("/student/dashboard").await;
    assert_eq!(location(&response), "/student/login");
    assert!(other.follow(response).await.contains("Student not found."));

    let response = other.get("/student/dashboard").await;
    assert_eq!(location(&response), "/student/login");
}
