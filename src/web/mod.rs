//! HTTP surface: routing, shared state, and the helpers every handler leans on.

use std::sync::Mutex;

use actix_session::SessionMiddleware;
use actix_session::storage::CookieSessionStore;
use actix_web::cookie::{Key, SameSite};
use actix_web::http::header::{self, ContentType};
use actix_web::middleware::Logger;
use actix_web::{App, HttpResponse, HttpServer, web};

use crate::error::{Error, Result};
use crate::manager::AttendanceManager;
use crate::models::Role;
use crate::settings::{AdminCredentials, Settings};

mod admin;
mod error;
mod pages;
pub mod session;
mod student;
mod teacher;
pub mod views;

use session::{FlashLevel, Identity, SessionContext};

/// Shared by every worker: the store handle and the admin credential.
pub struct AppState {
    manager: Mutex<AttendanceManager>,
    admin: Option<AdminCredentials>,
}

impl AppState {
    pub fn new(manager: AttendanceManager, admin: Option<AdminCredentials>) -> Self {
        Self {
            manager: Mutex::new(manager),
            admin,
        }
    }

    fn authenticate_admin(&self, username: &str, password: &str) -> Result<()> {
        match &self.admin {
            Some(admin) => admin.verify(username, password),
            None => Err(Error::InvalidCredentials),
        }
    }
}

/// Runs CPU-heavy work such as password hashing on the blocking thread pool, without holding
/// the store.
pub(crate) async fn off_store<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    web::block(f)
        .await
        .map_err(|err| Error::Unavailable(err.to_string()))?
}

/// Runs `f` against the store on the blocking thread pool.
pub(crate) async fn with_store<T, F>(state: &web::Data<AppState>, f: F) -> Result<T>
where
    F: FnOnce(&mut AttendanceManager) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    web::block(move || {
        let mut manager = state
            .manager
            .lock()
            .map_err(|_| Error::Unavailable("store lock poisoned".to_string()))?;
        f(&mut manager)
    })
    .await
    .map_err(|err| Error::Unavailable(err.to_string()))?
}

/// Cookie-backed sessions; nothing is kept server-side.
pub fn session_middleware(key: Key, cookie_secure: bool) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".into())
        .cookie_path("/".into())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_same_site(SameSite::Lax)
        .build()
}

/// Registers every route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(pages::index))
        .route("/logout", web::get().to(pages::logout))
        .service(
            web::scope("/student")
                .route("/register", web::get().to(student::register_form))
                .route("/register", web::post().to(student::register))
                .route("/login", web::get().to(student::login_form))
                .route("/login", web::post().to(student::login))
                .route("/dashboard", web::get().to(student::dashboard)),
        )
        .service(
            web::scope("/teacher")
                .route("/register", web::get().to(teacher::register_form))
                .route("/register", web::post().to(teacher::register))
                .route("/login", web::get().to(teacher::login_form))
                .route("/login", web::post().to(teacher::login))
                .route("/dashboard", web::get().to(teacher::dashboard))
                .route("/dashboard", web::post().to(teacher::record)),
        )
        .service(
            web::scope("/admin")
                .route("/login", web::get().to(admin::login_form))
                .route("/login", web::post().to(admin::login))
                .route("/dashboard", web::get().to(admin::dashboard)),
        );
}

/// Builds the signing key from settings, falling back to a throwaway one.
fn session_key(settings: &Settings) -> Result<Key> {
    match &settings.session.key {
        Some(secret) => Key::try_from(secret.as_bytes()).map_err(|_| {
            Error::Config(config::ConfigError::Message(
                "session.key must be at least 64 bytes".to_string(),
            ))
        }),
        None => {
            tracing::warn!("no session.key configured; sessions will not survive a restart");
            Ok(Key::generate())
        }
    }
}

/// Serves the site until the server is stopped.
pub async fn serve(settings: Settings, manager: AttendanceManager) -> Result<()> {
    let key = session_key(&settings)?;
    let cookie_secure = settings.session.cookie_secure;
    let state = web::Data::new(AppState::new(manager, settings.admin.clone()));
    let address = (settings.server.host.clone(), settings.server.port);

    tracing::info!(host = %address.0, port = address.1, "starting attendance server");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(session_middleware(key.clone(), cookie_secure))
            .wrap(Logger::default())
            .configure(configure)
    })
    .bind(address)?
    .run()
    .await?;

    Ok(())
}

fn html(page: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(page)
}

fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

fn login_path(role: Role) -> String {
    format!("/{role}/login")
}

/// The caller's identity if it has `role`; otherwise a redirect to that role's login page.
fn require_role(
    session: &SessionContext,
    role: Role,
) -> std::result::Result<Identity, HttpResponse> {
    session.identity_as(role).ok_or_else(|| {
        session.flash(FlashLevel::Error, format!("Please login as {role}."));
        redirect(&login_path(role))
    })
}

/// Turns a user-facing failure into a flash message and a redirect to `location`.
///
/// A session pointing at a deleted account is logged out first. Anything else is an internal
/// failure and becomes an error page.
fn recover(
    session: &SessionContext,
    err: Error,
    location: &str,
) -> actix_web::Result<HttpResponse> {
    if !err.is_user_error() {
        return Err(err.into());
    }

    tracing::info!(error = %err, location, "request rejected");
    if matches!(err, Error::NotFound(_)) {
        session.log_out();
    }
    session.flash(FlashLevel::Error, err.user_message());

    Ok(redirect(location))
}
