//! Student registration, login, and the per-subject summary.

use actix_web::{HttpResponse, web};
use serde::Deserialize;

use super::session::{FlashLevel, Identity, SessionContext};
use super::{
    AppState, html, login_path, off_store, recover, redirect, require_role, views, with_store,
};
use crate::manager::StudentRegistration;
use crate::models::Role;
use crate::password::check_credentials;

const REGISTER: &str = "/student/register";
const DASHBOARD: &str = "/student/dashboard";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

pub async fn register_form(session: SessionContext) -> HttpResponse {
    html(views::student_register(&session.take_flashes()))
}

/// `POST /student/register`
pub async fn register(
    state: web::Data<AppState>,
    session: SessionContext,
    form: web::Form<StudentRegistration>,
) -> actix_web::Result<HttpResponse> {
    let form = form.into_inner();

    let registered = match off_store(move || form.prepare()).await {
        Ok(new) => with_store(&state, move |manager| manager.create_student(&new)).await,
        Err(err) => Err(err),
    };

    match registered {
        Ok(_) => {
            session.flash(
                FlashLevel::Success,
                "Student registered successfully. Please login.",
            );
            Ok(redirect(&login_path(Role::Student)))
        }
        Err(err) => recover(&session, err, REGISTER),
    }
}

pub async fn login_form(session: SessionContext) -> HttpResponse {
    html(views::login(Role::Student, &session.take_flashes()))
}

/// `POST /student/login`
pub async fn login(
    state: web::Data<AppState>,
    session: SessionContext,
    form: web::Form<LoginForm>,
) -> actix_web::Result<HttpResponse> {
    let LoginForm { email, password } = form.into_inner();

    let found = with_store(&state, move |manager| manager.find_student_by_email(&email)).await;
    let checked = match found {
        Ok(found) => off_store(move || check_credentials(found, &password)).await,
        Err(err) => Err(err),
    };

    match checked {
        Ok(student) => {
            session.log_in(&Identity::student(&student))?;
            session.flash(FlashLevel::Success, "Logged in as student.");
            tracing::info!(student_id = student.id, "student logged in");
            Ok(redirect(DASHBOARD))
        }
        Err(err) => recover(&session, err, &login_path(Role::Student)),
    }
}

/// `GET /student/dashboard`
pub async fn dashboard(
    state: web::Data<AppState>,
    session: SessionContext,
) -> actix_web::Result<HttpResponse> {
    let identity = match require_role(&session, Role::Student) {
        Ok(identity) => identity,
        Err(response) => return Ok(response),
    };
    let student_id = identity.user_id.unwrap_or_default();

    let loaded = with_store(&state, move |manager| {
        let student = manager.get_student(student_id)?;
        let summaries = manager.summarize(student.id)?;
        Ok((student, summaries))
    })
    .await;

    match loaded {
        Ok((student, summaries)) => Ok(html(views::student_dashboard(
            &identity,
            &student,
            &summaries,
            &session.take_flashes(),
        ))),
        Err(err) => recover(&session, err, &login_path(Role::Student)),
    }
}
