//! Teacher registration, login, roster loading, and attendance recording.

use std::collections::HashMap;

use actix_web::{HttpResponse, web};

use super::session::{FlashLevel, Identity, SessionContext};
use super::student::LoginForm;
use super::{
    AppState, html, login_path, off_store, recover, redirect, require_role, views, with_store,
};
use crate::error::Error;
use crate::lecture::{LectureDescriptor, statuses_from_form};
use crate::manager::TeacherRegistration;
use crate::models::Role;
use crate::password::check_credentials;

const REGISTER: &str = "/teacher/register";
const DASHBOARD: &str = "/teacher/dashboard";

pub async fn register_form(session: SessionContext) -> HttpResponse {
    html(views::teacher_register(&session.take_flashes()))
}

/// `POST /teacher/register`
pub async fn register(
    state: web::Data<AppState>,
    session: SessionContext,
    form: web::Form<TeacherRegistration>,
) -> actix_web::Result<HttpResponse> {
    let form = form.into_inner();

    let registered = match off_store(move || form.prepare()).await {
        Ok(new) => with_store(&state, move |manager| manager.create_teacher(&new)).await,
        Err(err) => Err(err),
    };

    match registered {
        Ok(_) => {
            session.flash(
                FlashLevel::Success,
                "Teacher registered successfully. Please login.",
            );
            Ok(redirect(&login_path(Role::Teacher)))
        }
        Err(err) => recover(&session, err, REGISTER),
    }
}

pub async fn login_form(session: SessionContext) -> HttpResponse {
    html(views::login(Role::Teacher, &session.take_flashes()))
}

/// `POST /teacher/login`
pub async fn login(
    state: web::Data<AppState>,
    session: SessionContext,
    form: web::Form<LoginForm>,
) -> actix_web::Result<HttpResponse> {
    let LoginForm { email, password } = form.into_inner();

    let found = with_store(&state, move |manager| manager.find_teacher_by_email(&email)).await;
    let checked = match found {
        Ok(found) => off_store(move || check_credentials(found, &password)).await,
        Err(err) => Err(err),
    };

    match checked {
        Ok(teacher) => {
            session.log_in(&Identity::teacher(&teacher))?;
            session.flash(FlashLevel::Success, "Logged in as teacher.");
            tracing::info!(teacher_id = teacher.id, "teacher logged in");
            Ok(redirect(DASHBOARD))
        }
        Err(err) => recover(&session, err, &login_path(Role::Teacher)),
    }
}

/// `GET /teacher/dashboard`, optionally with the lecture fields in the query string.
///
/// With a complete query the matching roster is shown for marking. A partial query shows the
/// form again with an error instead of querying.
pub async fn dashboard(
    state: web::Data<AppState>,
    session: SessionContext,
    query: web::Query<HashMap<String, String>>,
) -> actix_web::Result<HttpResponse> {
    let identity = match require_role(&session, Role::Teacher) {
        Ok(identity) => identity,
        Err(response) => return Ok(response),
    };
    let teacher_id = identity.user_id.unwrap_or_default();
    let query = query.into_inner();

    let lecture = if query.is_empty() {
        None
    } else {
        match LectureDescriptor::from_form(&query) {
            Ok(lecture) => Some(lecture),
            Err(Error::MissingField(_)) => {
                session.flash(FlashLevel::Error, "Please fill all fields to load students.");
                None
            }
            Err(err) if err.is_user_error() => {
                session.flash(FlashLevel::Error, err.user_message());
                None
            }
            Err(err) => return Err(err.into()),
        }
    };

    let loaded = with_store(&state, move |manager| {
        let teacher = manager.get_teacher(teacher_id)?;
        let roster = match lecture {
            Some(lecture) => Some(manager.load_roster(&lecture.section)?),
            None => None,
        };
        Ok((teacher, roster))
    })
    .await;

    match loaded {
        Ok((teacher, roster)) => Ok(html(views::teacher_dashboard(
            &identity,
            &teacher,
            &query,
            roster.as_deref(),
            &session.take_flashes(),
        ))),
        Err(err) => recover(&session, err, &login_path(Role::Teacher)),
    }
}

/// `POST /teacher/dashboard`: records one lecture for the whole section.
pub async fn record(
    state: web::Data<AppState>,
    session: SessionContext,
    form: web::Form<HashMap<String, String>>,
) -> actix_web::Result<HttpResponse> {
    let identity = match require_role(&session, Role::Teacher) {
        Ok(identity) => identity,
        Err(response) => return Ok(response),
    };
    let teacher_id = identity.user_id.unwrap_or_default();
    let form = form.into_inner();

    let lecture = match LectureDescriptor::from_form(&form) {
        Ok(lecture) => lecture,
        Err(err) => return recover(&session, err, DASHBOARD),
    };
    let submitted = statuses_from_form(&form);

    match with_store(&state, move |manager| {
        manager.record_lecture(teacher_id, &lecture, &submitted)
    })
    .await
    {
        Ok(_) => {
            session.flash(FlashLevel::Success, "Attendance saved successfully.");
            Ok(redirect(DASHBOARD))
        }
        Err(err @ Error::NotFound(_)) => recover(&session, err, &login_path(Role::Teacher)),
        Err(err) => recover(&session, err, DASHBOARD),
    }
}
