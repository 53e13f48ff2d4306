//! The admin capability path: a configured credential, not a stored account.

use actix_web::{HttpResponse, web};
use serde::Deserialize;

use super::session::{FlashLevel, Identity, SessionContext};
use super::views::StoreCounts;
use super::{AppState, html, login_path, recover, redirect, require_role, views, with_store};
use crate::models::Role;
use crate::summary;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AdminLoginForm {
    pub username: String,
    pub password: String,
}

pub async fn login_form(session: SessionContext) -> HttpResponse {
    html(views::login(Role::Admin, &session.take_flashes()))
}

/// `POST /admin/login`
pub async fn login(
    state: web::Data<AppState>,
    session: SessionContext,
    form: web::Form<AdminLoginForm>,
) -> actix_web::Result<HttpResponse> {
    match state.authenticate_admin(&form.username, &form.password) {
        Ok(()) => {
            session.log_in(&Identity::admin())?;
            session.flash(FlashLevel::Success, "Logged in as admin.");
            tracing::info!("admin logged in");
            Ok(redirect("/admin/dashboard"))
        }
        Err(err) => recover(&session, err, &login_path(Role::Admin)),
    }
}

/// `GET /admin/dashboard`
pub async fn dashboard(
    state: web::Data<AppState>,
    session: SessionContext,
) -> actix_web::Result<HttpResponse> {
    let identity = match require_role(&session, Role::Admin) {
        Ok(identity) => identity,
        Err(response) => return Ok(response),
    };

    let loaded = with_store(&state, |manager| {
        let counts = StoreCounts {
            students: manager.num_students()?,
            teachers: manager.num_teachers()?,
            attendance_records: manager.num_attendance_records()?,
        };
        let mut students = Vec::new();
        for student in manager.list_students()? {
            let records = manager.get_student_attendance(student.id)?;
            students.push((student, summary::overall(&records)));
        }
        Ok((counts, students))
    })
    .await;

    match loaded {
        Ok((counts, students)) => Ok(html(views::admin_dashboard(
            &identity,
            &counts,
            &students,
            &session.take_flashes(),
        ))),
        Err(err) => recover(&session, err, "/"),
    }
}
