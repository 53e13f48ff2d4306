use actix_web::HttpResponse;

use super::session::{FlashLevel, SessionContext};
use super::{html, redirect, views};

/// `GET /`
pub async fn index(session: SessionContext) -> HttpResponse {
    let identity = session.identity();
    html(views::index(identity.as_ref(), &session.take_flashes()))
}

/// `GET /logout`. Clears the session whether or not anyone was logged in.
pub async fn logout(session: SessionContext) -> HttpResponse {
    if let Some(identity) = session.identity() {
        tracing::info!(role = %identity.role, user_id = ?identity.user_id, "logged out");
    }

    session.log_out();
    session.flash(FlashLevel::Info, "Logged out.");
    redirect("/")
}
