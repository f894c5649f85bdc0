//! The upstream auth proxy authenticates users and forwards their id in the `X-Authenticated-User` header. Handlers
//! that act on behalf of a user take an [`AuthenticatedUser`] argument, and the request is rejected with a 401 if the
//! header is missing or is not a user id.
use actix_web::{dev::Payload, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use log::*;
use order_engine::db_types::UserId;

use crate::errors::ServerError;

pub const USER_HEADER: &str = "X-Authenticated-User";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub UserId);

impl AuthenticatedUser {
    pub fn user_id(&self) -> UserId {
        self.0
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(user_from_request(req))
    }
}

fn user_from_request(req: &HttpRequest) -> Result<AuthenticatedUser, ServerError> {
    let value = req.headers().get(USER_HEADER).ok_or_else(|| {
        debug!("💻️ Request to {} has no {USER_HEADER} header", req.path());
        ServerError::Unauthenticated(format!("Missing {USER_HEADER} header"))
    })?;
    let id = value
        .to_str()
        .ok()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .ok_or_else(|| {
            warn!("💻️ Request to {} has an invalid {USER_HEADER} header: {value:?}", req.path());
            ServerError::Unauthenticated(format!("Invalid {USER_HEADER} header"))
        })?;
    Ok(AuthenticatedUser(UserId(id)))
}
