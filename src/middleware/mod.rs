use crate::errors::ServiceError;
use actix_session::{Session, SessionExt, SessionInsertError};
use actix_web::{dev, FromRequest, HttpRequest};
use std::future::{ready, Ready};

const ACCOUNT_ID_KEY: &str = "account_id";

/// The account id carried by the session cookie.
///
/// This says who is calling, never what they may do: the role is looked up
/// again by whatever operation the handler runs.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedAccount {
    pub account_id: i64,
}

impl FromRequest for AuthenticatedAccount {
    type Error = ServiceError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let session = req.get_session();
        match session.get::<i64>(ACCOUNT_ID_KEY) {
            Ok(Some(account_id)) => ready(Ok(AuthenticatedAccount { account_id })),
            Ok(None) => ready(Err(ServiceError::Unauthenticated("Not logged in.".to_string()))),
            Err(e) => {
                log::warn!("Discarding unreadable session: {}", e);
                session.purge();
                ready(Err(ServiceError::Unauthenticated("Not logged in.".to_string())))
            }
        }
    }
}

/// Starts a fresh session for the account, dropping any previous session state.
pub fn start_session(session: &Session, account_id: i64) -> Result<(), SessionInsertError> {
    session.renew();
    session.insert(ACCOUNT_ID_KEY, account_id)
}

pub fn end_session(session: &Session) {
    session.purge();
}
