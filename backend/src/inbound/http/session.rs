//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! Wraps the Actix cookie session so handlers only persist or recover the
//! calling [`Actor`].

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::domain::{Actor, Error, UserId, Username};

pub(crate) const USER_ID_KEY: &str = "user_id";
pub(crate) const USERNAME_KEY: &str = "username";

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Construct a new wrapper from the underlying Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Persist the caller's identity in the session cookie.
    pub fn persist_actor(&self, actor: &Actor) -> Result<(), Error> {
        self.0
            .insert(USER_ID_KEY, actor.user_id.as_ref())
            .and_then(|()| self.0.insert(USERNAME_KEY, actor.username.as_ref()))
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// Recover the caller from the session, if present and well formed.
    pub fn actor(&self) -> Result<Option<Actor>, Error> {
        let read = |key: &str| {
            self.0
                .get::<String>(key)
                .map_err(|error| Error::internal(format!("failed to read session: {error}")))
        };
        let (Some(raw_id), Some(raw_name)) = (read(USER_ID_KEY)?, read(USERNAME_KEY)?) else {
            return Ok(None);
        };
        let user_id = match UserId::new(raw_id) {
            Ok(id) => id,
            Err(error) => {
                warn!(%error, "invalid user id in session cookie");
                return Ok(None);
            }
        };
        match Username::new(raw_name) {
            Ok(username) => Ok(Some(Actor::new(user_id, username))),
            Err(error) => {
                warn!(%error, "invalid username in session cookie");
                Ok(None)
            }
        }
    }

    /// Drop the session; the response clears the cookie.
    pub fn purge(&self) {
        self.0.purge();
    }

    /// Require a logged-in caller or return `401 Unauthorized`.
    pub fn require_actor(&self) -> Result<Actor, Error> {
        self.actor()?
            .ok_or_else(|| Error::unauthorized("login required"))
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test, web};

    use super::*;
    use crate::inbound::http::test_utils::{session_cookie, test_session_middleware};

    const FIXTURE_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

    #[actix_web::test]
    async fn round_trips_actor() {
        let app = test::init_service(
            App::new()
                .wrap(test_session_middleware())
                .route(
                    "/set",
                    web::get().to(|session: SessionContext| async move {
                        let actor = Actor::new(
                            UserId::new(FIXTURE_ID).expect("fixture id"),
                            Username::new("Ada").expect("fixture name"),
                        );
                        session.persist_actor(&actor)?;
                        Ok::<_, Error>(HttpResponse::Ok())
                    }),
                )
                .route(
                    "/get",
                    web::get().to(|session: SessionContext| async move {
                        let actor = session.require_actor()?;
                        Ok::<_, Error>(
                            HttpResponse::Ok().body(format!("{}:{}", actor.user_id, actor.username)),
                        )
                    }),
                ),
        )
        .await;

        let set_res =
            test::call_service(&app, test::TestRequest::get().uri("/set").to_request()).await;
        assert_eq!(set_res.status(), StatusCode::OK);
        let cookie = session_cookie(&set_res);

        let get_res = test::call_service(
            &app,
            test::TestRequest::get().uri("/get").cookie(cookie).to_request(),
        )
        .await;
        assert_eq!(get_res.status(), StatusCode::OK);
        let body = test::read_body(get_res).await;
        assert_eq!(body, format!("{FIXTURE_ID}:Ada"));
    }

    #[actix_web::test]
    async fn purged_session_forgets_the_actor() {
        let app = test::init_service(
            App::new()
                .wrap(test_session_middleware())
                .route(
                    "/set",
                    web::get().to(|session: SessionContext| async move {
                        let actor = Actor::new(
                            UserId::new(FIXTURE_ID).expect("fixture id"),
                            Username::new("Ada").expect("fixture name"),
                        );
                        session.persist_actor(&actor)?;
                        Ok::<_, Error>(HttpResponse::Ok())
                    }),
                )
                .route(
                    "/purge",
                    web::get().to(|session: SessionContext| async move {
                        session.purge();
                        HttpResponse::NoContent()
                    }),
                ),
        )
        .await;

        let set_res =
            test::call_service(&app, test::TestRequest::get().uri("/set").to_request()).await;
        let cookie = session_cookie(&set_res);
        let purge_res = test::call_service(
            &app,
            test::TestRequest::get().uri("/purge").cookie(cookie).to_request(),
        )
        .await;

        assert_eq!(purge_res.status(), StatusCode::NO_CONTENT);
        let removal = session_cookie(&purge_res);
        assert_eq!(removal.value(), "");
    }

    #[actix_web::test]
    async fn missing_actor_is_unauthorised() {
        let app = test::init_service(App::new().wrap(test_session_middleware()).route(
            "/require",
            web::get().to(|session: SessionContext| async move {
                session.require_actor()?;
                Ok::<_, Error>(HttpResponse::Ok())
            }),
        ))
        .await;

        let res =
            test::call_service(&app, test::TestRequest::get().uri("/require").to_request()).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn tampered_user_id_is_unauthorised() {
        let app = test::init_service(
            App::new()
                .wrap(test_session_middleware())
                .route(
                    "/set-invalid",
                    web::get().to(|session: Session| async move {
                        session
                            .insert(USER_ID_KEY, "not-a-uuid")
                            .expect("set invalid user id");
                        session
                            .insert(USERNAME_KEY, "Ada")
                            .expect("set username");
                        HttpResponse::Ok()
                    }),
                )
                .route(
                    "/require",
                    web::get().to(|session: SessionContext| async move {
                        session.require_actor()?;
                        Ok::<_, Error>(HttpResponse::Ok())
                    }),
                ),
        )
        .await;

        let set_res = test::call_service(
            &app,
            test::TestRequest::get().uri("/set-invalid").to_request(),
        )
        .await;
        let cookie = session_cookie(&set_res);

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/require")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
