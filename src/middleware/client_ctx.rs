use crate::service::person::PersonResponse;
use crate::service::PersonService;
use actix_session::Session;
use actix_web::dev::{self, Extensions, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{web::Data, Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::{ready, LocalBoxFuture, Ready};
use sea_orm::DatabaseConnection;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Header carrying the acting person on API calls.
pub const PERSON_ID_HEADER: &str = "Personid";

/// Session key written by the web login.
pub const SESSION_PERSON_KEY: &str = "person_id";

/// Why a request carries no usable identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdentityError {
    /// Neither the header nor the session named a person.
    Missing,
    /// The header was not an integer.
    Malformed,
    /// The header named person 0, or the session names a person that no longer exists.
    LoggedOut,
}

impl std::fmt::Display for IdentityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentityError::Missing => write!(f, "missing {} header", PERSON_ID_HEADER),
            IdentityError::Malformed => write!(f, "invalid {} format", PERSON_ID_HEADER),
            IdentityError::LoggedOut => write!(f, "you are not logged in"),
        }
    }
}

impl std::error::Error for IdentityError {}

/// Reads the acting person from the `Personid` header. `None` when absent.
pub fn person_id_from_header(req: &HttpRequest) -> Option<Result<i32, IdentityError>> {
    let value = req.headers().get(PERSON_ID_HEADER)?;
    let parsed = value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse::<i32>().ok())
        .ok_or(IdentityError::Malformed)
        .and_then(|id| match id {
            0 => Err(IdentityError::LoggedOut),
            id => Ok(id),
        });
    Some(parsed)
}

/// Identity data for a single request cycle. Built fresh for every request.
#[derive(Clone, Debug)]
pub struct ClientCtxInner {
    /// Acting person id, or why there is none.
    pub identity: Result<i32, IdentityError>,
    /// Only resolved for session logins; API callers are trusted by id.
    pub person: Option<PersonResponse>,
    /// Time the request started for page load statistics.
    pub request_start: Instant,
}

impl Default for ClientCtxInner {
    fn default() -> Self {
        Self {
            identity: Err(IdentityError::Missing),
            person: None,
            request_start: Instant::now(),
        }
    }
}

impl ClientCtxInner {
    /// Header first, then the session cookie.
    pub async fn from_request(
        req: &HttpRequest,
        session: Option<&Session>,
        db: Option<&DatabaseConnection>,
    ) -> Self {
        if let Some(identity) = person_id_from_header(req) {
            return Self {
                identity,
                ..Default::default()
            };
        }

        match session {
            Some(session) => Self::from_session(session, db).await,
            None => Self::default(),
        }
    }

    pub async fn from_session(session: &Session, db: Option<&DatabaseConnection>) -> Self {
        let person_id = match session.get::<i32>(SESSION_PERSON_KEY) {
            Ok(Some(id)) => id,
            Ok(None) => return Self::default(),
            Err(e) => {
                log::error!("Unable to read {} from session: {}", SESSION_PERSON_KEY, e);
                return Self::default();
            }
        };

        let db = match db {
            Some(db) => db,
            None => {
                log::error!("Database is not loaded; cannot resolve session person.");
                return Self::default();
            }
        };

        match PersonService::new(db).get_person(person_id).await {
            Ok(person) => Self {
                identity: Ok(person.id),
                person: Some(person),
                ..Default::default()
            },
            Err(e) => {
                log::debug!("Session person {} rejected: {}", person_id, e);
                session.remove(SESSION_PERSON_KEY);
                Self {
                    identity: Err(IdentityError::LoggedOut),
                    ..Default::default()
                }
            }
        }
    }
}

/// Client context passed to routes.
/// Wraps ClientCtxInner, which is set at the beginning of the request.
#[derive(Clone, Debug)]
pub struct ClientCtx(Data<ClientCtxInner>);

impl Default for ClientCtx {
    fn default() -> Self {
        Self(Data::new(ClientCtxInner::default()))
    }
}

impl ClientCtx {
    pub fn get_or_default_from_extensions(extensions: &mut Extensions) -> Self {
        match extensions.get::<Data<ClientCtxInner>>() {
            Some(cbox) => Self(cbox.clone()),
            None => {
                let cbox = Data::new(ClientCtxInner::default());
                extensions.insert(cbox.clone());
                Self(cbox)
            }
        }
    }

    /// Acting person id or the identity failure.
    pub fn person_id(&self) -> Result<i32, IdentityError> {
        self.0.identity
    }

    pub fn get_person(&self) -> Option<&PersonResponse> {
        self.0.person.as_ref()
    }

    /// Display name for the page header.
    pub fn get_name(&self) -> String {
        match &self.0.person {
            Some(person) => person.name.to_owned(),
            None => "Guest".to_owned(),
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.0.identity.is_ok()
    }

    /// Returns Duration representing request time.
    pub fn request_time(&self) -> Duration {
        Instant::now() - self.0.request_start
    }

    /// Returns human readable representing request time.
    pub fn request_time_as_string(&self) -> String {
        let us = self.request_time().as_micros();
        if us > 5000 {
            format!("{}ms", us / 1000)
        } else {
            format!("{}μs", us)
        }
    }

    /// Require a logged in person. Returns person_id or ErrorUnauthorized.
    pub fn require_login(&self) -> Result<i32, actix_web::Error> {
        self.0
            .identity
            .map_err(|_| actix_web::error::ErrorUnauthorized("You are not logged in."))
    }
}

/// Provides `client: ClientCtx` in route parameters.
impl FromRequest for ClientCtx {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(ClientCtx::get_or_default_from_extensions(
            &mut req.extensions_mut(),
        )))
    }
}

impl<S: 'static, B> Transform<S, ServiceRequest> for ClientCtx
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = ClientCtxMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ClientCtxMiddleware {
            service: Rc::new(service),
        }))
    }
}

/// Client context middleware
pub struct ClientCtxMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for ClientCtxMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let svc = self.service.clone();

        // Borrows of `req` must be done in a precise way to avoid conflicts. This order is important.
        let (httpreq, payload) = req.into_parts();
        let session = Session::extract(&httpreq).into_inner();
        let req = ServiceRequest::from_parts(httpreq, payload);

        Box::pin(async move {
            let session = match session {
                Ok(session) => Some(session),
                Err(err) => {
                    log::error!("Unable to extract Session data in middleware: {}", err);
                    None
                }
            };
            let db = req.app_data::<Data<DatabaseConnection>>().cloned();

            let inner = ClientCtxInner::from_request(
                req.request(),
                session.as_ref(),
                db.as_ref().map(|db| db.get_ref()),
            )
            .await;
            req.extensions_mut().insert(Data::new(inner));

            svc.call(req).await
        })
    }
}
