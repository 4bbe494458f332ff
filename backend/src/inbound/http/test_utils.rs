//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_http::Request;
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{HttpResponse, test as actix_test, web};
use chrono::{TimeZone, Utc};

use crate::domain::ports::{
    MockAccountService, MockCodeGenerator, MockProjectRecommender, MockProjectService,
    MockSocialService, MockUserFiles,
};
use crate::domain::{
    DisplayName, Email, Error, ExternalSource, Project, ProjectId, ProjectType, User, UserId,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

pub const ADA: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";
pub const GRACE: &str = "9b2e4d1c-6a7f-4c3b-8e5d-0f1a2b3c4d5e";
pub const PROJECT: &str = "5d1c9a7e-2b3f-4e6d-8a9b-0c1d2e3f4a5b";

/// Session middleware with a fresh key and the `Secure` flag disabled so
/// cookies survive plain-HTTP test requests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Mock ports for handler tests; set expectations before calling
/// [`MockPorts::into_state`]. Unexpected calls panic.
#[derive(Default)]
pub struct MockPorts {
    pub accounts: MockAccountService,
    pub projects: MockProjectService,
    pub recommender: MockProjectRecommender,
    pub social: MockSocialService,
    pub generator: MockCodeGenerator,
    pub files: MockUserFiles,
}

impl MockPorts {
    pub fn into_state(self) -> HttpState {
        HttpState {
            accounts: Arc::new(self.accounts),
            projects: Arc::new(self.projects),
            recommender: Arc::new(self.recommender),
            social: Arc::new(self.social),
            generator: Arc::new(self.generator),
            files: Arc::new(self.files),
        }
    }
}

/// Extract the session cookie set by a response.
pub fn session_cookie<B>(res: &ServiceResponse<B>) -> Cookie<'static> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie set")
        .into_owned()
}

/// Register `GET /__test/login/{id}` which signs the given user in.
pub fn login_route(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/__test/login/{id}",
        web::get().to(
            |session: SessionContext, path: web::Path<String>| async move {
                let id = UserId::new(path.into_inner()).expect("fixture user id");
                session.persist_user(&id)?;
                Ok::<_, Error>(HttpResponse::Ok().finish())
            },
        ),
    );
}

/// Sign `user` in through [`login_route`] and return the session cookie.
pub async fn sign_in<S, B>(app: &S, user: &str) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
{
    let req = actix_test::TestRequest::get()
        .uri(&format!("/__test/login/{user}"))
        .to_request();
    let res = actix_test::call_service(app, req).await;
    session_cookie(&res)
}

pub fn user_id(raw: &str) -> UserId {
    UserId::new(raw).expect("fixture user id")
}

pub fn sample_user(id: &str, name: &str) -> User {
    let at = Utc
        .with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
        .single()
        .expect("fixture timestamp");
    User {
        id: user_id(id),
        email: Email::new(format!("{}@example.com", name.to_lowercase())).expect("fixture email"),
        name: DisplayName::new(name).expect("fixture name"),
        avatar: None,
        bio: None,
        created_at: at,
        updated_at: at,
    }
}

pub fn sample_project(id: &str, author: &User) -> Project {
    Project {
        id: ProjectId::new(id).expect("fixture project id"),
        author_id: Some(author.id.clone()),
        title: "Bouncing ball".to_owned(),
        description: "Canvas physics demo".to_owned(),
        files: Vec::new(),
        main_file: None,
        is_public: true,
        views: 7,
        likes: 2,
        external: ExternalSource {
            url: Some("https://codepen.io/ada/pen/ball".to_owned()),
            ..ExternalSource::default()
        },
        project_type: ProjectType::External,
        created_at: author.created_at,
        updated_at: author.created_at,
    }
}

/// Initialise a test service with `ports` as state, the session middleware,
/// [`login_route`] and `$configure` mounted under `/api`.
macro_rules! test_app {
    ($ports:expr, $configure:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($ports.into_state()))
                .wrap($crate::inbound::http::test_utils::test_session_middleware())
                .configure($crate::inbound::http::test_utils::login_route)
                .service(actix_web::web::scope("/api").configure($configure)),
        )
        .await
    };
}
pub(crate) use test_app;
