//! Message bundles and the locale switch.
//!
//! `GET /api/i18n/messages` serves the negotiated bundle merged over the
//! default locale and `GET /api/i18n/messages/{key}` resolves one dotted key. `GET /locale/{tag}` is mounted at the application root so
//! plain links can switch language and bounce back to the current page.

use actix_web::cookie::time::Duration;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, get, web};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    LOCALE_COOKIE, Locale, messages_with_fallback, negotiate_locale, safe_redirect, translate,
};

const LOCALE_COOKIE_MAX_AGE: Duration = Duration::days(365);

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MessagesParams {
    /// Explicit locale; wins over the cookie and `Accept-Language`.
    pub locale: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SwitchParams {
    /// Same-site path to return to; anything else redirects to `/`.
    pub redirect: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessagesResponse {
    #[schema(example = "en")]
    pub locale: String,
    /// Nested message bundle keyed by dotted path segments.
    #[schema(value_type = Object)]
    pub messages: Value,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "zh")]
    pub locale: String,
    #[schema(example = "feed.title")]
    pub key: String,
    /// Translated text; the key itself when no bundle defines it.
    #[schema(example = "为你推荐")]
    pub message: String,
}

fn request_locale(req: &HttpRequest, explicit: Option<&str>) -> Locale {
    let cookie = req.cookie(LOCALE_COOKIE);
    let accept = req
        .headers()
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|value| value.to_str().ok());
    negotiate_locale(explicit, cookie.as_ref().map(Cookie::value), accept)
}

/// Message bundle for the negotiated locale.
#[utoipa::path(
    get,
    path = "/api/i18n/messages",
    params(MessagesParams),
    responses((status = 200, description = "Bundle", body = MessagesResponse)),
    tags = ["i18n"],
    operation_id = "getMessages",
    security([])
)]
#[get("/messages")]
pub async fn get_messages(
    req: HttpRequest,
    query: web::Query<MessagesParams>,
) -> web::Json<MessagesResponse> {
    let locale = request_locale(&req, query.locale.as_deref());
    web::Json(MessagesResponse {
        locale: locale.as_str().to_owned(),
        messages: messages_with_fallback(locale),
    })
}

/// One message resolved by dotted key for the negotiated locale.
#[utoipa::path(
    get,
    path = "/api/i18n/messages/{key}",
    params(
        ("key" = String, Path, description = "Dotted message key such as `feed.title`"),
        MessagesParams
    ),
    responses((status = 200, description = "Message", body = MessageResponse)),
    tags = ["i18n"],
    operation_id = "getMessage",
    security([])
)]
#[get("/messages/{key}")]
pub async fn get_message(
    req: HttpRequest,
    key: web::Path<String>,
    query: web::Query<MessagesParams>,
) -> web::Json<MessageResponse> {
    let locale = request_locale(&req, query.locale.as_deref());
    let key = key.into_inner();
    web::Json(MessageResponse {
        locale: locale.as_str().to_owned(),
        message: translate(locale, &key),
        key,
    })
}

/// Remember `tag` in the locale cookie and redirect back.
#[utoipa::path(
    get,
    path = "/locale/{tag}",
    params(
        ("tag" = String, Path, description = "Locale tag such as `en` or `zh-CN`"),
        SwitchParams
    ),
    responses((status = 303, description = "Redirect with the locale cookie set")),
    tags = ["i18n"],
    operation_id = "switchLocale",
    security([])
)]
#[get("/locale/{tag}")]
pub async fn switch_locale(
    path: web::Path<String>,
    query: web::Query<SwitchParams>,
) -> HttpResponse {
    let locale = Locale::from_tag(&path).unwrap_or_default();
    let target = safe_redirect(query.redirect.as_deref());
    debug!(requested = %path, %locale, %target, "switching locale");
    let cookie = Cookie::build(LOCALE_COOKIE, locale.as_str())
        .path("/")
        .same_site(SameSite::Lax)
        .max_age(LOCALE_COOKIE_MAX_AGE)
        .finish();
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, target))
        .cookie(cookie)
        .finish()
}

/// Register the bundle endpoint under `/i18n`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/i18n")
            .service(get_messages)
            .service(get_message),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use rstest::rstest;

    #[rstest]
    #[case("/api/i18n/messages?locale=zh", None, None, "zh")]
    #[case("/api/i18n/messages", Some("zh"), Some("en"), "zh")]
    #[case("/api/i18n/messages", None, Some("zh-CN,en;q=0.5"), "zh")]
    #[case("/api/i18n/messages?locale=fr", None, None, "en")]
    #[actix_web::test]
    async fn messages_follow_negotiation(
        #[case] uri: &str,
        #[case] cookie: Option<&str>,
        #[case] accept: Option<&str>,
        #[case] expected: &str,
    ) {
        let app = actix_test::init_service(
            App::new().service(web::scope("/api").configure(configure)),
        )
        .await;
        let mut req = actix_test::TestRequest::get().uri(uri);
        if let Some(value) = cookie {
            req = req.cookie(Cookie::new(LOCALE_COOKIE, value));
        }
        if let Some(value) = accept {
            req = req.insert_header((header::ACCEPT_LANGUAGE, value));
        }
        let res = actix_test::call_service(&app, req.to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["locale"], expected);
        assert!(body["messages"].is_object());
    }

    #[rstest]
    #[case("/api/i18n/messages/feed.title?locale=zh", None, "zh", "为你推荐")]
    #[case("/api/i18n/messages/feed.title", Some("zh-TW"), "zh", "为你推荐")]
    #[case("/api/i18n/messages/feed.title", None, "en", "For you")]
    #[case("/api/i18n/messages/missing.key?locale=zh", None, "zh", "missing.key")]
    #[actix_web::test]
    async fn single_messages_resolve_with_fallback(
        #[case] uri: &str,
        #[case] accept: Option<&str>,
        #[case] locale: &str,
        #[case] message: &str,
    ) {
        let app = actix_test::init_service(
            App::new().service(web::scope("/api").configure(configure)),
        )
        .await;
        let mut req = actix_test::TestRequest::get().uri(uri);
        if let Some(value) = accept {
            req = req.insert_header((header::ACCEPT_LANGUAGE, value));
        }
        let res = actix_test::call_service(&app, req.to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: MessageResponse = actix_test::read_body_json(res).await;
        assert_eq!(body.locale, locale);
        assert_eq!(body.message, message);
    }

    #[rstest]
    #[case("/locale/zh-CN?redirect=/projects/1", "zh", "/projects/1")]
    #[case("/locale/zh?redirect=https://evil.example", "zh", "/")]
    #[case("/locale/xx?redirect=//evil.example", "en", "/")]
    #[case("/locale/en", "en", "/")]
    #[actix_web::test]
    async fn switching_sets_the_cookie_and_redirects(
        #[case] uri: &str,
        #[case] locale: &str,
        #[case] location: &str,
    ) {
        let app = actix_test::init_service(App::new().service(switch_locale)).await;
        let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            res.headers()
                .get(header::LOCATION)
                .and_then(|value| value.to_str().ok()),
            Some(location)
        );
        let cookie = res
            .response()
            .cookies()
            .find(|cookie| cookie.name() == LOCALE_COOKIE)
            .expect("locale cookie");
        assert_eq!(cookie.value(), locale);
        assert_eq!(cookie.path(), Some("/"));
    }
}
