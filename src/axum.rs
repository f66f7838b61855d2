use std::{marker::PhantomData, ops::Deref, sync::Arc};

use async_trait::async_trait;
use axum_core::{
    extract::{FromRef, FromRequestParts},
    response::{IntoResponse, IntoResponseParts, Response, ResponseParts},
};
use http::{header::HeaderName, request::Parts, HeaderMap, StatusCode};
use thiserror::Error as ThisError;

use crate::{
    AsNegotiationStr, CharsetNegotiation, CompositeNegotiator, ContentTypeNegotiation,
    EncodingNegotiation, Error, HeaderSource, LanguageNegotiation, Negotiated, NegotiationType,
    Negotiator,
};

/// Extracts the option of one dimension, negotiated against the
/// `Arc<Negotiator<N, T>>` found in the router state.
#[derive(Clone, Debug)]
pub struct Negotiation<N, T>(pub PhantomData<N>, pub T);

impl<N, T> Negotiation<N, T> {
    pub fn into_inner(self) -> T {
        self.1
    }
}

impl<N, T> Deref for Negotiation<N, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.1
    }
}

#[async_trait]
impl<S, N, T> FromRequestParts<S> for Negotiation<N, T>
where
    Arc<Negotiator<N, T>>: FromRef<S>,
    S: Send + Sync,
    N: NegotiationType,
    T: AsNegotiationStr + Clone,
{
    type Rejection = NegotiationError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let negotiator = Arc::<Negotiator<N, T>>::from_ref(state);
        ensure_visible_ascii(&parts.headers, N::associated_header())?;
        let header = parts.headers.header(N::HEADER_NAME).unwrap_or_default();
        let selected = negotiator
            .negotiate(&header)
            .map_err(NegotiationError::NegotiationFailure)?;

        Ok(Negotiation(PhantomData, selected.clone()))
    }
}

/// Extracts the outcome of a full negotiation against the
/// `Arc<CompositeNegotiator>` found in the router state.
#[async_trait]
impl<S> FromRequestParts<S> for Negotiated
where
    Arc<CompositeNegotiator>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = NegotiationError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let negotiator = Arc::<CompositeNegotiator>::from_ref(state);
        for name in [
            ContentTypeNegotiation::associated_header(),
            CharsetNegotiation::associated_header(),
            LanguageNegotiation::associated_header(),
            EncodingNegotiation::associated_header(),
        ] {
            ensure_visible_ascii(&parts.headers, name)?;
        }
        negotiator
            .negotiate(&parts.headers)
            .map_err(NegotiationError::NegotiationFailure)
    }
}

/// Returning the negotiation from a handler writes `Content-Type`,
/// `Content-Language`, `Content-Encoding` and `Vary`.
impl IntoResponseParts for Negotiated {
    type Error = NegotiationError;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        self.apply(res.headers_mut())
            .map_err(NegotiationError::NegotiationFailure)?;
        Ok(res)
    }
}

fn ensure_visible_ascii(headers: &HeaderMap, name: HeaderName) -> Result<(), NegotiationError> {
    if headers.get_all(&name).iter().any(|value| value.to_str().is_err()) {
        return Err(NegotiationError::InvalidHeader(name));
    }
    Ok(())
}

#[derive(ThisError, Eq, PartialEq, Debug)]
pub enum NegotiationError {
    #[error("invalid {0} header")]
    InvalidHeader(HeaderName),
    #[error("negotiation failure: {0}")]
    NegotiationFailure(Error),
}

impl IntoResponse for NegotiationError {
    fn into_response(self) -> Response {
        let status = match &self {
            NegotiationError::InvalidHeader(_) => StatusCode::BAD_REQUEST,
            NegotiationError::NegotiationFailure(err) => err.status_code(),
        };
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{Body, BoxBody},
        routing::get,
        Router,
    };
    use axum_core::{extract::FromRef, response::IntoResponse};
    use http::{
        header::{
            ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CONTENT_ENCODING, CONTENT_LANGUAGE,
            CONTENT_TYPE, VARY,
        },
        HeaderName, HeaderValue, Request, Response, StatusCode,
    };
    use tower::ServiceExt;

    use crate::{
        axum::Negotiation, AsNegotiationStr, CompositeNegotiator, ContentTypeNegotiation,
        Negotiated, Negotiator,
    };

    #[derive(Clone)]
    enum Content {
        Json,
        Text,
    }

    impl AsNegotiationStr for Content {
        fn as_str(&self) -> &str {
            match self {
                Content::Json => "application/json",
                Content::Text => "text/plain",
            }
        }
    }

    #[derive(Clone)]
    struct AppState {
        negotiator: Arc<Negotiator<ContentTypeNegotiation, Content>>,
        composite: Arc<CompositeNegotiator>,
    }

    impl FromRef<AppState> for Arc<Negotiator<ContentTypeNegotiation, Content>> {
        fn from_ref(input: &AppState) -> Self {
            Arc::clone(&input.negotiator)
        }
    }

    impl FromRef<AppState> for Arc<CompositeNegotiator> {
        fn from_ref(input: &AppState) -> Self {
            Arc::clone(&input.composite)
        }
    }

    fn router() -> Router {
        let composite = CompositeNegotiator::new()
            .with_available_content_types(["text/html", "application/json"])
            .unwrap()
            .with_available_charsets(["utf-8"])
            .unwrap()
            .with_available_languages(["en", "fr"])
            .unwrap()
            .with_available_encodings(["identity", "gzip"])
            .unwrap();
        Router::new()
            .route("/", get(handler))
            .route("/page", get(page))
            .with_state(AppState {
                negotiator: Arc::new(Negotiator::new([Content::Text, Content::Json]).unwrap()),
                composite: Arc::new(composite),
            })
    }

    async fn handler(
        Negotiation(_, content): Negotiation<ContentTypeNegotiation, Content>,
    ) -> impl IntoResponse {
        match content {
            Content::Json => "{\"message\":\"hello\"}".to_owned(),
            Content::Text => "hello".to_owned(),
        }
    }

    async fn page(negotiated: Negotiated) -> impl IntoResponse {
        let language = negotiated.language.clone();
        (negotiated, language)
    }

    async fn get_with(uri: &str, headers: &[(HeaderName, &str)]) -> Response<BoxBody> {
        let mut request = Request::builder().uri(uri);
        for (name, value) in headers {
            request = request.header(name, *value);
        }
        router()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn negotiate() {
        // JSON.
        let response = get_with("/", &[(ACCEPT, "application/json")]).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        assert_eq!(&body[..], b"{\"message\":\"hello\"}");

        // Text.
        let response = get_with("/", &[(ACCEPT, "text/plain")]).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        assert_eq!(&body[..], b"hello");

        // Default.
        let response = get_with("/", &[]).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        assert_eq!(&body[..], b"hello");

        // Not acceptable.
        let response = get_with("/", &[(ACCEPT, "image/png")]).await;
        assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);

        // Not visible ASCII.
        let response = router()
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(ACCEPT, HeaderValue::from_bytes(b"text/\xe9").unwrap())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn negotiate_composite() {
        let response = get_with(
            "/page",
            &[(ACCEPT_LANGUAGE, "fr, en;q=0.5"), (ACCEPT_ENCODING, "gzip")],
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/html; charset=utf-8");
        assert_eq!(response.headers()[CONTENT_LANGUAGE], "fr");
        assert_eq!(response.headers()[CONTENT_ENCODING], "gzip");
        assert_eq!(response.headers()[VARY], crate::VARY);
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        assert_eq!(&body[..], b"fr");

        let response = get_with("/page", &[(ACCEPT_LANGUAGE, "de")]).await;
        assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
    }
}
