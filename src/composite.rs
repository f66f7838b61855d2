use crate::{
    encoding::IDENTITY, AsNegotiationStr, CharsetNegotiation, ContentTypeNegotiation,
    EncodingNegotiation, Error, HeaderSink, HeaderSource, LanguageNegotiation, NegotiationType,
    Negotiator,
};

/// Value of the `Vary` header written by [`CompositeNegotiator::negotiate_and_apply`].
pub const VARY: &str = "Accept,Accept-Charset,Accept-Language,Accept-Encoding";

/// Outcome of a full negotiation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Negotiated {
    pub content_type: String,
    pub charset: String,
    pub language: String,
    pub encoding: String,
}

impl Negotiated {
    /// `Content-Type` value with the charset parameter.
    pub fn content_type_header(&self) -> String {
        format!("{}; charset={}", self.content_type, self.charset)
    }

    pub fn is_identity(&self) -> bool {
        self.encoding.eq_ignore_ascii_case(IDENTITY)
    }

    /// Writes the representation headers and `Vary` onto a response.
    pub fn apply<W: HeaderSink + ?Sized>(&self, response: &mut W) -> Result<(), Error> {
        response.set_header("Content-Type", self.content_type_header())?;
        response.set_header("Content-Language", self.language.clone())?;
        if !self.is_identity() {
            response.set_header("Content-Encoding", self.encoding.clone())?;
        }
        response.set_header("Vary", VARY.to_owned())
    }
}

/// Negotiates all four dimensions of one request. Content types, charsets
/// and languages must be configured before use; encodings default to
/// `identity`.
///
/// ```
/// use std::collections::BTreeMap;
///
/// use http_conneg::CompositeNegotiator;
///
/// let negotiator = CompositeNegotiator::new()
///     .with_available_content_types(["text/html", "application/json"])?
///     .with_available_charsets(["utf-8"])?
///     .with_available_languages(["en-US", "fr"])?
///     .with_available_encodings(["identity", "gzip"])?;
///
/// let request = BTreeMap::from([
///     ("Accept".to_owned(), "application/json".to_owned()),
///     ("Accept-Language".to_owned(), "fr, en;q=0.5".to_owned()),
///     ("Accept-Encoding".to_owned(), "gzip".to_owned()),
/// ]);
/// let mut response = BTreeMap::<String, String>::new();
/// let negotiated = negotiator.negotiate_and_apply(&request, &mut response)?;
/// assert_eq!(negotiated.language, "fr");
/// assert_eq!(response["Content-Type"], "application/json; charset=utf-8");
/// assert_eq!(response["Content-Encoding"], "gzip");
/// # Ok::<(), http_conneg::Error>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct CompositeNegotiator {
    content_types: Option<Negotiator<ContentTypeNegotiation, String>>,
    charsets: Option<Negotiator<CharsetNegotiation, String>>,
    languages: Option<Negotiator<LanguageNegotiation, String>>,
    encodings: Option<Negotiator<EncodingNegotiation, String>>,
}

impl CompositeNegotiator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available_content_types<I>(&mut self, iter: I) -> Result<&mut Self, Error>
    where
        I: IntoIterator,
        I::Item: AsNegotiationStr,
    {
        self.content_types = Some(owned_negotiator(iter)?);
        Ok(self)
    }

    pub fn set_available_charsets<I>(&mut self, iter: I) -> Result<&mut Self, Error>
    where
        I: IntoIterator,
        I::Item: AsNegotiationStr,
    {
        self.charsets = Some(owned_negotiator(iter)?);
        Ok(self)
    }

    pub fn set_available_languages<I>(&mut self, iter: I) -> Result<&mut Self, Error>
    where
        I: IntoIterator,
        I::Item: AsNegotiationStr,
    {
        self.languages = Some(owned_negotiator(iter)?);
        Ok(self)
    }

    pub fn set_available_encodings<I>(&mut self, iter: I) -> Result<&mut Self, Error>
    where
        I: IntoIterator,
        I::Item: AsNegotiationStr,
    {
        self.encodings = Some(owned_negotiator(iter)?);
        Ok(self)
    }

    pub fn with_available_content_types<I>(mut self, iter: I) -> Result<Self, Error>
    where
        I: IntoIterator,
        I::Item: AsNegotiationStr,
    {
        self.set_available_content_types(iter)?;
        Ok(self)
    }

    pub fn with_available_charsets<I>(mut self, iter: I) -> Result<Self, Error>
    where
        I: IntoIterator,
        I::Item: AsNegotiationStr,
    {
        self.set_available_charsets(iter)?;
        Ok(self)
    }

    pub fn with_available_languages<I>(mut self, iter: I) -> Result<Self, Error>
    where
        I: IntoIterator,
        I::Item: AsNegotiationStr,
    {
        self.set_available_languages(iter)?;
        Ok(self)
    }

    pub fn with_available_encodings<I>(mut self, iter: I) -> Result<Self, Error>
    where
        I: IntoIterator,
        I::Item: AsNegotiationStr,
    {
        self.set_available_encodings(iter)?;
        Ok(self)
    }

    /// Negotiates every dimension. All failing dimensions are reported
    /// together in [`Error::NotAcceptable`].
    pub fn negotiate<R: HeaderSource + ?Sized>(&self, request: &R) -> Result<Negotiated, Error> {
        let content_types = configured(&self.content_types)?;
        let charsets = configured(&self.charsets)?;
        let languages = configured(&self.languages)?;

        let content_type = negotiate_dimension(content_types, request);
        let charset = negotiate_dimension(charsets, request);
        let language = negotiate_dimension(languages, request);
        let encoding = match &self.encodings {
            Some(encodings) => negotiate_dimension(encodings, request),
            None => negotiate_dimension(&default_encodings()?, request),
        };

        match (content_type, charset, language, encoding) {
            (Ok(content_type), Ok(charset), Ok(language), Ok(encoding)) => Ok(Negotiated {
                content_type,
                charset,
                language,
                encoding,
            }),
            (content_type, charset, language, encoding) => {
                let mut rejections = Vec::new();
                for result in [
                    content_type.map(drop),
                    charset.map(drop),
                    language.map(drop),
                    encoding.map(drop),
                ] {
                    match result {
                        Ok(()) => {}
                        Err(Error::NotAcceptable(failed)) => rejections.extend(failed),
                        Err(err) => return Err(err),
                    }
                }
                Err(Error::NotAcceptable(rejections))
            }
        }
    }

    /// [`negotiate`](Self::negotiate), then writes `Content-Type`,
    /// `Content-Language`, `Content-Encoding` (unless identity) and `Vary`.
    pub fn negotiate_and_apply<R, W>(
        &self,
        request: &R,
        response: &mut W,
    ) -> Result<Negotiated, Error>
    where
        R: HeaderSource + ?Sized,
        W: HeaderSink + ?Sized,
    {
        let negotiated = self.negotiate(request)?;
        negotiated.apply(response)?;
        Ok(negotiated)
    }
}

fn owned_negotiator<N, I>(iter: I) -> Result<Negotiator<N, String>, Error>
where
    N: NegotiationType,
    I: IntoIterator,
    I::Item: AsNegotiationStr,
{
    Negotiator::new(iter.into_iter().map(|value| value.as_str().to_owned()))
}

fn configured<N: NegotiationType>(
    negotiator: &Option<Negotiator<N, String>>,
) -> Result<&Negotiator<N, String>, Error> {
    negotiator
        .as_ref()
        .ok_or(Error::NoAvailableOptions(N::HEADER_NAME))
}

fn default_encodings() -> Result<Negotiator<EncodingNegotiation, String>, Error> {
    owned_negotiator([IDENTITY])
}

fn negotiate_dimension<N, R>(
    negotiator: &Negotiator<N, String>,
    request: &R,
) -> Result<String, Error>
where
    N: NegotiationType,
    R: HeaderSource + ?Sized,
{
    let header = request.header(N::HEADER_NAME).unwrap_or_default();
    negotiator.negotiate(&header).cloned()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{CompositeNegotiator, Negotiated, VARY};
    use crate::{Error, Rejection};

    fn negotiator() -> CompositeNegotiator {
        let mut negotiator = CompositeNegotiator::new();
        negotiator
            .set_available_content_types(["text/html", "application/json"])
            .unwrap()
            .set_available_charsets(["utf-8", "iso-8859-1"])
            .unwrap()
            .set_available_languages(["en-US", "en-GB", "fr"])
            .unwrap();
        negotiator
    }

    fn request<const N: usize>(headers: [(&str, &str); N]) -> BTreeMap<String, String> {
        headers
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect()
    }

    #[test]
    fn defaults() {
        assert_eq!(
            negotiator().negotiate(&request([])),
            Ok(Negotiated {
                content_type: "text/html".to_owned(),
                charset: "utf-8".to_owned(),
                language: "en-US".to_owned(),
                encoding: "identity".to_owned(),
            })
        );
    }

    #[test]
    fn unconfigured() {
        let request = request([("Accept", "text/html")]);
        assert_eq!(
            CompositeNegotiator::new().negotiate(&request),
            Err(Error::NoAvailableOptions("Accept"))
        );

        let mut negotiator = CompositeNegotiator::new();
        negotiator
            .set_available_content_types(["text/html"])
            .unwrap()
            .set_available_languages(["en"])
            .unwrap();
        assert_eq!(
            negotiator.negotiate(&request),
            Err(Error::NoAvailableOptions("Accept-Charset"))
        );

        assert_eq!(
            CompositeNegotiator::new()
                .set_available_languages(Vec::<String>::new())
                .unwrap_err(),
            Error::NoAvailableOptions("Accept-Language")
        );
        assert_eq!(
            CompositeNegotiator::new()
                .set_available_content_types(["text/*"])
                .unwrap_err(),
            Error::InvalidWildcard
        );
    }

    #[test]
    fn negotiate() {
        let negotiator = negotiator()
            .with_available_encodings(["gzip", "identity"])
            .unwrap();
        let negotiated = negotiator
            .negotiate(&request([
                ("accept", "application/json, text/html;q=0.9"),
                ("accept-charset", "iso-8859-1"),
                ("accept-language", "en-gb, en;q=0.8"),
                ("accept-encoding", "br, gzip;q=0.5"),
            ]))
            .unwrap();
        assert_eq!(
            negotiated,
            Negotiated {
                content_type: "application/json".to_owned(),
                charset: "iso-8859-1".to_owned(),
                language: "en-GB".to_owned(),
                encoding: "gzip".to_owned(),
            }
        );
        assert_eq!(
            negotiated.content_type_header(),
            "application/json; charset=iso-8859-1"
        );
    }

    #[test]
    fn not_acceptable() {
        let err = negotiator()
            .negotiate(&request([
                ("Accept", "image/png"),
                ("Accept-Language", "de"),
                ("Accept-Encoding", "gzip"),
            ]))
            .unwrap_err();
        assert_eq!(
            err,
            Error::NotAcceptable(vec![
                Rejection {
                    header_name: "Accept",
                    header: "image/png".to_owned(),
                    available: vec!["text/html".to_owned(), "application/json".to_owned()],
                },
                Rejection {
                    header_name: "Accept-Language",
                    header: "de".to_owned(),
                    available: vec!["en-US".to_owned(), "en-GB".to_owned(), "fr".to_owned()],
                },
                Rejection {
                    header_name: "Accept-Encoding",
                    header: "gzip".to_owned(),
                    available: vec!["identity".to_owned()],
                },
            ])
        );
    }

    #[test]
    fn apply() {
        let negotiator = negotiator()
            .with_available_encodings(["identity", "gzip"])
            .unwrap();

        let mut response = BTreeMap::<String, String>::new();
        let negotiated = negotiator
            .negotiate_and_apply(&request([("Accept-Language", "fr")]), &mut response)
            .unwrap();
        assert!(negotiated.is_identity());
        assert_eq!(
            response,
            request([
                ("Content-Type", "text/html; charset=utf-8"),
                ("Content-Language", "fr"),
                ("Vary", VARY),
            ])
        );

        let mut response = BTreeMap::<String, String>::new();
        negotiator
            .negotiate_and_apply(&request([("Accept-Encoding", "gzip")]), &mut response)
            .unwrap();
        assert_eq!(response["Content-Encoding"], "gzip");
        assert_eq!(response["Vary"], VARY);

        let mut response = BTreeMap::<String, String>::new();
        assert!(negotiator
            .negotiate_and_apply(&request([("Accept", "image/png")]), &mut response)
            .unwrap_err()
            .is_not_acceptable());
        assert!(response.is_empty());
    }

    #[cfg(feature = "http")]
    #[test]
    fn http() {
        use http::{header, Request, Response, StatusCode};

        let request = Request::builder()
            .header(header::ACCEPT, "text/*")
            .header(header::ACCEPT_CHARSET, "utf-8;q=0, *")
            .header(header::ACCEPT_LANGUAGE, "en")
            .body(())
            .unwrap();
        let mut response = Response::new(());
        negotiator()
            .negotiate_and_apply(&request, &mut response)
            .unwrap();
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html; charset=iso-8859-1"
        );
        assert_eq!(response.headers()[header::CONTENT_LANGUAGE], "en-US");
        assert!(!response.headers().contains_key(header::CONTENT_ENCODING));
        assert_eq!(response.headers()[header::VARY], VARY);

        let err = CompositeNegotiator::new().negotiate(&request).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let request = Request::builder()
            .header(header::ACCEPT, "image/png")
            .body(())
            .unwrap();
        let err = negotiator().negotiate(&request).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_ACCEPTABLE);
    }
}
