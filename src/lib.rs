//! HTTP content negotiation over the four proactive dimensions: media type
//! (`Accept`), charset (`Accept-Charset`), language (`Accept-Language`) and
//! content-coding (`Accept-Encoding`).
//!
//! ```
//! use http_conneg::{ContentTypeNegotiation, Negotiator};
//!
//! let negotiator =
//!     Negotiator::<ContentTypeNegotiation, _>::new(["application/json", "text/html"]).unwrap();
//! assert_eq!(negotiator.negotiate("text/*;q=0.9, */*;q=0.1"), Ok(&"text/html"));
//! assert!(negotiator.negotiate("image/png").unwrap_err().is_not_acceptable());
//! ```

mod charset;
mod composite;
mod content_type;
mod encoding;
mod error;
mod headers;
mod language;
mod term;

#[cfg(feature = "axum")]
pub mod axum;

use std::{borrow::Cow, cmp::Ordering, fmt};

pub use charset::CharsetNegotiation;
pub use composite::{CompositeNegotiator, Negotiated, VARY};
pub use content_type::{ContentTypeNegotiation, MediaRange, MimeType};
pub use encoding::EncodingNegotiation;
pub use error::{Error, Rejection};
pub use headers::{HeaderSink, HeaderSource};
pub use language::{LanguageNegotiation, LanguageRange, LanguageTag};
pub use term::Term;

/// Per-dimension negotiation rules.
pub trait NegotiationType {
    /// An available option, validated at registration.
    type Parsed: Clone + fmt::Debug + PartialEq;
    /// The matcher extracted from one header term.
    type Range: Clone + fmt::Debug + PartialEq;

    const HEADER_NAME: &'static str;

    fn parse_elem<M: AsNegotiationStr>(input: &M) -> Result<Self::Parsed, Error>;

    /// `None` drops the term from the header.
    fn parse_range(value: &str) -> Option<Self::Range>;

    fn is_match(supported: &Self::Parsed, range: &Self::Range) -> bool;

    /// Higher is more specific, a full wildcard is 0.
    fn specificity(range: &Self::Range) -> u8;

    /// Terms the client did not write but is assumed to send.
    fn implicit_terms(_terms: &mut Vec<Term<Self::Range>>) {}

    /// Orders terms of exactly equal quality.
    fn tie_break(lhs: &Term<Self::Range>, rhs: &Term<Self::Range>) -> Ordering {
        term::explicit_first(lhs, rhs)
    }

    /// Parses and sorts a raw header, most preferred term first.
    fn parse_header(header: &str) -> Vec<Term<Self::Range>>
    where
        Self: Sized,
    {
        term::parse_header::<Self>(header)
    }

    /// Choice made when the client sent no header at all.
    fn no_preference<T>(supported: &[(Self::Parsed, T)]) -> Option<&T> {
        supported.first().map(|(_, value)| value)
    }

    /// First available option satisfying `term` and not refused by `reject`.
    fn select<'a, T>(
        supported: &'a [(Self::Parsed, T)],
        term: &Term<Self::Range>,
        reject: &[Term<Self::Range>],
    ) -> Option<&'a T>
    where
        Self: Sized,
    {
        match_first::<Self, T, _>(supported, term, reject, Self::is_match)
    }

    #[cfg(feature = "http")]
    fn associated_header() -> http::header::HeaderName;
}

/// Scans `supported` in server preference order. A rejection only vetoes an
/// option when it is at least as specific as the accepting term, so
/// `en;q=0, *` refuses `en-US` while `gzip, *;q=0` keeps `gzip`.
fn match_first<'a, N, T, F>(
    supported: &'a [(N::Parsed, T)],
    term: &Term<N::Range>,
    reject: &[Term<N::Range>],
    is_match: F,
) -> Option<&'a T>
where
    N: NegotiationType,
    F: Fn(&N::Parsed, &N::Range) -> bool,
{
    let specificity = N::specificity(term.range());
    supported
        .iter()
        .find(|(parsed, _)| {
            is_match(parsed, term.range())
                && !reject.iter().any(|rejected| {
                    N::specificity(rejected.range()) >= specificity
                        && N::is_match(parsed, rejected.range())
                })
        })
        .map(|(_, value)| value)
}

/// Anything that can be registered as an available option.
pub trait AsNegotiationStr {
    fn as_str(&self) -> &str;
}

impl AsNegotiationStr for &str {
    fn as_str(&self) -> &str {
        self
    }
}

impl AsNegotiationStr for String {
    fn as_str(&self) -> &str {
        self
    }
}

impl AsNegotiationStr for Cow<'_, str> {
    fn as_str(&self) -> &str {
        self
    }
}

/// Negotiates one dimension against a fixed, ordered set of options, the
/// first one being the server's favourite.
#[derive(Clone, Debug)]
pub struct Negotiator<N: NegotiationType, T> {
    supported: Vec<(N::Parsed, T)>,
}

impl<N, T> Negotiator<N, T>
where
    N: NegotiationType,
    T: AsNegotiationStr,
{
    pub fn new<I>(iter: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = T>,
    {
        let supported = iter
            .into_iter()
            .map(|value| Ok((N::parse_elem(&value)?, value)))
            .collect::<Result<Vec<_>, _>>()?;
        if supported.is_empty() {
            return Err(Error::NoAvailableOptions(N::HEADER_NAME));
        }
        Ok(Self { supported })
    }

    pub fn negotiate(&self, header: &str) -> Result<&T, Error> {
        let header = header.trim();
        if header.is_empty() {
            return N::no_preference(&self.supported)
                .ok_or(Error::NoAvailableOptions(N::HEADER_NAME));
        }

        let (accept, reject) = term::partition(N::parse_header(header));
        let selected = accept
            .iter()
            .find_map(|term| N::select(&self.supported, term, &reject));

        match selected {
            Some(value) => {
                tracing::trace!(header = N::HEADER_NAME, selected = value.as_str(), "negotiated");
                Ok(value)
            }
            None => {
                tracing::debug!(header = N::HEADER_NAME, value = header, "not acceptable");
                Err(Error::not_acceptable(Rejection {
                    header_name: N::HEADER_NAME,
                    header: header.to_owned(),
                    available: self.available().map(str::to_owned).collect(),
                }))
            }
        }
    }

    pub fn available(&self) -> impl Iterator<Item = &str> {
        self.supported.iter().map(|(_, value)| value.as_str())
    }
}

/// Either `*` or a concrete, lower-cased value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MaybeWildcard<T> {
    Wildcard,
    Specific(T),
}

impl MaybeWildcard<String> {
    pub fn matches(&self, specific: &str) -> bool {
        match self {
            MaybeWildcard::Wildcard => true,
            MaybeWildcard::Specific(s) => s.eq_ignore_ascii_case(specific),
        }
    }
}

fn matches_wildcard(specific: &str, maybe_wildcard: &str) -> bool {
    maybe_wildcard == "*" || specific.eq_ignore_ascii_case(maybe_wildcard)
}

/// RFC 7230 `tchar`.
fn is_tchar(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c)
}

fn is_token(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_tchar)
}

/// Shared validation for charset and content-coding options.
fn parse_token_elem(input: &str) -> Result<String, Error> {
    let input = input.trim();
    if input.contains(';') {
        return Err(Error::ParamsNotAllowed);
    }
    if input == "*" {
        return Err(Error::InvalidWildcard);
    }
    if !is_token(input) {
        return Err(Error::InvalidToken(input.to_owned()));
    }
    Ok(input.to_ascii_lowercase())
}

fn parse_token_range(value: &str) -> Option<MaybeWildcard<String>> {
    match value {
        "*" => Some(MaybeWildcard::Wildcard),
        token if is_token(token) => Some(MaybeWildcard::Specific(token.to_ascii_lowercase())),
        _ => None,
    }
}

fn token_specificity(range: &MaybeWildcard<String>) -> u8 {
    match range {
        MaybeWildcard::Wildcard => 0,
        MaybeWildcard::Specific(_) => 1,
    }
}
