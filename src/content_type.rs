use std::{cmp::Ordering, fmt, str::FromStr};

use crate::{
    is_tchar, matches_wildcard, term::explicit_first, AsNegotiationStr, Error, NegotiationType,
    Term,
};

#[derive(Copy, Clone, Debug)]
pub struct ContentTypeNegotiation;

impl NegotiationType for ContentTypeNegotiation {
    type Parsed = MimeType;
    type Range = MediaRange;

    const HEADER_NAME: &'static str = "Accept";

    fn parse_elem<M: AsNegotiationStr>(raw: &M) -> Result<Self::Parsed, Error> {
        raw.as_str().parse()
    }

    fn parse_range(value: &str) -> Option<Self::Range> {
        MediaRange::parse(value)
    }

    fn is_match(supported: &Self::Parsed, range: &Self::Range) -> bool {
        range.matches(supported)
    }

    fn specificity(range: &Self::Range) -> u8 {
        mime_precision_score(&range.top_level_type, &range.sub_type)
    }

    fn tie_break(lhs: &Term<Self::Range>, rhs: &Term<Self::Range>) -> Ordering {
        Self::specificity(rhs.range())
            .cmp(&Self::specificity(lhs.range()))
            .then_with(|| explicit_first(lhs, rhs))
    }

    /// Any matching `q=0` range refuses an option, however broad it is:
    /// `text/html, */*;q=0` accepts nothing.
    fn select<'a, T>(
        supported: &'a [(Self::Parsed, T)],
        term: &Term<Self::Range>,
        reject: &[Term<Self::Range>],
    ) -> Option<&'a T> {
        supported
            .iter()
            .find(|(mime, _)| {
                term.range().matches(mime)
                    && !reject.iter().any(|rejected| rejected.range().matches(mime))
            })
            .map(|(_, value)| value)
    }

    #[cfg(feature = "http")]
    fn associated_header() -> http::header::HeaderName {
        http::header::ACCEPT
    }
}

/// A media range from an `Accept` header: `*/*`, `type/*` or
/// `type/subtype[+suffix]`. Parameters other than the weight are ignored.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MediaRange {
    pub top_level_type: String,
    pub sub_type: String,
    pub suffix: Option<String>,
}

impl MediaRange {
    pub fn parse(value: &str) -> Option<Self> {
        let left = value.split(';').next()?.trim();
        let (main, sub) = left.split_once('/')?;
        match (main, sub) {
            ("*", "*") => Some(Self {
                top_level_type: "*".to_owned(),
                sub_type: "*".to_owned(),
                suffix: None,
            }),
            ("*", _) => None,
            (main, "*") if is_media_token(main) => Some(Self {
                top_level_type: main.to_ascii_lowercase(),
                sub_type: "*".to_owned(),
                suffix: None,
            }),
            (main, sub) => {
                let (sub, suffix) = split_suffix(sub);
                if !is_media_token(main)
                    || !is_media_token(sub)
                    || !suffix.map_or(true, is_media_token)
                {
                    return None;
                }
                Some(Self {
                    top_level_type: main.to_ascii_lowercase(),
                    sub_type: sub.to_ascii_lowercase(),
                    suffix: suffix.map(str::to_ascii_lowercase),
                })
            }
        }
    }

    pub fn matches(&self, mime: &MimeType) -> bool {
        matches_wildcard(&mime.top_level_type, &self.top_level_type)
            && (self.sub_type == "*"
                || (mime.sub_type == self.sub_type && mime.suffix == self.suffix))
    }

    pub fn is_experimental(&self) -> bool {
        is_experimental(&self.top_level_type, &self.sub_type)
    }
}

/// A concrete media type `type/subtype[+suffix]`, as offered by the server.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MimeType {
    pub top_level_type: String,
    pub sub_type: String,
    pub suffix: Option<String>,
}

impl MimeType {
    pub fn is_experimental(&self) -> bool {
        is_experimental(&self.top_level_type, &self.sub_type)
    }
}

impl FromStr for MimeType {
    type Err = Error;

    fn from_str(mime: &str) -> Result<Self, Self::Err> {
        let mime = mime.trim();
        if mime.contains(';') {
            return Err(Error::ParamsNotAllowed);
        }
        let (main, sub) = mime.split_once('/').ok_or(Error::MissingSeparator('/'))?;
        if sub.contains('/') {
            return Err(Error::TooManyParts);
        }
        if main == "*" || sub == "*" {
            return Err(Error::InvalidWildcard);
        }
        let (sub, suffix) = split_suffix(sub);
        for part in [Some(main), Some(sub), suffix].into_iter().flatten() {
            if !is_media_token(part) {
                return Err(Error::InvalidToken(part.to_owned()));
            }
        }
        Ok(Self {
            top_level_type: main.to_ascii_lowercase(),
            sub_type: sub.to_ascii_lowercase(),
            suffix: suffix.map(str::to_ascii_lowercase),
        })
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.top_level_type, self.sub_type)?;
        if let Some(suffix) = &self.suffix {
            write!(f, "+{suffix}")?;
        }
        Ok(())
    }
}

fn split_suffix(sub: &str) -> (&str, Option<&str>) {
    match sub.split_once('+') {
        Some((sub, suffix)) => (sub, Some(suffix)),
        None => (sub, None),
    }
}

/// A token that cannot be confused with the wildcard or the suffix marker.
fn is_media_token(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| is_tchar(c) && c != '*' && c != '+')
}

fn is_experimental(main: &str, sub: &str) -> bool {
    main.starts_with("x-") || sub.starts_with("x-")
}

fn mime_precision_score(main: &str, sub: &str) -> u8 {
    match (main, sub) {
        ("*", "*") => 0,
        (_, "*") => 1,
        _ => 2,
    }
}
