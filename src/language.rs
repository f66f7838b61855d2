use crate::{match_first, AsNegotiationStr, Error, NegotiationType, Term};

#[derive(Copy, Clone, Debug)]
pub struct LanguageNegotiation;

impl NegotiationType for LanguageNegotiation {
    type Parsed = LanguageTag;
    type Range = LanguageRange;

    const HEADER_NAME: &'static str = "Accept-Language";

    fn parse_elem<M: AsNegotiationStr>(input: &M) -> Result<Self::Parsed, Error> {
        let input = input.as_str().trim();
        if input.contains(';') {
            return Err(Error::ParamsNotAllowed);
        }
        if input == "*" {
            return Err(Error::InvalidWildcard);
        }
        if !is_language_tag(input) {
            return Err(Error::InvalidToken(input.to_owned()));
        }
        Ok(LanguageTag(input.to_ascii_lowercase()))
    }

    fn parse_range(value: &str) -> Option<Self::Range> {
        match value {
            "*" => Some(LanguageRange::Wildcard),
            tag if is_language_tag(tag) => {
                let tag = tag.to_ascii_lowercase();
                Some(if tag.contains('-') {
                    LanguageRange::Tag(tag)
                } else {
                    LanguageRange::Primary(tag)
                })
            }
            _ => None,
        }
    }

    fn is_match(supported: &Self::Parsed, range: &Self::Range) -> bool {
        match range {
            LanguageRange::Wildcard => true,
            LanguageRange::Primary(primary) => supported.primary() == primary,
            LanguageRange::Tag(tag) => &supported.0 == tag,
        }
    }

    fn specificity(range: &Self::Range) -> u8 {
        match range {
            LanguageRange::Wildcard => 0,
            LanguageRange::Primary(_) => 1,
            LanguageRange::Tag(_) => 2,
        }
    }

    /// An exact tag beats an earlier option that only shares the primary
    /// subtag: `en` picks `en` over `en-US` whatever the server order.
    fn select<'a, T>(
        supported: &'a [(Self::Parsed, T)],
        term: &Term<Self::Range>,
        reject: &[Term<Self::Range>],
    ) -> Option<&'a T> {
        match term.range() {
            LanguageRange::Primary(primary) => {
                match_first::<Self, T, _>(supported, term, reject, |s, _| &s.0 == primary)
                    .or_else(|| match_first::<Self, T, _>(supported, term, reject, Self::is_match))
            }
            _ => match_first::<Self, T, _>(supported, term, reject, Self::is_match),
        }
    }

    #[cfg(feature = "http")]
    fn associated_header() -> http::header::HeaderName {
        http::header::ACCEPT_LANGUAGE
    }
}

/// A lower-cased language tag offered by the server, e.g. `en-us`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LanguageTag(String);

impl LanguageTag {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part before the first `-`.
    pub fn primary(&self) -> &str {
        primary_subtag(&self.0)
    }
}

/// A language range from an `Accept-Language` header.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LanguageRange {
    Wildcard,
    /// A bare primary subtag such as `en`, matching every `en-*` tag.
    Primary(String),
    Tag(String),
}

fn primary_subtag(tag: &str) -> &str {
    tag.split_once('-').map_or(tag, |(primary, _)| primary)
}

fn is_language_tag(tag: &str) -> bool {
    !tag.is_empty()
        && tag
            .split('-')
            .all(|subtag| !subtag.is_empty() && subtag.chars().all(|c| c.is_ascii_alphanumeric()))
}
