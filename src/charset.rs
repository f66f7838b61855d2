use crate::{
    parse_token_elem, parse_token_range, token_specificity, AsNegotiationStr, Error,
    MaybeWildcard, NegotiationType, Term,
};

const ISO_8859_1: &str = "iso-8859-1";

#[derive(Copy, Clone, Debug)]
pub struct CharsetNegotiation;

impl NegotiationType for CharsetNegotiation {
    type Parsed = String;
    type Range = MaybeWildcard<String>;

    const HEADER_NAME: &'static str = "Accept-Charset";

    fn parse_elem<M: AsNegotiationStr>(input: &M) -> Result<Self::Parsed, Error> {
        parse_token_elem(input.as_str())
    }

    fn parse_range(value: &str) -> Option<Self::Range> {
        parse_token_range(value)
    }

    fn is_match(supported: &Self::Parsed, range: &Self::Range) -> bool {
        range.matches(supported)
    }

    fn specificity(range: &Self::Range) -> u8 {
        token_specificity(range)
    }

    /// ISO-8859-1 stays acceptable unless the header names it or `*`
    /// (RFC 2616 section 14.2).
    fn implicit_terms(terms: &mut Vec<Term<Self::Range>>) {
        let mentioned = terms.iter().any(|term| match term.range() {
            MaybeWildcard::Wildcard => true,
            MaybeWildcard::Specific(charset) => charset == ISO_8859_1,
        });
        if !mentioned {
            let position = terms.iter().map(|term| term.position() + 1).max().unwrap_or(0);
            terms.push(Term::implicit(
                position,
                ISO_8859_1,
                MaybeWildcard::Specific(ISO_8859_1.to_owned()),
            ));
        }
    }

    #[cfg(feature = "http")]
    fn associated_header() -> http::header::HeaderName {
        http::header::ACCEPT_CHARSET
    }
}
