use crate::{
    parse_token_elem, parse_token_range, token_specificity, AsNegotiationStr, Error,
    MaybeWildcard, NegotiationType,
};

pub(crate) const IDENTITY: &str = "identity";

#[derive(Copy, Clone, Default, Debug)]
pub struct EncodingNegotiation;

impl NegotiationType for EncodingNegotiation {
    type Parsed = String;
    type Range = MaybeWildcard<String>;

    const HEADER_NAME: &'static str = "Accept-Encoding";

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

    fn no_preference<T>(supported: &[(Self::Parsed, T)]) -> Option<&T> {
        supported
            .iter()
            .find(|(coding, _)| coding == IDENTITY)
            .or_else(|| supported.first())
            .map(|(_, value)| value)
    }

    #[cfg(feature = "http")]
    fn associated_header() -> http::header::HeaderName {
        http::header::ACCEPT_ENCODING
    }
}
