use std::{borrow::Cow, collections::BTreeMap};

use crate::Error;

/// Read access to request headers. Names are matched case-insensitively.
pub trait HeaderSource {
    fn header(&self, name: &str) -> Option<Cow<'_, str>>;

    fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }
}

/// Write access to response headers, replacing any previous value.
pub trait HeaderSink {
    fn set_header(&mut self, name: &'static str, value: String) -> Result<(), Error>;
}

impl<S: HeaderSource + ?Sized> HeaderSource for &S {
    fn header(&self, name: &str) -> Option<Cow<'_, str>> {
        (**self).header(name)
    }
}

impl HeaderSource for BTreeMap<String, String> {
    fn header(&self, name: &str) -> Option<Cow<'_, str>> {
        self.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| Cow::Borrowed(value.as_str()))
    }
}

impl HeaderSink for BTreeMap<String, String> {
    fn set_header(&mut self, name: &'static str, value: String) -> Result<(), Error> {
        self.retain(|key, _| !key.eq_ignore_ascii_case(name));
        self.insert(name.to_owned(), value);
        Ok(())
    }
}

#[cfg(feature = "http")]
mod http_impl {
    use std::borrow::Cow;

    use http::{header::HeaderName, request, HeaderMap, HeaderValue, Request, Response};

    use super::{HeaderSink, HeaderSource};
    use crate::Error;

    /// Repeated fields are folded into one comma separated value
    /// (RFC 7230 section 3.2.2).
    impl HeaderSource for HeaderMap {
        fn header(&self, name: &str) -> Option<Cow<'_, str>> {
            let mut values = self.get_all(name).iter().filter_map(|value| {
                let value = value.to_str().ok();
                if value.is_none() {
                    tracing::warn!(header = name, "ignoring header value that is not visible ASCII");
                }
                value
            });
            let first = values.next()?;
            match values.next() {
                None => Some(Cow::Borrowed(first)),
                Some(second) => {
                    let mut folded = format!("{first}, {second}");
                    for value in values {
                        folded.push_str(", ");
                        folded.push_str(value);
                    }
                    Some(Cow::Owned(folded))
                }
            }
        }
    }

    impl HeaderSink for HeaderMap {
        fn set_header(&mut self, name: &'static str, value: String) -> Result<(), Error> {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| Error::InvalidHeaderValue(name.to_owned()))?;
            let value = HeaderValue::try_from(value)
                .map_err(|err| Error::InvalidHeaderValue(err.to_string()))?;
            self.insert(name, value);
            Ok(())
        }
    }

    impl<B> HeaderSource for Request<B> {
        fn header(&self, name: &str) -> Option<Cow<'_, str>> {
            self.headers().header(name)
        }
    }

    impl HeaderSource for request::Parts {
        fn header(&self, name: &str) -> Option<Cow<'_, str>> {
            self.headers.header(name)
        }
    }

    impl<B> HeaderSink for Response<B> {
        fn set_header(&mut self, name: &'static str, value: String) -> Result<(), Error> {
            self.headers_mut().set_header(name, value)
        }
    }
}
