use std::cmp::Ordering;

use crate::NegotiationType;

/// One entry of an `Accept*` header.
#[derive(Clone, Debug, PartialEq)]
pub struct Term<R> {
    position: usize,
    value: String,
    range: R,
    quality: f32,
    explicit_quality: bool,
}

impl<R> Term<R> {
    /// Term carrying an explicit `q` or `level` weight.
    pub fn new(position: usize, value: impl Into<String>, range: R, quality: f32) -> Self {
        Self {
            position,
            value: value.into(),
            range,
            quality: quality.clamp(0., 1.),
            explicit_quality: true,
        }
    }

    /// Term without a `q` or `level` parameter.
    pub fn implicit(position: usize, value: impl Into<String>, range: R) -> Self {
        Self {
            position,
            value: value.into(),
            range,
            quality: 1.,
            explicit_quality: false,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// The raw type as written in the header, parameters stripped.
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn range(&self) -> &R {
        &self.range
    }

    pub fn quality(&self) -> f32 {
        self.quality
    }

    pub fn explicit_quality(&self) -> bool {
        self.explicit_quality
    }

    pub fn is_rejection(&self) -> bool {
        self.quality <= 0.
    }
}

/// Explicit quality ranks above the default one.
pub(crate) fn explicit_first<R>(lhs: &Term<R>, rhs: &Term<R>) -> Ordering {
    rhs.explicit_quality.cmp(&lhs.explicit_quality)
}

/// Splits `header` into terms, drops malformed entries and sorts the rest by
/// preference: quality, then the dimension tie-break, then position.
pub(crate) fn parse_header<N: NegotiationType>(header: &str) -> Vec<Term<N::Range>> {
    let mut terms = header
        .split(',')
        .map(str::trim)
        .enumerate()
        .filter_map(|(position, entry)| {
            let term = parse_term::<N>(position, entry);
            if term.is_none() {
                tracing::trace!(header = N::HEADER_NAME, entry, "dropping malformed term");
            }
            term
        })
        .collect::<Vec<_>>();
    N::implicit_terms(&mut terms);

    terms.sort_by(|lhs, rhs| {
        rhs.quality
            .total_cmp(&lhs.quality)
            .then_with(|| N::tie_break(lhs, rhs))
            .then_with(|| lhs.position.cmp(&rhs.position))
    });
    terms
}

fn parse_term<N: NegotiationType>(position: usize, entry: &str) -> Option<Term<N::Range>> {
    if entry.is_empty() {
        return None;
    }
    match split_quality(entry) {
        Some((value, quality)) => {
            let quality = parse_weight(quality)?;
            Some(Term::new(position, value, N::parse_range(value)?, quality))
        }
        None => Some(Term::implicit(position, entry, N::parse_range(entry)?)),
    }
}

/// Longest leading part of `[0-9.]+` digits that reads as a number, so
/// `1.0.0` weighs `1.0`. A lone `.` is malformed.
fn parse_weight(digits: &str) -> Option<f32> {
    (1..=digits.len())
        .rev()
        .find_map(|len| digits[..len].parse::<f32>().ok())
}

/// Finds the last `;` followed by a `q=` or `level=` weight, returning the
/// type before it and the raw weight digits.
fn split_quality(entry: &str) -> Option<(&str, &str)> {
    entry.rmatch_indices(';').find_map(|(idx, _)| {
        let value = entry[..idx].trim_end();
        if value.is_empty() || value.contains(char::is_whitespace) {
            return None;
        }
        let param = entry[idx + 1..].trim_start();
        let weight = param
            .strip_prefix("q=")
            .or_else(|| param.strip_prefix("level="))?;
        let len = weight
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(weight.len());
        (len > 0).then(|| (value, &weight[..len]))
    })
}

/// Splits sorted terms into accepted (q > 0) and rejected (q = 0) ones,
/// keeping their relative order.
pub(crate) fn partition<R>(terms: Vec<Term<R>>) -> (Vec<Term<R>>, Vec<Term<R>>) {
    terms.into_iter().partition(|term| !term.is_rejection())
}
