use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum EncodingScheme {
    Sanger,
    Solexa,
    Illumina13,
    Illumina15,
}

impl EncodingScheme {
    pub const ALL: [EncodingScheme; 4] = [
        EncodingScheme::Sanger,
        EncodingScheme::Solexa,
        EncodingScheme::Illumina13,
        EncodingScheme::Illumina15,
    ];

    /// Raw character code of quality zero.
    pub fn offset(self) -> u8 {
        match self {
            EncodingScheme::Sanger => 33,
            EncodingScheme::Solexa | EncodingScheme::Illumina13 | EncodingScheme::Illumina15 => 64,
        }
    }

    /// Translates one quality character. Codes outside the scheme's range
    /// still translate arithmetically.
    pub fn score(self, c: u8) -> i32 {
        c as i32 - self.offset() as i32
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EncodingScheme::Sanger => "Sanger",
            EncodingScheme::Solexa => "Solexa",
            EncodingScheme::Illumina13 => "Illumina1.3",
            EncodingScheme::Illumina15 => "Illumina1.5",
        }
    }
}

impl fmt::Display for EncodingScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EncodingScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EncodingScheme::ALL
            .into_iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown encoding scheme '{}'", s))
    }
}

pub fn translate(c: u8, scheme: EncodingScheme) -> i32 {
    scheme.score(c)
}

/// Either detect the scheme from a prefix of the file or trust the caller.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum EncodingChoice {
    #[default]
    Auto,
    Fixed(EncodingScheme),
}

/// How to treat a read with nothing to average over.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum EmptyReadPolicy {
    #[default]
    Fail,
    Nan,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    Pass,
    Warn,
    Fail,
}

impl Status {
    pub fn as_str_lower(self) -> &'static str {
        match self {
            Status::Pass => "pass",
            Status::Warn => "warn",
            Status::Fail => "fail",
        }
    }

    pub fn as_str_upper(self) -> &'static str {
        match self {
            Status::Pass => "PASS",
            Status::Warn => "WARN",
            Status::Fail => "FAIL",
        }
    }
}

/// Five per-position order statistics, each indexed by position - 1.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QuantileSummary {
    pub q10: Vec<i32>,
    pub q25: Vec<i32>,
    pub q50: Vec<i32>,
    pub q75: Vec<i32>,
    pub q90: Vec<i32>,
}

impl QuantileSummary {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            q10: Vec::with_capacity(n),
            q25: Vec::with_capacity(n),
            q50: Vec::with_capacity(n),
            q75: Vec::with_capacity(n),
            q90: Vec::with_capacity(n),
        }
    }

    pub fn push(&mut self, q: [i32; 5]) {
        self.q10.push(q[0]);
        self.q25.push(q[1]);
        self.q50.push(q[2]);
        self.q75.push(q[3]);
        self.q90.push(q[4]);
    }

    pub fn len(&self) -> usize {
        self.q50.len()
    }

    pub fn is_empty(&self) -> bool {
        self.q50.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct QualityReport {
    pub encoding: EncodingScheme,
    pub per_read_mean: Vec<f64>,
    pub per_position_mean: Vec<f64>,
    pub quantiles: QuantileSummary,
    pub skipped_records: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets() {
        assert_eq!(EncodingScheme::Sanger.offset(), 33);
        for e in [
            EncodingScheme::Solexa,
            EncodingScheme::Illumina13,
            EncodingScheme::Illumina15,
        ] {
            assert_eq!(e.offset(), 64);
        }
    }

    #[test]
    fn translate_is_plain_offset_arithmetic() {
        assert_eq!(translate(b'I', EncodingScheme::Sanger), 40);
        assert_eq!(translate(b'h', EncodingScheme::Illumina15), 40);
        assert_eq!(translate(b';', EncodingScheme::Solexa), -5);
        assert_eq!(translate(b'!', EncodingScheme::Illumina13), -31);
    }

    #[test]
    fn parses_scheme_names() {
        assert_eq!(
            "illumina1.3".parse::<EncodingScheme>(),
            Ok(EncodingScheme::Illumina13)
        );
        assert_eq!("Sanger".parse(), Ok(EncodingScheme::Sanger));
        assert!("phred".parse::<EncodingScheme>().is_err());
    }
}
