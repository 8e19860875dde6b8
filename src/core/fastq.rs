use crate::core::io::LineSource;
use crate::error::{QcError, Result};

#[derive(Clone, Copy, Debug)]
pub struct ReadView<'a> {
    pub id: &'a [u8],
    pub seq: &'a [u8],
    pub qual: &'a [u8],
}

/// What to do with a structurally broken record.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ErrorPolicy {
    #[default]
    Fail,
    Skip,
}

/// Groups a [`LineSource`] into 4-line FASTQ records.
///
/// Blank lines where a header is expected are consumed and ignored. A record
/// is only handed out once all four lines are present and consistent, so a
/// truncated or misaligned record never reaches an aggregate.
pub struct FastqRecords<L> {
    lines: L,
    policy: ErrorPolicy,
    id: Vec<u8>,
    seq: Vec<u8>,
    sep: Vec<u8>,
    qual: Vec<u8>,
    line_no: u64,
    seq_line: u64,
    records: u64,
    skipped: u64,
}

impl<L: LineSource> FastqRecords<L> {
    pub fn new(lines: L, policy: ErrorPolicy) -> Self {
        Self {
            lines,
            policy,
            id: Vec::new(),
            seq: Vec::new(),
            sep: Vec::new(),
            qual: Vec::new(),
            line_no: 0,
            seq_line: 0,
            records: 0,
            skipped: 0,
        }
    }

    pub fn next_record(&mut self) -> Result<Option<ReadView<'_>>> {
        if self.advance()? {
            Ok(Some(self.current()))
        } else {
            Ok(None)
        }
    }

    /// Moves to the next well-formed record. Returns `false` at end of
    /// stream.
    pub fn advance(&mut self) -> Result<bool> {
        loop {
            match self.read_record()? {
                Step::Eof => return Ok(false),
                Step::Record => {
                    self.records += 1;
                    return Ok(true);
                }
                Step::Malformed { reason, eof } => {
                    let record = self.records + self.skipped + 1;
                    match self.policy {
                        ErrorPolicy::Fail => {
                            return Err(QcError::MalformedRecord {
                                record,
                                line: self.line_no,
                                reason,
                            });
                        }
                        ErrorPolicy::Skip => {
                            log::warn!(
                                "skipping malformed record {} at line {}: {}",
                                record,
                                self.line_no,
                                reason
                            );
                            self.skipped += 1;
                            if eof {
                                return Ok(false);
                            }
                        }
                    }
                }
            }
        }
    }

    /// The record most recently accepted by [`advance`](Self::advance).
    pub fn current(&self) -> ReadView<'_> {
        ReadView {
            id: &self.id,
            seq: &self.seq,
            qual: &self.qual,
        }
    }

    /// Raw lines read so far, blank lines included.
    pub fn lines_consumed(&self) -> u64 {
        self.line_no
    }

    /// Line number of the sequence line of the last record handed out.
    pub fn seq_line(&self) -> u64 {
        self.seq_line
    }

    pub fn records(&self) -> u64 {
        self.records
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    fn read_record(&mut self) -> Result<Step> {
        loop {
            if !fill(&mut self.lines, &mut self.line_no, &mut self.id)? {
                return Ok(Step::Eof);
            }
            if !self.id.is_empty() {
                break;
            }
        }
        if !fill(&mut self.lines, &mut self.line_no, &mut self.seq)? {
            return Ok(Step::truncated());
        }
        self.seq_line = self.line_no;
        if !fill(&mut self.lines, &mut self.line_no, &mut self.sep)? {
            return Ok(Step::truncated());
        }
        if !fill(&mut self.lines, &mut self.line_no, &mut self.qual)? {
            return Ok(Step::truncated());
        }

        if self.id[0] != b'@' {
            return Ok(Step::malformed("header line does not start with '@'"));
        }
        if self.sep.first() != Some(&b'+') {
            return Ok(Step::malformed("separator line does not start with '+'"));
        }
        if self.seq.len() != self.qual.len() {
            return Ok(Step::malformed(format!(
                "sequence length {} does not match quality length {}",
                self.seq.len(),
                self.qual.len()
            )));
        }
        Ok(Step::Record)
    }
}

enum Step {
    Eof,
    Record,
    Malformed { reason: String, eof: bool },
}

impl Step {
    fn truncated() -> Self {
        Step::Malformed {
            reason: "stream ends mid-record".to_string(),
            eof: true,
        }
    }

    fn malformed(reason: impl Into<String>) -> Self {
        Step::Malformed {
            reason: reason.into(),
            eof: false,
        }
    }
}

fn fill<L: LineSource>(lines: &mut L, line_no: &mut u64, buf: &mut Vec<u8>) -> Result<bool> {
    match lines.next_line()? {
        Some(line) => {
            *line_no += 1;
            buf.clear();
            buf.extend_from_slice(line);
            Ok(true)
        }
        None => Ok(false),
    }
}
