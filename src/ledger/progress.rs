use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    ReadLedger,
    ParseSources,
    Merge,
    Filter,
    Sort,
    Write,
    DetectDuplicates,
    RemoveDuplicates,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReadLedger => "read-ledger",
            Self::ParseSources => "parse-sources",
            Self::Merge => "merge",
            Self::Filter => "filter",
            Self::Sort => "sort",
            Self::Write => "write",
            Self::DetectDuplicates => "detect-duplicates",
            Self::RemoveDuplicates => "remove-duplicates",
        }
    }
}

/// Receives status between phases. Purely observational.
pub trait ProgressSink {
    fn phase(&mut self, phase: Phase);
    /// Called after source `index` (0-based) of `total` has been handled.
    fn source(&mut self, index: usize, total: usize, path: &Path);
}

#[derive(Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn phase(&mut self, _phase: Phase) {}
    fn source(&mut self, _index: usize, _total: usize, _path: &Path) {}
}

#[derive(Debug, Default)]
pub struct StderrProgress;

pub fn progress_line(index: usize, total: usize) -> String {
    let done = index + 1;
    let percent = if total == 0 {
        100.0
    } else {
        done as f64 / total as f64 * 100.0
    };
    format!("processing timesheets {done}/{total} ({percent:.1}%)")
}

impl ProgressSink for StderrProgress {
    fn phase(&mut self, phase: Phase) {
        eprintln!("timeledger: {}", phase.as_str());
    }

    fn source(&mut self, index: usize, total: usize, _path: &Path) {
        eprintln!("timeledger: {}", progress_line(index, total));
    }
}

#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingProgress {
    pub phases: Vec<Phase>,
    pub sources: Vec<(usize, usize)>,
}

#[cfg(test)]
impl ProgressSink for RecordingProgress {
    fn phase(&mut self, phase: Phase) {
        self.phases.push(phase);
    }

    fn source(&mut self, index: usize, total: usize, _path: &Path) {
        self.sources.push((index, total));
    }
}
