//! Progress reporting.

use derive_more::Display;
use std::path::PathBuf;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncPhase {
    #[display("download")]
    Download,
    #[display("upload")]
    Upload,
    #[display("cleanup")]
    Cleanup,
}

/// One tick of a running pull or push.
///
/// `current` counts settled items of the phase (1-based), so the last tick of
/// a phase always has `current == total`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncProgress {
    pub phase: SyncPhase,
    pub current: usize,
    pub total: usize,
    /// 0..=100
    pub percentage: u8,
    pub current_file: Option<PathBuf>,
}
impl SyncProgress {
    pub fn new(phase: SyncPhase, current: usize, total: usize, current_file: Option<PathBuf>) -> Self {
        let percentage = if total == 0 {
            100
        } else {
            u8::try_from(current.min(total) * 100 / total).unwrap_or(100)
        };
        Self {
            phase,
            current,
            total,
            percentage,
            current_file,
        }
    }
}

/// Per-operation progress callback.
pub type ProgressFn<'a> = &'a (dyn Fn(SyncProgress) + Send + Sync);

pub(crate) fn no_progress(_: SyncProgress) {}
