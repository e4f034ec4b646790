/// Errors from reveal playback.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RevealError {
    /// A run was started while another one was still playing. The new
    /// result is not played.
    #[error("reveal already playing (index {index} of {len})")]
    AlreadyPlaying { index: usize, len: usize },
}
