use serde::Serialize;

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionProgress {
    /// Zero-based index of the current question in the working list.
    pub position: usize,
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub lives: u32,
    pub streak: u32,
    pub score: u32,
    pub is_complete: bool,
}
