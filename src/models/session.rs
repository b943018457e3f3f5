//! Per-conversation state owned by the caller

use super::{EnrichedCandidate, TripRequest};

/// The latest request with the candidates it produced and a browse cursor
#[derive(Debug, Clone)]
pub struct SessionState {
    pub request: TripRequest,
    pub candidates: Vec<EnrichedCandidate>,
    cursor: usize,
}

impl SessionState {
    #[must_use]
    pub fn new(request: TripRequest) -> Self {
        Self {
            request,
            candidates: Vec::new(),
            cursor: 0,
        }
    }

    /// Replace the candidate list and rewind the cursor
    pub fn replace_candidates(&mut self, candidates: Vec<EnrichedCandidate>) {
        self.candidates = candidates;
        self.cursor = 0;
    }

    /// Next candidate to present, or `None` once the list is exhausted
    pub fn next_candidate(&mut self) -> Option<&EnrichedCandidate> {
        let candidate = self.candidates.get(self.cursor)?;
        self.cursor += 1;
        Some(candidate)
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.candidates.len().saturating_sub(self.cursor)
    }
}
