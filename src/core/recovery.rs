//! Recovery Sequence Matcher
//!
//! Sliding window over the last 10 submitted symbols. A mismatch never
//! clears the window; only a full window is compared against the code.

use std::collections::VecDeque;
use crate::error::{Result, StationError};
use crate::types::{RecoveryProgress, RecoverySymbol, SlotStatus, RECOVERY_CODE_LEN};

/// Result of one submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Matcher inactive (not possessed), symbol discarded
    Ignored,
    /// Recorded, window does not match
    Pending,
    /// Window equals the recovery code
    Matched,
}

/// Matches live input against the recovery code
#[derive(Debug, Clone)]
pub struct RecoveryMatcher {
    target: Vec<RecoverySymbol>,
    entered: VecDeque<RecoverySymbol>,
    active: bool,
}

impl Default for RecoveryMatcher {
    fn default() -> Self {
        Self {
            target: RecoverySymbol::default_code(),
            entered: VecDeque::with_capacity(RECOVERY_CODE_LEN),
            active: false,
        }
    }
}

impl RecoveryMatcher {
    /// Matcher for a custom code; must be exactly 10 symbols
    pub fn new(target: Vec<RecoverySymbol>) -> Result<Self> {
        if target.len() != RECOVERY_CODE_LEN {
            return Err(StationError::InvalidRecoveryCode {
                expected: RECOVERY_CODE_LEN,
                actual: target.len(),
            });
        }
        Ok(Self {
            target,
            ..Default::default()
        })
    }

    /// Clear the window and start accepting input
    pub fn activate(&mut self) {
        self.entered.clear();
        self.active = true;
    }

    /// Clear the window and stop accepting input
    pub fn deactivate(&mut self) {
        self.entered.clear();
        self.active = false;
    }

    /// Push a symbol; evaluate once the window is full
    pub fn submit(&mut self, symbol: RecoverySymbol) -> SubmitOutcome {
        if !self.active {
            return SubmitOutcome::Ignored;
        }

        self.entered.push_back(symbol);
        while self.entered.len() > RECOVERY_CODE_LEN {
            self.entered.pop_front();
        }

        if self.entered.len() == RECOVERY_CODE_LEN && self.entered.iter().eq(self.target.iter()) {
            SubmitOutcome::Matched
        } else {
            SubmitOutcome::Pending
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn target(&self) -> &[RecoverySymbol] {
        &self.target
    }

    /// Symbols currently in the window, oldest first
    pub fn entered(&self) -> impl Iterator<Item = &RecoverySymbol> {
        self.entered.iter()
    }

    /// Progress for display: count plus per-slot status
    pub fn progress(&self) -> RecoveryProgress {
        let slots = self
            .target
            .iter()
            .enumerate()
            .map(|(i, expected)| match self.entered.get(i) {
                Some(got) if got == expected => SlotStatus::Matched,
                Some(_) => SlotStatus::Wrong,
                None => SlotStatus::Pending,
            })
            .collect();

        RecoveryProgress {
            entered_count: self.entered.len(),
            total: RECOVERY_CODE_LEN,
            slots,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use RecoverySymbol::*;

    fn active() -> RecoveryMatcher {
        let mut m = RecoveryMatcher::default();
        m.activate();
        m
    }

    fn feed(m: &mut RecoveryMatcher, symbols: &[RecoverySymbol]) -> SubmitOutcome {
        let mut last = SubmitOutcome::Pending;
        for s in symbols {
            last = m.submit(s.clone());
        }
        last
    }

    #[test]
    fn test_inactive_ignores_input() {
        let mut m = RecoveryMatcher::default();
        assert_eq!(m.submit(Up), SubmitOutcome::Ignored);
        assert_eq!(m.progress().entered_count, 0);
    }

    #[test]
    fn test_exact_code_matches() {
        let mut m = active();
        let code = RecoverySymbol::default_code();
        let (head, last) = code.split_at(9);
        assert_eq!(feed(&mut m, head), SubmitOutcome::Pending);
        assert_eq!(m.submit(last[0].clone()), SubmitOutcome::Matched);
    }

    #[test]
    fn test_mismatch_does_not_reset_window() {
        let mut m = active();
        feed(&mut m, &[Up, Up, Down]);
        m.submit(Key('X'));
        assert_eq!(m.progress().entered_count, 4);
    }

    #[test]
    fn test_sliding_window_never_matches_stale_entries() {
        let mut m = active();
        let code = RecoverySymbol::default_code();
        // 9 correct, one wrong, then the 10th correct symbol
        feed(&mut m, &code[..9]);
        assert_eq!(m.submit(Key('Z')), SubmitOutcome::Pending);
        assert_eq!(m.submit(Key('A')), SubmitOutcome::Pending);
        assert_eq!(m.progress().entered_count, 10);
    }

    #[test]
    fn test_window_slides_into_match() {
        let mut m = active();
        // junk prefix then the full code; only the last 10 count
        feed(&mut m, &[Left, Left, Key('Q')]);
        assert_eq!(feed(&mut m, &RecoverySymbol::default_code()), SubmitOutcome::Matched);
    }

    #[test]
    fn test_progress_slots() {
        let mut m = active();
        feed(&mut m, &[Up, Down]);
        let progress = m.progress();
        assert_eq!(progress.total, 10);
        assert_eq!(progress.slots[0], SlotStatus::Matched);
        assert_eq!(progress.slots[1], SlotStatus::Wrong);
        assert_eq!(progress.slots[2], SlotStatus::Pending);
    }

    #[test]
    fn test_activate_clears_window() {
        let mut m = active();
        feed(&mut m, &[Up, Up, Down]);
        m.activate();
        assert_eq!(m.progress().entered_count, 0);
        m.deactivate();
        assert!(!m.is_active());
    }

    #[test]
    fn test_custom_code_length_checked() {
        assert!(RecoveryMatcher::new(vec![Up; 3]).is_err());
        let m = RecoveryMatcher::new(vec![Key('X'); 10]).unwrap();
        assert_eq!(m.target().len(), 10);
    }
}
