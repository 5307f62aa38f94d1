//! The currently selected class and the roster shown for it.
//!
//! Roster fetches take a while and the selection can change underneath them.
//! A roster is only applied if it belongs to the class that is selected when
//! it arrives; late results for an old selection are dropped.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::roster::types::Roster;

#[derive(Debug, Default)]
struct ViewState {
    selected: Option<String>,
    roster: Option<Roster>,
}

#[derive(Debug, Default)]
pub struct RosterView {
    state: Mutex<ViewState>,
}

impl RosterView {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Switches to `class_id` and clears the displayed rows.
    pub fn select(&self, class_id: &str) {
        let mut state = self.lock();
        state.selected = Some(class_id.to_string());
        state.roster = None;
    }

    pub fn selected(&self) -> Option<String> {
        self.lock().selected.clone()
    }

    pub fn is_current(&self, class_id: &str) -> bool {
        self.lock().selected.as_deref() == Some(class_id)
    }

    /// Displays `roster` if its class is still the selected one.
    ///
    /// Returns `false`, leaving the view untouched, when the roster is stale.
    pub fn commit(&self, roster: Roster) -> bool {
        self.commit_with(roster, |_| ()).is_some()
    }

    /// Like [`commit`](Self::commit), but runs `show` on the accepted roster
    /// before the view is unlocked. No other roster can be committed while
    /// `show` runs, so output follows selection order.
    pub fn commit_with<R>(&self, roster: Roster, show: impl FnOnce(&Roster) -> R) -> Option<R> {
        let mut state = self.lock();
        if state.selected.as_deref() != Some(roster.class_id()) {
            debug!(
                class_id = roster.class_id(),
                selected = ?state.selected,
                "Discarding roster for stale selection"
            );
            return None;
        }
        let shown = show(&roster);
        state.roster = Some(roster);
        Some(shown)
    }

    pub fn roster(&self) -> Option<Roster> {
        self.lock().roster.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grading::AggregationPolicy;
    use crate::roster::types::ClassInfo;

    fn roster_for(class_id: &str) -> Roster {
        Roster {
            class: ClassInfo::resolve(class_id, &[]),
            policy: AggregationPolicy::WeightedAverage,
            rows: Vec::new(),
            failures: Vec::new(),
        }
    }

    #[test]
    fn test_commit_for_current_selection() {
        let view = RosterView::new();
        view.select("C1");
        assert!(view.commit(roster_for("C1")));
        assert_eq!(view.roster().unwrap().class_id(), "C1");
    }

    #[test]
    fn test_stale_roster_is_discarded() {
        let view = RosterView::new();
        view.select("C1");
        view.select("C2");
        assert!(!view.commit(roster_for("C1")));
        assert!(view.roster().is_none());
        assert_eq!(view.selected().as_deref(), Some("C2"));
    }

    #[test]
    fn test_nothing_selected_discards() {
        let view = RosterView::new();
        assert!(!view.commit(roster_for("C1")));
        assert!(!view.is_current("C1"));
    }

    #[test]
    fn test_select_clears_rows() {
        let view = RosterView::new();
        view.select("C1");
        view.commit(roster_for("C1"));
        view.select("C2");
        assert!(view.roster().is_none());
        assert!(view.is_current("C2"));
    }

    #[test]
    fn test_commit_with_shows_only_current_roster() {
        let view = RosterView::new();
        view.select("C1");
        view.select("C2");

        let mut shown = Vec::new();
        assert!(view.commit_with(roster_for("C1"), |r| shown.push(r.class_id().to_string())).is_none());
        let out = view.commit_with(roster_for("C2"), |r| {
            shown.push(r.class_id().to_string());
            r.class_id().len()
        });

        assert_eq!(out, Some(2));
        assert_eq!(shown, vec!["C2"]);
        assert_eq!(view.roster().unwrap().class_id(), "C2");
    }

    #[test]
    fn test_commit_with_holds_view_while_showing() {
        use std::sync::Arc;
        use std::sync::mpsc;
        use std::thread;
        use std::time::Duration;

        let view = Arc::new(RosterView::new());
        view.select("C1");

        let (started_tx, started_rx) = mpsc::channel();
        let slow = {
            let view = view.clone();
            thread::spawn(move || {
                view.commit_with(roster_for("C1"), |_| {
                    started_tx.send(()).unwrap();
                    thread::sleep(Duration::from_millis(50));
                    // Still the selection: the switch below has to wait.
                    view.state.try_lock().is_err()
                })
            })
        };

        started_rx.recv().unwrap();
        view.select("C2");
        assert_eq!(slow.join().unwrap(), Some(true));
        assert!(view.roster().is_none());
        assert!(view.is_current("C2"));
    }

    #[test]
    fn test_reselecting_same_class_accepts_result() {
        let view = RosterView::new();
        view.select("C1");
        view.select("C2");
        view.select("C1");
        assert!(view.commit(roster_for("C1")));
    }
}
