//! Race state machine: ready, running, finished, and back via reset.

use serde::{Deserialize, Serialize};

/// Status derived from the race flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RaceStatus {
    /// Marbles are on the grid, waiting for the start.
    #[default]
    Ready,
    /// Marbles are rolling.
    Running,
    /// A marble crossed the finish line.
    Finished,
}

impl RaceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Running => "running",
            Self::Finished => "finished",
        }
    }
}

impl std::fmt::Display for RaceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Race flags plus the winning marble's roster index.
///
/// Invariants: `finished` implies `started`, and a winner is only present
/// once finished. The winner stays fixed until [`RaceState::reset`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RaceFlags")]
pub struct RaceState {
    started: bool,
    finished: bool,
    winner_index: Option<usize>,
}

/// Race flags that break the [`RaceState`] invariants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("inconsistent race state: started={started}, finished={finished}, winner={winner_index:?}")]
pub struct InvalidRaceState {
    pub started: bool,
    pub finished: bool,
    pub winner_index: Option<usize>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RaceFlags {
    #[serde(default)]
    started: bool,
    #[serde(default)]
    finished: bool,
    #[serde(default)]
    winner_index: Option<usize>,
}

impl TryFrom<RaceFlags> for RaceState {
    type Error = InvalidRaceState;

    fn try_from(flags: RaceFlags) -> Result<Self, Self::Error> {
        let RaceFlags {
            started,
            finished,
            winner_index,
        } = flags;
        match (started, finished, winner_index) {
            (false, false, None) | (true, false, None) | (true, true, Some(_)) => Ok(Self {
                started,
                finished,
                winner_index,
            }),
            _ => Err(InvalidRaceState {
                started,
                finished,
                winner_index,
            }),
        }
    }
}

impl RaceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the race. Only valid from [`RaceStatus::Ready`]; a start while
    /// running or finished is ignored so a race in progress keeps its winner.
    pub fn start(&mut self) -> bool {
        if self.status() != RaceStatus::Ready {
            tracing::debug!(status = %self.status(), "ignoring start outside ready");
            return false;
        }

        self.started = true;
        self.finished = false;
        self.winner_index = None;
        tracing::info!("race started");
        true
    }

    /// Records the winner. Ignored unless running; the first winner sticks.
    pub fn finish(&mut self, winner_index: usize) -> bool {
        if !self.started || self.finished {
            return false;
        }

        self.finished = true;
        self.winner_index = Some(winner_index);
        tracing::info!(winner_index, "race finished");
        true
    }

    /// Returns to the initial ready state from anywhere.
    pub fn reset(&mut self) {
        *self = Self::default();
        tracing::info!("race reset");
    }

    pub fn status(&self) -> RaceStatus {
        if self.finished {
            RaceStatus::Finished
        } else if self.started {
            RaceStatus::Running
        } else {
            RaceStatus::Ready
        }
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn winner_index(&self) -> Option<usize> {
        self.winner_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running() -> RaceState {
        let mut race = RaceState::new();
        assert!(race.start());
        race
    }

    #[test]
    fn test_initial_state() {
        let race = RaceState::new();
        assert!(!race.is_started());
        assert!(!race.is_finished());
        assert_eq!(race.winner_index(), None);
        assert_eq!(race.status(), RaceStatus::Ready);
    }

    #[test]
    fn test_start_runs() {
        let race = running();
        assert!(race.is_started());
        assert!(!race.is_finished());
        assert_eq!(race.status(), RaceStatus::Running);
    }

    #[test]
    fn test_finish_records_winner() {
        let mut race = running();
        assert!(race.finish(2));
        assert_eq!(race.winner_index(), Some(2));
        assert_eq!(race.status(), RaceStatus::Finished);
    }

    #[test]
    fn test_finish_before_start_is_ignored() {
        let mut race = RaceState::new();
        assert!(!race.finish(1));
        assert_eq!(race.winner_index(), None);
        assert!(!race.is_finished());
    }

    #[test]
    fn test_first_winner_sticks() {
        let mut race = running();
        race.finish(1);
        assert!(!race.finish(4));
        assert_eq!(race.winner_index(), Some(1));
    }

    #[test]
    fn test_start_is_ignored_while_running_or_finished() {
        let mut race = running();
        assert!(!race.start());
        assert_eq!(race.status(), RaceStatus::Running);

        race.finish(3);
        assert!(!race.start());
        assert_eq!(race.winner_index(), Some(3));
        assert_eq!(race.status(), RaceStatus::Finished);
    }

    #[test]
    fn test_reset_from_every_state() {
        let mut ready = RaceState::new();
        ready.reset();

        let mut in_progress = running();
        in_progress.reset();

        let mut finished = running();
        finished.finish(0);
        finished.reset();

        for race in [ready, in_progress, finished] {
            assert_eq!(race, RaceState::new());
            assert_eq!(race.status(), RaceStatus::Ready);
        }
    }

    #[test]
    fn test_reset_allows_new_race() {
        let mut race = running();
        race.finish(0);
        race.reset();
        assert!(race.start());
        assert!(race.finish(5));
        assert_eq!(race.winner_index(), Some(5));
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(RaceStatus::Ready.as_str(), "ready");
        assert_eq!(RaceStatus::Running.to_string(), "running");
        assert_eq!(
            serde_json::to_string(&RaceStatus::Finished).unwrap(),
            r#""finished""#
        );
    }

    #[test]
    fn test_state_json_shape() {
        let mut race = running();
        race.finish(1);
        let json = serde_json::to_string(&race).unwrap();
        assert_eq!(json, r#"{"started":true,"finished":true,"winnerIndex":1}"#);
        assert_eq!(serde_json::from_str::<RaceState>(&json).unwrap(), race);
    }

    #[test]
    fn test_state_json_accepts_each_status() {
        let ready: RaceState = serde_json::from_str("{}").unwrap();
        assert_eq!(ready, RaceState::new());

        let running: RaceState = serde_json::from_str(r#"{"started":true}"#).unwrap();
        assert_eq!(running.status(), RaceStatus::Running);
        assert_eq!(running.winner_index(), None);
    }

    #[test]
    fn test_state_json_rejects_broken_invariants() {
        for json in [
            r#"{"started":false,"finished":true,"winnerIndex":3}"#,
            r#"{"started":true,"finished":false,"winnerIndex":3}"#,
            r#"{"started":false,"finished":false,"winnerIndex":0}"#,
            r#"{"started":true,"finished":true}"#,
        ] {
            let err = serde_json::from_str::<RaceState>(json).unwrap_err();
            assert!(err.to_string().contains("inconsistent race state"), "{json}: {err}");
        }
    }
}
