use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use synopsis_core::Language;

use crate::pipeline::RunOutcome;

/// Number of completed runs a participant must submit before the study is
/// done.
pub const REQUIRED_RUNS: u32 = 3;

/// Where a session currently sits in the study flow. Transitions are
/// triggered by discrete participant actions, never implicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StudyPhase {
    AwaitingConsent,
    AwaitingInput,
    AwaitingFeedback,
    Completed,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PhaseError {
    #[error("{action} is not allowed in phase {phase:?}")]
    WrongPhase {
        action: &'static str,
        phase: StudyPhase,
    },
    #[error("no run is awaiting feedback")]
    NoPendingRun,
}

/// Per-participant session state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudySession {
    pub id: String,
    pub language: Language,
    pub phase: StudyPhase,
    pub run_count: u32,
    /// Outcome of the latest run, held until its feedback is logged.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub pending_run: Option<RunOutcome>,
}

impl StudySession {
    pub fn new(id: String, language: Language) -> Self {
        Self {
            id,
            language,
            phase: StudyPhase::AwaitingConsent,
            run_count: 0,
            pending_run: None,
        }
    }

    /// AwaitingConsent -> AwaitingInput.
    pub fn give_consent(&mut self) -> Result<(), PhaseError> {
        match self.phase {
            StudyPhase::AwaitingConsent => {
                self.phase = StudyPhase::AwaitingInput;
                Ok(())
            }
            phase => Err(PhaseError::WrongPhase {
                action: "consent",
                phase,
            }),
        }
    }

    /// AwaitingInput -> AwaitingFeedback, holding the run outcome. A run
    /// that produced no recommendation does not reach this transition.
    pub fn attach_run(&mut self, outcome: RunOutcome) -> Result<(), PhaseError> {
        match self.phase {
            StudyPhase::AwaitingInput => {
                self.pending_run = Some(outcome);
                self.phase = StudyPhase::AwaitingFeedback;
                Ok(())
            }
            phase => Err(PhaseError::WrongPhase {
                action: "run",
                phase,
            }),
        }
    }

    /// AwaitingFeedback -> AwaitingInput or Completed. Returns the outcome
    /// the feedback belongs to and the number of the completed run.
    pub fn complete_run(&mut self) -> Result<(RunOutcome, u32), PhaseError> {
        match self.phase {
            StudyPhase::AwaitingFeedback => {
                let outcome = self.pending_run.take().ok_or(PhaseError::NoPendingRun)?;
                self.run_count += 1;
                self.phase = if self.run_count >= REQUIRED_RUNS {
                    StudyPhase::Completed
                } else {
                    StudyPhase::AwaitingInput
                };
                Ok((outcome, self.run_count))
            }
            phase => Err(PhaseError::WrongPhase {
                action: "feedback",
                phase,
            }),
        }
    }

    /// Final free-text feedback is only accepted once the study completed.
    pub fn accept_final_feedback(&self) -> Result<(), PhaseError> {
        match self.phase {
            StudyPhase::Completed => Ok(()),
            phase => Err(PhaseError::WrongPhase {
                action: "final feedback",
                phase,
            }),
        }
    }
}

/// Trait for storing and retrieving study sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn save(&self, session: StudySession) -> anyhow::Result<()>;
    async fn get(&self, id: &str) -> anyhow::Result<Option<StudySession>>;
    async fn delete(&self, id: &str) -> anyhow::Result<()>;
}

/// In-memory implementation of [`SessionStore`].
pub struct InMemorySessionStore {
    sessions: DashMap<String, StudySession>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn save(&self, session: StudySession) -> anyhow::Result<()> {
        self.sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn get(&self, id: &str) -> anyhow::Result<Option<StudySession>> {
        Ok(self.sessions.get(id).map(|entry| entry.clone()))
    }

    async fn delete(&self, id: &str) -> anyhow::Result<()> {
        self.sessions.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use synopsis_core::PreferenceProfile;

    fn outcome() -> RunOutcome {
        RunOutcome {
            watched_title: "Inception".to_string(),
            watched_synopsis: String::new(),
            profile: PreferenceProfile::default(),
            skipped_fields: PreferenceProfile::default().skipped_fields(),
            recommended_title: "Interstellar".to_string(),
            recommended_synopsis: String::new(),
            recommended_genre: "Sci-Fi".to_string(),
            personalized_synopsis: "text".to_string(),
            recommendations: Vec::new(),
        }
    }

    #[test]
    fn happy_path_completes_after_three_runs() {
        let mut session = StudySession::new("s1".to_string(), Language::English);
        assert_eq!(session.phase, StudyPhase::AwaitingConsent);

        session.give_consent().unwrap();
        for run in 1..=REQUIRED_RUNS {
            assert_eq!(session.phase, StudyPhase::AwaitingInput);
            session.attach_run(outcome()).unwrap();
            assert_eq!(session.phase, StudyPhase::AwaitingFeedback);
            let (_, number) = session.complete_run().unwrap();
            assert_eq!(number, run);
        }

        assert_eq!(session.phase, StudyPhase::Completed);
        assert!(session.accept_final_feedback().is_ok());
    }

    #[test]
    fn actions_in_the_wrong_phase_are_rejected() {
        let mut session = StudySession::new("s1".to_string(), Language::German);

        assert!(matches!(
            session.attach_run(outcome()),
            Err(PhaseError::WrongPhase { action: "run", .. })
        ));
        assert!(session.complete_run().is_err());
        assert!(session.accept_final_feedback().is_err());

        session.give_consent().unwrap();
        assert!(matches!(
            session.give_consent(),
            Err(PhaseError::WrongPhase {
                action: "consent",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn in_memory_store_round_trips_sessions() {
        let store = InMemorySessionStore::new();
        let session = StudySession::new("s1".to_string(), Language::English);
        store.save(session.clone()).await.unwrap();

        let loaded = store.get("s1").await.unwrap().unwrap();
        assert_eq!(loaded.phase, StudyPhase::AwaitingConsent);
        assert!(store.get("missing").await.unwrap().is_none());

        store.delete("s1").await.unwrap();
        assert!(store.get("s1").await.unwrap().is_none());
    }
}
