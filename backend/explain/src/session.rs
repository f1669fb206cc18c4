//! Per-section request lifecycle.
//!
//! A section starts `Idle`; an explain request moves it to `Pending` and
//! no second request may start until the first resolves. Success stores
//! the audio and starts playback (`Ready`), failure returns to `Idle`.
//! A request that is dropped before it resolves counts as a failure.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use papervoice_core::VoiceError;
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Pending { since: DateTime<Utc> },
    Ready { audio: Bytes, playing: bool },
}

/// Serializable view of a session, without the audio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum SessionStatus {
    Idle,
    #[serde(rename_all = "camelCase")]
    Pending { since: DateTime<Utc> },
    #[serde(rename_all = "camelCase")]
    Ready { audio_bytes: usize, playing: bool },
}

#[derive(Debug, Clone)]
pub struct SectionSession {
    key: String,
    state: SessionState,
}

impl SectionSession {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            state: SessionState::Idle,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn status(&self) -> SessionStatus {
        match &self.state {
            SessionState::Idle => SessionStatus::Idle,
            SessionState::Pending { since } => SessionStatus::Pending { since: *since },
            SessionState::Ready { audio, playing } => SessionStatus::Ready {
                audio_bytes: audio.len(),
                playing: *playing,
            },
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, SessionState::Pending { .. })
    }

    /// Start a request. Allowed from `Idle` and `Ready` (a fresh explanation).
    pub fn begin(&mut self) -> Result<(), VoiceError> {
        if self.is_pending() {
            return Err(VoiceError::RequestInFlight(self.key.clone()));
        }
        self.state = SessionState::Pending { since: Utc::now() };
        debug!(section = %self.key, "Explain request started");
        Ok(())
    }

    /// Resolve the outstanding request: audio → playing, no audio → back to idle.
    pub fn finish(&mut self, audio: Option<Bytes>) {
        self.state = match audio {
            Some(audio) => {
                info!(section = %self.key, bytes = audio.len(), "Explanation ready");
                SessionState::Ready { audio, playing: true }
            }
            None => {
                info!(section = %self.key, "Explain request failed, section idle");
                SessionState::Idle
            }
        };
    }

    /// Flip play/pause on a ready session. Returns the new playing flag, or `None` when no audio exists.
    pub fn toggle(&mut self) -> Option<bool> {
        match &mut self.state {
            SessionState::Ready { playing, .. } => {
                *playing = !*playing;
                Some(*playing)
            }
            _ => None,
        }
    }

    pub fn audio(&self) -> Option<&Bytes> {
        match &self.state {
            SessionState::Ready { audio, .. } => Some(audio),
            _ => None,
        }
    }
}

/// Sessions keyed by section id. Shared between concurrent requests; the lock is never held across an await.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, SectionSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, SectionSession>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn begin(&self, key: &str) -> Result<(), VoiceError> {
        self.lock()
            .entry(key.to_string())
            .or_insert_with(|| SectionSession::new(key))
            .begin()
    }

    /// Resolve `key`'s request. A failed section is forgotten, which reads as `Idle`.
    pub fn finish(&self, key: &str, audio: Option<Bytes>) {
        let mut sessions = self.lock();
        let Some(session) = sessions.get_mut(key) else {
            debug!(section = %key, "Finish for unknown section ignored");
            return;
        };
        let failed = audio.is_none();
        session.finish(audio);
        if failed {
            sessions.remove(key);
        }
    }

    /// `None` for unknown sections and sections without audio.
    pub fn toggle(&self, key: &str) -> Option<bool> {
        self.lock().get_mut(key).and_then(SectionSession::toggle)
    }

    pub fn status(&self, key: &str) -> SessionStatus {
        self.lock().get(key).map_or(SessionStatus::Idle, SectionSession::status)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Keeps one section `Pending` for the lifetime of a request.
///
/// Dropping the guard without [`PendingGuard::resolve`] (a cancelled or
/// timed-out request) puts the section back to `Idle`.
#[must_use = "dropping the guard releases the section immediately"]
pub struct PendingGuard {
    registry: Arc<SessionRegistry>,
    key: String,
    resolved: bool,
}

impl PendingGuard {
    /// Move `key` to `Pending`, or fail with [`VoiceError::RequestInFlight`].
    pub fn begin(registry: &Arc<SessionRegistry>, key: &str) -> Result<Self, VoiceError> {
        registry.begin(key)?;
        Ok(Self {
            registry: Arc::clone(registry),
            key: key.to_string(),
            resolved: false,
        })
    }

    pub fn resolve(mut self, audio: Option<Bytes>) {
        self.resolved = true;
        self.registry.finish(&self.key, audio);
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if !self.resolved {
            warn!(section = %self.key, "Explain request dropped before it resolved");
            self.registry.finish(&self.key, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_idle_pending_ready() {
        let mut session = SectionSession::new("S1");
        assert_eq!(session.state(), &SessionState::Idle);

        session.begin().unwrap();
        assert!(session.is_pending());

        session.finish(Some(Bytes::from_static(b"mp3")));
        assert_eq!(session.audio().map(|a| a.len()), Some(3));
        assert!(matches!(session.state(), SessionState::Ready { playing: true, .. }));
    }

    #[test]
    fn second_begin_while_pending_is_refused() {
        let mut session = SectionSession::new("S1");
        session.begin().unwrap();
        let err = session.begin().unwrap_err();
        assert!(matches!(err, VoiceError::RequestInFlight(ref key) if key == "S1"));
    }

    #[test]
    fn failure_returns_to_idle() {
        let mut session = SectionSession::new("S1");
        session.begin().unwrap();
        session.finish(None);
        assert_eq!(session.state(), &SessionState::Idle);
        assert!(session.begin().is_ok());
    }

    #[test]
    fn toggle_only_on_ready() {
        let mut session = SectionSession::new("S1");
        assert_eq!(session.toggle(), None);
        session.begin().unwrap();
        assert_eq!(session.toggle(), None);
        session.finish(Some(Bytes::from_static(b"a")));
        assert_eq!(session.toggle(), Some(false));
        assert_eq!(session.toggle(), Some(true));
    }

    #[test]
    fn registry_isolates_sections() {
        let registry = SessionRegistry::new();
        registry.begin("S1").unwrap();
        registry.begin("S2").unwrap();
        assert!(registry.begin("S1").is_err());

        registry.finish("S1", Some(Bytes::from_static(b"abc")));
        assert_eq!(
            registry.status("S1"),
            SessionStatus::Ready { audio_bytes: 3, playing: true }
        );
        assert!(matches!(registry.status("S2"), SessionStatus::Pending { .. }));
        assert_eq!(registry.status("unknown"), SessionStatus::Idle);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn unknown_sections_are_not_created() {
        let registry = SessionRegistry::new();
        for i in 0..100 {
            assert_eq!(registry.toggle(&format!("made-up-{i}")), None);
            registry.finish(&format!("other-{i}"), None);
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn failed_sections_are_forgotten() {
        let registry = SessionRegistry::new();
        registry.begin("S1").unwrap();
        registry.finish("S1", None);
        assert!(registry.is_empty());
        assert_eq!(registry.status("S1"), SessionStatus::Idle);
    }

    #[test]
    fn dropped_guard_releases_section() {
        let registry = Arc::new(SessionRegistry::new());
        let guard = PendingGuard::begin(&registry, "S1").unwrap();
        assert!(PendingGuard::begin(&registry, "S1").is_err());
        drop(guard);
        assert_eq!(registry.status("S1"), SessionStatus::Idle);

        let guard = PendingGuard::begin(&registry, "S1").unwrap();
        guard.resolve(Some(Bytes::from_static(b"mp3")));
        assert!(matches!(registry.status("S1"), SessionStatus::Ready { playing: true, .. }));
    }

    #[test]
    fn status_serializes_with_state_tag() {
        let json = serde_json::to_value(SessionStatus::Ready { audio_bytes: 5, playing: false }).unwrap();
        assert_eq!(json, serde_json::json!({"state": "ready", "audioBytes": 5, "playing": false}));
    }
}
