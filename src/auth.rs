//! Authentication context injected into the client.
//!
//! The credential is established on login and torn down on logout or when
//! the backend rejects it. Requests only read it, through a
//! [`CredentialLease`] taken at dispatch time. Expiry is reported once to
//! whoever subscribed, which is where the "go log in again" reaction
//! belongs.

use std::sync::{Mutex, PoisonError};

use metrics::counter;
use tokio::sync::broadcast;

use crate::types::{Credential, Student};

#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    LoggedIn(Student),
    LoggedOut,
    /// The backend rejected the credential; it has been cleared.
    LoginRequired,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CredentialLease {
    pub token: String,
    pub generation: u64,
}

#[derive(Debug, Default)]
struct AuthState {
    credential: Option<Credential>,
    generation: u64,
    // a LoginRequired is outstanding until the next login or logout
    prompted: bool,
}

#[derive(Debug)]
pub struct AuthSession {
    state: Mutex<AuthState>,
    events: broadcast::Sender<AuthEvent>,
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthSession {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            state: Mutex::new(AuthState::default()),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    pub fn establish(&self, credential: Credential) {
        let student = credential.student.clone();
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.generation += 1;
            state.credential = Some(credential);
            state.prompted = false;
        }
        tracing::info!(student = %student.email, "session established");
        let _ = self.events.send(AuthEvent::LoggedIn(student));
    }

    pub fn logout(&self) {
        let had_credential = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.generation += 1;
            state.prompted = false;
            state.credential.take().is_some()
        };
        if had_credential {
            tracing::info!("session closed by logout");
            let _ = self.events.send(AuthEvent::LoggedOut);
        }
    }

    pub fn current(&self) -> Option<CredentialLease> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.credential.as_ref().map(|credential| CredentialLease {
            token: credential.access_token.clone(),
            generation: state.generation,
        })
    }

    pub fn student(&self) -> Option<Student> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.credential.as_ref().map(|c| c.student.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.current().is_some()
    }

    /// Clears the credential the lease was taken from. Only the first call
    /// per credential has an effect, so concurrent rejections notify once.
    /// Returns whether this call performed the expiry.
    pub fn expire(&self, lease: &CredentialLease) -> bool {
        let expired = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            let current = state.credential.is_some() && lease.generation == state.generation;
            if current {
                state.credential = None;
                state.generation += 1;
                state.prompted = true;
            }
            current
        };

        if expired {
            tracing::warn!("credential rejected by backend, login required");
            counter!("auth_expirations_total").increment(1);
            let _ = self.events.send(AuthEvent::LoginRequired);
        }
        expired
    }

    /// Reports an auth rejection of a request that carried no credential.
    /// Asks for a login unless one is already outstanding; returns whether
    /// this call did.
    pub fn require_login(&self) -> bool {
        let prompt = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            let prompt = state.credential.is_none() && !state.prompted;
            if prompt {
                state.prompted = true;
            }
            prompt
        };

        if prompt {
            tracing::warn!("backend requires a login");
            let _ = self.events.send(AuthEvent::LoginRequired);
        }
        prompt
    }
}
