//! Session reconciliation state machine.
//!
//! [`SessionState::transition`] is a pure function of `(state, input)`
//! returning the next state plus the [`Effect`]s the actor must perform.
//! Nothing here touches the network, the store or the clock, so every rule
//! can be exercised synchronously.
//!
//! ```text
//!                 SessionStarted (new user)
//! Uninitialized ─────────────────────────────► Processing ──Restricted/Banned──► LoggedOut
//!      │                                           │
//!      │ NoSession                                 │ Clear / Unavailable (hydrate)
//!      ▼                                           ▼
//!  LoggedOut ◄──── Banned/Deleted/Unauthorized ─ Authenticated ◄──Refreshed──┐
//!      ▲                                           │                        │
//!      │            retries exhausted              │ SignedOut              │
//!      └──────────────────────────────── ConfirmingSignOut ─────────────────┘
//! ```

use crate::{
    auth::{RestrictionVerdict, Session, SessionUser, UserId},
    navigation::Destination,
    profile::{AuthUser, Profile},
    store::Flag,
};

/// Where the engine is in the login lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Nothing heard from the session store yet
    Uninitialized,
    /// Restriction check in flight for this session
    Processing {
        session: Session,
        cached: Option<CachedHint>,
    },
    Authenticated { user_id: UserId },
    /// Provider reported SIGNED_OUT; refreshing to tell a blip from a logout
    ConfirmingSignOut { user_id: UserId, attempt: u32 },
    LoggedOut,
}

/// Trusted cache entry carried into the optimistic hydrate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedHint {
    pub profile: Profile,
    pub fresh: bool,
}

/// Final result of the background profile refresh (fetch + fallback)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileOutcome {
    Confirmed(Profile),
    Banned,
    Deleted,
    Unauthorized,
    /// Neither source answered; keep the optimistic state
    Unavailable,
}

/// Result of one session refresh attempt during sign-out confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed,
    /// Network-level failure, worth retrying
    Transient,
    /// Provider says the session is gone
    Failed,
}

/// Engine inputs, already enriched with whatever local state the rules need
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// SIGNED_IN or INITIAL_SESSION carrying a session
    SessionStarted {
        session: Session,
        cached: Option<CachedHint>,
        /// The callback flow already ran the restriction check
        restriction_checked: bool,
    },
    /// INITIAL_SESSION without a session
    NoSession,
    SignedOut {
        /// A cooldown or account-deletion redirect owns the navigation
        redirect_in_flight: bool,
    },
    RestrictionChecked {
        user_id: UserId,
        verdict: RestrictionVerdict,
    },
    ProfileResolved {
        user_id: UserId,
        outcome: ProfileOutcome,
    },
    RefreshFinished {
        attempt: u32,
        outcome: RefreshOutcome,
    },
    LogoutRequested,
    DeletionCompleted,
    ProfileUpdated(Profile),
}

/// Side effects requested by a transition, executed in order by the actor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    CheckRestriction {
        user_id: UserId,
        email: Option<String>,
    },
    /// Background, fire-and-forget
    RefreshProfile { user_id: UserId },
    /// Background, fire-and-forget
    UpsertUser { user: SessionUser },
    ScheduleRefresh { attempt: u32 },
    /// Background provider sign-out, optionally preceded by backend logout
    SignOut { backend_logout: bool },
    Redirect(Destination),
    SetFlag(Flag),
    ClearFlag(Flag),
    WriteCache(Profile),
    /// Drop profile cache and session-scoped keys
    ClearLocalData,
}

/// What the rest of the application observes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSnapshot {
    pub user: Option<AuthUser>,
    pub is_logged_in: bool,
    pub is_loading: bool,
}

impl Default for AuthSnapshot {
    fn default() -> Self {
        Self {
            user: None,
            is_logged_in: false,
            is_loading: true,
        }
    }
}

/// The single owned state container of the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    phase: Phase,
    user: Option<AuthUser>,
    is_loading: bool,
    last_user_id: Option<UserId>,
    max_refresh_attempts: u32,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(3)
    }
}

impl SessionState {
    pub fn new(max_refresh_attempts: u32) -> Self {
        Self {
            phase: Phase::Uninitialized,
            user: None,
            is_loading: true,
            last_user_id: None,
            max_refresh_attempts: max_refresh_attempts.max(1),
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn user(&self) -> Option<&AuthUser> {
        self.user.as_ref()
    }

    pub fn last_user_id(&self) -> Option<&str> {
        self.last_user_id.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
            && matches!(
                self.phase,
                Phase::Authenticated { .. } | Phase::ConfirmingSignOut { .. }
            )
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        AuthSnapshot {
            user: self.user.clone(),
            is_logged_in: self.is_logged_in(),
            is_loading: self.is_loading,
        }
    }

    /// Apply one input
    pub fn transition(mut self, input: Input) -> (Self, Vec<Effect>) {
        let effects = match input {
            Input::SessionStarted {
                session,
                cached,
                restriction_checked,
            } => self.on_session_started(session, cached, restriction_checked),
            Input::NoSession => self.on_no_session(),
            Input::SignedOut { redirect_in_flight } => self.on_signed_out(redirect_in_flight),
            Input::RestrictionChecked { user_id, verdict } => {
                self.on_restriction_checked(&user_id, verdict)
            }
            Input::ProfileResolved { user_id, outcome } => {
                self.on_profile_resolved(&user_id, outcome)
            }
            Input::RefreshFinished { attempt, outcome } => {
                self.on_refresh_finished(attempt, outcome)
            }
            Input::LogoutRequested => {
                self.reset();
                vec![
                    Effect::ClearLocalData,
                    Effect::Redirect(Destination::Entry),
                    Effect::SignOut {
                        backend_logout: true,
                    },
                ]
            }
            Input::DeletionCompleted => {
                self.reset();
                vec![Effect::ClearLocalData, Effect::Redirect(Destination::Entry)]
            }
            Input::ProfileUpdated(profile) => self.on_profile_updated(profile),
        };
        (self, effects)
    }

    fn on_session_started(
        &mut self,
        session: Session,
        cached: Option<CachedHint>,
        restriction_checked: bool,
    ) -> Vec<Effect> {
        let user_id = session.user_id().to_string();
        // The callback marker is single-use whichever branch takes the event
        let mut effects = vec![Effect::ClearFlag(Flag::AuthCheckCompleted)];

        if let Phase::ConfirmingSignOut {
            user_id: confirming,
            ..
        } = &self.phase
            && *confirming == user_id
        {
            self.phase = Phase::Authenticated { user_id };
            return effects;
        }

        if matches!(self.phase, Phase::Processing { .. })
            || self.last_user_id.as_deref() == Some(user_id.as_str())
        {
            log::debug!("Ignoring duplicate session event for {}", user_id);
            self.is_loading = false;
            return effects;
        }

        self.last_user_id = Some(user_id.clone());
        effects.extend([
            Effect::ClearFlag(Flag::CooldownRedirect),
            Effect::ClearFlag(Flag::AccountDeletion),
        ]);

        if restriction_checked {
            effects.extend(self.hydrate(&session, cached));
            return effects;
        }

        effects.push(Effect::CheckRestriction {
            user_id,
            email: session.user.email.clone(),
        });
        self.user = None;
        self.is_loading = true;
        self.phase = Phase::Processing { session, cached };
        effects
    }

    fn on_no_session(&mut self) -> Vec<Effect> {
        if self.user.is_none() {
            self.phase = Phase::LoggedOut;
        }
        self.is_loading = false;
        Vec::new()
    }

    fn on_signed_out(&mut self, redirect_in_flight: bool) -> Vec<Effect> {
        if redirect_in_flight {
            log::debug!("SIGNED_OUT during a guarded redirect, leaving state untouched");
            return Vec::new();
        }

        match &self.phase {
            Phase::Authenticated { user_id } => {
                self.phase = Phase::ConfirmingSignOut {
                    user_id: user_id.clone(),
                    attempt: 1,
                };
                vec![Effect::ScheduleRefresh { attempt: 1 }]
            }
            Phase::ConfirmingSignOut { .. } => Vec::new(),
            Phase::Processing { .. } | Phase::Uninitialized | Phase::LoggedOut => {
                self.reset();
                Vec::new()
            }
        }
    }

    fn on_restriction_checked(&mut self, user_id: &str, verdict: RestrictionVerdict) -> Vec<Effect> {
        let Phase::Processing { session, cached } = &self.phase else {
            log::debug!("Restriction result for {} arrived outside processing", user_id);
            return Vec::new();
        };
        if session.user_id() != user_id {
            log::debug!("Dropping stale restriction result for {}", user_id);
            return Vec::new();
        }

        match verdict {
            RestrictionVerdict::Clear | RestrictionVerdict::Unavailable => {
                let session = session.clone();
                let cached = cached.clone();
                self.hydrate(&session, cached)
            }
            RestrictionVerdict::Restricted => {
                self.reset();
                vec![
                    Effect::SetFlag(Flag::CooldownRedirect),
                    Effect::SignOut {
                        backend_logout: false,
                    },
                    Effect::Redirect(Destination::Cooldown),
                ]
            }
            RestrictionVerdict::Banned => self.evict(Destination::Banned),
        }
    }

    fn on_profile_resolved(&mut self, user_id: &str, outcome: ProfileOutcome) -> Vec<Effect> {
        if !self.holds_user(user_id) {
            log::debug!("Dropping profile result for inactive user {}", user_id);
            return Vec::new();
        }

        match outcome {
            ProfileOutcome::Confirmed(profile) if profile.is_banned() => {
                self.evict(Destination::Banned)
            }
            ProfileOutcome::Confirmed(profile) => {
                let mut effects = Vec::new();
                if let Some(user) = self.user.as_mut() {
                    user.apply_profile(&profile);
                }
                if !profile.has_school() {
                    effects.push(Effect::Redirect(Destination::SchoolSelection));
                }
                effects.insert(0, Effect::WriteCache(profile));
                effects
            }
            ProfileOutcome::Banned => self.evict(Destination::Banned),
            ProfileOutcome::Deleted | ProfileOutcome::Unauthorized => {
                self.evict(Destination::Entry)
            }
            ProfileOutcome::Unavailable => {
                log::info!("Profile for {} unavailable, keeping optimistic state", user_id);
                Vec::new()
            }
        }
    }

    fn on_refresh_finished(&mut self, attempt: u32, outcome: RefreshOutcome) -> Vec<Effect> {
        let Phase::ConfirmingSignOut {
            user_id,
            attempt: current,
        } = &self.phase
        else {
            return Vec::new();
        };
        if *current != attempt {
            return Vec::new();
        }

        match outcome {
            RefreshOutcome::Refreshed => {
                log::info!("Session recovered after SIGNED_OUT (attempt {})", attempt);
                self.phase = Phase::Authenticated {
                    user_id: user_id.clone(),
                };
                Vec::new()
            }
            RefreshOutcome::Transient if attempt < self.max_refresh_attempts => {
                let next = attempt + 1;
                self.phase = Phase::ConfirmingSignOut {
                    user_id: user_id.clone(),
                    attempt: next,
                };
                vec![Effect::ScheduleRefresh { attempt: next }]
            }
            RefreshOutcome::Transient | RefreshOutcome::Failed => {
                log::info!("Sign-out confirmed after {} attempt(s)", attempt);
                self.reset();
                vec![Effect::ClearLocalData]
            }
        }
    }

    fn on_profile_updated(&mut self, profile: Profile) -> Vec<Effect> {
        if !self.holds_user(&profile.id) {
            return Vec::new();
        }
        if let Some(user) = self.user.as_mut() {
            user.apply_profile(&profile);
        }
        vec![Effect::WriteCache(profile)]
    }

    /// Optimistic hydrate followed by the background steps
    fn hydrate(&mut self, session: &Session, cached: Option<CachedHint>) -> Vec<Effect> {
        let user = match &cached {
            Some(hint) => AuthUser::from_cache(&session.user, &hint.profile, hint.fresh),
            None => AuthUser::placeholder(&session.user),
        };
        let user_id = user.id.clone();

        self.user = Some(user);
        self.is_loading = false;
        self.phase = Phase::Authenticated {
            user_id: user_id.clone(),
        };

        vec![
            Effect::RefreshProfile { user_id },
            Effect::UpsertUser {
                user: session.user.clone(),
            },
        ]
    }

    /// Policy eviction: drop everything and send the user elsewhere
    fn evict(&mut self, destination: Destination) -> Vec<Effect> {
        self.reset();
        vec![
            Effect::ClearLocalData,
            Effect::SignOut {
                backend_logout: false,
            },
            Effect::Redirect(destination),
        ]
    }

    fn reset(&mut self) {
        self.phase = Phase::LoggedOut;
        self.user = None;
        self.is_loading = false;
        self.last_user_id = None;
    }

    fn holds_user(&self, user_id: &str) -> bool {
        let phase_matches = match &self.phase {
            Phase::Authenticated { user_id: id } | Phase::ConfirmingSignOut { user_id: id, .. } => {
                id == user_id
            }
            _ => false,
        };
        phase_matches && self.user.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{ProfileOrigin, ProfileStatus};

    fn session(id: &str, email: &str) -> Session {
        Session {
            user: SessionUser {
                id: id.to_string(),
                email: Some(email.to_string()),
                nickname: None,
            },
            access_token: format!("access-{id}"),
            refresh_token: format!("refresh-{id}"),
            expires_at: None,
        }
    }

    fn profile(id: &str, school: Option<&str>) -> Profile {
        Profile {
            id: id.to_string(),
            email: Some("a@x.com".to_string()),
            nickname: Some("nick".to_string()),
            status: ProfileStatus::Active,
            school: school.map(str::to_string),
            is_admin: false,
            created_at: None,
        }
    }

    fn started(id: &str) -> Input {
        Input::SessionStarted {
            session: session(id, "a@x.com"),
            cached: None,
            restriction_checked: false,
        }
    }

    fn authenticated(id: &str) -> SessionState {
        let (state, _) = SessionState::default().transition(started(id));
        let (state, _) = state.transition(Input::RestrictionChecked {
            user_id: id.to_string(),
            verdict: RestrictionVerdict::Clear,
        });
        state
    }

    #[test]
    fn test_sign_in_starts_restriction_check() {
        let (state, effects) = SessionState::default().transition(started("u1"));

        assert!(matches!(state.phase(), Phase::Processing { .. }));
        assert_eq!(state.last_user_id(), Some("u1"));
        assert!(state.is_loading());
        assert!(!state.is_logged_in());
        assert!(effects.contains(&Effect::CheckRestriction {
            user_id: "u1".to_string(),
            email: Some("a@x.com".to_string()),
        }));
    }

    #[test]
    fn test_duplicate_sign_in_is_a_no_op() {
        let (state, _) = SessionState::default().transition(started("u1"));
        let (state, effects) = state.transition(started("u1"));

        assert_eq!(effects, vec![Effect::ClearFlag(Flag::AuthCheckCompleted)]);
        assert!(!state.is_loading());
        assert!(matches!(state.phase(), Phase::Processing { .. }));
    }

    #[test]
    fn test_other_user_while_processing_is_ignored() {
        let (state, _) = SessionState::default().transition(started("u1"));
        let (state, effects) = state.transition(started("u2"));
        assert_eq!(effects, vec![Effect::ClearFlag(Flag::AuthCheckCompleted)]);
        assert_eq!(state.last_user_id(), Some("u1"));
    }

    #[test]
    fn test_same_user_after_authentication_is_ignored() {
        let state = authenticated("u1");
        let (_, effects) = state.transition(started("u1"));
        assert_eq!(effects, vec![Effect::ClearFlag(Flag::AuthCheckCompleted)]);
    }

    #[test]
    fn test_checked_duplicate_still_consumes_marker() {
        let (state, _) = SessionState::default().transition(started("u1"));
        let (state, effects) = state.transition(Input::SessionStarted {
            session: session("u1", "a@x.com"),
            cached: None,
            restriction_checked: true,
        });

        assert_eq!(effects, vec![Effect::ClearFlag(Flag::AuthCheckCompleted)]);
        assert!(!state.is_logged_in());
        assert!(matches!(state.phase(), Phase::Processing { .. }));
    }

    #[test]
    fn test_clear_verdict_hydrates_optimistically() {
        let (state, _) = SessionState::default().transition(started("u1"));
        let (state, effects) = state.transition(Input::RestrictionChecked {
            user_id: "u1".to_string(),
            verdict: RestrictionVerdict::Clear,
        });

        assert!(state.is_logged_in());
        assert!(!state.is_loading());
        let user = state.user().unwrap();
        assert!(!user.is_admin);
        assert_eq!(user.school.as_deref(), Some("unknown"));
        assert_eq!(
            effects,
            vec![
                Effect::RefreshProfile {
                    user_id: "u1".to_string()
                },
                Effect::UpsertUser {
                    user: session("u1", "a@x.com").user
                },
            ]
        );
    }

    #[test]
    fn test_unavailable_check_does_not_block_login() {
        let (state, _) = SessionState::default().transition(started("u1"));
        let (state, _) = state.transition(Input::RestrictionChecked {
            user_id: "u1".to_string(),
            verdict: RestrictionVerdict::Unavailable,
        });
        assert!(state.is_logged_in());
    }

    #[test]
    fn test_ban_short_circuits_before_hydrate() {
        let (state, _) = SessionState::default().transition(started("u1"));
        assert!(!state.snapshot().is_logged_in);

        let (state, effects) = state.transition(Input::RestrictionChecked {
            user_id: "u1".to_string(),
            verdict: RestrictionVerdict::Banned,
        });

        assert!(!state.snapshot().is_logged_in);
        assert!(state.user().is_none());
        assert_eq!(state.phase(), &Phase::LoggedOut);
        assert!(effects.contains(&Effect::Redirect(Destination::Banned)));
        assert!(!effects.iter().any(|e| matches!(e, Effect::RefreshProfile { .. })));
    }

    #[test]
    fn test_restriction_sets_cooldown_guard_before_sign_out() {
        let (state, _) = SessionState::default().transition(started("u1"));
        let (state, effects) = state.transition(Input::RestrictionChecked {
            user_id: "u1".to_string(),
            verdict: RestrictionVerdict::Restricted,
        });

        assert_eq!(
            effects,
            vec![
                Effect::SetFlag(Flag::CooldownRedirect),
                Effect::SignOut {
                    backend_logout: false
                },
                Effect::Redirect(Destination::Cooldown),
            ]
        );
        assert_eq!(state.last_user_id(), None);
    }

    #[test]
    fn test_pre_checked_login_skips_restriction_step() {
        let (state, effects) = SessionState::default().transition(Input::SessionStarted {
            session: session("u1", "a@x.com"),
            cached: None,
            restriction_checked: true,
        });

        assert!(state.is_logged_in());
        assert!(effects.contains(&Effect::ClearFlag(Flag::AuthCheckCompleted)));
        assert!(!effects.iter().any(|e| matches!(e, Effect::CheckRestriction { .. })));
    }

    #[test]
    fn test_cached_profile_paints_hydrate() {
        let mut cached = profile("u1", Some("한밭고"));
        cached.is_admin = true;
        let (state, _) = SessionState::default().transition(Input::SessionStarted {
            session: session("u1", "a@x.com"),
            cached: Some(CachedHint {
                profile: cached,
                fresh: false,
            }),
            restriction_checked: true,
        });

        let user = state.user().unwrap();
        assert!(user.is_admin);
        assert_eq!(user.school.as_deref(), Some("한밭고"));
        assert_eq!(user.origin, ProfileOrigin::Cache { fresh: false });
    }

    #[test]
    fn test_confirmed_profile_supersedes_cache() {
        let (state, _) = SessionState::default().transition(Input::SessionStarted {
            session: session("u1", "a@x.com"),
            cached: Some(CachedHint {
                profile: profile("u1", Some("옛학교")),
                fresh: false,
            }),
            restriction_checked: true,
        });

        let (state, effects) = state.transition(Input::ProfileResolved {
            user_id: "u1".to_string(),
            outcome: ProfileOutcome::Confirmed(profile("u1", Some("한밭고"))),
        });

        let user = state.user().unwrap();
        assert_eq!(user.school.as_deref(), Some("한밭고"));
        assert_eq!(user.origin, ProfileOrigin::Server);
        assert_eq!(effects, vec![Effect::WriteCache(profile("u1", Some("한밭고")))]);
    }

    #[test]
    fn test_missing_school_redirects_to_selection() {
        let state = authenticated("u1");
        let (state, effects) = state.transition(Input::ProfileResolved {
            user_id: "u1".to_string(),
            outcome: ProfileOutcome::Confirmed(profile("u1", Some("unknown"))),
        });
        assert!(state.is_logged_in());
        assert_eq!(
            effects,
            vec![
                Effect::WriteCache(profile("u1", Some("unknown"))),
                Effect::Redirect(Destination::SchoolSelection),
            ]
        );
    }

    #[test]
    fn test_profile_ban_evicts() {
        let state = authenticated("u1");
        let (state, effects) = state.transition(Input::ProfileResolved {
            user_id: "u1".to_string(),
            outcome: ProfileOutcome::Banned,
        });
        assert!(!state.is_logged_in());
        assert_eq!(
            effects,
            vec![
                Effect::ClearLocalData,
                Effect::SignOut {
                    backend_logout: false
                },
                Effect::Redirect(Destination::Banned),
            ]
        );
    }

    #[test]
    fn test_confirmed_banned_status_evicts() {
        let mut banned = profile("u1", Some("한밭고"));
        banned.status = ProfileStatus::Banned;
        let (state, effects) = authenticated("u1").transition(Input::ProfileResolved {
            user_id: "u1".to_string(),
            outcome: ProfileOutcome::Confirmed(banned),
        });
        assert!(state.user().is_none());
        assert!(effects.contains(&Effect::Redirect(Destination::Banned)));
    }

    #[test]
    fn test_unauthorized_profile_goes_to_entry() {
        let (_, effects) = authenticated("u1").transition(Input::ProfileResolved {
            user_id: "u1".to_string(),
            outcome: ProfileOutcome::Unauthorized,
        });
        assert!(effects.contains(&Effect::Redirect(Destination::Entry)));
    }

    #[test]
    fn test_unavailable_profile_keeps_state() {
        let before = authenticated("u1");
        let (after, effects) = before.clone().transition(Input::ProfileResolved {
            user_id: "u1".to_string(),
            outcome: ProfileOutcome::Unavailable,
        });
        assert!(effects.is_empty());
        assert_eq!(before, after);
    }

    #[test]
    fn test_stale_profile_result_dropped() {
        let state = authenticated("u1");
        let (state, effects) = state.transition(Input::ProfileResolved {
            user_id: "someone-else".to_string(),
            outcome: ProfileOutcome::Banned,
        });
        assert!(effects.is_empty());
        assert!(state.is_logged_in());
    }

    #[test]
    fn test_guarded_sign_out_changes_nothing() {
        let before = authenticated("u1");
        let (after, effects) = before.clone().transition(Input::SignedOut {
            redirect_in_flight: true,
        });
        assert!(effects.is_empty());
        assert_eq!(before, after);
    }

    #[test]
    fn test_sign_out_retries_then_clears() {
        let state = authenticated("u1");
        let (state, effects) = state.transition(Input::SignedOut {
            redirect_in_flight: false,
        });
        assert_eq!(effects, vec![Effect::ScheduleRefresh { attempt: 1 }]);
        assert!(state.is_logged_in());

        let (state, effects) = state.transition(Input::RefreshFinished {
            attempt: 1,
            outcome: RefreshOutcome::Transient,
        });
        assert_eq!(effects, vec![Effect::ScheduleRefresh { attempt: 2 }]);

        let (state, effects) = state.transition(Input::RefreshFinished {
            attempt: 2,
            outcome: RefreshOutcome::Transient,
        });
        assert_eq!(effects, vec![Effect::ScheduleRefresh { attempt: 3 }]);

        let (state, effects) = state.transition(Input::RefreshFinished {
            attempt: 3,
            outcome: RefreshOutcome::Transient,
        });
        assert_eq!(effects, vec![Effect::ClearLocalData]);
        assert!(!state.is_logged_in());
        assert_eq!(state.last_user_id(), None);
    }

    #[test]
    fn test_hard_refresh_failure_clears_immediately() {
        let (state, _) = authenticated("u1").transition(Input::SignedOut {
            redirect_in_flight: false,
        });
        let (state, effects) = state.transition(Input::RefreshFinished {
            attempt: 1,
            outcome: RefreshOutcome::Failed,
        });
        assert_eq!(effects, vec![Effect::ClearLocalData]);
        assert!(state.user().is_none());
    }

    #[test]
    fn test_refresh_recovers_session() {
        let (state, _) = authenticated("u1").transition(Input::SignedOut {
            redirect_in_flight: false,
        });
        let (state, effects) = state.transition(Input::RefreshFinished {
            attempt: 1,
            outcome: RefreshOutcome::Refreshed,
        });
        assert!(effects.is_empty());
        assert_eq!(
            state.phase(),
            &Phase::Authenticated {
                user_id: "u1".to_string()
            }
        );
    }

    #[test]
    fn test_logout_clears_before_background_calls() {
        let (state, effects) = authenticated("u1").transition(Input::LogoutRequested);
        assert!(!state.is_logged_in());
        assert_eq!(
            effects,
            vec![
                Effect::ClearLocalData,
                Effect::Redirect(Destination::Entry),
                Effect::SignOut {
                    backend_logout: true
                },
            ]
        );
    }

    #[test]
    fn test_sign_in_after_logout_processes_again() {
        let (state, _) = authenticated("u1").transition(Input::LogoutRequested);
        let (state, effects) = state.transition(started("u1"));
        assert!(matches!(state.phase(), Phase::Processing { .. }));
        assert!(effects.iter().any(|e| matches!(e, Effect::CheckRestriction { .. })));
    }

    #[test]
    fn test_no_session_finishes_loading() {
        let (state, effects) = SessionState::default().transition(Input::NoSession);
        assert!(effects.is_empty());
        assert!(!state.is_loading());
        assert_eq!(state.phase(), &Phase::LoggedOut);
    }
}
