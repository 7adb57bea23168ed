//! The access gate's state and its transitions.
//!
//! `GateState` is a plain value. Every transition is a method that mutates
//! it and returns the side effect the driver must perform, so the whole
//! decision procedure can be tested without a runtime.
//!
//! Identity bookkeeping:
//! - `in_flight`: identity whose allow-list lookup is outstanding
//! - `last_cleared`: identity whose check already reached a verdict
//! - `epoch`: bumped whenever an outstanding lookup stops being wanted;
//!   a lookup result is applied only if its ticket carries the current epoch

use crate::auth::AllowListRow;
use crate::session::Session;
use crate::user::AuthUser;
use allowgate_core::IdentityId;
use serde::Serialize;
use std::fmt;

const SIGNING_IN: &str = "Signing in…";
const LOGGED_IN: &str = "Successfully logged in!";
const ACCESS_DENIED: &str =
    "Access denied. If you believe this is an error, please contact an administrator.";
const VERIFICATION_ERROR: &str =
    "An error occurred while verifying your access. Please try again.";
const UNEXPECTED_ERROR: &str = "An unexpected error occurred. Please try again.";
const VERIFICATION_TIMEOUT: &str = "Verifying your access took too long. Please try again.";
const LOGIN_FAILED: &str = "Error encountered. Unable to log in to site.";

/// Coarse phase of the gate, one per UI view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    SignedOut,
    Checking,
    Admitted,
    Denied,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SignedOut => "signed-out",
            Self::Checking => "checking",
            Self::Admitted => "admitted",
            Self::Denied => "denied",
        };
        f.write_str(name)
    }
}

/// Why an identity was not admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DenialReason {
    /// The lookup succeeded and the identity is not on the allow-list.
    NotAllowListed,
    /// The lookup itself failed.
    VerificationFailed,
    /// The lookup returned rows that cannot belong to a single identity.
    IntegrityAnomaly { rows: usize },
    /// The lookup did not finish within the configured timeout.
    TimedOut,
    /// The check path failed in an unclassified way.
    Unexpected,
}

impl DenialReason {
    /// Returns the text shown to the user.
    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            Self::NotAllowListed => ACCESS_DENIED,
            Self::VerificationFailed | Self::IntegrityAnomaly { .. } => VERIFICATION_ERROR,
            Self::TimedOut => VERIFICATION_TIMEOUT,
            Self::Unexpected => UNEXPECTED_ERROR,
        }
    }

    /// Returns true for a real verdict about the identity.
    ///
    /// Verdicts are remembered for the identity; everything else is an
    /// error and the same identity may be checked again.
    #[must_use]
    pub fn is_verdict(&self) -> bool {
        matches!(self, Self::NotAllowListed)
    }
}

/// Status text shown while signed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    /// The OAuth login could not be started or completed.
    LoginFailed,
}

impl Notice {
    /// Returns the text shown to the user.
    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            Self::LoginFailed => LOGIN_FAILED,
        }
    }
}

/// What the UI renders, tagged by phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum GateStatus {
    SignedOut { notice: Option<Notice> },
    Checking,
    Admitted { user: AuthUser },
    Denied { reason: DenialReason },
}

/// Request for an allow-list lookup, tagged for the stale-result guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTicket {
    /// Epoch the lookup was issued in.
    pub epoch: u64,
    /// The user being checked.
    pub user: AuthUser,
}

impl LookupTicket {
    /// Returns the identity being checked.
    #[must_use]
    pub fn identity(&self) -> &IdentityId {
        self.user.id()
    }
}

/// How an allow-list lookup ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// The table answered with these rows.
    Rows(Vec<AllowListRow>),
    /// The lookup failed.
    Failed { reason: String },
    /// The lookup exceeded the configured timeout.
    TimedOut,
    /// The lookup panicked.
    Panicked,
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Issue an allow-list lookup.
    Lookup(LookupTicket),
    /// End the session at the identity service.
    EndSession,
}

/// Result of feeding a lookup outcome back into the state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupCompletion {
    /// The result belongs to a check nobody wants anymore and was dropped.
    Stale,
    /// The result was applied, possibly requesting a follow-up effect.
    Applied(Option<Effect>),
}

/// State of one access gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateState {
    #[serde(flatten)]
    status: GateStatus,
    in_flight: Option<IdentityId>,
    last_cleared: Option<IdentityId>,
    #[serde(skip)]
    epoch: u64,
}

impl Default for GateState {
    fn default() -> Self {
        Self::new()
    }
}

impl GateState {
    /// Creates a signed-out state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: GateStatus::SignedOut { notice: None },
            in_flight: None,
            last_cleared: None,
            epoch: 0,
        }
    }

    /// Returns the tagged status.
    #[must_use]
    pub fn status(&self) -> &GateStatus {
        &self.status
    }

    /// Returns the phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        match self.status {
            GateStatus::SignedOut { .. } => Phase::SignedOut,
            GateStatus::Checking => Phase::Checking,
            GateStatus::Admitted { .. } => Phase::Admitted,
            GateStatus::Denied { .. } => Phase::Denied,
        }
    }

    /// Returns the admitted user. `None` unless the phase is `Admitted`.
    #[must_use]
    pub fn user(&self) -> Option<&AuthUser> {
        match &self.status {
            GateStatus::Admitted { user } => Some(user),
            _ => None,
        }
    }

    /// Returns the denial reason when the phase is `Denied`.
    #[must_use]
    pub fn denial(&self) -> Option<DenialReason> {
        match self.status {
            GateStatus::Denied { reason } => Some(reason),
            _ => None,
        }
    }

    /// Returns the signed-out notice, if any.
    #[must_use]
    pub fn notice(&self) -> Option<Notice> {
        match self.status {
            GateStatus::SignedOut { notice } => notice,
            _ => None,
        }
    }

    /// Returns the human-readable status text, if there is any.
    #[must_use]
    pub fn message(&self) -> Option<&'static str> {
        match &self.status {
            GateStatus::SignedOut { notice } => notice.map(|notice| notice.message()),
            GateStatus::Checking => Some(SIGNING_IN),
            GateStatus::Admitted { .. } => Some(LOGGED_IN),
            GateStatus::Denied { reason } => Some(reason.message()),
        }
    }

    /// Returns true while a login or check is pending.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.phase() == Phase::Checking
    }

    /// Returns the identity whose lookup is outstanding.
    #[must_use]
    pub fn in_flight(&self) -> Option<&IdentityId> {
        self.in_flight.as_ref()
    }

    /// Returns the identity that last reached a verdict.
    #[must_use]
    pub fn last_cleared(&self) -> Option<&IdentityId> {
        self.last_cleared.as_ref()
    }

    /// Returns the current lookup epoch.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Handles a session (or its absence) from either session path.
    ///
    /// Returns the lookup to issue, if this session needs checking.
    pub fn observe_session(&mut self, session: Option<&Session>) -> Option<Effect> {
        let Some(user) = session.and_then(Session::identified_user) else {
            self.forget_identities();
            // A denial stays on screen: the sign-out that follows it is our own.
            if matches!(self.status, GateStatus::Checking | GateStatus::Admitted { .. }) {
                self.status = GateStatus::SignedOut { notice: None };
            }
            return None;
        };

        let id = user.id();
        if self.in_flight.as_ref() == Some(id) || self.last_cleared.as_ref() == Some(id) {
            return None;
        }

        self.epoch += 1;
        self.in_flight = Some(id.clone());
        self.last_cleared = None;
        self.status = GateStatus::Checking;

        Some(Effect::Lookup(LookupTicket {
            epoch: self.epoch,
            user: user.clone(),
        }))
    }

    /// Applies the outcome of the lookup issued for `ticket`.
    pub fn complete_lookup(
        &mut self,
        ticket: LookupTicket,
        outcome: LookupOutcome,
    ) -> LookupCompletion {
        if ticket.epoch != self.epoch || self.in_flight.as_ref() != Some(ticket.identity()) {
            return LookupCompletion::Stale;
        }
        self.in_flight = None;

        let reason = match outcome {
            LookupOutcome::Rows(rows) => match rows.as_slice() {
                [row] if &row.id == ticket.identity() => {
                    self.last_cleared = Some(row.id.clone());
                    self.status = GateStatus::Admitted { user: ticket.user };
                    return LookupCompletion::Applied(None);
                }
                [] => DenialReason::NotAllowListed,
                rows => DenialReason::IntegrityAnomaly { rows: rows.len() },
            },
            LookupOutcome::Failed { .. } => DenialReason::VerificationFailed,
            LookupOutcome::TimedOut => DenialReason::TimedOut,
            LookupOutcome::Panicked => DenialReason::Unexpected,
        };

        if reason.is_verdict() {
            self.last_cleared = Some(ticket.user.id().clone());
        }
        self.status = GateStatus::Denied { reason };
        LookupCompletion::Applied(Some(Effect::EndSession))
    }

    /// Returns true when a login was started and no identity arrived yet.
    #[must_use]
    pub fn awaiting_provider(&self) -> bool {
        self.phase() == Phase::Checking && self.in_flight.is_none()
    }

    /// Marks an explicit login attempt as started.
    ///
    /// Returns false and changes nothing while a user is admitted. A new
    /// sign-in attempt lifts any verdict remembered for an identity.
    pub fn begin_login(&mut self) -> bool {
        if self.phase() == Phase::Admitted {
            return false;
        }
        self.last_cleared = None;
        self.status = GateStatus::Checking;
        true
    }

    /// Marks the login attempt as failed.
    ///
    /// Applies only while signed out or waiting on the provider. A running
    /// check or a reached verdict is left alone.
    pub fn login_failed(&mut self) {
        let applies = match self.status {
            GateStatus::SignedOut { .. } => true,
            GateStatus::Checking => self.in_flight.is_none(),
            GateStatus::Admitted { .. } | GateStatus::Denied { .. } => false,
        };
        if applies {
            self.forget_identities();
            self.status = GateStatus::SignedOut {
                notice: Some(Notice::LoginFailed),
            };
        }
    }

    /// Resets to signed out after an explicit logout.
    pub fn sign_out(&mut self) {
        self.forget_identities();
        self.status = GateStatus::SignedOut { notice: None };
    }

    fn forget_identities(&mut self) {
        self.epoch += 1;
        self.in_flight = None;
        self.last_cleared = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session_for(id: &str) -> Session {
        let user = AuthUser::new(id).with_email(Some(format!("{id}@example.com")));
        Session::new(format!("token-{id}"), user, Duration::hours(1))
    }

    fn start_check(state: &mut GateState, id: &str) -> LookupTicket {
        match state.observe_session(Some(&session_for(id))) {
            Some(Effect::Lookup(ticket)) => ticket,
            other => panic!("expected a lookup, got {other:?}"),
        }
    }

    #[test]
    fn starts_signed_out() {
        let state = GateState::new();
        assert_eq!(state.phase(), Phase::SignedOut);
        assert!(state.message().is_none());
        assert!(state.in_flight().is_none());
        assert!(state.last_cleared().is_none());
    }

    #[test]
    fn null_session_issues_nothing() {
        let mut state = GateState::new();
        assert_eq!(state.observe_session(None), None);
        assert_eq!(state.phase(), Phase::SignedOut);
    }

    #[test]
    fn session_without_identity_is_signed_out() {
        let mut state = GateState::new();
        let session = Session::new("token".to_string(), AuthUser::new(" "), Duration::hours(1));
        assert_eq!(state.observe_session(Some(&session)), None);
        assert_eq!(state.phase(), Phase::SignedOut);
    }

    #[test]
    fn new_identity_starts_a_check() {
        let mut state = GateState::new();
        let ticket = start_check(&mut state, "u1");

        assert_eq!(ticket.identity(), &IdentityId::from("u1"));
        assert_eq!(state.phase(), Phase::Checking);
        assert_eq!(state.message(), Some("Signing in…"));
        assert_eq!(state.in_flight(), Some(&IdentityId::from("u1")));
        assert!(state.is_loading());
    }

    #[test]
    fn duplicate_while_in_flight_is_ignored() {
        let mut state = GateState::new();
        start_check(&mut state, "u1");
        assert_eq!(state.observe_session(Some(&session_for("u1"))), None);
    }

    #[test]
    fn single_matching_row_admits() {
        let mut state = GateState::new();
        let ticket = start_check(&mut state, "u1");

        let completion =
            state.complete_lookup(ticket, LookupOutcome::Rows(vec![AllowListRow::new("u1")]));

        assert_eq!(completion, LookupCompletion::Applied(None));
        assert_eq!(state.phase(), Phase::Admitted);
        assert_eq!(state.user().map(AuthUser::id), Some(&IdentityId::from("u1")));
        assert_eq!(state.last_cleared(), Some(&IdentityId::from("u1")));
        assert!(state.in_flight().is_none());
        assert_eq!(state.message(), Some("Successfully logged in!"));
    }

    #[test]
    fn admitted_identity_is_not_rechecked() {
        let mut state = GateState::new();
        let ticket = start_check(&mut state, "u1");
        state.complete_lookup(ticket, LookupOutcome::Rows(vec![AllowListRow::new("u1")]));

        assert_eq!(state.observe_session(Some(&session_for("u1"))), None);
        assert_eq!(state.phase(), Phase::Admitted);
    }

    #[test]
    fn zero_rows_deny_and_remember() {
        let mut state = GateState::new();
        let ticket = start_check(&mut state, "u2");

        let completion = state.complete_lookup(ticket, LookupOutcome::Rows(Vec::new()));

        assert_eq!(completion, LookupCompletion::Applied(Some(Effect::EndSession)));
        assert_eq!(state.denial(), Some(DenialReason::NotAllowListed));
        assert_eq!(state.last_cleared(), Some(&IdentityId::from("u2")));
        assert!(state.message().is_some_and(|m| m.starts_with("Access denied")));
        assert_eq!(state.observe_session(Some(&session_for("u2"))), None);
    }

    #[test]
    fn failed_lookup_denies_without_remembering() {
        let mut state = GateState::new();
        let ticket = start_check(&mut state, "u2");

        let completion = state.complete_lookup(
            ticket,
            LookupOutcome::Failed {
                reason: "connection refused".to_string(),
            },
        );

        assert_eq!(completion, LookupCompletion::Applied(Some(Effect::EndSession)));
        assert_eq!(state.denial(), Some(DenialReason::VerificationFailed));
        assert!(state.last_cleared().is_none());
        assert!(matches!(
            state.observe_session(Some(&session_for("u2"))),
            Some(Effect::Lookup(_))
        ));
    }

    #[test]
    fn several_rows_are_an_anomaly() {
        let mut state = GateState::new();
        let ticket = start_check(&mut state, "u1");

        let rows = vec![AllowListRow::new("u1"), AllowListRow::new("u1")];
        let completion = state.complete_lookup(ticket, LookupOutcome::Rows(rows));

        assert_eq!(completion, LookupCompletion::Applied(Some(Effect::EndSession)));
        assert_eq!(state.denial(), Some(DenialReason::IntegrityAnomaly { rows: 2 }));
        assert!(state.user().is_none());
        assert!(state.last_cleared().is_none());
    }

    #[test]
    fn row_for_another_identity_is_an_anomaly() {
        let mut state = GateState::new();
        let ticket = start_check(&mut state, "u1");

        state.complete_lookup(ticket, LookupOutcome::Rows(vec![AllowListRow::new("u9")]));

        assert_eq!(state.denial(), Some(DenialReason::IntegrityAnomaly { rows: 1 }));
    }

    #[test]
    fn timeout_and_panic_are_errors() {
        let mut state = GateState::new();
        let ticket = start_check(&mut state, "u1");
        state.complete_lookup(ticket, LookupOutcome::TimedOut);
        assert_eq!(state.denial(), Some(DenialReason::TimedOut));
        assert!(state.last_cleared().is_none());

        let ticket = start_check(&mut state, "u1");
        state.complete_lookup(ticket, LookupOutcome::Panicked);
        assert_eq!(state.denial(), Some(DenialReason::Unexpected));
    }

    #[test]
    fn sign_out_event_discards_in_flight_result() {
        let mut state = GateState::new();
        let ticket = start_check(&mut state, "u1");

        state.observe_session(None);
        let completion =
            state.complete_lookup(ticket, LookupOutcome::Rows(vec![AllowListRow::new("u1")]));

        assert_eq!(completion, LookupCompletion::Stale);
        assert_eq!(state.phase(), Phase::SignedOut);
        assert!(state.user().is_none());
    }

    #[test]
    fn sign_in_as_same_identity_after_sign_out_does_not_revive_old_ticket() {
        let mut state = GateState::new();
        let stale = start_check(&mut state, "u1");
        state.observe_session(None);
        let fresh = start_check(&mut state, "u1");

        assert_eq!(
            state.complete_lookup(stale, LookupOutcome::Rows(Vec::new())),
            LookupCompletion::Stale
        );
        assert_eq!(state.phase(), Phase::Checking);

        state.complete_lookup(fresh, LookupOutcome::Rows(vec![AllowListRow::new("u1")]));
        assert_eq!(state.phase(), Phase::Admitted);
    }

    #[test]
    fn second_identity_supersedes_first() {
        let mut state = GateState::new();
        let first = start_check(&mut state, "a");
        let second = start_check(&mut state, "b");

        assert_eq!(
            state.complete_lookup(first, LookupOutcome::Rows(vec![AllowListRow::new("a")])),
            LookupCompletion::Stale
        );
        assert_eq!(state.in_flight(), Some(&IdentityId::from("b")));

        state.complete_lookup(second, LookupOutcome::Rows(vec![AllowListRow::new("b")]));
        assert_eq!(state.user().map(AuthUser::id), Some(&IdentityId::from("b")));
    }

    #[test]
    fn sign_out_event_resets_memo() {
        let mut state = GateState::new();
        let ticket = start_check(&mut state, "u2");
        state.complete_lookup(ticket, LookupOutcome::Rows(Vec::new()));

        state.observe_session(None);

        assert!(state.last_cleared().is_none());
        assert!(matches!(
            state.observe_session(Some(&session_for("u2"))),
            Some(Effect::Lookup(_))
        ));
    }

    #[test]
    fn denial_survives_its_own_sign_out_echo() {
        let mut state = GateState::new();
        let ticket = start_check(&mut state, "u2");
        state.complete_lookup(ticket, LookupOutcome::Rows(Vec::new()));

        state.observe_session(None);

        assert_eq!(state.denial(), Some(DenialReason::NotAllowListed));
        assert!(state.in_flight().is_none());
    }

    #[test]
    fn admitted_then_signed_out() {
        let mut state = GateState::new();
        let ticket = start_check(&mut state, "u1");
        state.complete_lookup(ticket, LookupOutcome::Rows(vec![AllowListRow::new("u1")]));

        state.observe_session(None);

        assert_eq!(state.phase(), Phase::SignedOut);
        assert!(state.user().is_none());
        assert!(state.last_cleared().is_none());
    }

    #[test]
    fn login_lifts_remembered_verdict() {
        let mut state = GateState::new();
        let ticket = start_check(&mut state, "u2");
        state.complete_lookup(ticket, LookupOutcome::Rows(Vec::new()));

        state.begin_login();

        assert_eq!(state.phase(), Phase::Checking);
        assert!(state.last_cleared().is_none());
        assert!(matches!(
            state.observe_session(Some(&session_for("u2"))),
            Some(Effect::Lookup(_))
        ));
    }

    #[test]
    fn login_failure_shows_notice() {
        let mut state = GateState::new();
        state.begin_login();
        state.login_failed();

        assert_eq!(state.phase(), Phase::SignedOut);
        assert_eq!(state.notice(), Some(Notice::LoginFailed));
        assert_eq!(state.message(), Some("Error encountered. Unable to log in to site."));
        assert!(!state.is_loading());
    }

    #[test]
    fn login_failure_does_not_interrupt_a_check() {
        let mut state = GateState::new();
        start_check(&mut state, "u1");
        state.login_failed();
        assert_eq!(state.phase(), Phase::Checking);
    }

    #[test]
    fn login_failure_leaves_admitted_user_alone() {
        let mut state = GateState::new();
        let ticket = start_check(&mut state, "u1");
        state.complete_lookup(ticket, LookupOutcome::Rows(vec![AllowListRow::new("u1")]));

        state.login_failed();

        assert_eq!(state.phase(), Phase::Admitted);
        assert_eq!(state.last_cleared(), Some(&IdentityId::from("u1")));
        assert_eq!(state.observe_session(Some(&session_for("u1"))), None);
        assert_eq!(state.phase(), Phase::Admitted);
    }

    #[test]
    fn login_failure_leaves_denial_alone() {
        let mut state = GateState::new();
        let ticket = start_check(&mut state, "u2");
        state.complete_lookup(ticket, LookupOutcome::Rows(Vec::new()));

        state.login_failed();

        assert_eq!(state.denial(), Some(DenialReason::NotAllowListed));
        assert!(state.notice().is_none());
    }

    #[test]
    fn login_failure_clears_both_identities() {
        let mut state = GateState::new();
        let ticket = start_check(&mut state, "u2");
        state.complete_lookup(ticket, LookupOutcome::Rows(Vec::new()));
        state.begin_login();

        state.login_failed();

        assert_eq!(state.notice(), Some(Notice::LoginFailed));
        assert!(state.in_flight().is_none());
        assert!(state.last_cleared().is_none());
    }

    #[test]
    fn login_is_refused_while_admitted() {
        let mut state = GateState::new();
        let ticket = start_check(&mut state, "u1");
        state.complete_lookup(ticket, LookupOutcome::Rows(vec![AllowListRow::new("u1")]));

        assert!(!state.begin_login());

        assert_eq!(state.phase(), Phase::Admitted);
        assert_eq!(state.last_cleared(), Some(&IdentityId::from("u1")));
    }

    #[test]
    fn abandoned_login_can_be_recovered() {
        let mut state = GateState::new();
        assert!(state.begin_login());
        assert!(state.awaiting_provider());

        state.sign_out();
        assert_eq!(state.phase(), Phase::SignedOut);
        assert!(!state.is_loading());

        assert!(state.begin_login());
        let ticket = start_check(&mut state, "u1");
        assert!(!state.awaiting_provider());
        state.complete_lookup(ticket, LookupOutcome::Rows(vec![AllowListRow::new("u1")]));
        assert_eq!(state.phase(), Phase::Admitted);
    }

    #[test]
    fn notice_survives_null_session() {
        let mut state = GateState::new();
        state.begin_login();
        state.login_failed();
        state.observe_session(None);
        assert_eq!(state.notice(), Some(Notice::LoginFailed));
    }

    #[test]
    fn explicit_sign_out_clears_everything() {
        let mut state = GateState::new();
        let ticket = start_check(&mut state, "u2");
        state.complete_lookup(ticket, LookupOutcome::Rows(Vec::new()));

        state.sign_out();

        assert_eq!(state.phase(), Phase::SignedOut);
        assert!(state.message().is_none());
        assert!(state.last_cleared().is_none());
    }

    #[test]
    fn serializes_with_phase_tag() {
        let mut state = GateState::new();
        let ticket = start_check(&mut state, "u2");
        state.complete_lookup(ticket, LookupOutcome::Rows(Vec::new()));

        let json = serde_json::to_value(&state).expect("serialize");
        assert_eq!(json["phase"], "denied");
        assert_eq!(json["reason"]["kind"], "not_allow_listed");
        assert_eq!(json["last_cleared"], "u2");
    }
}
