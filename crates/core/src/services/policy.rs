//! Authorization policy for moderation transitions.
//!
//! Every function here is pure: it looks only at its arguments and returns a
//! [`Decision`]. The moderation workflow loads the parties (and the current
//! first `SUPER_ADMIN`) inside its transaction and consults these before any
//! write.

use warden_common::{AppError, AppResult};
use warden_db::entities::user::{UserRole, UserStatus};

/// Minimum length, in characters, of a moderation justification.
pub const MIN_REASON_CHARS: usize = 15;

/// Longest accepted numeric ban, in days.
pub const MAX_BAN_DAYS: u32 = 36_500;

/// A participant in a transition: the actor or the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Party<'a> {
    /// User id.
    pub id: &'a str,
    /// Role held at decision time.
    pub role: UserRole,
}

impl<'a> Party<'a> {
    /// Create a party.
    #[must_use]
    pub const fn new(id: &'a str, role: UserRole) -> Self {
        Self { id, role }
    }

    fn is(&self, id: Option<&str>) -> bool {
        id == Some(self.id)
    }
}

/// Outcome of a policy check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The transition may proceed.
    Allow,
    /// The actor lacks the right to perform the transition.
    Deny(&'static str),
    /// The request itself is malformed.
    Invalid(&'static str),
}

impl Decision {
    /// Whether the decision allows the transition.
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Convert into a result: denials are `Forbidden`, invalid requests are `Validation`.
    pub fn into_result(self) -> AppResult<()> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny(reason) => Err(AppError::Forbidden(reason.to_string())),
            Self::Invalid(reason) => Err(AppError::Validation(reason.to_string())),
        }
    }

    /// Chain another check, evaluated only when this one allows.
    #[must_use]
    pub fn and_then(self, next: impl FnOnce() -> Self) -> Self {
        match self {
            Self::Allow => next(),
            other => other,
        }
    }
}

/// Check a justification against [`MIN_REASON_CHARS`].
#[must_use]
pub fn check_reason(reason: &str) -> Decision {
    if reason.trim().chars().count() < MIN_REASON_CHARS {
        Decision::Invalid("Reason must be at least 15 characters long")
    } else {
        Decision::Allow
    }
}

/// Decide a role change.
///
/// `first_super_admin` is the id of the earliest-created `SUPER_ADMIN`, if any.
#[must_use]
pub fn decide_role_change(
    actor: Party<'_>,
    target: Party<'_>,
    first_super_admin: Option<&str>,
    requested: UserRole,
    reason: Option<&str>,
) -> Decision {
    if target.is(first_super_admin) && target.role == UserRole::SuperAdmin {
        return Decision::Deny("Cannot change first SUPER_ADMIN's role");
    }

    match actor.role {
        UserRole::Admin => {
            if !matches!(requested, UserRole::User | UserRole::Editor) {
                return Decision::Deny("Admin can only assign USER or EDITOR roles");
            }
            if target.role.is_admin() {
                return Decision::Deny("Cannot modify ADMIN or SUPER_ADMIN roles");
            }
            check_reason(reason.unwrap_or_default())
        }
        UserRole::SuperAdmin => {
            if requested == UserRole::SuperAdmin && !actor.is(first_super_admin) {
                return Decision::Deny("Only first SUPER_ADMIN can grant SUPER_ADMIN role");
            }
            Decision::Allow
        }
        UserRole::User | UserRole::Editor => Decision::Deny("Insufficient permissions"),
    }
}

/// Decide a ban. The reason and duration are checked separately.
#[must_use]
pub fn decide_ban(
    actor: Party<'_>,
    target: Party<'_>,
    first_super_admin: Option<&str>,
) -> Decision {
    if target.is(first_super_admin) {
        return Decision::Deny("Cannot ban first SUPER_ADMIN");
    }

    match (actor.role, target.role) {
        (UserRole::User | UserRole::Editor, _) => Decision::Deny("Insufficient permissions"),
        (UserRole::Admin, UserRole::SuperAdmin) => Decision::Deny("Admin cannot ban SUPER_ADMIN"),
        (UserRole::Admin | UserRole::SuperAdmin, _) => Decision::Allow,
    }
}

/// Decide an unban, given the current role of whoever issued the active ban.
///
/// An issuer that no longer exists is treated as a non-`SUPER_ADMIN`.
#[must_use]
pub fn decide_unban(actor: Party<'_>, issuer_role: Option<UserRole>) -> Decision {
    match (actor.role, issuer_role) {
        (UserRole::User | UserRole::Editor, _) => Decision::Deny("Insufficient permissions"),
        (UserRole::Admin, Some(UserRole::SuperAdmin)) => {
            Decision::Deny("Cannot unban user banned by SUPER_ADMIN")
        }
        (UserRole::Admin | UserRole::SuperAdmin, _) => Decision::Allow,
    }
}

/// Decide a status update.
///
/// Non-admins may only move themselves between the self-service statuses.
#[must_use]
pub fn decide_status_change(
    actor: Party<'_>,
    target: Party<'_>,
    requested: UserStatus,
) -> Decision {
    if !actor.role.is_admin() {
        if actor.id != target.id {
            return Decision::Deny("You can only update your own status");
        }
        return match requested {
            UserStatus::Banned => Decision::Deny("Only administrators can set banned status"),
            UserStatus::Active | UserStatus::Passive | UserStatus::Frozen => Decision::Allow,
        };
    }

    if actor.role == UserRole::Admin && target.role == UserRole::SuperAdmin {
        return Decision::Deny("Cannot modify SUPER_ADMIN status");
    }
    Decision::Allow
}

/// Parsed ban duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BanDuration {
    /// A fixed number of days.
    Days(u32),
    /// No end date.
    Permanent,
}

impl BanDuration {
    /// Parse `"permanent"` or a positive whole number of days.
    ///
    /// Malformed input is a validation error, never a policy denial.
    pub fn parse(raw: &str) -> AppResult<Self> {
        let raw = raw.trim();
        if raw == "permanent" {
            return Ok(Self::Permanent);
        }
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AppError::Validation(
                "Invalid duration format: must be a number or 'permanent'".to_string(),
            ));
        }
        match raw.parse::<u32>() {
            Ok(0) => Err(AppError::Validation(
                "Duration must be at least 1 day".to_string(),
            )),
            Ok(days) if days <= MAX_BAN_DAYS => Ok(Self::Days(days)),
            _ => Err(AppError::Validation(format!(
                "Duration must be at most {MAX_BAN_DAYS} days"
            ))),
        }
    }

    /// Number of days, `None` when permanent.
    #[must_use]
    pub const fn days(self) -> Option<u32> {
        match self {
            Self::Days(days) => Some(days),
            Self::Permanent => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIRST: &str = "first";

    fn party(id: &str, role: UserRole) -> Party<'_> {
        Party::new(id, role)
    }

    #[test]
    fn test_first_super_admin_role_is_immutable_for_everyone() {
        let target = party(FIRST, UserRole::SuperAdmin);
        for actor in [
            party(FIRST, UserRole::SuperAdmin),
            party("other", UserRole::SuperAdmin),
            party("admin", UserRole::Admin),
        ] {
            for requested in [UserRole::User, UserRole::Editor, UserRole::Admin] {
                assert_eq!(
                    decide_role_change(
                        actor,
                        target,
                        Some(FIRST),
                        requested,
                        Some("long enough justification")
                    ),
                    Decision::Deny("Cannot change first SUPER_ADMIN's role")
                );
            }
        }
    }

    #[test]
    fn test_admin_cannot_assign_admin() {
        let decision = decide_role_change(
            party("admin", UserRole::Admin),
            party("u", UserRole::User),
            Some(FIRST),
            UserRole::Admin,
            Some("long enough justification"),
        );
        assert_eq!(
            decision,
            Decision::Deny("Admin can only assign USER or EDITOR roles")
        );
    }

    #[test]
    fn test_admin_cannot_touch_admins() {
        for target_role in [UserRole::Admin, UserRole::SuperAdmin] {
            let decision = decide_role_change(
                party("admin", UserRole::Admin),
                party("t", target_role),
                Some(FIRST),
                UserRole::User,
                Some("long enough justification"),
            );
            assert_eq!(
                decision,
                Decision::Deny("Cannot modify ADMIN or SUPER_ADMIN roles")
            );
        }
    }

    #[test]
    fn test_admin_needs_reason() {
        let actor = party("admin", UserRole::Admin);
        let target = party("u", UserRole::User);

        let missing = decide_role_change(actor, target, Some(FIRST), UserRole::Editor, None);
        let short = decide_role_change(actor, target, Some(FIRST), UserRole::Editor, Some("too short"));
        let padded = decide_role_change(
            actor,
            target,
            Some(FIRST),
            UserRole::Editor,
            Some("   short       "),
        );
        let ok = decide_role_change(
            actor,
            target,
            Some(FIRST),
            UserRole::Editor,
            Some("helps moderate the board"),
        );

        assert!(matches!(missing, Decision::Invalid(_)));
        assert!(matches!(short, Decision::Invalid(_)));
        assert!(matches!(padded, Decision::Invalid(_)));
        assert!(ok.is_allowed());
    }

    #[test]
    fn test_admin_transition_matrix() {
        let roles = [
            UserRole::User,
            UserRole::Editor,
            UserRole::Admin,
            UserRole::SuperAdmin,
        ];
        for target_role in roles {
            for requested in roles {
                let allowed = decide_role_change(
                    party("admin", UserRole::Admin),
                    party("t", target_role),
                    Some(FIRST),
                    requested,
                    Some("long enough justification"),
                )
                .is_allowed();
                let expected = matches!(requested, UserRole::User | UserRole::Editor)
                    && !target_role.is_admin();
                assert_eq!(allowed, expected, "{target_role:?} -> {requested:?}");
            }
        }
    }

    #[test]
    fn test_only_first_super_admin_grants_super_admin() {
        let target = party("u", UserRole::User);
        let by_first = decide_role_change(
            party(FIRST, UserRole::SuperAdmin),
            target,
            Some(FIRST),
            UserRole::SuperAdmin,
            None,
        );
        let by_other = decide_role_change(
            party("other", UserRole::SuperAdmin),
            target,
            Some(FIRST),
            UserRole::SuperAdmin,
            None,
        );

        assert!(by_first.is_allowed());
        assert_eq!(
            by_other,
            Decision::Deny("Only first SUPER_ADMIN can grant SUPER_ADMIN role")
        );
    }

    #[test]
    fn test_super_admin_may_demote_other_super_admin_without_reason() {
        let decision = decide_role_change(
            party(FIRST, UserRole::SuperAdmin),
            party("other", UserRole::SuperAdmin),
            Some(FIRST),
            UserRole::Admin,
            None,
        );
        assert!(decision.is_allowed());
    }

    #[test]
    fn test_non_admin_actor_is_denied_role_change() {
        for role in [UserRole::User, UserRole::Editor] {
            let decision = decide_role_change(
                party("a", role),
                party("u", UserRole::User),
                Some(FIRST),
                UserRole::Editor,
                Some("long enough justification"),
            );
            assert_eq!(decision, Decision::Deny("Insufficient permissions"));
        }
    }

    #[test]
    fn test_ban_rules() {
        let first = party(FIRST, UserRole::SuperAdmin);
        let sa = party("sa", UserRole::SuperAdmin);
        let admin = party("admin", UserRole::Admin);
        let user = party("u", UserRole::User);

        assert_eq!(
            decide_ban(sa, first, Some(FIRST)),
            Decision::Deny("Cannot ban first SUPER_ADMIN")
        );
        assert_eq!(
            decide_ban(admin, sa, Some(FIRST)),
            Decision::Deny("Admin cannot ban SUPER_ADMIN")
        );
        assert!(decide_ban(first, sa, Some(FIRST)).is_allowed());
        assert!(decide_ban(admin, user, Some(FIRST)).is_allowed());
        assert!(decide_ban(admin, party("a2", UserRole::Admin), Some(FIRST)).is_allowed());
        assert_eq!(
            decide_ban(party("e", UserRole::Editor), user, Some(FIRST)),
            Decision::Deny("Insufficient permissions")
        );
    }

    #[test]
    fn test_unban_rules() {
        let admin = party("admin", UserRole::Admin);
        let sa = party("sa", UserRole::SuperAdmin);

        assert!(matches!(
            decide_unban(admin, Some(UserRole::SuperAdmin)),
            Decision::Deny(_)
        ));
        assert!(decide_unban(admin, Some(UserRole::Admin)).is_allowed());
        assert!(decide_unban(admin, None).is_allowed());
        assert!(decide_unban(sa, Some(UserRole::SuperAdmin)).is_allowed());
    }

    #[test]
    fn test_status_self_service() {
        let me = party("me", UserRole::User);
        for status in [UserStatus::Active, UserStatus::Passive, UserStatus::Frozen] {
            assert!(decide_status_change(me, me, status).is_allowed());
        }
        assert_eq!(
            decide_status_change(me, me, UserStatus::Banned),
            Decision::Deny("Only administrators can set banned status")
        );
    }

    #[test]
    fn test_status_non_admin_cannot_target_others() {
        let editor = party("ed", UserRole::Editor);
        let other = party("other", UserRole::User);
        assert_eq!(
            decide_status_change(editor, other, UserStatus::Passive),
            Decision::Deny("You can only update your own status")
        );
    }

    #[test]
    fn test_status_admin_and_super_admin_targets() {
        let admin = party("admin", UserRole::Admin);
        let sa = party("sa", UserRole::SuperAdmin);
        let user = party("u", UserRole::User);

        assert!(decide_status_change(admin, user, UserStatus::Banned).is_allowed());
        for status in [UserStatus::Active, UserStatus::Passive] {
            assert_eq!(
                decide_status_change(admin, sa, status),
                Decision::Deny("Cannot modify SUPER_ADMIN status")
            );
        }
        assert!(decide_status_change(sa, party("sa2", UserRole::SuperAdmin), UserStatus::Passive)
            .is_allowed());
    }

    #[test]
    fn test_decision_into_result() {
        assert!(Decision::Allow.into_result().is_ok());
        assert!(matches!(
            Decision::Deny("no").into_result(),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            Decision::Invalid("bad").into_result(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_and_then_short_circuits() {
        let denied = Decision::Deny("first").and_then(|| Decision::Invalid("second"));
        assert_eq!(denied, Decision::Deny("first"));
        assert_eq!(
            Decision::Allow.and_then(|| Decision::Invalid("second")),
            Decision::Invalid("second")
        );
    }

    #[test]
    fn test_parse_ban_duration() {
        assert_eq!(BanDuration::parse("permanent").ok(), Some(BanDuration::Permanent));
        assert_eq!(BanDuration::parse("7").ok(), Some(BanDuration::Days(7)));
        assert_eq!(BanDuration::parse(" 30 ").ok(), Some(BanDuration::Days(30)));

        for bad in ["0", "-3", "abc", "7d", "", "+5", "1.5", "36501", "99999999999"] {
            assert!(
                matches!(BanDuration::parse(bad), Err(AppError::Validation(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_check_reason_counts_characters() {
        assert!(check_reason("ünïcödé chars ok").is_allowed());
        assert!(!check_reason("fourteen chars").is_allowed());
        assert!(check_reason("fifteen chars!!").is_allowed());
    }
}
