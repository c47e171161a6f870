//! Role authorization policy.
//!
//! The single place where roles are compared. Every administrative action
//! goes through [`authorize`]; nothing here touches storage.
//!
//! Dominance: `superadmin` outranks `admin`, `om` and `user`; `admin`
//! outranks `om` and `user`; `om` and `user` outrank nobody. A role may only
//! act on roles it strictly outranks.

use std::fmt;

use thiserror::Error;

use crate::db::Role;

/// Administrative action on another account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAction {
    Delete,
    ChangeRole(Role),
    Disable,
    Enable,
}

impl AdminAction {
    pub fn verb(&self) -> &'static str {
        match self {
            AdminAction::Delete => "delete",
            AdminAction::ChangeRole(_) => "change the role of",
            AdminAction::Disable => "disable",
            AdminAction::Enable => "enable",
        }
    }
}

impl fmt::Display for AdminAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminAction::ChangeRole(role) => write!(f, "change role to {role}"),
            other => f.write_str(other.verb()),
        }
    }
}

/// Party to an authorization decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Party {
    pub id: i64,
    pub role: Role,
}

impl Party {
    pub fn new(id: i64, role: Role) -> Self {
        Self { id, role }
    }
}

/// Reasons an action is refused.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyError {
    #[error("you cannot perform this action on your own account")]
    SelfTarget,

    #[error("{actor} accounts cannot {} {target} accounts", .action.verb())]
    Forbidden {
        actor: Role,
        target: Role,
        action: AdminAction,
    },

    #[error("{actor} accounts cannot assign the {role} role")]
    ForbiddenAssignment { actor: Role, role: Role },

    #[error("{0} accounts cannot manage other accounts")]
    NotAdministrator(Role),

    #[error("account is already disabled")]
    AlreadyDisabled,

    #[error("account is already enabled")]
    AlreadyEnabled,
}

fn rank(role: Role) -> u8 {
    match role {
        Role::User | Role::Om => 0,
        Role::Admin => 1,
        Role::Superadmin => 2,
    }
}

/// Whether `actor` strictly outranks `target`.
pub fn dominates(actor: Role, target: Role) -> bool {
    rank(actor) > rank(target)
}

/// Whether the role may manage other accounts at all.
pub fn is_administrator(role: Role) -> bool {
    matches!(role, Role::Admin | Role::Superadmin)
}

/// Decide whether `actor_role` may apply `action` to an account holding `target_role`.
pub fn authorize(actor_role: Role, target_role: Role, action: AdminAction) -> Result<(), PolicyError> {
    if !is_administrator(actor_role) || !dominates(actor_role, target_role) {
        return Err(PolicyError::Forbidden {
            actor: actor_role,
            target: target_role,
            action,
        });
    }

    if let AdminAction::ChangeRole(new_role) = action {
        if !dominates(actor_role, new_role) {
            return Err(PolicyError::ForbiddenAssignment {
                actor: actor_role,
                role: new_role,
            });
        }
    }

    Ok(())
}

/// Like [`authorize`], but refuses any action on the actor's own account first.
pub fn authorize_on(actor: Party, target: Party, action: AdminAction) -> Result<(), PolicyError> {
    if actor.id == target.id {
        return Err(PolicyError::SelfTarget);
    }
    authorize(actor.role, target.role, action)
}

/// New `disabled` flag after a disable or enable.
///
/// Toggling to the current state is an error, not a silent success. Other
/// actions leave the flag unchanged.
pub fn next_disabled_state(currently_disabled: bool, action: AdminAction) -> Result<bool, PolicyError> {
    match (action, currently_disabled) {
        (AdminAction::Disable, true) => Err(PolicyError::AlreadyDisabled),
        (AdminAction::Disable, false) => Ok(true),
        (AdminAction::Enable, false) => Err(PolicyError::AlreadyEnabled),
        (AdminAction::Enable, true) => Ok(false),
        (_, current) => Ok(current),
    }
}

/// Refuse roles that may not browse or manage other accounts.
pub fn require_administrator(role: Role) -> Result<(), PolicyError> {
    if is_administrator(role) {
        Ok(())
    } else {
        Err(PolicyError::NotAdministrator(role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_actions() -> Vec<AdminAction> {
        let mut actions = vec![AdminAction::Delete, AdminAction::Disable, AdminAction::Enable];
        actions.extend(Role::ALL.iter().map(|r| AdminAction::ChangeRole(*r)));
        actions
    }

    /// Written out by hand, independent of `rank`.
    fn expected(actor: Role, target: Role, action: AdminAction) -> bool {
        use Role::*;
        let target_ok = match actor {
            Superadmin => matches!(target, User | Om | Admin),
            Admin => matches!(target, User | Om),
            Om | User => false,
        };
        let assignment_ok = match action {
            AdminAction::ChangeRole(new_role) => match actor {
                Superadmin => new_role != Superadmin,
                Admin => matches!(new_role, User | Om),
                Om | User => false,
            },
            _ => true,
        };
        target_ok && assignment_ok
    }

    #[test]
    fn test_full_cross_product() {
        for actor in Role::ALL {
            for target in Role::ALL {
                for action in all_actions() {
                    let decision = authorize(actor, target, action);
                    assert_eq!(
                        decision.is_ok(),
                        expected(actor, target, action),
                        "actor={actor} target={target} action={action}: {decision:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_self_target_denied_for_every_role() {
        for role in Role::ALL {
            for action in all_actions() {
                let me = Party::new(5, role);
                assert_eq!(authorize_on(me, me, action), Err(PolicyError::SelfTarget));
            }
        }
    }

    #[test]
    fn test_self_target_checked_before_role() {
        // Even a superadmin acting on a user-role copy of themselves
        let actor = Party::new(1, Role::Superadmin);
        let target = Party::new(1, Role::User);
        assert_eq!(
            authorize_on(actor, target, AdminAction::Delete),
            Err(PolicyError::SelfTarget)
        );
    }

    #[test]
    fn test_admin_cannot_disable_admin() {
        let result = authorize(Role::Admin, Role::Admin, AdminAction::Disable);
        assert!(matches!(result, Err(PolicyError::Forbidden { .. })));
    }

    #[test]
    fn test_superadmin_cannot_touch_superadmin() {
        for action in all_actions() {
            assert!(authorize(Role::Superadmin, Role::Superadmin, action).is_err());
        }
    }

    #[test]
    fn test_assignment_error_kind() {
        assert_eq!(
            authorize(Role::Admin, Role::User, AdminAction::ChangeRole(Role::Admin)),
            Err(PolicyError::ForbiddenAssignment {
                actor: Role::Admin,
                role: Role::Admin
            })
        );
        assert_eq!(
            authorize(
                Role::Superadmin,
                Role::Admin,
                AdminAction::ChangeRole(Role::Superadmin)
            ),
            Err(PolicyError::ForbiddenAssignment {
                actor: Role::Superadmin,
                role: Role::Superadmin
            })
        );
    }

    #[test]
    fn test_om_and_user_do_not_dominate_each_other() {
        assert!(!dominates(Role::Om, Role::User));
        assert!(!dominates(Role::User, Role::Om));
        assert!(authorize(Role::Om, Role::User, AdminAction::Disable).is_err());
    }

    #[test]
    fn test_dominance_is_strict() {
        for role in Role::ALL {
            assert!(!dominates(role, role));
        }
        assert!(dominates(Role::Superadmin, Role::Admin));
        assert!(dominates(Role::Admin, Role::Om));
        assert!(!dominates(Role::Admin, Role::Superadmin));
    }

    #[test]
    fn test_toggle_state_machine() {
        assert_eq!(next_disabled_state(false, AdminAction::Disable), Ok(true));
        assert_eq!(next_disabled_state(true, AdminAction::Enable), Ok(false));
        assert_eq!(
            next_disabled_state(true, AdminAction::Disable),
            Err(PolicyError::AlreadyDisabled)
        );
        assert_eq!(
            next_disabled_state(false, AdminAction::Enable),
            Err(PolicyError::AlreadyEnabled)
        );
        assert_eq!(next_disabled_state(true, AdminAction::Delete), Ok(true));
    }

    #[test]
    fn test_list_permission() {
        assert!(require_administrator(Role::Superadmin).is_ok());
        assert!(require_administrator(Role::Admin).is_ok());
        assert_eq!(
            require_administrator(Role::Om),
            Err(PolicyError::NotAdministrator(Role::Om))
        );
        assert!(require_administrator(Role::User).is_err());
    }

    #[test]
    fn test_error_messages() {
        let err = authorize(Role::Admin, Role::Admin, AdminAction::Delete).unwrap_err();
        assert_eq!(err.to_string(), "admin accounts cannot delete admin accounts");
        assert_eq!(
            PolicyError::SelfTarget.to_string(),
            "you cannot perform this action on your own account"
        );
    }
}
