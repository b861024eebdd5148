//! Role visibility policy: which roles a requester may see or affect, plus the
//! action-specific role gates that are not purely about visibility.
//!
//! Everything here is a pure function of roles and actions. Node scope is
//! combined with these rules by [`AccessDecision`](crate::AccessDecision).

use std::collections::BTreeSet;

use crate::{Action, Role};

/// Requester role → target roles it may see.
const VISIBILITY: [(Role, &[Role]); 3] = [
    (Role::Admin, &[Role::Admin, Role::Manager, Role::Employee]),
    (Role::Manager, &[Role::Manager, Role::Employee]),
    (Role::Employee, &[Role::Employee]),
];

/// Whether `requester` may see (and therefore act on) records holding `target`.
pub fn can_see_role(requester: Role, target: Role) -> bool {
    VISIBILITY
        .iter()
        .find(|(role, _)| *role == requester)
        .is_some_and(|(_, visible)| visible.contains(&target))
}

/// Every role visible to `requester`.
pub fn filter_visible_roles(requester: Role) -> BTreeSet<Role> {
    Role::ALL
        .into_iter()
        .filter(|target| can_see_role(requester, *target))
        .collect()
}

/// Only admins and managers provision user records.
pub fn may_create_users(requester: Role) -> bool {
    matches!(requester, Role::Admin | Role::Manager)
}

/// Employees never see manager listings, whatever their scope.
pub fn may_view_managers(requester: Role) -> bool {
    matches!(requester, Role::Admin | Role::Manager)
}

/// Own password: always. Anyone else's: admin only.
pub fn may_change_password(requester: Role, is_self: bool) -> bool {
    is_self || requester.is_admin()
}

/// Role gate for a single-target action.
///
/// Listing actions always fail here; they go through [`listing_role_gate`].
pub fn target_role_gate(requester: Role, target: Role, action: Action) -> bool {
    match action {
        Action::View | Action::Update | Action::Delete | Action::ChangePassword => {
            can_see_role(requester, target)
        }
        Action::Create => may_create_users(requester) && can_see_role(requester, target),
        Action::ListUsers | Action::ViewEmployees | Action::ViewManagers => false,
    }
}

/// Role gate for a listing action, independent of which nodes are requested.
pub fn listing_role_gate(requester: Role, action: Action) -> bool {
    match action {
        Action::ListUsers | Action::ViewEmployees => true,
        Action::ViewManagers => may_view_managers(requester),
        _ => false,
    }
}

/// Roles a listing action returns before any caller-supplied filter.
pub fn listed_roles(requester: Role, action: Action) -> BTreeSet<Role> {
    let visible = filter_visible_roles(requester);
    match action {
        Action::ListUsers => visible,
        Action::ViewEmployees => visible.into_iter().filter(|r| *r == Role::Employee).collect(),
        Action::ViewManagers => visible.into_iter().filter(|r| *r == Role::Manager).collect(),
        _ => BTreeSet::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visibility_table() {
        assert_eq!(filter_visible_roles(Role::Admin), BTreeSet::from(Role::ALL));
        assert_eq!(
            filter_visible_roles(Role::Manager),
            BTreeSet::from([Role::Manager, Role::Employee])
        );
        assert_eq!(filter_visible_roles(Role::Employee), BTreeSet::from([Role::Employee]));
    }

    #[test]
    fn only_admin_and_manager_create() {
        assert!(target_role_gate(Role::Admin, Role::Manager, Action::Create));
        assert!(target_role_gate(Role::Manager, Role::Employee, Action::Create));
        assert!(!target_role_gate(Role::Manager, Role::Admin, Action::Create));
        assert!(!target_role_gate(Role::Employee, Role::Employee, Action::Create));
    }

    #[test]
    fn employees_never_list_managers() {
        assert!(!listing_role_gate(Role::Employee, Action::ViewManagers));
        assert!(listing_role_gate(Role::Employee, Action::ViewEmployees));
        assert!(listing_role_gate(Role::Manager, Action::ViewManagers));
        assert!(listed_roles(Role::Employee, Action::ViewManagers).is_empty());
    }

    #[test]
    fn listing_actions_fail_the_target_gate() {
        for role in Role::ALL {
            assert!(!target_role_gate(role, Role::Employee, Action::ListUsers));
            assert!(!listing_role_gate(role, Action::View));
        }
    }

    #[test]
    fn password_changes() {
        assert!(may_change_password(Role::Employee, true));
        assert!(!may_change_password(Role::Manager, false));
        assert!(may_change_password(Role::Admin, false));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn role() -> impl Strategy<Value = Role> {
            prop::sample::select(Role::ALL.to_vec())
        }

        proptest! {
            /// Property: visibility is monotonic in rank.
            #[test]
            fn higher_rank_sees_at_least_as_much(a in role(), b in role(), target in role()) {
                let (low, high) = if a <= b { (a, b) } else { (b, a) };
                if can_see_role(low, target) {
                    prop_assert!(can_see_role(high, target));
                }
            }

            /// Property: nobody sees a role ranked above their own.
            #[test]
            fn no_upward_visibility(requester in role(), target in role()) {
                prop_assert_eq!(can_see_role(requester, target), target <= requester);
            }
        }
    }
}
