// crates/care-access-core/tests/proptest_filter.rs
// ============================================================================
// Module: Row Filter Property-Based Tests
// Description: Property tests for filter and resolver invariants.
// Purpose: Check filtering laws across generated identities and rows.
// ============================================================================

//! Property-based tests for row filtering and scope resolution.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

use std::collections::BTreeSet;
use std::sync::Arc;

use care_access_core::AccessScope;
use care_access_core::AnalyticsRow;
use care_access_core::GrantScope;
use care_access_core::NoopFilterAuditSink;
use care_access_core::Organization;
use care_access_core::Permission;
use care_access_core::ProviderId;
use care_access_core::ResourceName;
use care_access_core::RowFilterEngine;
use care_access_core::ScopeResolver;
use care_access_core::SecurityContextBuilder;
use care_access_core::UserIdentity;
use proptest::prelude::*;

use crate::common::organization;
use crate::common::row;

fn engine() -> RowFilterEngine {
    RowFilterEngine::new(ResourceName::analytics(), Arc::new(NoopFilterAuditSink))
}

fn grant_scope_strategy() -> impl Strategy<Value = GrantScope> {
    prop_oneof![Just(GrantScope::Own), Just(GrantScope::Organization), Just(GrantScope::All)]
}

fn permission_strategy() -> impl Strategy<Value = Permission> {
    (prop_oneof![Just("analytics"), Just("billing")], prop_oneof![Just("read"), Just("write")], grant_scope_strategy())
        .prop_map(|(resource, action, scope)| {
            Permission::new(ResourceName::parse(resource).unwrap(), action, scope).unwrap()
        })
}

fn organizations_strategy() -> impl Strategy<Value = Vec<Organization>> {
    prop::collection::vec(prop::collection::vec(0_i64 .. 8, 0 .. 4), 0 .. 3).prop_map(|orgs| {
        orgs.iter()
            .enumerate()
            .map(|(index, practices)| organization(&format!("org-{index}"), practices))
            .collect()
    })
}

fn identity_strategy() -> impl Strategy<Value = UserIdentity> {
    (
        any::<bool>(),
        prop::option::of(0_i64 .. 4),
        prop::collection::btree_set(permission_strategy(), 0 .. 4),
        organizations_strategy(),
    )
        .prop_map(|(super_admin, provider, permissions, organizations)| {
            let mut identity = UserIdentity::new("prop-user");
            identity.is_super_admin = super_admin;
            identity.provider_id = provider.map(ProviderId::new);
            identity.granted_permissions = permissions;
            identity.accessible_organizations = organizations;
            identity
        })
}

fn rows_strategy() -> impl Strategy<Value = Vec<AnalyticsRow>> {
    prop::collection::vec((prop::option::of(0_i64 .. 8), prop::option::of(0_i64 .. 4)), 0 .. 16)
        .prop_map(|keys| keys.into_iter().map(|(practice, provider)| row(practice, provider)).collect())
}

proptest! {
    #[test]
    fn filtering_is_idempotent(identity in identity_strategy(), rows in rows_strategy()) {
        let ctx = SecurityContextBuilder::default().build(&identity).unwrap();
        let once = engine().filter(&rows, &ctx).unwrap();
        let twice = engine().filter(&once, &ctx).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn filtering_returns_an_ordered_subsequence(identity in identity_strategy(), rows in rows_strategy()) {
        let ctx = SecurityContextBuilder::default().build(&identity).unwrap();
        let out = engine().filter_refs(&rows, &ctx).unwrap();
        prop_assert!(out.len() <= rows.len());
        let mut cursor = 0;
        for kept in out {
            let position = rows[cursor ..].iter().position(|candidate| std::ptr::eq(candidate, kept));
            prop_assert!(position.is_some());
            cursor += position.unwrap() + 1;
        }
    }

    #[test]
    fn restricted_scope_with_empty_practices_returns_nothing(
        scope in prop_oneof![Just(GrantScope::Organization), Just(GrantScope::Own)],
        provider in prop::option::of(0_i64 .. 4),
        rows in rows_strategy().prop_filter("non-empty", |rows| !rows.is_empty()),
    ) {
        let mut identity = UserIdentity::new("prop-user");
        identity.provider_id = provider.map(ProviderId::new);
        identity.granted_permissions.insert(Permission::read(ResourceName::analytics(), scope));
        identity.accessible_organizations = vec![organization("empty", &[])];
        let ctx = SecurityContextBuilder::default().build(&identity).unwrap();
        prop_assert!(ctx.accessible_practice_ids().is_empty());
        prop_assert!(engine().filter(&rows, &ctx).unwrap().is_empty());
    }

    #[test]
    fn all_scope_passes_rows_through(
        organizations in organizations_strategy(),
        rows in rows_strategy(),
    ) {
        let mut identity = UserIdentity::new("prop-user");
        identity.granted_permissions.insert(Permission::read(ResourceName::analytics(), GrantScope::All));
        identity.accessible_organizations = organizations;
        let ctx = SecurityContextBuilder::default().build(&identity).unwrap();
        prop_assert_eq!(ctx.permission_scope(), AccessScope::All);
        prop_assert_eq!(engine().filter(&rows, &ctx).unwrap(), rows);
    }

    #[test]
    fn super_admin_always_resolves_to_all(identity in identity_strategy()) {
        let mut identity = identity;
        identity.is_super_admin = true;
        prop_assert_eq!(ScopeResolver::default().resolve(&identity), AccessScope::All);
    }

    #[test]
    fn retained_rows_satisfy_access_sets(identity in identity_strategy(), rows in rows_strategy()) {
        let ctx = SecurityContextBuilder::default().build(&identity).unwrap();
        let out = engine().filter(&rows, &ctx).unwrap();
        if ctx.permission_scope() != AccessScope::All {
            let providers: &BTreeSet<ProviderId> = ctx.accessible_provider_ids();
            for kept in &out {
                let practice = kept.practice_id.unwrap();
                prop_assert!(ctx.accessible_practice_ids().contains(&practice));
                if ctx.permission_scope() == AccessScope::Own {
                    prop_assert!(kept.provider_id.is_some_and(|id| providers.contains(&id)));
                }
            }
        }
    }
}
