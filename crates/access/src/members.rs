use tokio_postgres::{GenericClient, Transaction};
use tracing::debug;

use crate::errors::{AccessError, Result};
use crate::principal::{
    decode_role_principal, decode_user_principal, like_prefix, quote_ident, role_principal,
    schema_role_prefix, user_principal, Role, USER_PREFIX,
};

/// A user holding one logical role in one schema. Derived from the engine's
/// role membership catalog, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub user: String,
    pub role: Role,
}

impl Member {
    pub fn new(user: impl Into<String>, role: Role) -> Member {
        Member {
            user: user.into(),
            role,
        }
    }
}

/// Roles declared for a schema: the role principals existing under the
/// schema's prefix, in ascending privilege order.
pub async fn list_roles<C: GenericClient>(client: &C, schema: &str) -> Result<Vec<Role>> {
    let rows = client
        .query(
            "SELECT rolname FROM pg_catalog.pg_roles WHERE rolname LIKE $1",
            &[&like_prefix(&schema_role_prefix(schema))],
        )
        .await
        .map_err(AccessError::read)?;

    let mut roles = Vec::with_capacity(rows.len());
    for row in rows {
        let name: String = row.try_get(0).map_err(AccessError::read)?;
        match decode_role_principal(schema, &name) {
            Some(role) => roles.push(role),
            None => debug!(%name, "skipping principal with unrecognized tier"),
        }
    }
    roles.sort();
    Ok(roles)
}

/// Current members of a schema, recomputed from native role memberships.
pub async fn list_members<C: GenericClient>(client: &C, schema: &str) -> Result<Vec<Member>> {
    let rows = client
        .query(
            "SELECT m.rolname AS member, r.rolname AS role \
             FROM pg_catalog.pg_auth_members am \
             JOIN pg_catalog.pg_roles m ON m.oid = am.member \
             JOIN pg_catalog.pg_roles r ON r.oid = am.roleid \
             WHERE r.rolname LIKE $1 AND m.rolname LIKE $2",
            &[
                &like_prefix(&schema_role_prefix(schema)),
                &like_prefix(USER_PREFIX),
            ],
        )
        .await
        .map_err(AccessError::read)?;

    let mut members = Vec::with_capacity(rows.len());
    for row in rows {
        let member: String = row.try_get("member").map_err(AccessError::read)?;
        let role: String = row.try_get("role").map_err(AccessError::read)?;
        if let (Some(user), Some(role)) = (
            decode_user_principal(&member),
            decode_role_principal(schema, &role),
        ) {
            members.push(Member::new(user, role));
        }
    }
    Ok(members)
}

/// The single role `user` holds in `schema`, if any.
pub async fn role_of<C: GenericClient>(
    client: &C,
    schema: &str,
    user: &str,
) -> Result<Option<Role>> {
    let user = user.trim();
    Ok(list_members(client, schema)
        .await?
        .into_iter()
        .find(|m| m.user == user)
        .map(|m| m.role))
}

/// Grant each requested member its role, inside the caller's transaction.
///
/// The whole call validates against the schema's declared roles before any
/// statement executes; a single unknown role fails everything. Granting a
/// role revokes whatever other role the user held in this schema first, so
/// a user holds at most one role per schema at any time. Re-adding a held
/// role is a no-op that leaves exactly one membership.
pub async fn add_members(tx: &Transaction<'_>, schema: &str, members: &[Member]) -> Result<()> {
    let declared = list_roles(tx, schema).await?;
    let current = list_members(tx, schema).await?;
    let existing_users = existing_user_principals(tx, members).await?;

    let statements = plan_add_members(schema, &declared, &current, &existing_users, members)?;
    apply(tx, &statements).await
}

/// Revoke the membership of every listed user, inside the caller's
/// transaction. Users without a membership are silently skipped.
pub async fn remove_members(tx: &Transaction<'_>, schema: &str, members: &[Member]) -> Result<()> {
    let current = list_members(tx, schema).await?;
    let statements = plan_remove_members(schema, &current, members);
    apply(tx, &statements).await
}

/// Create the full role hierarchy for a schema: one principal per tier,
/// each granted to the next so higher tiers inherit lower ones. Idempotent.
pub async fn provision_schema_roles(tx: &Transaction<'_>, schema: &str) -> Result<()> {
    let declared = list_roles(tx, schema).await?;
    let statements = plan_provision_roles(schema, &declared);
    apply(tx, &statements).await
}

/// Drop every role principal of a schema, highest tier first.
pub async fn drop_schema_roles(tx: &Transaction<'_>, schema: &str) -> Result<()> {
    let statements = plan_drop_roles(schema);
    apply(tx, &statements).await
}

/// Which of the requested members already have a user principal.
async fn existing_user_principals(
    tx: &Transaction<'_>,
    members: &[Member],
) -> Result<Vec<String>> {
    let principals: Vec<String> = members.iter().map(|m| user_principal(&m.user)).collect();
    let rows = tx
        .query(
            "SELECT rolname FROM pg_catalog.pg_roles WHERE rolname = ANY($1)",
            &[&principals],
        )
        .await
        .map_err(AccessError::read)?;

    let mut users = Vec::with_capacity(rows.len());
    for row in rows {
        let name: String = row.try_get(0).map_err(AccessError::read)?;
        if let Some(user) = decode_user_principal(&name) {
            users.push(user.to_string());
        }
    }
    Ok(users)
}

async fn apply(tx: &Transaction<'_>, statements: &[String]) -> Result<()> {
    for statement in statements {
        debug!(%statement, "applying permission change");
        tx.execute(statement.as_str(), &[])
            .await
            .map_err(AccessError::mutation)?;
    }
    Ok(())
}

/// Ordered statements realizing an add-members request against the given
/// current state. Pure; validation precedes the first statement.
fn plan_add_members(
    schema: &str,
    declared: &[Role],
    current: &[Member],
    existing_users: &[String],
    members: &[Member],
) -> Result<Vec<String>> {
    for member in members {
        if !declared.contains(&member.role) {
            return Err(AccessError::UnknownRole {
                role: member.role.to_string(),
                schema: schema.to_string(),
                known: declared.iter().map(|r| r.to_string()).collect(),
            });
        }
    }

    let mut statements = Vec::new();
    for member in members {
        let user = quote_ident(&user_principal(&member.user));

        if !existing_users.iter().any(|u| u == &member.user) {
            statements.push(format!("CREATE ROLE {user} NOLOGIN"));
        }

        // The top tiers may manage principals of their own.
        if member.role.grants_createrole() {
            statements.push(format!("ALTER ROLE {user} CREATEROLE"));
        }

        // One active role per user per schema: drop whatever else is held
        // before granting.
        for held in current
            .iter()
            .filter(|c| c.user == member.user && c.role != member.role)
        {
            statements.push(format!(
                "REVOKE {} FROM {user}",
                quote_ident(&role_principal(schema, held.role)),
            ));
        }

        statements.push(format!(
            "GRANT {} TO {user}",
            quote_ident(&role_principal(schema, member.role)),
        ));
    }
    Ok(statements)
}

fn plan_remove_members(schema: &str, current: &[Member], members: &[Member]) -> Vec<String> {
    current
        .iter()
        .filter(|held| members.iter().any(|m| m.user == held.user))
        .map(|held| {
            format!(
                "REVOKE {} FROM {}",
                quote_ident(&role_principal(schema, held.role)),
                quote_ident(&user_principal(&held.user)),
            )
        })
        .collect()
}

fn plan_provision_roles(schema: &str, declared: &[Role]) -> Vec<String> {
    let mut statements = Vec::new();
    for role in Role::ALL {
        if !declared.contains(&role) {
            statements.push(format!(
                "CREATE ROLE {} NOLOGIN",
                quote_ident(&role_principal(schema, role)),
            ));
        }
    }
    for pair in Role::ALL.windows(2) {
        statements.push(format!(
            "GRANT {} TO {}",
            quote_ident(&role_principal(schema, pair[0])),
            quote_ident(&role_principal(schema, pair[1])),
        ));
    }
    statements
}

fn plan_drop_roles(schema: &str) -> Vec<String> {
    Role::ALL
        .iter()
        .rev()
        .map(|role| {
            format!(
                "DROP ROLE IF EXISTS {}",
                quote_ident(&role_principal(schema, *role)),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_role_fails_whole_plan_before_any_statement() {
        // Study only declares the two lowest tiers.
        let declared = [Role::Viewer, Role::Editor];
        let err = plan_add_members(
            "Study",
            &declared,
            &[],
            &[],
            &[Member::new("alice", Role::Manager)],
        )
        .unwrap_err();

        match err {
            AccessError::UnknownRole { role, schema, known } => {
                assert_eq!(role, "MANAGER");
                assert_eq!(schema, "Study");
                assert_eq!(known, vec!["VIEWER", "EDITOR"]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn one_bad_member_poisons_the_batch() {
        let declared = [Role::Viewer, Role::Editor];
        // bob's entry is fine; alice's is not. Nothing may be planned.
        let result = plan_add_members(
            "Study",
            &declared,
            &[],
            &[],
            &[
                Member::new("bob", Role::Viewer),
                Member::new("alice", Role::Manager),
            ],
        );
        assert!(result.is_err());
    }

    #[test]
    fn new_member_creates_principal_then_grants() {
        let statements = plan_add_members(
            "Study",
            &Role::ALL,
            &[],
            &[],
            &[Member::new("bob", Role::Editor)],
        )
        .unwrap();

        assert_eq!(
            statements,
            vec![
                "CREATE ROLE \"TS_USER_bob\" NOLOGIN".to_string(),
                "GRANT \"TS_ROLE_STUDY_EDITOR\" TO \"TS_USER_bob\"".to_string(),
            ]
        );
    }

    #[test]
    fn existing_user_is_not_recreated() {
        let statements = plan_add_members(
            "Study",
            &Role::ALL,
            &[],
            &["bob".to_string()],
            &[Member::new("bob", Role::Editor)],
        )
        .unwrap();
        assert!(statements.iter().all(|s| !s.starts_with("CREATE ROLE")));
    }

    #[test]
    fn role_change_revokes_old_before_granting_new() {
        let statements = plan_add_members(
            "Study",
            &Role::ALL,
            &[Member::new("bob", Role::Viewer)],
            &["bob".to_string()],
            &[Member::new("bob", Role::Editor)],
        )
        .unwrap();

        assert_eq!(
            statements,
            vec![
                "REVOKE \"TS_ROLE_STUDY_VIEWER\" FROM \"TS_USER_bob\"".to_string(),
                "GRANT \"TS_ROLE_STUDY_EDITOR\" TO \"TS_USER_bob\"".to_string(),
            ]
        );
    }

    #[test]
    fn readding_held_role_grants_without_revoke() {
        let statements = plan_add_members(
            "Study",
            &Role::ALL,
            &[Member::new("bob", Role::Editor)],
            &["bob".to_string()],
            &[Member::new("bob", Role::Editor)],
        )
        .unwrap();

        // No revoke of the held role; the duplicate grant is a no-op on the
        // engine side, leaving exactly one membership.
        assert_eq!(
            statements,
            vec!["GRANT \"TS_ROLE_STUDY_EDITOR\" TO \"TS_USER_bob\"".to_string()]
        );
    }

    #[test]
    fn owner_tier_gets_createrole() {
        let statements = plan_add_members(
            "Study",
            &Role::ALL,
            &[],
            &["eve".to_string()],
            &[Member::new("eve", Role::Owner)],
        )
        .unwrap();

        assert_eq!(statements[0], "ALTER ROLE \"TS_USER_eve\" CREATEROLE");
    }

    #[test]
    fn remove_absent_user_plans_nothing() {
        let statements = plan_remove_members(
            "Study",
            &[Member::new("bob", Role::Editor)],
            &[Member::new("ghost", Role::Viewer)],
        );
        assert!(statements.is_empty());
    }

    #[test]
    fn remove_revokes_whatever_role_is_held() {
        // The requested role is irrelevant; removal matches on username.
        let statements = plan_remove_members(
            "Study",
            &[Member::new("bob", Role::Editor)],
            &[Member::new("bob", Role::Viewer)],
        );
        assert_eq!(
            statements,
            vec!["REVOKE \"TS_ROLE_STUDY_EDITOR\" FROM \"TS_USER_bob\"".to_string()]
        );
    }

    #[test]
    fn provision_creates_missing_tiers_and_chains_grants() {
        let statements = plan_provision_roles("Study", &[Role::Viewer]);

        // Four creates (viewer exists), then the four-link grant chain.
        let creates: Vec<_> = statements
            .iter()
            .filter(|s| s.starts_with("CREATE ROLE"))
            .collect();
        assert_eq!(creates.len(), 4);
        assert!(statements.contains(
            &"GRANT \"TS_ROLE_STUDY_VIEWER\" TO \"TS_ROLE_STUDY_EDITOR\"".to_string()
        ));
        assert!(statements.contains(
            &"GRANT \"TS_ROLE_STUDY_OWNER\" TO \"TS_ROLE_STUDY_ADMIN\"".to_string()
        ));
    }

    #[test]
    fn drop_removes_highest_tier_first() {
        let statements = plan_drop_roles("Study");
        assert_eq!(statements.len(), 5);
        assert_eq!(
            statements[0],
            "DROP ROLE IF EXISTS \"TS_ROLE_STUDY_ADMIN\""
        );
        assert_eq!(
            statements[4],
            "DROP ROLE IF EXISTS \"TS_ROLE_STUDY_VIEWER\""
        );
    }
}
