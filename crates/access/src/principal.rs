use std::fmt;
use std::str::FromStr;

use crate::errors::AccessError;

/// Prefix of every native role realizing a logical schema role.
pub const ROLE_PREFIX: &str = "TS_ROLE_";

/// Prefix of every native role realizing a platform user.
pub const USER_PREFIX: &str = "TS_USER_";

/// One tier of the fixed per-schema access hierarchy, ordered from least to
/// most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    Viewer,
    Editor,
    Manager,
    Owner,
    Admin,
}

impl Role {
    /// Every tier, in ascending privilege order.
    pub const ALL: [Role; 5] = [
        Role::Viewer,
        Role::Editor,
        Role::Manager,
        Role::Owner,
        Role::Admin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Viewer => "VIEWER",
            Role::Editor => "EDITOR",
            Role::Manager => "MANAGER",
            Role::Owner => "OWNER",
            Role::Admin => "ADMIN",
        }
    }

    /// Whether members of this tier may create further native roles within
    /// their scope.
    pub fn grants_createrole(&self) -> bool {
        match self {
            Role::Viewer | Role::Editor | Role::Manager => false,
            Role::Owner | Role::Admin => true,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Role, AccessError> {
        match s {
            "VIEWER" => Ok(Role::Viewer),
            "EDITOR" => Ok(Role::Editor),
            "MANAGER" => Ok(Role::Manager),
            "OWNER" => Ok(Role::Owner),
            "ADMIN" => Ok(Role::Admin),
            other => Err(AccessError::UnknownTier(other.to_string())),
        }
    }
}

/// Prefix shared by all of a schema's role principals. Schema names are
/// case-normalized; this string is part of the persisted principal layout
/// and must never change for existing deployments.
pub fn schema_role_prefix(schema: &str) -> String {
    format!("{}{}_", ROLE_PREFIX, schema.to_uppercase())
}

/// Native principal name realizing `role` in `schema`.
pub fn role_principal(schema: &str, role: Role) -> String {
    format!("{}{}", schema_role_prefix(schema), role.as_str())
}

/// Exact inverse of [`role_principal`]: recover the tier from a native
/// principal name, if it belongs to `schema`.
pub fn decode_role_principal(schema: &str, principal: &str) -> Option<Role> {
    principal
        .strip_prefix(&schema_role_prefix(schema))
        .and_then(|tier| tier.parse().ok())
}

/// Native principal name realizing a platform user. Usernames keep their
/// case.
pub fn user_principal(user: &str) -> String {
    format!("{USER_PREFIX}{user}")
}

/// Exact inverse of [`user_principal`].
pub fn decode_user_principal(principal: &str) -> Option<&str> {
    principal.strip_prefix(USER_PREFIX)
}

/// Double-quote an identifier for statements that can't take bind
/// parameters (GRANT, REVOKE, CREATE ROLE).
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Turn a literal prefix into a LIKE pattern matching that prefix, escaping
/// the wildcard characters (`_` shows up in every principal prefix).
pub(crate) fn like_prefix(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
