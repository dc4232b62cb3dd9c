//! Role-based access control mapped onto native postgres roles.
//!
//! Every logical schema carries a fixed role hierarchy (viewer through
//! admin), each tier realized as one native role whose name deterministically
//! encodes schema and tier. Users are native roles too, under their own
//! prefix. Membership is never stored by the platform; it's recomputed from
//! the engine's own role membership catalog on demand.
//!
//! Read paths run on any client; every mutating sequence (add, remove,
//! provision, drop) takes the caller's open transaction so a failure rolls
//! back the whole change.

pub mod errors;

mod members;
mod principal;

pub use members::{
    add_members, drop_schema_roles, list_members, list_roles, provision_schema_roles,
    remove_members, role_of, Member,
};
pub use principal::{
    decode_role_principal, decode_user_principal, quote_ident, role_principal, schema_role_prefix,
    user_principal, Role, ROLE_PREFIX, USER_PREFIX,
};
