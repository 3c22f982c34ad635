//! Caller identity as forwarded by the authenticating gateway.

use std::str::FromStr;

use axum::http::HeaderMap;
use strum::{Display, EnumString};

use crate::error::ServerError;

pub static X_ACCOUNT_ID: &str = "x-account-id";
pub static X_TENANT_ID: &str = "x-tenant-id";
pub static X_ACCOUNT_ROLES: &str = "x-account-roles";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Role {
    Admin,
    Manager,
    SubManager,
}

/// Roles allowed to publish apps to the marketplace.
pub const PUBLISHER_ROLES: [Role; 3] = [Role::Admin, Role::Manager, Role::SubManager];

/// The authenticated account behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub account_id: String,
    /// The workspace the account is currently acting in.
    pub tenant_id: String,
    pub roles: Vec<Role>,
}

impl Caller {
    /// Build a caller from the gateway headers. Unknown role names are ignored.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, ServerError> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let account_id = header(X_ACCOUNT_ID)
            .ok_or_else(|| ServerError::Unauthorized(format!("missing {X_ACCOUNT_ID} header")))?;
        let tenant_id = header(X_TENANT_ID)
            .ok_or_else(|| ServerError::Unauthorized(format!("missing {X_TENANT_ID} header")))?;
        let roles = header(X_ACCOUNT_ROLES)
            .map(|raw| {
                raw.split(',')
                    .filter_map(|r| Role::from_str(r.trim()).ok())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            account_id: account_id.to_owned(),
            tenant_id: tenant_id.to_owned(),
            roles,
        })
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn require_any_role(&self, allowed: &[Role]) -> Result<(), ServerError> {
        if allowed.iter().any(|r| self.has_role(*r)) {
            Ok(())
        } else {
            Err(ServerError::Forbidden(format!(
                "account {} holds none of the required roles",
                self.account_id
            )))
        }
    }

    /// Administrators may act on anything; everyone else only on what they created.
    pub fn require_admin_or_owner(&self, owner_id: &str) -> Result<(), ServerError> {
        if self.has_role(Role::Admin) || self.account_id == owner_id {
            Ok(())
        } else {
            Err(ServerError::Forbidden(format!(
                "account {} is neither an admin nor the creator",
                self.account_id
            )))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn parses_identity_and_roles() {
        let caller = Caller::from_headers(&headers(&[
            ("x-account-id", "acc-1"),
            ("x-tenant-id", "tenant-1"),
            ("x-account-roles", "admin, SUB_MANAGER,owner"),
        ]))
        .unwrap();
        assert_eq!(caller.account_id, "acc-1");
        assert_eq!(caller.tenant_id, "tenant-1");
        assert_eq!(caller.roles, [Role::Admin, Role::SubManager]);
    }

    #[test]
    fn missing_tenant_is_unauthorized() {
        let err = Caller::from_headers(&headers(&[("x-account-id", "acc-1")])).unwrap_err();
        assert!(matches!(err, ServerError::Unauthorized(_)));
    }

    #[test]
    fn role_checks() {
        let caller = Caller {
            account_id: "acc".into(),
            tenant_id: "t".into(),
            roles: vec![Role::Manager],
        };
        assert!(caller.require_any_role(&PUBLISHER_ROLES).is_ok());
        assert!(caller.require_any_role(&[Role::Admin]).is_err());
        assert!(caller.require_admin_or_owner("acc").is_ok());
        assert!(matches!(
            caller.require_admin_or_owner("someone-else"),
            Err(ServerError::Forbidden(_))
        ));
    }
}
