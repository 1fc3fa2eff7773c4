//! Role-based authorization
//!
//! Identity is asserted by the gateway in front of the service through three
//! headers:
//! - `x-user-id`: the caller's user (employee) id
//! - `x-user-role`: one of `admin`, `hr`, `ca`, `employee`
//! - `x-company-id`: the tenant the request acts on
//!
//! A request without `x-user-id` and `x-user-role` is anonymous.

use crate::core::error::{AuthError, PayrollError};
use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const ROLE_HEADER: &str = "x-user-role";
pub const COMPANY_ID_HEADER: &str = "x-company-id";

/// Application roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Hr,
    Ca,
    Employee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Hr => "hr",
            Role::Ca => "ca",
            Role::Employee => "employee",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "hr" => Ok(Role::Hr),
            "ca" => Ok(Role::Ca),
            "employee" => Ok(Role::Employee),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Authorization context extracted from a request
#[derive(Debug, Clone, PartialEq)]
pub enum AuthContext {
    /// Authenticated user
    User {
        user_id: Uuid,
        company_id: Option<Uuid>,
        role: Role,
    },

    /// No identity headers
    Anonymous,
}

impl AuthContext {
    pub fn company_id(&self) -> Option<Uuid> {
        match self {
            AuthContext::User { company_id, .. } => *company_id,
            AuthContext::Anonymous => None,
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            AuthContext::User { user_id, .. } => Some(*user_id),
            AuthContext::Anonymous => None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            AuthContext::User { role, .. } => Some(*role),
            AuthContext::Anonymous => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Some(Role::Admin)
    }

    /// The tenant of the request, or `MissingCompany`
    pub fn require_company(&self) -> Result<Uuid, AuthError> {
        self.company_id().ok_or(AuthError::MissingCompany)
    }

    /// Check `policy`; anonymous callers get `Unauthenticated`, others `Forbidden`
    pub fn authorize(&self, policy: &AuthPolicy, action: &str) -> Result<(), AuthError> {
        if policy.check(self) {
            return Ok(());
        }
        match self {
            AuthContext::Anonymous => Err(AuthError::Unauthenticated),
            AuthContext::User { role, .. } => Err(AuthError::Forbidden {
                message: format!("role '{}' cannot {}", role, action),
            }),
        }
    }
}

/// Authorization policy for an operation
#[derive(Debug, Clone, PartialEq)]
pub enum AuthPolicy {
    /// Public access (no auth required)
    Public,

    /// Any authenticated user
    Authenticated,

    /// User must have one of these roles
    HasRole(Vec<Role>),

    /// Admin only
    AdminOnly,

    /// Combination of policies (AND)
    And(Vec<AuthPolicy>),

    /// Combination of policies (OR)
    Or(Vec<AuthPolicy>),
}

impl AuthPolicy {
    /// Check if auth context satisfies this policy
    pub fn check(&self, context: &AuthContext) -> bool {
        match self {
            AuthPolicy::Public => true,

            AuthPolicy::Authenticated => !matches!(context, AuthContext::Anonymous),

            AuthPolicy::HasRole(roles) => context.role().is_some_and(|r| roles.contains(&r)),

            AuthPolicy::AdminOnly => context.is_admin(),

            AuthPolicy::And(policies) => policies.iter().all(|p| p.check(context)),

            AuthPolicy::Or(policies) => policies.iter().any(|p| p.check(context)),
        }
    }

    /// Shorthand for `HasRole`
    pub fn roles(roles: &[Role]) -> Self {
        AuthPolicy::HasRole(roles.to_vec())
    }

    /// Parse policy from string (for YAML config)
    ///
    /// Accepts `public`, `authenticated`, `admin_only`, `role:<role>` and
    /// `roles:<role>,<role>`. Unknown strings fall back to `Authenticated`.
    pub fn parse_policy(s: &str) -> Self {
        let s = s.trim();
        match s {
            "public" => AuthPolicy::Public,
            "authenticated" => AuthPolicy::Authenticated,
            "admin_only" => AuthPolicy::AdminOnly,
            _ => {
                let list = s
                    .strip_prefix("roles:")
                    .or_else(|| s.strip_prefix("role:"));
                match list {
                    Some(list) => AuthPolicy::HasRole(
                        list.split(',').filter_map(|r| r.parse().ok()).collect(),
                    ),
                    None => AuthPolicy::Authenticated,
                }
            }
        }
    }
}

/// Reads identity from the gateway headers
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderAuthProvider;

impl HeaderAuthProvider {
    fn header_uuid(headers: &HeaderMap, name: &str) -> Result<Option<Uuid>, AuthError> {
        let Some(value) = headers.get(name) else {
            return Ok(None);
        };
        let text = value.to_str().map_err(|e| AuthError::InvalidHeader {
            header: name.to_string(),
            message: e.to_string(),
        })?;
        Uuid::parse_str(text.trim())
            .map(Some)
            .map_err(|e| AuthError::InvalidHeader {
                header: name.to_string(),
                message: e.to_string(),
            })
    }

    /// Extract auth context from request headers
    pub fn extract_context(&self, headers: &HeaderMap) -> Result<AuthContext, AuthError> {
        let user_id = Self::header_uuid(headers, USER_ID_HEADER)?;
        let company_id = Self::header_uuid(headers, COMPANY_ID_HEADER)?;

        let role = match headers.get(ROLE_HEADER) {
            Some(value) => {
                let text = value.to_str().map_err(|e| AuthError::InvalidHeader {
                    header: ROLE_HEADER.to_string(),
                    message: e.to_string(),
                })?;
                Some(text.parse::<Role>().map_err(|message| AuthError::InvalidHeader {
                    header: ROLE_HEADER.to_string(),
                    message,
                })?)
            }
            None => None,
        };

        Ok(match (user_id, role) {
            (Some(user_id), Some(role)) => AuthContext::User {
                user_id,
                company_id,
                role,
            },
            _ => AuthContext::Anonymous,
        })
    }
}

impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = PayrollError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(HeaderAuthProvider.extract_context(&parts.headers)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn user(role: Role) -> AuthContext {
        AuthContext::User {
            user_id: Uuid::new_v4(),
            company_id: Some(Uuid::new_v4()),
            role,
        }
    }

    #[test]
    fn test_policy_check() {
        assert!(AuthPolicy::Authenticated.check(&user(Role::Employee)));
        assert!(AuthPolicy::roles(&[Role::Admin, Role::Hr]).check(&user(Role::Hr)));
        assert!(!AuthPolicy::roles(&[Role::Admin, Role::Hr]).check(&user(Role::Ca)));
        assert!(AuthPolicy::Public.check(&AuthContext::Anonymous));
        assert!(!AuthPolicy::Authenticated.check(&AuthContext::Anonymous));
    }

    #[test]
    fn test_policy_combinators() {
        let either = AuthPolicy::Or(vec![AuthPolicy::AdminOnly, AuthPolicy::roles(&[Role::Ca])]);
        assert!(either.check(&user(Role::Ca)));
        assert!(!either.check(&user(Role::Hr)));

        let both = AuthPolicy::And(vec![AuthPolicy::Authenticated, AuthPolicy::AdminOnly]);
        assert!(both.check(&user(Role::Admin)));
        assert!(!both.check(&user(Role::Employee)));
    }

    #[test]
    fn test_parse_policy() {
        assert_eq!(AuthPolicy::parse_policy("public"), AuthPolicy::Public);
        assert_eq!(AuthPolicy::parse_policy("admin_only"), AuthPolicy::AdminOnly);
        assert_eq!(
            AuthPolicy::parse_policy("roles:admin, hr"),
            AuthPolicy::HasRole(vec![Role::Admin, Role::Hr])
        );
        assert_eq!(
            AuthPolicy::parse_policy("role:ca"),
            AuthPolicy::HasRole(vec![Role::Ca])
        );
        assert_eq!(
            AuthPolicy::parse_policy("something_unknown"),
            AuthPolicy::Authenticated
        );
    }

    #[test]
    fn test_authorize_errors() {
        let policy = AuthPolicy::AdminOnly;
        assert!(matches!(
            AuthContext::Anonymous.authorize(&policy, "create companies"),
            Err(AuthError::Unauthenticated)
        ));
        match user(Role::Hr).authorize(&policy, "create companies") {
            Err(AuthError::Forbidden { message }) => {
                assert_eq!(message, "role 'hr' cannot create companies")
            }
            other => panic!("expected Forbidden, got {:?}", other),
        }
    }

    #[test]
    fn test_require_company() {
        assert!(user(Role::Hr).require_company().is_ok());
        let no_company = AuthContext::User {
            user_id: Uuid::new_v4(),
            company_id: None,
            role: Role::Admin,
        };
        assert!(matches!(
            no_company.require_company(),
            Err(AuthError::MissingCompany)
        ));
    }

    #[test]
    fn test_header_extraction() {
        let user_id = Uuid::new_v4();
        let company_id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_str(&user_id.to_string()).unwrap());
        headers.insert(COMPANY_ID_HEADER, HeaderValue::from_str(&company_id.to_string()).unwrap());
        headers.insert(ROLE_HEADER, HeaderValue::from_static("HR"));

        let ctx = HeaderAuthProvider.extract_context(&headers).unwrap();
        assert_eq!(
            ctx,
            AuthContext::User {
                user_id,
                company_id: Some(company_id),
                role: Role::Hr
            }
        );
    }

    #[test]
    fn test_missing_headers_are_anonymous() {
        let ctx = HeaderAuthProvider.extract_context(&HeaderMap::new()).unwrap();
        assert_eq!(ctx, AuthContext::Anonymous);
    }

    #[test]
    fn test_bad_role_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_str(&Uuid::new_v4().to_string()).unwrap());
        headers.insert(ROLE_HEADER, HeaderValue::from_static("superuser"));
        assert!(matches!(
            HeaderAuthProvider.extract_context(&headers),
            Err(AuthError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn test_bad_uuid_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(COMPANY_ID_HEADER, HeaderValue::from_static("not-a-uuid"));
        assert!(HeaderAuthProvider.extract_context(&headers).is_err());
    }
}
