//! Request identity supplied by the upstream auth proxy.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use dsefs_messaging::{CurrentUser, UserRole};
use std::convert::Infallible;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_PRENOM_HEADER: &str = "x-user-prenom";
pub const USER_NOM_HEADER: &str = "x-user-nom";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// The caller, or `None` for an anonymous request.
#[derive(Debug, Clone)]
pub struct RequestUser(pub Option<CurrentUser>);

impl RequestUser {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .unwrap_or_default()
                .to_string()
        };

        let id = header(USER_ID_HEADER);
        if id.is_empty() {
            return Self(None);
        }
        let role = match header(USER_ROLE_HEADER).to_ascii_lowercase().as_str() {
            "admin" => UserRole::Admin,
            "editeur" => UserRole::Editeur,
            _ => UserRole::Lecteur,
        };
        Self(Some(CurrentUser::new(
            id,
            header(USER_PRENOM_HEADER),
            header(USER_NOM_HEADER),
            role,
        )))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn missing_id_is_anonymous() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_PRENOM_HEADER, HeaderValue::from_static("Awa"));
        assert!(RequestUser::from_headers(&headers).0.is_none());
    }

    #[test]
    fn reads_user_and_role() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("u9"));
        headers.insert(USER_PRENOM_HEADER, HeaderValue::from_static("Fatou"));
        headers.insert(USER_NOM_HEADER, HeaderValue::from_static("Sall"));
        headers.insert(USER_ROLE_HEADER, HeaderValue::from_static("Admin"));

        let user = RequestUser::from_headers(&headers).0.unwrap();
        assert_eq!(user.id, "u9");
        assert_eq!(user.display_name(), "Fatou Sall");
        assert!(user.is_admin());
    }

    #[test]
    fn unknown_role_reads_as_lecteur() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("u1"));
        headers.insert(USER_ROLE_HEADER, HeaderValue::from_static("superviseur"));

        let user = RequestUser::from_headers(&headers).0.unwrap();
        assert_eq!(user.role, UserRole::Lecteur);
        assert_eq!(user.display_name(), "Anonyme");
    }
}
