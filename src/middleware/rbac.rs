// src/middleware/rbac.rs

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use std::marker::PhantomData;

use crate::{
    common::error::ApiError,
    middleware::auth::AuthenticatedUser,
    models::auth::UserRole,
};

/// 1. O Trait que define quais perfis passam por um guardião
pub trait RoleRequirement: Send + Sync + 'static {
    fn allowed() -> &'static [UserRole];
    fn description() -> &'static str;
}

/// 2. O Extractor (Guardião)
pub struct RequireRole<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleRequirement,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or(ApiError {
                status: StatusCode::UNAUTHORIZED,
                error: "Usuário não autenticado".into(),
                details: None,
            })?;

        if !T::allowed().contains(&user.0.role) {
            tracing::warn!(login = %user.0.login, role = ?user.0.role, "Acesso negado");
            return Err(ApiError {
                status: StatusCode::FORBIDDEN,
                error: format!("Apenas {} pode realizar esta ação.", T::description()),
                details: None,
            });
        }

        Ok(RequireRole(PhantomData))
    }
}

// ---
// DEFINIÇÃO DOS PERFIS (TIPOS)
// ---

/// Somente o dono (pagamentos de promissórias e usuários)
pub struct AdminOnly;
impl RoleRequirement for AdminOnly {
    fn allowed() -> &'static [UserRole] { &[UserRole::Admin] }
    fn description() -> &'static str { "o administrador" }
}

/// Dono e gerente (cadastro de produtos, compras, despesas)
pub struct BackOffice;
impl RoleRequirement for BackOffice {
    fn allowed() -> &'static [UserRole] { &[UserRole::Admin, UserRole::Manager] }
    fn description() -> &'static str { "administrador ou gerente" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::auth::tests::sample_user;
    use axum::http::Request;

    async fn check<T: RoleRequirement>(role: Option<UserRole>) -> Result<(), StatusCode> {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        if let Some(role) = role {
            parts.extensions.insert(AuthenticatedUser(sample_user(role)));
        }
        RequireRole::<T>::from_request_parts(&mut parts, &())
            .await
            .map(|_| ())
            .map_err(|e| e.status)
    }

    #[tokio::test]
    async fn admin_only_admits_just_the_owner() {
        assert_eq!(check::<AdminOnly>(Some(UserRole::Admin)).await, Ok(()));
        assert_eq!(check::<AdminOnly>(Some(UserRole::Manager)).await, Err(StatusCode::FORBIDDEN));
        assert_eq!(check::<AdminOnly>(Some(UserRole::Salesperson)).await, Err(StatusCode::FORBIDDEN));
    }

    #[tokio::test]
    async fn back_office_admits_owner_and_manager() {
        assert_eq!(check::<BackOffice>(Some(UserRole::Admin)).await, Ok(()));
        assert_eq!(check::<BackOffice>(Some(UserRole::Manager)).await, Ok(()));
        assert_eq!(check::<BackOffice>(Some(UserRole::Salesperson)).await, Err(StatusCode::FORBIDDEN));
    }

    #[tokio::test]
    async fn missing_user_is_unauthorized() {
        assert_eq!(check::<BackOffice>(None).await, Err(StatusCode::UNAUTHORIZED));
    }
}
