// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// Perfis da loja: dono, gerente e vendedor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "perfil_usuario")]
pub enum UserRole {
    #[sqlx(rename = "ADM")]
    #[serde(rename = "ADM")]
    Admin,
    #[sqlx(rename = "GER")]
    #[serde(rename = "GER")]
    Manager,
    #[sqlx(rename = "VENDA")]
    #[serde(rename = "VENDA")]
    Salesperson,
}

// Representa um usuário vindo da tabela 'usuarios'
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,

    #[schema(example = "venda1")]
    pub login: String,

    #[sqlx(rename = "nome")]
    #[schema(example = "Vendedor 1")]
    pub name: String,

    #[sqlx(rename = "perfil")]
    pub role: UserRole,

    #[sqlx(rename = "senha_hash")]
    #[serde(skip_serializing)] // IMPORTANTE para segurança
    #[schema(ignore)]
    pub password_hash: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    // Nome exibido no topo da tela (cai para o login se o nome estiver vazio)
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() { &self.login } else { &self.name }
    }
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(length(min = 1, message = "Informe o usuário."))]
    #[schema(example = "admin")]
    pub login: String,
    #[validate(length(min = 1, message = "Informe a senha."))]
    pub password: String,
}

// Resposta de autenticação: token + dados de sessão
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    #[schema(example = "Administrador")]
    pub name: String,
    pub role: UserRole,
}

// Sessão atual (substitui as chaves 'usuario' e 'perfil' do navegador)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub id: Uuid,
    pub login: String,
    pub name: String,
    pub role: UserRole,
}

impl From<&User> for SessionInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            login: user.login.clone(),
            name: user.display_name().to_string(),
            role: user.role,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    #[validate(length(min = 1, message = "Preencha o login."))]
    pub login: String,
    #[validate(length(min = 1, message = "Preencha o nome."))]
    pub name: String,
    #[serde(default = "default_role")]
    pub role: UserRole,
    #[validate(length(min = 3, message = "A senha deve ter no mínimo 3 caracteres."))]
    pub password: String,
}

fn default_role() -> UserRole {
    UserRole::Salesperson
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordPayload {
    #[validate(length(min = 3, message = "A senha deve ter no mínimo 3 caracteres."))]
    pub new_password: String,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,      // ID do usuário
    pub role: UserRole, // Perfil no momento do login
    pub exp: usize,
    pub iat: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_use_the_store_codes_on_the_wire() {
        assert_eq!(serde_json::to_string(&UserRole::Admin).unwrap(), "\"ADM\"");
        assert_eq!(serde_json::to_string(&UserRole::Manager).unwrap(), "\"GER\"");
        let role: UserRole = serde_json::from_str("\"VENDA\"").unwrap();
        assert_eq!(role, UserRole::Salesperson);
    }

    #[test]
    fn new_users_default_to_salesperson() {
        let payload: CreateUserPayload =
            serde_json::from_str(r#"{"login":"venda2","name":"Vendedor 2","password":"abc"}"#).unwrap();
        assert_eq!(payload.role, UserRole::Salesperson);
        assert!(payload.validate().is_ok());
    }
}
