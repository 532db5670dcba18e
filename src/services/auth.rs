// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{AuthResponse, Claims, User, UserRole},
};

const TOKEN_LIFETIME_DAYS: i64 = 7;

// Emissão e leitura dos JWT (HS256)
#[derive(Clone)]
pub struct TokenIssuer {
    secret: String,
}

impl TokenIssuer {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }

    pub fn issue(&self, user_id: Uuid, role: UserRole) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(TOKEN_LIFETIME_DAYS);

        let claims = Claims {
            sub: user_id,
            role,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )?)
    }

    pub fn read(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;
        Ok(token_data.claims)
    }
}

async fn hash_password(password: &str) -> Result<String, AppError> {
    let password_clone = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    tokens: TokenIssuer,
    pool: PgPool,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String, pool: PgPool) -> Self {
        Self {
            user_repo,
            tokens: TokenIssuer::new(jwt_secret),
            pool,
        }
    }

    pub async fn login_user(&self, login: &str, password: &str) -> Result<AuthResponse, AppError> {
        let user = self
            .user_repo
            .find_by_login(login)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid =
            tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            tracing::warn!(login = %login.trim(), "Tentativa de login com senha inválida");
            return Err(AppError::InvalidCredentials);
        }

        tracing::info!(login = %user.login, role = ?user.role, "Login efetuado");

        Ok(AuthResponse {
            token: self.tokens.issue(user.id, user.role)?,
            name: user.display_name().to_string(),
            role: user.role,
        })
    }

    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let claims = self.tokens.read(token)?;

        // O perfil vale o que está no banco, não o que estava no token
        self.user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    // ---
    // Gestão de usuários (somente ADM)
    // ---

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.user_repo.list(&self.pool).await
    }

    pub async fn create_user(
        &self,
        login: &str,
        name: &str,
        role: UserRole,
        password: &str,
    ) -> Result<User, AppError> {
        let hashed_password = hash_password(password).await?;
        let user = self
            .user_repo
            .create_user(&self.pool, login, name, role, &hashed_password)
            .await?;

        tracing::info!(login = %user.login, role = ?user.role, "Usuário criado");
        Ok(user)
    }

    pub async fn change_password(&self, user_id: Uuid, new_password: &str) -> Result<(), AppError> {
        let hashed_password = hash_password(new_password).await?;
        self.user_repo
            .update_password(&self.pool, user_id, &hashed_password)
            .await
    }

    pub async fn delete_user(&self, acting_user: &User, user_id: Uuid) -> Result<(), AppError> {
        if acting_user.id == user_id {
            return Err(AppError::CannotDeleteSelf);
        }
        self.user_repo.delete(&self.pool, user_id).await?;
        tracing::info!(deleted_by = %acting_user.login, %user_id, "Usuário excluído");
        Ok(())
    }

    // Cria o primeiro administrador quando a tabela está vazia
    pub async fn seed_admin(&self, initial_password: Option<&str>) -> Result<(), AppError> {
        if self.user_repo.count(&self.pool).await? > 0 {
            return Ok(());
        }

        match initial_password {
            Some(password) if !password.trim().is_empty() => {
                self.create_user("admin", "Administrador", UserRole::Admin, password)
                    .await?;
                tracing::info!("👤 Usuário 'admin' inicial criado");
            }
            _ => {
                tracing::warn!(
                    "Nenhum usuário cadastrado e ADMIN_INITIAL_PASSWORD não definido; ninguém conseguirá entrar"
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_tokens_carry_user_and_role() {
        let issuer = TokenIssuer::new("segredo-de-teste".into());
        let user_id = Uuid::new_v4();

        let token = issuer.issue(user_id, UserRole::Manager).unwrap();
        let claims = issuer.read(&token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, UserRole::Manager);
        assert_eq!(
            claims.exp - claims.iat,
            (TOKEN_LIFETIME_DAYS * 24 * 60 * 60) as usize
        );
    }

    #[test]
    fn tokens_signed_with_another_secret_are_rejected() {
        let token = TokenIssuer::new("um".into())
            .issue(Uuid::new_v4(), UserRole::Admin)
            .unwrap();
        let result = TokenIssuer::new("outro".into()).read(&token);
        assert!(matches!(result, Err(AppError::InvalidToken)));
    }

    #[test]
    fn garbage_is_not_a_token() {
        let result = TokenIssuer::new("x".into()).read("nao.e.jwt");
        assert!(matches!(result, Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn hashed_passwords_verify() {
        let hashed = hash_password("abc").await.unwrap();
        assert_ne!(hashed, "abc");
        assert!(verify("abc", &hashed).unwrap());
        assert!(!verify("abd", &hashed).unwrap());
    }
}
