//! Account lifecycle.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::clock::Clock;
use crate::crypto::PasswordManager;
use crate::error::{Result, ServerError};
use crate::mail::Mailer;
use crate::otp::{self, OtpManager};
use crate::token::TokenManager;
use crate::user::{Role, User, UserBuilder, UserChanges, UserRepository};

/// Registration input.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct Registration {
    #[validate(length(min = 1, max = 255, message = "Name is required."))]
    pub name: String,
    #[validate(email(message = "Email must be formatted."))]
    pub email: String,
    #[validate(length(
        min = 6,
        max = 255,
        message = "Password must contain at least 6 characters."
    ))]
    #[serde(default)]
    pub password: String,
    #[validate(length(min = 1, max = 255))]
    pub account: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub isd_code: Option<i32>,
    pub phone: Option<i64>,
    pub birthday: Option<String>,
    pub remark: Option<String>,
}

/// Profile changes as submitted by a client.
///
/// Unknown keys, including restricted ones such as `email` or `role`, are
/// dropped while decoding.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProfileUpdate {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub isd_code: Option<i32>,
    pub phone: Option<i64>,
    #[validate(length(
        min = 6,
        max = 255,
        message = "Password must contain at least 6 characters."
    ))]
    pub password: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub account: Option<String>,
    pub birthday: Option<String>,
    pub remark: Option<String>,
}

/// Identity proven by an external provider.
#[derive(Debug, Clone)]
pub struct FederatedProfile {
    pub email: String,
    pub name: String,
    /// Provider-side subject identifier.
    pub subject: String,
}

/// Opened session.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

/// Orchestrates registration, verification, sessions and profile changes.
#[derive(Clone)]
pub struct AccountService {
    repo: Arc<dyn UserRepository>,
    pwd: Arc<PasswordManager>,
    token: TokenManager,
    otp: OtpManager,
    mailer: Arc<dyn Mailer>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl AccountService {
    /// Create a new [`AccountService`].
    pub fn new(
        repo: Arc<dyn UserRepository>,
        pwd: Arc<PasswordManager>,
        token: TokenManager,
        otp: OtpManager,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
        timeout: Duration,
    ) -> Self {
        Self {
            repo,
            pwd,
            token,
            otp,
            mailer,
            clock,
            timeout,
        }
    }

    #[cfg(test)]
    pub fn repository(&self) -> &Arc<dyn UserRepository> {
        &self.repo
    }

    /// Await a dependency call no longer than the configured timeout.
    async fn bounded<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| ServerError::Timeout)?
    }

    fn hash(&self, password: &str) -> Result<String> {
        self.pwd
            .hash_password(password)
            .map_err(|err| ServerError::internal("cannot hash password", err))
    }

    /// Create an unverified account and mail it an OTP challenge.
    pub async fn register(&self, input: Registration) -> Result<User> {
        let account = input.account.unwrap_or_else(|| input.email.clone());

        if self.bounded(self.repo.exists(&input.email, &account)).await? {
            return Err(ServerError::Conflict(
                "email or account is already in use".into(),
            ));
        }

        let password = self.hash(&input.password)?;
        let now = self.clock.now();
        let challenge = self.otp.issue(now);

        let user = UserBuilder::new()
            .name(input.name)
            .email(input.email)
            .account(Some(account))
            .password(Some(password))
            .full_name(input.firstname, input.lastname)
            .phone(input.isd_code, input.phone)
            .profile(input.birthday, input.remark)
            .challenge(challenge)
            .build(now);

        let body = otp::message(&challenge, self.otp.lifetime());
        self.bounded(self.mailer.send(&user.email, otp::SUBJECT, &body))
            .await?;
        self.bounded(self.repo.insert(&user)).await?;

        tracing::info!(user_id = user.id, "user registered, otp pending");

        Ok(user)
    }

    /// Consume an OTP challenge and flag the account as verified.
    pub async fn verify_otp(&self, email: &str, code: u32) -> Result<User> {
        let mut user = self
            .bounded(self.repo.find_by_email(email))
            .await?
            .ok_or(ServerError::InvalidCredential)?;

        let now = self.clock.now();
        if !self.otp.verify(user.otp, user.otp_expiry, code, now) {
            tracing::warn!(user_id = user.id, "otp rejected");
            return Err(ServerError::InvalidCredential);
        }

        user.otp = None;
        user.otp_expiry = None;
        user.verified = true;
        user.updated_at = now;
        self.bounded(self.repo.save(&user)).await?;

        tracing::info!(user_id = user.id, "user verified");

        Ok(user)
    }

    /// Open a session.
    ///
    /// Unknown email, ineligible account and wrong password are not told
    /// apart.
    pub async fn login(
        &self,
        email: &str,
        password: Option<&str>,
    ) -> Result<Session> {
        let user = self
            .bounded(self.repo.find_by_email(email))
            .await?
            .filter(User::can_login)
            .ok_or_else(|| {
                tracing::warn!("login rejected, no eligible account");
                ServerError::InvalidCredential
            })?;

        // Federated accounts have no hash and authenticate by existence.
        if let Some(hash) = &user.password {
            let valid = password
                .map(|password| self.pwd.verify_password(password, hash))
                .unwrap_or(false);
            if !valid {
                tracing::warn!(user_id = user.id, "login rejected, bad password");
                return Err(ServerError::InvalidCredential);
            }
        }

        let access_token = self.token.create_access(&user)?;
        let refresh_token = self.token.create_refresh(&user)?;

        Ok(Session {
            user,
            access_token,
            refresh_token,
        })
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// The live account state is not checked again.
    pub fn refresh(&self, refresh_token: &str) -> Result<String> {
        let claims = self.token.decode(refresh_token)?;
        self.token.renew_access(&claims)
    }

    /// Find or create the account of an externally proven identity.
    pub async fn federated_validate(
        &self,
        profile: FederatedProfile,
    ) -> Result<User> {
        if let Some(user) =
            self.bounded(self.repo.find_by_email(&profile.email)).await?
        {
            return Ok(user);
        }

        let user = UserBuilder::new()
            .name(profile.name)
            .email(profile.email)
            .account(Some(profile.subject))
            .role(Role::Public)
            .verified(true)
            .build(self.clock.now());
        self.bounded(self.repo.insert(&user)).await?;

        tracing::info!(user_id = user.id, "federated user registered");

        Ok(user)
    }

    /// Find an active user.
    pub async fn find_one(&self, id: &str) -> Result<User> {
        self.bounded(self.repo.find_by_id(id))
            .await?
            .filter(|user| user.status)
            .ok_or(ServerError::NotFound("user not found"))
    }

    pub async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<User>> {
        self.bounded(self.repo.find_by_ids(ids)).await
    }

    pub async fn find_all(&self) -> Result<Vec<User>> {
        self.bounded(self.repo.find_all_active()).await
    }

    /// Apply profile changes on a user.
    pub async fn update(&self, id: &str, update: ProfileUpdate) -> Result<User> {
        let mut user = self
            .bounded(self.repo.find_by_id(id))
            .await?
            .ok_or(ServerError::NotFound("user not found"))?;

        let password = update.password.as_deref().map(|p| self.hash(p)).transpose()?;
        UserChanges {
            name: update.name,
            firstname: update.firstname,
            lastname: update.lastname,
            isd_code: update.isd_code,
            phone: update.phone,
            password,
            account: update.account,
            birthday: update.birthday,
            remark: update.remark,
        }
        .apply(&mut user);
        user.updated_at = self.clock.now();

        self.bounded(self.repo.save(&user)).await?;

        tracing::info!(user_id = user.id, "user updated");

        Ok(user)
    }

    /// Soft-delete users, returning how many were deactivated.
    pub async fn deactivate(&self, ids: &[String]) -> Result<u64> {
        let modified = self
            .bounded(self.repo.deactivate(ids, self.clock.now()))
            .await?;

        if modified == 0 {
            return Err(ServerError::NotFound("no active user matched"));
        }

        tracing::info!(modified, "users deactivated");

        Ok(modified)
    }
}
