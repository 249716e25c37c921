//! Typed builder for User.

use chrono::{DateTime, Utc};

use crate::otp::Challenge;
use crate::user::{Role, User};

/// [`User`] builder.
#[derive(Debug, Clone)]
pub struct UserBuilder<Email> {
    email: Email,
    name: String,
    firstname: Option<String>,
    lastname: Option<String>,
    isd_code: Option<i32>,
    phone: Option<i64>,
    account: Option<String>,
    password: Option<String>,
    birthday: Option<String>,
    remark: Option<String>,
    role: Role,
    verified: bool,
    challenge: Option<Challenge>,
}

/// Value is missing on [`UserBuilder`].
#[derive(Debug, Clone)]
pub struct Missing;

/// Value is present on [`UserBuilder`].
#[derive(Debug, Clone)]
pub struct Present<T>(pub T);

impl UserBuilder<Missing> {
    /// Create a new [`UserBuilder`].
    pub fn new() -> Self {
        Self {
            email: Missing,
            name: String::default(),
            firstname: None,
            lastname: None,
            isd_code: None,
            phone: None,
            account: None,
            password: None,
            birthday: None,
            remark: None,
            role: Role::default(),
            verified: false,
            challenge: None,
        }
    }

    /// Update `email` field on [`UserBuilder`].
    pub fn email(self, email: impl Into<String>) -> UserBuilder<Present<String>> {
        UserBuilder {
            email: Present(email.into()),
            name: self.name,
            firstname: self.firstname,
            lastname: self.lastname,
            isd_code: self.isd_code,
            phone: self.phone,
            account: self.account,
            password: self.password,
            birthday: self.birthday,
            remark: self.remark,
            role: self.role,
            verified: self.verified,
            challenge: self.challenge,
        }
    }
}

impl Default for UserBuilder<Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Email> UserBuilder<Email> {
    /// Update `name` field on [`UserBuilder`].
    pub fn name(mut self, name: impl ToString) -> Self {
        self.name = name.to_string();
        self
    }

    /// Update `firstname` and `lastname` fields on [`UserBuilder`].
    pub fn full_name(
        mut self,
        firstname: Option<String>,
        lastname: Option<String>,
    ) -> Self {
        self.firstname = firstname;
        self.lastname = lastname;
        self
    }

    /// Update `isd_code` and `phone` fields on [`UserBuilder`].
    pub fn phone(mut self, isd_code: Option<i32>, phone: Option<i64>) -> Self {
        self.isd_code = isd_code;
        self.phone = phone;
        self
    }

    /// Update `account` field on [`UserBuilder`].
    ///
    /// Falls back on the email when `None`.
    pub fn account(mut self, account: Option<String>) -> Self {
        self.account = account;
        self
    }

    /// Update `password` field on [`UserBuilder`]. Must be already hashed.
    pub fn password(mut self, password: Option<String>) -> Self {
        self.password = password;
        self
    }

    /// Update `birthday` and `remark` fields on [`UserBuilder`].
    pub fn profile(
        mut self,
        birthday: Option<String>,
        remark: Option<String>,
    ) -> Self {
        self.birthday = birthday;
        self.remark = remark;
        self
    }

    /// Update `role` field on [`UserBuilder`].
    pub fn role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Update `verified` field on [`UserBuilder`].
    pub fn verified(mut self, verified: bool) -> Self {
        self.verified = verified;
        self
    }

    /// Attach a pending OTP challenge.
    pub fn challenge(mut self, challenge: Challenge) -> Self {
        self.challenge = Some(challenge);
        self
    }
}

impl UserBuilder<Present<String>> {
    /// Build a [`User`] created at `now`.
    pub fn build(self, now: DateTime<Utc>) -> User {
        let Present(email) = self.email;

        User {
            id: uuid::Uuid::new_v4().to_string(),
            name: self.name,
            firstname: self.firstname,
            lastname: self.lastname,
            role: self.role,
            isd_code: self.isd_code,
            phone: self.phone,
            account: self.account.unwrap_or_else(|| email.clone()),
            email,
            password: self.password,
            status: true,
            permission: true,
            birthday: self.birthday,
            verified: self.verified,
            remark: self.remark,
            otp: self.challenge.map(|c| c.code),
            otp_expiry: self.challenge.map(|c| c.expires_at),
            created_at: now,
            updated_at: now,
        }
    }
}
