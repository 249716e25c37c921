mod builder;
#[cfg(test)]
pub mod memory;
mod repository;
mod service;

pub use builder::*;
pub use repository::*;
pub use service::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed set of roles shared by users and token claims.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Public,
    #[default]
    Member,
    Vip,
    AdminMaster,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Public => "PUBLIC",
            Role::Member => "MEMBER",
            Role::Vip => "VIP",
            Role::AdminMaster => "ADMIN_MASTER",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PUBLIC" => Ok(Role::Public),
            "MEMBER" => Ok(Role::Member),
            "VIP" => Ok(Role::Vip),
            "ADMIN_MASTER" => Ok(Role::AdminMaster),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User as saved on database.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub role: Role,
    pub isd_code: Option<i32>,
    pub phone: Option<i64>,
    pub email: String,
    pub account: String,
    /// Absent for federated-only accounts.
    #[serde(skip)]
    pub password: Option<String>,
    /// Soft-delete flag.
    pub status: bool,
    /// Login eligibility.
    pub permission: bool,
    pub birthday: Option<String>,
    pub verified: bool,
    pub remark: Option<String>,
    #[serde(skip)]
    pub otp: Option<u32>,
    #[serde(rename = "otpExpiry", skip_serializing_if = "Option::is_none")]
    pub otp_expiry: Option<DateTime<Utc>>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether the account may open a session.
    pub fn can_login(&self) -> bool {
        self.verified && self.permission && self.status
    }
}

/// Profile changes accepted through the update path.
///
/// Identity, role and state flags have no field here, so they can never be
/// written by it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UserChanges {
    pub name: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub isd_code: Option<i32>,
    pub phone: Option<i64>,
    /// Already hashed.
    pub password: Option<String>,
    pub account: Option<String>,
    pub birthday: Option<String>,
    pub remark: Option<String>,
}

impl UserChanges {
    /// Apply changes on a [`User`].
    pub fn apply(self, user: &mut User) {
        if let Some(name) = self.name {
            user.name = name;
        }
        if self.firstname.is_some() {
            user.firstname = self.firstname;
        }
        if self.lastname.is_some() {
            user.lastname = self.lastname;
        }
        if self.isd_code.is_some() {
            user.isd_code = self.isd_code;
        }
        if self.phone.is_some() {
            user.phone = self.phone;
        }
        if self.password.is_some() {
            user.password = self.password;
        }
        if let Some(account) = self.account {
            user.account = account;
        }
        if self.birthday.is_some() {
            user.birthday = self.birthday;
        }
        if self.remark.is_some() {
            user.remark = self.remark;
        }
    }
}
