use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::sqlite::{Sqlite, SqliteTypeInfo, SqliteValueRef};
use std::fmt;
use std::str::FromStr;

/// Which side of the marketplace a user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Farmer,
    Buyer,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Farmer => "farmer",
            UserType::Buyer => "buyer",
        }
    }

    /// The type of user this side trades and chats with.
    pub fn counterpart(&self) -> UserType {
        match self {
            UserType::Farmer => UserType::Buyer,
            UserType::Buyer => UserType::Farmer,
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown user type: {0}")]
pub struct UnknownUserType(pub String);

impl FromStr for UserType {
    type Err = UnknownUserType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "farmer" => Ok(UserType::Farmer),
            "buyer" => Ok(UserType::Buyer),
            other => Err(UnknownUserType(other.to_string())),
        }
    }
}

// Stored as TEXT ('farmer' / 'buyer')
impl sqlx::Type<Sqlite> for UserType {
    fn type_info() -> SqliteTypeInfo {
        <str as sqlx::Type<Sqlite>>::type_info()
    }

    fn compatible(ty: &SqliteTypeInfo) -> bool {
        <str as sqlx::Type<Sqlite>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, Sqlite> for UserType {
    fn encode_by_ref(
        &self,
        buf: &mut <Sqlite as sqlx::Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, BoxDynError> {
        <&str as sqlx::Encode<'q, Sqlite>>::encode(self.as_str(), buf)
    }
}

impl<'r> sqlx::Decode<'r, Sqlite> for UserType {
    fn decode(value: SqliteValueRef<'r>) -> Result<Self, BoxDynError> {
        let raw = <&str as sqlx::Decode<'r, Sqlite>>::decode(value)?;
        Ok(raw.parse()?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing, default)]
    #[sqlx(rename = "password")]
    pub password_hash: String,
    pub name: String,
    pub phone: Option<String>,
    pub user_type: UserType,
    pub language: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub registration_date: DateTime<Utc>,
}

/// Fields collected at registration, password already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub phone: Option<String>,
    pub user_type: UserType,
    pub language: String,
    pub location: Option<String>,
}
