//! Shared domain enums stored as strings in MySQL

use serde::{Deserialize, Serialize};
use sqlx::{
    encode::IsNull,
    error::BoxDynError,
    mysql::{MySql, MySqlTypeInfo, MySqlValueRef},
    Decode, Encode, Type,
};
use utoipa::ToSchema;

/// Implements string conversions and the sqlx VARCHAR mapping for a
/// fieldless enum. Parsing is case-insensitive; the stored form is exact.
macro_rules! string_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(
                    if s.eq_ignore_ascii_case($text) {
                        return Ok($name::$variant);
                    }
                )+
                Err(format!("Invalid {}: {}", stringify!($name), s))
            }
        }

        impl Type<MySql> for $name {
            fn type_info() -> MySqlTypeInfo {
                <str as Type<MySql>>::type_info()
            }

            fn compatible(ty: &MySqlTypeInfo) -> bool {
                <str as Type<MySql>>::compatible(ty)
            }
        }

        impl<'r> Decode<'r, MySql> for $name {
            fn decode(value: MySqlValueRef<'r>) -> Result<Self, BoxDynError> {
                let s = <&str as Decode<MySql>>::decode(value)?;
                s.parse().map_err(|e: String| e.into())
            }
        }

        impl Encode<'_, MySql> for $name {
            fn encode_by_ref(&self, buf: &mut Vec<u8>) -> IsNull {
                <&str as Encode<MySql>>::encode(self.as_str(), buf)
            }
        }
    };
}

/// Account role, from most to least privileged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Role {
    Admin,
    Moderator,
    User,
}

string_enum!(Role {
    Admin => "Admin",
    Moderator => "Moderator",
    User => "User",
});

/// Account lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum UserStatus {
    Active,
    Inactive,
    /// Registered but email not yet verified
    Pending,
}

string_enum!(UserStatus {
    Active => "Active",
    Inactive => "Inactive",
    Pending => "Pending",
});

/// Borrowing state. `Returned` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BorrowingStatus {
    Borrowed,
    Returned,
}

string_enum!(BorrowingStatus {
    Borrowed => "borrowed",
    Returned => "returned",
});

/// Kind of stored media, inferred from the MIME type of an upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Document,
    Image,
    Video,
    Audio,
}

string_enum!(MediaKind {
    Document => "document",
    Image => "image",
    Video => "video",
    Audio => "audio",
});

impl MediaKind {
    pub fn from_mime(mime: &str) -> Self {
        if mime.starts_with("image/") {
            MediaKind::Image
        } else if mime.starts_with("video/") {
            MediaKind::Video
        } else if mime.starts_with("audio/") {
            MediaKind::Audio
        } else {
            MediaKind::Document
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing_is_case_insensitive() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("MODERATOR".parse::<Role>().unwrap(), Role::Moderator);
        assert_eq!("User".parse::<Role>().unwrap(), Role::User);
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn test_stored_forms() {
        assert_eq!(Role::Admin.as_str(), "Admin");
        assert_eq!(UserStatus::Pending.to_string(), "Pending");
        assert_eq!(BorrowingStatus::Borrowed.as_str(), "borrowed");
        assert_eq!(
            serde_json::to_string(&BorrowingStatus::Returned).unwrap(),
            "\"returned\""
        );
    }

    #[test]
    fn test_media_kind_from_mime() {
        assert_eq!(MediaKind::from_mime("image/png"), MediaKind::Image);
        assert_eq!(MediaKind::from_mime("video/mp4"), MediaKind::Video);
        assert_eq!(MediaKind::from_mime("audio/mpeg"), MediaKind::Audio);
        assert_eq!(MediaKind::from_mime("application/pdf"), MediaKind::Document);
    }
}
