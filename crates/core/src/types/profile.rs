//! Application profile stored in the `usuarios` table.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::{AuthUid, Email};

/// Application role of a profile (`rol` column).
///
/// New profiles are always created as [`Role::Vendedor`]; any other value
/// found in the table is preserved verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    #[default]
    Vendedor,
    Other(String),
}

impl Role {
    /// Column value of the default role.
    pub const VENDEDOR: &'static str = "vendedor";

    /// Returns the column value for this role.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Vendedor => Self::VENDEDOR,
            Self::Other(role) => role,
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        if value == Self::VENDEDOR {
            Self::Vendedor
        } else {
            Self::Other(value)
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Vendedor => Role::VENDEDOR.to_owned(),
            Role::Other(role) => role,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row of the `usuarios` table.
///
/// The row is keyed by [`AuthUid`]; field names follow the table's columns on
/// the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub auth_uid: AuthUid,
    pub email: Email,
    #[serde(rename = "nombre_usuario")]
    pub display_name: String,
    #[serde(rename = "codigo_vendedor", default)]
    pub seller_code: String,
    #[serde(rename = "rol", default)]
    pub role: Role,
}

impl UserProfile {
    /// Profile synthesized on the first successful sign-in of an account
    /// that has no row yet: display name is the email's local part, seller
    /// code is empty and the role is the default one.
    #[must_use]
    pub fn default_for(auth_uid: AuthUid, email: &Email) -> Self {
        Self {
            auth_uid,
            email: email.clone(),
            display_name: email.local_part().to_owned(),
            seller_code: String::new(),
            role: Role::default(),
        }
    }
}
