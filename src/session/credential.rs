//! Decoding of the identity token handed over by the identity provider.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};

use crate::Error;

/// The signed-in user as shown in the navigation bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

impl UserProfile {
    /// The name to greet the user with, falling back to their email address.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.email
        } else {
            &self.name
        }
    }
}

/// An identity token together with the profile decoded from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Credential {
    token: String,
    profile: UserProfile,
}

impl Credential {
    /// Decode the payload of a JSON Web Token issued by the identity provider.
    ///
    /// The signature is not checked here, the remote transaction service
    /// verifies the token on every request.
    ///
    /// # Errors
    /// Returns [Error::InvalidCredential] if the token is not a JWT or its
    /// payload does not contain an email address.
    pub fn from_id_token(token: &str) -> Result<Self, Error> {
        let token = token.trim();
        let mut segments = token.split('.');
        let (Some(_header), Some(payload), Some(_signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            tracing::warn!("Identity token does not have three segments");
            return Err(Error::InvalidCredential);
        };

        let payload = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|error| {
                tracing::warn!("Could not decode identity token payload: {error}");
                Error::InvalidCredential
            })?;

        let profile: UserProfile = serde_json::from_slice(&payload).map_err(|error| {
            tracing::warn!("Identity token payload is missing profile claims: {error}");
            Error::InvalidCredential
        })?;

        if profile.email.trim().is_empty() {
            return Err(Error::InvalidCredential);
        }

        Ok(Self {
            token: token.to_owned(),
            profile,
        })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn into_parts(self) -> (String, UserProfile) {
        (self.token, self.profile)
    }
}

#[cfg(test)]
pub(crate) fn make_id_token(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());

    format!("{header}.{payload}.signature")
}
