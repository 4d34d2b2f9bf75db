use crate::{Author, Error};

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct NewSession {
    pub email: String,
    pub password: String,
}

impl NewSession {
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_text(&self.email)?;
        crate::validate_text(&self.password)?;
        Ok(())
    }
}

/// Opaque bearer token handed out by `POST /auth/login`
#[derive(Clone, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(transparent)]
pub struct AuthToken(pub String);

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct AuthReply {
    pub token: AuthToken,
    pub user: Author,
}
