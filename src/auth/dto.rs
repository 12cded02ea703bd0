use serde::Deserialize;

use crate::error::AppError;

/// Body of `POST /register`. Every field is optional on the wire so that
/// absent values produce a 400 page instead of an extractor rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub user_name: Option<String>,
    pub mobile_number: Option<String>,
    pub profile_pic: Option<String>,
    pub password: Option<String>,
}

/// Body of `POST /login`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub mobile_number: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug)]
pub struct Registration {
    pub user_name: String,
    pub mobile_number: String,
    pub profile_pic: String,
    pub password: String,
}

#[derive(Debug)]
pub struct Credentials {
    pub mobile_number: String,
    pub password: String,
}

fn trimmed(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

// Passwords are kept verbatim; only all-blank ones count as absent.
fn secret(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}

impl RegisterRequest {
    pub fn validate(self) -> Result<Registration, AppError> {
        match (
            trimmed(self.user_name),
            trimmed(self.mobile_number),
            trimmed(self.profile_pic),
            secret(self.password),
        ) {
            (Some(user_name), Some(mobile_number), Some(profile_pic), Some(password)) => {
                Ok(Registration {
                    user_name,
                    mobile_number,
                    profile_pic,
                    password,
                })
            }
            _ => Err(AppError::Validation {
                message: "Fill All The Details.",
                retry: "/register",
            }),
        }
    }
}

impl LoginRequest {
    pub fn validate(self) -> Result<Credentials, AppError> {
        match (trimmed(self.mobile_number), secret(self.password)) {
            (Some(mobile_number), Some(password)) => Ok(Credentials {
                mobile_number,
                password,
            }),
            _ => Err(AppError::Validation {
                message: "Must provide mobile number and password.",
                retry: "/login",
            }),
        }
    }
}
