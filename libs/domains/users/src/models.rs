use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// User roles
///
/// The set is closed: role strings from the outside (registration,
/// path segments, tokens) must parse into one of these variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Store,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Store => write!(f, "store"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "store" => Ok(Role::Store),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// Optional profile details
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct Profile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub address: Option<String>,
}

/// Store details for users with the store role
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StoreInfo {
    pub store_name: String,
    pub description: Option<String>,
    pub logo: Option<String>,
    /// Set by an admin, never at registration
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub total_sales: i64,
    #[serde(default)]
    pub rating: f64,
}

/// Store details as accepted from clients
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct StoreInfoInput {
    #[validate(length(min = 1, max = 100))]
    pub store_name: String,
    pub description: Option<String>,
    pub logo: Option<String>,
}

impl From<StoreInfoInput> for StoreInfo {
    fn from(input: StoreInfoInput) -> Self {
        Self {
            store_name: input.store_name,
            description: input.description,
            logo: input.logo,
            verified: false,
            total_sales: 0,
            rating: 0.0,
        }
    }
}

/// User entity - represents a user stored in MongoDB
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// Unique identifier (stored as _id in MongoDB)
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    /// Email, unique and stored lowercase
    pub email: String,
    /// Username, unique
    pub username: String,
    /// Argon2 password hash (persisted, never exposed via UserResponse)
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_info: Option<StoreInfo>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// User response DTO (without password_hash)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub role: Role,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_info: Option<StoreInfo>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            role: user.role,
            is_active: user.is_active,
            profile: user.profile,
            store_info: user.store_info,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// DTO for user registration
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(email, length(max = 255))]
    pub email: String,
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
    /// Requested role; defaults to `user`, `admin` is rejected
    pub role: Option<Role>,
    pub profile: Option<Profile>,
    #[validate(nested)]
    pub store_info: Option<StoreInfoInput>,
}

/// DTO for user login
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email, length(max = 255))]
    pub email: String,
    pub password: String,
}

/// DTO for changing the caller's password
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(length(min = 6, max = 128))]
    pub new_password: String,
}

/// DTO for updating an existing user
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUser {
    #[validate(email, length(max = 255))]
    pub email: Option<String>,
    #[validate(length(min = 3, max = 50))]
    pub username: Option<String>,
    /// Only admins may change roles
    pub role: Option<Role>,
    pub profile: Option<Profile>,
    #[validate(nested)]
    pub store_info: Option<StoreInfoInput>,
}

/// Query filters for listing users
#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: u64,
}

impl Default for UserFilter {
    fn default() -> Self {
        Self {
            role: None,
            is_active: None,
            limit: default_limit(),
            offset: 0,
        }
    }
}

fn default_limit() -> i64 {
    50
}

/// Token plus sanitized user, returned by register and login
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthPayload {
    pub token: String,
    pub user: UserResponse,
}

/// Response envelope for register and login
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthResponse {
    pub message: String,
    pub payload: AuthPayload,
}

/// Caller identity as carried by the token
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ClaimsIdentity {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub role: Role,
}

/// Response envelope for the profile endpoint
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub message: String,
    pub payload: ClaimsIdentity,
}

/// Single-user response envelope
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserEnvelope {
    pub message: String,
    pub payload: UserResponse,
}

/// User list response envelope
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ListUsersResponse {
    pub message: String,
    pub payload: Vec<UserResponse>,
    pub total: u64,
    pub limit: i64,
    pub offset: u64,
}

/// Toggle-status result
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ToggleStatusPayload {
    pub id: Uuid,
    pub is_active: bool,
}

/// Response envelope for toggle-status
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ToggleStatusResponse {
    pub message: String,
    pub payload: ToggleStatusPayload,
}

/// Plain message response
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl User {
    /// Create a new user (password must already be hashed)
    pub fn new(
        email: String,
        username: String,
        password_hash: String,
        role: Role,
        profile: Option<Profile>,
        store_info: Option<StoreInfo>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            email: email.to_lowercase(),
            username,
            password_hash,
            role,
            is_active: true,
            profile,
            store_info,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Apply updates (role changes are authorized by the caller)
    pub fn apply_update(&mut self, update: UpdateUser) {
        if let Some(email) = update.email {
            self.email = email.to_lowercase();
        }
        if let Some(username) = update.username {
            self.username = username;
        }
        if let Some(role) = update.role {
            self.role = role;
        }
        if let Some(profile) = update.profile {
            self.profile = Some(profile);
        }
        if let Some(store_info) = update.store_info {
            // Admin-managed fields carry over from the existing record
            let mut info = StoreInfo::from(store_info);
            if let Some(ref existing) = self.store_info {
                info.verified = existing.verified;
                info.total_sales = existing.total_sales;
                info.rating = existing.rating;
            }
            self.store_info = Some(info);
        }
        self.updated_at = Some(Utc::now());
    }
}
