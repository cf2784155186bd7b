//! Request identity carried in bearer tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{BranchId, CompanyId, UserId};

/// JWT claims for access tokens.
///
/// Every ledger write is scoped to the company/branch named here and stamped
/// with the username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: Uuid,
    /// Login name, recorded in `created_by`/`updated_by`.
    pub username: String,
    /// Company the user works for.
    #[serde(rename = "company_id")]
    pub company: Uuid,
    /// Branch the user works at.
    #[serde(rename = "branch_id")]
    pub branch: Uuid,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(
        user_id: UserId,
        username: &str,
        company_id: CompanyId,
        branch_id: BranchId,
        expires_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.into_inner(),
            username: username.to_string(),
            company: company_id.into_inner(),
            branch: branch_id.into_inner(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        UserId::from_uuid(self.sub)
    }

    /// Returns the company ID from claims.
    #[must_use]
    pub const fn company_id(&self) -> CompanyId {
        CompanyId::from_uuid(self.company)
    }

    /// Returns the branch ID from claims.
    #[must_use]
    pub const fn branch_id(&self) -> BranchId {
        BranchId::from_uuid(self.branch)
    }
}
