//! Company/branch pair every balance row and document belongs to.

use std::fmt;

use pettycash_shared::Claims;
use pettycash_shared::types::{BranchId, CompanyId};
use serde::{Deserialize, Serialize};

/// The (company, branch) a ledger operation is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BranchScope {
    /// Owning company.
    pub company_id: CompanyId,
    /// Branch within the company.
    pub branch_id: BranchId,
}

impl BranchScope {
    /// Creates a scope.
    #[must_use]
    pub const fn new(company_id: CompanyId, branch_id: BranchId) -> Self {
        Self {
            company_id,
            branch_id,
        }
    }

    /// The caller's own company and branch.
    #[must_use]
    pub const fn of(claims: &Claims) -> Self {
        Self::new(claims.company_id(), claims.branch_id())
    }
}

impl fmt::Display for BranchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.company_id, self.branch_id)
    }
}
