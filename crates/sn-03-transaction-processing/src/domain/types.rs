//! # Transaction Types

use std::fmt;

/// How a transaction is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionType {
    /// Plain value transfer.
    MoveBalance,
    /// Contract creation from code carried in the data field.
    SCDeployment,
    /// Call into an existing contract.
    SCInvoking,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionType::MoveBalance => "move-balance",
            TransactionType::SCDeployment => "sc-deployment",
            TransactionType::SCInvoking => "sc-invoking",
        };
        f.write_str(name)
    }
}
