//! # Transaction Rules
//!
//! Classification and sender-side validation of a user transaction.

use shared_types::{Transaction, U256};
use sn_01_account_ledger::Account;

use crate::domain::{TransactionType, TxProcessError, TxProcessResult};

/// Decide how `tx` is applied.
///
/// `receiver_is_local` tells whether the receiver lives in this shard and
/// `receiver_is_contract` whether it holds code.
///
/// - empty or all-zero receiver with data: deployment
/// - empty or all-zero receiver without data: rejected
/// - local contract receiver: invocation
/// - remote receiver with call data: invocation, settled through a result
/// - anything else: value transfer
pub fn classify_transaction(
    tx: &Transaction,
    receiver_is_local: bool,
    receiver_is_contract: bool,
) -> TxProcessResult<TransactionType> {
    if tx.receiver.iter().all(|b| *b == 0) {
        if tx.data.is_empty() {
            return Err(TxProcessError::WrongTransaction);
        }
        return Ok(TransactionType::SCDeployment);
    }

    if receiver_is_local {
        if receiver_is_contract {
            return Ok(TransactionType::SCInvoking);
        }
        return Ok(TransactionType::MoveBalance);
    }

    if !tx.data.is_empty() {
        return Ok(TransactionType::SCInvoking);
    }
    Ok(TransactionType::MoveBalance)
}

/// Value plus fee of `tx`.
pub fn required_funds(tx: &Transaction) -> TxProcessResult<U256> {
    tx.total_cost().ok_or(TxProcessError::ValueOverflow)
}

/// Check nonce and funds of a local sender.
///
/// `None` means the sender lives in another shard, where the debit already
/// happened; nothing is checked.
pub fn check_tx_values(tx: &Transaction, sender: Option<&Account>) -> TxProcessResult<()> {
    let Some(sender) = sender else {
        return Ok(());
    };

    if sender.nonce < tx.nonce {
        return Err(TxProcessError::HigherNonceInTransaction {
            account: sender.nonce,
            transaction: tx.nonce,
        });
    }
    if sender.nonce > tx.nonce {
        return Err(TxProcessError::LowerNonceInTransaction {
            account: sender.nonce,
            transaction: tx.nonce,
        });
    }

    let cost = required_funds(tx)?;
    if cost.is_zero() {
        return Ok(());
    }
    if sender.balance < cost {
        return Err(TxProcessError::InsufficientFunds {
            required: cost,
            available: sender.balance,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{Address, U256};

    fn tx(receiver: Vec<u8>, data: &[u8]) -> Transaction {
        Transaction {
            receiver,
            data: data.to_vec(),
            ..Default::default()
        }
    }

    #[test]
    fn test_classify_deployment() {
        assert_eq!(
            classify_transaction(&tx(vec![0; 32], b"code"), true, false).unwrap(),
            TransactionType::SCDeployment
        );
        assert!(matches!(
            classify_transaction(&tx(vec![0; 32], b""), true, false),
            Err(TxProcessError::WrongTransaction)
        ));
        assert!(matches!(
            classify_transaction(&tx(Vec::new(), b""), false, false),
            Err(TxProcessError::WrongTransaction)
        ));
    }

    #[test]
    fn test_classify_invocation_and_transfer() {
        let receiver = vec![7; 32];
        assert_eq!(
            classify_transaction(&tx(receiver.clone(), b"call"), true, true).unwrap(),
            TransactionType::SCInvoking
        );
        assert_eq!(
            classify_transaction(&tx(receiver.clone(), b"note"), true, false).unwrap(),
            TransactionType::MoveBalance
        );
        assert_eq!(
            classify_transaction(&tx(receiver.clone(), b"call"), false, false).unwrap(),
            TransactionType::SCInvoking
        );
        assert_eq!(
            classify_transaction(&tx(receiver, b""), false, false).unwrap(),
            TransactionType::MoveBalance
        );
    }

    fn sender(nonce: u64, balance: u64) -> Account {
        let mut account = Account::new(Address::new(vec![1; 32]));
        account.nonce = nonce;
        account.balance = U256::from(balance);
        account
    }

    #[test]
    fn test_check_tx_values_nonce() {
        let transaction = Transaction {
            nonce: 5,
            ..Default::default()
        };
        assert!(matches!(
            check_tx_values(&transaction, Some(&sender(4, 0))),
            Err(TxProcessError::HigherNonceInTransaction { account: 4, transaction: 5 })
        ));
        assert!(matches!(
            check_tx_values(&transaction, Some(&sender(6, 0))),
            Err(TxProcessError::LowerNonceInTransaction { .. })
        ));
        // Zero cost needs no balance
        assert!(check_tx_values(&transaction, Some(&sender(5, 0))).is_ok());
    }

    #[test]
    fn test_check_tx_values_funds() {
        let transaction = Transaction {
            value: U256::from(40),
            gas_price: 1,
            gas_limit: 10,
            ..Default::default()
        };
        assert!(check_tx_values(&transaction, Some(&sender(0, 50))).is_ok());
        assert!(matches!(
            check_tx_values(&transaction, Some(&sender(0, 49))),
            Err(TxProcessError::InsufficientFunds { .. })
        ));
        assert!(check_tx_values(&transaction, None).is_ok());
    }

    #[test]
    fn test_check_tx_values_rejects_overflowing_cost() {
        let transaction = Transaction {
            value: U256::MAX,
            gas_price: 1,
            gas_limit: 1,
            ..Default::default()
        };
        assert!(matches!(
            check_tx_values(&transaction, Some(&sender(0, 50))),
            Err(TxProcessError::ValueOverflow)
        ));
    }

    proptest::proptest! {
        #[test]
        fn test_funds_check_matches_total_cost(
            balance in 0u64..1_000,
            value in 0u64..1_000,
            gas_price in 0u64..10,
            gas_limit in 0u64..50,
        ) {
            let transaction = Transaction {
                value: U256::from(value),
                gas_price,
                gas_limit,
                ..Default::default()
            };
            let accepted = check_tx_values(&transaction, Some(&sender(0, balance))).is_ok();
            proptest::prop_assert_eq!(accepted, balance >= value + gas_price * gas_limit);
        }
    }
}
