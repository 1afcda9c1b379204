//! Canonical text encoding of transaction sets.
//!
//! Miners and validators both hash the output of [`serialize_transactions`],
//! so the fragment format (`sender->receiver:amount|`, amount with exactly two
//! decimals) must stay byte-identical across releases.

use crate::transaction::Transaction;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised while canonicalizing transactions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CanonicalError {
    #[error("transaction {id} has a non-finite amount ({amount})")]
    NonFiniteAmount { id: Uuid, amount: f64 },
}

/// Encode one transaction as `sender->receiver:amount|`.
pub fn transaction_fragment(tx: &Transaction) -> Result<String, CanonicalError> {
    if !tx.amount.is_finite() {
        return Err(CanonicalError::NonFiniteAmount {
            id: tx.id,
            amount: tx.amount,
        });
    }
    Ok(format!("{}->{}:{:.2}|", tx.sender, tx.receiver, tx.amount))
}

/// Concatenate the fragments of `transactions` in the order supplied.
pub fn serialize_transactions<'a, I>(transactions: I) -> Result<String, CanonicalError>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut out = String::new();
    for tx in transactions {
        out.push_str(&transaction_fragment(tx)?);
    }
    Ok(out)
}

/// Build the hash preimage for a given nonce.
pub fn block_preimage(serialized: &str, previous_hash: &str, nonce: u64) -> String {
    format!("{serialized}{previous_hash}{nonce}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(sender: &str, receiver: &str, amount: f64) -> Transaction {
        Transaction::new(sender, receiver, amount)
    }

    #[test]
    fn test_single_fragment() {
        assert_eq!(
            transaction_fragment(&tx("A", "B", 10.0)).unwrap(),
            "A->B:10.00|"
        );
    }

    #[test]
    fn test_two_decimal_rounding() {
        assert_eq!(transaction_fragment(&tx("A", "B", 1.0 / 3.0)).unwrap(), "A->B:0.33|");
        assert_eq!(transaction_fragment(&tx("A", "B", 2.5)).unwrap(), "A->B:2.50|");
        assert_eq!(transaction_fragment(&tx("A", "B", 1234.567)).unwrap(), "A->B:1234.57|");
    }

    #[test]
    fn test_zero_and_negative_amounts_are_formatted() {
        assert_eq!(transaction_fragment(&tx("A", "B", 0.0)).unwrap(), "A->B:0.00|");
        assert_eq!(transaction_fragment(&tx("A", "B", -5.0)).unwrap(), "A->B:-5.00|");
    }

    #[test]
    fn test_non_finite_rejected() {
        for amount in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let t = tx("A", "B", amount);
            let err = transaction_fragment(&t).unwrap_err();
            assert!(matches!(err, CanonicalError::NonFiniteAmount { id, .. } if id == t.id));
        }
    }

    #[test]
    fn test_order_preserved() {
        let txs = vec![tx("A", "B", 1.0), tx("C", "D", 2.0)];
        assert_eq!(
            serialize_transactions(&txs).unwrap(),
            "A->B:1.00|C->D:2.00|"
        );
        let reversed: Vec<_> = txs.iter().rev().cloned().collect();
        assert_eq!(
            serialize_transactions(&reversed).unwrap(),
            "C->D:2.00|A->B:1.00|"
        );
    }

    #[test]
    fn test_serialization_idempotent() {
        let txs = vec![tx("A", "B", 10.0), tx("B", "C", 0.015), tx("x", "y", 99.999)];
        let first = serialize_transactions(&txs).unwrap();
        for _ in 0..5 {
            assert_eq!(serialize_transactions(&txs).unwrap(), first);
        }
    }

    #[test]
    fn test_empty_set() {
        let txs: Vec<Transaction> = Vec::new();
        assert_eq!(serialize_transactions(&txs).unwrap(), "");
    }

    #[test]
    fn test_error_stops_serialization() {
        let txs = vec![tx("A", "B", 1.0), tx("C", "D", f64::NAN)];
        assert!(serialize_transactions(&txs).is_err());
    }

    #[test]
    fn test_preimage() {
        assert_eq!(block_preimage("A->B:10.00|", "", 42), "A->B:10.00|42");
        assert_eq!(block_preimage("x|", "abc", 0), "x|abc0");
    }
}
