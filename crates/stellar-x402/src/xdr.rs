//! XDR envelopes for single-operation native payments.
//!
//! Maps [`Transaction`] onto the `stellar-xdr` schema: a v1
//! `TransactionEnvelope` holding one `PAYMENT` operation with a time-bound
//! precondition, no memo, and zero or more decorated signatures.

use sha2::{Digest, Sha256};
use stellar_xdr::curr::{
    Asset, DecoratedSignature, Hash, Limits, Memo, MuxedAccount, Operation, OperationBody,
    PaymentOp as XdrPaymentOp, Preconditions, ReadXdr, SequenceNumber, Signature, SignatureHint,
    TimeBounds as XdrTimeBounds, TimePoint, Transaction as XdrTransaction, TransactionEnvelope,
    TransactionExt, TransactionSignaturePayload, TransactionSignaturePayloadTaggedTransaction,
    TransactionV1Envelope, Uint256, WriteXdr,
};

use crate::error::X402Error;
use crate::strkey;
use crate::transaction::Transaction;

fn codec_error(context: &str) -> impl FnOnce(stellar_xdr::curr::Error) -> X402Error + '_ {
    move |e| X402Error::Encoding(format!("{context}: {e}"))
}

fn muxed_account(account_id: &str) -> Result<MuxedAccount, X402Error> {
    Ok(MuxedAccount::Ed25519(Uint256(strkey::decode_account_id(
        account_id,
    )?)))
}

/// Map a payment onto the XDR `Transaction` body.
pub fn to_xdr_transaction(tx: &Transaction) -> Result<XdrTransaction, X402Error> {
    let payment = Operation {
        source_account: None,
        body: OperationBody::Payment(XdrPaymentOp {
            destination: muxed_account(&tx.payment.destination)?,
            asset: Asset::Native,
            amount: tx.payment.amount,
        }),
    };

    Ok(XdrTransaction {
        source_account: muxed_account(&tx.source_account)?,
        fee: tx.fee,
        seq_num: SequenceNumber(tx.sequence),
        cond: Preconditions::Time(XdrTimeBounds {
            min_time: TimePoint(tx.time_bounds.min_time),
            max_time: TimePoint(tx.time_bounds.max_time),
        }),
        memo: Memo::None,
        operations: vec![payment]
            .try_into()
            .map_err(codec_error("operations"))?,
        ext: TransactionExt::V0,
    })
}

/// Canonical bytes of the transaction body (the part covered by signatures).
pub fn encode_transaction(tx: &Transaction) -> Result<Vec<u8>, X402Error> {
    to_xdr_transaction(tx)?
        .to_xdr(Limits::none())
        .map_err(codec_error("transaction"))
}

/// Base64 envelope carrying `tx` and `signatures`: what wallets sign and
/// Horizon accepts.
pub fn envelope_base64(
    tx: XdrTransaction,
    signatures: Vec<DecoratedSignature>,
) -> Result<String, X402Error> {
    TransactionEnvelope::Tx(TransactionV1Envelope {
        tx,
        signatures: signatures
            .try_into()
            .map_err(codec_error("signatures"))?,
    })
    .to_xdr_base64(Limits::none())
    .map_err(codec_error("envelope"))
}

/// Decode an unsigned base64 envelope back into its transaction body.
///
/// Only v1 envelopes without signatures are accepted.
pub fn decode_unsigned(encoded: &str) -> Result<XdrTransaction, X402Error> {
    let envelope = TransactionEnvelope::from_xdr_base64(encoded.trim(), Limits::none())
        .map_err(codec_error("invalid envelope"))?;

    match envelope {
        TransactionEnvelope::Tx(v1) if v1.signatures.is_empty() => Ok(v1.tx),
        TransactionEnvelope::Tx(_) => {
            Err(X402Error::Encoding("envelope is already signed".to_string()))
        }
        _ => Err(X402Error::Encoding("unsupported envelope type".to_string())),
    }
}

/// Raw ed25519 key of the transaction's source account.
pub fn source_key(tx: &XdrTransaction) -> Result<[u8; 32], X402Error> {
    match &tx.source_account {
        MuxedAccount::Ed25519(Uint256(key)) => Ok(*key),
        MuxedAccount::MuxedEd25519(_) => Err(X402Error::Encoding(
            "muxed transaction sources are not supported".to_string(),
        )),
    }
}

/// Signature decorated with the last four bytes of the signer's public key.
pub fn decorated_signature(
    public_key: &[u8; 32],
    signature: [u8; 64],
) -> Result<DecoratedSignature, X402Error> {
    let mut hint = [0u8; 4];
    hint.copy_from_slice(&public_key[28..]);
    Ok(DecoratedSignature {
        hint: SignatureHint(hint),
        signature: Signature(
            signature
                .to_vec()
                .try_into()
                .map_err(codec_error("signature"))?,
        ),
    })
}

/// Network id: SHA-256 of the network passphrase.
pub fn network_id(passphrase: &str) -> [u8; 32] {
    Sha256::digest(passphrase.as_bytes()).into()
}

/// Hash signers sign: SHA-256 of the network-tagged signature payload.
pub fn payload_hash(tx: &XdrTransaction, passphrase: &str) -> Result<[u8; 32], X402Error> {
    let payload = TransactionSignaturePayload {
        network_id: Hash(network_id(passphrase)),
        tagged_transaction: TransactionSignaturePayloadTaggedTransaction::Tx(tx.clone()),
    };
    let bytes = payload
        .to_xdr(Limits::none())
        .map_err(codec_error("signature payload"))?;
    Ok(Sha256::digest(bytes).into())
}

/// Same as [`payload_hash`], starting from a [`Transaction`].
pub fn transaction_hash(tx: &Transaction, passphrase: &str) -> Result<[u8; 32], X402Error> {
    payload_hash(&to_xdr_transaction(tx)?, passphrase)
}
