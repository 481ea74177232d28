//! Wallet Batch Generator
//!
//! Pure, local construction of a batch's wallets and funding transaction.
//! Nothing here touches the network; balances and submission belong to the
//! orchestrator and gateway.

use solana_sdk::packet::PACKET_DATA_SIZE;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use solana_sdk::system_instruction;
use solana_sdk::transaction::Transaction;

use crate::error::BatchError;
use crate::types::WalletSlot;

/// Generate `count` fresh wallet slots
///
/// Each slot gets an independent spend keypair and asset keypair from the
/// OS random source. Outcomes start `Pending`; no funding information is
/// attached yet.
pub fn generate(count: u32) -> Vec<WalletSlot> {
    (0..count)
        .map(|index| WalletSlot::new(index, Keypair::new(), Keypair::new()))
        .collect()
}

/// Build the single transaction that funds every slot
///
/// One system transfer per wallet, all in one transaction with the funding
/// account as fee payer, so funding is atomic at the submission level:
/// either the whole transaction lands or none of it does.
pub fn build_funding_transaction(
    funding_account: &Pubkey,
    slots: &[WalletSlot],
    amount_per_wallet: u64,
) -> Transaction {
    let instructions: Vec<_> = slots
        .iter()
        .map(|slot| system_instruction::transfer(funding_account, &slot.spend_pubkey(), amount_per_wallet))
        .collect();

    Transaction::new_with_payer(&instructions, Some(funding_account))
}

/// Serialized size in bytes of a funding transaction carrying `count`
/// transfers. Deterministic in `count`: key values and amounts do not
/// change the encoding size.
pub fn funding_transaction_size(count: u32) -> usize {
    let payer = Pubkey::new_unique();
    let instructions: Vec<_> = (0..count)
        .map(|_| system_instruction::transfer(&payer, &Pubkey::new_unique(), 1))
        .collect();
    let transaction = Transaction::new_with_payer(&instructions, Some(&payer));

    bincode::serialized_size(&transaction)
        .map(|size| size as usize)
        .unwrap_or(usize::MAX)
}

/// Reject batch sizes whose funding transaction cannot fit one packet.
pub fn check_funding_transaction_size(count: u32) -> Result<(), BatchError> {
    let size = funding_transaction_size(count);
    if size > PACKET_DATA_SIZE {
        return Err(BatchError::GenerationFailed(format!(
            "funding transaction for {} wallets would be {} bytes, over the {} byte packet limit",
            count, size, PACKET_DATA_SIZE
        )));
    }
    Ok(())
}
