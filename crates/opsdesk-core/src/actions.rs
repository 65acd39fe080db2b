//! Operator actions on single rows
//!
//! Actions are validated before anything is sent. After a successful call
//! the affected list is refreshed by the caller.

use crate::error::{CoreError, CoreResult};
use crate::models::{OrderRound, WithdrawMethod};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum MemberAction {
    /// Credit the member's balance
    AddAmount { amount: Decimal },
    /// Debit the member's balance
    DecreaseAmount { amount: Decimal },
    /// Freeze or unfreeze the whole account
    Freeze { freeze: bool },
    UpdateScore { score: i64 },
    /// Block or allow withdrawals only
    FreezeWithdraw { freeze: bool },
    SetOrderRound { round: OrderRound, status: bool },
    /// Credit a bonus reward with an operator note
    AddBonus { amount: Decimal, notes: String },
    /// Pin a product, a mystery box or both to one of the member's orders
    AssignProduct {
        #[serde(default)]
        product_id: Option<u64>,
        order_number: u32,
        #[serde(default)]
        mystery_box: Option<MysteryBox>,
    },
    /// Amounts of the member's upcoming orders, in order
    SetOrderAmounts { amounts: Vec<Decimal> },
    /// Replace the account withdrawals are paid out to
    UpdateWithdrawalAddress(WithdrawalAddress),
}

/// Reward attached to an assigned order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MysteryBox {
    /// Payout kind, e.g. "cash"
    pub method: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalAddress {
    pub name: String,
    pub withdraw_method: WithdrawMethod,
    #[serde(default)]
    pub bank_name: Option<String>,
    #[serde(default)]
    pub bank_account_number: Option<u64>,
    #[serde(default)]
    pub branch_name: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub mobile_banking_name: Option<String>,
    #[serde(default)]
    pub mobile_banking_account_number: Option<u64>,
}

fn required(field: &str, value: &Option<String>) -> CoreResult<()> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(CoreError::validation(field, "is required for this withdraw method")),
    }
}

impl WithdrawalAddress {
    pub fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::validation("name", "must not be empty"));
        }
        match self.withdraw_method {
            WithdrawMethod::BankTransfer => {
                required("bank_name", &self.bank_name)?;
                if self.bank_account_number.is_none() {
                    return Err(CoreError::validation(
                        "bank_account_number",
                        "is required for this withdraw method",
                    ));
                }
            }
            WithdrawMethod::MobileBanking => {
                required("mobile_banking_name", &self.mobile_banking_name)?;
                if self.mobile_banking_account_number.is_none() {
                    return Err(CoreError::validation(
                        "mobile_banking_account_number",
                        "is required for this withdraw method",
                    ));
                }
            }
        }
        Ok(())
    }
}

impl MemberAction {
    pub fn validate(&self) -> CoreResult<()> {
        match self {
            MemberAction::AddAmount { amount } | MemberAction::DecreaseAmount { amount } => {
                if *amount <= Decimal::ZERO {
                    return Err(CoreError::validation("amount", "must be greater than zero"));
                }
            }
            MemberAction::UpdateScore { score } => {
                if *score < 0 {
                    return Err(CoreError::validation("score", "must not be negative"));
                }
            }
            MemberAction::SetOrderRound { round, .. } => {
                if *round == OrderRound::Unknown {
                    return Err(CoreError::validation(
                        "round",
                        "must be trial, round_one or round_two",
                    ));
                }
            }
            MemberAction::AddBonus { amount, notes } => {
                if *amount <= Decimal::ZERO {
                    return Err(CoreError::validation("amount", "must be greater than zero"));
                }
                if notes.trim().is_empty() {
                    return Err(CoreError::validation("notes", "a note is required"));
                }
            }
            MemberAction::AssignProduct {
                product_id,
                order_number,
                mystery_box,
            } => {
                if *order_number == 0 {
                    return Err(CoreError::validation("order_number", "must be at least 1"));
                }
                if product_id.is_none() && mystery_box.is_none() {
                    return Err(CoreError::validation(
                        "product_id",
                        "assign a product, a mystery box or both",
                    ));
                }
                if let Some(reward) = mystery_box {
                    if reward.method.trim().is_empty() {
                        return Err(CoreError::validation("mystery_box.method", "must not be empty"));
                    }
                    if reward.amount <= Decimal::ZERO {
                        return Err(CoreError::validation(
                            "mystery_box.amount",
                            "must be greater than zero",
                        ));
                    }
                }
            }
            MemberAction::SetOrderAmounts { amounts } => {
                if amounts.is_empty() {
                    return Err(CoreError::validation("amounts", "at least one amount is required"));
                }
                if let Some(slot) = amounts.iter().position(|a| *a <= Decimal::ZERO) {
                    return Err(CoreError::validation(
                        "amounts",
                        format!("amount #{} must be greater than zero", slot + 1),
                    ));
                }
            }
            MemberAction::UpdateWithdrawalAddress(address) => address.validate()?,
            MemberAction::Freeze { .. } | MemberAction::FreezeWithdraw { .. } => {}
        }
        Ok(())
    }

    pub fn name(&self) -> &'static str {
        match self {
            MemberAction::AddAmount { .. } => "add_amount",
            MemberAction::DecreaseAmount { .. } => "decrease_amount",
            MemberAction::Freeze { .. } => "freeze",
            MemberAction::UpdateScore { .. } => "update_score",
            MemberAction::FreezeWithdraw { .. } => "freeze_withdraw",
            MemberAction::SetOrderRound { .. } => "set_order_round",
            MemberAction::AddBonus { .. } => "add_bonus",
            MemberAction::AssignProduct { .. } => "assign_product",
            MemberAction::SetOrderAmounts { .. } => "set_order_amounts",
            MemberAction::UpdateWithdrawalAddress(_) => "update_withdrawal_address",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum WithdrawalAction {
    Approve { user_id: u64, amount: Decimal },
    Reject { remark: String },
}

impl WithdrawalAction {
    pub fn validate(&self) -> CoreResult<()> {
        match self {
            WithdrawalAction::Approve { amount, .. } => {
                if *amount <= Decimal::ZERO {
                    return Err(CoreError::validation("amount", "must be greater than zero"));
                }
            }
            WithdrawalAction::Reject { remark } => {
                if remark.trim().is_empty() {
                    return Err(CoreError::validation("remark", "a reason is required"));
                }
            }
        }
        Ok(())
    }

    pub fn name(&self) -> &'static str {
        match self {
            WithdrawalAction::Approve { .. } => "approve",
            WithdrawalAction::Reject { .. } => "reject",
        }
    }
}

/// Remote mutations behind the row action buttons
#[async_trait]
pub trait OperatorActions: Send + Sync {
    /// Returns the remote API's confirmation message
    async fn member_action(&self, user_id: u64, action: &MemberAction) -> CoreResult<String>;

    async fn withdrawal_action(&self, id: &str, action: &WithdrawalAction) -> CoreResult<String>;

    async fn delete_product(&self, product_id: u64) -> CoreResult<String>;
}
