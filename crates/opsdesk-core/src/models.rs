//! Rows returned by the remote back-office API

use chrono::{DateTime, Utc};
use opsdesk_utils::{format_money, format_number, truncate};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// A row a list view can render as a table line
pub trait TableRow {
    /// Column headers, in cell order
    fn headers() -> &'static [&'static str];

    /// Display text for each column
    fn cells(&self) -> Vec<String>;

    /// Identifier used by row actions
    fn row_id(&self) -> String;

    /// Totals shown above the table for the current page
    fn summarize(_rows: &[Self]) -> Vec<SummaryItem>
    where
        Self: Sized,
    {
        Vec::new()
    }
}

/// One total above a table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryItem {
    pub label: String,
    pub amount: Decimal,
    pub count: usize,
}

fn format_time(time: &Option<DateTime<Utc>>) -> String {
    time.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

fn yes_no(flag: bool) -> String {
    let label = if flag { "Yes" } else { "No" };
    label.to_string()
}

/// Account numbers arrive either as JSON strings or numbers
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

// ==================== Members ====================

/// Order round a member is allowed to take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderRound {
    #[default]
    Trial,
    RoundOne,
    RoundTwo,
    /// Any round name this build does not know
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for OrderRound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderRound::Trial => write!(f, "Trial"),
            OrderRound::RoundOne => write!(f, "Round 1"),
            OrderRound::RoundTwo => write!(f, "Round 2"),
            OrderRound::Unknown => write!(f, "Unknown"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderRoundState {
    #[serde(default)]
    pub round: OrderRound,
    #[serde(default)]
    pub status: bool,
}

/// A platform user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Member {
    /// Storage id of the remote record
    #[serde(rename = "_id")]
    pub id: String,
    /// Numeric id shown to operators and used in action URLs
    pub user_id: u64,
    pub phone_number: String,
    pub name: Option<String>,
    /// Normal, VIP or Admin
    pub user_type: String,
    pub score: i64,
    pub user_balance: Decimal,
    pub member_total_recharge: Decimal,
    pub member_total_withdrawal: Decimal,
    pub freeze_user: bool,
    pub freeze_withdraw: bool,
    pub is_online: bool,
    pub last_login_ip: String,
    pub order_round: Option<OrderRoundState>,
    pub quantity_of_orders: u32,
    pub completed_orders_count: u32,
    pub superior_user_name: String,
    pub invitation_code: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl Member {
    /// Last four digits of the phone number
    pub fn phone_last4(&self) -> &str {
        let len = self.phone_number.len();
        if len >= 4 && self.phone_number.is_char_boundary(len - 4) {
            &self.phone_number[len - 4..]
        } else {
            &self.phone_number
        }
    }

    pub fn status_label(&self) -> &'static str {
        match (self.freeze_user, self.freeze_withdraw) {
            (true, _) => "Frozen",
            (false, true) => "Withdraw frozen",
            (false, false) => "Active",
        }
    }
}

impl TableRow for Member {
    fn headers() -> &'static [&'static str] {
        &[
            "User ID",
            "Phone",
            "Name",
            "Type",
            "Balance",
            "Score",
            "Orders",
            "Round",
            "Status",
            "Online",
            "Last IP",
            "Superior",
            "Registered",
        ]
    }

    fn cells(&self) -> Vec<String> {
        let round = match &self.order_round {
            Some(state) if state.status => state.round.to_string(),
            Some(state) => format!("{} (off)", state.round),
            None => "-".to_string(),
        };
        vec![
            self.user_id.to_string(),
            self.phone_number.clone(),
            self.name.clone().unwrap_or_default(),
            self.user_type.clone(),
            format_money(&self.user_balance),
            format_number(self.score),
            format!(
                "{}/{}",
                self.completed_orders_count, self.quantity_of_orders
            ),
            round,
            self.status_label().to_string(),
            yes_no(self.is_online),
            self.last_login_ip.clone(),
            self.superior_user_name.clone(),
            format_time(&self.created_at),
        ]
    }

    fn row_id(&self) -> String {
        self.user_id.to_string()
    }
}

// ==================== Products ====================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: String,
    pub product_id: u64,
    pub name: String,
    pub price: Decimal,
    pub commission: Decimal,
    pub sale_price: Decimal,
    /// Active or Inactive
    pub status: String,
    pub introduction: String,
    /// Poster image URL
    pub poster: String,
    pub is_admin_assigned: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl TableRow for Product {
    fn headers() -> &'static [&'static str] {
        &[
            "Product ID",
            "Name",
            "Price",
            "Commission",
            "Sale price",
            "Status",
            "Introduction",
            "Created",
        ]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.product_id.to_string(),
            self.name.clone(),
            format_money(&self.price),
            format_money(&self.commission),
            format_money(&self.sale_price),
            self.status.clone(),
            truncate(&self.introduction, 48),
            format_time(&self.created_at),
        ]
    }

    fn row_id(&self) -> String {
        self.product_id.to_string()
    }
}

// ==================== Withdrawals ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Approved,
    Rejected,
    #[default]
    Pending,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Approved => "APPROVED",
            TransactionStatus::Rejected => "REJECTED",
            TransactionStatus::Pending => "PENDING",
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Approved => write!(f, "Successful"),
            TransactionStatus::Rejected => write!(f, "Failed"),
            TransactionStatus::Pending => write!(f, "Pending"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WithdrawMethod {
    BankTransfer,
    MobileBanking,
}

/// A withdrawal request awaiting or past review
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Withdrawal {
    /// Storage id, used in accept/reject URLs
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: u64,
    pub name: String,
    pub mobile: String,
    /// Requested amount
    pub amount: Decimal,
    /// Amount after fees; older records lack it
    pub actual_amount: Option<Decimal>,
    pub withdrawal_fee: Option<Decimal>,
    pub transaction_status: TransactionStatus,
    pub withdraw_method: Option<WithdrawMethod>,
    pub superior_user_name: String,
    pub bank_name: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub bank_account_number: Option<String>,
    pub branch_name: Option<String>,
    pub district: Option<String>,
    pub mobile_banking_name: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub mobile_banking_account_number: Option<String>,
    pub mobile_user_district: Option<String>,
    pub application_time: Option<DateTime<Utc>>,
    pub processing_time: Option<DateTime<Utc>>,
    pub review_remark: Option<String>,
}

impl Withdrawal {
    /// Where the money goes, e.g. "bKash 01700000000"
    pub fn payout_account(&self) -> String {
        let parts: Vec<&str> = match self.withdraw_method {
            Some(WithdrawMethod::BankTransfer) => [
                self.bank_name.as_deref(),
                self.bank_account_number.as_deref(),
                self.branch_name.as_deref(),
            ]
            .into_iter()
            .flatten()
            .collect(),
            Some(WithdrawMethod::MobileBanking) => [
                self.mobile_banking_name.as_deref(),
                self.mobile_banking_account_number.as_deref(),
            ]
            .into_iter()
            .flatten()
            .collect(),
            None => Vec::new(),
        };
        if parts.is_empty() {
            "-".to_string()
        } else {
            parts.join(" ")
        }
    }
}

impl TableRow for Withdrawal {
    fn headers() -> &'static [&'static str] {
        &[
            "User ID",
            "Name",
            "Mobile",
            "Amount",
            "Actual",
            "Account",
            "Status",
            "Applied",
            "Processed",
            "Remark",
        ]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.user_id.to_string(),
            self.name.clone(),
            self.mobile.clone(),
            format_money(&self.amount),
            self.actual_amount.as_ref().map(format_money).unwrap_or_default(),
            self.payout_account(),
            self.transaction_status.to_string(),
            format_time(&self.application_time),
            format_time(&self.processing_time),
            self.review_remark
                .as_deref()
                .map(|r| truncate(r, 32))
                .unwrap_or_default(),
        ]
    }

    fn row_id(&self) -> String {
        self.id.clone()
    }

    fn summarize(rows: &[Self]) -> Vec<SummaryItem> {
        [
            ("Withdrawal successful", TransactionStatus::Approved),
            ("Withdrawal failed", TransactionStatus::Rejected),
            ("Unprocessed", TransactionStatus::Pending),
        ]
        .into_iter()
        .map(|(label, status)| {
            let matching = rows.iter().filter(|w| w.transaction_status == status);
            SummaryItem {
                label: label.to_string(),
                amount: matching
                    .clone()
                    .map(|w| w.actual_amount.unwrap_or_default())
                    .sum(),
                count: matching.count(),
            }
        })
        .collect()
    }
}
