//! Basic types shared by records and views

use serde::{Deserialize, Serialize};

/// Record identity
pub type RecordId = u64;

/// Invoice status enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    /// Invoice has been paid
    Paid,
    /// Invoice was sent and awaits payment
    Sent,
    /// Invoice was cancelled
    Cancelled,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 3] = [InvoiceStatus::Sent, InvoiceStatus::Paid, InvoiceStatus::Cancelled];

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            InvoiceStatus::Paid => "Payée",
            InvoiceStatus::Sent => "envoyée",
            InvoiceStatus::Cancelled => "annulée",
        }
    }

    /// Visual class of the status badge
    pub fn css_class(&self) -> &'static str {
        match self {
            InvoiceStatus::Paid => "success",
            InvoiceStatus::Sent => "primary",
            InvoiceStatus::Cancelled => "danger",
        }
    }

    /// Whether the amount still counts as owed
    pub fn is_unpaid(&self) -> bool {
        matches!(self, InvoiceStatus::Sent)
    }
}

impl std::str::FromStr for InvoiceStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PAID" => Ok(InvoiceStatus::Paid),
            "SENT" => Ok(InvoiceStatus::Sent),
            "CANCELLED" => Ok(InvoiceStatus::Cancelled),
            _ => Err(format!("Invalid invoice status: {}", s)),
        }
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvoiceStatus::Paid => write!(f, "PAID"),
            InvoiceStatus::Sent => write!(f, "SENT"),
            InvoiceStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// User-facing notification texts of one collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewMessages {
    pub load_failed: &'static str,
    pub fetch_failed: &'static str,
    pub delete_succeeded: &'static str,
    pub delete_failed: &'static str,
    pub delete_refused: &'static str,
    pub save_succeeded: &'static str,
    pub save_failed: &'static str,
    pub form_invalid: &'static str,
}
