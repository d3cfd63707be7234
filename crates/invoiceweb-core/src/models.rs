//! Core data models: invoices, customers and their drafts

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::{InvoiceStatus, RecordId, ViewMessages};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex")
});

/// An entity a list view can hold
pub trait Record: Clone + Send + Sync + 'static {
    /// Input of create and update operations
    type Draft: Clone + Send + Sync + 'static;

    /// Collection identifier, also the cache key
    const COLLECTION: &'static str;

    /// Notification texts
    const MESSAGES: ViewMessages;

    fn id(&self) -> RecordId;

    /// Search predicate; `needle` is already lowercased
    fn matches(&self, needle: &str) -> bool;

    /// Refuse deletion of records other records still depend on
    fn check_deletable(&self) -> CoreResult<()> {
        Ok(())
    }

    fn validate(draft: &Self::Draft) -> CoreResult<()>;
}

// ==================== Invoices ====================

/// Customer fields embedded in an invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRef {
    pub id: RecordId,
    pub first_name: String,
    pub last_name: String,
}

impl CustomerRef {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Invoice information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: RecordId,
    /// Sequential invoice number
    pub chrono: u32,
    pub amount: Decimal,
    pub sent_at: DateTime<Utc>,
    pub status: InvoiceStatus,
    pub customer: CustomerRef,
}

impl Invoice {
    /// Amount as plain decimal text, without trailing zeros (`1500`, `1500.5`)
    pub fn amount_text(&self) -> String {
        self.amount.normalize().to_string()
    }
}

impl Record for Invoice {
    type Draft = InvoiceDraft;

    const COLLECTION: &'static str = "invoices";

    const MESSAGES: ViewMessages = ViewMessages {
        load_failed: "Chargement des factures : échoué",
        fetch_failed: "Chargement de la facture : échoué",
        delete_succeeded: "Suppression de la facture : réussie",
        delete_failed: "Suppression de la facture : échouée",
        delete_refused: "Suppression de la facture : refusée",
        save_succeeded: "Enregistrement de la facture : réussi",
        save_failed: "Enregistrement de la facture : échoué",
        form_invalid: "Des erreurs dans votre formulaire",
    };

    fn id(&self) -> RecordId {
        self.id
    }

    // Names and status label match anywhere; the amount only as a prefix.
    fn matches(&self, needle: &str) -> bool {
        let name = format!(
            "{} {}",
            self.customer.first_name.to_lowercase(),
            self.customer.last_name.to_lowercase()
        );
        name.contains(needle)
            || self.status.label().to_lowercase().contains(needle)
            || self.amount_text().starts_with(needle)
    }

    fn validate(draft: &InvoiceDraft) -> CoreResult<()> {
        if draft.amount <= Decimal::ZERO {
            return Err(CoreError::Validation {
                field: "amount".to_string(),
                message: "amount must be greater than 0".to_string(),
            });
        }
        if draft.customer_id == 0 {
            return Err(CoreError::Validation {
                field: "customer".to_string(),
                message: "a customer must be selected".to_string(),
            });
        }
        Ok(())
    }
}

/// Create/update input for invoices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDraft {
    pub amount: Decimal,
    pub status: InvoiceStatus,
    pub customer_id: RecordId,
}

impl Default for InvoiceDraft {
    fn default() -> Self {
        Self {
            amount: Decimal::ZERO,
            status: InvoiceStatus::Sent,
            customer_id: 0,
        }
    }
}

impl From<&Invoice> for InvoiceDraft {
    fn from(invoice: &Invoice) -> Self {
        Self {
            amount: invoice.amount,
            status: invoice.status,
            customer_id: invoice.customer.id,
        }
    }
}

// ==================== Customers ====================

/// Invoice fields embedded in a customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceSummary {
    pub id: RecordId,
    pub amount: Decimal,
    pub status: InvoiceStatus,
}

/// Customer information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: RecordId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub invoices: Vec<InvoiceSummary>,
}

impl Customer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Sum of all invoice amounts
    pub fn total_amount(&self) -> Decimal {
        self.invoices.iter().map(|i| i.amount).sum()
    }

    /// Sum of invoices still awaiting payment
    pub fn unpaid_amount(&self) -> Decimal {
        self.invoices
            .iter()
            .filter(|i| i.status.is_unpaid())
            .map(|i| i.amount)
            .sum()
    }

    pub fn to_ref(&self) -> CustomerRef {
        CustomerRef {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }
}

impl Record for Customer {
    type Draft = CustomerDraft;

    const COLLECTION: &'static str = "customers";

    const MESSAGES: ViewMessages = ViewMessages {
        load_failed: "Chargement des clients : échoué",
        fetch_failed: "Chargement du client : échoué",
        delete_succeeded: "Suppression du client : réussie",
        delete_failed: "Suppression du client : échouée",
        delete_refused: "Impossible de supprimer un client qui possède des factures",
        save_succeeded: "Enregistrement du client : réussi",
        save_failed: "Enregistrement du client : échoué",
        form_invalid: "Des erreurs dans votre formulaire",
    };

    fn id(&self) -> RecordId {
        self.id
    }

    fn matches(&self, needle: &str) -> bool {
        self.first_name.to_lowercase().contains(needle)
            || self.last_name.to_lowercase().contains(needle)
            || self.email.to_lowercase().contains(needle)
            || self
                .company
                .as_deref()
                .map_or(false, |c| c.to_lowercase().contains(needle))
    }

    fn check_deletable(&self) -> CoreResult<()> {
        if self.invoices.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Conflict {
                message: format!(
                    "customer #{} still owns {} invoice(s)",
                    self.id,
                    self.invoices.len()
                ),
            })
        }
    }

    fn validate(draft: &CustomerDraft) -> CoreResult<()> {
        validate_person(&draft.first_name, &draft.last_name, &draft.email)
    }
}

fn invalid(field: &str, message: &str) -> CoreError {
    CoreError::Validation {
        field: field.to_string(),
        message: message.to_string(),
    }
}

/// Name and email rules shared by customers and user accounts
fn validate_person(first_name: &str, last_name: &str, email: &str) -> CoreResult<()> {
    if first_name.trim().chars().count() < 3 {
        return Err(invalid("firstName", "first name must be at least 3 characters"));
    }
    if last_name.trim().chars().count() < 3 {
        return Err(invalid("lastName", "last name must be at least 3 characters"));
    }
    if !EMAIL_RE.is_match(email.trim()) {
        return Err(invalid("email", "email address is not valid"));
    }
    Ok(())
}

/// Create/update input for customers
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub company: Option<String>,
}

impl From<&Customer> for CustomerDraft {
    fn from(customer: &Customer) -> Self {
        Self {
            first_name: customer.first_name.clone(),
            last_name: customer.last_name.clone(),
            email: customer.email.clone(),
            company: customer.company.clone(),
        }
    }
}

/// Sign-up form of a new user account
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
}

impl Registration {
    pub fn validate(&self) -> CoreResult<()> {
        validate_person(&self.first_name, &self.last_name, &self.email)?;
        if self.password.is_empty() {
            return Err(invalid("password", "password is required"));
        }
        if self.password != self.password_confirm {
            return Err(invalid("passwordConfirm", "password confirmation does not match"));
        }
        Ok(())
    }

    /// Email used as the login name
    pub fn username(&self) -> &str {
        self.email.trim()
    }
}

// passwords stay out of logs
impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::TimeZone;

    pub fn invoice(id: RecordId, amount: i64, status: InvoiceStatus, first: &str, last: &str) -> Invoice {
        Invoice {
            id,
            chrono: id as u32,
            amount: Decimal::from(amount),
            sent_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
            status,
            customer: CustomerRef {
                id: 100 + id,
                first_name: first.to_string(),
                last_name: last.to_string(),
            },
        }
    }

    pub fn invoices(count: usize) -> Vec<Invoice> {
        (1..=count as u64)
            .map(|id| invoice(id, 100 * id as i64, InvoiceStatus::Sent, "Jean", "Dupont"))
            .collect()
    }

    pub fn customer(id: RecordId, first: &str, last: &str, invoices: Vec<InvoiceSummary>) -> Customer {
        Customer {
            id,
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: format!("{}@example.com", first.to_lowercase()),
            company: None,
            invoices,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_invoice_matches_customer_name_substring() {
        let inv = invoice(1, 1500, InvoiceStatus::Sent, "Marie", "Curie");
        assert!(inv.matches("rie cu"));
        assert!(inv.matches("curie"));
        assert!(!inv.matches("pierre"));
    }

    #[test]
    fn test_invoice_matches_status_label() {
        let paid = invoice(1, 10, InvoiceStatus::Paid, "Ada", "Lovelace");
        let sent = invoice(2, 10, InvoiceStatus::Sent, "Ada", "Lovelace");
        assert!(paid.matches("pay"));
        assert!(!sent.matches("pay"));
        assert!(sent.matches("envoy"));
    }

    #[test]
    fn test_invoice_amount_is_prefix_only() {
        let inv = invoice(1, 1500, InvoiceStatus::Sent, "Ada", "Lovelace");
        assert!(inv.matches("15"));
        assert!(inv.matches("1500"));
        assert!(!inv.matches("500"));
    }

    #[test]
    fn test_amount_text_drops_trailing_zeros() {
        let mut inv = invoice(1, 0, InvoiceStatus::Sent, "Ada", "Lovelace");
        inv.amount = Decimal::from_str("1500.50").unwrap();
        assert_eq!(inv.amount_text(), "1500.5");
        inv.amount = Decimal::from_str("1500.00").unwrap();
        assert_eq!(inv.amount_text(), "1500");
    }

    #[test]
    fn test_invoice_decodes_api_json() {
        let json = r#"{
            "id": 12,
            "chrono": 3,
            "amount": 2450.5,
            "sentAt": "2020-01-10T00:00:00+01:00",
            "status": "PAID",
            "customer": {"id": 4, "firstName": "Lior", "lastName": "Martin"}
        }"#;
        let inv: Invoice = serde_json::from_str(json).unwrap();
        assert_eq!(inv.id, 12);
        assert_eq!(inv.status, InvoiceStatus::Paid);
        assert_eq!(inv.customer.full_name(), "Lior Martin");
        assert_eq!(inv.amount_text(), "2450.5");
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let json = r#"{"id":1,"chrono":1,"amount":1,"sentAt":"2020-01-10T00:00:00Z",
            "status":"DRAFT","customer":{"id":1,"firstName":"a","lastName":"b"}}"#;
        assert!(serde_json::from_str::<Invoice>(json).is_err());
    }

    #[test]
    fn test_invoice_draft_validation() {
        let mut draft = InvoiceDraft {
            amount: Decimal::from(120),
            status: InvoiceStatus::Sent,
            customer_id: 3,
        };
        assert!(Invoice::validate(&draft).is_ok());

        draft.amount = Decimal::ZERO;
        match Invoice::validate(&draft) {
            Err(CoreError::Validation { field, .. }) => assert_eq!(field, "amount"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_customer_matches_any_field() {
        let mut c = customer(1, "Alice", "Martin", vec![]);
        c.company = Some("Acme SARL".to_string());
        assert!(c.matches("ali"));
        assert!(c.matches("mart"));
        assert!(c.matches("example.com"));
        assert!(c.matches("acme"));
        assert!(!c.matches("zorg"));
    }

    #[test]
    fn test_customer_amounts_and_deletability() {
        let c = customer(
            1,
            "Alice",
            "Martin",
            vec![
                InvoiceSummary { id: 1, amount: Decimal::from(100), status: InvoiceStatus::Paid },
                InvoiceSummary { id: 2, amount: Decimal::from(40), status: InvoiceStatus::Sent },
                InvoiceSummary { id: 3, amount: Decimal::from(5), status: InvoiceStatus::Cancelled },
            ],
        );
        assert_eq!(c.total_amount(), Decimal::from(145));
        assert_eq!(c.unpaid_amount(), Decimal::from(40));
        assert!(matches!(c.check_deletable(), Err(CoreError::Conflict { .. })));

        let empty = customer(2, "Bob", "Durand", vec![]);
        assert!(empty.check_deletable().is_ok());
    }

    #[test]
    fn test_customer_draft_validation() {
        let draft = CustomerDraft {
            first_name: "Alice".to_string(),
            last_name: "Martin".to_string(),
            email: "alice@example.com".to_string(),
            company: None,
        };
        assert!(Customer::validate(&draft).is_ok());

        let bad_email = CustomerDraft { email: "alice.example.com".to_string(), ..draft.clone() };
        match Customer::validate(&bad_email) {
            Err(CoreError::Validation { field, .. }) => assert_eq!(field, "email"),
            other => panic!("unexpected: {:?}", other),
        }

        let short = CustomerDraft { first_name: "Al".to_string(), ..draft };
        assert!(Customer::validate(&short).is_err());
    }

    #[test]
    fn test_registration_validation() {
        let registration = Registration {
            first_name: "Chloé".to_string(),
            last_name: "Durand".to_string(),
            email: " chloe@example.com ".to_string(),
            password: "s3cret".to_string(),
            password_confirm: "s3cret".to_string(),
        };
        assert!(registration.validate().is_ok());
        assert_eq!(registration.username(), "chloe@example.com");

        let field_of = |r: &Registration| match r.validate() {
            Err(CoreError::Validation { field, .. }) => field,
            other => panic!("unexpected: {:?}", other),
        };
        let mismatch = Registration { password_confirm: "secret".to_string(), ..registration.clone() };
        assert_eq!(field_of(&mismatch), "passwordConfirm");
        let empty = Registration { password: String::new(), password_confirm: String::new(), ..registration.clone() };
        assert_eq!(field_of(&empty), "password");
        let bad_email = Registration { email: "chloe".to_string(), ..registration.clone() };
        assert_eq!(field_of(&bad_email), "email");

        assert!(!format!("{:?}", registration).contains("s3cret"));
    }
}
