//! JSON-LD (Hydra) payloads of the REST API
//!
//! Collections arrive either as a bare JSON array or wrapped in a Hydra
//! document under `hydra:member`. Relations are written as IRIs.

use rust_decimal::prelude::ToPrimitive;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use invoiceweb_core::{Customer, CustomerDraft, Invoice, InvoiceDraft, Record, RecordId};

#[derive(Deserialize)]
#[serde(untagged)]
enum Collection<T> {
    Hydra {
        #[serde(rename = "hydra:member")]
        member: Vec<T>,
    },
    Plain(Vec<T>),
}

/// Decode a collection response
pub fn decode_collection<T: DeserializeOwned>(body: &[u8]) -> serde_json::Result<Vec<T>> {
    let collection: Collection<T> = serde_json::from_slice(body)?;
    Ok(match collection {
        Collection::Hydra { member } => member,
        Collection::Plain(items) => items,
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Violation {
    property_path: String,
    message: String,
}

#[derive(Deserialize)]
struct ViolationList {
    #[serde(default)]
    violations: Vec<Violation>,
}

/// First constraint violation of a 400/422 response body
pub fn first_violation(body: &str) -> Option<(String, String)> {
    let list: ViolationList = serde_json::from_str(body).ok()?;
    list.violations
        .into_iter()
        .next()
        .map(|v| (v.property_path, v.message))
}

/// A record type exposed by the REST API
pub trait Resource: Record + DeserializeOwned {
    /// Collection path, e.g. `/api/invoices`
    const PATH: &'static str;

    /// Request body of create and update calls
    fn payload(draft: &Self::Draft) -> Value;

    fn iri(id: RecordId) -> String {
        format!("{}/{}", Self::PATH, id)
    }
}

impl Resource for Invoice {
    const PATH: &'static str = "/api/invoices";

    fn payload(draft: &InvoiceDraft) -> Value {
        json!({
            "amount": draft.amount.to_f64().unwrap_or_default(),
            "status": draft.status.to_string(),
            "customer": Customer::iri(draft.customer_id),
        })
    }
}

impl Resource for Customer {
    const PATH: &'static str = "/api/customers";

    fn payload(draft: &CustomerDraft) -> Value {
        json!({
            "firstName": draft.first_name.trim(),
            "lastName": draft.last_name.trim(),
            "email": draft.email.trim(),
            "company": draft.company.as_deref().map(str::trim).filter(|c| !c.is_empty()),
        })
    }
}
