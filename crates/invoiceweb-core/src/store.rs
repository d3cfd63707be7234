//! In-memory data source seeded from a YAML fixture file

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{CoreError, CoreResult};
use crate::models::{
    Customer, CustomerDraft, CustomerRef, Invoice, InvoiceDraft, InvoiceSummary, Record,
};
use crate::source::DataSource;
use crate::types::{InvoiceStatus, RecordId};

/// Customer row of a fixture file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerFixture {
    pub id: RecordId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub company: Option<String>,
}

/// Invoice row of a fixture file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceFixture {
    pub id: RecordId,
    pub chrono: u32,
    pub amount: Decimal,
    pub sent_at: DateTime<Utc>,
    pub status: InvoiceStatus,
    pub customer_id: RecordId,
}

/// Contents of a fixture file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fixtures {
    #[serde(default)]
    pub customers: Vec<CustomerFixture>,
    #[serde(default)]
    pub invoices: Vec<InvoiceFixture>,
}

#[derive(Debug)]
struct StoreData {
    customers: Vec<CustomerFixture>,
    invoices: Vec<InvoiceFixture>,
    next_customer_id: RecordId,
    next_invoice_id: RecordId,
}

impl StoreData {
    fn customer_ref(&self, id: RecordId) -> Option<CustomerRef> {
        self.customers.iter().find(|c| c.id == id).map(|c| CustomerRef {
            id: c.id,
            first_name: c.first_name.clone(),
            last_name: c.last_name.clone(),
        })
    }

    fn invoice(&self, row: &InvoiceFixture) -> CoreResult<Invoice> {
        let customer = self
            .customer_ref(row.customer_id)
            .ok_or_else(|| CoreError::InvalidFormat {
                message: format!("invoice #{} references unknown customer #{}", row.id, row.customer_id),
            })?;
        Ok(Invoice {
            id: row.id,
            chrono: row.chrono,
            amount: row.amount,
            sent_at: row.sent_at,
            status: row.status,
            customer,
        })
    }

    fn customer(&self, row: &CustomerFixture) -> Customer {
        Customer {
            id: row.id,
            first_name: row.first_name.clone(),
            last_name: row.last_name.clone(),
            email: row.email.clone(),
            company: row.company.clone(),
            invoices: self
                .invoices
                .iter()
                .filter(|i| i.customer_id == row.id)
                .map(|i| InvoiceSummary {
                    id: i.id,
                    amount: i.amount,
                    status: i.status,
                })
                .collect(),
        }
    }

    fn require_customer(&self, id: RecordId) -> CoreResult<()> {
        if self.customers.iter().any(|c| c.id == id) {
            Ok(())
        } else {
            Err(CoreError::Validation {
                field: "customer".to_string(),
                message: format!("customer #{} does not exist", id),
            })
        }
    }
}

fn not_found(collection: &str, id: RecordId) -> CoreError {
    CoreError::NotFound {
        collection: collection.to_string(),
        id,
    }
}

/// Data source holding both collections in memory
#[derive(Debug)]
pub struct MemoryStore {
    data: RwLock<StoreData>,
}

impl MemoryStore {
    /// Build a store; every invoice must reference an existing customer
    pub fn new(fixtures: Fixtures) -> CoreResult<Self> {
        let Fixtures { customers, invoices } = fixtures;

        for invoice in &invoices {
            if !customers.iter().any(|c| c.id == invoice.customer_id) {
                return Err(CoreError::InvalidFormat {
                    message: format!(
                        "invoice #{} references unknown customer #{}",
                        invoice.id, invoice.customer_id
                    ),
                });
            }
        }

        let next_customer_id = customers.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        let next_invoice_id = invoices.iter().map(|i| i.id).max().unwrap_or(0) + 1;
        log::info!(
            target: "invoiceweb::store",
            "Memory store seeded with {} customer(s) and {} invoice(s)",
            customers.len(),
            invoices.len()
        );

        Ok(Self {
            data: RwLock::new(StoreData {
                customers,
                invoices,
                next_customer_id,
                next_invoice_id,
            }),
        })
    }

    pub fn empty() -> Self {
        Self {
            data: RwLock::new(StoreData {
                customers: Vec::new(),
                invoices: Vec::new(),
                next_customer_id: 1,
                next_invoice_id: 1,
            }),
        }
    }

    pub fn from_yaml(content: &str) -> CoreResult<Self> {
        let fixtures: Fixtures = serde_yaml::from_str(content).map_err(|e| CoreError::InvalidFormat {
            message: e.to_string(),
        })?;
        Self::new(fixtures)
    }

    /// Read a fixture file
    pub async fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            log::error!(target: "invoiceweb::store", "Cannot read {}: {}", path.display(), e);
            CoreError::Io {
                path: path.display().to_string(),
            }
        })?;
        Self::from_yaml(&content)
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreData> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreData> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl DataSource<Invoice> for MemoryStore {
    async fn find_all(&self) -> CoreResult<Vec<Invoice>> {
        let data = self.read();
        data.invoices.iter().map(|row| data.invoice(row)).collect()
    }

    async fn find(&self, id: RecordId) -> CoreResult<Invoice> {
        let data = self.read();
        let row = data
            .invoices
            .iter()
            .find(|i| i.id == id)
            .ok_or_else(|| not_found(Invoice::COLLECTION, id))?;
        data.invoice(row)
    }

    async fn delete(&self, id: RecordId) -> CoreResult<()> {
        let mut data = self.write();
        let before = data.invoices.len();
        data.invoices.retain(|i| i.id != id);
        if data.invoices.len() == before {
            return Err(not_found(Invoice::COLLECTION, id));
        }
        Ok(())
    }

    async fn create(&self, draft: &InvoiceDraft) -> CoreResult<Invoice> {
        Invoice::validate(draft)?;
        let mut data = self.write();
        data.require_customer(draft.customer_id)?;

        let id = data.next_invoice_id;
        data.next_invoice_id += 1;
        let chrono = data.invoices.iter().map(|i| i.chrono).max().unwrap_or(0) + 1;
        let row = InvoiceFixture {
            id,
            chrono,
            amount: draft.amount,
            sent_at: Utc::now(),
            status: draft.status,
            customer_id: draft.customer_id,
        };
        let invoice = data.invoice(&row)?;
        data.invoices.push(row);
        Ok(invoice)
    }

    async fn update(&self, id: RecordId, draft: &InvoiceDraft) -> CoreResult<Invoice> {
        Invoice::validate(draft)?;
        let mut data = self.write();
        data.require_customer(draft.customer_id)?;

        let row = data
            .invoices
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| not_found(Invoice::COLLECTION, id))?;
        row.amount = draft.amount;
        row.status = draft.status;
        row.customer_id = draft.customer_id;
        let row = row.clone();
        data.invoice(&row)
    }
}

#[async_trait]
impl DataSource<Customer> for MemoryStore {
    async fn find_all(&self) -> CoreResult<Vec<Customer>> {
        let data = self.read();
        Ok(data.customers.iter().map(|row| data.customer(row)).collect())
    }

    async fn find(&self, id: RecordId) -> CoreResult<Customer> {
        let data = self.read();
        data.customers
            .iter()
            .find(|c| c.id == id)
            .map(|row| data.customer(row))
            .ok_or_else(|| not_found(Customer::COLLECTION, id))
    }

    async fn delete(&self, id: RecordId) -> CoreResult<()> {
        let mut data = self.write();
        let row = data
            .customers
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| not_found(Customer::COLLECTION, id))?;
        data.customer(row).check_deletable()?;
        data.customers.retain(|c| c.id != id);
        Ok(())
    }

    async fn create(&self, draft: &CustomerDraft) -> CoreResult<Customer> {
        Customer::validate(draft)?;
        let mut data = self.write();
        let id = data.next_customer_id;
        data.next_customer_id += 1;
        let row = CustomerFixture {
            id,
            first_name: draft.first_name.trim().to_string(),
            last_name: draft.last_name.trim().to_string(),
            email: draft.email.trim().to_string(),
            company: draft.company.clone().filter(|c| !c.trim().is_empty()),
        };
        let customer = data.customer(&row);
        data.customers.push(row);
        Ok(customer)
    }

    async fn update(&self, id: RecordId, draft: &CustomerDraft) -> CoreResult<Customer> {
        Customer::validate(draft)?;
        let mut data = self.write();
        let row = data
            .customers
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| not_found(Customer::COLLECTION, id))?;
        row.first_name = draft.first_name.trim().to_string();
        row.last_name = draft.last_name.trim().to_string();
        row.email = draft.email.trim().to_string();
        row.company = draft.company.clone().filter(|c| !c.trim().is_empty());
        let row = row.clone();
        Ok(data.customer(&row))
    }
}
