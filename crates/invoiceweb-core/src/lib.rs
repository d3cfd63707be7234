//! List views, result cache and record editing for the invoicing back office

pub mod cache;
pub mod editor;
pub mod error;
pub mod models;
pub mod notify;
pub mod pagination;
pub mod search;
pub mod source;
pub mod store;
pub mod types;
pub mod view;

pub use cache::ResultCache;
pub use editor::RecordEditor;
pub use error::{CoreError, CoreResult, ErrorSeverity};
pub use models::{
    Customer, CustomerDraft, CustomerRef, Invoice, InvoiceDraft, InvoiceSummary, Record, Registration,
};
pub use notify::{Notifier, Toast, ToastKind, ToastQueue};
pub use pagination::{page_count, paginate, Pagination};
pub use search::filter;
pub use source::{Authenticator, DataSource, SourceRef, StaticAuthenticator};
pub use store::{Fixtures, MemoryStore};
pub use types::{InvoiceStatus, RecordId, ViewMessages};
pub use view::{ListPage, ListView, PendingRemoval, ViewOptions, ViewState};
