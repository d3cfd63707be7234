//! List-view controller
//!
//! Holds the local copy of one collection together with the search term,
//! the current page and the loading flag. The filtered and paginated view
//! is never stored: [`ListView::page`] derives it from the state on demand.
//!
//! Deletions are optimistic. [`ListView::begin_remove`] drops the record
//! from the local state and keeps a snapshot of the previous items; the
//! snapshot replaces the items wholesale if the data source refuses the
//! delete.
//!
//! The state lock is never held across an `.await`. Results that resolve
//! after [`ListView::unmount`] (or a new [`ListView::mount`]) are discarded.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use invoiceweb_config::Config;

use crate::cache::ResultCache;
use crate::error::{CoreError, CoreResult, DefaultErrorLogger, ErrorContext, ErrorLogger};
use crate::models::Record;
use crate::notify::Notifier;
use crate::pagination::{page_count, paginate, Pagination};
use crate::search::filter;
use crate::source::SourceRef;
use crate::types::RecordId;

/// Tuning of a list view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewOptions {
    pub page_size: usize,
    /// Clear `is_loading` when a load fails
    pub clear_loading_on_failure: bool,
}

impl ViewOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            page_size: config.page_size(),
            clear_loading_on_failure: config.view.clear_loading_on_failure,
        }
    }
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            page_size: 10,
            clear_loading_on_failure: false,
        }
    }
}

/// Local state of a list view
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState<R> {
    pub items: Vec<R>,
    pub search_term: String,
    pub current_page: usize,
    pub is_loading: bool,
}

impl<R> ViewState<R> {
    pub fn initial() -> Self {
        Self {
            items: Vec::new(),
            search_term: String::new(),
            current_page: 1,
            is_loading: true,
        }
    }
}

/// Filtered and paginated view, ready to render
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListPage<R> {
    pub items: Vec<R>,
    pub search_term: String,
    pub current_page: usize,
    pub page_size: usize,
    /// Number of records matching the search term
    pub filtered_count: usize,
    pub page_count: usize,
    pub show_pagination: bool,
    pub is_loading: bool,
}

impl<R> ListPage<R> {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            current: self.current_page,
            page_count: self.page_count,
        }
    }
}

/// An optimistic removal awaiting the data source's answer
#[derive(Debug)]
#[must_use = "a pending removal must be settled"]
pub struct PendingRemoval<R> {
    id: RecordId,
    snapshot: Vec<R>,
    epoch: u64,
}

impl<R> PendingRemoval<R> {
    pub fn id(&self) -> RecordId {
        self.id
    }
}

/// Controller of one collection's list view
pub struct ListView<R: Record> {
    source: SourceRef<R>,
    notifier: Arc<dyn Notifier>,
    cache: Arc<ResultCache>,
    logger: Arc<dyn ErrorLogger>,
    options: ViewOptions,
    state: RwLock<ViewState<R>>,
    epoch: AtomicU64,
    mounted: AtomicBool,
}

impl<R: Record> ListView<R> {
    pub fn new(
        source: SourceRef<R>,
        notifier: Arc<dyn Notifier>,
        cache: Arc<ResultCache>,
        options: ViewOptions,
    ) -> Self {
        Self {
            source,
            notifier,
            cache,
            logger: Arc::new(DefaultErrorLogger),
            options,
            state: RwLock::new(ViewState::initial()),
            epoch: AtomicU64::new(0),
            mounted: AtomicBool::new(false),
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn ErrorLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn options(&self) -> ViewOptions {
        self.options
    }

    fn read_state(&self) -> RwLockReadGuard<'_, ViewState<R>> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, ViewState<R>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn current_epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.current_epoch() == epoch
    }

    fn cancelled(&self, operation: &str) -> CoreError {
        let error = CoreError::Cancelled {
            operation: operation.to_string(),
        };
        self.logger.log_error(
            &error,
            &ErrorContext::new(operation).with_collection(R::COLLECTION),
        );
        error
    }

    // ==================== Lifecycle ====================

    /// Reset to the initial state; earlier in-flight results are discarded
    pub fn mount(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        *self.write_state() = ViewState::initial();
        self.mounted.store(true, Ordering::SeqCst);
        log::debug!(target: "invoiceweb::view", "Mounted {} view", R::COLLECTION);
    }

    /// Drop the local data and discard in-flight results
    pub fn unmount(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        *self.write_state() = ViewState::initial();
        self.mounted.store(false, Ordering::SeqCst);
        log::debug!(target: "invoiceweb::view", "Unmounted {} view", R::COLLECTION);
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    // ==================== Loading ====================

    /// Fetch the full collection, served from the cache when fresh
    pub async fn load(&self) -> CoreResult<()> {
        let epoch = self.current_epoch();
        if let Some(items) = self.cache.get::<R>(R::COLLECTION) {
            log::debug!(target: "invoiceweb::view", "Serving {} from cache", R::COLLECTION);
            self.apply_loaded(items);
            return Ok(());
        }
        self.fetch(epoch).await
    }

    /// Fetch the full collection from the data source, bypassing the cache
    pub async fn reload(&self) -> CoreResult<()> {
        let epoch = self.current_epoch();
        self.cache.invalidate(R::COLLECTION);
        self.fetch(epoch).await
    }

    async fn fetch(&self, epoch: u64) -> CoreResult<()> {
        match self.source.find_all().await {
            Ok(items) => {
                self.cache.set(R::COLLECTION, items.clone());
                if !self.is_current(epoch) {
                    return Err(self.cancelled("load"));
                }
                log::info!(target: "invoiceweb::view", "Loaded {} {}", items.len(), R::COLLECTION);
                self.apply_loaded(items);
                Ok(())
            }
            Err(source) => {
                if !self.is_current(epoch) {
                    return Err(self.cancelled("load"));
                }
                let error = CoreError::LoadFailure {
                    collection: R::COLLECTION.to_string(),
                    message: source.to_string(),
                };
                self.logger.log_error(
                    &error,
                    &ErrorContext::new("load").with_collection(R::COLLECTION),
                );
                if self.options.clear_loading_on_failure {
                    self.write_state().is_loading = false;
                }
                self.notifier.error(R::MESSAGES.load_failed);
                Err(error)
            }
        }
    }

    fn apply_loaded(&self, items: Vec<R>) {
        let mut state = self.write_state();
        state.items = items;
        state.is_loading = false;
    }

    // ==================== Search and paging ====================

    /// Change the search term; always returns to the first page
    pub fn set_search_term(&self, term: &str) {
        let mut state = self.write_state();
        state.search_term = term.to_string();
        state.current_page = 1;
    }

    pub fn set_page(&self, page: usize) {
        self.write_state().current_page = page;
    }

    /// Copy of the current state
    pub fn state(&self) -> ViewState<R> {
        self.read_state().clone()
    }

    /// Derived view for the current search term and page
    pub fn page(&self) -> ListPage<R> {
        let state = self.read_state();
        self.derive(&state.items, &state.search_term, state.current_page, state.is_loading)
    }

    /// Derived view for an arbitrary term and page, leaving the state untouched
    pub fn query(&self, term: &str, page: usize) -> ListPage<R> {
        let state = self.read_state();
        self.derive(&state.items, term, page, state.is_loading)
    }

    fn derive(&self, items: &[R], term: &str, page: usize, is_loading: bool) -> ListPage<R> {
        let page_size = self.options.page_size;
        let filtered = filter(items, term);
        let visible = paginate(&filtered, page, page_size)
            .iter()
            .map(|record| (*record).clone())
            .collect();

        ListPage {
            items: visible,
            search_term: term.to_string(),
            current_page: page,
            page_size,
            filtered_count: filtered.len(),
            page_count: page_count(filtered.len(), page_size),
            show_pagination: filtered.len() > page_size,
            is_loading,
        }
    }

    // ==================== Optimistic removal ====================

    /// Delete a record: local removal first, then the data source call
    pub async fn remove(&self, id: RecordId) -> CoreResult<()> {
        let pending = self.begin_remove(id)?;
        let outcome = self.source.delete(id).await;
        self.settle_remove(pending, outcome)
    }

    /// Remove the record locally and keep a snapshot for rollback
    pub fn begin_remove(&self, id: RecordId) -> CoreResult<PendingRemoval<R>> {
        let mut state = self.write_state();
        let check = match state.items.iter().find(|record| record.id() == id) {
            Some(record) => record.check_deletable(),
            None => Err(CoreError::NotFound {
                collection: R::COLLECTION.to_string(),
                id,
            }),
        };

        if let Err(error) = check {
            drop(state);
            self.logger.log_error(
                &error,
                &ErrorContext::new("remove").with_collection(R::COLLECTION).with_record(id),
            );
            if matches!(error, CoreError::Conflict { .. }) {
                self.notifier.error(R::MESSAGES.delete_refused);
            }
            return Err(error);
        }

        let snapshot = state.items.clone();
        state.items.retain(|record| record.id() != id);
        log::debug!(target: "invoiceweb::view", "Optimistically removed {} #{}", R::COLLECTION, id);

        Ok(PendingRemoval {
            id,
            snapshot,
            epoch: self.current_epoch(),
        })
    }

    /// Apply the data source's answer to a pending removal
    pub fn settle_remove(&self, pending: PendingRemoval<R>, outcome: CoreResult<()>) -> CoreResult<()> {
        let PendingRemoval { id, snapshot, epoch } = pending;

        match outcome {
            Ok(()) => {
                self.cache.clear();
                if !self.is_current(epoch) {
                    return Err(self.cancelled("remove"));
                }
                log::info!(target: "invoiceweb::view", "Deleted {} #{}", R::COLLECTION, id);
                self.notifier.success(R::MESSAGES.delete_succeeded);
                Ok(())
            }
            Err(source) => {
                if !self.is_current(epoch) {
                    return Err(self.cancelled("remove"));
                }
                self.write_state().items = snapshot;
                let error = CoreError::MutationFailure {
                    collection: R::COLLECTION.to_string(),
                    message: source.to_string(),
                };
                self.logger.log_error(
                    &error,
                    &ErrorContext::new("remove").with_collection(R::COLLECTION).with_record(id),
                );
                self.notifier.error(R::MESSAGES.delete_failed);
                Err(error)
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FakeSource;
    use super::*;
    use crate::models::fixtures::{customer, invoice, invoices};
    use crate::models::{Customer, Invoice, InvoiceSummary};
    use crate::notify::{ToastKind, ToastQueue};
    use crate::source::DataSource;
    use crate::types::InvoiceStatus;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    struct Harness {
        view: Arc<ListView<Invoice>>,
        source: Arc<FakeSource>,
        toasts: Arc<ToastQueue>,
        cache: Arc<ResultCache>,
    }

    fn harness(source: FakeSource, options: ViewOptions) -> Harness {
        let source = Arc::new(source);
        let toasts = Arc::new(ToastQueue::new());
        let cache = Arc::new(ResultCache::default());
        let view = Arc::new(ListView::new(
            source.clone(),
            toasts.clone(),
            cache.clone(),
            options,
        ));
        Harness { view, source, toasts, cache }
    }

    async fn loaded(items: Vec<Invoice>) -> Harness {
        let h = harness(FakeSource::new(items), ViewOptions::default());
        h.view.mount();
        h.view.load().await.unwrap();
        h
    }

    fn ids(items: &[Invoice]) -> Vec<RecordId> {
        items.iter().map(|i| i.id).collect()
    }

    #[tokio::test]
    async fn test_mount_starts_loading_and_load_populates() {
        let h = harness(FakeSource::new(invoices(3)), ViewOptions::default());
        h.view.mount();
        let state = h.view.state();
        assert!(state.is_loading);
        assert!(state.items.is_empty());
        assert_eq!(state.current_page, 1);

        h.view.load().await.unwrap();
        let state = h.view.state();
        assert!(!state.is_loading);
        assert_eq!(ids(&state.items), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_load_failure_keeps_state_and_notifies() {
        let source = FakeSource::new(invoices(3));
        source.fail_load.store(true, Ordering::SeqCst);
        let h = harness(source, ViewOptions::default());
        h.view.mount();

        let err = h.view.load().await.unwrap_err();
        assert!(matches!(err, CoreError::LoadFailure { .. }));
        let state = h.view.state();
        assert!(state.is_loading);
        assert!(state.items.is_empty());

        let toasts = h.toasts.drain();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].kind, ToastKind::Error);
        assert_eq!(toasts[0].message, Invoice::MESSAGES.load_failed);
    }

    #[tokio::test]
    async fn test_load_failure_after_success_keeps_items() {
        let h = loaded(invoices(2)).await;
        h.source.fail_load.store(true, Ordering::SeqCst);
        assert!(h.view.reload().await.is_err());
        assert_eq!(ids(&h.view.state().items), vec![1, 2]);
        assert!(!h.view.state().is_loading);
    }

    #[tokio::test]
    async fn test_load_failure_can_clear_loading_flag() {
        let source = FakeSource::new(invoices(1));
        source.fail_load.store(true, Ordering::SeqCst);
        let options = ViewOptions { clear_loading_on_failure: true, ..ViewOptions::default() };
        let h = harness(source, options);
        h.view.mount();
        assert!(h.view.load().await.is_err());
        assert!(!h.view.state().is_loading);
    }

    #[tokio::test]
    async fn test_second_mount_is_served_from_cache() {
        let h = loaded(invoices(4)).await;
        h.view.mount();
        h.view.load().await.unwrap();
        assert_eq!(h.source.loads.load(Ordering::SeqCst), 1);
        assert_eq!(h.view.state().items.len(), 4);

        h.view.reload().await.unwrap();
        assert_eq!(h.source.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_search_term_resets_page() {
        let h = loaded(invoices(25)).await;
        h.view.set_page(3);
        assert_eq!(h.view.state().current_page, 3);

        h.view.set_search_term("dup");
        assert_eq!(h.view.state().current_page, 1);

        h.view.set_page(2);
        h.view.set_search_term("dup");
        assert_eq!(h.view.state().current_page, 1);
    }

    #[tokio::test]
    async fn test_derived_page() {
        let h = loaded(invoices(25)).await;
        let page = h.view.page();
        assert_eq!(page.items.len(), 10);
        assert_eq!(page.page_count, 3);
        assert!(page.show_pagination);

        h.view.set_page(3);
        assert_eq!(h.view.page().items.len(), 5);
        h.view.set_page(4);
        assert!(h.view.page().items.is_empty());

        // amounts are 100 * id: only 1200 starts with "12"
        h.view.set_search_term("12");
        let page = h.view.page();
        assert_eq!(ids(&page.items), vec![12]);
        assert!(!page.show_pagination);
    }

    #[tokio::test]
    async fn test_query_leaves_state_untouched() {
        let h = loaded(invoices(25)).await;
        h.view.set_page(2);
        let page = h.view.query("", 3);
        assert_eq!(page.items.len(), 5);
        assert_eq!(h.view.state().current_page, 2);
    }

    #[tokio::test]
    async fn test_remove_success_clears_cache_once() {
        let h = loaded(invoices(3)).await;
        assert_eq!(h.cache.clear_count(), 0);

        h.view.remove(2).await.unwrap();
        assert_eq!(ids(&h.view.state().items), vec![1, 3]);
        assert_eq!(h.cache.clear_count(), 1);
        assert!(h.cache.is_empty());

        let toasts = h.toasts.drain();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].message, Invoice::MESSAGES.delete_succeeded);

        // next mount goes back to the source
        h.view.mount();
        h.view.load().await.unwrap();
        assert_eq!(h.source.loads.load(Ordering::SeqCst), 2);
        assert_eq!(ids(&h.view.state().items), vec![1, 3]);
    }

    #[tokio::test]
    async fn test_remove_failure_restores_snapshot() {
        let h = loaded(invoices(3)).await;
        let before = h.view.state().items;
        h.source.fail_delete.store(true, Ordering::SeqCst);

        let err = h.view.remove(2).await.unwrap_err();
        assert!(matches!(err, CoreError::MutationFailure { .. }));
        assert_eq!(h.view.state().items, before);
        assert_eq!(h.cache.clear_count(), 0);

        let toasts = h.toasts.drain();
        assert_eq!(toasts[0].kind, ToastKind::Error);
        assert_eq!(toasts[0].message, Invoice::MESSAGES.delete_failed);
    }

    #[tokio::test]
    async fn test_removal_visible_before_delete_resolves() {
        let gate = Arc::new(Notify::new());
        let mut source = FakeSource::new(invoices(3));
        source.delete_gate = Some(gate.clone());
        let h = harness(source, ViewOptions::default());
        h.view.mount();
        h.view.load().await.unwrap();

        let task = tokio::spawn({
            let view = h.view.clone();
            async move { view.remove(2).await }
        });
        while h.source.deletes.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        assert_eq!(ids(&h.view.page().items), vec![1, 3]);
        assert!(h.toasts.is_empty());

        gate.notify_one();
        task.await.unwrap().unwrap();
        assert_eq!(ids(&h.view.state().items), vec![1, 3]);
    }

    #[tokio::test]
    async fn test_rollback_wins_over_interleaved_changes() {
        let h = loaded(invoices(3)).await;
        let before = h.view.state().items;

        let pending = h.view.begin_remove(1).unwrap();
        assert_eq!(pending.id(), 1);
        h.view.set_search_term("jean");
        let other = h.view.begin_remove(3).unwrap();
        h.view.settle_remove(other, Ok(())).unwrap();
        assert_eq!(ids(&h.view.state().items), vec![2]);

        let err = h
            .view
            .settle_remove(pending, Err(CoreError::Transport { message: "boom".to_string() }))
            .unwrap_err();
        assert!(matches!(err, CoreError::MutationFailure { .. }));
        assert_eq!(h.view.state().items, before);
        assert_eq!(h.view.state().search_term, "jean");
    }

    #[tokio::test]
    async fn test_remove_unknown_id() {
        let h = loaded(invoices(2)).await;
        let err = h.view.remove(99).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
        assert_eq!(h.source.deletes.load(Ordering::SeqCst), 0);
        assert!(h.toasts.is_empty());
    }

    #[tokio::test]
    async fn test_unmount_discards_inflight_load() {
        let gate = Arc::new(Notify::new());
        let mut source = FakeSource::new(invoices(3));
        source.load_gate = Some(gate.clone());
        let h = harness(source, ViewOptions::default());
        h.view.mount();

        let task = tokio::spawn({
            let view = h.view.clone();
            async move { view.load().await }
        });
        while h.source.loads.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        h.view.unmount();
        gate.notify_one();

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, CoreError::Cancelled { .. }));
        assert!(!h.view.is_mounted());
        assert!(h.view.state().items.is_empty());
        assert!(h.toasts.is_empty());
        // the fetched data is still valid for the next mount
        assert_eq!(h.cache.get::<Invoice>("invoices").map(|v| v.len()), Some(3));
    }

    #[tokio::test]
    async fn test_unmount_discards_inflight_delete_failure() {
        let gate = Arc::new(Notify::new());
        let mut source = FakeSource::new(invoices(3));
        source.delete_gate = Some(gate.clone());
        source.fail_delete.store(true, Ordering::SeqCst);
        let h = harness(source, ViewOptions::default());
        h.view.mount();
        h.view.load().await.unwrap();

        let task = tokio::spawn({
            let view = h.view.clone();
            async move { view.remove(1).await }
        });
        while h.source.deletes.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        h.view.unmount();
        gate.notify_one();

        assert!(matches!(task.await.unwrap(), Err(CoreError::Cancelled { .. })));
        assert!(h.view.state().items.is_empty());
        assert!(h.toasts.is_empty());
    }

    #[tokio::test]
    async fn test_status_scenario() {
        let h = loaded(vec![
            invoice(1, 900, InvoiceStatus::Paid, "Alice", "Martin"),
            invoice(2, 800, InvoiceStatus::Sent, "Bruno", "Leroy"),
            invoice(3, 700, InvoiceStatus::Cancelled, "Chloé", "Dubois"),
        ])
        .await;
        h.view.set_search_term("PAY");
        assert_eq!(ids(&h.view.page().items), vec![1]);
    }

    struct CustomerSource(Mutex<Vec<Customer>>);

    #[async_trait]
    impl DataSource<Customer> for CustomerSource {
        async fn find_all(&self) -> CoreResult<Vec<Customer>> {
            Ok(self.0.lock().unwrap().clone())
        }
        async fn find(&self, id: RecordId) -> CoreResult<Customer> {
            Err(CoreError::NotFound { collection: "customers".to_string(), id })
        }
        async fn delete(&self, id: RecordId) -> CoreResult<()> {
            self.0.lock().unwrap().retain(|c| c.id != id);
            Ok(())
        }
        async fn create(&self, _draft: &crate::models::CustomerDraft) -> CoreResult<Customer> {
            unreachable!()
        }
        async fn update(&self, _id: RecordId, _draft: &crate::models::CustomerDraft) -> CoreResult<Customer> {
            unreachable!()
        }
    }

    #[tokio::test]
    async fn test_customer_with_invoices_is_not_removed() {
        let owed = InvoiceSummary { id: 9, amount: Decimal::from(10), status: InvoiceStatus::Sent };
        let source = Arc::new(CustomerSource(Mutex::new(vec![
            customer(1, "Alice", "Martin", vec![owed]),
            customer(2, "Bruno", "Leroy", vec![]),
        ])));
        let toasts = Arc::new(ToastQueue::new());
        let cache = Arc::new(ResultCache::default());
        let view = ListView::new(source, toasts.clone(), cache.clone(), ViewOptions::default());
        view.mount();
        view.load().await.unwrap();

        let err = view.remove(1).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict { .. }));
        assert_eq!(view.state().items.len(), 2);
        assert_eq!(toasts.drain()[0].message, Customer::MESSAGES.delete_refused);

        view.remove(2).await.unwrap();
        assert_eq!(view.state().items.len(), 1);
        assert_eq!(cache.clear_count(), 1);
    }
}
