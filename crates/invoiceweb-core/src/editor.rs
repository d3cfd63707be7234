//! Single-record editing: fetch for the form, validate and save

use std::sync::Arc;

use crate::cache::ResultCache;
use crate::error::{CoreError, CoreResult, DefaultErrorLogger, ErrorContext, ErrorLogger};
use crate::models::Record;
use crate::notify::Notifier;
use crate::source::SourceRef;
use crate::types::RecordId;

/// Create and update operations of one collection
pub struct RecordEditor<R: Record> {
    source: SourceRef<R>,
    notifier: Arc<dyn Notifier>,
    cache: Arc<ResultCache>,
    logger: Arc<dyn ErrorLogger>,
}

impl<R: Record> RecordEditor<R> {
    pub fn new(source: SourceRef<R>, notifier: Arc<dyn Notifier>, cache: Arc<ResultCache>) -> Self {
        Self {
            source,
            notifier,
            cache,
            logger: Arc::new(DefaultErrorLogger),
        }
    }

    /// Record to prefill the edit form with
    pub async fn fetch(&self, id: RecordId) -> CoreResult<R> {
        match self.source.find(id).await {
            Ok(record) => Ok(record),
            Err(error @ CoreError::NotFound { .. }) => {
                self.logger.log_error(&error, &self.context("fetch", Some(id)));
                Err(error)
            }
            Err(source) => {
                let error = CoreError::LoadFailure {
                    collection: R::COLLECTION.to_string(),
                    message: source.to_string(),
                };
                self.logger.log_error(&error, &self.context("fetch", Some(id)));
                self.notifier.error(R::MESSAGES.fetch_failed);
                Err(error)
            }
        }
    }

    /// Create (`id` is `None`) or update a record.
    ///
    /// The draft is validated before any call to the data source. A
    /// successful save clears the result cache.
    pub async fn save(&self, id: Option<RecordId>, draft: &R::Draft) -> CoreResult<R> {
        if let Err(error) = R::validate(draft) {
            self.logger.log_error(&error, &self.context("save", id));
            self.notifier.error(R::MESSAGES.form_invalid);
            return Err(error);
        }

        let outcome = match id {
            Some(id) => self.source.update(id, draft).await,
            None => self.source.create(draft).await,
        };

        match outcome {
            Ok(record) => {
                self.cache.clear();
                log::info!(
                    target: "invoiceweb::editor",
                    "Saved {} #{}",
                    R::COLLECTION,
                    record.id()
                );
                self.notifier.success(R::MESSAGES.save_succeeded);
                Ok(record)
            }
            Err(error @ CoreError::Validation { .. }) => {
                self.logger.log_error(&error, &self.context("save", id));
                self.notifier.error(R::MESSAGES.form_invalid);
                Err(error)
            }
            Err(error @ CoreError::NotFound { .. }) => {
                self.logger.log_error(&error, &self.context("save", id));
                self.notifier.error(R::MESSAGES.save_failed);
                Err(error)
            }
            Err(source) => {
                let error = CoreError::MutationFailure {
                    collection: R::COLLECTION.to_string(),
                    message: source.to_string(),
                };
                self.logger.log_error(&error, &self.context("save", id));
                self.notifier.error(R::MESSAGES.save_failed);
                Err(error)
            }
        }
    }

    fn context(&self, operation: &str, id: Option<RecordId>) -> ErrorContext {
        let context = ErrorContext::new(operation).with_collection(R::COLLECTION);
        match id {
            Some(id) => context.with_record(id),
            None => context,
        }
    }
}
