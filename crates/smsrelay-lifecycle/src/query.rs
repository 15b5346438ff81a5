// SPDX-FileCopyrightText: 2026 smsrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only, paginated listing of messages.

use std::sync::Arc;

use smsrelay_core::types::DEFAULT_PAGE;
use smsrelay_core::{
    ChatId, Message, MessageFilter, MessageStore, Page, PageRequest, SmsRelayError, SortOrder,
};
use tracing::{debug, error};

/// Lists messages newest first, one page at a time.
#[derive(Clone)]
pub struct QueryEngine {
    store: Arc<dyn MessageStore>,
    default_limit: u32,
}

impl QueryEngine {
    pub fn new(store: Arc<dyn MessageStore>, default_limit: u32) -> Self {
        Self {
            store,
            default_limit: default_limit.max(1),
        }
    }

    /// Build a page request, filling in defaults for omitted values.
    pub fn page_request(
        &self,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<PageRequest, SmsRelayError> {
        PageRequest::new(
            page.unwrap_or(DEFAULT_PAGE),
            limit.unwrap_or(self.default_limit),
        )
    }

    /// Messages matching `filter`, plus the total number of matches.
    pub async fn list(
        &self,
        filter: &MessageFilter,
        page: PageRequest,
    ) -> Result<Page<Message>, SmsRelayError> {
        let (items, total) = tokio::try_join!(
            self.store
                .find_many(filter, SortOrder::NewestFirst, page.skip(), page.limit()),
            self.store.count(filter),
        )
        .inspect_err(|e| error!(error = %e, "message listing failed"))?;

        debug!(
            page = page.page(),
            limit = page.limit(),
            returned = items.len(),
            total,
            "messages listed"
        );
        Ok(Page {
            items,
            total,
            page: page.page(),
            limit: page.limit(),
        })
    }

    /// Messages of one conversation.
    pub async fn list_by_chat(
        &self,
        chat_id: &ChatId,
        page: PageRequest,
    ) -> Result<Page<Message>, SmsRelayError> {
        if chat_id.as_str().trim().is_empty() {
            return Err(SmsRelayError::invalid("chatId", "must not be blank"));
        }
        self.list(&MessageFilter::by_chat(chat_id.clone()), page)
            .await
    }
}
