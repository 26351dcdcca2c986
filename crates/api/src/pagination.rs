use crate::error::Result;
use async_trait::async_trait;
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tracing::debug;

/// Page size used by every list command.
pub const PAGE_SIZE: u32 = 100;

/// Offset pagination envelope returned alongside PagerDuty list results.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageInfo {
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub more: bool,
    #[serde(default)]
    pub total: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub info: PageInfo,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, info: PageInfo) -> Self {
        Self { items, info }
    }

    /// An empty page ends traversal even if the server claims there is more.
    pub fn has_next(&self) -> bool {
        self.info.more && !self.items.is_empty()
    }
}

#[async_trait]
pub trait Paginator<T>: Sync {
    async fn fetch_page(&self, offset: u32, limit: u32) -> Result<Page<T>>;

    async fn fetch_all(&self, limit: u32) -> Result<Vec<T>>
    where
        T: Send,
    {
        let mut all_items = Vec::new();
        let mut offset = 0;

        loop {
            debug!(offset, limit, "Fetching page");
            let page = self.fetch_page(offset, limit).await?;
            let has_next = page.has_next();

            offset += page.items.len() as u32;
            all_items.extend(page.items);

            if !has_next {
                debug!(total_items = all_items.len(), "Finished pagination");
                break;
            }
        }

        Ok(all_items)
    }

    fn stream<'a>(
        &'a self,
        limit: u32,
    ) -> Pin<Box<dyn Stream<Item = Result<Vec<T>>> + Send + 'a>>
    where
        T: Send + 'a,
    {
        Box::pin(async_stream::stream! {
            let mut offset = 0;

            loop {
                debug!(offset, limit, "Fetching page in stream");
                match self.fetch_page(offset, limit).await {
                    Ok(page) => {
                        let has_next = page.has_next();
                        offset += page.items.len() as u32;

                        yield Ok(page.items);

                        if !has_next {
                            break;
                        }
                    }
                    Err(err) => {
                        yield Err(err);
                        break;
                    }
                }
            }
        })
    }
}
