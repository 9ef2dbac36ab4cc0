//! Draining offset/limit paged listings into one complete sequence.

use std::future::Future;

use orchestrator_common::{Error, Result};

/// Page size used when a provider has no configured one.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// One page of a remote listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Size of the whole collection as reported with this page.
    pub total_count: u64,
}

/// Fetch pages from `offset = 0` until the collected count reaches the total
/// reported by the latest page.
///
/// `fetch` receives `(offset, limit)`; the offset is always the number of
/// items collected so far. A page that brings no items while the total is
/// still out of reach fails the collection, as does any failed fetch. Either
/// way nothing collected so far is returned.
///
/// ```
/// # tokio_test::block_on(async {
/// use transcode_orchestrator::provider::pagination::{collect_all, Page};
///
/// let items: Vec<u32> = (0..7).collect();
/// let all = collect_all("numbers", 3, |offset, limit| {
///     let items = &items;
///     async move {
///         let start = offset as usize;
///         let end = (start + limit as usize).min(items.len());
///         Ok(Page { items: items[start..end].to_vec(), total_count: 7 })
///     }
/// })
/// .await
/// .unwrap();
/// assert_eq!(all, items);
/// # });
/// ```
pub async fn collect_all<T, F, Fut>(what: &str, page_size: u32, mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(u64, u32) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let limit = page_size.max(1);
    let mut collected: Vec<T> = Vec::new();

    loop {
        let offset = collected.len() as u64;
        let page = fetch(offset, limit).await?;
        let received = page.items.len();
        let total = page.total_count;
        collected.extend(page.items);

        if collected.len() as u64 >= total {
            break;
        }
        if received == 0 {
            return Err(Error::remote(
                format!("listing {what}"),
                format!(
                    "page at offset {offset} returned no items with {} of {total} collected",
                    collected.len()
                ),
            ));
        }
    }

    tracing::debug!(what, count = collected.len(), "collected listing");
    Ok(collected)
}
