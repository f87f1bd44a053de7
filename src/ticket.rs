//! Ticket planning: turning a resolved request into htsget URLs.

use crate::bounds::{check_kind, complete_range};
use crate::formats::Reference;
use crate::resolver::Resolver;
use crate::types::{
    CoordinateRange, DataKind, HtsgetResponse, HtsgetResponseBody, Resolution, UrlEntry,
};
use crate::{Error, Result};
use std::num::NonZeroU64;
use std::sync::Arc;

/// A sub-range of a request covered by one ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub start: u64,
    pub end: u64,
}

/// Split `[start, end]` into `chunk_size` pieces plus a final remainder.
///
/// Returns no chunks when the span is shorter than one `chunk_size`; the
/// caller then issues a single whole-file ticket. The remainder is emitted
/// even when it is empty.
pub fn chunks(chunk_size: u64, start: u64, end: u64) -> Vec<Chunk> {
    let count = end.checked_sub(start).map_or(0, |span| span / chunk_size);
    if count == 0 {
        return Vec::new();
    }

    let mut chunks = Vec::with_capacity(count as usize + 1);
    let mut slice_start = start;
    for _ in 0..count {
        let slice_end = slice_start + chunk_size;
        chunks.push(Chunk {
            start: slice_start,
            end: slice_end,
        });
        slice_start = slice_end;
    }
    chunks.push(Chunk {
        start: slice_start,
        end,
    });
    chunks
}

/// Builds ticket URLs pointing back at this service's `/data` endpoint.
#[derive(Debug, Clone)]
pub struct ChunkPlanner {
    chunk_size: u64,
    base_path: String,
}

impl ChunkPlanner {
    pub fn new(chunk_size: NonZeroU64, base_path: String) -> Self {
        Self {
            chunk_size: chunk_size.get(),
            base_path,
        }
    }

    /// Tickets for `id`, in coordinate order.
    ///
    /// Only a range on one contig is chunked. Positions on different contigs
    /// do not order, so a request without a contig gets the whole-file ticket.
    pub fn plan(
        &self,
        host: &str,
        id: &str,
        contig: Option<&str>,
        start: Option<u64>,
        end: Option<u64>,
    ) -> Vec<UrlEntry> {
        let (Some(contig), Some(start), Some(end)) = (contig, start, end) else {
            return vec![self.whole_file_url(host, id, contig)];
        };

        let chunks = chunks(self.chunk_size, start, end);
        if chunks.is_empty() {
            return vec![self.whole_file_url(host, id, Some(contig))];
        }

        chunks
            .into_iter()
            .map(|chunk| self.chunk_url(host, id, contig, chunk))
            .collect()
    }

    fn chunk_url(&self, host: &str, id: &str, contig: &str, chunk: Chunk) -> UrlEntry {
        let url = format!(
            "http://{}{}/data?id={}&reference_name={}&start={}&end={}",
            host, self.base_path, id, contig, chunk.start, chunk.end
        );
        UrlEntry { url }
    }

    // The whole-file form carries no base path.
    fn whole_file_url(&self, host: &str, id: &str, contig: Option<&str>) -> UrlEntry {
        let mut url = format!("http://{}/data?id={}", host, id);
        if let Some(contig) = contig {
            url.push_str(&format!("&reference_name={}", contig));
        }
        UrlEntry { url }
    }
}

/// Answers `reads` and `variants` requests.
pub struct TicketService {
    resolver: Arc<dyn Resolver>,
    planner: ChunkPlanner,
    reference: Reference,
}

impl TicketService {
    pub fn new(resolver: Arc<dyn Resolver>, planner: ChunkPlanner, reference: Reference) -> Self {
        Self {
            resolver,
            planner,
            reference,
        }
    }

    /// Resolve `id` and plan the tickets for `range`. `host` is the
    /// authority the client used to reach this service.
    pub async fn tickets(
        &self,
        kind: DataKind,
        id: &str,
        range: CoordinateRange,
        host: &str,
    ) -> Result<HtsgetResponse> {
        range.validate()?;

        let file = match self.resolver.resolve(id).await? {
            Resolution::Found(file) => file,
            Resolution::NotFound => return Err(Error::not_found(kind, id)),
        };

        let needs_bounds = range.start.is_none() || range.end.is_none();
        let (start, end) = match range.contig.clone() {
            _ if !needs_bounds || !self.resolver.infers_bounds() => (range.start, range.end),
            // Without a contig the planner issues one whole-file ticket anyway.
            None => {
                check_kind(&file, kind)?;
                (range.start, range.end)
            }
            Some(contig) => {
                let path = self.resolver.localize(&file).await?;
                let file = file.clone();
                let reference = self.reference.clone();
                let (start, end) = (range.start, range.end);

                let (start, end) = tokio::task::spawn_blocking(move || {
                    complete_range(&file, &path, kind, Some(&contig), start, end, &reference)
                })
                .await
                .map_err(|e| Error::Internal(format!("bound inference task failed: {}", e)))??;
                (Some(start), Some(end))
            }
        };

        let urls = self
            .planner
            .plan(host, id, range.contig.as_deref(), start, end);
        tracing::debug!("{} tickets for {} {}", urls.len(), kind, id);

        Ok(HtsgetResponse {
            htsget: HtsgetResponseBody {
                format: file.format,
                urls,
            },
        })
    }
}
