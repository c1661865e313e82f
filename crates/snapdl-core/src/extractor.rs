//! Resolves a video page URL into a direct media link.
//!
//! One resolve cycle is: landing GET (session token), submit POST (packed
//! payload), decode, pick the first escaped `href`, keep it only if it points
//! at the resolver's own media host.

use std::fmt;

use tokio::sync::mpsc::UnboundedSender;

use crate::config::ResolverConfig;
use crate::downloader::ProgressEvent;
use crate::error::SnapError;
use crate::patterns::{PayloadPatterns, SnaptikPatterns};
use crate::scheduler::run_bounded;
use crate::transport::HttpClient;
use crate::url_model::SourceUrl;

/// Direct media URL decoded from a resolver response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink(String);

impl ResolvedLink {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResolvedLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub struct LinkExtractor<P: PayloadPatterns = SnaptikPatterns> {
    client: HttpClient,
    resolver: ResolverConfig,
    patterns: P,
}

impl LinkExtractor<SnaptikPatterns> {
    pub fn new(client: HttpClient, resolver: ResolverConfig) -> Self {
        Self::with_patterns(client, resolver, SnaptikPatterns::new())
    }
}

impl<P: PayloadPatterns> LinkExtractor<P> {
    pub fn with_patterns(client: HttpClient, resolver: ResolverConfig, patterns: P) -> Self {
        Self {
            client,
            resolver,
            patterns,
        }
    }

    /// Runs one resolve cycle for `url`.
    ///
    /// `Ok(None)` means the resolver answered but offered no acceptable link.
    pub fn extract(&self, url: &SourceUrl) -> Result<Option<ResolvedLink>, SnapError> {
        let mut session = self.client.session()?;

        let landing = session.get_text(&self.resolver.base_url)?;
        let token = self
            .patterns
            .find_token(&landing)
            .ok_or(SnapError::TokenNotFound)?;
        tracing::debug!(url = %url, "session token acquired");

        let payload = session.post_form(
            &self.resolver.submit_url(),
            &[("url", url.as_str()), ("token", token.as_str())],
        )?;
        let tuple = self
            .patterns
            .find_control_tuple(&payload)
            .ok_or(SnapError::ControlTupleNotFound)?;
        tracing::debug!(
            url = %url,
            base = tuple.base,
            offset = tuple.offset,
            encoded_len = tuple.encoded.len(),
            "control tuple captured"
        );

        let html = tuple.decode()?;
        let link = self
            .patterns
            .find_candidate_link(&html)
            .filter(|candidate| candidate.contains(&self.resolver.link_marker))
            .map(ResolvedLink);
        match &link {
            Some(link) => tracing::debug!(url = %url, link = %link, "media link resolved"),
            None => tracing::info!(url = %url, "no media link in resolver response"),
        }
        Ok(link)
    }

    /// Extracts every URL on `workers` threads. Results are in input order;
    /// failures become `None` and are sent to `events` as
    /// [`ProgressEvent::ExtractionFailed`].
    pub fn extract_all(
        &self,
        urls: &[SourceUrl],
        workers: usize,
        events: Option<&UnboundedSender<ProgressEvent>>,
    ) -> Vec<Option<ResolvedLink>> {
        tracing::info!(urls = urls.len(), workers, "extraction phase started");
        let results = run_bounded(
            urls.iter().collect(),
            workers,
            |_, url| self.extract(url),
            |index, res| {
                let url = &urls[index];
                let kind = match res {
                    Ok(Ok(_)) => return,
                    Ok(Err(e)) => {
                        tracing::warn!(url = %url, error = %e, "extraction failed");
                        e.kind_name()
                    }
                    Err(panicked) => {
                        tracing::warn!(url = %url, error = %panicked, "extraction worker panicked");
                        "WorkerPanic"
                    }
                };
                if let Some(tx) = events {
                    let _ = tx.send(ProgressEvent::ExtractionFailed {
                        url: url.to_string(),
                        kind: kind.to_string(),
                    });
                }
            },
        );
        results
            .into_iter()
            .map(|res| res.ok().and_then(Result::ok).flatten())
            .collect()
    }
}
