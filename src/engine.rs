/* src/engine.rs */

use crate::{
    cache::ResultCache, error::ResolveError, operations::Operation, payload::Payload,
    signature::RequestSignature, upstream::UpstreamFetcher,
};
use dashmap::{DashMap, mapref::entry::Entry};
use fancy_log::{LogLevel, log};
use std::collections::BTreeMap;
use tokio::{sync::watch, time::Instant};

type Outcome = Result<Payload, ResolveError>;

/// Cache-first resolution of [`Operation`]s against the upstream fetcher.
///
/// Concurrent misses for the same signature are coalesced: the first caller
/// runs the upstream round and publishes its outcome, failures included, on a
/// per-signature `watch` channel. The others wait on that channel without
/// holding any lock, so every caller finishes within one upstream round.
pub struct ResolutionEngine {
    cache: ResultCache,
    fetcher: UpstreamFetcher,
    in_flight: DashMap<RequestSignature, watch::Receiver<Option<Outcome>>>,
}

enum Role {
    Leader(watch::Sender<Option<Outcome>>),
    Follower(watch::Receiver<Option<Outcome>>),
}

/// Removes the in-flight slot when the leader finishes or is cancelled.
struct FlightGuard<'a> {
    in_flight: &'a DashMap<RequestSignature, watch::Receiver<Option<Outcome>>>,
    signature: &'a RequestSignature,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.remove(self.signature);
    }
}

impl ResolutionEngine {
    #[must_use]
    pub fn new(cache: ResultCache, fetcher: UpstreamFetcher) -> Self {
        Self {
            cache,
            fetcher,
            in_flight: DashMap::new(),
        }
    }

    /// Resolves one operation, serving from cache while the entry is fresh.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::InvalidArguments`] if the arguments do not fit the operation
    /// - [`ResolveError::UpstreamsExhausted`] if the fetch failed everywhere;
    ///   nothing is cached in that case
    pub async fn resolve(
        &self,
        operation: Operation,
        positional: Vec<String>,
        named: BTreeMap<String, String>,
    ) -> Result<Payload, ResolveError> {
        let signature = RequestSignature::new(operation.name(), positional, named);
        let payload = self.resolve_signature(operation, &signature).await?;
        Ok(operation.post_process(payload))
    }

    async fn resolve_signature(
        &self,
        operation: Operation,
        signature: &RequestSignature,
    ) -> Outcome {
        if let Some(hit) = self.cache.lookup(signature, Instant::now()) {
            log(LogLevel::Debug, &format!("Cache hit for {signature}"));
            return Ok(hit);
        }

        let path = operation.path(signature.positional(), signature.named())?;

        loop {
            let role = match self.in_flight.entry(signature.clone()) {
                Entry::Occupied(slot) => Role::Follower(slot.get().clone()),
                Entry::Vacant(slot) => {
                    let (sender, receiver) = watch::channel(None);
                    slot.insert(receiver);
                    Role::Leader(sender)
                }
            };

            match role {
                Role::Leader(sender) => return self.lead(signature, &path, &sender).await,
                Role::Follower(mut receiver) => {
                    let shared = receiver
                        .wait_for(Option::is_some)
                        .await
                        .ok()
                        .and_then(|outcome| outcome.clone());
                    if let Some(outcome) = shared {
                        log(LogLevel::Debug, &format!("Shared in-flight result for {signature}"));
                        return outcome;
                    }
                    // The leader was cancelled before publishing; take over.
                }
            }
        }
    }

    async fn lead(
        &self,
        signature: &RequestSignature,
        path: &str,
        sender: &watch::Sender<Option<Outcome>>,
    ) -> Outcome {
        let _flight = FlightGuard {
            in_flight: &self.in_flight,
            signature,
        };

        let outcome = match self.cache.lookup(signature, Instant::now()) {
            Some(hit) => Ok(hit),
            None => self.fetch_and_store(signature, path).await,
        };
        sender.send_replace(Some(outcome.clone()));
        outcome
    }

    async fn fetch_and_store(&self, signature: &RequestSignature, path: &str) -> Outcome {
        let started = Instant::now();
        let payload = self.fetcher.fetch(path).await?;
        self.cache.store(signature.clone(), payload.clone(), started);
        log(
            LogLevel::Debug,
            &format!("Cached {signature} ({} entries)", self.cache.len()),
        );
        Ok(payload)
    }
}
