use std::sync::Arc;
use std::time::Duration;

use trust_dns_resolver::Resolver;
use trust_dns_resolver::system_conf::read_system_conf;

use super::{AbsentReason, Error, MxCache, MxRecord, MxRecordSet, MxStatus};

/// DNS settings for the system resolver and the MX cache.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Per-query timeout.
    pub timeout: Duration,
    pub attempts: usize,
    /// `None` keeps entries for the life of the cache.
    pub cache_ttl: Option<Duration>,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            attempts: 2,
            cache_ttl: None,
        }
    }
}

/// Source of MX answers. Implemented for the system [`Resolver`]; tests and
/// embedders may plug their own.
pub trait LookupMx: Send + Sync {
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, Error>;
}

impl LookupMx for Resolver {
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, Error> {
        let lookup = Resolver::mx_lookup(self, domain).map_err(Error::lookup)?;
        let mut records = Vec::new();
        for mx in lookup.iter() {
            let exchange = normalize_exchange(mx.exchange().to_utf8());
            records.push(MxRecord::new(mx.preference(), exchange));
        }
        Ok(records)
    }
}

/// Builds a blocking resolver from the system configuration with bounded
/// timeouts.
pub fn system_resolver(options: &ResolverOptions) -> Result<Resolver, Error> {
    let (config, mut opts) = read_system_conf().map_err(Error::resolver_init)?;
    opts.timeout = options.timeout;
    opts.attempts = options.attempts;
    Resolver::new(config, opts).map_err(Error::resolver_init)
}

/// Resolves domains to their mail exchangers through a shared [`MxCache`].
///
/// [`MxResolver::resolve`] never fails: every DNS problem collapses into
/// [`MxStatus::Absent`], and that outcome is cached like any other.
pub struct MxResolver<L> {
    lookup: L,
    cache: Arc<MxCache>,
}

impl MxResolver<Resolver> {
    pub fn from_system_conf(options: &ResolverOptions) -> Result<Self, Error> {
        let resolver = system_resolver(options)?;
        let cache = match options.cache_ttl {
            Some(ttl) => MxCache::with_ttl(ttl, Arc::new(super::SystemClock)),
            None => MxCache::new(),
        };
        Ok(Self::with_cache(resolver, Arc::new(cache)))
    }
}

impl<L: LookupMx> MxResolver<L> {
    pub fn new(lookup: L) -> Self {
        Self::with_cache(lookup, Arc::new(MxCache::new()))
    }

    pub fn with_cache(lookup: L, cache: Arc<MxCache>) -> Self {
        Self { lookup, cache }
    }

    pub fn cache(&self) -> &Arc<MxCache> {
        &self.cache
    }

    pub fn resolve(&self, domain: &str) -> MxStatus {
        let key = match normalize_domain(domain) {
            Ok(key) => key,
            Err(err) => {
                tracing::debug!(domain, error = %err, "unusable domain, not resolving");
                return MxStatus::Absent(AbsentReason::Failed(err.to_string()));
            }
        };
        self.cache
            .get_or_resolve(&key, || resolve_with(&self.lookup, &key))
    }
}

/// Uncached lookup, classified.
pub(crate) fn resolve_with<R>(resolver: &R, ascii_domain: &str) -> MxStatus
where
    R: LookupMx + ?Sized,
{
    tracing::debug!(domain = ascii_domain, "resolving MX records");
    match resolver.lookup_mx(ascii_domain) {
        Ok(records) => {
            let null_mx = !records.is_empty() && records.iter().all(|r| r.exchange.is_empty());
            match MxRecordSet::from_records(records) {
                Some(set) => MxStatus::Records(set),
                None if null_mx => MxStatus::Absent(AbsentReason::NullMx),
                None => MxStatus::Absent(AbsentReason::NoRecords),
            }
        }
        Err(err) => {
            if err.is_unroutable() {
                tracing::debug!(domain = ascii_domain, error = %err, "domain has no mail routing");
            } else {
                tracing::warn!(domain = ascii_domain, error = %err, "MX lookup failed, treating domain as unroutable");
            }
            MxStatus::Absent(err.absent_reason())
        }
    }
}

/// Lookup MX records for `domain` using the system resolver, bypassing any
/// cache.
pub fn check_mx(domain: &str) -> Result<MxStatus, Error> {
    check_mx_with(domain, &ResolverOptions::default())
}

/// [`check_mx`] with explicit DNS timeouts.
pub fn check_mx_with(domain: &str, options: &ResolverOptions) -> Result<MxStatus, Error> {
    let ascii = normalize_domain(domain)?;
    let resolver = system_resolver(options)?;
    Ok(resolve_with(&resolver, &ascii))
}

pub(crate) fn normalize_domain(domain: &str) -> Result<String, Error> {
    let trimmed = domain.trim().trim_end_matches('.');
    if trimmed.is_empty() {
        return Err(Error::EmptyDomain);
    }
    idna::domain_to_ascii(trimmed).map_err(Error::idna)
}

pub(crate) fn normalize_exchange(exchange: String) -> String {
    let trimmed = exchange.trim_end_matches('.');
    trimmed.to_ascii_lowercase()
}
