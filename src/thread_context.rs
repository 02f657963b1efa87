//! Per-application analysis context.
//!
//! Correlates the documents analyzed under one application so later requests
//! can be checked against the same company. Keyed by a caller-supplied
//! thread id (e.g. an application id). In-memory with TTL eviction; expiry
//! is evaluated on read, there is no background sweep.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

use crate::pipeline::analysis::CompanyMatch;

/// Context is kept for this long after the last update.
pub const CONTEXT_TTL_HOURS: i64 = 2;

/// One analyzed document within an application.
#[derive(Debug, Clone)]
pub struct DocumentRecord {
    pub document_type: String,
    pub verdict: CompanyMatch,
    /// Company names found in the document, empty when none were captured.
    pub companies_mentioned: String,
}

/// Everything known about one application thread.
#[derive(Debug, Clone)]
pub struct ThreadContext {
    pub company: Option<String>,
    pub documents: Vec<DocumentRecord>,
    pub updated_at: DateTime<Utc>,
}

impl ThreadContext {
    /// Render the analysis-prompt preamble describing documents already seen
    /// in this application. Empty string when nothing has been recorded.
    pub fn history_preamble(&self) -> String {
        if self.documents.is_empty() {
            return String::new();
        }

        let company = self.company.as_deref().unwrap_or("Unknown");
        let mut lines = vec![
            format!("This application is for the company: \"{company}\"."),
            "You have already analyzed the following documents in this application:".to_string(),
        ];
        for (i, doc) in self.documents.iter().enumerate() {
            let companies = if doc.companies_mentioned.is_empty() {
                "—"
            } else {
                doc.companies_mentioned.as_str()
            };
            lines.push(format!(
                "- Document {}: {} — {}; companies mentioned: {}",
                i + 1,
                doc.document_type,
                doc.verdict.history_label(),
                companies
            ));
        }
        lines.push(
            "Ensure the current document is for the SAME application company. \
             If it refers to a different company, output COMPANY_MISMATCH."
                .to_string(),
        );
        lines.join("\n")
    }
}

type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Process-wide store of application threads.
///
/// All operations take the store lock for their whole critical section, so a
/// reader never observes a partially-appended record. TTL and clock are
/// injectable for deterministic tests.
pub struct ThreadContextStore {
    entries: Mutex<HashMap<String, ThreadContext>>,
    ttl: Duration,
    clock: Clock,
}

impl ThreadContextStore {
    pub fn new() -> Self {
        Self::with_ttl(Duration::hours(CONTEXT_TTL_HOURS))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock: Box::new(Utc::now),
        }
    }

    /// Replace the time source, for tests that drive expiry.
    pub fn with_clock(
        mut self,
        clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static,
    ) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Current context for a thread, sweeping expired entries first so a
    /// stale entry is never returned.
    pub fn get(&self, thread_id: &str) -> Option<ThreadContext> {
        let now = (self.clock)();
        if let Ok(mut entries) = self.entries.lock() {
            entries.retain(|_, ctx| now.signed_duration_since(ctx.updated_at) <= self.ttl);
            entries.get(thread_id).cloned()
        } else {
            None
        }
    }

    /// Append one document record to a thread, creating the thread if absent.
    /// The company name is overwritten only when a non-empty one is supplied;
    /// an empty or missing name preserves the previous value.
    pub fn record_document(
        &self,
        thread_id: &str,
        company_name: Option<&str>,
        document_type: &str,
        verdict: CompanyMatch,
        companies_mentioned: Option<&str>,
    ) {
        let now = (self.clock)();
        if let Ok(mut entries) = self.entries.lock() {
            let entry = entries
                .entry(thread_id.to_string())
                .or_insert_with(|| ThreadContext {
                    company: None,
                    documents: Vec::new(),
                    updated_at: now,
                });
            entry.documents.push(DocumentRecord {
                document_type: document_type.to_string(),
                verdict,
                companies_mentioned: companies_mentioned.unwrap_or_default().to_string(),
            });
            entry.updated_at = now;
            if let Some(company) = company_name.filter(|c| !c.is_empty()) {
                entry.company = Some(company.to_string());
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ThreadContextStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;

    /// Store whose clock is `base + offset_secs`, driven by the returned handle.
    fn store_with_adjustable_clock() -> (ThreadContextStore, Arc<AtomicI64>) {
        let base = Utc::now();
        let offset = Arc::new(AtomicI64::new(0));
        let clock_offset = offset.clone();
        let store = ThreadContextStore::new().with_clock(move || {
            base + Duration::seconds(clock_offset.load(Ordering::SeqCst))
        });
        (store, offset)
    }

    #[test]
    fn get_unknown_thread_is_absent() {
        let store = ThreadContextStore::new();
        assert!(store.get("APP-1").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn record_creates_thread_and_appends_in_order() {
        let store = ThreadContextStore::new();
        store.record_document(
            "APP-1",
            Some("Acme Corp"),
            "license",
            CompanyMatch::Match,
            Some("Acme Corp"),
        );
        store.record_document(
            "APP-1",
            Some("Acme Corp"),
            "permit",
            CompanyMatch::Unknown,
            None,
        );

        let ctx = store.get("APP-1").unwrap();
        assert_eq!(ctx.company.as_deref(), Some("Acme Corp"));
        assert_eq!(ctx.documents.len(), 2);
        assert_eq!(ctx.documents[0].document_type, "license");
        assert_eq!(ctx.documents[1].document_type, "permit");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn empty_company_name_preserves_previous_value() {
        let store = ThreadContextStore::new();
        store.record_document(
            "APP-1",
            Some("Acme Corp"),
            "license",
            CompanyMatch::Match,
            Some("Acme Corp"),
        );
        store.record_document("APP-1", Some(""), "permit", CompanyMatch::Mismatch, Some("Beta"));

        let ctx = store.get("APP-1").unwrap();
        assert_eq!(ctx.company.as_deref(), Some("Acme Corp"));
        assert_eq!(ctx.documents.len(), 2);
    }

    #[test]
    fn thread_created_without_company_renders_unknown() {
        let store = ThreadContextStore::new();
        store.record_document("APP-1", None, "license", CompanyMatch::Unknown, None);

        let ctx = store.get("APP-1").unwrap();
        assert!(ctx.company.is_none());
        assert!(ctx
            .history_preamble()
            .starts_with("This application is for the company: \"Unknown\"."));
    }

    #[test]
    fn entry_expires_after_ttl() {
        let (store, offset) = store_with_adjustable_clock();
        store.record_document("APP-1", Some("Acme"), "license", CompanyMatch::Match, None);

        // Exactly at the TTL boundary the entry is still alive.
        offset.store(CONTEXT_TTL_HOURS * 3600, Ordering::SeqCst);
        assert!(store.get("APP-1").is_some());

        offset.store(CONTEXT_TTL_HOURS * 3600 + 1, Ordering::SeqCst);
        assert!(store.get("APP-1").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn update_refreshes_expiry() {
        let (store, offset) = store_with_adjustable_clock();
        store.record_document("APP-1", Some("Acme"), "license", CompanyMatch::Match, None);

        offset.store(3600, Ordering::SeqCst);
        store.record_document("APP-1", None, "permit", CompanyMatch::Unknown, None);

        // 2h after the first update but only 1h after the second.
        offset.store(2 * 3600 + 1800, Ordering::SeqCst);
        let ctx = store.get("APP-1").unwrap();
        assert_eq!(ctx.documents.len(), 2);

        offset.store(3600 + CONTEXT_TTL_HOURS * 3600 + 1, Ordering::SeqCst);
        assert!(store.get("APP-1").is_none());
    }

    #[test]
    fn sweep_removes_other_expired_threads() {
        let (store, offset) = store_with_adjustable_clock();
        store.record_document("OLD", Some("Acme"), "license", CompanyMatch::Match, None);

        offset.store(CONTEXT_TTL_HOURS * 3600 + 1, Ordering::SeqCst);
        store.record_document("NEW", Some("Beta"), "permit", CompanyMatch::Unknown, None);

        assert!(store.get("NEW").is_some());
        assert!(store.get("OLD").is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn concurrent_updates_never_lose_records() {
        let store = Arc::new(ThreadContextStore::new());
        let threads = 8;
        let per_thread = 5;

        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for i in 0..per_thread {
                        store.record_document(
                            "APP-1",
                            Some("Acme Corp"),
                            &format!("doc-{t}-{i}"),
                            CompanyMatch::Unknown,
                            None,
                        );
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let ctx = store.get("APP-1").unwrap();
        assert_eq!(ctx.documents.len(), threads * per_thread);
    }

    #[test]
    fn preamble_lists_documents_with_verdicts() {
        let ctx = ThreadContext {
            company: Some("Acme Corp".into()),
            documents: vec![
                DocumentRecord {
                    document_type: "license".into(),
                    verdict: CompanyMatch::Match,
                    companies_mentioned: "Acme Corp".into(),
                },
                DocumentRecord {
                    document_type: "tax clearance".into(),
                    verdict: CompanyMatch::Mismatch,
                    companies_mentioned: "Beta Ltd".into(),
                },
                DocumentRecord {
                    document_type: "permit".into(),
                    verdict: CompanyMatch::Unknown,
                    companies_mentioned: "".into(),
                },
            ],
            updated_at: Utc::now(),
        };

        let preamble = ctx.history_preamble();
        assert!(preamble.starts_with("This application is for the company: \"Acme Corp\"."));
        assert!(preamble.contains("You have already analyzed the following documents"));
        assert!(preamble.contains("- Document 1: license — COMPANY_MATCH; companies mentioned: Acme Corp"));
        assert!(preamble.contains("- Document 2: tax clearance — COMPANY_MISMATCH; companies mentioned: Beta Ltd"));
        assert!(preamble.contains("- Document 3: permit — unknown; companies mentioned: —"));
        assert!(preamble.ends_with("output COMPANY_MISMATCH."));
    }

    #[test]
    fn preamble_empty_without_documents() {
        let ctx = ThreadContext {
            company: Some("Acme Corp".into()),
            documents: vec![],
            updated_at: Utc::now(),
        };
        assert_eq!(ctx.history_preamble(), "");
    }
}
