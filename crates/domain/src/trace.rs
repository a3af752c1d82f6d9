use serde::Serialize;

/// Structured trace events emitted across the hexpm client crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    TarballBuilt {
        package: String,
        version: String,
        outer_size: usize,
        inner_size: usize,
    },
    TarballUnpacked {
        outer_size: usize,
        files_extracted: usize,
    },
    ChecksumVerified {
        matched: bool,
    },
    RegistryFetch {
        path: String,
        status: u16,
        cache_hit: bool,
        duration_ms: u64,
    },
    SignatureVerified {
        matched: bool,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "hexpm_event");
    }
}
