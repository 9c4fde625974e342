//! Sources of the random identifiers stamped into generated documents.
//!
//! Node ids, revision tokens and artifact file names all come from one
//! [`IdSource`] so tests can swap in [`SequentialIds`] and get stable output.

use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

const REVISION_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";
const REVISION_LEN: usize = 16;

pub trait IdSource: Send + Sync {
    /// 16 lowercase hex characters.
    fn node_id(&self) -> String;
    /// Short alphanumeric token used as the document etag.
    fn revision(&self) -> String;
    /// Stem of a persisted artifact; the caller appends the extension.
    fn artifact_stem(&self) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIds;

impl IdSource for RandomIds {
    fn node_id(&self) -> String {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(16);
        id
    }

    fn revision(&self) -> String {
        let mut rng = rand::rng();
        (0..REVISION_LEN)
            .map(|_| REVISION_ALPHABET[rng.random_range(0..REVISION_ALPHABET.len())] as char)
            .collect()
    }

    fn artifact_stem(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Deterministic ids: `0000000000000001`, `0000000000000002`, ...
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl IdSource for SequentialIds {
    fn node_id(&self) -> String {
        format!("{:016x}", self.bump())
    }

    fn revision(&self) -> String {
        format!("rev{:013}", self.bump())
    }

    fn artifact_stem(&self) -> String {
        format!("artifact-{:08}", self.bump())
    }
}
