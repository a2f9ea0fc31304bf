use spendgate_types::{estimate_tokens, SessionEntry};

/// Flat per-entry floor. Structural entries are metadata-only; content
/// entries are charged by size but never less than this.
const ENTRY_BASE_TOKENS: usize = 50;

pub fn estimate_entry_tokens(entry: &SessionEntry) -> usize {
    if entry.is_structural() {
        return ENTRY_BASE_TOKENS;
    }
    estimate_tokens(entry.content_chars()).max(ENTRY_BASE_TOKENS)
}

pub fn estimate_log_tokens(entries: &[SessionEntry]) -> usize {
    entries.iter().map(estimate_entry_tokens).sum()
}

#[derive(Debug)]
pub enum TruncateOutcome {
    /// Log already fits, or too little content to truncate.
    Unchanged,
    Truncated {
        entries: Vec<SessionEntry>,
        removed: usize,
    },
}

/// Drop the oldest content entries so the log fits under `max_tokens`.
///
/// All structural entries survive. The newest `keep_recent` content
/// entries survive. One synthetic compaction marker takes the position of
/// the first surviving content entry, and the parent chain is rebuilt from
/// scratch: entry zero points at nothing, every later entry points at its
/// new predecessor.
pub fn truncate_entries(
    entries: &[SessionEntry],
    max_tokens: usize,
    keep_recent: usize,
    now_iso: &str,
) -> TruncateOutcome {
    if estimate_log_tokens(entries) <= max_tokens {
        return TruncateOutcome::Unchanged;
    }

    let content_count = entries.iter().filter(|e| e.is_content()).count();
    if content_count <= keep_recent {
        return TruncateOutcome::Unchanged;
    }
    let removed = content_count - keep_recent;

    let mut kept: Vec<SessionEntry> = Vec::with_capacity(entries.len() - removed + 1);
    let mut content_seen = 0usize;
    let mut marker_inserted = false;
    for entry in entries {
        if entry.is_content() {
            content_seen += 1;
            if content_seen <= removed {
                continue;
            }
            if !marker_inserted {
                kept.push(SessionEntry::compaction_marker(removed, now_iso));
                marker_inserted = true;
            }
        }
        kept.push(entry.clone());
    }

    relink(&mut kept);
    TruncateOutcome::Truncated {
        entries: kept,
        removed,
    }
}

/// Rebuild the linear parent chain in place.
fn relink(entries: &mut [SessionEntry]) {
    let mut previous: Option<String> = None;
    for entry in entries.iter_mut() {
        entry.parent_id = previous.clone();
        previous = Some(entry.id.clone());
    }
}
