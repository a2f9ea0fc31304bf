use crate::restart::request_host_restart;
use crate::store;
use anyhow::Result;
use spendgate_engine::{estimate_log_tokens, truncate_entries, TruncateOutcome};
use spendgate_types::{now_iso, Error, SessionEntry};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info};

/// Keeps the host's append-only session log under a token ceiling.
///
/// The log is host-owned; we never append to it, only rewrite the whole
/// file when it outgrows the ceiling. A rewrite is followed by a host
/// restart so the host re-reads the compacted log.
pub struct SessionTruncator {
    sessions_dir: PathBuf,
    session_key: String,
    max_tokens: usize,
    keep_recent: usize,
    restart_command: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TruncationReport {
    /// Within budget, too little content, or no log to speak of.
    NotNeeded,
    Truncated {
        removed: usize,
        tokens_before: usize,
        tokens_after: usize,
    },
}

impl SessionTruncator {
    pub fn new(
        sessions_dir: impl Into<PathBuf>,
        session_key: impl Into<String>,
        max_tokens: usize,
        keep_recent: usize,
        restart_command: Vec<String>,
    ) -> Self {
        Self {
            sessions_dir: sessions_dir.into(),
            session_key: session_key.into(),
            max_tokens,
            keep_recent,
            restart_command,
        }
    }

    /// Look the session key up in the sidecar `sessions.json` index.
    fn resolve_log_path(&self) -> Option<PathBuf> {
        let index: BTreeMap<String, String> =
            store::read_json(&self.sessions_dir.join("sessions.json"))?;
        let relative = index.get(&self.session_key)?;
        Some(self.sessions_dir.join(relative))
    }

    fn read_entries(&self, path: &PathBuf) -> spendgate_types::Result<Vec<SessionEntry>> {
        let content = std::fs::read_to_string(path)?;
        let mut entries = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let entry: SessionEntry = serde_json::from_str(line).map_err(|err| {
                Error::MalformedSessionLog(format!("line {}: {}", line_no + 1, err))
            })?;
            entries.push(entry);
        }
        Ok(entries)
    }

    /// Measure the log and rewrite it if it is over budget. A successful
    /// rewrite restarts the host.
    pub fn evaluate(&self) -> Result<TruncationReport> {
        let Some(path) = self.resolve_log_path() else {
            debug!(key = %self.session_key, "no session log registered, nothing to truncate");
            return Ok(TruncationReport::NotNeeded);
        };
        if !path.exists() {
            return Ok(TruncationReport::NotNeeded);
        }

        let entries = self.read_entries(&path)?;
        let tokens_before = estimate_log_tokens(&entries);

        match truncate_entries(&entries, self.max_tokens, self.keep_recent, &now_iso()) {
            TruncateOutcome::Unchanged => {
                debug!(tokens = tokens_before, "session log within budget");
                Ok(TruncationReport::NotNeeded)
            }
            TruncateOutcome::Truncated { entries, removed } => {
                let mut lines = String::new();
                for entry in &entries {
                    lines.push_str(&serde_json::to_string(entry)?);
                    lines.push('\n');
                }
                store::write_text(&path, &lines)?;

                let tokens_after = estimate_log_tokens(&entries);
                info!(
                    removed,
                    tokens_before, tokens_after, "session log compacted, restarting host"
                );
                request_host_restart(&self.restart_command);
                Ok(TruncationReport::Truncated {
                    removed,
                    tokens_before,
                    tokens_after,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use tempfile::TempDir;

    fn restart_noop() -> Vec<String> {
        vec!["true".to_string()]
    }

    fn write_index(dir: &TempDir, key: &str, file: &str) {
        let mut index = BTreeMap::new();
        index.insert(key.to_string(), file.to_string());
        store::write_json(&dir.path().join("sessions.json"), &index).unwrap();
    }

    fn write_log(dir: &TempDir, file: &str, lines: &[serde_json::Value]) {
        let content: String = lines
            .iter()
            .map(|l| format!("{}\n", l))
            .collect();
        std::fs::write(dir.path().join(file), content).unwrap();
    }

    fn message_line(id: &str, parent: Option<&str>, chars: usize) -> serde_json::Value {
        json!({
            "type": "message",
            "id": id,
            "parentId": parent,
            "timestamp": "2026-08-02T09:00:00Z",
            "message": {"role": "assistant", "content": "x".repeat(chars)},
        })
    }

    fn truncator(dir: &TempDir, max_tokens: usize, keep: usize) -> SessionTruncator {
        SessionTruncator::new(dir.path(), "agent:main:main", max_tokens, keep, restart_noop())
    }

    #[test]
    fn test_missing_index_is_not_needed() {
        let dir = TempDir::new().unwrap();
        let report = truncator(&dir, 100, 2).evaluate().unwrap();
        assert_eq!(report, TruncationReport::NotNeeded);
    }

    #[test]
    fn test_unknown_key_is_not_needed() {
        let dir = TempDir::new().unwrap();
        write_index(&dir, "someone:else:entirely", "other.jsonl");
        let report = truncator(&dir, 100, 2).evaluate().unwrap();
        assert_eq!(report, TruncationReport::NotNeeded);
    }

    #[test]
    fn test_within_budget_leaves_file_alone() {
        let dir = TempDir::new().unwrap();
        write_index(&dir, "agent:main:main", "main.jsonl");
        write_log(
            &dir,
            "main.jsonl",
            &[
                json!({"type": "session", "id": "s0", "parentId": null}),
                message_line("c0", Some("s0"), 40),
            ],
        );
        let before = std::fs::read_to_string(dir.path().join("main.jsonl")).unwrap();

        let report = truncator(&dir, 10_000, 2).evaluate().unwrap();
        assert_eq!(report, TruncationReport::NotNeeded);

        let after = std::fs::read_to_string(dir.path().join("main.jsonl")).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_truncates_rewrites_and_relinks() {
        let dir = TempDir::new().unwrap();
        write_index(&dir, "agent:main:main", "main.jsonl");

        let mut lines = vec![
            json!({"type": "session", "id": "s0", "parentId": null}),
            json!({"type": "model_change", "id": "s1", "parentId": "s0"}),
        ];
        let mut parent = "s1".to_string();
        for i in 0..30 {
            let id = format!("c{}", i);
            lines.push(message_line(&id, Some(&parent), 2000));
            parent = id;
        }
        write_log(&dir, "main.jsonl", &lines);

        let report = truncator(&dir, 1000, 5).evaluate().unwrap();
        let TruncationReport::Truncated {
            removed,
            tokens_before,
            tokens_after,
        } = report
        else {
            panic!("expected truncation");
        };
        assert_eq!(removed, 25);
        assert!(tokens_after < tokens_before);

        // Re-read the rewritten log and check the chain is linear.
        let content = std::fs::read_to_string(dir.path().join("main.jsonl")).unwrap();
        let entries: Vec<SessionEntry> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(entries[0].parent_id, None);
        for window in entries.windows(2) {
            assert_eq!(window[1].parent_id.as_deref(), Some(window[0].id.as_str()));
        }
        assert_eq!(
            entries.iter().filter(|e| e.entry_type == "compaction").count(),
            1
        );
        assert_eq!(entries.iter().filter(|e| e.is_content()).count(), 5);
    }

    #[test]
    fn test_malformed_line_aborts_without_writing() {
        let dir = TempDir::new().unwrap();
        write_index(&dir, "agent:main:main", "main.jsonl");
        let mut content = String::new();
        for i in 0..30 {
            content.push_str(&format!("{}\n", message_line(&format!("c{}", i), None, 2000)));
        }
        content.push_str("this is not json\n");
        std::fs::write(dir.path().join("main.jsonl"), &content).unwrap();

        assert!(truncator(&dir, 100, 2).evaluate().is_err());
        let after = std::fs::read_to_string(dir.path().join("main.jsonl")).unwrap();
        assert_eq!(after, content);
    }
}
