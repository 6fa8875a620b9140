//! Path rewriting from proxy paths to upstream URLs.
//!
//! ```text
//! /claude                     → https://api.anthropic.com/v1
//! /claude/messages            → https://api.anthropic.com/v1/messages
//! /gemini/v1beta/models?x=1   → https://generativelanguage.googleapis.com/v1beta/models?x=1
//! /groq/chat/completions      → https://api.groq.com/openai/v1/chat/completions
//! ```
//!
//! A version segment counts as already present only on a segment boundary:
//! `/v1beta/models` does not carry `/v1`.

use crate::routing::table::RouteEntry;

/// Rewrites request paths for a matched route.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathRewriter;

impl PathRewriter {
    /// Upstream path (no base, no query) for `path` under `entry`.
    pub fn outbound_path(&self, path: &str, entry: &RouteEntry) -> String {
        let remainder = entry.matcher().remainder(path).unwrap_or(path);

        let remainder = match remainder {
            "" => "/".to_string(),
            r if r.starts_with('/') => r.to_string(),
            r => format!("/{}", r),
        };

        match entry.version_segment() {
            Some(segment) if !has_segment(&remainder, segment) => {
                if remainder == "/" {
                    segment.to_string()
                } else {
                    format!("{}{}", segment, remainder)
                }
            }
            _ => remainder,
        }
    }

    /// Absolute upstream URL: base + rewritten path + original query.
    pub fn rewrite(&self, path: &str, query: Option<&str>, entry: &RouteEntry) -> String {
        let mut url = format!(
            "{}{}",
            entry.upstream_base().trim_end_matches('/'),
            self.outbound_path(path, entry)
        );
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(query);
        }
        url
    }
}

fn has_segment(path: &str, segment: &str) -> bool {
    path.strip_prefix(segment)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}
