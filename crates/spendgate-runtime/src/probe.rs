use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagModel>,
}

#[derive(Debug, Deserialize)]
struct TagModel {
    name: String,
}

/// Check that the local provider is up and serves `model`. Any error
/// (connection refused, timeout, bad payload) reads as "unavailable", and
/// the caller aborts the local switch instead of blocking.
pub fn local_model_available(base_url: &str, model: &str) -> bool {
    let url = format!("{}/api/tags", base_url.trim_end_matches('/'));
    let client = match reqwest::blocking::Client::builder()
        .timeout(PROBE_TIMEOUT)
        .build()
    {
        Ok(client) => client,
        Err(err) => {
            warn!(%err, "failed to build probe client");
            return false;
        }
    };

    let tags: TagsResponse = match client.get(&url).send().and_then(|r| r.error_for_status()) {
        Ok(response) => match response.json() {
            Ok(tags) => tags,
            Err(err) => {
                warn!(%err, "local provider returned unparseable tag list");
                return false;
            }
        },
        Err(err) => {
            warn!(%err, %url, "local provider probe failed");
            return false;
        }
    };

    // Exact match, or a tagless request matching any tag of that model.
    let requested_base = model.split(':').next().unwrap_or(model);
    let tagless = !model.contains(':');
    let found = tags.models.iter().any(|m| {
        m.name == model || (tagless && m.name.split(':').next() == Some(requested_base))
    });
    if !found {
        debug!(model, "local provider is up but the model is not pulled");
    }
    found
}
