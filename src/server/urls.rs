use crate::config::{API_VERSION, Settings};
use crate::error::{Error, Result};
use url::Url;

/// URL of an API resource below the configured server, e.g. `courses`
pub(crate) fn api_url(settings: &Settings, resource: &str) -> Result<Url> {
    let base = settings.server_url.trim().trim_end_matches('/');
    if base.is_empty() {
        return Err(Error::Config {
            message: "server URL is not set".to_string(),
            key: Some("server_url".to_string()),
        });
    }
    with_client_params(settings, &format!("{base}/{}", resource.trim_start_matches('/')))
}

/// Parse `raw` and attach `api_version`, `client` and `client_version`
///
/// Parameters already present on a server-supplied URL are left as they are.
pub(crate) fn with_client_params(settings: &Settings, raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim())?;
    let present: Vec<String> = url.query_pairs().map(|(k, _)| k.into_owned()).collect();

    let params = [
        ("api_version", API_VERSION.to_string()),
        ("client", settings.client_name.clone()),
        ("client_version", settings.client_version.clone()),
    ];

    {
        let mut query = url.query_pairs_mut();
        for (key, value) in params {
            if !present.iter().any(|p| p == key) {
                query.append_pair(key, &value);
            }
        }
    }

    Ok(url)
}
