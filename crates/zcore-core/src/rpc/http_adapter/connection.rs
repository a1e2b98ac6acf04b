use std::path::Path;

use reqwest::Url;

use crate::config::BackendConfig;
use crate::error::CoreError;

/// Basic-auth credentials for the daemon's RPC port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Credentials {
    pub(super) user: String,
    pub(super) pass: String,
}

impl Credentials {
    /// Read the cookie zcored writes to its data directory when started
    /// without `rpcpassword`: a single `__cookie__:<token>` line.
    fn from_cookie_file(path: &Path) -> Result<Self, CoreError> {
        let cookie_error =
            |what: &str| CoreError::Configuration(format!("rpc cookie {}: {what}", path.display()));

        let content = std::fs::read_to_string(path).map_err(|e| cookie_error(&e.to_string()))?;
        let first_line = content.lines().next().unwrap_or_default().trim();
        match first_line.split_once(':') {
            Some((user, pass)) if !user.is_empty() && !pass.is_empty() => Ok(Self {
                user: user.to_owned(),
                pass: pass.to_owned(),
            }),
            _ => Err(cookie_error("expected a `user:password` line")),
        }
    }
}

/// Pick credentials from the config: explicit user and password first, then
/// the cookie file, otherwise none.
pub(super) fn resolve_auth(config: &BackendConfig) -> Result<Option<Credentials>, CoreError> {
    match (&config.rpc_user, &config.rpc_pass) {
        (Some(user), Some(pass)) => Ok(Some(Credentials {
            user: user.clone(),
            pass: pass.clone(),
        })),
        (None, None) => config
            .rpc_cookie_file
            .as_deref()
            .map(Credentials::from_cookie_file)
            .transpose(),
        _ => Err(CoreError::Configuration(
            "rpc_user and rpc_pass must be given together".to_owned(),
        )),
    }
}

/// The daemon only speaks plain HTTP or HTTPS.
pub(super) fn rpc_endpoint(rpc_url: &str) -> Result<Url, CoreError> {
    let url = Url::parse(rpc_url)
        .map_err(|e| CoreError::Configuration(format!("invalid rpc_url `{rpc_url}`: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(CoreError::Configuration(format!(
            "rpc_url scheme `{}` is not http or https",
            url.scheme()
        )));
    }
    Ok(url)
}
