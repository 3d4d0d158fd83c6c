use std::path::PathBuf;
use std::time::Duration;

/// Endpoints and locations used to acquire releases.
#[derive(Clone, Debug)]
pub struct FetchConfig {
    /// JSON array of version strings, newest first.
    pub versions_url: String,
    /// Archive URL; `{version}` is replaced by the canonical version string.
    pub archive_url_template: String,
    /// Where releases are extracted, one `dragontail-<version>` folder each.
    pub download_root: PathBuf,
    /// Timeout applied to every HTTP request.
    pub request_timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            versions_url: "https://ddragon.leagueoflegends.com/api/versions.json".into(),
            archive_url_template: "https://ddragon.leagueoflegends.com/cdn/dragontail-{version}.tgz".into(),
            download_root: PathBuf::from("ddragon"),
            request_timeout: Duration::from_secs(600),
        }
    }
}
