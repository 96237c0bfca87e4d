use crate::error::{ChoroplethError, FetchError};

use super::{
    feature::Feature,
    fetch::GeodataFetcher,
    format::GeodataFormat,
    request::{decorate_with_auth, Credentials, RequestMeta},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Pending,
    Loaded,
    /// Loading finished with an error. The message is meant for the user.
    Failed(String),
}

impl LoadStatus {
    pub fn is_complete(&self) -> bool {
        !matches!(self, LoadStatus::Pending)
    }
}

#[derive(Debug, Clone)]
pub struct GeodataSource {
    pub url: String,
    pub format_type: Option<String>,
    pub feature_collection_path: Option<String>,
    pub credentials: Option<Credentials>,
}

impl GeodataSource {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            format_type: None,
            feature_collection_path: None,
            credentials: None,
        }
    }
}

#[derive(Debug)]
enum LoadError {
    Fetch(FetchError),
    Decode(ChoroplethError),
}

/// Fetch and decode the features of `source`. Returns the user facing message on failure.
pub fn load_features(
    source: &GeodataSource,
    fetcher: &dyn GeodataFetcher,
) -> Result<Vec<Feature>, String> {
    try_load_features(source, fetcher).map_err(|err| failure_message(&source.url, &err))
}

fn try_load_features(
    source: &GeodataSource,
    fetcher: &dyn GeodataFetcher,
) -> Result<Vec<Feature>, LoadError> {
    let format = GeodataFormat::parse(
        source.format_type.as_deref(),
        source.feature_collection_path.as_deref(),
    )
    .map_err(LoadError::Decode)?;
    let mut request = RequestMeta::new(&source.url);
    decorate_with_auth(&mut request, source.credentials.as_ref());
    let contents = fetcher.fetch(&request).map_err(LoadError::Fetch)?;
    format.decode(&contents).map_err(LoadError::Decode)
}

fn failure_message(url: &str, err: &LoadError) -> String {
    match err {
        LoadError::Fetch(FetchError::NotFound(_)) => format!(
            "Server responding with '404' when attempting to fetch {url}. \
             Make sure the file exists at that location."
        ),
        LoadError::Fetch(FetchError::Transport { reason, .. }) => {
            log::debug!("Fetch of {} failed: {}", url, reason);
            format!(
                "Cannot download {url} file. Please ensure the CORS configuration of the \
                 server permits requests from this host."
            )
        }
        LoadError::Decode(err) => format!("Cannot read vector data from {url}. {err}"),
    }
}
