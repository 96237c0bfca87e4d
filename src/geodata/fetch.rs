use std::{fs, io, path::Path};

use crate::error::FetchError;

use super::request::RequestMeta;

pub trait GeodataFetcher {
    fn fetch(&self, request: &RequestMeta) -> Result<String, FetchError>;
}

/// Fetches `http(s)://` URLs over HTTP and treats anything else as a local file path.
pub struct DefaultFetcher {
    user_agent: String,
}

impl DefaultFetcher {
    pub fn new() -> Self {
        Self {
            user_agent: "choropleth-rust".to_string(),
        }
    }

    fn fetch_http(&self, request: &RequestMeta) -> Result<String, FetchError> {
        let transport_error = |err: reqwest::Error| FetchError::Transport {
            url: request.url.clone(),
            reason: err.to_string(),
        };
        let client = reqwest::blocking::Client::builder()
            .user_agent(&self.user_agent)
            .build()
            .map_err(transport_error)?;
        let mut builder = client.get(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        let response = builder.send().map_err(transport_error)?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(request.url.clone()));
        }
        let response = response.error_for_status().map_err(transport_error)?;
        response.text().map_err(transport_error)
    }

    fn fetch_file(&self, request: &RequestMeta) -> Result<String, FetchError> {
        let filepath = request
            .url
            .strip_prefix("file://")
            .unwrap_or(&request.url);
        fs::read_to_string(Path::new(filepath)).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => FetchError::NotFound(request.url.clone()),
            _ => FetchError::Transport {
                url: request.url.clone(),
                reason: err.to_string(),
            },
        })
    }
}

impl Default for DefaultFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl GeodataFetcher for DefaultFetcher {
    fn fetch(&self, request: &RequestMeta) -> Result<String, FetchError> {
        if request.url.starts_with("http://") || request.url.starts_with("https://") {
            log::info!("Downloading geodata from {}", request.url);
            self.fetch_http(request)
        } else {
            log::info!("Reading geodata from {}", request.url);
            self.fetch_file(request)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use testdir::testdir;

    use crate::{
        error::FetchError,
        geodata::request::RequestMeta,
    };

    use super::{DefaultFetcher, GeodataFetcher};

    #[test]
    fn test_fetch_local_file() {
        let test_dir = testdir!();
        let filepath = test_dir.join("regions.geojson");
        fs::write(&filepath, "{}").unwrap();

        let fetcher = DefaultFetcher::new();
        let plain = fetcher
            .fetch(&RequestMeta::new(filepath.to_str().unwrap()))
            .unwrap();
        assert_eq!(plain, "{}");
        let with_scheme = fetcher
            .fetch(&RequestMeta::new(&format!(
                "file://{}",
                filepath.to_str().unwrap()
            )))
            .unwrap();
        assert_eq!(with_scheme, "{}");
    }

    #[test]
    fn test_fetch_missing_file_is_not_found() {
        let test_dir = testdir!();
        let filepath = test_dir.join("missing.geojson");
        let result = DefaultFetcher::new().fetch(&RequestMeta::new(filepath.to_str().unwrap()));
        assert!(matches!(result, Err(FetchError::NotFound(_))));
    }
}
