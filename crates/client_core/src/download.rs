//! Save-as hand-off for the generated drawing.

use shared::protocol::{PDF_SUGGESTED_FILENAME, TUNNEL_BYPASS_HEADER, TUNNEL_BYPASS_VALUE};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: Url,
    pub suggested_filename: String,
}

impl DownloadRequest {
    /// Adds the tunnel bypass query parameter to an absolute PDF URL.
    ///
    /// The pair goes through `query_pairs_mut`, so a URL without a query gets
    /// `?` rather than a blindly concatenated `&`.
    pub fn for_pdf(pdf_url: &str) -> Result<Self, url::ParseError> {
        let mut url = Url::parse(pdf_url)?;
        url.query_pairs_mut()
            .append_pair(TUNNEL_BYPASS_HEADER, TUNNEL_BYPASS_VALUE);
        Ok(Self {
            url,
            suggested_filename: PDF_SUGGESTED_FILENAME.to_string(),
        })
    }
}

/// Starts a platform save-as for a URL. Completion is not reported back.
pub trait SaveAsTrigger: Send + Sync {
    fn save_as(&self, request: DownloadRequest);
}

impl<F> SaveAsTrigger for F
where
    F: Fn(DownloadRequest) + Send + Sync,
{
    fn save_as(&self, request: DownloadRequest) {
        self(request)
    }
}
