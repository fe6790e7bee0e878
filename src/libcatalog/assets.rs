//! CDN addresses for image and file assets stored in the catalog.
//!
//! Asset references look like `image-<id>-<w>x<h>-<ext>` and
//! `file-<id>-<ext>`; anything else is rejected.

use log::warn;

const CDN_HOST: &str = "https://cdn.sanity.io";

#[derive(Debug, Clone)]
pub(crate) struct Cdn {
    pub project_id: String,
    pub dataset: String,
}

/// Optional transforms appended to an image URL.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ImageParams {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality: Option<u8>,
}

impl ImageParams {
    pub fn sized(width: u32, height: u32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            quality: None,
        }
    }
    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = Some(quality);
        self
    }
}

impl Cdn {
    pub fn new(project_id: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            dataset: dataset.into(),
        }
    }

    pub fn file_url(&self, asset_ref: &str) -> Option<String> {
        let mut parts = asset_ref.split('-');
        let (kind, id, ext) = (parts.next()?, parts.next()?, parts.next()?);
        if kind != "file" || id.is_empty() || ext.is_empty() || parts.next().is_some() {
            warn!("[Assets] Not a file reference: {:?}", asset_ref);
            return None;
        }
        Some(format!(
            "{}/files/{}/{}/{}.{}",
            CDN_HOST, self.project_id, self.dataset, id, ext
        ))
    }

    pub fn image_url(&self, asset_ref: &str, params: ImageParams) -> Option<String> {
        let mut parts = asset_ref.split('-');
        let (kind, id, dims, ext) = (parts.next()?, parts.next()?, parts.next()?, parts.next()?);
        let valid_dims = dims
            .split_once('x')
            .is_some_and(|(w, h)| w.parse::<u32>().is_ok() && h.parse::<u32>().is_ok());
        if kind != "image" || id.is_empty() || ext.is_empty() || !valid_dims || parts.next().is_some()
        {
            warn!("[Assets] Not an image reference: {:?}", asset_ref);
            return None;
        }

        let mut url = format!(
            "{}/images/{}/{}/{}-{}.{}",
            CDN_HOST, self.project_id, self.dataset, id, dims, ext
        );
        let query: Vec<String> = [
            params.width.map(|w| format!("w={w}")),
            params.height.map(|h| format!("h={h}")),
            params.quality.map(|q| format!("q={q}")),
        ]
        .into_iter()
        .flatten()
        .collect();
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query.join("&"));
        }
        Some(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cdn() -> Cdn {
        Cdn::new("xbw6uf6e", "production")
    }

    #[test]
    fn file_url_from_glb_ref() {
        assert_eq!(
            cdn().file_url("file-4f2a9c-glb").as_deref(),
            Some("https://cdn.sanity.io/files/xbw6uf6e/production/4f2a9c.glb")
        );
        assert_eq!(cdn().file_url("image-4f2a9c-10x10-png"), None);
        assert_eq!(cdn().file_url("file-4f2a9c"), None);
    }

    #[test]
    fn image_url_with_params() {
        let url = cdn().image_url("image-abc123-800x600-jpg", ImageParams::default());
        assert_eq!(
            url.as_deref(),
            Some("https://cdn.sanity.io/images/xbw6uf6e/production/abc123-800x600.jpg")
        );

        let url = cdn().image_url(
            "image-abc123-800x600-jpg",
            ImageParams::sized(80, 60).quality(70),
        );
        assert_eq!(
            url.as_deref(),
            Some("https://cdn.sanity.io/images/xbw6uf6e/production/abc123-800x600.jpg?w=80&h=60&q=70")
        );
    }

    #[test]
    fn image_url_rejects_malformed_refs() {
        assert_eq!(cdn().image_url("image-abc-800-jpg", ImageParams::default()), None);
        assert_eq!(cdn().image_url("file-abc-glb", ImageParams::default()), None);
        assert_eq!(cdn().image_url("", ImageParams::default()), None);
    }
}
