//! Resolution of icon nodes to rendered image URLs

use crate::client::DesignApi;
use crate::error::Result;
use crate::types::{IconRef, ImageFormat};
use tracing::{debug, warn};

/// Scale factor requested from the render endpoint
pub const RENDER_SCALE: u32 = 2;

/// Attach a rendered image URL to every icon
///
/// All ids go out in a single request. Icons the API returns no URL for keep
/// `image: None`; their download fails later.
///
/// # Errors
///
/// Any API error is returned as is; there is no retry.
pub async fn resolve_images(
    api: &dyn DesignApi,
    file_id: &str,
    mut icons: Vec<IconRef>,
    format: ImageFormat,
) -> Result<Vec<IconRef>> {
    if icons.is_empty() {
        debug!("no icons to resolve");
        return Ok(icons);
    }

    let ids: Vec<String> = icons.iter().map(|icon| icon.id.clone()).collect();
    let response = api.get_images(file_id, &ids, RENDER_SCALE, format).await?;
    let images = response.images;

    for icon in &mut icons {
        icon.image = images.get(&icon.id).cloned().flatten();
        if icon.image.is_none() {
            warn!(id = %icon.id, name = %icon.name, "no image URL returned for icon");
        }
    }

    debug!(count = icons.len(), %format, "resolved image URLs");
    Ok(icons)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::types::{FileResponse, ImagesResponse};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeApi {
        images: HashMap<String, Option<String>>,
        fail: bool,
        calls: Mutex<Vec<(Vec<String>, u32, ImageFormat)>>,
    }

    #[async_trait]
    impl DesignApi for FakeApi {
        async fn get_file(&self, _file_id: &str) -> Result<FileResponse> {
            unreachable!("not used by the resolver")
        }

        async fn get_images(
            &self,
            _file_id: &str,
            ids: &[String],
            scale: u32,
            format: ImageFormat,
        ) -> Result<ImagesResponse> {
            self.calls
                .lock()
                .unwrap()
                .push((ids.to_vec(), scale, format));
            if self.fail {
                return Err(Error::Api {
                    status: 500,
                    message: "boom".into(),
                });
            }
            Ok(ImagesResponse {
                err: None,
                images: self.images.clone(),
            })
        }
    }

    #[tokio::test]
    async fn attaches_urls_by_id_in_one_batch() {
        let api = FakeApi {
            images: HashMap::from([
                ("1".to_string(), Some("https://cdn/1".to_string())),
                ("2".to_string(), Some("https://cdn/2".to_string())),
            ]),
            ..Default::default()
        };
        let icons = vec![IconRef::new("1", "a/b/one"), IconRef::new("2", "a/b/two")];

        let resolved = resolve_images(&api, "F", icons, ImageFormat::Svg)
            .await
            .unwrap();

        assert_eq!(resolved[0].image.as_deref(), Some("https://cdn/1"));
        assert_eq!(resolved[1].image.as_deref(), Some("https://cdn/2"));
        let calls = api.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], (vec!["1".into(), "2".into()], 2, ImageFormat::Svg));
    }

    #[tokio::test]
    async fn missing_or_null_ids_leave_image_empty() {
        let api = FakeApi {
            images: HashMap::from([("2".to_string(), None)]),
            ..Default::default()
        };
        let icons = vec![IconRef::new("1", "x"), IconRef::new("2", "y")];
        let resolved = resolve_images(&api, "F", icons, ImageFormat::Png)
            .await
            .unwrap();
        assert!(resolved.iter().all(|i| i.image.is_none()));
    }

    #[tokio::test]
    async fn api_error_is_fatal() {
        let api = FakeApi {
            fail: true,
            ..Default::default()
        };
        let result = resolve_images(&api, "F", vec![IconRef::new("1", "x")], ImageFormat::Svg).await;
        assert!(matches!(result, Err(Error::Api { status: 500, .. })));
    }

    #[tokio::test]
    async fn empty_input_skips_request() {
        let api = FakeApi::default();
        let resolved = resolve_images(&api, "F", Vec::new(), ImageFormat::Svg)
            .await
            .unwrap();
        assert!(resolved.is_empty());
        assert!(api.calls.lock().unwrap().is_empty());
    }
}
