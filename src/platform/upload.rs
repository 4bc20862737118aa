//! Chunked media upload over `fetch`
//!
//! Each chunk is posted as multipart form data with a `Content-Range`
//! header and a shared upload id; the host assembles them and answers the
//! final chunk with the stored file's details.

use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, FormData, Request, RequestInit, Response};

use crate::media::{HostResponse, MediaCategory, MediaDescriptor, UploadError, UploadPlan};

/// Where uploads go
#[derive(Debug, Clone)]
pub struct UploadTarget {
    /// Media host account name
    pub cloud_name: String,
    /// Unsigned upload preset
    pub upload_preset: String,
}

impl UploadTarget {
    /// Configured at build time; `None` when the site has no media host
    pub fn from_build_env() -> Option<Self> {
        Some(Self {
            cloud_name: option_env!("MEDIA_CLOUD_NAME")?.to_string(),
            upload_preset: option_env!("MEDIA_UPLOAD_PRESET")?.to_string(),
        })
    }

    fn endpoint(&self, category: MediaCategory) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/{}/upload",
            self.cloud_name,
            category.resource_type()
        )
    }
}

fn js_error(value: wasm_bindgen::JsValue) -> UploadError {
    UploadError::Network(
        value
            .as_string()
            .unwrap_or_else(|| format!("{value:?}")),
    )
}

/// Upload `blob`, reporting fractional progress after every chunk
pub async fn upload(
    target: &UploadTarget,
    blob: &Blob,
    category: MediaCategory,
    mut on_progress: impl FnMut(f64),
) -> Result<MediaDescriptor, UploadError> {
    let plan = UploadPlan::new(category, blob.size() as u64)?;
    let window = web_sys::window().ok_or_else(|| UploadError::Network("no window".into()))?;
    let endpoint = target.endpoint(category);
    let upload_id = format!("wish-{}", js_sys::Date::now() as u64);

    log::info!(
        "Uploading {} bytes of {} in {} chunks",
        plan.total,
        category.as_str(),
        plan.chunks.len()
    );
    on_progress(0.0);

    let mut last_body = String::new();
    for chunk in &plan.chunks {
        let part = blob
            .slice_with_f64_and_f64(chunk.start as f64, (chunk.end + 1) as f64)
            .map_err(js_error)?;

        let form = FormData::new().map_err(js_error)?;
        form.append_with_blob("file", &part).map_err(js_error)?;
        form.append_with_str("upload_preset", &target.upload_preset)
            .map_err(js_error)?;

        let init = RequestInit::new();
        init.set_method("POST");
        init.set_body(&form);
        let request = Request::new_with_str_and_init(&endpoint, &init).map_err(js_error)?;
        let headers = request.headers();
        headers
            .set("Content-Range", &chunk.content_range(plan.total))
            .map_err(js_error)?;
        headers
            .set("X-Unique-Upload-Id", &upload_id)
            .map_err(js_error)?;

        let response: Response = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(js_error)?
            .dyn_into()
            .map_err(js_error)?;
        let text = JsFuture::from(response.text().map_err(js_error)?)
            .await
            .map_err(js_error)?
            .as_string()
            .unwrap_or_default();

        if !response.ok() {
            let message = HostResponse::parse(&text)
                .ok()
                .and_then(|r| r.error)
                .map(|e| e.message)
                .unwrap_or_else(|| format!("HTTP {}", response.status()));
            log::warn!("Chunk {} rejected: {message}", chunk.content_range(plan.total));
            return Err(UploadError::Rejected(message));
        }

        on_progress(plan.progress(chunk.end + 1));
        last_body = text;
    }

    let descriptor = HostResponse::parse(&last_body)?.into_descriptor(&plan)?;
    log::info!("Upload complete: {}", descriptor.file_url);
    Ok(descriptor)
}
