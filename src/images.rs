use crate::{
    config::ImageHostConfig,
    error::{ImageHostCredsSnafu, ImageHostSnafu, ImageUploadRejectedSnafu, SsisResult},
};
use rand::{Rng, rng};
use s3::{Bucket, Region, creds::Credentials};
use secrecy::ExposeSecret;
use snafu::{ResultExt, ensure};
use std::sync::Arc;

///Hard cap on profile pictures, checked before anything leaves the process.
pub const MAX_PICTURE_BYTES: usize = 1024 * 1024;

const ALLOWED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

///Returns the lowercased extension if the filename is an acceptable picture.
pub fn allowed_extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

///Extracts the object key (`folder/name.ext`) back out of a stored public URL.
///
///Foreign URLs (wrong folder, no extension, trailing path segments) give `None`
///so we never fire deletes at objects we did not put there.
pub fn public_id_from_url<'a>(url: &'a str, folder: &str) -> Option<&'a str> {
    let needle = format!("/{folder}/");
    let at = url.find(&needle)?;
    let key = &url[at + 1..];
    let name = key.strip_prefix(folder)?.strip_prefix('/')?;
    if name.is_empty() || name.contains('/') || !name.contains('.') {
        return None;
    }
    Some(key)
}

const fn is_success(code: u16) -> bool {
    200 <= code && code < 300
}

fn content_type_for(bytes: &[u8], extension: &str) -> String {
    infer::get(bytes).map_or_else(
        || match extension {
            "png" => "image/png".into(),
            _ => "image/jpeg".into(),
        },
        |ty| ty.mime_type().to_string(),
    )
}

///Client for the external image host, S3 wire protocol.
#[derive(Clone, Debug)]
pub struct ImageStore {
    bucket: Arc<Bucket>,
    folder: String,
    public_base: String,
}

impl ImageStore {
    pub fn new(config: &ImageHostConfig) -> SsisResult<Self> {
        let credentials = Credentials::new(
            Some(config.access_key.as_str()),
            Some(config.secret_key.expose_secret()),
            None,
            None,
            None,
        )
        .context(ImageHostCredsSnafu)?;

        let bucket = Bucket::new(
            &config.bucket,
            Region::Custom {
                region: config.region.clone(),
                endpoint: config.endpoint.clone(),
            },
            credentials,
        )
        .context(ImageHostSnafu)?
        .with_path_style();

        Ok(Self {
            bucket: Arc::new(*bucket),
            folder: config.folder.clone(),
            public_base: config.public_base.trim_end_matches('/').to_string(),
        })
    }

    ///Uploads a validated picture, returning its public URL. Nothing is
    ///written locally until the caller sees this succeed.
    pub async fn upload(&self, bytes: &[u8], extension: &str) -> SsisResult<String> {
        let key = format!("{}/{:016x}.{extension}", self.folder, rng().random::<u64>());
        let content_type = content_type_for(bytes, extension);

        let response = self
            .bucket
            .put_object_with_content_type(&key, bytes, &content_type)
            .await
            .context(ImageHostSnafu)?;

        let code = response.status_code();
        ensure!(is_success(code), ImageUploadRejectedSnafu { code });

        Ok(format!("{}/{key}", self.public_base))
    }

    ///Destroys the hosted object behind a stored picture URL. URLs we cannot
    ///claim as ours are left alone.
    pub async fn destroy(&self, url: &str) -> SsisResult<()> {
        let Some(public_id) = public_id_from_url(url, &self.folder) else {
            warn!(?url, "picture URL has no recognisable public id, skipping destroy");
            return Ok(());
        };

        let response = self
            .bucket
            .delete_object(public_id)
            .await
            .context(ImageHostSnafu)?;

        let code = response.status_code();
        if !is_success(code) {
            warn!(code, public_id, "Image host answered delete with non-2xx");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions_gate_on_the_last_dot() {
        assert_eq!(allowed_extension("me.png"), Some("png".into()));
        assert_eq!(allowed_extension("me.JPG"), Some("jpg".into()));
        assert_eq!(allowed_extension("archive.tar.jpeg"), Some("jpeg".into()));
        assert_eq!(allowed_extension("me.png.exe"), None);
        assert_eq!(allowed_extension("me.gif"), None);
        assert_eq!(allowed_extension("no_extension"), None);
        assert_eq!(allowed_extension(""), None);
    }

    #[test]
    fn public_id_roundtrips_our_url_scheme() {
        let url = "https://img.example.org/pictures/ssis/00ff00ff00ff00ff.png";
        assert_eq!(
            public_id_from_url(url, "ssis"),
            Some("ssis/00ff00ff00ff00ff.png")
        );
    }

    #[test]
    fn public_id_rejects_foreign_urls() {
        assert_eq!(
            public_id_from_url("https://img.example.org/other/abc.png", "ssis"),
            None
        );
        assert_eq!(
            public_id_from_url("https://img.example.org/ssis/nested/abc.png", "ssis"),
            None
        );
        assert_eq!(
            public_id_from_url("https://img.example.org/ssis/noextension", "ssis"),
            None
        );
        assert_eq!(public_id_from_url("not even a url", "ssis"), None);
    }

    #[test]
    fn only_2xx_counts_as_success() {
        assert!(is_success(200));
        assert!(is_success(204));
        assert!(!is_success(199));
        assert!(!is_success(300));
        assert!(!is_success(404));
        assert!(!is_success(500));
    }

    #[test]
    fn content_type_falls_back_to_the_extension() {
        assert_eq!(content_type_for(&[], "png"), "image/png");
        assert_eq!(content_type_for(&[], "jpg"), "image/jpeg");

        let png_magic = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(content_type_for(&png_magic, "jpg"), "image/png");
    }
}
