use std::time::{Duration, SystemTime};

use aws_sdk_s3::{
    error::{DisplayErrorContext, SdkError},
    presigning::PresigningConfig,
    primitives::{ByteStream, DateTime},
    types::ObjectCannedAcl,
};

use crate::{adapters, model, util};

fn canned_acl(visibility: model::fs::Visibility) -> ObjectCannedAcl {
    match visibility {
        model::fs::Visibility::Private => ObjectCannedAcl::Private,
        model::fs::Visibility::PublicRead => ObjectCannedAcl::PublicRead,
    }
}

fn modified_time(last_modified: Option<&DateTime>) -> Option<SystemTime> {
    let dt = last_modified?;
    if dt.secs() < 0 {
        return None;
    }

    Some(SystemTime::UNIX_EPOCH + Duration::new(dt.secs() as u64, dt.subsec_nanos()))
}

/// `bucket/key` with every key segment percent-encoded; separators stay
/// literal.
fn encoded_copy_source(copy_source: &str) -> String {
    let (bucket, key) = match copy_source.split_once('/') {
        Some(parts) => parts,
        None => return urlencoding::encode(copy_source).into_owned(),
    };

    let key: Vec<_> = key.split('/').map(urlencoding::encode).collect();

    format!("{}/{}", bucket, key.join("/"))
}

/// Maps an SDK failure onto the adapter's error kinds by transport outcome
/// and HTTP status.
fn sdk_error<E>(op: &str, key: &str, err: SdkError<E>) -> model::fs::FSError
where
    E: std::error::Error + Send + Sync + 'static,
{
    let message = format!("failed to {} at: {}, {}", op, key, DisplayErrorContext(&err));

    if matches!(err, SdkError::TimeoutError(_) | SdkError::DispatchFailure(_)) {
        return model::fs::FSError::Transient(message);
    }

    match err.raw_response().map(|res| res.status().as_u16()) {
        Some(404) => model::fs::FSError::NotFound(message),
        Some(401) | Some(403) => model::fs::FSError::PermissionDenied(message),
        Some(status) if status == 429 || status >= 500 => model::fs::FSError::Transient(message),
        _ => model::fs::FSError::Other(message),
    }
}

impl adapters::adapter::ObjectAdapter for aws_sdk_s3::Client {
    fn fs_put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
        acl: Option<model::fs::Visibility>,
    ) -> Result<(), model::fs::FSError> {
        let req = self
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .set_content_type(content_type.map(|ct| ct.to_string()))
            .set_acl(acl.map(canned_acl));

        util::poll::poll_until_ready(req.send())
            .map_err(|err| sdk_error("put_object", key, err))?;

        Ok(())
    }

    fn fs_get_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<(model::s3::ObjectHead, Vec<u8>), model::fs::FSError> {
        let req = self.get_object().bucket(bucket).key(key);

        let o = util::poll::poll_until_ready(req.send())
            .map_err(|err| sdk_error("get_object", key, err))?;

        let head = model::s3::ObjectHead {
            key: key.to_string(),
            content_length: o.content_length().map(|len| len.max(0) as u64),
            content_type: o.content_type().map(|ct| ct.to_string()),
            last_modified: modified_time(o.last_modified()),
        };

        let bytes = util::poll::poll_until_ready(o.body.collect()).map_err(|err| {
            model::fs::FSError::Transient(format!("failed to collect body: {}, {}", key, err))
        })?;

        Ok((head, bytes.into_bytes().to_vec()))
    }

    fn fs_copy_object(
        &self,
        bucket: &str,
        copy_source: &str,
        key: &str,
    ) -> Result<(), model::fs::FSError> {
        let req = self
            .copy_object()
            .bucket(bucket)
            .key(key)
            .copy_source(encoded_copy_source(copy_source));

        util::poll::poll_until_ready(req.send())
            .map_err(|err| sdk_error("copy_object", copy_source, err))?;

        Ok(())
    }

    fn fs_delete_object(&self, bucket: &str, key: &str) -> Result<(), model::fs::FSError> {
        let req = self.delete_object().bucket(bucket).key(key);

        util::poll::poll_until_ready(req.send())
            .map_err(|err| sdk_error("delete_object", key, err))?;

        Ok(())
    }

    fn fs_list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: Option<&str>,
        marker: Option<&str>,
        max_keys: i32,
    ) -> Result<model::s3::ListPage, model::fs::FSError> {
        let mut req = self
            .list_objects()
            .bucket(bucket)
            .prefix(prefix)
            .max_keys(max_keys);

        if let Some(delimiter) = delimiter {
            req = req.delimiter(delimiter);
        }
        if let Some(marker) = marker {
            req = req.marker(marker);
        }

        let lo = util::poll::poll_until_ready(req.send())
            .map_err(|err| sdk_error("list_objects", prefix, err))?;

        let mut page = model::s3::ListPage::default();

        for o in lo.contents() {
            page.objects.push(model::s3::ListedObject {
                key: o.key().unwrap_or("").to_string(),
                size: o.size().unwrap_or(0).max(0) as u64,
                last_modified: modified_time(o.last_modified()),
            });
        }

        for cp in lo.common_prefixes() {
            if let Some(p) = cp.prefix() {
                page.common_prefixes.push(p.to_string());
            }
        }

        // NextMarker is only guaranteed when a delimiter was sent
        if lo.is_truncated().unwrap_or(false) {
            page.next_marker = lo
                .next_marker()
                .map(|m| m.to_string())
                .or_else(|| page.objects.last().map(|o| o.key.clone()));
        }

        Ok(page)
    }

    fn fs_head_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<model::s3::ObjectHead>, model::fs::FSError> {
        let req = self.head_object().bucket(bucket).key(key);

        let ho = match util::poll::poll_until_ready(req.send()) {
            Err(err) => {
                let err = sdk_error("head_object", key, err);
                if err.is_not_found() {
                    return Ok(None);
                }

                return Err(err);
            }
            Ok(ho) => ho,
        };

        Ok(Some(model::s3::ObjectHead {
            key: key.to_string(),
            content_length: ho.content_length().map(|len| len.max(0) as u64),
            content_type: ho.content_type().map(|ct| ct.to_string()),
            last_modified: modified_time(ho.last_modified()),
        }))
    }

    fn fs_get_object_acl(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Vec<model::s3::Grant>, model::fs::FSError> {
        let req = self.get_object_acl().bucket(bucket).key(key);

        let acl = util::poll::poll_until_ready(req.send())
            .map_err(|err| sdk_error("get_object_acl", key, err))?;

        let grants = acl
            .grants()
            .iter()
            .map(|g| model::s3::Grant {
                grantee_uri: g.grantee().and_then(|ge| ge.uri()).map(|uri| uri.to_string()),
                permission: g
                    .permission()
                    .map(|p| p.as_str().to_string())
                    .unwrap_or_default(),
            })
            .collect();

        Ok(grants)
    }

    fn fs_set_object_acl(
        &self,
        bucket: &str,
        key: &str,
        visibility: model::fs::Visibility,
    ) -> Result<(), model::fs::FSError> {
        let req = self
            .put_object_acl()
            .bucket(bucket)
            .key(key)
            .acl(canned_acl(visibility));

        util::poll::poll_until_ready(req.send())
            .map_err(|err| sdk_error("set_object_acl", key, err))?;

        Ok(())
    }

    fn fs_sign_url(
        &self,
        method: model::s3::SignMethod,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, model::fs::FSError> {
        let config = PresigningConfig::expires_in(expires_in).map_err(|err| {
            model::fs::FSError::Config(format!("invalid expiry for: {}, {}", key, err))
        })?;

        let presigned = match method {
            model::s3::SignMethod::Get => util::poll::poll_until_ready(
                self.get_object().bucket(bucket).key(key).presigned(config),
            )
            .map_err(|err| sdk_error("sign_url", key, err))?,
            model::s3::SignMethod::Put => util::poll::poll_until_ready(
                self.put_object().bucket(bucket).key(key).presigned(config),
            )
            .map_err(|err| sdk_error("sign_url", key, err))?,
            model::s3::SignMethod::Delete => util::poll::poll_until_ready(
                self.delete_object().bucket(bucket).key(key).presigned(config),
            )
            .map_err(|err| sdk_error("sign_url", key, err))?,
            model::s3::SignMethod::Head => util::poll::poll_until_ready(
                self.head_object().bucket(bucket).key(key).presigned(config),
            )
            .map_err(|err| sdk_error("sign_url", key, err))?,
        };

        Ok(presigned.uri().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modified_time() {
        let cases = vec![
            (Some(DateTime::from_secs(0)), Some(SystemTime::UNIX_EPOCH)),
            (
                Some(DateTime::from_secs(1_700_000_000)),
                Some(SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000)),
            ),
            (Some(DateTime::from_secs(-5)), None),
            (None, None),
        ];

        for (input, expected) in cases {
            assert_eq!(
                modified_time(input.as_ref()),
                expected,
                "failed for case: {:?}",
                input
            );
        }
    }

    #[test]
    fn test_encoded_copy_source() {
        let cases = vec![
            ("b/a.txt", "b/a.txt"),
            ("b/dir/sub/a.txt", "b/dir/sub/a.txt"),
            ("b/报告 v1+final.txt", "b/%E6%8A%A5%E5%91%8A%20v1%2Bfinal.txt"),
            ("b/100%/what?.txt", "b/100%25/what%3F.txt"),
            ("b/dir/", "b/dir/"),
            ("b/a-b_c.~d", "b/a-b_c.~d"),
        ];

        for (input, expected) in cases {
            assert_eq!(encoded_copy_source(input), expected, "failed for case: {}", input);
        }
    }

    #[test]
    fn test_canned_acl() {
        assert_eq!(
            canned_acl(model::fs::Visibility::Private),
            ObjectCannedAcl::Private
        );
        assert_eq!(
            canned_acl(model::fs::Visibility::PublicRead),
            ObjectCannedAcl::PublicRead
        );
    }
}
