use std::time::Duration;

use crate::model;

/// Request/response seam to the object store.
///
/// Implementations block until the store answers. A missing object on
/// `fs_head_object` is `Ok(None)`; everywhere else it is `FSError::NotFound`.
pub trait ObjectAdapter: Send + Sync {
    fn fs_put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
        acl: Option<model::fs::Visibility>,
    ) -> Result<(), model::fs::FSError>;

    fn fs_get_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<(model::s3::ObjectHead, Vec<u8>), model::fs::FSError>;

    fn fs_copy_object(
        &self,
        bucket: &str,
        copy_source: &str,
        key: &str,
    ) -> Result<(), model::fs::FSError>;

    fn fs_delete_object(&self, bucket: &str, key: &str) -> Result<(), model::fs::FSError>;

    fn fs_list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: Option<&str>,
        marker: Option<&str>,
        max_keys: i32,
    ) -> Result<model::s3::ListPage, model::fs::FSError>;

    fn fs_head_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<model::s3::ObjectHead>, model::fs::FSError>;

    fn fs_get_object_acl(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Vec<model::s3::Grant>, model::fs::FSError>;

    fn fs_set_object_acl(
        &self,
        bucket: &str,
        key: &str,
        visibility: model::fs::Visibility,
    ) -> Result<(), model::fs::FSError>;

    fn fs_sign_url(
        &self,
        method: model::s3::SignMethod,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, model::fs::FSError>;
}

impl<T: ObjectAdapter + ?Sized> ObjectAdapter for std::sync::Arc<T> {
    fn fs_put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
        acl: Option<model::fs::Visibility>,
    ) -> Result<(), model::fs::FSError> {
        (**self).fs_put_object(bucket, key, body, content_type, acl)
    }

    fn fs_get_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<(model::s3::ObjectHead, Vec<u8>), model::fs::FSError> {
        (**self).fs_get_object(bucket, key)
    }

    fn fs_copy_object(
        &self,
        bucket: &str,
        copy_source: &str,
        key: &str,
    ) -> Result<(), model::fs::FSError> {
        (**self).fs_copy_object(bucket, copy_source, key)
    }

    fn fs_delete_object(&self, bucket: &str, key: &str) -> Result<(), model::fs::FSError> {
        (**self).fs_delete_object(bucket, key)
    }

    fn fs_list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: Option<&str>,
        marker: Option<&str>,
        max_keys: i32,
    ) -> Result<model::s3::ListPage, model::fs::FSError> {
        (**self).fs_list_objects(bucket, prefix, delimiter, marker, max_keys)
    }

    fn fs_head_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<model::s3::ObjectHead>, model::fs::FSError> {
        (**self).fs_head_object(bucket, key)
    }

    fn fs_get_object_acl(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Vec<model::s3::Grant>, model::fs::FSError> {
        (**self).fs_get_object_acl(bucket, key)
    }

    fn fs_set_object_acl(
        &self,
        bucket: &str,
        key: &str,
        visibility: model::fs::Visibility,
    ) -> Result<(), model::fs::FSError> {
        (**self).fs_set_object_acl(bucket, key, visibility)
    }

    fn fs_sign_url(
        &self,
        method: model::s3::SignMethod,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, model::fs::FSError> {
        (**self).fs_sign_url(method, bucket, key, expires_in)
    }
}
