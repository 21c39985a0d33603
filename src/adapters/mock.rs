use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex, MutexGuard,
    },
    time::{Duration, SystemTime},
};

use crate::{adapters, model};

#[derive(Clone, Debug)]
struct StoredObject {
    body: Vec<u8>,
    content_type: Option<String>,
    last_modified: SystemTime,
    visibility: model::fs::Visibility,
}

type Buckets = HashMap<String, BTreeMap<String, StoredObject>>;

/// In-memory object store speaking the same listing rules as the real one
/// (sorted keys, delimiter rollup, marker continuation, page limits).
#[derive(Default)]
pub struct MockClient {
    buckets: Mutex<Buckets>,
    failures: Mutex<HashMap<String, fn(String) -> model::fs::FSError>>,
    calls: Mutex<Vec<String>>,
    ignore_deletes: AtomicBool,
}

fn lock<'a, T>(mutex: &'a Mutex<T>, name: &str) -> Result<MutexGuard<'a, T>, model::fs::FSError> {
    mutex.lock().map_err(|err| {
        model::fs::FSError::Other(format!("failed to acquire `{}` guard: {}", name, err))
    })
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later call of `op` fail with the given error kind.
    pub fn fail(&self, op: &str, error: fn(String) -> model::fs::FSError) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.insert(op.to_string(), error);
        }
    }

    pub fn recover(&self, op: &str) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.remove(op);
        }
    }

    /// Accept deletes without removing anything.
    pub fn ignore_deletes(&self, ignore: bool) {
        self.ignore_deletes.store(ignore, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    pub fn count_calls(&self, op: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.split(':').next() == Some(op))
            .count()
    }

    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.buckets
            .lock()
            .map(|buckets| {
                buckets
                    .get(bucket)
                    .map(|objects| objects.keys().cloned().collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }

    fn enter(&self, op: &str, key: &str) -> Result<(), model::fs::FSError> {
        lock(&self.calls, "calls")?.push(format!("{}:{}", op, key));

        if let Some(error) = lock(&self.failures, "failures")?.get(op) {
            return Err(error(format!("injected failure on {} at: {}", op, key)));
        }

        Ok(())
    }
}

impl adapters::adapter::ObjectAdapter for MockClient {
    fn fs_put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
        acl: Option<model::fs::Visibility>,
    ) -> Result<(), model::fs::FSError> {
        self.enter("put_object", key)?;

        lock(&self.buckets, "buckets")?
            .entry(bucket.to_string())
            .or_default()
            .insert(
                key.to_string(),
                StoredObject {
                    body,
                    content_type: content_type.map(|ct| ct.to_string()),
                    last_modified: SystemTime::now(),
                    visibility: acl.unwrap_or(model::fs::Visibility::Private),
                },
            );

        Ok(())
    }

    fn fs_get_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<(model::s3::ObjectHead, Vec<u8>), model::fs::FSError> {
        self.enter("get_object", key)?;

        let buckets = lock(&self.buckets, "buckets")?;
        let obj = buckets
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .ok_or_else(|| {
                model::fs::FSError::NotFound(format!("failed to get_object: {}", key))
            })?;

        Ok((head(key, obj), obj.body.clone()))
    }

    fn fs_copy_object(
        &self,
        bucket: &str,
        copy_source: &str,
        key: &str,
    ) -> Result<(), model::fs::FSError> {
        self.enter("copy_object", copy_source)?;

        let (source_bucket, source_key) = copy_source.split_once('/').ok_or_else(|| {
            model::fs::FSError::Other(format!("malformed copy source: {}", copy_source))
        })?;

        let mut buckets = lock(&self.buckets, "buckets")?;
        let mut obj = buckets
            .get(source_bucket)
            .and_then(|objects| objects.get(source_key))
            .cloned()
            .ok_or_else(|| {
                model::fs::FSError::NotFound(format!("failed to copy_object: {}", copy_source))
            })?;

        obj.last_modified = SystemTime::now();
        buckets
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), obj);

        Ok(())
    }

    fn fs_delete_object(&self, bucket: &str, key: &str) -> Result<(), model::fs::FSError> {
        self.enter("delete_object", key)?;

        if self.ignore_deletes.load(Ordering::SeqCst) {
            return Ok(());
        }

        if let Some(objects) = lock(&self.buckets, "buckets")?.get_mut(bucket) {
            objects.remove(key);
        }

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
        self.enter("list_objects", prefix)?;

        let buckets = lock(&self.buckets, "buckets")?;
        let mut page = model::s3::ListPage::default();
        let Some(objects) = buckets.get(bucket) else {
            return Ok(page);
        };

        let max_keys = max_keys.max(1) as usize;
        let marker = marker.unwrap_or("");
        let mut taken = 0;
        let mut last_entry: Option<String> = None;

        for (key, obj) in objects.iter() {
            if !key.starts_with(prefix) || key.as_str() <= marker {
                continue;
            }

            let rollup = delimiter.and_then(|d| {
                key[prefix.len()..]
                    .find(d)
                    .map(|idx| key[..prefix.len() + idx + d.len()].to_string())
            });

            if let Some(common) = rollup {
                if common.as_str() <= marker || page.common_prefixes.last() == Some(&common) {
                    continue;
                }
                if taken == max_keys {
                    page.next_marker = last_entry;
                    break;
                }
                last_entry = Some(common.clone());
                page.common_prefixes.push(common);
            } else {
                if taken == max_keys {
                    page.next_marker = last_entry;
                    break;
                }
                last_entry = Some(key.clone());
                page.objects.push(model::s3::ListedObject {
                    key: key.clone(),
                    size: obj.body.len() as u64,
                    last_modified: Some(obj.last_modified),
                });
            }
            taken += 1;
        }

        Ok(page)
    }

    fn fs_head_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<model::s3::ObjectHead>, model::fs::FSError> {
        self.enter("head_object", key)?;

        let buckets = lock(&self.buckets, "buckets")?;
        Ok(buckets
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .map(|obj| head(key, obj)))
    }

    fn fs_get_object_acl(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Vec<model::s3::Grant>, model::fs::FSError> {
        self.enter("get_object_acl", key)?;

        let buckets = lock(&self.buckets, "buckets")?;
        let obj = buckets
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .ok_or_else(|| {
                model::fs::FSError::NotFound(format!("failed to get_object_acl: {}", key))
            })?;

        let mut grants = vec![model::s3::Grant {
            grantee_uri: None,
            permission: "FULL_CONTROL".to_string(),
        }];
        if obj.visibility == model::fs::Visibility::PublicRead {
            grants.push(model::s3::Grant {
                grantee_uri: Some(model::s3::ALL_USERS_URI.to_string()),
                permission: "READ".to_string(),
            });
        }

        Ok(grants)
    }

    fn fs_set_object_acl(
        &self,
        bucket: &str,
        key: &str,
        visibility: model::fs::Visibility,
    ) -> Result<(), model::fs::FSError> {
        self.enter("set_object_acl", key)?;

        let mut buckets = lock(&self.buckets, "buckets")?;
        let obj = buckets
            .get_mut(bucket)
            .and_then(|objects| objects.get_mut(key))
            .ok_or_else(|| {
                model::fs::FSError::NotFound(format!("failed to set_object_acl: {}", key))
            })?;
        obj.visibility = visibility;

        Ok(())
    }

    fn fs_sign_url(
        &self,
        method: model::s3::SignMethod,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, model::fs::FSError> {
        self.enter("sign_url", key)?;

        Ok(format!(
            "memory://{}/{}?method={}&expires={}",
            bucket,
            key,
            method,
            expires_in.as_secs()
        ))
    }
}

fn head(key: &str, obj: &StoredObject) -> model::s3::ObjectHead {
    model::s3::ObjectHead {
        key: key.to_string(),
        content_length: Some(obj.body.len() as u64),
        content_type: obj.content_type.clone(),
        last_modified: Some(obj.last_modified),
    }
}
