use std::{
    io::{Cursor, ErrorKind, Read},
    time::Duration,
};

use time::OffsetDateTime;
use tracing::{error, info, span, Level};

use crate::{filesystem::Filesystem, fs, model, util};

const DIRECTORY_MIMETYPE: &str = "application/x-directory";

fn logged<T>(
    error_group: &str,
    result: Result<T, model::fs::FSError>,
) -> Result<T, model::fs::FSError> {
    if let Err(err) = &result {
        error!(error_message=%err, error_group=error_group, error_kind=err.group());
    }

    result
}

impl fs::ObjectFS {
    fn put(
        &self,
        path: &str,
        body: Vec<u8>,
        options: &model::fs::WriteOptions,
    ) -> Result<model::fs::FileInfo, model::fs::FSError> {
        let key = self.key(path);
        let mimetype = self.mimetype_for(path, options);
        let size = body.len() as u64;

        logged(
            "put_object",
            self.client().fs_put_object(
                self.bucket(),
                &key,
                body,
                Some(&mimetype),
                options.visibility,
            ),
        )?;

        Ok(model::fs::FileInfo {
            kind: model::fs::FileType::File,
            path: self.prefix().remove(&key).to_string(),
            timestamp: None,
            size: Some(size),
            mimetype: Some(mimetype),
        })
    }

    fn head(&self, path: &str) -> Result<model::s3::ObjectHead, model::fs::FSError> {
        let key = self.key(path);

        match logged("head_object", self.client().fs_head_object(self.bucket(), &key))? {
            Some(head) => Ok(head),
            None => Err(model::fs::FSError::NotFound(format!("no object at: {}", key))),
        }
    }
}

impl Filesystem for fs::ObjectFS {
    fn write(
        &self,
        path: &str,
        contents: &[u8],
        options: &model::fs::WriteOptions,
    ) -> Result<model::fs::FileInfo, model::fs::FSError> {
        let span = span!(Level::INFO, "write", context = "write");
        let _e = span.enter();
        info!(path = path, size = contents.len(), "called");

        self.put(path, contents.to_vec(), options)
    }

    fn write_stream(
        &self,
        path: &str,
        reader: &mut dyn Read,
        options: &model::fs::WriteOptions,
    ) -> Result<model::fs::FileInfo, model::fs::FSError> {
        let span = span!(Level::INFO, "write_stream", context = "write_stream");
        let _e = span.enter();
        info!(path = path, chunk_size = self.chunk_size(), "called");

        let mut body = Vec::new();
        let mut chunk = vec![0u8; self.chunk_size()];
        loop {
            match reader.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => body.extend_from_slice(&chunk[..n]),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    error!(error_message=%err, error_group="read_stream");
                    return Err(err.into());
                }
            }
        }

        self.put(path, body, options)
    }

    /// Paths naming the same key leave the object untouched.
    fn rename(&self, from: &str, to: &str) -> Result<(), model::fs::FSError> {
        let span = span!(Level::INFO, "rename", context = "rename");
        let _e = span.enter();
        info!(from = from, to = to, "called");

        if self.key(from) == self.key(to) {
            if !self.has(from)? {
                return logged(
                    "rename",
                    Err(model::fs::FSError::NotFound(format!("no object at: {}", from))),
                );
            }

            return Ok(());
        }

        self.copy(from, to)?;
        self.delete(from)
    }

    fn copy(&self, from: &str, to: &str) -> Result<(), model::fs::FSError> {
        let span = span!(Level::INFO, "copy", context = "copy");
        let _e = span.enter();
        info!(from = from, to = to, "called");

        logged(
            "copy_object",
            self.client()
                .fs_copy_object(self.bucket(), &self.copy_source(from), &self.key(to)),
        )
    }

    /// Deletes, then checks the object is really gone.
    fn delete(&self, path: &str) -> Result<(), model::fs::FSError> {
        let span = span!(Level::INFO, "delete", context = "delete");
        let _e = span.enter();
        info!(path = path, "called");

        logged(
            "delete_object",
            self.client().fs_delete_object(self.bucket(), &self.key(path)),
        )?;

        if self.has(path)? {
            error!(path = path, error_group = "delete_object", "object still present");
            return Err(model::fs::FSError::Other(format!(
                "object still present after delete: {}",
                path
            )));
        }

        Ok(())
    }

    fn delete_dir(&self, dirname: &str) -> Result<(), model::fs::FSError> {
        let span = span!(Level::INFO, "delete_dir", context = "delete_dir");
        let _e = span.enter();
        info!(dirname = dirname, "called");

        let dir = util::object::dir_key(dirname);
        if dir.is_empty() {
            return Err(model::fs::FSError::Config(
                "refusing to delete the disk root".to_string(),
            ));
        }

        let dir_key = self.key(&dir);
        let listing = self.list_dir_objects(&dir_key, true)?;

        for object in &listing.objects {
            logged(
                "delete_object",
                self.client().fs_delete_object(self.bucket(), &object.key),
            )?;
        }

        // directory markers never show up as listed objects
        for marker in listing.prefixes.iter().rev().chain(std::iter::once(&dir_key)) {
            logged(
                "delete_object",
                self.client().fs_delete_object(self.bucket(), marker),
            )?;
        }

        let remaining = self.list_dir_objects(&dir_key, false)?;
        if !remaining.objects.is_empty() || !remaining.prefixes.is_empty() {
            error!(
                dirname = dirname,
                error_group = "delete_dir",
                "directory not empty after delete"
            );
            return Err(model::fs::FSError::Other(format!(
                "directory still has contents after delete: {}",
                dirname
            )));
        }

        Ok(())
    }

    /// Writes a zero-byte marker object named `dirname/`.
    fn create_dir(
        &self,
        dirname: &str,
        options: &model::fs::WriteOptions,
    ) -> Result<model::fs::FileInfo, model::fs::FSError> {
        let span = span!(Level::INFO, "create_dir", context = "create_dir");
        let _e = span.enter();
        info!(dirname = dirname, "called");

        let dir = util::object::dir_key(dirname);
        if dir.is_empty() {
            return Err(model::fs::FSError::Config(
                "directory name must not be empty".to_string(),
            ));
        }

        logged(
            "put_object",
            self.client().fs_put_object(
                self.bucket(),
                &self.key(&dir),
                Vec::new(),
                Some(DIRECTORY_MIMETYPE),
                options.visibility,
            ),
        )?;

        Ok(model::fs::FileInfo::dir(&dir))
    }

    fn set_visibility(
        &self,
        path: &str,
        visibility: model::fs::Visibility,
    ) -> Result<model::fs::Visibility, model::fs::FSError> {
        let span = span!(Level::INFO, "set_visibility", context = "set_visibility");
        let _e = span.enter();
        info!(path = path, visibility = %visibility, "called");

        logged(
            "set_object_acl",
            self.client()
                .fs_set_object_acl(self.bucket(), &self.key(path), visibility),
        )?;

        Ok(visibility)
    }

    fn has(&self, path: &str) -> Result<bool, model::fs::FSError> {
        let span = span!(Level::INFO, "has", context = "has");
        let _e = span.enter();
        info!(path = path, "called");

        let head = logged(
            "head_object",
            self.client().fs_head_object(self.bucket(), &self.key(path)),
        )?;

        Ok(head.is_some())
    }

    fn read(&self, path: &str) -> Result<model::fs::ReadResult, model::fs::FSError> {
        let span = span!(Level::INFO, "read", context = "read");
        let _e = span.enter();
        info!(path = path, "called");

        let (head, contents) = logged(
            "get_object",
            self.client().fs_get_object(self.bucket(), &self.key(path)),
        )?;

        let mut info = self.normalize_head(&head);
        if info.size.is_none() {
            info.size = Some(contents.len() as u64);
        }

        Ok(model::fs::ReadResult { info, contents })
    }

    fn read_stream(&self, path: &str) -> Result<model::fs::ReadStream, model::fs::FSError> {
        let span = span!(Level::INFO, "read_stream", context = "read_stream");
        let _e = span.enter();
        info!(path = path, "called");

        let (_, contents) = logged(
            "get_object",
            self.client().fs_get_object(self.bucket(), &self.key(path)),
        )?;

        Ok(model::fs::ReadStream {
            path: path.trim_start_matches('/').to_string(),
            stream: Box::new(Cursor::new(contents)),
        })
    }

    fn list_contents(
        &self,
        directory: &str,
        recursive: bool,
    ) -> Result<Vec<model::fs::FileInfo>, model::fs::FSError> {
        let span = span!(Level::INFO, "list_contents", context = "list_contents");
        let _e = span.enter();
        info!(directory = directory, recursive = recursive, "called");

        let dir_key = self.key(&util::object::dir_key(directory));
        let listing = self.list_dir_objects(&dir_key, recursive)?;

        let mut contents: Vec<model::fs::FileInfo> = listing
            .objects
            .iter()
            .map(|object| self.normalize_listed(object))
            .collect();

        if self.list_metadata() {
            for (info, object) in contents.iter_mut().zip(&listing.objects) {
                let head = logged(
                    "head_object",
                    self.client().fs_head_object(self.bucket(), &object.key),
                )?;
                info.mimetype = head.and_then(|head| head.content_type);
            }
        }

        contents.extend(
            listing
                .prefixes
                .iter()
                .map(|prefix| model::fs::FileInfo::dir(self.prefix().remove(prefix))),
        );

        Ok(contents)
    }

    fn get_metadata(&self, path: &str) -> Result<model::fs::FileInfo, model::fs::FSError> {
        let span = span!(Level::INFO, "get_metadata", context = "get_metadata");
        let _e = span.enter();
        info!(path = path, "called");

        let head = self.head(path)?;

        Ok(self.normalize_head(&head))
    }

    fn get_size(&self, path: &str) -> Result<u64, model::fs::FSError> {
        let span = span!(Level::INFO, "get_size", context = "get_size");
        let _e = span.enter();
        info!(path = path, "called");

        self.head(path)?.content_length.ok_or_else(|| {
            model::fs::FSError::Other(format!("no content length reported for: {}", path))
        })
    }

    fn get_mimetype(&self, path: &str) -> Result<String, model::fs::FSError> {
        let span = span!(Level::INFO, "get_mimetype", context = "get_mimetype");
        let _e = span.enter();
        info!(path = path, "called");

        self.head(path)?.content_type.ok_or_else(|| {
            model::fs::FSError::Other(format!("no content type reported for: {}", path))
        })
    }

    fn get_timestamp(&self, path: &str) -> Result<i64, model::fs::FSError> {
        let span = span!(Level::INFO, "get_timestamp", context = "get_timestamp");
        let _e = span.enter();
        info!(path = path, "called");

        self.head(path)?
            .last_modified
            .and_then(fs::unix_secs)
            .ok_or_else(|| {
                model::fs::FSError::Other(format!("no modification time reported for: {}", path))
            })
    }

    fn get_visibility(&self, path: &str) -> Result<model::fs::Visibility, model::fs::FSError> {
        let span = span!(Level::INFO, "get_visibility", context = "get_visibility");
        let _e = span.enter();
        info!(path = path, "called");

        let grants = logged(
            "get_object_acl",
            self.client().fs_get_object_acl(self.bucket(), &self.key(path)),
        )?;

        if grants.iter().any(|grant| grant.grants_public_read()) {
            return Ok(model::fs::Visibility::PublicRead);
        }

        Ok(model::fs::Visibility::Private)
    }

    fn sign_url(
        &self,
        path: &str,
        expires_in: Duration,
        method: model::s3::SignMethod,
    ) -> Result<String, model::fs::FSError> {
        let span = span!(Level::INFO, "sign_url", context = "sign_url");
        let _e = span.enter();
        info!(path = path, expires_in = expires_in.as_secs(), method = %method, "called");

        logged(
            "sign_url",
            self.client()
                .fs_sign_url(method, self.bucket(), &self.key(path), expires_in),
        )
    }

    fn temporary_url(
        &self,
        path: &str,
        expiration: OffsetDateTime,
    ) -> Result<String, model::fs::FSError> {
        let span = span!(Level::INFO, "temporary_url", context = "temporary_url");
        let _e = span.enter();
        info!(path = path, expiration = %expiration, "called");

        let expires_in = logged("temporary_url", fs::expires_in(expiration))?;

        self.sign_url(path, expires_in, model::s3::SignMethod::Get)
    }

    fn get_url(&self, path: &str) -> String {
        self.public_url(path)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::adapters::mock::MockClient;

    const BUCKET: &str = "dummy-bucket";

    fn object_fs(prefix: Option<&str>) -> (Arc<MockClient>, fs::ObjectFS) {
        let client = Arc::new(MockClient::new());
        let fs = fs::ObjectFS::new(Box::new(client.clone()), BUCKET)
            .with_endpoint("https://obs.example.com", false)
            .with_prefix(prefix);

        (client, fs)
    }

    fn opts() -> model::fs::WriteOptions {
        model::fs::WriteOptions::default()
    }

    #[test]
    fn test_write_then_read() {
        let cases = vec![
            (None, "a.txt", "a.txt"),
            (None, "/nested/dir/b.json", "nested/dir/b.json"),
            (Some("tenant"), "c.png", "tenant/c.png"),
        ];

        for (prefix, path, key) in cases {
            let (client, fs) = object_fs(prefix);
            let body = format!("contents of {}", path).into_bytes();

            let written = fs.write(path, &body, &opts()).unwrap();
            let expected_path = path.trim_start_matches('/');
            assert_eq!(written.path, expected_path, "failed on `path` for case: {}", path);
            assert_eq!(
                written.size,
                Some(body.len() as u64),
                "failed on `size` for case: {}",
                path
            );

            let read = fs.read(path).unwrap();
            assert_eq!(read.contents, body, "failed on `contents` for case: {}", path);
            assert_eq!(
                read.info.path, expected_path,
                "failed on `info.path` for case: {}",
                path
            );
            assert_eq!(
                client.keys(BUCKET),
                vec![key.to_string()],
                "failed on `key` for case: {}",
                path
            );
        }
    }

    #[test]
    fn test_write_sets_mimetype_and_visibility() {
        let (_, fs) = object_fs(None);

        let written = fs
            .write(
                "report.pdf",
                b"%PDF",
                &opts().with_visibility(model::fs::Visibility::PublicRead),
            )
            .unwrap();

        assert_eq!(written.mimetype.as_deref(), Some("application/pdf"));
        assert_eq!(fs.get_mimetype("report.pdf").unwrap(), "application/pdf");
        assert_eq!(
            fs.get_visibility("report.pdf").unwrap(),
            model::fs::Visibility::PublicRead
        );
    }

    #[test]
    fn test_write_stream_in_chunks() {
        let client = Arc::new(MockClient::new());
        let fs = fs::ObjectFS::new(Box::new(client.clone()), BUCKET).with_chunk_size(3);
        let body: Vec<u8> = (0..100u8).collect();

        let written = fs
            .write_stream("stream.bin", &mut Cursor::new(body.clone()), &opts())
            .unwrap();
        assert_eq!(written.size, Some(100));

        let mut stream = fs.read_stream("stream.bin").unwrap();
        let mut read_back = Vec::new();
        stream.stream.read_to_end(&mut read_back).unwrap();

        assert_eq!(stream.path, "stream.bin");
        assert_eq!(read_back, body);
    }

    #[test]
    fn test_update_overwrites() {
        let (_, fs) = object_fs(None);

        fs.write("a.txt", b"first", &opts()).unwrap();
        fs.update("a.txt", b"second", &opts()).unwrap();
        fs.update_stream("b.txt", &mut Cursor::new(b"third".to_vec()), &opts())
            .unwrap();

        assert_eq!(fs.read("a.txt").unwrap().contents, b"second");
        assert_eq!(fs.read("b.txt").unwrap().contents, b"third");
    }

    #[test]
    fn test_delete_then_has() {
        let (_, fs) = object_fs(Some("tenant"));

        fs.write("a.txt", b"x", &opts()).unwrap();
        assert!(fs.has("a.txt").unwrap());

        fs.delete("a.txt").unwrap();
        assert!(!fs.has("a.txt").unwrap());
    }

    #[test]
    fn test_delete_reverifies() {
        let (client, fs) = object_fs(None);

        fs.write("a.txt", b"x", &opts()).unwrap();
        client.ignore_deletes(true);

        assert!(matches!(fs.delete("a.txt"), Err(model::fs::FSError::Other(_))));
    }

    #[test]
    fn test_copy() {
        let (client, fs) = object_fs(Some("tenant"));

        fs.write("a.txt", b"x", &opts()).unwrap();
        fs.copy("a.txt", "b.txt").unwrap();

        assert_eq!(
            client.calls().last().unwrap(),
            &format!("copy_object:{}/tenant/a.txt", BUCKET)
        );
        assert_eq!(fs.read("b.txt").unwrap().contents, b"x");
        assert!(fs.has("a.txt").unwrap());
    }

    #[test]
    fn test_rename() {
        let (_, fs) = object_fs(None);

        fs.write("a.txt", b"x", &opts()).unwrap();
        fs.rename("a.txt", "b.txt").unwrap();

        assert!(!fs.has("a.txt").unwrap());
        assert_eq!(fs.read("b.txt").unwrap().contents, b"x");
    }

    #[test]
    fn test_rename_onto_same_key() {
        let cases = vec![("a.txt", "a.txt"), ("a.txt", "/a.txt"), ("/a.txt", "a.txt")];

        for (from, to) in cases {
            let (client, fs) = object_fs(Some("tenant"));
            fs.write("a.txt", b"keep me", &opts()).unwrap();

            fs.rename(from, to).unwrap();

            assert_eq!(
                fs.read("a.txt").unwrap().contents,
                b"keep me",
                "failed for case: {} -> {}",
                from,
                to
            );
            assert_eq!(client.count_calls("copy_object"), 0);
            assert_eq!(client.count_calls("delete_object"), 0);
        }

        let (_, fs) = object_fs(None);
        assert!(matches!(
            fs.rename("missing.txt", "/missing.txt"),
            Err(model::fs::FSError::NotFound(_))
        ));
    }

    #[test]
    fn test_rename_copy_failure_skips_delete() {
        let (client, fs) = object_fs(None);

        fs.write("a.txt", b"x", &opts()).unwrap();
        client.fail("copy_object", model::fs::FSError::PermissionDenied);

        let result = fs.rename("a.txt", "b.txt");

        assert!(matches!(result, Err(model::fs::FSError::PermissionDenied(_))));
        assert_eq!(client.count_calls("delete_object"), 0);
        assert!(fs.has("a.txt").unwrap());
    }

    #[test]
    fn test_create_dir() {
        let (client, fs) = object_fs(Some("tenant"));

        let info = fs.create_dir("/photos/", &opts()).unwrap();

        assert_eq!(info, model::fs::FileInfo::dir("photos"));
        assert_eq!(client.keys(BUCKET), vec!["tenant/photos/".to_string()]);
        assert!(fs.list_contents("photos", false).unwrap().is_empty());
        assert!(matches!(fs.create_dir("/", &opts()), Err(model::fs::FSError::Config(_))));
    }

    #[test]
    fn test_delete_dir() {
        let (client, fs) = object_fs(None);

        fs.create_dir("docs", &opts()).unwrap();
        fs.create_dir("docs/empty", &opts()).unwrap();
        for path in ["docs/a.txt", "docs/sub/b.txt", "docs/sub/deep/c.txt", "keep.txt"] {
            fs.write(path, b"x", &opts()).unwrap();
        }

        fs.delete_dir("docs").unwrap();

        assert_eq!(client.keys(BUCKET), vec!["keep.txt".to_string()]);
        assert!(matches!(fs.delete_dir(""), Err(model::fs::FSError::Config(_))));
    }

    #[test]
    fn test_list_contents_immediate_children() {
        let (_, fs) = object_fs(Some("tenant"));

        for path in ["dir/a.txt", "dir/b.txt", "dir/sub/c.txt", "dir/sub/deep/d.txt", "other.txt"] {
            fs.write(path, b"x", &opts()).unwrap();
        }

        let cases = vec![
            ("dir", vec![("dir/a.txt", false), ("dir/b.txt", false), ("dir/sub", true)]),
            ("dir/", vec![("dir/a.txt", false), ("dir/b.txt", false), ("dir/sub", true)]),
            ("", vec![("other.txt", false), ("dir", true)]),
            ("missing", vec![]),
        ];

        for (directory, expected) in cases {
            let contents = fs.list_contents(directory, false).unwrap();
            let result: Vec<(&str, bool)> = contents
                .iter()
                .map(|info| (info.path.as_str(), info.is_dir()))
                .collect();

            assert_eq!(result, expected, "failed for case: {}", directory);
        }
    }

    #[test]
    fn test_list_contents_recursive() {
        let (_, fs) = object_fs(None);

        for path in ["dir/a.txt", "dir/sub/c.txt", "dir/sub/deep/d.txt", "other.txt"] {
            fs.write(path, b"xy", &opts()).unwrap();
        }

        let contents = fs.list_contents("dir", true).unwrap();

        let files: Vec<&str> = contents
            .iter()
            .filter(|info| info.is_file())
            .map(|info| info.path.as_str())
            .collect();
        let dirs: Vec<&str> = contents
            .iter()
            .filter(|info| info.is_dir())
            .map(|info| info.path.as_str())
            .collect();

        assert_eq!(files, vec!["dir/a.txt", "dir/sub/c.txt", "dir/sub/deep/d.txt"]);
        assert_eq!(dirs, vec!["dir/sub", "dir/sub/deep"]);
        assert!(contents.iter().filter(|i| i.is_file()).all(|i| i.size == Some(2)));
    }

    #[test]
    fn test_list_contents_recursive_pages() {
        let (client, fs) = object_fs(None);

        for i in 0..1200 {
            fs.write(&format!("logs/2024/{:04}.log", i), b"x", &opts()).unwrap();
        }
        for i in 0..1001 {
            fs.write(&format!("logs/{:04}.log", i), b"x", &opts()).unwrap();
        }

        let contents = fs.list_contents("logs", true).unwrap();

        assert_eq!(contents.iter().filter(|i| i.is_file()).count(), 2201);
        assert_eq!(contents.iter().filter(|i| i.is_dir()).count(), 1);
        assert_eq!(client.count_calls("list_objects"), 4);
    }

    #[test]
    fn test_list_contents_with_metadata() {
        let (client, fs) = object_fs(Some("tenant"));

        fs.write("dir/a.json", b"{}", &opts()).unwrap();
        fs.write("dir/b.bin", b"x", &opts().with_mimetype("application/x-custom"))
            .unwrap();
        fs.write("dir/sub/c.txt", b"x", &opts()).unwrap();

        let plain = fs.list_contents("dir", false).unwrap();
        assert!(plain.iter().all(|info| info.mimetype.is_none()));
        assert_eq!(client.count_calls("head_object"), 0);

        let fs = fs.with_list_metadata(true);
        let contents = fs.list_contents("dir", true).unwrap();
        let result: Vec<(&str, Option<&str>)> = contents
            .iter()
            .map(|info| (info.path.as_str(), info.mimetype.as_deref()))
            .collect();

        assert_eq!(
            result,
            vec![
                ("dir/a.json", Some("application/json")),
                ("dir/b.bin", Some("application/x-custom")),
                ("dir/sub/c.txt", Some("text/plain")),
                ("dir/sub", None),
            ]
        );
        assert_eq!(client.count_calls("head_object"), 3);
    }

    #[test]
    fn test_metadata_projections() {
        let (_, fs) = object_fs(None);

        fs.write("data.json", b"{\"a\":1}", &opts()).unwrap();

        let meta = fs.get_metadata("data.json").unwrap();
        assert_eq!(meta.kind, model::fs::FileType::File);
        assert_eq!(meta.path, "data.json");
        assert_eq!(meta.size, Some(7));
        assert_eq!(meta.mimetype.as_deref(), Some("application/json"));
        assert!(meta.timestamp.is_some());

        assert_eq!(fs.get_size("data.json").unwrap(), 7);
        assert_eq!(fs.get_timestamp("data.json").unwrap(), meta.timestamp.unwrap());
        assert!(matches!(
            fs.get_metadata("missing.json"),
            Err(model::fs::FSError::NotFound(_))
        ));
        assert!(matches!(fs.get_size("missing.json"), Err(model::fs::FSError::NotFound(_))));
    }

    #[test]
    fn test_visibility() {
        let (_, fs) = object_fs(None);

        fs.write("a.txt", b"x", &opts()).unwrap();
        assert_eq!(fs.get_visibility("a.txt").unwrap(), model::fs::Visibility::Private);

        let cases = vec![
            model::fs::Visibility::PublicRead,
            model::fs::Visibility::Private,
            model::fs::Visibility::PublicRead,
        ];

        for visibility in cases {
            assert_eq!(fs.set_visibility("a.txt", visibility).unwrap(), visibility);
            assert_eq!(
                fs.get_visibility("a.txt").unwrap(),
                visibility,
                "failed for case: {}",
                visibility
            );
        }
    }

    #[test]
    fn test_sign_url() {
        let (_, fs) = object_fs(Some("tenant"));

        let url = fs
            .sign_url("a.txt", Duration::from_secs(300), model::s3::SignMethod::Put)
            .unwrap();
        assert_eq!(url, "memory://dummy-bucket/tenant/a.txt?method=PUT&expires=300");

        let url = fs
            .temporary_url("a.txt", OffsetDateTime::now_utc() + time::Duration::hours(1))
            .unwrap();
        assert!(url.starts_with("memory://dummy-bucket/tenant/a.txt?method=GET&expires=35"));

        assert!(matches!(
            fs.temporary_url("a.txt", OffsetDateTime::now_utc() - time::Duration::hours(1)),
            Err(model::fs::FSError::Config(_))
        ));
    }

    #[test]
    fn test_get_url() {
        let (_, fs) = object_fs(Some("tenant"));
        assert_eq!(fs.get_url("/a.txt"), "https://dummy-bucket.obs.example.com/tenant/a.txt");

        let fs = fs.with_cdn_domain(Some("https://cdn.example.com/"));
        assert_eq!(fs.get_url("/a.txt"), "https://cdn.example.com/tenant/a.txt");
    }

    #[test]
    fn test_vendor_failures_surface_as_errors() {
        let (client, fs) = object_fs(None);
        fs.write("a.txt", b"x", &opts()).unwrap();

        client.fail("put_object", model::fs::FSError::Transient);
        client.fail("get_object", model::fs::FSError::PermissionDenied);
        client.fail("list_objects", model::fs::FSError::Transient);
        client.fail("head_object", model::fs::FSError::Other);

        assert!(matches!(fs.write("b.txt", b"x", &opts()), Err(model::fs::FSError::Transient(_))));
        assert!(matches!(fs.read("a.txt"), Err(model::fs::FSError::PermissionDenied(_))));
        assert!(matches!(fs.read_stream("a.txt"), Err(model::fs::FSError::PermissionDenied(_))));
        assert!(matches!(fs.list_contents("", true), Err(model::fs::FSError::Transient(_))));
        assert!(matches!(fs.has("a.txt"), Err(model::fs::FSError::Other(_))));
    }
}
