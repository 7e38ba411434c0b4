//! WebHDFS REST client.
//!
//! Maps the [`SnapshotFileSystem`] operations onto the namenode's
//! `/webhdfs/v1` endpoint:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | snapshottable listing | `GET /?op=GETSNAPSHOTTABLEDIRECTORYLIST` |
//! | directory listing | `GET <path>?op=LISTSTATUS` |
//! | create | `PUT <dir>?op=CREATESNAPSHOT&snapshotname=<name>` |
//! | delete | `DELETE <dir>?op=DELETESNAPSHOT&snapshotname=<name>` |

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::error::{FsError, FsResult};
use crate::path;
use crate::{DirectoryEntry, SnapshotFileSystem, SnapshottableDirectory};

const WEBHDFS_PREFIX: [&str; 2] = ["webhdfs", "v1"];

/// Blocking client for one namenode.
pub struct WebHdfsClient {
    client: Client,
    base_url: Url,
    user: Option<String>,
}

impl WebHdfsClient {
    pub fn new(base_url: Url, user: Option<String>, timeout: Duration) -> FsResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        if let Some(user) = &user {
            debug!(user = %user, "Using WebHDFS pseudo authentication");
        }

        Ok(Self {
            client,
            base_url,
            user,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the request URL for `op` against an absolute filesystem path.
    fn operation_url(&self, fs_path: &str, op: &str, params: &[(&str, &str)]) -> FsResult<Url> {
        build_operation_url(&self.base_url, fs_path, op, self.user.as_deref(), params)
    }

    fn execute(&self, request: RequestBuilder, fs_path: &str) -> FsResult<Response> {
        let response = request.send()?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        let error = parse_remote_error(status, fs_path, &body);
        if !error.is_not_found() {
            warn!(path = %fs_path, status = %status, error = %error, "WebHDFS request failed");
        }
        Err(error)
    }

    fn read_body(response: Response, endpoint: &Url) -> FsResult<String> {
        response.text().map_err(|e| FsError::InvalidResponse {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })
    }
}

impl SnapshotFileSystem for WebHdfsClient {
    fn name(&self) -> &'static str {
        "webhdfs"
    }

    fn list_snapshottable_directories(&self) -> FsResult<Vec<SnapshottableDirectory>> {
        let url = self.operation_url("/", "GETSNAPSHOTTABLEDIRECTORYLIST", &[])?;
        debug!(url = %url, "Listing snapshottable directories");

        let response = self.execute(self.client.get(url.clone()), "/")?;
        let body = Self::read_body(response, &url)?;
        parse_snapshottable_list(&body, &url)
    }

    fn list_entries(&self, fs_path: &str) -> FsResult<Vec<DirectoryEntry>> {
        let url = self.operation_url(fs_path, "LISTSTATUS", &[])?;
        debug!(url = %url, "Listing directory");

        let response = self.execute(self.client.get(url.clone()), fs_path)?;
        let body = Self::read_body(response, &url)?;
        parse_file_statuses(&body, &url)
    }

    fn create_snapshot(&self, directory: &str, name: &str) -> FsResult<String> {
        let url = self.operation_url(directory, "CREATESNAPSHOT", &[("snapshotname", name)])?;
        debug!(url = %url, "Creating snapshot");

        let response = self.execute(self.client.put(url.clone()), directory)?;
        let body = Self::read_body(response, &url)?;
        parse_created_path(&body, &url)
    }

    fn delete_snapshot(&self, directory: &str, name: &str) -> FsResult<()> {
        let url = self.operation_url(directory, "DELETESNAPSHOT", &[("snapshotname", name)])?;
        debug!(url = %url, "Deleting snapshot");

        self.execute(self.client.delete(url), directory)?;
        Ok(())
    }
}

fn build_operation_url(
    base_url: &Url,
    fs_path: &str,
    op: &str,
    user: Option<&str>,
    params: &[(&str, &str)],
) -> FsResult<Url> {
    if !path::is_absolute(fs_path) {
        return Err(FsError::InvalidPath(fs_path.to_string()));
    }

    let mut url = base_url.clone();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| FsError::InvalidPath(base_url.to_string()))?;
        segments.pop_if_empty().extend(WEBHDFS_PREFIX);

        let fs_segments: Vec<&str> = fs_path.split('/').filter(|s| !s.is_empty()).collect();
        if fs_segments.is_empty() {
            // The root is addressed as `/webhdfs/v1/`
            segments.push("");
        } else {
            segments.extend(fs_segments);
        }
    }

    {
        let mut query = url.query_pairs_mut();
        query.clear().append_pair("op", op);
        if let Some(user) = user {
            query.append_pair("user.name", user);
        }
        for (key, value) in params {
            query.append_pair(key, value);
        }
    }

    Ok(url)
}

// --- Response bodies ---

#[derive(Debug, Deserialize)]
struct RemoteExceptionEnvelope {
    #[serde(rename = "RemoteException")]
    remote_exception: RemoteException,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteException {
    exception: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct FileStatusesEnvelope {
    #[serde(rename = "FileStatuses")]
    file_statuses: FileStatuses,
}

#[derive(Debug, Deserialize)]
struct FileStatuses {
    #[serde(rename = "FileStatus", default)]
    file_status: Vec<FileStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileStatus {
    path_suffix: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct SnapshottableListEnvelope {
    /// `null` when no directory is snapshottable
    #[serde(rename = "SnapshottableDirectoryList", default)]
    directories: Option<Vec<SnapshottableEntry>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshottableEntry {
    dir_status: DirStatus,
    /// Empty or `null` for the root directory
    #[serde(default)]
    parent_full_path: Option<String>,
    #[serde(default)]
    snapshot_number: u32,
    #[serde(default)]
    snapshot_quota: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DirStatus {
    path_suffix: String,
    #[serde(default)]
    owner: String,
    #[serde(default)]
    group: String,
    #[serde(default)]
    permission: String,
}

#[derive(Debug, Deserialize)]
struct PathEnvelope {
    #[serde(rename = "Path")]
    path: String,
}

fn invalid_response(endpoint: &Url, err: serde_json::Error) -> FsError {
    FsError::InvalidResponse {
        endpoint: endpoint.to_string(),
        reason: err.to_string(),
    }
}

fn parse_remote_error(status: StatusCode, fs_path: &str, body: &str) -> FsError {
    match serde_json::from_str::<RemoteExceptionEnvelope>(body) {
        Ok(envelope) if envelope.remote_exception.exception == "FileNotFoundException" => {
            FsError::not_found(fs_path)
        }
        Ok(envelope) => FsError::remote(
            envelope.remote_exception.exception,
            envelope.remote_exception.message,
        ),
        Err(_) if status == StatusCode::NOT_FOUND => FsError::not_found(fs_path),
        Err(_) => {
            let message = if body.trim().is_empty() {
                "empty response body".to_string()
            } else {
                body.trim().to_string()
            };
            FsError::remote(format!("HTTP {}", status), message)
        }
    }
}

fn full_path(parent: Option<&str>, suffix: &str) -> String {
    let parent = parent.filter(|p| !p.is_empty()).unwrap_or("/");
    path::join(parent, suffix)
}

fn parse_snapshottable_list(body: &str, endpoint: &Url) -> FsResult<Vec<SnapshottableDirectory>> {
    let envelope: SnapshottableListEnvelope =
        serde_json::from_str(body).map_err(|e| invalid_response(endpoint, e))?;

    Ok(envelope
        .directories
        .unwrap_or_default()
        .into_iter()
        .map(|entry| SnapshottableDirectory {
            path: full_path(entry.parent_full_path.as_deref(), &entry.dir_status.path_suffix),
            snapshot_count: entry.snapshot_number,
            snapshot_quota: entry.snapshot_quota,
            owner: entry.dir_status.owner,
            group: entry.dir_status.group,
            permission: entry.dir_status.permission,
        })
        .collect())
}

fn parse_file_statuses(body: &str, endpoint: &Url) -> FsResult<Vec<DirectoryEntry>> {
    let envelope: FileStatusesEnvelope =
        serde_json::from_str(body).map_err(|e| invalid_response(endpoint, e))?;

    Ok(envelope
        .file_statuses
        .file_status
        .into_iter()
        .map(|status| DirectoryEntry {
            name: status.path_suffix,
            is_directory: status.kind == "DIRECTORY",
        })
        .collect())
}

fn parse_created_path(body: &str, endpoint: &Url) -> FsResult<String> {
    let envelope: PathEnvelope =
        serde_json::from_str(body).map_err(|e| invalid_response(endpoint, e))?;
    Ok(envelope.path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("http://nn:9870").unwrap()
    }

    #[test]
    fn test_operation_url_for_directory() {
        let url = build_operation_url(
            &base(),
            "/data/warehouse",
            "CREATESNAPSHOT",
            Some("hdfs"),
            &[("snapshotname", "hadoopit-60-2014.01.01.1.1.1.000-hourly")],
        )
        .unwrap();

        assert_eq!(
            url.as_str(),
            "http://nn:9870/webhdfs/v1/data/warehouse?op=CREATESNAPSHOT&user.name=hdfs\
             &snapshotname=hadoopit-60-2014.01.01.1.1.1.000-hourly"
        );
    }

    #[test]
    fn test_operation_url_for_root_and_snapshot_namespace() {
        let root = build_operation_url(&base(), "/", "GETSNAPSHOTTABLEDIRECTORYLIST", None, &[])
            .unwrap();
        assert_eq!(
            root.as_str(),
            "http://nn:9870/webhdfs/v1/?op=GETSNAPSHOTTABLEDIRECTORYLIST"
        );

        let listing = build_operation_url(&base(), "/a/.snapshot", "LISTSTATUS", None, &[]).unwrap();
        assert_eq!(listing.path(), "/webhdfs/v1/a/.snapshot");
    }

    #[test]
    fn test_operation_url_keeps_base_path_and_escapes() {
        let base = Url::parse("https://gateway.example.com/nn1/").unwrap();
        let url = build_operation_url(&base, "/my dir", "LISTSTATUS", None, &[]).unwrap();
        assert_eq!(url.path(), "/nn1/webhdfs/v1/my%20dir");
    }

    #[test]
    fn test_operation_url_rejects_relative_path() {
        let result = build_operation_url(&base(), "data", "LISTSTATUS", None, &[]);
        assert!(matches!(result, Err(FsError::InvalidPath(_))));
    }

    #[test]
    fn test_parse_snapshottable_list() {
        let body = r#"{"SnapshottableDirectoryList":[
            {"dirStatus":{"pathSuffix":"bar","owner":"hdfs","group":"supergroup","permission":"755","type":"DIRECTORY"},
             "parentFullPath":"/foo","snapshotNumber":2,"snapshotQuota":65536},
            {"dirStatus":{"pathSuffix":"top","owner":"hdfs","group":"supergroup","permission":"700"},
             "parentFullPath":"/","snapshotNumber":0,"snapshotQuota":65536}
        ]}"#;

        let dirs = parse_snapshottable_list(body, &base()).unwrap();
        assert_eq!(dirs.len(), 2);
        assert_eq!(dirs[0].path, "/foo/bar");
        assert_eq!(dirs[0].snapshot_count, 2);
        assert_eq!(dirs[0].owner, "hdfs");
        assert_eq!(dirs[1].path, "/top");
    }

    #[test]
    fn test_parse_root_snapshottable_directory() {
        let bodies = [
            r#"{"SnapshottableDirectoryList":[{"dirStatus":{"pathSuffix":"","owner":"hdfs"},
                "parentFullPath":"","snapshotNumber":1,"snapshotQuota":65536}]}"#,
            r#"{"SnapshottableDirectoryList":[{"dirStatus":{"pathSuffix":"","owner":"hdfs"},
                "parentFullPath":null,"snapshotNumber":1,"snapshotQuota":65536}]}"#,
            r#"{"SnapshottableDirectoryList":[{"dirStatus":{"pathSuffix":""}}]}"#,
        ];

        for body in bodies {
            let dirs = parse_snapshottable_list(body, &base()).unwrap();
            assert_eq!(dirs.len(), 1, "{}", body);
            assert_eq!(dirs[0].path, "/", "{}", body);
            assert_eq!(dirs[0].snapshot_root(), "/.snapshot");
        }
    }

    #[test]
    fn test_parse_empty_snapshottable_list() {
        let dirs = parse_snapshottable_list(r#"{"SnapshottableDirectoryList":null}"#, &base()).unwrap();
        assert!(dirs.is_empty());
    }

    #[test]
    fn test_parse_file_statuses() {
        let body = r#"{"FileStatuses":{"FileStatus":[
            {"pathSuffix":"hadoopit-1-2014.01.01.1.1.1.000","type":"DIRECTORY","length":0},
            {"pathSuffix":"stray.txt","type":"FILE","length":12}
        ]}}"#;

        let entries = parse_file_statuses(body, &base()).unwrap();
        assert_eq!(
            entries,
            vec![
                DirectoryEntry::directory("hadoopit-1-2014.01.01.1.1.1.000"),
                DirectoryEntry::file("stray.txt"),
            ]
        );
    }

    #[test]
    fn test_parse_created_path() {
        let path = parse_created_path(r#"{"Path":"/a/.snapshot/s1"}"#, &base()).unwrap();
        assert_eq!(path, "/a/.snapshot/s1");

        assert!(matches!(
            parse_created_path("{}", &base()),
            Err(FsError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn test_parse_remote_errors() {
        let not_found = r#"{"RemoteException":{"exception":"FileNotFoundException",
            "javaClassName":"java.io.FileNotFoundException","message":"File /a/.snapshot does not exist."}}"#;
        assert!(parse_remote_error(StatusCode::NOT_FOUND, "/a/.snapshot", not_found).is_not_found());

        let snapshot_err = r#"{"RemoteException":{"exception":"SnapshotException",
            "javaClassName":"org.apache.hadoop.hdfs.protocol.SnapshotException",
            "message":"Directory is not a snapshottable directory: /b"}}"#;
        let err = parse_remote_error(StatusCode::FORBIDDEN, "/b", snapshot_err);
        assert_eq!(
            err.to_string(),
            "SnapshotException: Directory is not a snapshottable directory: /b"
        );

        assert!(parse_remote_error(StatusCode::NOT_FOUND, "/c", "").is_not_found());

        let err = parse_remote_error(StatusCode::BAD_GATEWAY, "/c", "");
        assert_eq!(err.to_string(), "HTTP 502 Bad Gateway: empty response body");
    }
}
