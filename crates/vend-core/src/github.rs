//! GitHub-backed [`Resolver`] and [`Installer`].
//!
//! Three endpoints are used, all configurable through [`Config`] so tests
//! can point them at a local server:
//!
//! - `GET {api}/repos/{owner}/{repo}/commits/{ref}` with the
//!   `application/vnd.github.sha` media type pins a ref to a commit.
//! - `GET {raw}/{owner}/{repo}/{commit}{subdir}/jsonnetfile.json` reads the
//!   manifest. A 404 means the package declares no dependencies.
//! - `GET {codeload}/{owner}/{repo}/tar.gz/{commit}` downloads a snapshot.

use std::path::Path;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, RequestBuilder, Response, StatusCode, header};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use vend_schema::{Package, Pkgfile};

use crate::config::Config;
use crate::error::{InstallError, RemoteError};
use crate::installer::Installer;
use crate::io::extract;
use crate::manifest::{self, MANIFEST_NAME};
use crate::resolver::Resolver;

const GITHUB_HOST: &str = "github.com";
const SHA_MEDIA_TYPE: &str = "application/vnd.github.sha";
const ARCHIVE_NAME: &str = "pkg.tar.gz";

/// Shared HTTP client with GitHub endpoints and credentials.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    token: Option<String>,
    api_url: String,
    raw_url: String,
    codeload_url: String,
}

impl GitHubClient {
    /// Build a client from `config`.
    ///
    /// # Errors
    ///
    /// Fails if the TLS backend cannot be initialized.
    pub fn new(config: &Config) -> Result<Self, RemoteError> {
        let client = Client::builder().user_agent(crate::USER_AGENT).build()?;
        Ok(Self {
            client,
            token: config.token.clone(),
            api_url: config.api_url.clone(),
            raw_url: config.raw_url.clone(),
            codeload_url: config.codeload_url.clone(),
        })
    }

    fn get(&self, url: &str) -> RequestBuilder {
        let request = self.client.get(url);
        match &self.token {
            Some(token) => request.header(header::AUTHORIZATION, format!("token {token}")),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> Result<Response, RemoteError> {
        tracing::trace!("GET {url}");
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    fn commit_url(&self, pkg: &Package) -> String {
        format!(
            "{}/repos/{}/{}/commits/{}",
            self.api_url, pkg.owner, pkg.repo, pkg.version
        )
    }

    fn manifest_url(&self, pkg: &Package) -> String {
        format!(
            "{}/{}/{}/{}{}/{MANIFEST_NAME}",
            self.raw_url, pkg.owner, pkg.repo, pkg.commit, pkg.subdir
        )
    }

    fn archive_url(&self, pkg: &Package) -> String {
        format!(
            "{}/{}/{}/tar.gz/{}",
            self.codeload_url, pkg.owner, pkg.repo, pkg.commit
        )
    }
}

fn ensure_github(pkg: &Package) -> Result<(), RemoteError> {
    if pkg.host == GITHUB_HOST {
        Ok(())
    } else {
        Err(RemoteError::UnsupportedHost(pkg.host.clone()))
    }
}

/// Resolves refs and manifests through the GitHub API.
#[derive(Debug, Clone)]
pub struct GitHubResolver {
    client: GitHubClient,
}

impl GitHubResolver {
    /// Resolve through `client`.
    pub fn new(client: GitHubClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resolver for GitHubResolver {
    async fn commit(&self, pkg: &Package) -> Result<String, RemoteError> {
        ensure_github(pkg)?;
        let url = self.client.commit_url(pkg);
        let request = self.client.get(&url).header(header::ACCEPT, SHA_MEDIA_TYPE);
        let body = self.client.send(request, &url).await?.text().await?;

        let sha = body.trim();
        if sha.is_empty() || !sha.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(RemoteError::Other(format!(
                "{url} did not return a commit id"
            )));
        }
        Ok(sha.to_string())
    }

    async fn deps(&self, pkg: &Package) -> Result<Pkgfile, RemoteError> {
        ensure_github(pkg)?;
        let url = self.client.manifest_url(pkg);
        let response = self.client.get(&url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!("{} has no {MANIFEST_NAME}", pkg.locked());
            return Ok(Pkgfile::new());
        }
        if !response.status().is_success() {
            return Err(RemoteError::Status {
                url,
                status: response.status().as_u16(),
            });
        }

        let text = response.text().await?;
        manifest::parse(&text).map_err(|source| RemoteError::Manifest { url, source })
    }
}

/// Installs repository snapshots from GitHub tarballs.
#[derive(Debug, Clone)]
pub struct GitHubInstaller {
    client: GitHubClient,
}

impl GitHubInstaller {
    /// Download through `client`.
    pub fn new(client: GitHubClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Installer for GitHubInstaller {
    async fn install(
        &self,
        pkg: &Package,
        scratch: &Path,
        dest: &Path,
    ) -> Result<(), InstallError> {
        ensure_github(pkg)?;
        let url = self.client.archive_url(pkg);
        let response = self.client.send(self.client.get(&url), &url).await?;

        let archive = scratch.join(ARCHIVE_NAME);
        let mut file = File::create(&archive).await?;
        let mut stream = response.bytes_stream();
        let mut downloaded: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
        }
        file.flush().await?;
        drop(file);
        tracing::debug!("Downloaded {} ({downloaded} bytes)", pkg.locked());

        let dest = dest.to_path_buf();
        tokio::task::spawn_blocking(move || extract::unpack_tar_gz(&archive, &dest)).await??;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use mockito::{Matcher, Server};

    const SHA: &str = "3f2a9c0e5b1d4a7f8e6c2b9d0a1f3e5c7b9d2a4f";

    fn client_for(server: &Server, token: Option<&str>) -> GitHubClient {
        let url = server.url();
        let config = Config {
            token: token.map(ToString::to_string),
            api_url: url.clone(),
            raw_url: url.clone(),
            codeload_url: url,
            ..Config::default()
        };
        GitHubClient::new(&config).unwrap()
    }

    fn pkg(coordinate: &str) -> Package {
        coordinate.parse().unwrap()
    }

    #[tokio::test]
    async fn test_commit_pins_ref() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/grafana/jsonnet-libs/commits/master")
            .match_header("accept", SHA_MEDIA_TYPE)
            .match_header("authorization", "token secret")
            .with_status(200)
            .with_body(format!("{SHA}\n"))
            .create_async()
            .await;

        let resolver = GitHubResolver::new(client_for(&server, Some("secret")));
        let commit = resolver
            .commit(&pkg("github.com/grafana/jsonnet-libs/ksonnet-util"))
            .await
            .unwrap();
        assert_eq!(commit, SHA);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_commit_errors() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/repos/org/missing/commits/v1")
            .with_status(422)
            .create_async()
            .await;
        server
            .mock("GET", "/repos/org/html/commits/v1")
            .with_status(200)
            .with_body("<html>not a sha</html>")
            .create_async()
            .await;

        let resolver = GitHubResolver::new(client_for(&server, None));
        assert!(matches!(
            resolver.commit(&pkg("github.com/org/missing@v1")).await,
            Err(RemoteError::Status { status: 422, .. })
        ));
        assert!(matches!(
            resolver.commit(&pkg("github.com/org/html@v1")).await,
            Err(RemoteError::Other(_))
        ));
        assert!(matches!(
            resolver.commit(&pkg("gitlab.com/org/repo@v1")).await,
            Err(RemoteError::UnsupportedHost(_))
        ));
    }

    #[tokio::test]
    async fn test_deps_reads_manifest_at_commit() {
        let mut server = Server::new_async().await;
        let body = r#"{
            "dependencies": [
                { "source": { "git": { "remote": "https://github.com/org/b", "subdir": "lib" } }, "version": "v2" }
            ]
        }"#;
        let mock = server
            .mock("GET", format!("/org/a/{SHA}/sub/jsonnetfile.json").as_str())
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let resolver = GitHubResolver::new(client_for(&server, None));
        let pinned = pkg("github.com/org/a/sub@v1").with_commit(SHA);
        let deps = resolver.deps(&pinned).await.unwrap();
        assert!(deps.contains("github.com/org/b/lib@v2"));
        assert_eq!(deps.len(), 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_deps_missing_manifest_is_empty() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", format!("/org/a/{SHA}/jsonnetfile.json").as_str())
            .with_status(404)
            .create_async()
            .await;
        server
            .mock("GET", format!("/org/broken/{SHA}/jsonnetfile.json").as_str())
            .with_status(500)
            .create_async()
            .await;
        server
            .mock("GET", format!("/org/garbled/{SHA}/jsonnetfile.json").as_str())
            .with_status(200)
            .with_body("{ not json")
            .create_async()
            .await;

        let resolver = GitHubResolver::new(client_for(&server, None));
        let deps = resolver
            .deps(&pkg("github.com/org/a@v1").with_commit(SHA))
            .await
            .unwrap();
        assert!(deps.is_empty());

        assert!(matches!(
            resolver.deps(&pkg("github.com/org/broken@v1").with_commit(SHA)).await,
            Err(RemoteError::Status { status: 500, .. })
        ));
        assert!(matches!(
            resolver.deps(&pkg("github.com/org/garbled@v1").with_commit(SHA)).await,
            Err(RemoteError::Manifest { .. })
        ));
    }

    fn snapshot(top: &str, files: &[(&str, &str)]) -> Vec<u8> {
        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
        for (path, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, format!("{top}/{path}"), content.as_bytes())
                .unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    #[tokio::test]
    async fn test_installer_downloads_and_unpacks() {
        let mut server = Server::new_async().await;
        let archive = snapshot(
            "a-3f2a9c0",
            &[("README.md", "hi"), ("lib/main.libsonnet", "{}")],
        );
        let mock = server
            .mock("GET", format!("/org/a/tar.gz/{SHA}").as_str())
            .with_status(200)
            .with_body(archive)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let scratch = dir.path().join("work");
        let dest = dir.path().join("repo");
        std::fs::create_dir_all(&scratch).unwrap();

        let installer = GitHubInstaller::new(client_for(&server, None));
        installer
            .install(&pkg("github.com/org/a/lib@v1").with_commit(SHA), &scratch, &dest)
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(dest.join("README.md")).unwrap(), "hi");
        assert!(dest.join("lib/main.libsonnet").is_file());
        assert!(scratch.join(ARCHIVE_NAME).is_file());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_installer_reports_http_failure() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", format!("/org/gone/tar.gz/{SHA}").as_str())
            .with_status(404)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let installer = GitHubInstaller::new(client_for(&server, None));
        let err = installer
            .install(
                &pkg("github.com/org/gone@v1").with_commit(SHA),
                dir.path(),
                &dir.path().join("repo"),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            InstallError::Remote(RemoteError::Status { status: 404, .. })
        ));
    }
}
