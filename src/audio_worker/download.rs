use futures_util::StreamExt;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

/// Fetches `url` into a fresh temp file. A single attempt: the caller moves
/// on to the next backup URL on failure.
pub(super) async fn download_to_tempfile(
    http: &reqwest::Client,
    url: &str,
) -> Result<NamedTempFile, String> {
    let resp = http
        .get(url)
        .send()
        .await
        .map_err(|e| format!("request failed: {e}"))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(format!("HTTP {status}"));
    }

    let tmp = tempfile::Builder::new()
        .prefix("tunecast-")
        .suffix(".audio")
        .tempfile()
        .map_err(|e| format!("create temp file: {e}"))?;
    let std_file = tmp
        .reopen()
        .map_err(|e| format!("open temp file: {e}"))?;
    let mut file = tokio::fs::File::from_std(std_file);

    let mut written = 0u64;
    let mut stream = resp.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let bytes = chunk.map_err(|e| format!("read body: {e}"))?;
        file.write_all(&bytes)
            .await
            .map_err(|e| format!("write temp file: {e}"))?;
        written += bytes.len() as u64;
    }
    file.flush()
        .await
        .map_err(|e| format!("write temp file: {e}"))?;

    if written == 0 {
        return Err("empty response body".to_owned());
    }
    tracing::debug!(url, bytes = written, path = %tmp.path().display(), "stream downloaded");
    Ok(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_body_to_tempfile() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/a.m4a")
            .with_status(200)
            .with_body(b"not really audio")
            .create_async()
            .await;

        let http = reqwest::Client::new();
        let tmp = download_to_tempfile(&http, &format!("{}/a.m4a", server.url()))
            .await
            .unwrap();
        let content = std::fs::read(tmp.path()).unwrap();
        assert_eq!(content, b"not really audio");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn http_error_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/gone.m4a")
            .with_status(403)
            .create_async()
            .await;

        let http = reqwest::Client::new();
        let err = download_to_tempfile(&http, &format!("{}/gone.m4a", server.url()))
            .await
            .unwrap_err();
        assert!(err.contains("403"), "{err}");
    }

    #[tokio::test]
    async fn empty_body_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/empty.m4a")
            .with_status(200)
            .create_async()
            .await;

        let http = reqwest::Client::new();
        let err = download_to_tempfile(&http, &format!("{}/empty.m4a", server.url()))
            .await
            .unwrap_err();
        assert!(err.contains("empty"));
    }
}
