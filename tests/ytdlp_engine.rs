//! Drives `YtDlpEngine` against shell scripts standing in for the yt-dlp
//! executable.
#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ytdlp_web::i18n::EN;
use ytdlp_web::plugins::registry::EngineContext;
use ytdlp_web::plugins::ytdlp::driver::YtDlpEngine;
use ytdlp_web::plugins::ytdlp::parse::PROGRESS_MARKER;
use ytdlp_web::{snapshot, Dispatcher, DownloadRequest, JobRegistry, JobStatus, ProgressView};

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    let script = format!(
        "#!/bin/sh\nprintf '%s\\n' \"$@\" > \"{args}\"\n{body}",
        args = dir.join(format!("{name}.args")).display(),
    );
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn progress_line(json: &str) -> String {
    format!("echo '{PROGRESS_MARKER}{json}'\n")
}

async fn run(binary: &Path, out_dir: &Path, request: DownloadRequest) -> ProgressView {
    let dispatcher = Dispatcher::new(
        Arc::new(JobRegistry::new()),
        Arc::new(YtDlpEngine::new(binary)),
        EngineContext::new(out_dir),
        &EN,
    );
    let id = dispatcher.dispatch(request).await.unwrap();
    dispatcher.wait_job(id).await;
    snapshot(dispatcher.registry(), id).await.unwrap()
}

#[tokio::test]
async fn stand_in_ytdlp_output_reaches_the_job() {
    let dir = tempfile::tempdir().unwrap();

    // write every script before spawning anything
    let failing = write_script(
        dir.path(),
        "ytdlp-fail",
        &[
            "echo '[youtube] abc: Downloading webpage'\n".to_string(),
            progress_line(r#"{"status": "downloading", "filename": "/x/a.mp4", "downloaded_bytes": 500, "total_bytes": 1000, "speed": 10.0, "eta": 5}"#),
            "echo 'WARNING: something odd' >&2\n".to_string(),
            progress_line(r#"{"status": "finished", "filename": "/x/a.mp4"}"#),
            "echo 'ERROR: postprocessing failed' >&2\n".to_string(),
            "exit 1\n".to_string(),
        ]
        .concat(),
    );
    let passing = write_script(
        dir.path(),
        "ytdlp-ok",
        &[
            progress_line(r#"{"status": "downloading", "filename": "/x/b.mp3", "downloaded_bytes": 250, "total_bytes": null, "total_bytes_estimate": 1000}"#),
            progress_line(r#"{"status": "downloading", "filename": "/x/b.mp3", "downloaded_bytes": 1000, "total_bytes": 1000}"#),
            progress_line(r#"{"status": "finished", "filename": "/x/b.mp3"}"#),
            "echo '[debug] ffmpeg command line' >&2\n".to_string(),
            "exit 0\n".to_string(),
        ]
        .concat(),
    );

    let out = dir.path().join("out");
    let view = run(&failing, &out, DownloadRequest::new("https://videos.test/a")).await;

    assert_eq!(view.status, JobStatus::Error);
    assert_eq!(view.error.as_deref(), Some("postprocessing failed"));
    assert_eq!(view.progress, 100.0);
    assert_eq!(view.downloaded_bytes, 500);
    assert_eq!(view.total_bytes, 1000);
    assert_eq!(view.filename, "a.mp4");
    assert!(out.is_dir());

    // stdout and stderr are separate pipes: only order within stderr is fixed
    assert_eq!(view.logs.len(), 3);
    assert!(view.logs.contains(&"[youtube] abc: Downloading webpage".to_string()));
    let warning = view.logs.iter().position(|l| l == "[WARNING] something odd");
    let error = view.logs.iter().position(|l| l == "[ERROR] postprocessing failed");
    assert!(matches!((warning, error), (Some(w), Some(e)) if w < e));

    let view = run(&passing, &out, DownloadRequest::new("https://videos.test/b").audio_only(true)).await;

    assert_eq!(view.status, JobStatus::Completed);
    assert_eq!(view.error, None);
    assert_eq!(view.progress, 100.0);
    assert_eq!(view.filename, "b.mp3");
    assert!(view.logs.is_empty());

    let args = std::fs::read_to_string(dir.path().join("ytdlp-ok.args")).unwrap();
    let args: Vec<&str> = args.lines().collect();
    assert!(args.contains(&"--newline"));
    assert!(args.contains(&"--extract-audio"));
    let format = args.iter().position(|a| *a == "-f").unwrap();
    assert_eq!(args[format + 1], "bestaudio/best");
    assert_eq!(args.last().copied(), Some("https://videos.test/b"));
}
