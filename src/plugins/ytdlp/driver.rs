use anyhow::{bail, Context};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::debug;

use crate::core::events::{EngineEvent, EventSink, LogLevel};
use crate::core::model::DownloadPlan;
use crate::plugins::registry::{EngineContext, MediaEngine};
use crate::plugins::ytdlp::parse;

/// Runs the `yt-dlp` executable as a child process.
pub struct YtDlpEngine {
    binary: PathBuf,
}

impl YtDlpEngine {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self { binary: binary.into() }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    pub fn info_args(url: &str, ctx: &EngineContext) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "--dump-single-json".into(),
            "--quiet".into(),
            "--no-warnings".into(),
        ];
        push_proxy(&mut args, ctx);
        args.push("--".into());
        args.push(url.to_string());
        args
    }

    pub fn download_args(plan: &DownloadPlan, ctx: &EngineContext) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "--newline".into(),
            "--no-colors".into(),
            "--progress-template".into(),
            parse::progress_template(),
            "-f".into(),
            plan.format.clone(),
            "-o".into(),
            ctx.output_path_template().to_string_lossy().into_owned(),
        ];
        if let Some(audio) = &plan.extract_audio {
            args.extend([
                "--extract-audio".into(),
                "--audio-format".into(),
                audio.codec.clone(),
                "--audio-quality".into(),
                format!("{}K", audio.quality_kbps),
            ]);
        }
        push_proxy(&mut args, ctx);
        args.push("--".into());
        args.push(plan.url.clone());
        args
    }
}

fn push_proxy(args: &mut Vec<String>, ctx: &EngineContext) {
    if let Some(proxy) = &ctx.proxy {
        args.push("--proxy".into());
        args.push(proxy.clone());
    }
}

fn decode_line(raw: Vec<u8>) -> String {
    let s = String::from_utf8_lossy(&raw);
    s.trim_end_matches(['\r', '\n']).to_string()
}

#[async_trait]
impl MediaEngine for YtDlpEngine {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn extract_info(&self, url: &str, ctx: &EngineContext) -> anyhow::Result<serde_json::Value> {
        let args = Self::info_args(url, ctx);
        debug!(bin = %self.binary.display(), args = ?args, "running yt-dlp metadata extraction");

        let output = self
            .command()
            .args(&args)
            .output()
            .await
            .with_context(|| format!("launch {}", self.binary.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let last = stderr
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .unwrap_or("unknown error");
            bail!("{}", last.strip_prefix("ERROR: ").unwrap_or(last));
        }

        serde_json::from_slice(&output.stdout).context("parse yt-dlp metadata json")
    }

    async fn download(&self, plan: &DownloadPlan, ctx: &EngineContext, events: EventSink) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&ctx.download_dir)
            .await
            .with_context(|| format!("create download dir {}", ctx.download_dir.display()))?;

        let args = Self::download_args(plan, ctx);
        debug!(bin = %self.binary.display(), args = ?args, "running yt-dlp download");

        let mut child = self
            .command()
            .args(&args)
            .spawn()
            .with_context(|| format!("launch {}", self.binary.display()))?;

        let stdout = child.stdout.take().context("yt-dlp stdout not captured")?;
        let stderr = child.stderr.take().context("yt-dlp stderr not captured")?;
        let mut out = BufReader::new(stdout).split(b'\n');
        let mut err = BufReader::new(stderr).split(b'\n');
        let (mut out_open, mut err_open) = (true, true);
        let mut last_error: Option<String> = None;

        while out_open || err_open {
            tokio::select! {
                seg = out.next_segment(), if out_open => match seg.context("read yt-dlp stdout")? {
                    Some(raw) => {
                        if let Some(ev) = parse::classify_stdout(&decode_line(raw)) {
                            events.emit(ev).await;
                        }
                    }
                    None => out_open = false,
                },
                seg = err.next_segment(), if err_open => match seg.context("read yt-dlp stderr")? {
                    Some(raw) => {
                        if let Some(ev) = parse::classify_stderr(&decode_line(raw)) {
                            if let EngineEvent::Log { level: LogLevel::Error, message } = &ev {
                                last_error = Some(message.clone());
                            }
                            events.emit(ev).await;
                        }
                    }
                    None => err_open = false,
                },
            }
        }

        let status = child.wait().await.context("wait for yt-dlp")?;
        if !status.success() {
            match last_error {
                Some(msg) => bail!("{}", msg),
                None => bail!("yt-dlp exited with {}", status),
            }
        }
        Ok(())
    }
}
