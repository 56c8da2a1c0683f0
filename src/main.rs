use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command};
use futures::future::join_all;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ytdlp_web::config::{Settings, DEFAULT_DOWNLOAD_DIR};
use ytdlp_web::core::info::fetch_info;
use ytdlp_web::i18n::{get_messages, Locale, Messages};
use ytdlp_web::plugins::registry::PluginRegistry;
use ytdlp_web::server::{self, files::DownloadFolder, AppState};
use ytdlp_web::{snapshot, Dispatcher, DownloadRequest, JobId, JobRegistry, JobStatus, ProgressView};

const POLL_INTERVAL: Duration = Duration::from_millis(500);

fn build_cli(registry: &PluginRegistry) -> Command {
    let serve = Command::new("serve")
        .about("Run the HTTP interface")
        .arg(
            Arg::new("host")
                .long("host")
                .help("Address to bind")
                .env("HOST")
                .default_value("0.0.0.0")
                .num_args(1),
        )
        .arg(
            Arg::new("port")
                .long("port")
                .help("Port to listen on")
                .env("PORT")
                .default_value("5000")
                .num_args(1),
        )
        .arg(
            Arg::new("static_dir")
                .long("static-dir")
                .help("Directory with the web front end, served at /")
                .num_args(1),
        );

    let download = Command::new("download")
        .about("Download one or more links and show progress")
        .arg(
            Arg::new("links")
                .help("Links to download")
                .action(ArgAction::Append)
                .num_args(1..)
                .required(true),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .help("yt-dlp format id (default: best video + best audio)")
                .default_value("best")
                .num_args(1),
        )
        .arg(
            Arg::new("audio_only")
                .long("audio-only")
                .help("Extract audio to mp3")
                .action(ArgAction::SetTrue),
        );

    let info = Command::new("info")
        .about("Print metadata for a link as JSON")
        .arg(Arg::new("url").help("Video URL").required(true).num_args(1));

    Command::new("ytdlp-web")
        .about("Background yt-dlp downloads with progress polling")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("download_dir")
                .long("download-dir")
                .help("Where downloaded files are stored")
                .env("DOWNLOAD_DIR")
                .default_value(DEFAULT_DOWNLOAD_DIR)
                .global(true)
                .num_args(1),
        )
        .arg(
            Arg::new("locale")
                .long("locale")
                .help("Language of job messages (en, zh)")
                .default_value("en")
                .global(true)
                .num_args(1),
        )
        .subcommand(registry.augment_command(serve))
        .subcommand(registry.augment_command(download))
        .subcommand(registry.augment_command(info))
}

fn init_tracing() {
    let debug = std::env::var("DEBUG")
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    let default_filter = if debug { "ytdlp_web=debug,tower_http=debug" } else { "ytdlp_web=info,tower_http=info" };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn settings_from(m: &ArgMatches, registry: &PluginRegistry) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();
    if let Some(dir) = m.get_one::<String>("download_dir") {
        settings.download_dir = PathBuf::from(dir);
    }
    if let Some(l) = m.get_one::<String>("locale") {
        settings.locale = Locale::parse(l);
    }
    registry.apply_matches(m, &mut settings)?;
    Ok(settings)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let registry = PluginRegistry::with_defaults();
    let matches = build_cli(&registry).get_matches();

    let (name, m) = matches.subcommand().context("missing subcommand")?;
    let settings = settings_from(m, &registry)?;
    let engine = registry.engine(&settings);
    let messages = get_messages(settings.locale);
    let dispatcher = Dispatcher::new(
        Arc::new(JobRegistry::new()),
        engine,
        settings.engine_context(),
        messages,
    );

    match name {
        "serve" => serve(m, &settings, dispatcher).await,
        "download" => download(m, dispatcher, messages).await,
        "info" => {
            let url = m.get_one::<String>("url").context("missing url")?;
            let info = fetch_info(dispatcher.engine().as_ref(), dispatcher.context(), url, messages).await?;
            println!("{}", serde_json::to_string_pretty(&info)?);
            Ok(())
        }
        other => anyhow::bail!("unknown subcommand: {}", other),
    }
}

async fn serve(m: &ArgMatches, settings: &Settings, dispatcher: Dispatcher) -> anyhow::Result<()> {
    let host = m.get_one::<String>("host").context("missing host")?;
    let port: u16 = m.get_one::<String>("port").context("missing port")?.parse().context("invalid port")?;
    let static_dir = m.get_one::<String>("static_dir").map(PathBuf::from);

    tokio::fs::create_dir_all(&settings.download_dir)
        .await
        .with_context(|| format!("create download dir {}", settings.download_dir.display()))?;

    let state = AppState::new(dispatcher, DownloadFolder::new(settings.download_dir.clone()));
    let app = server::build_router(state, static_dir);

    let addr = SocketAddr::new(host.parse().context("invalid host")?, port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {}", addr))?;
    tracing::info!(%addr, download_dir = %settings.download_dir.display(), "listening");

    axum::serve(listener, app).await.context("http server")?;
    Ok(())
}

async fn download(m: &ArgMatches, dispatcher: Dispatcher, messages: &'static Messages) -> anyhow::Result<()> {
    let format = m.get_one::<String>("format").cloned();
    let audio_only = m.get_flag("audio_only");
    let links: Vec<String> = m
        .get_many::<String>("links")
        .context("missing links")?
        .cloned()
        .collect();

    let mut jobs: Vec<(String, JobId)> = Vec::new();
    for link in links {
        let mut req = DownloadRequest::new(link.clone()).audio_only(audio_only);
        req.format_id = format.clone();
        let id = dispatcher.dispatch(req).await?;
        println!("{}: {} ({})", messages.job_started, id, link);
        jobs.push((link, id));
    }

    let mp = MultiProgress::new();
    let style = ProgressStyle::with_template(
        "{prefix} {bar:40.cyan/blue} {pos:>3}% {wide_msg}",
    )?;

    let watchers = jobs.iter().map(|(link, id)| {
        let pb = mp.add(ProgressBar::new(100));
        pb.set_style(style.clone());
        pb.set_prefix(format!("[{}]", short_id(id)));
        watch_job(dispatcher.clone(), *id, link.clone(), pb)
    });
    let results = join_all(watchers).await;

    println!();
    println!("{}:", messages.summary_header);
    let mut failed = 0;
    for ((link, id), view) in jobs.iter().zip(results) {
        let view = view?;
        if view.status == JobStatus::Error {
            failed += 1;
        }
        println!(
            "- job={} status={} file={} url={}",
            id,
            view.status,
            if view.filename.is_empty() { "-" } else { view.filename.as_str() },
            link
        );
        if let Some(e) = &view.error {
            println!("  error: {}", e);
        }
    }
    println!("{}", messages.job_finished);

    if failed > 0 {
        anyhow::bail!("{} of {} downloads failed", failed, jobs.len());
    }
    Ok(())
}

/// Poll one job until it settles, mirroring its state on a progress bar.
async fn watch_job(dispatcher: Dispatcher, id: JobId, link: String, pb: ProgressBar) -> anyhow::Result<ProgressView> {
    loop {
        let view = snapshot(dispatcher.registry(), id).await?;
        pb.set_position(view.progress.round() as u64);
        pb.set_message(format!(
            "{} {} / {} | {}/s | eta {}s {}",
            view.status,
            fmt_bytes(view.downloaded_bytes),
            fmt_bytes(view.total_bytes),
            fmt_bytes(view.speed as u64),
            view.eta,
            if view.filename.is_empty() { &link } else { &view.filename },
        ));

        if view.is_terminal() {
            match view.status {
                JobStatus::Completed => pb.finish_with_message(format!("done {}", view.filename)),
                _ => pb.abandon_with_message(format!("failed: {}", view.error.clone().unwrap_or_default())),
            }
            dispatcher.wait_job(id).await;
            return Ok(view);
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

fn short_id(id: &JobId) -> String {
    id.to_string().chars().take(8).collect()
}

fn fmt_bytes(n: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = 1024.0 * 1024.0;
    const GB: f64 = 1024.0 * 1024.0 * 1024.0;
    let f = n as f64;
    if f >= GB {
        format!("{:.2}GiB", f / GB)
    } else if f >= MB {
        format!("{:.2}MiB", f / MB)
    } else if f >= KB {
        format!("{:.2}KiB", f / KB)
    } else {
        format!("{}B", n)
    }
}
