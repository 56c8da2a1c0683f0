use crate::config::{select_proxy, Settings};
use crate::plugins::registry::CliPlugin;
use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;

pub struct YtDlpCliPlugin;

impl YtDlpCliPlugin {
    pub fn new() -> Self {
        Self
    }
}

impl Default for YtDlpCliPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl CliPlugin for YtDlpCliPlugin {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    fn augment_command(&self, cmd: Command) -> Command {
        cmd.arg(
            Arg::new("ytdlp_bin")
                .long("ytdlp-bin")
                .help_heading("yt-dlp")
                .help("Path to the yt-dlp executable")
                .env("YTDLP_BIN")
                .default_value("yt-dlp")
                .num_args(1),
        )
        .arg(
            Arg::new("ytdlp_proxy")
                .long("proxy")
                .help_heading("yt-dlp")
                .help("Proxy URL for yt-dlp (default: HTTP_PROXY / HTTPS_PROXY)")
                .num_args(1),
        )
    }

    fn apply_matches(&self, matches: &ArgMatches, settings: &mut Settings) -> anyhow::Result<()> {
        if let Some(bin) = matches.get_one::<String>("ytdlp_bin") {
            settings.ytdlp_bin = PathBuf::from(bin);
        }
        if let Some(p) = matches.get_one::<String>("ytdlp_proxy") {
            let proxy = select_proxy(Some(p.clone()), None)
                .ok_or_else(|| anyhow::anyhow!("invalid proxy url: {}", p))?;
            settings.proxy = Some(proxy);
        }
        Ok(())
    }
}
