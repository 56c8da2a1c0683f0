//! User-visible job messages in English and Chinese.
//! Selected with the global `--locale` flag (e.g. `--locale zh`).

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    Zh,
}

impl Locale {
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "zh" | "zh-cn" | "zh_cn" | "zh-hans" | "zh-tw" | "zh_tw" => Self::Zh,
            _ => Self::En,
        }
    }
}

#[derive(Debug)]
pub struct Messages {
    pub warning_marker: &'static str,
    pub error_marker: &'static str,
    pub download_failed: &'static str,
    pub worker_crashed: &'static str,
    pub url_required: &'static str,
    pub job_started: &'static str,
    pub job_finished: &'static str,
    pub summary_header: &'static str,
}

pub static EN: Messages = Messages {
    warning_marker: "[WARNING] ",
    error_marker: "[ERROR] ",
    download_failed: "download failed",
    worker_crashed: "worker crashed",
    url_required: "please enter a video URL",
    job_started: "Job started",
    job_finished: "Job finished",
    summary_header: "Summary",
};

pub static ZH: Messages = Messages {
    warning_marker: "[警告] ",
    error_marker: "[错误] ",
    download_failed: "下载失败",
    worker_crashed: "下载线程异常退出",
    url_required: "请输入视频 URL",
    job_started: "任务已启动",
    job_finished: "任务已完成",
    summary_header: "摘要",
};

pub fn get_messages(locale: Locale) -> &'static Messages {
    match locale {
        Locale::En => &EN,
        Locale::Zh => &ZH,
    }
}
