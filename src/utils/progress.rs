use crate::core::ProgressHook;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;

/// Spinner counting finished objects; hidden when `quiet`.
pub fn object_progress(quiet: bool) -> (ProgressBar, ProgressHook) {
    let pb = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.green} {pos} object(s) processed {msg}")
    {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));

    let bar = pb.clone();
    let hook: ProgressHook = Arc::new(move |pid: &str| {
        bar.set_message(pid.to_string());
        bar.inc(1);
    });
    (pb, hook)
}
