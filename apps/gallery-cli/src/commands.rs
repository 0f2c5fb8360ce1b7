use std::io::Write;

use anyhow::Context;
use morphgallery_client::{ClientConfig, GalleryClient};
use morphgallery_server::{GalleryServer, ServerConfig};
use morphgallery_transfer::format_size;
use morphgallery_ui_state::{ToastKind, ToastQueue, UploadPanel};
use morphgallery_upload::{FileRef, UploadEvent, UploadOrchestrator};
use tokio::sync::mpsc;

use crate::{RemoteArgs, ServeArgs, UploadArgs};

pub async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = ServerConfig::load();
    if let Some(dir) = args.dir {
        config.upload_dir = dir;
    }
    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    if let Some(max) = args.max_size {
        config.max_upload_size = max;
    }
    if let Some(url) = args.public_url {
        config.public_url = Some(url);
    }
    if args.save_config {
        let path = config.save().context("failed to save config")?;
        tracing::info!(path = %path.display(), "config saved");
    }

    let server = GalleryServer::new(config);
    let stopper = server.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stopper.shutdown();
        }
    });

    server.run().await.context("gallery server failed")
}

pub async fn list(args: RemoteArgs) -> anyhow::Result<()> {
    let client = connect(&args)?;
    let items = client.list().await.context("failed to list gallery")?;

    if items.is_empty() {
        println!("gallery is empty");
        return Ok(());
    }

    let width = items.iter().map(|i| i.name.len()).max().unwrap_or(4).max(4);
    println!("{:<width$}  {:>8}  MIME", "NAME", "SIZE");
    for item in &items {
        println!(
            "{:<width$}  {:>8}  {}",
            item.name,
            format_size(item.size),
            item.mime
        );
    }
    Ok(())
}

pub async fn upload(args: UploadArgs) -> anyhow::Result<()> {
    let client = connect(&args.remote)?;
    let files = args
        .files
        .iter()
        .map(|p| FileRef::from_path(p).with_context(|| format!("cannot read {}", p.display())))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let mut orchestrator = UploadOrchestrator::new();
    let events = orchestrator
        .take_events()
        .context("upload events already taken")?;
    let renderer = tokio::spawn(render_events(events));

    let result = orchestrator.submit(&files, &client).await;
    drop(orchestrator);
    renderer.await.context("progress renderer panicked")?;
    let report = result?;

    for receipt in report.receipts() {
        println!("{}", receipt.url);
    }
    if report.failed() > 0 {
        anyhow::bail!("{} of {} uploads failed", report.failed(), report.outcomes.len());
    }
    Ok(())
}

fn connect(args: &RemoteArgs) -> anyhow::Result<GalleryClient> {
    GalleryClient::new(&ClientConfig::with_base_url(&args.url))
        .with_context(|| format!("cannot connect to {}", args.url))
}

/// Draws the progress line and toasts on stderr until the batch ends.
async fn render_events(mut events: mpsc::UnboundedReceiver<UploadEvent>) {
    let mut panel = UploadPanel::new();
    let mut toasts = ToastQueue::new();
    let mut printed = 0u64;
    let mut stderr = std::io::stderr();

    while let Some(event) = events.recv().await {
        panel.apply(&event, &mut toasts);

        if panel.is_visible() {
            let _ = write!(
                stderr,
                "\r\x1b[2K{:>3}%  {}  {}",
                panel.percent(),
                panel.status_line(),
                panel.current_file().unwrap_or_default()
            );
        }

        let unseen = printed;
        for toast in toasts.iter().filter(|t| t.id >= unseen) {
            let marker = match toast.kind {
                ToastKind::Success => "✓",
                ToastKind::Error => "✗",
                ToastKind::Info => "•",
            };
            let _ = write!(stderr, "\r\x1b[2K{marker} {}", toast.title);
            if let Some(message) = &toast.message {
                let _ = write!(stderr, ": {message}");
            }
            let _ = writeln!(stderr);
            printed = toast.id + 1;
        }
        let _ = stderr.flush();

        if matches!(event, UploadEvent::Finished(_)) {
            break;
        }
    }
}
