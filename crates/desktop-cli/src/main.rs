//! desktop-cli: Command-line tool for desktop automation debugging
//!
//! Runs the same controller the MCP server uses, without the protocol, so
//! window matching, input, capture and OCR can be checked from a shell.

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use desktop_core::{
    automation::{DEFAULT_DRAG_SECONDS, DesktopController, ScreenshotRequest},
    capture::{ImageBuffer, create_default_backend},
    config::{DesktopConfig, OcrConfig},
    model::{DEFAULT_MATCH_THRESHOLD, ImageFormat, MouseButton, Point, WindowSelector},
    ocr::TextRecognizer,
};

#[derive(Parser)]
#[command(name = "desktop-cli", version)]
#[command(about = "CLI tool for desktop automation debugging and testing")]
struct Cli {
    #[command(flatten)]
    ocr: OcrArgs,

    /// Allow input while the pointer sits in a screen corner
    #[arg(long, global = true)]
    no_fail_safe: bool,

    #[command(subcommand)]
    command: Commands,
}

/// OCR model locations, shared with the MCP server's environment
#[derive(Args)]
struct OcrArgs {
    #[arg(long, global = true, env = "DESKTOP_MCP_OCR_DET_MODEL")]
    ocr_det_model: Option<PathBuf>,
    #[arg(long, global = true, env = "DESKTOP_MCP_OCR_REC_MODEL")]
    ocr_rec_model: Option<PathBuf>,
    #[arg(long, global = true, env = "DESKTOP_MCP_OCR_DICT")]
    ocr_dict: Option<PathBuf>,
    #[arg(long, global = true, env = "DESKTOP_MCP_ORT_DYLIB")]
    ort_dylib: Option<PathBuf>,
}

#[derive(Args)]
struct TargetArgs {
    /// Window title (fuzzy) or regex with --regex
    #[arg(long)]
    title: Option<String>,
    /// Treat --title as a regular expression
    #[arg(long)]
    regex: bool,
    /// Minimum fuzzy match score (0-100)
    #[arg(long, default_value_t = DEFAULT_MATCH_THRESHOLD)]
    threshold: u8,
}

impl TargetArgs {
    fn selector(&self) -> Result<WindowSelector> {
        if self.threshold > 100 {
            anyhow::bail!("Threshold must be between 0 and 100");
        }
        Ok(WindowSelector {
            title_pattern: self.title.clone(),
            use_regex:     self.regex,
            threshold:     self.threshold,
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List windows with a title
    ListWindows,
    /// Print the primary screen size
    ScreenSize,
    /// Capture a window (or the whole screen) to a file
    Screenshot {
        #[command(flatten)]
        target: TargetArgs,
        /// Also print OCR text boxes in screen coordinates
        #[arg(long)]
        ocr: bool,
        /// Downscale percentage applied before OCR (1-100)
        #[arg(long, default_value_t = 100)]
        scale: u8,
        /// Output file path
        #[arg(short, long)]
        out: PathBuf,
        /// Image format (png, jpeg, webp)
        #[arg(long, default_value = "png")]
        format: String,
    },
    /// Run OCR on an image file
    Ocr {
        /// Image to read
        image: PathBuf,
    },
    /// Click at screen coordinates
    Click {
        x: i32,
        y: i32,
        /// Mouse button (left, right, middle)
        #[arg(long, default_value = "left")]
        button: String,
        /// Number of clicks (1-3)
        #[arg(long, default_value_t = 1)]
        clicks: u32,
    },
    /// Move the pointer
    Move { x: i32, y: i32 },
    /// Drag with the left button
    Drag {
        from_x: i32,
        from_y: i32,
        to_x: i32,
        to_y: i32,
        /// Duration in seconds
        #[arg(long, default_value_t = DEFAULT_DRAG_SECONDS)]
        duration: f64,
    },
    /// Type text at the keyboard focus
    Type { text: String },
    /// Press a key or chord such as "ctrl+shift+t"
    Key { key: String },
    /// Bring a window to the foreground
    Activate {
        #[command(flatten)]
        target: TargetArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("desktop_cli=info".parse()?)
                .add_directive("desktop_core=warn".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = DesktopConfig {
        fail_safe: !cli.no_fail_safe,
        ocr: OcrConfig {
            det_model: cli.ocr.ocr_det_model,
            rec_model: cli.ocr.ocr_rec_model,
            dict: cli.ocr.ocr_dict,
            ort_dylib: cli.ocr.ort_dylib,
            ..Default::default()
        },
        ..Default::default()
    };
    config.validate()?;

    let backend = create_default_backend(&config)
        .context("no desktop backend for this session")?;
    let controller = DesktopController::new(backend, config);

    match cli.command {
        Commands::ListWindows => list_windows(&controller).await?,
        Commands::ScreenSize => {
            let size = controller.screen_size().await?;
            println!("Screen size: {}", size);
        }
        Commands::Screenshot {
            target,
            ocr,
            scale,
            out,
            format,
        } => {
            let format: ImageFormat = format.parse()?;
            let request = ScreenshotRequest {
                selector: target.selector()?,
                with_ocr: ocr,
                scale_percent: scale,
                save_to_downloads: false,
                format,
            };
            screenshot(&controller, request, out).await?;
        }
        Commands::Ocr { image } => ocr_file(&controller, image).await?,
        Commands::Click {
            x,
            y,
            button,
            clicks,
        } => {
            let button: MouseButton = button.parse()?;
            println!("{}", controller.click(Point::new(x, y), button, clicks).await?);
        }
        Commands::Move { x, y } => {
            println!("{}", controller.move_mouse(Point::new(x, y)).await?);
        }
        Commands::Drag {
            from_x,
            from_y,
            to_x,
            to_y,
            duration,
        } => {
            let message = controller
                .drag_mouse(Point::new(from_x, from_y), Point::new(to_x, to_y), duration)
                .await?;
            println!("{}", message);
        }
        Commands::Type { text } => println!("{}", controller.type_text(&text).await?),
        Commands::Key { key } => println!("{}", controller.press_key(&key).await?),
        Commands::Activate { target } => {
            let window = controller.activate_window(&target.selector()?).await?;
            println!("Successfully activated window: '{}'", window.title);
        }
    }

    Ok(())
}

async fn list_windows(controller: &DesktopController) -> Result<()> {
    let windows = controller.list_windows().await?;

    println!("Found {} windows:\n", windows.len());
    for window in windows {
        println!("  ID: {}", window.id);
        println!("  Title: {}", window.title);
        if !window.app_name.is_empty() {
            println!("  App: {}", window.app_name);
        }
        if window.pid > 0 {
            println!("  PID: {}", window.pid);
        }
        println!(
            "  Geometry: {}x{} at ({}, {}){}",
            window.width,
            window.height,
            window.left,
            window.top,
            if window.is_active { " [active]" } else { "" }
        );
        println!();
    }

    Ok(())
}

async fn screenshot(controller: &DesktopController, request: ScreenshotRequest, out: PathBuf) -> Result<()> {
    let outcome = controller.take_screenshot(request).await?;

    match &outcome.window {
        Some(window) => println!("Captured window '{}'", window.title),
        None => println!("Captured full screen"),
    }

    fs::write(&out, &outcome.data).with_context(|| format!("writing {}", out.display()))?;
    println!(
        "✓ Screenshot saved to {} ({}x{}, {} bytes)",
        out.display(),
        outcome.width,
        outcome.height,
        outcome.size_bytes
    );

    if let Some(boxes) = &outcome.ocr {
        println!("{}", serde_json::to_string_pretty(boxes)?);
    }
    Ok(())
}

async fn ocr_file(controller: &DesktopController, path: PathBuf) -> Result<()> {
    let image = ImageBuffer::open(&path)?;
    let recognizer = controller.backend().recognizer()?;

    println!("Running OCR on {} ({}x{})...", path.display(), image.width(), image.height());
    let boxes = recognizer.recognize(&image).await?;

    for text_box in &boxes {
        let [x, y] = text_box.origin();
        println!("  ({:>6.1}, {:>6.1}) {:.2}  {}", x, y, text_box.confidence, text_box.text);
    }
    println!("{} text boxes", boxes.len());
    Ok(())
}
