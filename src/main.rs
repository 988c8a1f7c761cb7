use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use serde::Serialize;

use ogsnap::meta::OG_IMAGE;
use ogsnap::{CaptureCompletion, CaptureConfig, HeadMetadata, PostEditor};

#[derive(Parser, Debug)]
#[command(name = "ogsnap", version, about = "Render a post preview card into an Open Graph image")]
struct Cli {
    /// Post title
    #[arg(long, default_value = "")]
    title: String,

    /// Post body text
    #[arg(long, default_value = "")]
    content: String,

    /// Image shown on the card (http(s) or data: URI)
    #[arg(long, default_value = "")]
    image_url: String,

    /// URL of the page the card belongs to; images from other origins need CORS
    #[arg(long)]
    document_url: Option<String>,

    /// JSON file with capture settings; flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Do not fetch images; draw placeholders instead
    #[arg(long)]
    no_images: bool,

    /// Also write the PNG to this path
    #[arg(long, short)]
    out: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Format::DataUri)]
    format: Format,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// The bare data URI
    DataUri,
    /// `<meta property=..>` tags for the document head
    Meta,
    /// A JSON report
    Json,
}

#[derive(Serialize)]
struct Report<'a> {
    title: &'a str,
    content: &'a str,
    image_url: &'a str,
    width: u32,
    height: u32,
    fingerprint: &'a str,
    og_image: &'a str,
}

fn load_config(cli: &Cli) -> anyhow::Result<CaptureConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => CaptureConfig::default(),
    };
    if let Some(w) = cli.width {
        config.viewport.width = w;
    }
    if let Some(h) = cli.height {
        config.viewport.height = h;
    }
    if cli.document_url.is_some() {
        config.document_url = cli.document_url.clone();
    }
    if cli.no_images {
        config.enable_images = false;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let mut editor = PostEditor::new(config).await?;
    editor.set_title(cli.title.as_str());
    editor.set_content(cli.content.as_str());
    editor.set_image_url(cli.image_url.as_str());

    editor.generate_preview_image();
    for done in editor.settle().await {
        if let CaptureCompletion::Failed(_, message) = done {
            bail!("{}", message);
        }
    }

    let Some(image) = editor.generated_image() else {
        bail!("capture produced no image");
    };

    if let Some(path) = &cli.out {
        let png = image.data_uri.decode()?;
        std::fs::write(path, png).with_context(|| format!("writing {}", path.display()))?;
        log::info!("wrote {}", path.display());
    }

    match cli.format {
        Format::DataUri => println!("{}", image.data_uri),
        Format::Meta => println!("{}", editor.head().render_html()),
        Format::Json => {
            let form = editor.form();
            let report = Report {
                title: form.title(),
                content: form.content(),
                image_url: form.image_url(),
                width: image.width,
                height: image.height,
                fingerprint: &image.fingerprint,
                og_image: editor.head().meta_property(OG_IMAGE).unwrap_or_default(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    editor.shutdown().await?;
    Ok(())
}
