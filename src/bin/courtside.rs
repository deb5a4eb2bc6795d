use std::path::PathBuf;
use std::str::FromStr as _;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use courtside::{
    PipelineConfig, PlayerMetadata, PortraitError, Session, Sport,
};

#[derive(Parser, Debug)]
#[command(name = "courtside", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a portrait from a photo and composite the identity overlay.
    Generate(GenerateArgs),
    /// Fetch and print the service settings (pricing, enabled sports).
    Settings(CommonArgs),
    /// Fetch and print the credit balance for a signed-in user.
    Credits(CreditsArgs),
    /// Create a checkout session and print the redirect URL.
    Checkout(CheckoutArgs),
}

#[derive(Parser, Debug)]
struct CommonArgs {
    /// Base URL of the consumer API.
    #[arg(long)]
    api_base: Option<String>,

    /// Pipeline config JSON file.
    #[arg(long)]
    config: Option<PathBuf>,
}

impl CommonArgs {
    fn build_config(&self) -> anyhow::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("read config '{}'", path.display()))?;
                PipelineConfig::from_json(&json)?
            }
            None => PipelineConfig::default(),
        };
        if let Some(base) = &self.api_base {
            config.api_base = base.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Input photo (JPG, PNG, …).
    #[arg(long)]
    photo: PathBuf,

    /// Sport id (soccer, basketball, baseball, football, volleyball,
    /// softball, lacrosse, hockey).
    #[arg(long)]
    sport: String,

    /// Player name, rendered uppercased on the portrait.
    #[arg(long)]
    name: String,

    /// Jersey number.
    #[arg(long)]
    number: String,

    /// Optional position (e.g. Forward).
    #[arg(long, default_value = "")]
    position: String,

    /// Bearer credential for authenticated generation.
    #[arg(long)]
    token: Option<String>,

    /// Overlay font file; well-known system locations are probed otherwise.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct CreditsArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Bearer credential.
    #[arg(long)]
    token: String,
}

#[derive(Parser, Debug)]
struct CheckoutArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Pricing pack id (see `courtside settings`).
    #[arg(long)]
    pack: String,

    /// Bearer credential.
    #[arg(long)]
    token: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Generate(args) => cmd_generate(args).await,
        Command::Settings(args) => cmd_settings(args).await,
        Command::Credits(args) => cmd_credits(args).await,
        Command::Checkout(args) => cmd_checkout(args).await,
    }
}

async fn cmd_generate(args: GenerateArgs) -> anyhow::Result<()> {
    let mut config = args.common.build_config()?;
    if let Some(font) = args.font {
        config.font_path = Some(font);
    }
    let sport = Sport::from_str(&args.sport)?;
    let meta = PlayerMetadata::new(args.name, args.number, args.position);
    meta.validate()?;

    let photo = std::fs::read(&args.photo)
        .with_context(|| format!("read photo '{}'", args.photo.display()))?;

    let mut session = Session::new(config)?;
    if let Some(token) = args.token {
        session.set_token(token);
    }
    if let Err(e) = session.load().await {
        // Settings are display data; generation can proceed without them.
        eprintln!("warning: could not load settings: {e}");
    }

    eprintln!("generating portrait (this can take tens of seconds)...");
    let result = match session.create_portrait(&photo, &meta, sport).await {
        Ok(result) => result,
        Err(PortraitError::AuthRequired) => {
            anyhow::bail!("the server requires sign-in; pass --token");
        }
        Err(PortraitError::CreditsExhausted) => {
            anyhow::bail!("no portrait credits remaining; run `courtside checkout` to buy more");
        }
        Err(e) => return Err(e.into()),
    };

    if !result.composited {
        eprintln!("warning: overlay skipped, writing the generated image as-is");
    }
    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, &result.image)
        .with_context(|| format!("write portrait '{}'", args.out.display()))?;

    if let Some(credits) = session.credits() {
        eprintln!(
            "credits remaining: {} paid, {} free",
            credits.credits, credits.free_remaining
        );
    }
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

async fn cmd_settings(args: CommonArgs) -> anyhow::Result<()> {
    let config = args.build_config()?;
    let mut session = Session::new(config)?;
    session.load().await?;
    let settings = session
        .settings()
        .context("settings missing after load (bug)")?;

    println!("free portraits per user: {}", settings.free_portraits);
    println!("enabled sports:");
    for sport in settings.enabled() {
        println!("  {} ({})", sport.id(), sport.label());
    }
    println!("pricing packs:");
    for pack in &settings.pricing {
        let featured = if pack.featured { "  [featured]" } else { "" };
        println!(
            "  {}: {} ({} portraits, ${:.2}){featured}",
            pack.id, pack.name, pack.portraits, pack.price
        );
    }
    if !settings.print_pricing.is_empty() {
        println!("print sizes:");
        for print in &settings.print_pricing {
            println!("  {}: ${:.2}", print.size, print.price);
        }
    }
    Ok(())
}

async fn cmd_credits(args: CreditsArgs) -> anyhow::Result<()> {
    let config = args.common.build_config()?;
    let mut session = Session::new(config)?;
    session.set_token(args.token);
    session.load().await?;
    let credits = session.credits().context("credits missing after load (bug)")?;
    println!(
        "{} paid credits, {} free portraits remaining",
        credits.credits, credits.free_remaining
    );
    Ok(())
}

async fn cmd_checkout(args: CheckoutArgs) -> anyhow::Result<()> {
    let config = args.common.build_config()?;
    let session = Session::new(config)?;
    let url = session.client().create_checkout(&args.pack, &args.token).await?;
    println!("{url}");
    Ok(())
}
