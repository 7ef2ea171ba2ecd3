//! Decal storefront CLI

use std::{fs, path::PathBuf, process, time::Duration};

use clap::{Args, Parser, Subcommand};
use tokio::signal;
use tokio_util::sync::CancellationToken;

use decal::{
    cart::Cart,
    checkout::{CardDetails, CheckoutSession, PaymentMethod},
    fixtures,
};
use decal_app::{
    capture::MicRecorder,
    config::GatewayConfig,
    context::AppContext,
    export::{self, DpiPreset},
    gateway::{AspectRatio, ImageData},
    payments::{PaymentGateway, PaymentInstrument, SimulatedPaymentGateway},
    receipt,
    shop::Shop,
};

/// Built-in featured catalog used by the demo when no file is given.
const FEATURED_CATALOG: &str = include_str!("../fixtures/featured.yaml");

/// Confirmation dwell before the simulated redirect back to the storefront.
const SUCCESS_DISPLAY_DELAY: Duration = Duration::from_secs(3);

#[derive(Debug, Parser)]
#[command(name = "decal-app", about = "AI sticker storefront CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generate sticker artwork from a prompt
    Generate(GenerateArgs),
    /// Edit existing sticker artwork
    Edit(EditArgs),
    /// Generate a promotional video
    Video(VideoArgs),
    /// Ask the storefront assistant a question
    Chat(ChatArgs),
    /// Speak a phrase through the TTS model
    Say(SayArgs),
    /// Transcribe a voice note from a file or the microphone
    Transcribe(TranscribeArgs),
    /// Run the scripted cart-and-checkout demo
    Demo(DemoArgs),
}

#[derive(Debug, Args)]
struct GenerateArgs {
    #[command(flatten)]
    gateway: GatewayConfig,

    /// Sticker idea to draw
    #[arg(long)]
    prompt: String,

    /// Sticker name; derived from the prompt when omitted
    #[arg(long)]
    name: Option<String>,

    /// Directory for the exported PNG
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Export quality preset (72 or 300)
    #[arg(long, default_value = "72")]
    dpi: DpiPreset,

    /// Also print creative feedback on the idea
    #[arg(long)]
    analyze: bool,
}

#[derive(Debug, Args)]
struct EditArgs {
    #[command(flatten)]
    gateway: GatewayConfig,

    /// Existing sticker PNG to edit
    #[arg(long)]
    input: PathBuf,

    /// Edit instructions
    #[arg(long)]
    instructions: String,

    /// Directory for the exported PNG
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Export quality preset (72 or 300)
    #[arg(long, default_value = "72")]
    dpi: DpiPreset,
}

#[derive(Debug, Args)]
struct VideoArgs {
    #[command(flatten)]
    gateway: GatewayConfig,

    /// Scene for the promotional video
    #[arg(long)]
    prompt: String,

    /// Aspect ratio (16:9 or 9:16)
    #[arg(long, default_value = "16:9")]
    aspect: AspectRatio,

    /// Output file for the video
    #[arg(long, default_value = "sticker-promo.mp4")]
    out: PathBuf,
}

#[derive(Debug, Args)]
struct ChatArgs {
    #[command(flatten)]
    gateway: GatewayConfig,

    /// Message for the assistant
    #[arg(long)]
    message: String,
}

#[derive(Debug, Args)]
struct SayArgs {
    #[command(flatten)]
    gateway: GatewayConfig,

    /// Phrase to speak
    #[arg(long)]
    text: String,

    /// Output WAV file
    #[arg(long, default_value = "speech.wav")]
    out: PathBuf,
}

#[derive(Debug, Args)]
struct TranscribeArgs {
    #[command(flatten)]
    gateway: GatewayConfig,

    /// WAV file to transcribe; records from the microphone when omitted
    #[arg(long)]
    input: Option<PathBuf>,

    /// Seconds of microphone audio to record
    #[arg(long)]
    seconds: Option<u64>,
}

#[derive(Debug, Args)]
struct DemoArgs {
    /// Catalog fixture to shop from; uses the built-in catalog when omitted
    #[arg(long)]
    catalog: Option<PathBuf>,
}

#[tokio::main]
pub async fn main() {
    let _env = dotenvy::dotenv();

    if let Err(error) = decal_app::logging::init() {
        eprintln!("failed to initialise logging: {error}");
    }

    let cli = Cli::parse();

    if let Err(error) = run(cli).await {
        eprintln!("{error}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Commands::Generate(args) => generate(args).await,
        Commands::Edit(args) => edit(args).await,
        Commands::Video(args) => video(args).await,
        Commands::Chat(args) => chat(args).await,
        Commands::Say(args) => say(args).await,
        Commands::Transcribe(args) => transcribe(args).await,
        Commands::Demo(args) => demo(args).await,
    }
}

fn shop_from_config(config: GatewayConfig) -> Result<Shop, String> {
    let context = AppContext::from_config(config)
        .map_err(|error| format!("failed to build application context: {error}"))?;

    Ok(Shop::new(context.gateway, context.payments))
}

async fn generate(args: GenerateArgs) -> Result<(), String> {
    let mut shop = shop_from_config(args.gateway)?;

    shop.create_sticker(&args.prompt)
        .await
        .map_err(|error| format!("failed to generate sticker: {error}"))?;

    let draft = shop.draft().ok_or("no draft after generation")?;
    let name = args.name.as_deref().unwrap_or(&draft.name);

    let path = export::export_png(&draft.image.bytes, name, args.dpi, &args.out_dir)
        .map_err(|error| format!("failed to export sticker: {error}"))?;

    println!("sticker saved to {}", path.display());

    if args.analyze {
        let feedback = shop
            .analyze_idea(&args.prompt)
            .await
            .map_err(|error| format!("failed to analyze idea: {error}"))?;

        println!("{feedback}");
    }

    Ok(())
}

async fn edit(args: EditArgs) -> Result<(), String> {
    let mut shop = shop_from_config(args.gateway)?;

    let bytes = fs::read(&args.input)
        .map_err(|error| format!("failed to read {}: {error}", args.input.display()))?;

    let name = args
        .input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "my-sticker".to_owned());

    shop.load_draft(
        ImageData {
            mime_type: "image/png".to_owned(),
            bytes,
        },
        name,
    );

    shop.edit_sticker(&args.instructions)
        .await
        .map_err(|error| format!("failed to edit sticker: {error}"))?;

    let draft = shop.draft().ok_or("no draft after edit")?;

    let path = export::export_png(&draft.image.bytes, &draft.name, args.dpi, &args.out_dir)
        .map_err(|error| format!("failed to export sticker: {error}"))?;

    println!("edited sticker saved to {}", path.display());

    Ok(())
}

async fn video(args: VideoArgs) -> Result<(), String> {
    let shop = shop_from_config(args.gateway)?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();

    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            tracing::info!("ctrl_c signal received; cancelling at the next poll boundary");
            on_signal.cancel();
        }
    });

    let video = shop
        .promo_video(&args.prompt, args.aspect, &cancel)
        .await
        .map_err(|error| format!("failed to generate video: {error}"))?;

    fs::write(&args.out, &video.bytes)
        .map_err(|error| format!("failed to write {}: {error}", args.out.display()))?;

    println!("video saved to {}", args.out.display());

    Ok(())
}

async fn chat(args: ChatArgs) -> Result<(), String> {
    let mut shop = shop_from_config(args.gateway)?;

    let reply = shop
        .chat(&args.message)
        .await
        .map_err(|error| format!("failed to chat: {error}"))?;

    println!("{reply}");

    Ok(())
}

async fn say(args: SayArgs) -> Result<(), String> {
    let shop = shop_from_config(args.gateway)?;

    let audio = shop
        .speak(&args.text)
        .await
        .map_err(|error| format!("failed to synthesize speech: {error}"))?;

    let wav = decal_app::audio::pcm_to_wav(&audio.pcm, audio.sample_rate)
        .map_err(|error| format!("failed to encode WAV: {error}"))?;

    fs::write(&args.out, wav)
        .map_err(|error| format!("failed to write {}: {error}", args.out.display()))?;

    println!("speech saved to {}", args.out.display());

    Ok(())
}

async fn transcribe(args: TranscribeArgs) -> Result<(), String> {
    let shop = shop_from_config(args.gateway)?;

    let wav = match (args.input, args.seconds) {
        (Some(path), _) => fs::read(&path)
            .map_err(|error| format!("failed to read {}: {error}", path.display()))?,
        (None, Some(seconds)) => record_for(seconds).await?,
        (None, None) => return Err("provide --input or --seconds".to_owned()),
    };

    let text = shop.transcribe(&wav).await;

    println!("{text}");

    Ok(())
}

async fn record_for(seconds: u64) -> Result<Vec<u8>, String> {
    println!("recording for {seconds}s...");

    tokio::task::spawn_blocking(move || {
        let mut recorder = MicRecorder::new();

        recorder
            .start()
            .map_err(|error| format!("failed to start recording: {error}"))?;

        std::thread::sleep(Duration::from_secs(seconds));

        recorder
            .stop()
            .map_err(|error| format!("failed to stop recording: {error}"))
    })
    .await
    .map_err(|error| format!("recording task failed: {error}"))?
}

async fn demo(args: DemoArgs) -> Result<(), String> {
    let stickers = match args.catalog {
        Some(path) => fixtures::load_catalog_path(&path),
        None => fixtures::load_catalog_str(FEATURED_CATALOG),
    }
    .map_err(|error| format!("failed to load catalog: {error}"))?;

    let mut cart = Cart::new();

    for sticker in &stickers {
        cart.add(sticker.clone());
    }

    if let Some(first) = stickers.first() {
        cart.add(first.clone());
    }

    let mut session = CheckoutSession::new();
    session.select_method(PaymentMethod::Card);
    session.set_card(CardDetails {
        holder: "JOHN DOE".to_owned(),
        number: "4242 4242 4242 4242".to_owned(),
        expiry: "12/26".to_owned(),
        cvc: "123".to_owned(),
    });

    session
        .begin_payment(&cart)
        .map_err(|error| format!("failed to start checkout: {error}"))?;
    session
        .submit_payment()
        .map_err(|error| format!("failed to submit payment: {error}"))?;

    println!("processing payment...");

    let payments = SimulatedPaymentGateway::default();
    let instrument = PaymentInstrument::Card(session.card().cloned().unwrap_or_default());

    let outcome = payments
        .submit_payment(session.method(), cart.total(), &instrument)
        .await
        .map_err(|error| format!("payment failed: {error}"))?;

    session
        .complete()
        .map_err(|error| format!("failed to complete checkout: {error}"))?;

    let summary = receipt::render(&cart, Some(&outcome.order_id))
        .map_err(|error| format!("failed to render receipt: {error}"))?;

    println!("{summary}");
    println!("redirecting to the storefront...");

    tokio::time::sleep(SUCCESS_DISPLAY_DELAY).await;

    session
        .reset(&mut cart)
        .map_err(|error| format!("failed to reset session: {error}"))?;

    println!("order complete; cart cleared");

    Ok(())
}
