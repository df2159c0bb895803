use std::io::Write as _;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::Style;
use menu_parser_core::{
    menu::{self, Menu, DEFAULT_OUTPUT_PATH},
    prompt::SAMPLE_MENU,
    MenuError, MenuParser, ProviderConfig,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// ── Palette ──────────────────────────────────────────────────────────

fn s_header() -> Style { Style::new().color256(252).bold() }  // bright gray, bold
fn s_dim() -> Style    { Style::new().color256(248) }         // light gray
fn s_tree() -> Style   { Style::new().color256(245) }         // mid gray
fn s_ok() -> Style     { Style::new().color256(114) }         // green
fn s_warn() -> Style   { Style::new().color256(214) }         // amber
fn s_accent() -> Style { Style::new().color256(109) }         // teal

fn sep(width: usize) -> String {
    s_tree().apply_to("\u{2500}".repeat(width)).to_string()
}

// ── CLI Args ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "menu-parser",
    about = "Turn raw menu text into structured JSON using schema-constrained chat completions",
    version,
    after_help = "provider is chosen by API_HOST (azure | openai | ollama); a .env file is read if present\n\n\
        examples:\n  \
        menu-parser                              (parse the built-in coffee menu)\n  \
        menu-parser menu.txt                     (parse a menu from a file)\n  \
        menu-parser menu.txt --table --no-save\n  \
        menu-parser menu.txt -o out/menu.json"
)]
struct Cli {
    /// Text file with the raw menu; defaults to a built-in sample.
    input: Option<PathBuf>,

    /// Where to write the parsed menu.
    #[arg(long, short, default_value = DEFAULT_OUTPUT_PATH)]
    output: PathBuf,

    /// Don't write the output file.
    #[arg(long)]
    no_save: bool,

    /// Print the parsed menu as JSON.
    #[arg(long, short, conflicts_with = "table")]
    json: bool,

    /// Print the parsed menu as a table.
    #[arg(long)]
    table: bool,

    /// Skip the schema banner and the raw text echo.
    #[arg(long, short)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Fail on bad configuration before touching the network.
    let config = ProviderConfig::from_env().context("invalid provider configuration")?;
    tracing::info!(provider = %config.host(), model = config.model(), "using provider");

    let raw_text = match &cli.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => SAMPLE_MENU.to_string(),
    };

    if !cli.quiet {
        print_schema_banner()?;
        println!();
        println!("{}", s_header().apply_to("parsing the following raw text"));
        println!("{}", sep(64));
        println!("{raw_text}");
        println!("{}", sep(64));
    }

    let parser = MenuParser::new(config);
    let save_to = (!cli.no_save).then_some(cli.output.as_path());
    let parsed = parser
        .run(&raw_text, save_to, |m| {
            print_menu(m, &cli).map_err(|e| MenuError::Io(format!("failed to print menu: {e:#}")))
        })
        .await
        .context("menu parsing failed")?;

    match (parsed, save_to) {
        (None, _) => eprintln!(
            "{}",
            s_warn().apply_to("no menu returned: the response was withheld by the provider")
        ),
        (Some(_), Some(path)) => println!(
            "{} {}",
            s_ok().apply_to("saved"),
            s_accent().apply_to(path.display())
        ),
        (Some(_), None) => {}
    }
    Ok(())
}

fn print_schema_banner() -> anyhow::Result<()> {
    println!();
    println!(
        "{} {}",
        s_header().apply_to("target schema"),
        s_dim().apply_to(format!("({})", menu::SCHEMA_NAME))
    );
    println!("{}", sep(64));
    println!("{}", serde_json::to_string_pretty(&menu::schema())?);
    println!("{}", sep(64));
    Ok(())
}

fn print_menu(parsed: &Menu, cli: &Cli) -> anyhow::Result<()> {
    if cli.json {
        println!("{}", menu::to_json_pretty(parsed)?);
        return Ok(());
    }

    println!();
    println!(
        "{} {}",
        s_header().apply_to("parsed menu"),
        s_dim().apply_to(format!("({} items)", parsed.len()))
    );
    println!("{}", sep(64));

    if cli.table {
        let mut table = Table::new();
        table
            .load_preset(presets::NOTHING)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["category", "item", "price", "description"]);
        for item in &parsed.items {
            table.add_row(vec![
                Cell::new(&item.category).fg(Color::AnsiValue(146)),
                Cell::new(&item.item),
                Cell::new(item.price.as_deref().unwrap_or("-")).fg(Color::AnsiValue(109)),
                Cell::new(&item.description),
            ]);
        }
        println!("{table}");
        return Ok(());
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    menu::render(&mut out, parsed)?;
    out.flush()?;
    Ok(())
}
