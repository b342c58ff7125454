//! 命令行入口：把一个 HTML 页面的界面文字翻译为目标语言

use std::error::Error;
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::rc::Rc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mindweaver::env::{core::LogLevel, EnvVar};
use mindweaver::translation::{
    load_translation_config, EngineConfig, HttpBatchTranslator, KeyValueStore, MemoryStore, RedbStore,
    TranslationConfig, TranslationEngine,
};
use mindweaver::{html_to_dom, serialize_document, ObservedDocument};

#[derive(Parser, Debug)]
#[command(name = "mindweaver", author, version, about = "Translate the UI text of an HTML page")]
struct Args {
    /// Input HTML file, or `-` for stdin
    input: String,

    /// Target language (BCP-47 tag); the source language restores originals
    #[arg(short, long)]
    lang: String,

    /// Write the result here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// URL of the batched translate function
    #[arg(long)]
    endpoint: Option<String>,

    /// Bearer token sent to the translate function
    #[arg(long)]
    token: Option<String>,

    /// Durable cache file (redb)
    #[arg(long)]
    cache_path: Option<String>,

    /// Keep the translation cache in memory only
    #[arg(long)]
    no_cache: bool,

    /// Native language of the page
    #[arg(long)]
    source_language: Option<String>,

    /// Charset of the input and output documents
    #[arg(short, long, default_value = "utf-8")]
    encoding: String,
}

fn init_tracing() {
    let filter = match LogLevel::get() {
        Ok(level) if std::env::var(LogLevel::NAME).is_ok() => EnvFilter::new(level),
        _ => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn apply_args(config: &mut TranslationConfig, args: &Args) {
    if let Some(endpoint) = &args.endpoint {
        config.endpoint = endpoint.clone();
    }
    if let Some(token) = &args.token {
        config.access_token = Some(token.clone());
    }
    if let Some(path) = &args.cache_path {
        config.cache_path = Some(path.clone());
    }
    if args.no_cache {
        config.cache_path = None;
    }
    if let Some(source) = &args.source_language {
        config.source_language = source.clone();
    }
}

fn open_store(config: &TranslationConfig) -> Rc<dyn KeyValueStore> {
    match config.expanded_cache_path() {
        Some(path) => match RedbStore::open(&path) {
            Ok(store) => Rc::new(store),
            Err(e) => {
                tracing::warn!("无法打开缓存 {}，改用内存缓存: {}", path, e);
                Rc::new(MemoryStore::new())
            }
        },
        None => Rc::new(MemoryStore::new()),
    }
}

fn read_input(input: &str) -> io::Result<Vec<u8>> {
    if input == "-" {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        fs::read(input)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let args = Args::parse();

    let mut config = load_translation_config();
    apply_args(&mut config, &args);
    config.validate()?;

    let data = read_input(&args.input)?;
    let document = ObservedDocument::new(html_to_dom(&data, args.encoding.clone()));

    let engine = TranslationEngine::new(
        document.clone(),
        open_store(&config),
        Rc::new(HttpBatchTranslator::from_config(&config)?),
        EngineConfig::from(&config),
    );

    let local = tokio::task::LocalSet::new();
    local.run_until(engine.translate_ui(&args.lang)).await;

    let stats = engine.stats();
    tracing::info!(
        "完成: {} 个远程批次（失败 {}），写入 {} 处",
        stats.remote_batches,
        stats.failed_batches,
        stats.dom_writes
    );

    let result = serialize_document(document.dom(), &args.encoding)?;
    match &args.output {
        Some(path) => fs::write(path, result)?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&result)?;
            stdout.flush()?;
        }
    }

    Ok(())
}
